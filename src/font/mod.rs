//! # Font Metrics
//!
//! Text measurement for the flow engine. Layout only needs advance widths,
//! so fonts are exposed through the small [`FontMetrics`] capability and
//! passed explicitly to whoever measures text.
//!
//! The standard PDF fonts (Helvetica, Helvetica-Bold, Courier) are built in.
//! TrueType/OpenType faces are read with ttf-parser.

pub mod metrics;

use std::collections::HashMap;
use std::sync::Arc;

pub use metrics::{MonospaceMetrics, StandardFont, StandardFontMetrics};

use crate::config::PhotobookConfig;
use crate::error::FontError;

/// Measures rendered text width in points.
pub trait FontMetrics: Send + Sync {
    fn measure_width(&self, text: &str, font_size: f64) -> f64;

    fn space_width(&self, font_size: f64) -> f64 {
        self.measure_width(" ", font_size)
    }
}

/// Parsed advance widths from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct TrueTypeMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
}

impl TrueTypeMetrics {
    /// Read advance widths for every character a font's Unicode cmap
    /// subtables map. Characters without a glyph measure as a space.
    pub fn from_font_data(data: &[u8]) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(data, 0).map_err(|e| FontError::Parse(e.to_string()))?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables.into_iter().filter(|s| s.is_unicode()) {
                subtable.codepoints(|code| {
                    let Some(ch) = char::from_u32(code) else {
                        return;
                    };
                    let advance = subtable
                        .glyph_index(code)
                        .and_then(|glyph| face.glyph_hor_advance(glyph));
                    if let Some(advance) = advance {
                        advance_widths.entry(ch).or_insert(advance);
                    }
                });
            }
        }

        let default_advance = advance_widths
            .get(&' ')
            .copied()
            .filter(|&w| w > 0)
            .unwrap_or(units_per_em / 2);

        Ok(TrueTypeMetrics {
            units_per_em,
            advance_widths,
            default_advance,
        })
    }

    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }
}

impl FontMetrics for TrueTypeMetrics {
    fn measure_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

/// The two measurement providers an entry needs.
#[derive(Clone)]
pub struct Typefaces {
    pub title: Arc<dyn FontMetrics>,
    pub body: Arc<dyn FontMetrics>,
}

impl Typefaces {
    pub fn new(title: Arc<dyn FontMetrics>, body: Arc<dyn FontMetrics>) -> Self {
        Self { title, body }
    }

    /// Same metrics for titles and body text.
    pub fn uniform(metrics: Arc<dyn FontMetrics>) -> Self {
        Self {
            title: metrics.clone(),
            body: metrics,
        }
    }

    /// Resolve `titleFont` and `textFont` against the standard fonts.
    pub fn standard(config: &PhotobookConfig) -> Self {
        Self::new(
            Arc::new(StandardFontMetrics::resolve(&config.title_font)),
            Arc::new(StandardFontMetrics::resolve(&config.text_font)),
        )
    }

    /// Use TrueType/OpenType data for the title and/or body face. A face
    /// without data resolves against the standard fonts as in [`Typefaces::standard`].
    pub fn with_font_data(
        config: &PhotobookConfig,
        title: Option<&[u8]>,
        body: Option<&[u8]>,
    ) -> Result<Self, FontError> {
        let standard = Self::standard(config);
        Ok(Self::new(
            load_face(title, standard.title)?,
            load_face(body, standard.body)?,
        ))
    }
}

fn load_face(
    data: Option<&[u8]>,
    fallback: Arc<dyn FontMetrics>,
) -> Result<Arc<dyn FontMetrics>, FontError> {
    match data {
        Some(data) => {
            let metrics: Arc<dyn FontMetrics> = Arc::new(TrueTypeMetrics::from_font_data(data)?);
            Ok(metrics)
        }
        None => Ok(fallback),
    }
}

impl std::fmt::Debug for Typefaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typefaces").finish_non_exhaustive()
    }
}
