//! # Configuration
//!
//! `PhotobookConfig` is the one immutable settings struct read by every
//! layout stage. Every field has a default, so a partial JSON object is a
//! valid configuration; `validate` rejects values the algorithms cannot
//! work with before any layout starts.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::geometry::{mm_to_pt, LayoutMode, PageGeometry, PaperSize};
use crate::model::ImageSpec;
use crate::records::ColumnMapping;

/// Share of an entry's body height given to images when the entry also
/// has text, keyed by image count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZonePolicy {
    pub single: f64,
    pub pair: f64,
    pub triple: f64,
    pub many: f64,
}

impl Default for ZonePolicy {
    fn default() -> Self {
        Self {
            single: 0.40,
            pair: 0.40,
            triple: 0.45,
            many: 0.50,
        }
    }
}

impl ZonePolicy {
    pub fn fraction_for(&self, image_count: usize) -> f64 {
        match image_count {
            0 => 0.0,
            1 => self.single,
            2 => self.pair,
            3 => self.triple,
            _ => self.many,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("zones.single", self.single),
            ("zones.pair", self.pair),
            ("zones.triple", self.triple),
            ("zones.many", self.many),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::OutOfRange {
                    field,
                    expected: "in (0, 1]",
                    value,
                });
            }
        }
        Ok(())
    }
}

/// What the book pipeline does with an entry whose images cannot be placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutErrorPolicy {
    /// Fail the whole run.
    Abort,
    /// Re-pack the images into the whole body without a minimum cell size,
    /// dropping them only if even that fails.
    #[default]
    ShrinkImages,
    /// Lay the entry out without its images.
    SkipImages,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhotobookConfig {
    pub layout: LayoutMode,
    pub paper_size: PaperSize,
    pub columns: ColumnMapping,
    pub title_font_size: f64,
    pub text_font_size: f64,
    /// Page margin in millimeters. Also the gutter between landscape panes.
    pub margin_mm: f64,
    /// Spacing in points between packed images and between zones.
    pub image_padding: f64,
    pub max_image_long_edge_px: u32,
    pub background_image: Option<ImageSpec>,
    pub cover_image: Option<ImageSpec>,
    pub cover_title: Option<String>,
    pub background_alpha: f64,
    pub title_font: String,
    pub text_font: String,
    /// Leading as a multiple of the font size.
    pub line_height: f64,
    /// Gap between paragraphs, in body lines.
    pub paragraph_spacing: f64,
    pub zones: ZonePolicy,
    /// Smallest image area in pt² the packer may produce.
    pub min_cell_area: f64,
    pub reclaim_image_slack: bool,
    pub fit_text: bool,
    pub min_text_font_size: f64,
    pub font_size_step: f64,
    pub min_orphan_lines: usize,
    pub min_widow_lines: usize,
    pub on_layout_error: LayoutErrorPolicy,
}

impl Default for PhotobookConfig {
    fn default() -> Self {
        Self {
            layout: LayoutMode::Landscape,
            paper_size: PaperSize::A4,
            columns: ColumnMapping::default(),
            title_font_size: 16.0,
            text_font_size: 10.0,
            margin_mm: 5.0,
            image_padding: 5.0,
            max_image_long_edge_px: 2400,
            background_image: None,
            cover_image: None,
            cover_title: None,
            background_alpha: 0.3,
            title_font: "Helvetica-Bold".to_string(),
            text_font: "Helvetica".to_string(),
            line_height: 1.2,
            paragraph_spacing: 1.0,
            zones: ZonePolicy::default(),
            min_cell_area: 900.0,
            reclaim_image_slack: true,
            fit_text: false,
            min_text_font_size: 7.0,
            font_size_step: 0.5,
            min_orphan_lines: 1,
            min_widow_lines: 1,
            on_layout_error: LayoutErrorPolicy::ShrinkImages,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected: "positive",
            value,
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            expected: "zero or positive",
            value,
        })
    }
}

impl PhotobookConfig {
    /// Portrait A4 with the larger type sizes used for single-column books.
    pub fn portrait_a4() -> Self {
        Self {
            layout: LayoutMode::Portrait,
            paper_size: PaperSize::A4,
            title_font_size: 18.0,
            text_font_size: 11.0,
            ..Self::default()
        }
    }

    pub fn landscape_a4() -> Self {
        Self {
            layout: LayoutMode::Landscape,
            paper_size: PaperSize::A4,
            title_font_size: 16.0,
            text_font_size: 10.0,
            ..Self::default()
        }
    }

    pub fn margin_pt(&self) -> f64 {
        mm_to_pt(self.margin_mm)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("titleFontSize", self.title_font_size)?;
        positive("textFontSize", self.text_font_size)?;
        positive("lineHeight", self.line_height)?;
        positive("minTextFontSize", self.min_text_font_size)?;
        positive("fontSizeStep", self.font_size_step)?;
        non_negative("marginMm", self.margin_mm)?;
        non_negative("imagePadding", self.image_padding)?;
        non_negative("paragraphSpacing", self.paragraph_spacing)?;
        non_negative("minCellArea", self.min_cell_area)?;
        if !(0.0..=1.0).contains(&self.background_alpha) {
            return Err(ConfigError::OutOfRange {
                field: "backgroundAlpha",
                expected: "in [0, 1]",
                value: self.background_alpha,
            });
        }
        if self.min_text_font_size > self.text_font_size {
            return Err(ConfigError::OutOfRange {
                field: "minTextFontSize",
                expected: "at most textFontSize",
                value: self.min_text_font_size,
            });
        }
        if self.min_orphan_lines == 0 {
            return Err(ConfigError::OutOfRange {
                field: "minOrphanLines",
                expected: "at least 1",
                value: 0.0,
            });
        }
        if self.min_widow_lines == 0 {
            return Err(ConfigError::OutOfRange {
                field: "minWidowLines",
                expected: "at least 1",
                value: 0.0,
            });
        }
        self.zones.validate()?;
        self.page_geometry()?;
        Ok(())
    }

    /// The validated page geometry for this paper size, orientation and margin.
    pub fn page_geometry(&self) -> Result<PageGeometry, ConfigError> {
        Ok(PageGeometry::new(
            self.paper_size,
            self.layout,
            self.margin_pt(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PhotobookConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.layout, LayoutMode::Landscape);
        assert_eq!(config.on_layout_error, LayoutErrorPolicy::ShrinkImages);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: PhotobookConfig = serde_json::from_str(
            r#"{"layout":"portrait","paperSize":"letter","textFontSize":12,"zones":{"many":0.6}}"#,
        )
        .unwrap();
        assert_eq!(config.layout, LayoutMode::Portrait);
        assert_eq!(config.paper_size, PaperSize::Letter);
        assert_eq!(config.text_font_size, 12.0);
        assert_eq!(config.title_font_size, 16.0);
        assert_eq!(config.zones.many, 0.6);
        assert_eq!(config.zones.single, 0.40);
    }

    #[test]
    fn unknown_paper_size_fails_to_parse() {
        let result: Result<PhotobookConfig, _> = serde_json::from_str(r#"{"paperSize":"B5"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn on_layout_error_names() {
        let config: PhotobookConfig =
            serde_json::from_str(r#"{"onLayoutError":"skipImages"}"#).unwrap();
        assert_eq!(config.on_layout_error, LayoutErrorPolicy::SkipImages);
        let config: PhotobookConfig =
            serde_json::from_str(r#"{"onLayoutError":"abort"}"#).unwrap();
        assert_eq!(config.on_layout_error, LayoutErrorPolicy::Abort);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad_alpha = PhotobookConfig {
            background_alpha: 1.5,
            ..Default::default()
        };
        assert!(bad_alpha.validate().is_err());

        let bad_zone = PhotobookConfig {
            zones: ZonePolicy {
                many: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(bad_zone.validate().is_err());

        let bad_floor = PhotobookConfig {
            min_text_font_size: 12.0,
            ..Default::default()
        };
        assert!(bad_floor.validate().is_err());

        let huge_margin = PhotobookConfig {
            margin_mm: 200.0,
            ..Default::default()
        };
        assert!(matches!(
            huge_margin.validate(),
            Err(ConfigError::Geometry(_))
        ));
    }

    #[test]
    fn presets() {
        let p = PhotobookConfig::portrait_a4();
        assert_eq!(p.layout, LayoutMode::Portrait);
        assert_eq!(p.title_font_size, 18.0);
        assert_eq!(p.text_font_size, 11.0);
        let l = PhotobookConfig::landscape_a4();
        assert_eq!(l.text_font_size, 10.0);
        assert!(p.validate().is_ok() && l.validate().is_ok());
    }

    #[test]
    fn zone_fraction_by_count() {
        let zones = ZonePolicy::default();
        assert_eq!(zones.fraction_for(1), 0.40);
        assert_eq!(zones.fraction_for(3), 0.45);
        assert_eq!(zones.fraction_for(9), 0.50);
    }
}
