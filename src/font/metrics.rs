//! Advance-width tables for the standard PDF fonts the renderer can use
//! without embedding, plus a fixed-width provider for tests.
//!
//! Widths are AFM units (1/1000 em) for printable ASCII, 0x20..=0x7E.

use super::FontMetrics;

/// The standard fonts with built-in width tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
        }
    }

    pub const ALL: [StandardFont; 3] = [Self::Helvetica, Self::HelveticaBold, Self::Courier];

    /// Look a font up by its PDF name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|font| font.pdf_name() == name)
    }

    fn widths(&self) -> &'static [u16; 95] {
        match self {
            Self::Helvetica => &HELVETICA_WIDTHS,
            Self::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
            Self::Courier => &COURIER_WIDTHS,
        }
    }

    /// Width used for characters outside the table.
    fn fallback_width(&self) -> u16 {
        match self {
            Self::Courier => 600,
            _ => 556,
        }
    }
}

/// Text measurement backed by a standard font's width table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardFontMetrics {
    font: StandardFont,
}

impl StandardFontMetrics {
    pub fn new(font: StandardFont) -> Self {
        Self { font }
    }

    /// Resolve a PDF font name, falling back to Helvetica for unknown names.
    pub fn resolve(name: &str) -> Self {
        match StandardFont::from_name(name) {
            Some(font) => Self::new(font),
            None => {
                tracing::debug!(font = %name, "unknown font, using Helvetica metrics");
                Self::new(StandardFont::Helvetica)
            }
        }
    }

    pub fn font(&self) -> StandardFont {
        self.font
    }

    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let code = ch as u32;
        let w = if (0x20..=0x7E).contains(&code) {
            self.font.widths()[(code - 0x20) as usize]
        } else {
            self.font.fallback_width()
        };
        w as f64 / 1000.0 * font_size
    }
}

impl FontMetrics for StandardFontMetrics {
    fn measure_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

/// Every character advances by the same fraction of an em.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub advance_em: f64,
}

impl MonospaceMetrics {
    pub fn new(advance_em: f64) -> Self {
        Self { advance_em }
    }
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { advance_em: 0.5 }
    }
}

impl FontMetrics for MonospaceMetrics {
    fn measure_width(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * self.advance_em * font_size
    }
}

#[rustfmt::skip]
static HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

static COURIER_WIDTHS: [u16; 95] = [600; 95];
