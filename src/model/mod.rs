//! # Input Model
//!
//! The read-only inputs the engine lays out: image dimensions, text bodies
//! and the entries that group them. These are built once per entry, either
//! directly or from normalized records (see [`crate::records`]), and never
//! mutated by the layout pass.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Pixel dimensions of one photo. The engine never reads image bytes; the
/// `source_id` is handed back untouched in the output boxes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawImageSpec", rename_all = "camelCase")]
pub struct ImageSpec {
    source_id: String,
    pixel_width: u32,
    pixel_height: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImageSpec {
    source_id: String,
    pixel_width: u32,
    pixel_height: u32,
}

impl TryFrom<RawImageSpec> for ImageSpec {
    type Error = GeometryError;

    fn try_from(raw: RawImageSpec) -> Result<Self, Self::Error> {
        ImageSpec::new(raw.source_id, raw.pixel_width, raw.pixel_height)
    }
}

impl ImageSpec {
    pub fn new(
        source_id: impl Into<String>,
        pixel_width: u32,
        pixel_height: u32,
    ) -> Result<Self, GeometryError> {
        if pixel_width == 0 || pixel_height == 0 {
            return Err(GeometryError::NonPositive {
                width: pixel_width as f64,
                height: pixel_height as f64,
            });
        }
        Ok(Self {
            source_id: source_id.into(),
            pixel_width,
            pixel_height,
        })
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    pub fn aspect(&self) -> AspectRatio {
        AspectRatio(self.pixel_width as f64 / self.pixel_height as f64)
    }

    /// Dimensions after the downsampling collaborator caps the long edge at
    /// `max_long_edge` pixels. Smaller images are returned unchanged.
    pub fn downsampled(&self, max_long_edge: u32) -> ImageSpec {
        let long_edge = self.pixel_width.max(self.pixel_height);
        if max_long_edge == 0 || long_edge <= max_long_edge {
            return self.clone();
        }
        let scale = max_long_edge as f64 / long_edge as f64;
        ImageSpec {
            source_id: self.source_id.clone(),
            pixel_width: ((self.pixel_width as f64 * scale) as u32).max(1),
            pixel_height: ((self.pixel_height as f64 * scale) as u32).max(1),
        }
    }
}

/// Width over height, always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct AspectRatio(f64);

impl AspectRatio {
    pub fn new(ratio: f64) -> Result<Self, GeometryError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(GeometryError::NonPositive {
                width: ratio,
                height: 1.0,
            });
        }
        Ok(Self(ratio))
    }

    /// Ratio of a `width:height` pair, e.g. `from_dims(16.0, 9.0)`.
    pub fn from_dims(width: f64, height: f64) -> Result<Self, GeometryError> {
        if height <= 0.0 {
            return Err(GeometryError::NonPositive { width, height });
        }
        Self::new(width / height)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// One paragraph of body text, already split into words.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub words: Vec<String>,
    /// Set when this paragraph is the tail of one that was split at a
    /// fragment boundary, so its first line is not a paragraph start.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub continues: bool,
}

impl Paragraph {
    pub fn new(words: Vec<String>) -> Self {
        Self {
            words,
            continues: false,
        }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_whitespace().map(str::to_string).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// An ordered sequence of paragraphs: the input of the text flow engine
/// and the shape of its remainder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub paragraphs: Vec<Paragraph>,
}

impl TextRun {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs: paragraphs.into_iter().filter(|p| !p.is_empty()).collect(),
        }
    }

    /// Paragraphs are separated by blank lines, words by any whitespace.
    /// Single newlines inside a paragraph are treated as spaces.
    pub fn parse(text: &str) -> Self {
        let normalized = text.replace("\r\n", "\n");
        let mut paragraphs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in normalized.split('\n') {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    paragraphs.push(Paragraph::from_text(&current.join(" ")));
                    current.clear();
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            paragraphs.push(Paragraph::from_text(&current.join(" ")));
        }
        Self::new(paragraphs)
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.iter().all(Paragraph::is_empty)
    }

    /// All words in reading order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.paragraphs
            .iter()
            .flat_map(|p| p.words.iter().map(String::as_str))
    }

    pub fn word_count(&self) -> usize {
        self.paragraphs.iter().map(|p| p.words.len()).sum()
    }
}

/// One diary entry, ready for layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    /// Display title, e.g. `"January 5, 2024 - Lisbon"`.
    pub title: String,
    pub images: Vec<ImageSpec>,
    pub text: TextRun,
    pub date: Option<NaiveDate>,
}

impl Entry {
    pub fn new(title: impl Into<String>, images: Vec<ImageSpec>, text: &str) -> Self {
        Self {
            title: title.into(),
            images,
            text: TextRun::parse(text),
            date: None,
        }
    }

    pub fn aspects(&self) -> Vec<AspectRatio> {
        self.images.iter().map(ImageSpec::aspect).collect()
    }
}
