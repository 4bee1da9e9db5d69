//! # Geometry Primitives
//!
//! Rectangles, margins and paper sizes. Every length is in points (1/72
//! inch). The origin is the top-left corner of the physical page and `y`
//! grows downward.
//!
//! A `Rect` can only be built with a strictly positive, finite size, so the
//! packer and planner never have to re-check degenerate boxes mid-algorithm.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GeometryError};

/// Tolerance used when comparing computed edges.
pub const EPSILON: f64 = 1e-6;

/// Convert millimeters to points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

/// An axis-aligned rectangle with a strictly positive size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRect")]
pub struct Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Deserialize)]
struct RawRect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl TryFrom<RawRect> for Rect {
    type Error = GeometryError;

    fn try_from(raw: RawRect) -> Result<Self, Self::Error> {
        Rect::new(raw.x, raw.y, raw.width, raw.height)
    }
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, GeometryError> {
        if !(x.is_finite() && y.is_finite() && width.is_finite() && height.is_finite()) {
            return Err(GeometryError::NonFinite {
                x,
                y,
                width,
                height,
            });
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(GeometryError::NonPositive { width, height });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Width divided by height.
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// The same rectangle moved by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Shrink by the given edges. Fails if nothing is left.
    pub fn inset(&self, edges: &Edges) -> Result<Self, GeometryError> {
        Rect::new(
            self.x + edges.left,
            self.y + edges.top,
            self.width - edges.horizontal(),
            self.height - edges.vertical(),
        )
    }

    /// Area shared with `other` (0 when they only touch).
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    /// Whether `other` lies inside `self` (edges may coincide).
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x - EPSILON
            && other.y >= self.y - EPSILON
            && other.right() <= self.right() + EPSILON
            && other.bottom() <= self.bottom() + EPSILON
    }

    /// Cut a band of `height` off the top. Returns the band and whatever is
    /// left below it after `gap`, if anything.
    pub fn split_top(&self, height: f64, gap: f64) -> (Option<Rect>, Option<Rect>) {
        let band_h = height.min(self.height);
        let band = Rect::new(self.x, self.y, self.width, band_h).ok();
        let used = band_h + gap;
        let rest = Rect::new(self.x, self.y + used, self.width, self.height - used).ok();
        (band, rest)
    }

    /// The largest rectangle of the given aspect ratio that fits inside
    /// `self`, centered. Scale is `min(w / iw, h / ih)`.
    pub fn fit_aspect(&self, aspect: f64) -> Rect {
        let (w, h) = if self.aspect() > aspect {
            (self.height * aspect, self.height)
        } else {
            (self.width, self.width / aspect)
        };
        Rect {
            x: self.x + (self.width - w) / 2.0,
            y: self.y + (self.height - h) / 2.0,
            width: w,
            height: h,
        }
    }
}

/// Edge values (top, right, bottom, left) used for margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    #[serde(alias = "a4")]
    A4,
    #[serde(alias = "a3")]
    A3,
    #[serde(alias = "a5")]
    A5,
    #[serde(rename = "letter", alias = "Letter")]
    Letter,
    #[serde(rename = "legal", alias = "Legal")]
    Legal,
}

impl PaperSize {
    pub const ALL: [PaperSize; 5] = [
        PaperSize::A4,
        PaperSize::A3,
        PaperSize::A5,
        PaperSize::Letter,
        PaperSize::Legal,
    ];

    /// Returns portrait (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (595.28, 841.89),
            PaperSize::A3 => (841.89, 1190.55),
            PaperSize::A5 => (419.53, 595.28),
            PaperSize::Letter => (612.0, 792.0),
            PaperSize::Legal => (612.0, 1008.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaperSize::A4 => "A4",
            PaperSize::A3 => "A3",
            PaperSize::A5 => "A5",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaperSize {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaperSize::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownName {
                kind: "paper size",
                value: s.to_string(),
                expected: "A4, A3, A5, letter, legal",
            })
    }
}

/// Page orientation. Landscape pages carry two entries side by side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[serde(alias = "Portrait")]
    Portrait,
    #[default]
    #[serde(alias = "Landscape")]
    Landscape,
}

impl LayoutMode {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutMode::Portrait => "portrait",
            LayoutMode::Landscape => "landscape",
        }
    }

    /// How many entry fragments share one physical page.
    pub fn slots_per_page(&self) -> usize {
        match self {
            LayoutMode::Portrait => 1,
            LayoutMode::Landscape => 2,
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(LayoutMode::Portrait),
            "landscape" => Ok(LayoutMode::Landscape),
            _ => Err(ConfigError::UnknownName {
                kind: "layout",
                value: s.to_string(),
                expected: "portrait, landscape",
            }),
        }
    }
}

/// Physical page size plus a uniform margin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    width: f64,
    height: f64,
    margin: f64,
    mode: LayoutMode,
}

impl PageGeometry {
    pub fn new(paper: PaperSize, mode: LayoutMode, margin: f64) -> Result<Self, GeometryError> {
        let (w, h) = paper.dimensions();
        let (width, height) = match mode {
            LayoutMode::Portrait => (w, h),
            LayoutMode::Landscape => (h, w),
        };
        let geometry = Self {
            width,
            height,
            margin,
            mode,
        };
        // Both the content area and (in landscape) each pane must be non-empty.
        let too_large = GeometryError::MarginTooLarge {
            margin,
            width,
            height,
        };
        if !margin.is_finite() || margin < 0.0 {
            return Err(too_large);
        }
        geometry.content_rect().map_err(|_| too_large.clone())?;
        geometry.panes().map_err(|_| too_large)?;
        Ok(geometry)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    /// The whole physical page, used for full-bleed covers and backgrounds.
    pub fn full_rect(&self) -> Rect {
        Rect {
            x: 0.0,
            y: 0.0,
            width: self.width,
            height: self.height,
        }
    }

    /// The page minus its margins.
    pub fn content_rect(&self) -> Result<Rect, GeometryError> {
        self.full_rect().inset(&Edges::uniform(self.margin))
    }

    /// The regions entries are laid out into, left to right.
    ///
    /// Landscape splits the content area into two halves separated by a
    /// gutter as wide as the margin, i.e. each pane is
    /// `(page_width - 3 * margin) / 2` wide.
    pub fn panes(&self) -> Result<Vec<Rect>, GeometryError> {
        let content = self.content_rect()?;
        let slots = self.mode.slots_per_page();
        let gutters = (slots - 1) as f64 * self.margin;
        let pane_w = (content.width - gutters) / slots as f64;
        (0..slots)
            .map(|i| {
                Rect::new(
                    content.x + i as f64 * (pane_w + self.margin),
                    content.y,
                    pane_w,
                    content.height,
                )
            })
            .collect()
    }
}
