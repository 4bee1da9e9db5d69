//! Structured error types for the photobook layout engine.
//!
//! Each stage owns its error: geometry construction, packing, entry
//! planning, configuration and font loading. `PhotobookError` is what the
//! public pipeline functions return.

use thiserror::Error;

/// Malformed geometry rejected when a `Rect` or `PageGeometry` is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("non-finite geometry: x={x}, y={y}, width={width}, height={height}")]
    NonFinite { x: f64, y: f64, width: f64, height: f64 },
    #[error("non-positive size: {width} x {height}")]
    NonPositive { width: f64, height: f64 },
    #[error("margin {margin}pt leaves no content area on a {width} x {height} page")]
    MarginTooLarge { margin: f64, width: f64, height: f64 },
}

/// Raised by the rectangle packer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PackError {
    /// The container cannot host `count` images above the minimum viable cell size.
    #[error(
        "insufficient space: {count} image(s) do not fit in {width:.1} x {height:.1}pt \
         with a minimum cell area of {min_cell_area:.1}pt²"
    )]
    InsufficientSpace {
        count: usize,
        width: f64,
        height: f64,
        min_cell_area: f64,
    },
}

/// Raised by the entry layout planner when no fallback is left.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("entry \"{title}\": {count} image(s) cannot be placed even at minimum size")]
    ImagesDoNotFit {
        title: String,
        count: usize,
        #[source]
        source: PackError,
    },
    #[error("entry \"{title}\": {source}")]
    Geometry {
        title: String,
        #[source]
        source: GeometryError,
    },
}

/// An invalid configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
    #[error("unknown {kind} \"{value}\" (expected one of: {expected})")]
    UnknownName {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("invalid page geometry: {0}")]
    Geometry(#[from] GeometryError),
}

/// A font could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FontError {
    #[error("font data could not be parsed: {0}")]
    Parse(String),
}

/// The unified error type returned by the public pipeline functions.
#[derive(Debug, Error)]
pub enum PhotobookError {
    /// JSON input failed to parse as a valid book document.
    #[error("failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("font error: {0}")]
    Font(#[from] FontError),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for PhotobookError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the book input schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PhotobookError::Parse { source: e, hint }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_hint() {
        let err: PhotobookError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.contains("failed to parse input"));
        assert!(msg.contains("trailing commas"));
    }

    #[test]
    fn truncated_json_gets_eof_hint() {
        let err: PhotobookError = serde_json::from_str::<serde_json::Value>("{\"a\": ")
            .unwrap_err()
            .into();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn insufficient_space_message() {
        let e = PackError::InsufficientSpace {
            count: 5,
            width: 40.0,
            height: 40.0,
            min_cell_area: 900.0,
        };
        assert!(e.to_string().contains("5 image(s)"));
    }
}
