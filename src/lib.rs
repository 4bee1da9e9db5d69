//! # Photobook
//!
//! A page-native layout engine for photo diaries.
//!
//! Each diary entry has a title, a handful of photos and free text. The
//! engine decides where every photo and every line of text goes on a
//! printed page: photos are packed into an image zone without overlap,
//! text is wrapped and measured against real font metrics, and text that
//! does not fit flows *into* continuation fragments rather than being cut.
//! The output is a list of pages of positioned boxes; drawing them is left
//! to a renderer.
//!
//! The engine is a pure function from (entries, config) to pages. It never
//! reads image bytes or touches the filesystem.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [records]  : Export rows → ordered, resolved entries
//!       ↓
//!   [layout]   : Per entry: title, image zone, text zone, continuations
//!       ├── [pack]  : Rectangle packing by image count
//!       └── [text]  : Greedy wrap, height-bounded flow, fit to space
//!       ↓
//!   [compose]  : Fragments → pane slots → pages, cover, background
//!       ↓
//! Pages (JSON) for the renderer
//! ```
//!
//! Coordinates are PostScript points with the origin at the top-left
//! corner of the page and `y` growing downward.

pub mod compose;
pub mod config;
pub mod error;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod pack;
pub mod records;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use compose::{compose, Photobook, PhotobookPage};
pub use config::PhotobookConfig;
pub use error::PhotobookError;
pub use layout::{layout_entry, EntryLayout};
pub use model::{Entry, ImageSpec, TextRun};
pub use records::BookInput;

/// Lay out a whole book document.
///
/// This is the primary entry point. Rows are normalized and ordered, photos
/// resolved against the image list, and every entry planned and composed
/// with the standard fonts named in the config.
pub fn layout_book(input: &BookInput) -> Result<Vec<PhotobookPage>, PhotobookError> {
    let book = Photobook::new(input.config.clone())?;
    let entries = input.to_entries();
    book.layout(&entries)
}

/// Lay out a book described as JSON and return the pages as JSON.
pub fn layout_json(json: &str) -> Result<String, PhotobookError> {
    let input: BookInput = serde_json::from_str(json)?;
    let pages = layout_book(&input)?;
    Ok(serde_json::to_string_pretty(&pages)?)
}
