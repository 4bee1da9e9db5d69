//! # Page Composer
//!
//! Assigns planned entry fragments to physical pages and runs the whole
//! book pipeline.
//!
//! Fragments fill pane slots strictly in order: in landscape the left pane,
//! then the right pane, then the next page's left pane; in portrait one
//! fragment per page. A continuation fragment takes the next free slot like
//! any other, so entries pair up wherever slots are free. An optional cover
//! page comes first and an optional background layer is attached to every
//! other page.

use serde::Serialize;
use tracing::instrument;

use crate::config::{LayoutErrorPolicy, PhotobookConfig};
use crate::error::{GeometryError, PhotobookError};
use crate::font::Typefaces;
use crate::geometry::{PageGeometry, Rect};
use crate::layout::{
    EntryLayout, EntryPlanner, FitMode, PageFragment, PlacedBox, TextBlock,
};
use crate::model::{Entry, ImageSpec};
use crate::text::{self, WrappedLine};

/// Font size of a text-only cover title.
pub const COVER_TITLE_SIZE: f64 = 24.0;

/// A faded image drawn behind everything else on a page. The renderer
/// applies the opacity; layout ignores the layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundLayer {
    pub image: ImageSpec,
    pub opacity: f64,
    pub rect: Rect,
}

/// What goes on the cover page.
#[derive(Debug, Clone, PartialEq)]
pub enum Cover {
    /// A full-bleed image.
    Image(ImageSpec),
    /// Centered title text set in `font`.
    Title { text: String, font: String },
}

/// One physical page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotobookPage {
    pub width: f64,
    pub height: f64,
    pub fragments: Vec<PageFragment>,
    pub background: Option<BackgroundLayer>,
    pub is_cover: bool,
}

impl PhotobookPage {
    /// Boxes in the order the renderer draws them, fragment by fragment:
    /// title, images, text. The background layer is always drawn first.
    pub fn render_order(&self) -> impl Iterator<Item = &PlacedBox> {
        self.fragments.iter().flat_map(PageFragment::boxes)
    }
}

/// Cover and background settings for [`compose`].
#[derive(Debug, Clone, Default)]
pub struct PageDecor {
    pub cover: Option<Cover>,
    pub background: Option<ImageSpec>,
    pub background_opacity: f64,
}

impl PageDecor {
    /// Cover image wins over cover title; long edges are capped like every
    /// other image.
    pub fn from_config(config: &PhotobookConfig) -> Self {
        let cap = config.max_image_long_edge_px;
        let cover = match (&config.cover_image, &config.cover_title) {
            (Some(image), _) => Some(Cover::Image(image.downsampled(cap))),
            (None, Some(text)) => Some(Cover::Title {
                text: text.clone(),
                font: config.title_font.clone(),
            }),
            (None, None) => None,
        };
        Self {
            cover,
            background: config.background_image.as_ref().map(|b| b.downsampled(cap)),
            background_opacity: config.background_alpha,
        }
    }
}

fn cover_page(
    cover: &Cover,
    geometry: &PageGeometry,
    fonts: &Typefaces,
    line_height: f64,
) -> Result<PhotobookPage, GeometryError> {
    let page = geometry.full_rect();
    let mut fragment = PageFragment {
        region: page,
        title_box: None,
        image_boxes: Vec::new(),
        text_boxes: Vec::new(),
        is_continuation: false,
    };
    match cover {
        Cover::Image(image) => {
            fragment
                .image_boxes
                .push(PlacedBox::image(image.clone(), page, page, FitMode::Cover));
        }
        Cover::Title { text: title, font } => {
            let words: Vec<String> = title.split_whitespace().map(str::to_string).collect();
            let content = geometry.content_rect()?;
            let leading = COVER_TITLE_SIZE * line_height;
            let lines = text::wrap_words(
                &words,
                COVER_TITLE_SIZE,
                content.width(),
                fonts.title.as_ref(),
            );
            if !lines.is_empty() {
                let width = lines.iter().map(|l| l.width).fold(0.0, f64::max);
                let height = lines.len() as f64 * leading;
                let (cx, cy) = page.center();
                let rect = Rect::new(cx - width / 2.0, cy - height / 2.0, width, height)?;
                let block = TextBlock {
                    lines: lines
                        .into_iter()
                        .enumerate()
                        .map(|(i, line)| WrappedLine {
                            text: line.text,
                            width: line.width,
                            y_offset: i as f64 * leading,
                            paragraph_start: i == 0,
                        })
                        .collect(),
                    font_size: COVER_TITLE_SIZE,
                    line_height: leading,
                    font: font.clone(),
                };
                fragment.title_box = Some(PlacedBox::title(rect, block));
            }
        }
    }
    Ok(PhotobookPage {
        width: geometry.width(),
        height: geometry.height(),
        fragments: vec![fragment],
        background: None,
        is_cover: true,
    })
}

/// Arrange entry layouts on pages.
///
/// Every fragment must have been planned against a region the size of one
/// pane of `geometry`.
pub fn compose(
    layouts: &[EntryLayout],
    geometry: &PageGeometry,
    decor: &PageDecor,
    fonts: &Typefaces,
    line_height: f64,
) -> Result<Vec<PhotobookPage>, GeometryError> {
    let panes = geometry.panes()?;
    let background = decor.background.as_ref().map(|image| BackgroundLayer {
        image: image.clone(),
        opacity: decor.background_opacity,
        rect: geometry.full_rect(),
    });
    let new_page = || PhotobookPage {
        width: geometry.width(),
        height: geometry.height(),
        fragments: Vec::new(),
        background: background.clone(),
        is_cover: false,
    };

    let mut pages = Vec::new();
    if let Some(cover) = &decor.cover {
        pages.push(cover_page(cover, geometry, fonts, line_height)?);
    }

    let mut current = new_page();
    for fragment in layouts.iter().flat_map(|l| l.fragments.iter()) {
        if current.fragments.len() == panes.len() {
            pages.push(std::mem::replace(&mut current, new_page()));
        }
        let slot = &panes[current.fragments.len()];
        current.fragments.push(fragment.moved_to(slot));
    }
    if !current.fragments.is_empty() {
        pages.push(current);
    }

    tracing::debug!(
        pages = pages.len(),
        mode = %geometry.mode(),
        "composed pages"
    );
    Ok(pages)
}

/// The whole-book pipeline: plan every entry, apply the degradation
/// policy, compose pages.
#[derive(Debug, Clone)]
pub struct Photobook {
    config: PhotobookConfig,
    fonts: Typefaces,
    geometry: PageGeometry,
}

impl Photobook {
    /// Validate `config` and resolve its fonts against the standard set.
    pub fn new(config: PhotobookConfig) -> Result<Self, PhotobookError> {
        let fonts = Typefaces::standard(&config);
        Self::with_typefaces(config, fonts)
    }

    pub fn with_typefaces(config: PhotobookConfig, fonts: Typefaces) -> Result<Self, PhotobookError> {
        config.validate()?;
        let geometry = config.page_geometry()?;
        Ok(Self {
            config,
            fonts,
            geometry,
        })
    }

    pub fn config(&self) -> &PhotobookConfig {
        &self.config
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// The region every entry is planned against: the first pane.
    pub fn entry_region(&self) -> Result<Rect, PhotobookError> {
        let panes = self
            .geometry
            .panes()
            .map_err(|e| PhotobookError::Config(e.into()))?;
        panes
            .first()
            .copied()
            .ok_or_else(|| PhotobookError::Config(GeometryError::NonPositive {
                width: self.geometry.width(),
                height: self.geometry.height(),
            }.into()))
    }

    /// Plan one entry, falling back according to `onLayoutError`.
    pub fn plan_entry(&self, entry: &Entry, region: Rect) -> Result<EntryLayout, PhotobookError> {
        let planner = EntryPlanner::new(&self.config, &self.fonts);
        match planner.plan(entry, region) {
            Ok(layout) => Ok(layout),
            Err(err) => match self.config.on_layout_error {
                LayoutErrorPolicy::Abort => Err(err.into()),
                LayoutErrorPolicy::ShrinkImages => {
                    tracing::warn!(error = %err, "shrinking images below the minimum size");
                    match planner.plan_shrunk(entry, region) {
                        Ok(layout) => Ok(layout),
                        Err(err) => {
                            tracing::warn!(error = %err, "laying out entry without its images");
                            Ok(planner.plan_without_images(entry, region)?)
                        }
                    }
                }
                LayoutErrorPolicy::SkipImages => {
                    tracing::warn!(error = %err, "laying out entry without its images");
                    Ok(planner.plan_without_images(entry, region)?)
                }
            },
        }
    }

    /// Plan every entry. Entries are independent; the result keeps input order.
    pub fn plan_entries(&self, entries: &[Entry]) -> Result<Vec<EntryLayout>, PhotobookError> {
        let region = self.entry_region()?;
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            entries
                .par_iter()
                .map(|entry| self.plan_entry(entry, region))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            entries
                .iter()
                .map(|entry| self.plan_entry(entry, region))
                .collect()
        }
    }

    /// Lay out the whole book.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub fn layout(&self, entries: &[Entry]) -> Result<Vec<PhotobookPage>, PhotobookError> {
        let layouts = self.plan_entries(entries)?;
        let decor = PageDecor::from_config(&self.config);
        let pages = compose(
            &layouts,
            &self.geometry,
            &decor,
            &self.fonts,
            self.config.line_height,
        )
        .map_err(|e| PhotobookError::Config(e.into()))?;
        tracing::info!(pages = pages.len(), "laid out photobook");
        Ok(pages)
    }
}
