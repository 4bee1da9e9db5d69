//! # Entry Layout Planner
//!
//! Turns one entry (title, photos, text) into one or more page fragments
//! placed against a fixed region.
//!
//! ## How an entry is planned
//!
//! 1. Reserve a title box on the first fragment, followed by half a title
//!    leading of space.
//! 2. Split what is left (the body) into an image zone on top and a text
//!    zone below. The image share depends on the image count; an entry
//!    without text gives the whole body to its images.
//! 3. Pack the images into the image zone. If they do not fit, grow the
//!    image zone and try again, up to the whole body (the text then starts
//!    on the next fragment). If even the whole body is too small, the entry
//!    fails with [`LayoutError::ImagesDoNotFit`]. Images never paginate.
//! 4. Flow the text into the text zone. Whatever does not fit opens a
//!    continuation fragment with no title and no images, the whole region
//!    available to text, until every word is placed.
//!
//! Every fragment records the region it was planned against; the page
//! composer translates fragments into their final slot.

pub mod page_break;

use serde::Serialize;

use crate::config::PhotobookConfig;
use crate::error::{GeometryError, LayoutError, PackError};
use crate::font::Typefaces;
use crate::geometry::Rect;
use crate::model::{Entry, ImageSpec, TextRun};
use crate::pack::{self, PackParams, PackedSlot};
use crate::text::{self, FlowOptions, FlowParams, FlowResult, WrappedLine};

/// How the image zone grows after a failed pack.
const ZONE_ESCALATION_STEP: f64 = 0.15;

/// Image area floor used when images are shrunk as a fallback.
pub const SHRINK_MIN_CELL_AREA: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BoxKind {
    Image,
    Text,
    Title,
}

/// How the renderer maps image pixels onto the box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FitMode {
    /// Scale to fit inside the box. The box already has the image's aspect.
    #[default]
    Contain,
    /// Scale to cover the box, cropping overflow.
    Cover,
}

/// Lines of text with the type settings they were measured with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub lines: Vec<WrappedLine>,
    pub font_size: f64,
    pub line_height: f64,
    pub font: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum BoxPayload {
    Image {
        image: ImageSpec,
        fit: FitMode,
        /// The slot the packer allotted; `rect` is centered inside it.
        cell: Rect,
    },
    Text(TextBlock),
}

/// The engine's output unit: one thing for the renderer to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedBox {
    pub kind: BoxKind,
    pub rect: Rect,
    pub payload: BoxPayload,
}

impl PlacedBox {
    pub fn image(image: ImageSpec, rect: Rect, cell: Rect, fit: FitMode) -> Self {
        Self {
            kind: BoxKind::Image,
            rect,
            payload: BoxPayload::Image { image, fit, cell },
        }
    }

    pub fn text(rect: Rect, block: TextBlock) -> Self {
        Self {
            kind: BoxKind::Text,
            rect,
            payload: BoxPayload::Text(block),
        }
    }

    pub fn title(rect: Rect, block: TextBlock) -> Self {
        Self {
            kind: BoxKind::Title,
            rect,
            payload: BoxPayload::Text(block),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        let payload = match &self.payload {
            BoxPayload::Image { image, fit, cell } => BoxPayload::Image {
                image: image.clone(),
                fit: *fit,
                cell: cell.translate(dx, dy),
            },
            BoxPayload::Text(block) => BoxPayload::Text(block.clone()),
        };
        Self {
            kind: self.kind,
            rect: self.rect.translate(dx, dy),
            payload,
        }
    }

    pub fn text_block(&self) -> Option<&TextBlock> {
        match &self.payload {
            BoxPayload::Text(block) => Some(block),
            BoxPayload::Image { .. } => None,
        }
    }

    pub fn image_spec(&self) -> Option<&ImageSpec> {
        match &self.payload {
            BoxPayload::Image { image, .. } => Some(image),
            BoxPayload::Text(_) => None,
        }
    }
}

/// Everything one entry puts on one page slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFragment {
    /// The region this fragment occupies.
    pub region: Rect,
    pub title_box: Option<PlacedBox>,
    pub image_boxes: Vec<PlacedBox>,
    pub text_boxes: Vec<PlacedBox>,
    pub is_continuation: bool,
}

impl PageFragment {
    fn empty(region: Rect, is_continuation: bool) -> Self {
        Self {
            region,
            title_box: None,
            image_boxes: Vec::new(),
            text_boxes: Vec::new(),
            is_continuation,
        }
    }

    /// Move the fragment and every box on it into `slot`, which must have
    /// the same size as the region it was planned against.
    pub fn moved_to(&self, slot: &Rect) -> Self {
        let dx = slot.x() - self.region.x();
        let dy = slot.y() - self.region.y();
        let shift = |boxes: &[PlacedBox]| -> Vec<PlacedBox> {
            boxes.iter().map(|b| b.translate(dx, dy)).collect()
        };
        Self {
            region: *slot,
            title_box: self.title_box.as_ref().map(|b| b.translate(dx, dy)),
            image_boxes: shift(self.image_boxes.as_slice()),
            text_boxes: shift(self.text_boxes.as_slice()),
            is_continuation: self.is_continuation,
        }
    }

    /// Boxes in drawing order: title, images, text.
    pub fn boxes(&self) -> impl Iterator<Item = &PlacedBox> {
        self.title_box
            .iter()
            .chain(self.image_boxes.iter())
            .chain(self.text_boxes.iter())
    }

    /// The words on this fragment's text boxes, in order.
    pub fn text_words(&self) -> impl Iterator<Item = &str> {
        self.text_boxes
            .iter()
            .filter_map(PlacedBox::text_block)
            .flat_map(|block| block.lines.iter())
            .flat_map(|line| line.text.split_whitespace())
    }
}

/// How an entry was degraded after its images failed to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Degradation {
    ShrunkImages,
    SkippedImages,
}

/// The planned fragments of one entry, in reading order. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryLayout {
    pub title: String,
    pub fragments: Vec<PageFragment>,
    /// Body font size actually used (differs when text was fit to space).
    pub text_font_size: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degradation: Option<Degradation>,
}

impl EntryLayout {
    pub fn image_count(&self) -> usize {
        self.fragments.iter().map(|f| f.image_boxes.len()).sum()
    }
}

/// How images are handled for one planning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageMode {
    /// Zoned split with escalation and the configured minimum size.
    Zoned,
    /// The whole body, no minimum size beyond a point.
    Shrunk,
    /// Images left out.
    Skipped,
}

/// Result of placing images: the slots and the text zone left below them.
struct ImagePlan {
    slots: Vec<PackedSlot>,
    text_zone: Option<Rect>,
}

/// Plans entries against one region size with fixed configuration.
pub struct EntryPlanner<'a> {
    config: &'a PhotobookConfig,
    fonts: &'a Typefaces,
}

impl<'a> EntryPlanner<'a> {
    pub fn new(config: &'a PhotobookConfig, fonts: &'a Typefaces) -> Self {
        Self { config, fonts }
    }

    /// Plan `entry` with the regular zone policy.
    pub fn plan(&self, entry: &Entry, region: Rect) -> Result<EntryLayout, LayoutError> {
        self.plan_with(entry, region, ImageMode::Zoned)
    }

    /// Plan with the images packed into the whole body at any size; the
    /// text starts on a continuation fragment.
    pub fn plan_shrunk(&self, entry: &Entry, region: Rect) -> Result<EntryLayout, LayoutError> {
        let mut layout = self.plan_with(entry, region, ImageMode::Shrunk)?;
        layout.degradation = Some(Degradation::ShrunkImages);
        Ok(layout)
    }

    /// Plan the entry's title and text only.
    pub fn plan_without_images(
        &self,
        entry: &Entry,
        region: Rect,
    ) -> Result<EntryLayout, LayoutError> {
        let mut layout = self.plan_with(entry, region, ImageMode::Skipped)?;
        if !entry.images.is_empty() {
            layout.degradation = Some(Degradation::SkippedImages);
        }
        Ok(layout)
    }

    fn plan_with(
        &self,
        entry: &Entry,
        region: Rect,
        mode: ImageMode,
    ) -> Result<EntryLayout, LayoutError> {
        let config = self.config;
        let mut first = PageFragment::empty(region, false);

        // 1. Title
        let (title_box, body) = self.place_title(&entry.title, &region);
        first.title_box = title_box;

        // 2-3. Images
        let images: &[ImageSpec] = match mode {
            ImageMode::Skipped => &[],
            _ => &entry.images,
        };
        let has_text = !entry.text.is_empty();
        let plan = match body {
            Some(body) if !images.is_empty() => {
                self.place_images(entry, images, &body, has_text, mode)?
            }
            Some(body) => ImagePlan {
                slots: Vec::new(),
                text_zone: Some(body),
            },
            None if !images.is_empty() => {
                return Err(LayoutError::ImagesDoNotFit {
                    title: entry.title.clone(),
                    count: images.len(),
                    source: PackError::InsufficientSpace {
                        count: images.len(),
                        width: region.width(),
                        height: 0.0,
                        min_cell_area: config.min_cell_area,
                    },
                });
            }
            None => ImagePlan {
                slots: Vec::new(),
                text_zone: None,
            },
        };
        first.image_boxes = images
            .iter()
            .zip(&plan.slots)
            .map(|(image, slot)| {
                PlacedBox::image(image.clone(), slot.image, slot.cell, FitMode::Contain)
            })
            .collect();

        // 4. Text
        let mut fragments = Vec::new();
        let mut font_size = config.text_font_size;
        let mut pending = if has_text { Some(entry.text.clone()) } else { None };

        if let Some(zone) = plan.text_zone {
            if let Some(run) = pending.take() {
                let (result, size) = self.flow_first(&run, &zone);
                font_size = size;
                if let Some(text_box) = self.text_box(&entry.title, &zone, &result, size)? {
                    first.text_boxes.push(text_box);
                }
                pending = result.remainder;
            }
        }
        fragments.push(first);

        while let Some(run) = pending {
            let params = self.flow_params(font_size, &region);
            let options = FlowOptions {
                force_progress: true,
                ..self.flow_options()
            };
            let result = text::flow(&run, &params, &options, self.fonts.body.as_ref());
            let mut fragment = PageFragment::empty(region, true);
            if let Some(text_box) = self.text_box(&entry.title, &region, &result, font_size)? {
                fragment.text_boxes.push(text_box);
            }
            fragments.push(fragment);
            pending = result.remainder;
        }

        tracing::debug!(
            title = %entry.title,
            images = images.len(),
            fragments = fragments.len(),
            "planned entry"
        );

        Ok(EntryLayout {
            title: entry.title.clone(),
            fragments,
            text_font_size: font_size,
            degradation: None,
        })
    }

    fn title_leading(&self) -> f64 {
        self.config.title_font_size * self.config.line_height
    }

    /// Title box at the top of `region` and the body left below it.
    fn place_title(&self, title: &str, region: &Rect) -> (Option<PlacedBox>, Option<Rect>) {
        let words: Vec<String> = title.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return (None, Some(*region));
        }
        let size = self.config.title_font_size;
        let leading = self.title_leading();
        let mut lines = text::wrap_words(&words, size, region.width(), self.fonts.title.as_ref());
        let max_lines = ((region.height() / leading).floor() as usize).max(1);
        if lines.len() > max_lines {
            tracing::warn!(title = %title, lines = lines.len(), max_lines, "title truncated");
            lines.truncate(max_lines);
        }
        let height = (lines.len() as f64 * leading).min(region.height());
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
            font_size: size,
            line_height: leading,
            font: self.config.title_font.clone(),
        };
        let (band, body) = region.split_top(height, leading / 2.0);
        (band.map(|rect| PlacedBox::title(rect, block)), body)
    }

    fn pack_params(&self, mode: ImageMode) -> PackParams {
        PackParams {
            padding: self.config.image_padding,
            min_cell_area: match mode {
                ImageMode::Shrunk => SHRINK_MIN_CELL_AREA,
                _ => self.config.min_cell_area,
            },
        }
    }

    fn place_images(
        &self,
        entry: &Entry,
        images: &[ImageSpec],
        body: &Rect,
        has_text: bool,
        mode: ImageMode,
    ) -> Result<ImagePlan, LayoutError> {
        let config = self.config;
        let aspects: Vec<_> = images.iter().map(ImageSpec::aspect).collect();
        let params = self.pack_params(mode);

        let mut fractions = Vec::new();
        if has_text && mode == ImageMode::Zoned {
            let mut f = config.zones.fraction_for(images.len());
            while f < 1.0 {
                fractions.push(f);
                f += ZONE_ESCALATION_STEP;
            }
        }
        fractions.push(1.0);

        let mut last_error = None;
        for fraction in fractions {
            let (zone, text_zone) = if fraction >= 1.0 {
                (Some(*body), None)
            } else {
                body.split_top(body.height() * fraction, config.image_padding)
            };
            let Some(zone) = zone else { continue };
            match pack::pack(&aspects, &zone, &params) {
                Ok(slots) => {
                    if fraction > config.zones.fraction_for(images.len()) && has_text {
                        tracing::debug!(title = %entry.title, fraction, "image zone escalated");
                    }
                    return Ok(self.reclaim_slack(slots, &zone, text_zone, body));
                }
                Err(e) => last_error = Some(e),
            }
        }

        let source = last_error.unwrap_or(PackError::InsufficientSpace {
            count: images.len(),
            width: body.width(),
            height: body.height(),
            min_cell_area: params.min_cell_area,
        });
        Err(LayoutError::ImagesDoNotFit {
            title: entry.title.clone(),
            count: images.len(),
            source,
        })
    }

    /// Pull the images to the top of their zone and start the text zone
    /// just below them.
    fn reclaim_slack(
        &self,
        slots: Vec<PackedSlot>,
        zone: &Rect,
        text_zone: Option<Rect>,
        body: &Rect,
    ) -> ImagePlan {
        if !self.config.reclaim_image_slack || text_zone.is_none() {
            return ImagePlan { slots, text_zone };
        }
        let top = slots.iter().map(|s| s.image.y()).fold(f64::INFINITY, f64::min);
        // Guillotine clusters keep their padding from the zone edge.
        let inset = match pack::PackStrategy::for_count(slots.len()) {
            Some(pack::PackStrategy::Guillotine) => self.config.image_padding,
            _ => 0.0,
        };
        let dy = (top - zone.y() - inset).max(0.0);
        let slots: Vec<PackedSlot> = slots
            .into_iter()
            .map(|s| {
                let image = s.image.translate(0.0, -dy);
                // The cell keeps its columns but shrinks to the image rows.
                let cell = Rect::new(s.cell.x(), image.y(), s.cell.width(), image.height())
                    .unwrap_or(image);
                PackedSlot { cell, image }
            })
            .collect();
        let lowest = slots.iter().map(|s| s.image.bottom()).fold(zone.y(), f64::max);
        let text_top = lowest + self.config.image_padding;
        let reclaimed = Rect::new(body.x(), text_top, body.width(), body.bottom() - text_top).ok();
        ImagePlan {
            slots,
            text_zone: reclaimed.or(text_zone),
        }
    }

    fn flow_params(&self, font_size: f64, zone: &Rect) -> FlowParams {
        FlowParams {
            font_size,
            line_height: font_size * self.config.line_height,
            column_width: zone.width(),
            available_height: zone.height(),
        }
    }

    fn flow_options(&self) -> FlowOptions {
        FlowOptions {
            paragraph_spacing: self.config.paragraph_spacing,
            min_orphan_lines: self.config.min_orphan_lines,
            min_widow_lines: self.config.min_widow_lines,
            force_progress: false,
        }
    }

    /// Flow into the first fragment's text zone, fitting to space if enabled.
    fn flow_first(&self, run: &TextRun, zone: &Rect) -> (FlowResult, f64) {
        let config = self.config;
        let params = self.flow_params(config.text_font_size, zone);
        let metrics = self.fonts.body.as_ref();
        if config.fit_text {
            let fitted = text::fit_to_space(
                run,
                &params,
                &self.flow_options(),
                config.min_text_font_size,
                config.font_size_step,
                metrics,
            );
            (fitted.flow, fitted.font_size)
        } else {
            (
                text::flow(run, &params, &self.flow_options(), metrics),
                config.text_font_size,
            )
        }
    }

    fn text_box(
        &self,
        title: &str,
        zone: &Rect,
        result: &FlowResult,
        font_size: f64,
    ) -> Result<Option<PlacedBox>, LayoutError> {
        if result.lines.is_empty() {
            return Ok(None);
        }
        let rect = Rect::new(zone.x(), zone.y(), zone.width(), result.height).map_err(
            |source: GeometryError| LayoutError::Geometry {
                title: title.to_string(),
                source,
            },
        )?;
        Ok(Some(PlacedBox::text(
            rect,
            TextBlock {
                lines: result.lines.clone(),
                font_size,
                line_height: font_size * self.config.line_height,
                font: self.config.text_font.clone(),
            },
        )))
    }
}

/// Plan one entry against `region`.
pub fn layout_entry(
    entry: &Entry,
    region: Rect,
    config: &PhotobookConfig,
    fonts: &Typefaces,
) -> Result<EntryLayout, LayoutError> {
    EntryPlanner::new(config, fonts).plan(entry, region)
}
