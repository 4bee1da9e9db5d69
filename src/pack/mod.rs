//! # Rectangle Packer
//!
//! Places N images of known aspect ratio into a container without overlap.
//! The arrangement depends only on the image count, so the packer is a
//! table of strategies keyed by count, each a pure function with the same
//! contract:
//!
//! | count | strategy     | shape                                        |
//! |-------|--------------|----------------------------------------------|
//! | 1     | `Single`     | the whole container                          |
//! | 2     | `Columns`    | two equal columns separated by the padding   |
//! | 3     | `TwoOverOne` | two cells on top, one full-width cell below  |
//! | 4+    | `Guillotine` | best-area-fit packing at the largest scale   |
//!
//! Every strategy is deterministic: same aspects and container in, same
//! rectangles out. Failures are reported as `PackError::InsufficientSpace`
//! and left to the caller to recover from.

pub mod guillotine;

use serde::Serialize;

use crate::error::PackError;
use crate::geometry::Rect;
use crate::model::AspectRatio;

/// Where one image goes: the cell its strategy allotted and the
/// aspect-preserving image rectangle centered inside it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PackedSlot {
    pub cell: Rect,
    pub image: Rect,
}

/// Tunables shared by every strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackParams {
    /// Mandatory spacing between neighbouring cells.
    pub padding: f64,
    /// Smallest image area in pt² any strategy may produce.
    pub min_cell_area: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackStrategy {
    Single,
    Columns,
    TwoOverOne,
    Guillotine,
}

type StrategyFn = fn(&[AspectRatio], &Rect, &PackParams) -> Result<Vec<PackedSlot>, PackError>;

/// `(min count, max count, strategy)`; `None` means unbounded.
const STRATEGY_TABLE: &[(usize, Option<usize>, PackStrategy)] = &[
    (1, Some(1), PackStrategy::Single),
    (2, Some(2), PackStrategy::Columns),
    (3, Some(3), PackStrategy::TwoOverOne),
    (4, None, PackStrategy::Guillotine),
];

impl PackStrategy {
    /// The strategy for `count` images. `None` for zero.
    pub fn for_count(count: usize) -> Option<Self> {
        STRATEGY_TABLE
            .iter()
            .find(|(min, max, _)| count >= *min && max.map_or(true, |m| count <= m))
            .map(|(_, _, strategy)| *strategy)
    }

    fn function(&self) -> StrategyFn {
        match self {
            PackStrategy::Single => pack_single,
            PackStrategy::Columns => pack_columns,
            PackStrategy::TwoOverOne => pack_two_over_one,
            PackStrategy::Guillotine => guillotine::pack,
        }
    }

    pub fn pack(
        &self,
        aspects: &[AspectRatio],
        container: &Rect,
        params: &PackParams,
    ) -> Result<Vec<PackedSlot>, PackError> {
        (self.function())(aspects, container, params)
    }
}

/// Pack `aspects` into `container`, one slot per aspect in input order.
pub fn pack(
    aspects: &[AspectRatio],
    container: &Rect,
    params: &PackParams,
) -> Result<Vec<PackedSlot>, PackError> {
    match PackStrategy::for_count(aspects.len()) {
        Some(strategy) => strategy.pack(aspects, container, params),
        None => Ok(Vec::new()),
    }
}

pub(crate) fn insufficient(count: usize, container: &Rect, params: &PackParams) -> PackError {
    PackError::InsufficientSpace {
        count,
        width: container.width(),
        height: container.height(),
        min_cell_area: params.min_cell_area,
    }
}

/// Letterbox each aspect into its cell and enforce the minimum image area.
fn fill_cells(
    aspects: &[AspectRatio],
    cells: Vec<Option<Rect>>,
    container: &Rect,
    params: &PackParams,
) -> Result<Vec<PackedSlot>, PackError> {
    aspects
        .iter()
        .zip(cells)
        .map(|(aspect, cell)| {
            let cell = cell.ok_or_else(|| insufficient(aspects.len(), container, params))?;
            let image = cell.fit_aspect(aspect.value());
            if image.area() < params.min_cell_area {
                return Err(insufficient(aspects.len(), container, params));
            }
            Ok(PackedSlot { cell, image })
        })
        .collect()
}

fn pack_single(
    aspects: &[AspectRatio],
    container: &Rect,
    params: &PackParams,
) -> Result<Vec<PackedSlot>, PackError> {
    fill_cells(aspects, vec![Some(*container)], container, params)
}

fn pack_columns(
    aspects: &[AspectRatio],
    container: &Rect,
    params: &PackParams,
) -> Result<Vec<PackedSlot>, PackError> {
    let col_w = (container.width() - params.padding) / 2.0;
    let (x, y, h) = (container.x(), container.y(), container.height());
    let cells = vec![
        Rect::new(x, y, col_w, h).ok(),
        Rect::new(x + col_w + params.padding, y, col_w, h).ok(),
    ];
    fill_cells(aspects, cells, container, params)
}

fn pack_two_over_one(
    aspects: &[AspectRatio],
    container: &Rect,
    params: &PackParams,
) -> Result<Vec<PackedSlot>, PackError> {
    let p = params.padding;
    let row_h = (container.height() - p) / 2.0;
    let col_w = (container.width() - p) / 2.0;
    let (x, y) = (container.x(), container.y());
    let cells = vec![
        Rect::new(x, y, col_w, row_h).ok(),
        Rect::new(x + col_w + p, y, col_w, row_h).ok(),
        Rect::new(x, y + row_h + p, container.width(), row_h).ok(),
    ];
    fill_cells(aspects, cells, container, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aspects(values: &[f64]) -> Vec<AspectRatio> {
        values.iter().map(|&v| AspectRatio::new(v).unwrap()).collect()
    }

    fn params(padding: f64) -> PackParams {
        PackParams {
            padding,
            min_cell_area: 900.0,
        }
    }

    fn assert_disjoint(slots: &[PackedSlot]) {
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                assert_eq!(a.image.intersection_area(&b.image), 0.0);
                assert_eq!(a.cell.intersection_area(&b.cell), 0.0);
            }
        }
    }

    #[test]
    fn strategy_table_by_count() {
        assert_eq!(PackStrategy::for_count(0), None);
        assert_eq!(PackStrategy::for_count(1), Some(PackStrategy::Single));
        assert_eq!(PackStrategy::for_count(2), Some(PackStrategy::Columns));
        assert_eq!(PackStrategy::for_count(3), Some(PackStrategy::TwoOverOne));
        assert_eq!(PackStrategy::for_count(4), Some(PackStrategy::Guillotine));
        assert_eq!(PackStrategy::for_count(40), Some(PackStrategy::Guillotine));
    }

    #[test]
    fn no_images_packs_nothing() {
        let c = Rect::new(0.0, 0.0, 100.0, 100.0).unwrap();
        assert!(pack(&[], &c, &params(5.0)).unwrap().is_empty());
    }

    #[test]
    fn single_image_is_letterboxed() {
        let c = Rect::new(10.0, 20.0, 400.0, 200.0).unwrap();
        let slots = pack(&aspects(&[1.0]), &c, &params(5.0)).unwrap();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].cell, c);
        assert!((slots[0].image.width() - 200.0).abs() < 1e-9);
        assert!((slots[0].image.x() - 110.0).abs() < 1e-9);
    }

    #[test]
    fn two_columns_split_by_padding() {
        let c = Rect::new(0.0, 0.0, 210.0, 300.0).unwrap();
        let slots = pack(&aspects(&[1.0, 0.5]), &c, &params(10.0)).unwrap();
        assert_eq!(slots[0].cell.width(), 100.0);
        assert_eq!(slots[1].cell.x(), 110.0);
        assert!((slots[0].image.height() - 100.0).abs() < 1e-9);
        assert!((slots[1].image.height() - 200.0).abs() < 1e-9);
        assert_disjoint(&slots);
    }

    #[test]
    fn three_images_two_over_one() {
        let c = Rect::new(0.0, 0.0, 305.0, 205.0).unwrap();
        let slots = pack(&aspects(&[1.5, 1.5, 3.0]), &c, &params(5.0)).unwrap();
        assert_eq!(slots[0].cell.width(), 150.0);
        assert_eq!(slots[0].cell.height(), 100.0);
        assert_eq!(slots[2].cell.y(), 105.0);
        assert_eq!(slots[2].cell.width(), 305.0);
        assert_disjoint(&slots);
    }

    #[test]
    fn small_counts_respect_container_and_padding() {
        let c = Rect::new(0.0, 0.0, 300.0, 200.0).unwrap();
        let p = 8.0;
        for n in 1..=3 {
            let a = aspects(&[1.0, 0.75, 1.78][..n]);
            let slots = pack(&a, &c, &params(p)).unwrap();
            assert_eq!(slots.len(), n);
            assert_disjoint(&slots);
            let total: f64 = slots.iter().map(|s| s.image.area()).sum();
            assert!(total <= c.area());
            for s in &slots {
                assert!(c.contains(&s.cell));
                assert!(s.cell.contains(&s.image));
            }
        }
    }

    #[test]
    fn tiny_container_is_insufficient() {
        let c = Rect::new(0.0, 0.0, 20.0, 20.0).unwrap();
        assert!(matches!(
            pack(&aspects(&[1.0]), &c, &params(5.0)),
            Err(PackError::InsufficientSpace { count: 1, .. })
        ));
        // Padding wider than the container leaves no column.
        let narrow = Rect::new(0.0, 0.0, 4.0, 400.0).unwrap();
        assert!(pack(&aspects(&[1.0, 1.0]), &narrow, &params(5.0)).is_err());
    }
}
