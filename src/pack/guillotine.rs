//! Guillotine best-area-fit packing for four or more images.
//!
//! Every image gets a nominal box of equal area `s² · A / N` (A = container
//! area) shaped by its aspect ratio. For a given scale `s` the boxes are
//! placed tallest first into a free list of rectangles, each box going to
//! the free rectangle it leaves the least area in; the used rectangle is
//! split in two along the axis that keeps the larger leftover whole. The
//! largest feasible scale is found by bisection, and the resulting cluster
//! is centered in the container.
//!
//! The bin starts one padding in from the top-left corner of the container
//! and each box is grown by the padding on its right and bottom edges, so
//! every box keeps at least the padding from its neighbours and from the
//! container edges.

use std::cmp::Ordering;

use super::{insufficient, PackParams, PackedSlot};
use crate::error::PackError;
use crate::geometry::{Rect, EPSILON};
use crate::model::AspectRatio;

const BISECTION_STEPS: usize = 40;

/// Guards the scale search against a zero minimum area.
const MIN_AREA_FLOOR: f64 = 1e-3;

#[derive(Debug, Clone, Copy)]
struct FreeRect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Nominal `(w, h)` for every aspect at scale 1.
fn nominal_sizes(aspects: &[AspectRatio], container: &Rect) -> Vec<(f64, f64)> {
    let cell_area = container.area() / aspects.len() as f64;
    aspects
        .iter()
        .map(|a| {
            let a = a.value();
            ((cell_area * a).sqrt(), (cell_area / a).sqrt())
        })
        .collect()
}

/// Input indices, tallest first, then widest, then input order.
fn placement_order(sizes: &[(f64, f64)]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        sizes[b]
            .1
            .total_cmp(&sizes[a].1)
            .then(sizes[b].0.total_cmp(&sizes[a].0))
            .then(a.cmp(&b))
    });
    order
}

/// Try to place every box at `scale`. Returns placements in input order.
fn place_all(
    sizes: &[(f64, f64)],
    order: &[usize],
    scale: f64,
    container: &Rect,
    padding: f64,
) -> Option<Vec<Placement>> {
    let mut free = vec![FreeRect {
        x: padding,
        y: padding,
        w: container.width() - padding,
        h: container.height() - padding,
    }];
    let mut placed: Vec<Option<Placement>> = vec![None; sizes.len()];

    for &i in order {
        let (w, h) = (sizes[i].0 * scale, sizes[i].1 * scale);
        let (bw, bh) = (w + padding, h + padding);

        let best = free
            .iter()
            .enumerate()
            .filter(|(_, fr)| bw <= fr.w + EPSILON && bh <= fr.h + EPSILON)
            .min_by(|(_, a), (_, b)| fit_key(a, bw, bh).cmp_with(&fit_key(b, bw, bh)))
            .map(|(idx, _)| idx)?;

        let fr = free.swap_remove(best);
        placed[i] = Some(Placement {
            x: fr.x,
            y: fr.y,
            w,
            h,
        });

        let (lw, lh) = (fr.w - bw, fr.h - bh);
        let (right, below) = if lw * fr.h >= fr.w * lh {
            // Keep the right-hand leftover at full height.
            (
                FreeRect { x: fr.x + bw, y: fr.y, w: lw, h: fr.h },
                FreeRect { x: fr.x, y: fr.y + bh, w: bw, h: lh },
            )
        } else {
            (
                FreeRect { x: fr.x + bw, y: fr.y, w: lw, h: bh },
                FreeRect { x: fr.x, y: fr.y + bh, w: fr.w, h: lh },
            )
        };
        for r in [right, below] {
            if r.w > EPSILON && r.h > EPSILON {
                free.push(r);
            }
        }
        // swap_remove reorders the list; keep candidate order stable.
        free.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    }

    placed.into_iter().collect()
}

struct FitKey {
    leftover_area: f64,
    short_side: f64,
    y: f64,
    x: f64,
}

impl FitKey {
    fn cmp_with(&self, other: &FitKey) -> Ordering {
        self.leftover_area
            .total_cmp(&other.leftover_area)
            .then(self.short_side.total_cmp(&other.short_side))
            .then(self.y.total_cmp(&other.y))
            .then(self.x.total_cmp(&other.x))
    }
}

fn fit_key(fr: &FreeRect, bw: f64, bh: f64) -> FitKey {
    FitKey {
        leftover_area: fr.w * fr.h - bw * bh,
        short_side: (fr.w - bw).min(fr.h - bh),
        y: fr.y,
        x: fr.x,
    }
}

/// Pack four or more images. See the module docs.
pub fn pack(
    aspects: &[AspectRatio],
    container: &Rect,
    params: &PackParams,
) -> Result<Vec<PackedSlot>, PackError> {
    let n = aspects.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let padding = params.padding.max(0.0);
    let sizes = nominal_sizes(aspects, container);
    let order = placement_order(&sizes);

    let min_area = params.min_cell_area.max(MIN_AREA_FLOOR);
    let min_scale = (min_area * n as f64 / container.area()).sqrt();
    let (inner_w, inner_h) = (
        container.width() - 2.0 * padding,
        container.height() - 2.0 * padding,
    );
    if inner_w <= EPSILON || inner_h <= EPSILON {
        return Err(insufficient(n, container, params));
    }
    let max_scale = sizes
        .iter()
        .fold(1.0_f64, |acc, &(w, h)| acc.min(inner_w / w).min(inner_h / h));
    if min_scale > max_scale + EPSILON {
        return Err(insufficient(n, container, params));
    }

    let try_scale = |s: f64| place_all(&sizes, &order, s, container, padding);

    let (scale, placements) = match try_scale(max_scale) {
        Some(p) => (max_scale, p),
        None => {
            let mut lo = min_scale.min(max_scale);
            let mut best = try_scale(lo).ok_or_else(|| insufficient(n, container, params))?;
            let mut hi = max_scale;
            for _ in 0..BISECTION_STEPS {
                let mid = (lo + hi) / 2.0;
                match try_scale(mid) {
                    Some(p) => {
                        lo = mid;
                        best = p;
                    }
                    None => hi = mid,
                }
            }
            (lo, best)
        }
    };
    tracing::trace!(count = n, scale, "guillotine pack");

    // Center the cluster inside the container.
    let left = placements.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let top = placements.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let right = placements.iter().map(|p| p.x + p.w).fold(0.0, f64::max);
    let bottom = placements.iter().map(|p| p.y + p.h).fold(0.0, f64::max);
    let dx = container.x() + (container.width() - (right - left)).max(0.0) / 2.0 - left;
    let dy = container.y() + (container.height() - (bottom - top)).max(0.0) / 2.0 - top;

    placements
        .iter()
        .map(|p| {
            let rect = Rect::new(p.x + dx, p.y + dy, p.w, p.h)
                .map_err(|_| insufficient(n, container, params))?;
            Ok(PackedSlot {
                cell: rect,
                image: rect,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aspects(values: &[f64]) -> Vec<AspectRatio> {
        values.iter().map(|&v| AspectRatio::new(v).unwrap()).collect()
    }

    fn params(padding: f64, min_cell_area: f64) -> PackParams {
        PackParams {
            padding,
            min_cell_area,
        }
    }

    fn assert_valid(slots: &[PackedSlot], container: &Rect, padding: f64) {
        for (i, a) in slots.iter().enumerate() {
            assert!(container.contains(&a.image), "slot {i} escapes the container");
            assert!(a.image.x() - container.x() >= padding - 1e-6, "slot {i} hugs the left edge");
            assert!(a.image.y() - container.y() >= padding - 1e-6, "slot {i} hugs the top edge");
            assert!(container.right() - a.image.right() >= padding - 1e-6, "slot {i} hugs the right edge");
            assert!(container.bottom() - a.image.bottom() >= padding - 1e-6, "slot {i} hugs the bottom edge");
            for b in &slots[i + 1..] {
                assert_eq!(a.image.intersection_area(&b.image), 0.0);
                // Neighbours keep the padding between them.
                let gap_x = (b.image.x() - a.image.right()).max(a.image.x() - b.image.right());
                let gap_y = (b.image.y() - a.image.bottom()).max(a.image.y() - b.image.bottom());
                assert!(gap_x.max(gap_y) >= padding - 1e-6);
            }
        }
    }

    #[test]
    fn four_squares_fill_a_square() {
        let c = Rect::new(0.0, 0.0, 405.0, 405.0).unwrap();
        let slots = pack(&aspects(&[1.0; 4]), &c, &params(5.0, 900.0)).unwrap();
        assert_eq!(slots.len(), 4);
        assert_valid(&slots, &c, 5.0);
        for s in &slots {
            assert!((s.image.width() - s.image.height()).abs() < 1e-6);
            assert!(s.image.width() > 150.0);
        }
    }

    #[test]
    fn mixed_aspects_fit_without_overlap() {
        let c = Rect::new(30.0, 60.0, 378.0, 255.0).unwrap();
        let a = aspects(&[1.0, 1.0, 16.0 / 9.0, 9.0 / 16.0]);
        let slots = pack(&a, &c, &params(5.0, 900.0)).unwrap();
        assert_eq!(slots.len(), 4);
        assert_valid(&slots, &c, 5.0);
        for (slot, aspect) in slots.iter().zip(&a) {
            assert!((slot.image.aspect() - aspect.value()).abs() < 1e-6);
            assert!(slot.image.area() >= 900.0 - 1e-6);
            assert_eq!(slot.cell, slot.image);
        }
    }

    #[test]
    fn many_images_are_deterministic() {
        let c = Rect::new(0.0, 0.0, 500.0, 350.0).unwrap();
        let a = aspects(&[1.5, 0.66, 1.0, 1.33, 0.75, 2.0, 1.0, 0.5]);
        let first = pack(&a, &c, &params(4.0, 400.0)).unwrap();
        let second = pack(&a, &c, &params(4.0, 400.0)).unwrap();
        assert_eq!(first, second);
        assert_valid(&first, &c, 4.0);
    }

    #[test]
    fn five_images_in_a_tiny_container_fail() {
        let c = Rect::new(0.0, 0.0, 40.0, 40.0).unwrap();
        let result = pack(&aspects(&[1.0; 5]), &c, &params(5.0, 900.0));
        assert!(matches!(
            result,
            Err(PackError::InsufficientSpace { count: 5, .. })
        ));
    }

    #[test]
    fn padding_surrounds_the_cluster() {
        let c = Rect::new(0.0, 0.0, 405.0, 405.0).unwrap();
        let slots = pack(&aspects(&[1.0; 4]), &c, &params(5.0, 900.0)).unwrap();
        let left = slots.iter().map(|s| s.image.x()).fold(f64::INFINITY, f64::min);
        let right = slots.iter().map(|s| s.image.right()).fold(0.0, f64::max);
        assert!(left >= 5.0 - 1e-6);
        assert!(right <= 400.0 + 1e-6);
        assert!((left - (405.0 - right)).abs() < 1e-6);
    }

    #[test]
    fn padding_wider_than_half_the_container_fails() {
        let c = Rect::new(0.0, 0.0, 100.0, 100.0).unwrap();
        assert!(pack(&aspects(&[1.0; 4]), &c, &params(50.0, 1.0)).is_err());
    }

    #[test]
    fn placement_order_is_tallest_first_and_stable() {
        let sizes = vec![(10.0, 5.0), (5.0, 10.0), (10.0, 5.0), (8.0, 10.0)];
        assert_eq!(placement_order(&sizes), vec![3, 1, 0, 2]);
    }
}
