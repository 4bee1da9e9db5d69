//! # Fragment Break Decisions
//!
//! Deciding how many lines of a paragraph go on the current fragment and
//! how many continue on the next one. Orphan and widow minimums keep a
//! paragraph from leaving a lone line at the bottom of a fragment or at the
//! top of the next.

/// What to do with a paragraph that reaches the bottom of a fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Every line fits.
    Place,
    /// Start the paragraph on the next fragment.
    Defer,
    /// Place some lines here, continue with the rest on the next fragment.
    Split {
        /// How many lines fit on the current fragment.
        lines_here: usize,
    },
}

/// Orphan and widow minimums. `1/1` is plain greedy breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakRules {
    pub min_orphan_lines: usize,
    pub min_widow_lines: usize,
}

impl BreakRules {
    pub const GREEDY: BreakRules = BreakRules {
        min_orphan_lines: 1,
        min_widow_lines: 1,
    };
}

/// Number of leading lines whose heights fit in `remaining_height`.
pub fn lines_that_fit(remaining_height: f64, line_heights: &[f64]) -> usize {
    let mut running = 0.0;
    let mut count = 0;
    for &h in line_heights {
        if running + h > remaining_height {
            break;
        }
        running += h;
        count += 1;
    }
    count
}

/// Given the height left on a fragment and a paragraph's line heights,
/// decide how to break it.
pub fn decide_break(
    remaining_height: f64,
    line_heights: &[f64],
    rules: &BreakRules,
) -> BreakDecision {
    let total: f64 = line_heights.iter().sum();
    if total <= remaining_height {
        return BreakDecision::Place;
    }

    let fit = lines_that_fit(remaining_height, line_heights);
    let total_lines = line_heights.len();

    // Too few lines would stay behind (orphan).
    if fit < rules.min_orphan_lines && fit < total_lines {
        return BreakDecision::Defer;
    }

    // Too few lines would carry over (widow): pull some back.
    let carried = total_lines - fit;
    if carried < rules.min_widow_lines && carried > 0 {
        let adjusted = fit.saturating_sub(rules.min_widow_lines - carried);
        if adjusted == 0 || adjusted < rules.min_orphan_lines {
            return BreakDecision::Defer;
        }
        return BreakDecision::Split {
            lines_here: adjusted,
        };
    }

    if fit == 0 {
        return BreakDecision::Defer;
    }

    BreakDecision::Split { lines_here: fit }
}
