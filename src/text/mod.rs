//! # Text Flow
//!
//! Greedy word wrapping and height-bounded flow. Text is measured with a
//! caller-supplied [`FontMetrics`], words are never split, and anything that
//! does not fit the available height comes back as a word-granular
//! remainder for the next fragment.

use serde::Serialize;

use crate::font::FontMetrics;
use crate::geometry::EPSILON;
use crate::layout::page_break::{decide_break, lines_that_fit, BreakDecision, BreakRules};
use crate::model::{Paragraph, TextRun};

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    /// Total width of the line.
    pub width: f64,
}

/// A line placed inside a text box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedLine {
    pub text: String,
    pub width: f64,
    /// Top of the line relative to the top of its text box.
    pub y_offset: f64,
    /// First line of a paragraph (false for the tail of a split paragraph).
    pub paragraph_start: bool,
}

/// Measurements for one flow pass. All lengths in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowParams {
    pub font_size: f64,
    /// Distance between consecutive baselines.
    pub line_height: f64,
    pub column_width: f64,
    pub available_height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowOptions {
    /// Extra space between paragraphs, in lines.
    pub paragraph_spacing: f64,
    pub min_orphan_lines: usize,
    pub min_widow_lines: usize,
    /// Place at least one line even if it does not fit. Set on fresh
    /// fragments so continuation always consumes a word.
    pub force_progress: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            paragraph_spacing: 1.0,
            min_orphan_lines: 1,
            min_widow_lines: 1,
            force_progress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowResult {
    pub lines: Vec<WrappedLine>,
    /// Height consumed, including paragraph spacing.
    pub height: f64,
    /// Words that did not fit, in order. `None` when everything was placed.
    pub remainder: Option<TextRun>,
}

/// Word index range of one line plus its measured width.
#[derive(Debug, Clone, Copy)]
struct LineSpan {
    start: usize,
    end: usize,
    width: f64,
}

/// Greedy line breaking over pre-split words. Each word is measured once
/// and line width is additive. A word wider than the column sits alone.
fn break_words(
    words: &[String],
    font_size: f64,
    column_width: f64,
    metrics: &dyn FontMetrics,
) -> Vec<LineSpan> {
    let space = metrics.space_width(font_size);
    let mut spans = Vec::new();
    let mut current: Option<LineSpan> = None;

    for (i, word) in words.iter().enumerate() {
        let w = metrics.measure_width(word, font_size);
        current = match current {
            None => Some(LineSpan {
                start: i,
                end: i + 1,
                width: w,
            }),
            Some(mut span) => {
                if span.width + space + w <= column_width + EPSILON {
                    span.end = i + 1;
                    span.width += space + w;
                    Some(span)
                } else {
                    spans.push(span);
                    Some(LineSpan {
                        start: i,
                        end: i + 1,
                        width: w,
                    })
                }
            }
        };
    }
    spans.extend(current);
    spans
}

/// Wrap a sequence of words into lines of at most `column_width`.
pub fn wrap_words(
    words: &[String],
    font_size: f64,
    column_width: f64,
    metrics: &dyn FontMetrics,
) -> Vec<TextLine> {
    break_words(words, font_size, column_width, metrics)
        .into_iter()
        .map(|span| TextLine {
            text: words[span.start..span.end].join(" "),
            width: span.width,
        })
        .collect()
}

/// Unbounded greedy wrap of a whole run. Every paragraph starts a new line.
pub fn wrap(
    run: &TextRun,
    font_size: f64,
    column_width: f64,
    metrics: &dyn FontMetrics,
) -> Vec<TextLine> {
    run.paragraphs
        .iter()
        .flat_map(|p| wrap_words(&p.words, font_size, column_width, metrics))
        .collect()
}

/// Flow `run` into a box of `params.available_height`.
///
/// Paragraphs are placed in order. Each paragraph is wrapped, then the break
/// decider picks how many of its lines go here given the orphan and widow
/// minimums. The first paragraph not placed in full ends the pass: its
/// unplaced words and all later paragraphs become the remainder.
pub fn flow(
    run: &TextRun,
    params: &FlowParams,
    options: &FlowOptions,
    metrics: &dyn FontMetrics,
) -> FlowResult {
    let lh = params.line_height;
    let mut lines: Vec<WrappedLine> = Vec::new();
    let mut used = 0.0;

    for (pi, para) in run.paragraphs.iter().enumerate() {
        if para.is_empty() {
            continue;
        }
        let spans = break_words(&para.words, params.font_size, params.column_width, metrics);
        let gap = if lines.is_empty() {
            0.0
        } else {
            options.paragraph_spacing * lh
        };
        let remaining = params.available_height - used - gap;
        let heights = vec![lh; spans.len()];

        let rules = BreakRules {
            min_orphan_lines: options.min_orphan_lines,
            min_widow_lines: options.min_widow_lines,
        };
        let mut take = match decide_break(remaining, &heights, &rules) {
            BreakDecision::Place => spans.len(),
            BreakDecision::Split { lines_here } => lines_here,
            BreakDecision::Defer => 0,
        };
        if take == 0 && lines.is_empty() && options.force_progress {
            // A fresh fragment cannot do better by waiting.
            take = lines_that_fit(remaining, &heights).max(1);
        }

        if take > 0 {
            let top = used + gap;
            for (li, span) in spans[..take].iter().enumerate() {
                lines.push(WrappedLine {
                    text: para.words[span.start..span.end].join(" "),
                    width: span.width,
                    y_offset: top + li as f64 * lh,
                    paragraph_start: li == 0 && !para.continues,
                });
            }
            used = top + take as f64 * lh;
        }

        if take < spans.len() {
            let split_at = spans[take].start;
            let mut rest = Vec::with_capacity(run.paragraphs.len() - pi);
            rest.push(Paragraph {
                words: para.words[split_at..].to_vec(),
                continues: para.continues || take > 0,
            });
            rest.extend(run.paragraphs[pi + 1..].iter().cloned());
            return FlowResult {
                lines,
                height: used,
                remainder: Some(TextRun { paragraphs: rest }),
            };
        }
    }

    FlowResult {
        lines,
        height: used,
        remainder: None,
    }
}

/// Result of [`fit_to_space`]: the font size that was settled on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FittedFlow {
    pub font_size: f64,
    pub line_height: f64,
    pub flow: FlowResult,
}

/// Flow with decreasing font sizes until the whole run fits or `floor` is
/// reached. Line height keeps its ratio to the font size.
pub fn fit_to_space(
    run: &TextRun,
    params: &FlowParams,
    options: &FlowOptions,
    floor: f64,
    step: f64,
    metrics: &dyn FontMetrics,
) -> FittedFlow {
    let ratio = params.line_height / params.font_size;
    let mut size = params.font_size;
    loop {
        let attempt = FlowParams {
            font_size: size,
            line_height: size * ratio,
            ..*params
        };
        let result = flow(run, &attempt, options, metrics);
        if result.remainder.is_none() || size <= floor || step <= 0.0 {
            if size < params.font_size {
                tracing::debug!(from = params.font_size, to = size, "shrunk text to fit");
            }
            return FittedFlow {
                font_size: size,
                line_height: attempt.line_height,
                flow: result,
            };
        }
        size = (size - step).max(floor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::MonospaceMetrics;

    // Every char is 5pt wide at size 10, and so is the space.
    fn mono() -> MonospaceMetrics {
        MonospaceMetrics::new(0.5)
    }

    fn params(column_width: f64, available_height: f64) -> FlowParams {
        FlowParams {
            font_size: 10.0,
            line_height: 12.0,
            column_width,
            available_height,
        }
    }

    fn words_of(lines: &[WrappedLine]) -> Vec<String> {
        lines
            .iter()
            .flat_map(|l| l.text.split_whitespace().map(str::to_string))
            .collect()
    }

    #[test]
    fn greedy_wrap_packs_words() {
        // "aaa bbb" = 7 chars = 35pt fits in 40pt; adding " ccc" does not.
        let run = TextRun::parse("aaa bbb ccc ddd");
        let lines = wrap(&run, 10.0, 40.0, &mono());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "aaa bbb");
        assert_eq!(lines[0].width, 35.0);
        assert_eq!(lines[1].text, "ccc ddd");
    }

    #[test]
    fn long_word_sits_alone() {
        let run = TextRun::parse("a extraordinarily b");
        let lines = wrap(&run, 10.0, 30.0, &mono());
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "extraordinarily", "b"]);
        assert!(lines[1].width > 30.0);
    }

    #[test]
    fn paragraphs_force_breaks_and_spacing() {
        let run = TextRun::parse("one\n\ntwo");
        let result = flow(&run, &params(100.0, 1000.0), &FlowOptions::default(), &mono());
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[0].y_offset, 0.0);
        // One line plus one line of paragraph spacing.
        assert_eq!(result.lines[1].y_offset, 24.0);
        assert!(result.lines[1].paragraph_start);
        assert_eq!(result.height, 36.0);
        assert!(result.remainder.is_none());
    }

    #[test]
    fn infinite_height_matches_greedy_wrap() {
        let text = "lorem ipsum dolor sit amet consectetur\n\nadipiscing elit sed do eiusmod tempor";
        let run = TextRun::parse(text);
        let result = flow(
            &run,
            &params(60.0, f64::INFINITY),
            &FlowOptions::default(),
            &mono(),
        );
        assert!(result.remainder.is_none());
        assert_eq!(result.lines.len(), wrap(&run, 10.0, 60.0, &mono()).len());
    }

    #[test]
    fn zero_height_returns_everything() {
        let run = TextRun::parse("alpha beta\n\ngamma");
        let result = flow(&run, &params(100.0, 0.0), &FlowOptions::default(), &mono());
        assert!(result.lines.is_empty());
        assert_eq!(result.height, 0.0);
        assert_eq!(result.remainder, Some(run));
    }

    #[test]
    fn remainder_continues_mid_paragraph() {
        // 4 lines of one word each, room for 2.
        let run = TextRun::parse("aaaa bbbb cccc dddd");
        let result = flow(&run, &params(20.0, 24.0), &FlowOptions::default(), &mono());
        assert_eq!(result.lines.len(), 2);
        let rest = result.remainder.unwrap();
        assert_eq!(rest.paragraphs.len(), 1);
        assert!(rest.paragraphs[0].continues);
        assert_eq!(rest.paragraphs[0].words, vec!["cccc", "dddd"]);

        let next = flow(&rest, &params(20.0, 24.0), &FlowOptions::default(), &mono());
        assert!(!next.lines[0].paragraph_start);
        assert!(next.remainder.is_none());
    }

    #[test]
    fn continuation_reconstructs_word_sequence() {
        let text = (0..120)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
            .replace("w40 ", "w40\n\n")
            .replace("w85 ", "w85\n\n");
        let run = TextRun::parse(&text);
        let opts = FlowOptions {
            force_progress: true,
            ..Default::default()
        };
        let mut all = Vec::new();
        let mut pending = Some(run.clone());
        let mut passes = 0;
        while let Some(current) = pending {
            let result = flow(&current, &params(80.0, 50.0), &opts, &mono());
            assert!(result.height <= 50.0);
            all.extend(words_of(&result.lines));
            pending = result.remainder;
            passes += 1;
        }
        assert!(passes > 1);
        let original: Vec<String> = run.words().map(str::to_string).collect();
        assert_eq!(all, original);
    }

    #[test]
    fn force_progress_places_a_line_that_does_not_fit() {
        let run = TextRun::parse("tall");
        let opts = FlowOptions {
            force_progress: true,
            ..Default::default()
        };
        let result = flow(&run, &params(100.0, 5.0), &opts, &mono());
        assert_eq!(result.lines.len(), 1);
        assert!(result.remainder.is_none());

        let without = flow(&run, &params(100.0, 5.0), &FlowOptions::default(), &mono());
        assert!(without.lines.is_empty());
    }

    #[test]
    fn orphan_control_moves_short_starts() {
        // Second paragraph would start with one line at the bottom.
        let run = TextRun::parse("a\n\nb c d");
        let opts = FlowOptions {
            paragraph_spacing: 0.0,
            min_orphan_lines: 2,
            min_widow_lines: 1,
            force_progress: false,
        };
        let result = flow(&run, &params(5.0, 24.0), &opts, &mono());
        assert_eq!(words_of(&result.lines), vec!["a"]);
        let rest = result.remainder.unwrap();
        assert!(!rest.paragraphs[0].continues);
        assert_eq!(rest.paragraphs[0].words, vec!["b", "c", "d"]);
    }

    #[test]
    fn widow_control_pulls_lines_back() {
        // 4 one-word lines, 3 fit; a single trailing line is a widow.
        let run = TextRun::parse("a b c d");
        let opts = FlowOptions {
            min_widow_lines: 2,
            ..Default::default()
        };
        let result = flow(&run, &params(5.0, 36.0), &opts, &mono());
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.remainder.unwrap().word_count(), 2);
    }

    #[test]
    fn fit_to_space_shrinks_until_it_fits() {
        let run = TextRun::parse("aaaa bbbb cccc dddd");
        // At size 10 each word is 20pt, two per line need 45pt.
        let p = FlowParams {
            font_size: 10.0,
            line_height: 12.0,
            column_width: 45.0,
            available_height: 20.0,
        };
        let fitted = fit_to_space(&run, &p, &FlowOptions::default(), 5.0, 1.0, &mono());
        assert!(fitted.flow.remainder.is_none());
        assert!(fitted.font_size < 10.0);
        assert!(fitted.font_size >= 5.0);
        assert!((fitted.line_height / fitted.font_size - 1.2).abs() < 1e-9);
    }

    #[test]
    fn fit_to_space_stops_at_floor() {
        let run = TextRun::parse(&"word ".repeat(200));
        let fitted = fit_to_space(
            &run,
            &params(50.0, 24.0),
            &FlowOptions::default(),
            7.0,
            0.5,
            &mono(),
        );
        assert_eq!(fitted.font_size, 7.0);
        assert!(fitted.flow.remainder.is_some());
    }
}
