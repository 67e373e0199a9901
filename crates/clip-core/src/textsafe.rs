//! Word wrapping, drawtext escaping, and caption box layout.
//!
//! The escape targets ffmpeg's drawtext filter, where backslash, colon,
//! single quote, percent, and comma are all syntactically significant.
//! Escape order matters: backslash first so later escapes are not
//! themselves re-escaped.

use crate::overlay::OverlayLine;

/// Character budget for one rendered caption line.
pub const WRAP_BUDGET: usize = 60;

/// Caption box height for a single rendered line.
pub const CAPTION_BASE_HEIGHT: u32 = 60;

/// Additional box height (and vertical stacking step) per extra line.
pub const CAPTION_LINE_STEP: u32 = 35;

/// Bottom offset of the first caption line inside the box.
pub const CAPTION_FIRST_LINE_OFFSET: u32 = 48;

/// Greedily wrap a line at `budget` characters on whitespace boundaries.
///
/// A line that fits is returned unchanged. Words are never hyphenated;
/// a single word longer than the budget stays whole on its own line.
pub fn wrap_text(line: &str, budget: usize) -> String {
    if line.chars().count() <= budget {
        return line.to_string();
    }

    let mut wrapped = String::with_capacity(line.len() + 4);
    let mut current_len = 0usize;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if current_len == 0 {
            wrapped.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= budget {
            wrapped.push(' ');
            wrapped.push_str(word);
            current_len += 1 + word_len;
        } else {
            wrapped.push('\n');
            wrapped.push_str(word);
            current_len = word_len;
        }
    }

    wrapped
}

/// Escape text for a drawtext `text=` argument.
///
/// Order is load-bearing: backslash, colon, single quote, percent,
/// comma. Escaping backslash first keeps the backslashes introduced by
/// the later replacements intact.
pub fn escape_filter_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
        .replace('%', "\\%")
        .replace(',', "\\,")
}

/// Number of rendered lines in a wrapped text block.
pub fn rendered_line_count(text: &str) -> usize {
    1 + text.matches('\n').count()
}

/// Total rendered line count across all caption lines.
pub fn total_rendered_lines(lines: &[OverlayLine]) -> usize {
    lines
        .iter()
        .map(|line| rendered_line_count(&line.text))
        .sum()
}

/// Caption background box height for the given caption lines.
///
/// `max(60, 60 + (rendered - 1) * 35)`; the same 35px step drives the
/// vertical offsets of the stacked lines.
pub fn caption_box_height(lines: &[OverlayLine]) -> u32 {
    let rendered = total_rendered_lines(lines) as u32;
    CAPTION_BASE_HEIGHT.max(CAPTION_BASE_HEIGHT + rendered.saturating_sub(1) * CAPTION_LINE_STEP)
}

/// Font size and color for the caption line at `index`.
///
/// Bold white 34pt headline, light gray 28pt second line, darker gray
/// 24pt for the third line onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStyle {
    pub font_size: u32,
    pub color: &'static str,
}

pub fn line_style(index: usize) -> LineStyle {
    match index {
        0 => LineStyle {
            font_size: 34,
            color: "white",
        },
        1 => LineStyle {
            font_size: 28,
            color: "0xD8D8D8",
        },
        _ => LineStyle {
            font_size: 24,
            color: "0x9E9E9E",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn line(text: &str) -> OverlayLine {
        OverlayLine {
            text: text.to_string(),
            is_bold: false,
        }
    }

    #[test]
    fn test_short_line_unchanged() {
        assert_eq!(wrap_text("Scrum won against the head", 60), "Scrum won against the head");
    }

    #[test]
    fn test_wrap_packs_words_greedily() {
        let wrapped = wrap_text("one two three four", 9);
        assert_eq!(wrapped, "one two\nthree\nfour");
    }

    #[test]
    fn test_oversize_word_not_split() {
        let word = "a".repeat(80);
        let wrapped = wrap_text(&format!("x {word}"), 60);
        assert_eq!(wrapped, format!("x\n{word}"));
    }

    #[test]
    fn test_escape_order_does_not_renest() {
        // All five special characters at once.
        let input = r"50%:done\',next";
        let escaped = escape_filter_text(input);
        assert_eq!(escaped, r"50\%\:done\\\'\,next");
    }

    #[test]
    fn test_escape_backslash_before_colon() {
        // A lone backslash escapes to two; the colon escape's backslash
        // is not doubled afterwards.
        assert_eq!(escape_filter_text(r"a\b:c"), r"a\\b\:c");
    }

    #[test]
    fn test_box_height_ladder() {
        assert_eq!(caption_box_height(&[line("one")]), 60);
        assert_eq!(caption_box_height(&[line("one"), line("two")]), 95);
        assert_eq!(
            caption_box_height(&[line("one"), line("two"), line("three")]),
            130
        );
        // Embedded newlines count as rendered lines.
        assert_eq!(caption_box_height(&[line("a\nb\nc")]), 130);
        assert_eq!(caption_box_height(&[]), 60);
    }

    #[test]
    fn test_line_style_ladder() {
        assert_eq!(line_style(0).font_size, 34);
        assert_eq!(line_style(1).font_size, 28);
        assert_eq!(line_style(2).font_size, 24);
        // Overflow lines fall back to the last style.
        assert_eq!(line_style(7), line_style(2));
    }

    proptest! {
        #[test]
        fn prop_wrapped_lines_respect_budget(words in proptest::collection::vec("[a-z]{1,12}", 1..30)) {
            let text = words.join(" ");
            let wrapped = wrap_text(&text, WRAP_BUDGET);
            for rendered in wrapped.split('\n') {
                prop_assert!(rendered.chars().count() <= WRAP_BUDGET);
            }
        }

        #[test]
        fn prop_wrap_preserves_words(words in proptest::collection::vec("[a-z]{1,12}", 1..30)) {
            let text = words.join(" ");
            let wrapped = wrap_text(&text, WRAP_BUDGET);
            let rejoined: Vec<&str> = wrapped.split_whitespace().collect();
            prop_assert_eq!(rejoined, words.iter().map(String::as_str).collect::<Vec<_>>());
        }

        #[test]
        fn prop_escape_roundtrip_structure(s in "[a-zA-Z0-9:,'%\\\\ ]{0,40}") {
            let escaped = escape_filter_text(&s);
            // Every special character in the input ends up preceded by a
            // backslash, and unescaping restores the original.
            let unescaped = escaped
                .replace("\\,", ",")
                .replace("\\%", "%")
                .replace("\\'", "'")
                .replace("\\:", ":")
                .replace("\\\\", "\\");
            prop_assert_eq!(unescaped, s);
        }
    }
}
