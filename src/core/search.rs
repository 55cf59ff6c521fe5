// Find-next over captured text
// Literal search with optional case folding, searching down or up from the
// current selection and wrapping around the ends of the text.

use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Search direction relative to the current selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Down,
    Up,
}

/// Options for a find-next request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    pub match_case: bool,
    pub direction: Direction,
}

impl FindOptions {
    pub fn new(match_case: bool, direction: Direction) -> Self {
        Self {
            match_case,
            direction,
        }
    }
}

fn literal_pattern(query: &str, match_case: bool) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(!match_case)
        .build()
}

/// Every match start, overlapping matches included
fn match_ranges(pattern: &Regex, text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut pos = 0;
    while pos <= text.len() {
        let Some(m) = pattern.find_at(text, pos) else {
            break;
        };
        ranges.push(m.range());
        // Advance one character past the match start
        pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
    }
    ranges
}

/// Find the next occurrence of `query` relative to `selection`
///
/// Searching down starts at the end of the selection; searching up looks for
/// the last match starting before the selection. Both wrap around once.
pub fn find_next(
    text: &str,
    query: &str,
    selection: Range<usize>,
    options: FindOptions,
) -> Option<Range<usize>> {
    if query.is_empty() || text.is_empty() {
        return None;
    }

    // Only fails when the escaped query exceeds the compiled size limit
    let pattern = literal_pattern(query, options.match_case).ok()?;
    let matches = match_ranges(&pattern, text);

    match options.direction {
        Direction::Down => matches
            .iter()
            .find(|m| m.start >= selection.end)
            .or_else(|| matches.first())
            .cloned(),
        Direction::Up => matches
            .iter()
            .rev()
            .find(|m| m.start < selection.start)
            .or_else(|| matches.last())
            .cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Boot OK\nboot failed\nBOOT OK\n";

    fn down(match_case: bool) -> FindOptions {
        FindOptions::new(match_case, Direction::Down)
    }

    fn up(match_case: bool) -> FindOptions {
        FindOptions::new(match_case, Direction::Up)
    }

    #[test]
    fn test_find_down_case_insensitive() {
        let first = find_next(TEXT, "boot", 0..0, down(false)).unwrap();
        assert_eq!(first, 0..4);

        let second = find_next(TEXT, "boot", first, down(false)).unwrap();
        assert_eq!(second, 8..12);

        let third = find_next(TEXT, "boot", second, down(false)).unwrap();
        assert_eq!(&TEXT[third.clone()], "BOOT");

        // Wraps back to the top
        assert_eq!(find_next(TEXT, "boot", third, down(false)), Some(0..4));
    }

    #[test]
    fn test_find_match_case() {
        assert_eq!(find_next(TEXT, "boot", 0..0, down(true)), Some(8..12));
        assert_eq!(find_next(TEXT, "BOOT", 9..9, down(true)), Some(20..24));
        assert_eq!(find_next(TEXT, "Reset", 0..0, down(true)), None);
    }

    #[test]
    fn test_find_up_wraps_to_end() {
        let last = find_next(TEXT, "ok", 0..0, up(false)).unwrap();
        assert_eq!(&TEXT[last.clone()], "OK");
        assert_eq!(last.start, 25);

        let prev = find_next(TEXT, "ok", last, up(false)).unwrap();
        assert_eq!(prev, 5..7);
    }

    #[test]
    fn test_find_overlapping() {
        let text = "aaaa";
        let first = find_next(text, "aa", 0..0, down(true)).unwrap();
        assert_eq!(first, 0..2);
        let second = find_next(text, "aa", 0..1, down(true)).unwrap();
        assert_eq!(second, 1..3);
        assert_eq!(find_next(text, "aa", 4..4, up(true)), Some(2..4));
    }

    #[test]
    fn test_find_regex_metacharacters_literal() {
        let text = "value=[1.5] (ok)";
        assert_eq!(find_next(text, "[1.5]", 0..0, down(true)), Some(6..11));
        assert_eq!(find_next(text, "(ok)", 0..0, down(true)), Some(12..16));
        assert_eq!(find_next(text, "1x5", 0..0, down(true)), None);
    }

    #[test]
    fn test_empty_query() {
        assert_eq!(find_next(TEXT, "", 0..0, down(false)), None);
        assert_eq!(find_next("", "x", 0..0, down(false)), None);
    }

    #[test]
    fn test_non_ascii_text() {
        let text = "température élevée\nTEMPÉRATURE";
        let hit = find_next(text, "température", 1..1, down(false)).unwrap();
        assert_eq!(&text[hit], "TEMPÉRATURE");
    }
}
