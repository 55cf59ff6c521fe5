// Scrollback buffer for one tab
// Holds everything displayed so far plus the current find selection

use crate::core::search::{find_next, Direction, FindOptions};
use std::io;
use std::ops::Range;
use std::path::Path;

#[derive(Debug, Default, Clone)]
pub struct Scrollback {
    text: String,
    selection: Option<Range<usize>>,
}

impl Scrollback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text at the end of the buffer
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Drop all captured text
    pub fn clear(&mut self) {
        self.text.clear();
        self.selection = None;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Range of the last find match
    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selection.as_ref().map(|r| &self.text[r.clone()])
    }

    /// The last `count` lines (a trailing partial line counts as one)
    pub fn tail_lines(&self, count: usize) -> &str {
        if count == 0 {
            return "";
        }

        let body = self.text.strip_suffix('\n').unwrap_or(&self.text);
        let start = body
            .rmatch_indices('\n')
            .nth(count - 1)
            .map_or(0, |(idx, _)| idx + 1);
        &self.text[start..]
    }

    /// Line number (1-based) and contents of the line containing `offset`
    pub fn line_at(&self, offset: usize) -> (usize, &str) {
        let offset = offset.min(self.text.len());
        let start = self.text[..offset].rfind('\n').map_or(0, |idx| idx + 1);
        let end = self.text[offset..]
            .find('\n')
            .map_or(self.text.len(), |idx| offset + idx);
        let number = self.text[..start].matches('\n').count() + 1;
        (number, &self.text[start..end])
    }

    /// Move the selection to the next match of `query`
    ///
    /// Without a previous selection, searching down starts at the top and
    /// searching up starts at the bottom. The selection is kept when nothing
    /// matches.
    pub fn find_next(&mut self, query: &str, options: FindOptions) -> Option<Range<usize>> {
        let from = self.selection.clone().unwrap_or_else(|| match options.direction {
            Direction::Down => 0..0,
            Direction::Up => self.text.len()..self.text.len(),
        });

        let found = find_next(&self.text, query, from, options)?;
        self.selection = Some(found.clone());
        Some(found)
    }

    /// Write the whole buffer to `path`, replacing any existing file
    pub fn save_to(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, self.text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sample() -> Scrollback {
        let mut sb = Scrollback::new();
        sb.append("boot\nready\n");
        sb.append("error: disk\nready\n");
        sb
    }

    #[test]
    fn test_append_and_clear() {
        let mut sb = sample();
        assert_eq!(sb.text(), "boot\nready\nerror: disk\nready\n");
        assert_eq!(sb.len(), 29);

        sb.find_next("ready", FindOptions::default());
        sb.clear();
        assert!(sb.is_empty());
        assert!(sb.selection().is_none());
    }

    #[test]
    fn test_tail_lines() {
        let mut sb = sample();
        assert_eq!(sb.tail_lines(2), "error: disk\nready\n");
        assert_eq!(sb.tail_lines(10), sb.text());
        assert_eq!(sb.tail_lines(0), "");

        sb.append("partial");
        assert_eq!(sb.tail_lines(1), "partial");
        assert_eq!(sb.tail_lines(2), "ready\npartial");
    }

    #[test]
    fn test_find_advances_selection() {
        let mut sb = sample();
        let down = FindOptions::new(false, Direction::Down);

        let first = sb.find_next("READY", down).unwrap();
        assert_eq!(first, 5..10);
        assert_eq!(sb.selected_text(), Some("ready"));

        let second = sb.find_next("READY", down).unwrap();
        assert_eq!(second, 23..28);
        assert_eq!(sb.line_at(second.start), (4, "ready"));

        // Wrap around
        assert_eq!(sb.find_next("READY", down), Some(5..10));
    }

    #[test]
    fn test_find_up_from_bottom() {
        let mut sb = sample();
        let up = FindOptions::new(true, Direction::Up);
        assert_eq!(sb.find_next("ready", up), Some(23..28));
        assert_eq!(sb.find_next("ready", up), Some(5..10));
    }

    #[test]
    fn test_failed_find_keeps_selection() {
        let mut sb = sample();
        sb.find_next("error", FindOptions::default());
        assert_eq!(sb.find_next("missing", FindOptions::default()), None);
        assert_eq!(sb.selected_text(), Some("error"));
    }

    #[test]
    fn test_line_at() {
        let sb = sample();
        assert_eq!(sb.line_at(0), (1, "boot"));
        assert_eq!(sb.line_at(13), (3, "error: disk"));
        assert_eq!(sb.line_at(sb.len()), (5, ""));
    }

    #[test]
    fn test_save_to_overwrites() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "old contents that are longer").unwrap();

        let sb = sample();
        sb.save_to(file.path()).unwrap();
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), sb.text());
    }
}
