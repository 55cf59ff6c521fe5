// Line timestamp formatter
// Turns text arriving at arbitrary chunk boundaries into newline-delimited,
// optionally timestamped output. Partial lines are held back until their
// newline arrives.

use super::timestamp::{render_timestamp, Zone};
use chrono::{DateTime, Utc};

/// Per-connection formatting state
///
/// `process` consumes the state and returns the updated one; `feed` is the
/// same transformation applied in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatterState {
    timestamp_enabled: bool,
    time_zone: Zone,

    /// Text after the last newline seen; never contains '\n'
    pending_tail: String,
}

impl FormatterState {
    /// Create a formatter with an empty tail
    pub fn new(timestamp_enabled: bool, time_zone: Zone) -> Self {
        Self {
            timestamp_enabled,
            time_zone,
            pending_tail: String::new(),
        }
    }

    pub fn timestamp_enabled(&self) -> bool {
        self.timestamp_enabled
    }

    pub fn time_zone(&self) -> Zone {
        self.time_zone
    }

    /// Unterminated text waiting for its newline
    pub fn pending_tail(&self) -> &str {
        &self.pending_tail
    }

    /// Format one chunk received at `now`, returning the output and the new state
    pub fn process(mut self, chunk: &str, now: DateTime<Utc>) -> (String, FormatterState) {
        let output = self.feed(chunk, now);
        (output, self)
    }

    /// Format one chunk received at `now`, updating the state in place
    ///
    /// With timestamping disabled the chunk passes through untouched. Otherwise
    /// every completed line gets `[timestamp] ` prepended, blank lines stay bare,
    /// and the trailing partial line is kept for the next call. All lines from a
    /// single call share one timestamp.
    pub fn feed(&mut self, chunk: &str, now: DateTime<Utc>) -> String {
        if !self.timestamp_enabled {
            return chunk.to_string();
        }

        let mut working = std::mem::take(&mut self.pending_tail);
        working.push_str(chunk);

        let (complete, tail) = match working.rfind('\n') {
            Some(idx) => (&working[..idx], &working[idx + 1..]),
            None => {
                self.pending_tail = working;
                return String::new();
            }
        };

        let mut stamp: Option<String> = None;
        let mut output = String::with_capacity(complete.len() + 32);

        for line in complete.split('\n') {
            if line.is_empty() {
                output.push('\n');
                continue;
            }
            let prefix = stamp.get_or_insert_with(|| render_timestamp(now, self.time_zone));
            output.push_str(prefix);
            output.push(' ');
            output.push_str(line);
            output.push('\n');
        }

        self.pending_tail = tail.to_string();
        output
    }

    /// Toggle timestamping
    ///
    /// Disabling releases the held-back partial line so it can be displayed
    /// as-is; the returned text is empty otherwise.
    pub fn set_timestamp_enabled(&mut self, enabled: bool) -> String {
        let released = if self.timestamp_enabled && !enabled {
            std::mem::take(&mut self.pending_tail)
        } else {
            String::new()
        };
        self.timestamp_enabled = enabled;
        released
    }

    pub fn set_time_zone(&mut self, zone: Zone) {
        self.time_zone = zone;
    }

    /// Remove and return the held-back partial line
    pub fn take_pending(&mut self) -> String {
        std::mem::take(&mut self.pending_tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc_state() -> FormatterState {
        FormatterState::new(true, Zone::Named(chrono_tz::UTC))
    }

    fn at(h: u32, m: u32, s: u32, ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, h, m, s).unwrap() + chrono::Duration::milliseconds(ms)
    }

    /// Strip the timestamp prefix from each emitted line
    fn line_contents(output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| match line.find("] ") {
                Some(idx) if line.starts_with('[') => line[idx + 2..].to_string(),
                _ => line.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_split_line_held_back() {
        let (output, state) = utc_state().process("hello\nworld", at(3, 4, 5, 6));
        assert_eq!(output, "[02-01-2024 03:04:05:006] hello\n");
        assert_eq!(state.pending_tail(), "world");

        let (output, state) = state.process("!\n", at(3, 4, 6, 0));
        assert_eq!(output, "[02-01-2024 03:04:06:000] world!\n");
        assert_eq!(state.pending_tail(), "");
    }

    #[test]
    fn test_blank_lines_unstamped() {
        let (output, state) = utc_state().process("\n\n", at(0, 0, 0, 0));
        assert_eq!(output, "\n\n");
        assert_eq!(state.pending_tail(), "");
    }

    #[test]
    fn test_single_newline() {
        let (output, state) = utc_state().process("\n", at(0, 0, 0, 0));
        assert_eq!(output, "\n");
        assert_eq!(state.pending_tail(), "");
    }

    #[test]
    fn test_no_newline_accumulates() {
        let mut state = utc_state();
        assert_eq!(state.feed("abc", at(0, 0, 0, 0)), "");
        assert_eq!(state.feed("def", at(0, 0, 1, 0)), "");
        assert_eq!(state.pending_tail(), "abcdef");
    }

    #[test]
    fn test_one_timestamp_per_call() {
        let (output, _) = utc_state().process("a\nb\n\nc\n", at(12, 30, 0, 250));
        assert_eq!(
            output,
            "[02-01-2024 12:30:00:250] a\n[02-01-2024 12:30:00:250] b\n\n[02-01-2024 12:30:00:250] c\n"
        );
    }

    #[test]
    fn test_disabled_is_identity() {
        let state = FormatterState::new(false, Zone::Local);
        let (output, state) = state.process("raw\npartial", at(0, 0, 0, 0));
        assert_eq!(output, "raw\npartial");
        assert_eq!(state.pending_tail(), "");
    }

    #[test]
    fn test_chunking_preserves_lines() {
        let text = "alpha\nbeta\n\ngamma\ndelta";
        let (whole, whole_state) = utc_state().process(text, at(1, 0, 0, 0));

        let mut state = utc_state();
        let mut pieces = String::new();
        for (i, chunk) in ["al", "pha\nbe", "ta\n", "\ngam", "ma\nde", "lta"]
            .iter()
            .enumerate()
        {
            pieces.push_str(&state.feed(chunk, at(1, 0, i as u32, 0)));
        }

        assert_eq!(line_contents(&whole), line_contents(&pieces));
        assert_eq!(line_contents(&pieces), vec!["alpha", "beta", "", "gamma"]);
        assert_eq!(whole_state.pending_tail(), state.pending_tail());
    }

    #[test]
    fn test_every_split_point_preserves_lines() {
        let text = "boot\r ok\n\nready> \nlast";
        let (whole, whole_state) = utc_state().process(text, at(1, 0, 0, 0));
        let expected = line_contents(&whole);

        for (split, _) in text.char_indices().skip(1) {
            let mut state = utc_state();
            let mut pieces = state.feed(&text[..split], at(1, 0, 0, 0));
            pieces.push_str(&state.feed(&text[split..], at(1, 0, 1, 0)));

            assert_eq!(line_contents(&pieces), expected, "split at {}", split);
            assert_eq!(state.pending_tail(), whole_state.pending_tail());
        }

        let mut state = utc_state();
        let mut pieces = String::new();
        for (i, ch) in text.chars().enumerate() {
            pieces.push_str(&state.feed(ch.encode_utf8(&mut [0u8; 4]), at(1, 0, 0, i as i64)));
        }
        assert_eq!(line_contents(&pieces), expected);
        assert_eq!(state.pending_tail(), "last");
    }

    #[test]
    fn test_disable_releases_tail() {
        let mut state = utc_state();
        state.feed("line\npart", at(0, 0, 0, 0));
        assert_eq!(state.set_timestamp_enabled(false), "part");
        assert_eq!(state.pending_tail(), "");
        assert_eq!(state.feed("more\n", at(0, 0, 1, 0)), "more\n");

        // Re-enabling starts from a clean tail
        assert_eq!(state.set_timestamp_enabled(true), "");
        assert_eq!(
            state.feed("next\n", at(0, 0, 2, 0)),
            "[02-01-2024 00:00:02:000] next\n"
        );
    }

    #[test]
    fn test_zone_change_applies_next_call() {
        let mut state = utc_state();
        state.set_time_zone(Zone::parse("Asia/Kolkata").unwrap());
        let output = state.feed("x\n", at(0, 0, 0, 0));
        assert_eq!(output, "[02-01-2024 05:30:00:000] x\n");
        assert_eq!(state.time_zone().id(), "Asia/Kolkata");
    }

    #[test]
    fn test_take_pending() {
        let mut state = utc_state();
        state.feed("unterminated", at(0, 0, 0, 0));
        assert_eq!(state.take_pending(), "unterminated");
        assert_eq!(state.pending_tail(), "");
    }
}
