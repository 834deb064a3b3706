use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::TICK_RATE_MS;

/// Rendering status of one target character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharOutcome {
    Pending,
    Correct,
    Incorrect,
}

/// Completion strategy. Strict is the default: exact equality, comments and
/// whitespace included. The other two relax the comparison for looser
/// practice styles.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum CompareMode {
    #[default]
    #[strum(serialize = "strict")]
    Strict,
    #[strum(serialize = "ignore-comments")]
    IgnoreComments,
    #[strum(serialize = "ignore-leading-whitespace")]
    IgnoreLeadingWhitespace,
}

/// A discrete key event fed to the drill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Tab,
}

/// One snippet being typed against: the typed buffer, per-char comparison,
/// wall-clock timing, and the post-completion auto-advance countdown.
///
/// The drill is a pure state machine; it never schedules anything itself.
/// The host loop feeds it keys and ticks and polls `should_advance`.
#[derive(Debug, Clone)]
pub struct Drill {
    pub target: String,
    target_chars: Vec<char>,
    typed: Vec<char>,
    mode: CompareMode,
    auto_advance_secs: f64,
    started_at: Option<SystemTime>,
    finished_at: Option<SystemTime>,
    completed: bool,
    advance_in: Option<f64>,
    keystrokes: usize,
    misses: usize,
}

impl Drill {
    pub fn new(target: String, mode: CompareMode, auto_advance_secs: f64) -> Self {
        let target_chars = target.chars().collect();
        Self {
            target,
            target_chars,
            typed: Vec::new(),
            mode,
            auto_advance_secs,
            started_at: None,
            finished_at: None,
            completed: false,
            advance_in: None,
            keystrokes: 0,
            misses: 0,
        }
    }

    pub fn on_key(&mut self, key: Key) {
        match key {
            Key::Char(c) => self.write(c),
            Key::Backspace => self.backspace(),
            Key::Enter => self.enter(),
            Key::Tab => self.write('\t'),
        }
    }

    /// Append one printable character. Rejected outright once the typed
    /// buffer has reached the target length; wrong characters below the
    /// boundary are accepted and marked, never blocked.
    pub fn write(&mut self, c: char) {
        if self.completed || self.typed.len() >= self.target_chars.len() {
            return;
        }
        self.start_if_needed();
        self.keystrokes += 1;
        if self.target_chars[self.typed.len()] != c {
            self.misses += 1;
        }
        self.typed.push(c);
        self.check_completion();
    }

    /// Remove the last typed character; no-op on an empty buffer. Backspacing
    /// never completes a drill; only a key that makes the buffer whole does.
    pub fn backspace(&mut self) {
        if self.completed {
            return;
        }
        self.typed.pop();
    }

    /// Append a newline (same boundary rule as `write`). When the newline
    /// lands where the target also breaks, the target's following run of
    /// spaces and tabs is auto-filled, mirroring editor auto-indent.
    pub fn enter(&mut self) {
        if self.completed || self.typed.len() >= self.target_chars.len() {
            return;
        }
        self.start_if_needed();
        self.keystrokes += 1;
        let at = self.typed.len();
        if self.target_chars[at] != '\n' {
            self.misses += 1;
        }
        self.typed.push('\n');
        if self.target_chars[at] == '\n' {
            while self.typed.len() < self.target_chars.len()
                && matches!(self.target_chars[self.typed.len()], ' ' | '\t')
            {
                let c = self.target_chars[self.typed.len()];
                self.typed.push(c);
            }
        }
        self.check_completion();
    }

    pub fn char_outcome(&self, idx: usize) -> CharOutcome {
        match self.typed.get(idx) {
            None => CharOutcome::Pending,
            Some(c) if self.target_chars.get(idx) == Some(c) => CharOutcome::Correct,
            Some(_) => CharOutcome::Incorrect,
        }
    }

    pub fn typed_string(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn cursor_pos(&self) -> usize {
        self.typed.len()
    }

    pub fn target_len(&self) -> usize {
        self.target_chars.len()
    }

    pub fn mode(&self) -> CompareMode {
        self.mode
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Milliseconds since the first accepted keystroke; frozen at completion.
    pub fn elapsed_ms(&self) -> u128 {
        let Some(start) = self.started_at else {
            return 0;
        };
        let end = self.finished_at.unwrap_or_else(SystemTime::now);
        end.duration_since(start).unwrap_or_default().as_millis()
    }

    /// Decrement the auto-advance countdown; only meaningful after
    /// completion. Driven by the host's tick cadence.
    pub fn on_tick(&mut self) {
        if let Some(remaining) = self.advance_in {
            self.advance_in = Some(remaining - TICK_RATE_MS as f64 / 1000.0);
        }
    }

    pub fn should_advance(&self) -> bool {
        self.completed && self.advance_in.is_some_and(|r| r <= 0.0)
    }

    /// Whole seconds left before auto-advance, for display.
    pub fn advance_in_secs(&self) -> Option<u64> {
        self.advance_in.map(|r| r.max(0.0).ceil() as u64)
    }

    /// Words-per-minute over the target, counting five characters per word.
    pub fn wpm(&self) -> f64 {
        let mins = self.elapsed_ms() as f64 / 60_000.0;
        if mins <= 0.0 {
            return 0.0;
        }
        (self.target_chars.len() as f64 / 5.0 / mins).round()
    }

    /// Share of keystrokes that matched the expected character.
    pub fn accuracy(&self) -> f64 {
        if self.keystrokes == 0 {
            return 0.0;
        }
        ((self.keystrokes - self.misses) as f64 / self.keystrokes as f64 * 100.0).round()
    }

    fn start_if_needed(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(SystemTime::now());
        }
    }

    fn check_completion(&mut self) {
        if is_complete_against(&self.typed_string(), &self.target, self.mode) {
            self.completed = true;
            self.finished_at = Some(SystemTime::now());
            self.advance_in = Some(self.auto_advance_secs);
        }
    }
}

static BLOCK_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static LINE_COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(^|[ \t])//.*$").unwrap());

/// The authoritative completion predicate for each mode. The relaxed modes
/// additionally require a non-empty typed buffer, since stripping can make
/// two unequal strings both empty.
pub fn is_complete_against(typed: &str, target: &str, mode: CompareMode) -> bool {
    match mode {
        CompareMode::Strict => typed == target,
        CompareMode::IgnoreComments => {
            !typed.is_empty()
                && normalize_for_compare(&strip_java_comments(typed))
                    == normalize_for_compare(&strip_java_comments(target))
        }
        CompareMode::IgnoreLeadingWhitespace => {
            !typed.is_empty() && normalize_for_compare(typed) == normalize_for_compare(target)
        }
    }
}

fn strip_java_comments(s: &str) -> String {
    let no_blocks = BLOCK_COMMENT_RE.replace_all(s, "");
    LINE_COMMENT_RE.replace_all(&no_blocks, "").into_owned()
}

// Alignment-insensitive: drop per-line leading whitespace, keep everything
// else strict.
fn normalize_for_compare(s: &str) -> String {
    s.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn drill(target: &str) -> Drill {
        Drill::new(target.to_string(), CompareMode::Strict, 3.0)
    }

    fn type_str(d: &mut Drill, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                d.enter();
            } else {
                d.write(c);
            }
        }
    }

    #[test]
    fn test_completion_iff_exact_equality() {
        let mut d = drill("class A{}\n");
        type_str(&mut d, "class A{}");
        assert!(!d.is_complete(), "missing trailing newline must not complete");
        d.enter();
        assert!(d.is_complete());
    }

    #[test]
    fn test_wrong_chars_accepted_and_marked() {
        let mut d = drill("abc");
        d.write('a');
        d.write('x');
        assert_eq!(d.cursor_pos(), 2);
        assert_matches!(d.char_outcome(0), CharOutcome::Correct);
        assert_matches!(d.char_outcome(1), CharOutcome::Incorrect);
        assert_matches!(d.char_outcome(2), CharOutcome::Pending);
        assert!(!d.is_complete());
    }

    #[test]
    fn test_boundary_rejects_once_full() {
        let mut d = drill("ab");
        d.write('a');
        d.write('x');
        assert_eq!(d.cursor_pos(), 2);
        d.write('b');
        assert_eq!(d.cursor_pos(), 2, "keystroke past the boundary is a no-op");
        assert_eq!(d.typed_string(), "ax");
        assert!(!d.is_complete());
    }

    #[test]
    fn test_backspace_reduces_or_noop() {
        let mut d = drill("ab");
        d.backspace();
        assert_eq!(d.cursor_pos(), 0);
        d.write('a');
        d.backspace();
        assert_eq!(d.cursor_pos(), 0);
    }

    #[test]
    fn test_backspace_then_correct_completes() {
        let mut d = drill("ab");
        d.write('a');
        d.write('x');
        assert!(!d.is_complete());
        d.backspace();
        d.write('b');
        assert!(d.is_complete());
    }

    #[test]
    fn test_enter_autofills_indentation() {
        let mut d = drill("a {\n    b\n}\n");
        type_str(&mut d, "a {");
        d.enter();
        assert_eq!(d.typed_string(), "a {\n    ");
        type_str(&mut d, "b");
        d.enter();
        d.write('}');
        d.enter();
        assert!(d.is_complete());
    }

    #[test]
    fn test_enter_mismatch_inserts_plain_newline() {
        let mut d = drill("ab  cd");
        d.write('a');
        d.enter();
        assert_eq!(d.typed_string(), "a\n", "no autofill when the target has no newline here");
        assert_matches!(d.char_outcome(1), CharOutcome::Incorrect);
    }

    #[test]
    fn test_tab_inserts_literal_tab() {
        let mut d = drill("\tx");
        d.on_key(Key::Tab);
        assert_matches!(d.char_outcome(0), CharOutcome::Correct);
    }

    #[test]
    fn test_timer_starts_on_first_keystroke() {
        let mut d = drill("ab");
        assert!(!d.has_started());
        assert_eq!(d.elapsed_ms(), 0);
        d.write('a');
        assert!(d.has_started());
    }

    #[test]
    fn test_completion_freezes_timer_and_arms_countdown() {
        let mut d = drill("a");
        d.write('a');
        assert!(d.is_complete());
        assert_eq!(d.advance_in_secs(), Some(3));
        let frozen = d.elapsed_ms();
        std::thread::sleep(std::time::Duration::from_millis(15));
        assert_eq!(d.elapsed_ms(), frozen);
    }

    #[test]
    fn test_input_ignored_after_completion() {
        let mut d = drill("a");
        d.write('a');
        d.write('z');
        d.backspace();
        assert_eq!(d.typed_string(), "a");
        assert!(d.is_complete());
    }

    #[test]
    fn test_countdown_driven_by_ticks() {
        let mut d = drill("a");
        d.write('a');
        assert!(!d.should_advance());
        // 3 seconds of ticks, plus one for float rounding
        for _ in 0..=(3000 / TICK_RATE_MS) {
            d.on_tick();
        }
        assert!(d.should_advance());
    }

    #[test]
    fn test_ticks_before_completion_do_nothing() {
        let mut d = drill("ab");
        d.write('a');
        for _ in 0..100 {
            d.on_tick();
        }
        assert!(!d.should_advance());
    }

    #[test]
    fn test_ignore_comments_mode() {
        let target = "int x = 1; // the counter\nint y = 2;\n";
        assert!(is_complete_against(
            "int x = 1;\nint y = 2;",
            target,
            CompareMode::IgnoreComments
        ));
        assert!(!is_complete_against(
            "int x = 1;\nint y = 2;",
            target,
            CompareMode::Strict
        ));
        assert!(!is_complete_against("", "// only\n", CompareMode::IgnoreComments));
    }

    #[test]
    fn test_ignore_comments_strips_block_comments() {
        let target = "/* header\n comment */\nint x;\n";
        assert!(is_complete_against("int x;", target, CompareMode::IgnoreComments));
    }

    #[test]
    fn test_ignore_leading_whitespace_mode() {
        let target = "class A {\n    int x;\n}\n";
        assert!(is_complete_against(
            "class A {\nint x;\n}",
            target,
            CompareMode::IgnoreLeadingWhitespace
        ));
        assert!(!is_complete_against(
            "class A {\nint  x;\n}",
            target,
            CompareMode::IgnoreLeadingWhitespace
        ));
    }

    #[test]
    fn test_accuracy_and_wpm_bookkeeping() {
        let mut d = drill("abcd");
        d.write('a');
        d.write('x');
        d.backspace();
        d.write('b');
        d.write('c');
        d.write('d');
        assert!(d.is_complete());
        // 5 keystrokes, 1 miss
        assert_eq!(d.accuracy(), 80.0);
        assert!(d.wpm() >= 0.0);
    }

    #[test]
    fn test_empty_target_never_completes_via_input() {
        let mut d = drill("");
        d.write('a');
        assert_eq!(d.cursor_pos(), 0);
        assert!(!d.has_started());
    }
}
