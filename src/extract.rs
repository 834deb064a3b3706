use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One code sample scraped from a notes document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    pub title: String,
    pub filename: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// How far past a block's end to look for an `Output:` annotation.
const OUTPUT_LOOKAHEAD: usize = 1200;
/// Window on either side of a block scanned for "will give error".
const ERROR_WINDOW: usize = 300;
/// How far back to look for a preceding `Example ...` title line.
const TITLE_LOOKBACK: usize = 400;
/// Line window for the fallback pass when associating output lines.
const FALLBACK_SCAN_LINES: usize = 30;

static CLASS_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:public\s+)?class\s+([A-Za-z_$][\w$]*)\s*\{").unwrap());

// Tolerates the "Ouput"/"Out put" misspellings that show up in the notes.
static OUTPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)\b(?:out\s*put|ouput)[ \t]*:[ \t]*(.*?)(?:\n\s*\n|\n-{2,}|Example|\bNote\b|\z)")
        .unwrap()
});

static WILL_GIVE_ERROR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)will\s+give\s+error").unwrap());

static ERROR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)error").unwrap());

static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)Example[^\n]*$").unwrap());

static LINE_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:public\s+)?class\s+\w+").unwrap());

static CLASS_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:public\s+)?class\s+([A-Za-z_$][\w$]*)").unwrap());

static OUTPUT_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:out\s*put|ouput)\s*:").unwrap());

static FENCED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)```(?:java)?(.*?)```").unwrap());

// Lenient-path block matcher: stops at the first `\n}`, incomplete blocks included.
static NAIVE_CLASS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(?:public\s+)?class\s+[\w$]+\s*\{.*?\n\}").unwrap());

/// Curated extraction: class-shaped blocks with balanced braces, then a
/// lenient line-oriented scan if the first pass finds nothing. Never fails;
/// worst case is an empty list.
pub fn parse_examples(notes: &str) -> Vec<Example> {
    let mut results = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    let mut cursor = 0usize;
    while let Some(caps) = CLASS_HEAD_RE.captures(&notes[cursor..]) {
        let m = caps.get(0).unwrap();
        let start = cursor + m.start();
        let brace = cursor + m.end() - 1;

        let Some(end) = balanced_block_end(notes, brace) else {
            // Unbalanced block; let the fallback pass deal with it.
            cursor += m.end();
            continue;
        };
        cursor = end;

        let class_name = caps[1].to_string();
        let output = capture_output(&notes[end..ceil_boundary(notes, end + OUTPUT_LOOKAHEAD)]);

        let around = &notes[floor_boundary(notes, start.saturating_sub(ERROR_WINDOW))
            ..ceil_boundary(notes, end + ERROR_WINDOW)];
        let has_error = WILL_GIVE_ERROR_RE.is_match(around)
            || output.as_deref().is_some_and(|o| ERROR_RE.is_match(o));
        if has_error {
            continue;
        }

        let prior = &notes[floor_boundary(notes, start.saturating_sub(TITLE_LOOKBACK))..start];
        let title = TITLE_RE
            .find(prior)
            .map(|t| t.as_str().trim().to_string())
            .unwrap_or_else(|| format!("Example - {class_name}.java"));

        let code = normalize_code(&notes[start..end]);
        if !seen.insert((class_name.clone(), content_hash(&code))) {
            continue;
        }

        results.push(Example {
            title,
            filename: format!("{class_name}.java"),
            code,
            output,
        });
    }

    if results.is_empty() {
        for (ex, (start, end)) in scan_line_blocks(notes) {
            let around = &notes[floor_boundary(notes, start.saturating_sub(ERROR_WINDOW))
                ..ceil_boundary(notes, end + ERROR_WINDOW)];
            if WILL_GIVE_ERROR_RE.is_match(around)
                || ex.output.as_deref().is_some_and(|o| ERROR_RE.is_match(o))
            {
                continue;
            }
            let class_name = ex.filename.trim_end_matches(".java").to_string();
            if seen.insert((class_name, content_hash(&ex.code))) {
                results.push(ex);
            }
        }
    }

    results
}

/// Lenient extraction for the "show everything" path: fenced code blocks
/// first, then naive class blocks (incomplete ones included), finally the
/// whole document as a single example.
pub fn parse_examples_lenient(notes: &str) -> Vec<Example> {
    let mut candidates: Vec<String> = FENCED_RE
        .captures_iter(notes)
        .map(|c| c[1].trim().to_string())
        .collect();

    if candidates.is_empty() {
        candidates = NAIVE_CLASS_RE
            .find_iter(notes)
            .map(|m| m.as_str().trim().to_string())
            .collect();
    }

    if candidates.is_empty() {
        candidates = vec![notes.trim().to_string()];
    }

    candidates
        .into_iter()
        .enumerate()
        .map(|(i, code)| Example {
            title: format!("Example {}", i + 1),
            filename: format!("Example{}.java", i + 1),
            code: normalize_code(&code),
            output: None,
        })
        .collect()
}

/// Consumer-side size/count policy, kept out of the extractor proper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curation {
    pub min_len: usize,
    pub max_len: usize,
    pub max_count: usize,
}

impl Default for Curation {
    fn default() -> Self {
        Self {
            min_len: 60,
            max_len: 2500,
            max_count: 100,
        }
    }
}

impl Curation {
    pub fn apply(&self, examples: Vec<Example>) -> Vec<Example> {
        examples
            .into_iter()
            .filter(|e| (self.min_len..=self.max_len).contains(&e.code.len()))
            .take(self.max_count)
            .collect()
    }
}

/// Tabs become two spaces, newlines become `\n`, blank edge lines are
/// trimmed, and exactly one trailing newline is kept. Idempotent.
pub fn normalize_code(raw: &str) -> String {
    let unified = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', "  ");
    format!("{}\n", strip_edge_blank_lines(&unified))
}

/// Deterministic 31-multiplier hash of the normalized code; combined with
/// the class name it forms the dedup key.
pub fn content_hash(s: &str) -> String {
    let mut h: i32 = 0;
    for c in s.chars() {
        h = h.wrapping_mul(31).wrapping_add(c as i32);
    }
    format!("{:08x}", h as u32)
}

fn strip_edge_blank_lines(s: &str) -> &str {
    let lead = s.len() - s.trim_start().len();
    let start = match s[..lead].rfind('\n') {
        Some(i) => i + 1,
        None => 0,
    };
    let s = &s[start..];

    let kept = s.trim_end().len();
    let end = match s[kept..].find('\n') {
        Some(i) => kept + i,
        None => s.len(),
    };
    &s[..end]
}

fn capture_output(lookahead: &str) -> Option<String> {
    let caps = OUTPUT_RE.captures(lookahead)?;
    let text = caps[1]
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Walks from the opening brace at `open` to its matching close. Returns the
/// index just past the closing brace, or None if the block never balances.
fn balanced_block_end(notes: &str, open: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (i, ch) in notes[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Fallback pass: line-oriented scan with a running brace depth. Unlike the
/// primary pass this tolerates truncation: a block that never balances is
/// taken through end of input. Returns each example with its byte span so
/// the caller can run the same exclusion windows as the primary pass.
fn scan_line_blocks(notes: &str) -> Vec<(Example, (usize, usize))> {
    let mut pos = 0usize;
    let lines: Vec<(usize, &str)> = notes
        .split_inclusive('\n')
        .map(|raw| {
            let start = pos;
            pos += raw.len();
            (start, raw.trim_end_matches(['\n', '\r']))
        })
        .collect();
    let mut results = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if !LINE_CLASS_RE.is_match(lines[i].1) {
            i += 1;
            continue;
        }

        let mut j = i;
        let mut snippet = String::new();
        let mut depth = 0i32;
        let mut started = false;
        while j < lines.len() {
            snippet.push_str(lines[j].1);
            snippet.push('\n');
            for ch in lines[j].1.chars() {
                match ch {
                    '{' => {
                        depth += 1;
                        started = true;
                    }
                    '}' => depth -= 1,
                    _ => {}
                }
            }
            if started && depth <= 0 {
                break;
            }
            j += 1;
        }
        let last = j.min(lines.len() - 1);
        let span = (lines[i].0, lines[last].0 + lines[last].1.len());

        let class_name = CLASS_NAME_RE
            .captures(&snippet)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "Sample".to_string());

        let mut output_lines: Vec<&str> = Vec::new();
        for k in (j + 1)..lines.len().min(j + FALLBACK_SCAN_LINES) {
            if OUTPUT_LINE_RE.is_match(lines[k].1) {
                for (_, line) in lines.iter().take(lines.len().min(k + FALLBACK_SCAN_LINES)).skip(k + 1) {
                    if line.trim().is_empty() {
                        break;
                    }
                    output_lines.push(line);
                }
                break;
            }
        }
        let joined = output_lines.join("\n").trim().to_string();

        results.push((
            Example {
                title: format!("Example - {class_name}.java"),
                filename: format!("{class_name}.java"),
                code: normalize_code(&snippet),
                output: if joined.is_empty() { None } else { Some(joined) },
            },
            span,
        ));

        i = j + 1;
    }

    results
}

fn floor_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
