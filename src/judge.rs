use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Judge0 community instance; overridable via config.
pub const DEFAULT_RUN_URL: &str = "https://ce.judge0.com/submissions?base64_encoded=true&wait=true";

const JAVA_LANGUAGE_ID: u32 = 62;

const RUN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct Submission {
    language_id: u32,
    source_code: String,
    stdin: String,
    compiler_options: Option<String>,
    command_line_arguments: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawResponse {
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
    message: Option<String>,
    status: Option<RawStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct RawStatus {
    description: Option<String>,
}

/// Normalized result of one compile-and-run round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub status: String,
    pub stdout: String,
    pub stderr: String,
    pub compile_output: String,
    pub message: String,
}

impl RunOutcome {
    /// First non-empty of stdout, compile output, stderr, message.
    pub fn combined(&self) -> &str {
        [&self.stdout, &self.compile_output, &self.stderr, &self.message]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }

    /// What the UI shows; never empty.
    pub fn display_text(&self) -> &str {
        let combined = self.combined();
        if combined.is_empty() {
            "No output"
        } else {
            combined
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("run service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("undecodable field in run response: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// The only contract the rest of the app needs from the execution service.
pub trait CodeRunner: Send + Sync {
    fn run(&self, code: &str, stdin: &str) -> Result<RunOutcome, RunError>;
}

#[derive(Debug, Clone)]
pub struct Judge0Client {
    url: String,
}

impl Judge0Client {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl CodeRunner for Judge0Client {
    fn run(&self, code: &str, stdin: &str) -> Result<RunOutcome, RunError> {
        let body = Submission {
            language_id: JAVA_LANGUAGE_ID,
            source_code: STANDARD.encode(prepare_source(code)),
            stdin: STANDARD.encode(stdin),
            compiler_options: None,
            command_line_arguments: None,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(RUN_TIMEOUT)
            .build()?;
        let resp = client.post(&self.url).json(&body).send()?;
        if !resp.status().is_success() {
            return Err(RunError::Status(resp.status()));
        }
        let raw: RawResponse = resp.json()?;

        Ok(RunOutcome {
            status: raw
                .status
                .and_then(|s| s.description)
                .unwrap_or_default(),
            stdout: decode_field(raw.stdout)?,
            stderr: decode_field(raw.stderr)?,
            compile_output: decode_field(raw.compile_output)?,
            message: raw.message.unwrap_or_default(),
        })
    }
}

// Judge0 wraps base64 payloads with embedded newlines.
fn decode_field(field: Option<String>) -> Result<String, RunError> {
    let Some(field) = field else {
        return Ok(String::new());
    };
    let compact: String = field.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(String::new());
    }
    let bytes = STANDARD.decode(compact.as_bytes())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

static PACKAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*package\s+[\w.]+\s*;\s*").unwrap());

static MAIN_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)(?:public\s+)?class\s+([A-Za-z_$][\w$]*).*?public\s+static\s+void\s+main\s*\(\s*String\[\]\s+\w+\s*\)",
    )
    .unwrap()
});

static ANY_CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bclass\s+[A-Za-z_$][\w$]*").unwrap());

/// Rewrites a snippet so the service's fixed `Main` entry point can run it:
/// package lines are stripped, a public class with a main method is demoted
/// and dispatched to, a class without main gets a no-op entry point, and
/// bare statements are wrapped wholesale.
pub fn prepare_source(raw: &str) -> String {
    let code = raw.replace("\r\n", "\n").replace('\r', "\n");
    let code = PACKAGE_RE.replace_all(&code, "").into_owned();

    if let Some(caps) = MAIN_CLASS_RE.captures(&code) {
        let class_name = caps[1].to_string();
        if class_name == "Main" {
            return code;
        }
        let demote = Regex::new(&format!(
            r"\bpublic\s+class\s+{}\b",
            regex::escape(&class_name)
        ))
        .unwrap();
        let demoted = demote
            .replace_all(&code, NoExpand(&format!("class {class_name}")))
            .into_owned();
        return format!(
            "{demoted}\n\npublic class Main {{\n  public static void main(String[] args) {{\n    {class_name}.main(args);\n  }}\n}}\n"
        );
    }

    if ANY_CLASS_RE.is_match(&code) {
        return format!(
            "{code}\n\npublic class Main {{\n  public static void main(String[] args) {{\n    // nothing to run in the snippet\n  }}\n}}\n"
        );
    }

    let body = code
        .lines()
        .map(|l| format!("    {l}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("public class Main {{\n  public static void main(String[] args) {{\n{body}\n  }}\n}}\n")
}

/// Which snippet variant a run request is for. The two kinds are dispatched
/// and tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Target,
    Typed,
}

/// Issued when a run is dispatched; echoed back with the result so stale
/// responses can be told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTicket {
    pub kind: RunKind,
    pub generation: u64,
}

/// Single-flight bookkeeping per run kind, plus a generation counter that
/// navigation bumps. A result is applied only if its ticket carries the
/// current generation.
#[derive(Debug, Default)]
pub struct RunTracker {
    generation: u64,
    target_in_flight: bool,
    typed_in_flight: bool,
}

impl RunTracker {
    /// Returns a ticket for dispatch, or None when this kind is already in
    /// flight (duplicate triggers are suppressed).
    pub fn begin(&mut self, kind: RunKind) -> Option<RunTicket> {
        let flag = match kind {
            RunKind::Target => &mut self.target_in_flight,
            RunKind::Typed => &mut self.typed_in_flight,
        };
        if *flag {
            return None;
        }
        *flag = true;
        Some(RunTicket {
            kind,
            generation: self.generation,
        })
    }

    /// Called on any navigation away from the current snippet: everything
    /// previously dispatched becomes stale.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.target_in_flight = false;
        self.typed_in_flight = false;
    }

    /// True when the result belongs to the current snippet and should be
    /// shown; clears the in-flight flag either way for current-generation
    /// tickets.
    pub fn accept(&mut self, ticket: RunTicket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match ticket.kind {
            RunKind::Target => self.target_in_flight = false,
            RunKind::Typed => self.typed_in_flight = false,
        }
        true
    }

    pub fn in_flight(&self, kind: RunKind) -> bool {
        match kind {
            RunKind::Target => self.target_in_flight,
            RunKind::Typed => self.typed_in_flight,
        }
    }
}
