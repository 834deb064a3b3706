use include_dir::{include_dir, Dir};
use std::time::Duration;
use thiserror::Error;

/// Raw lecture-notes document the examples are scraped from.
pub const DEFAULT_NOTES_URL: &str =
    "https://raw.githubusercontent.com/pankajmutha14/10th-june-java-notes/main/10th%20June%20java%20-%20psa%20-%20notes.txt";

static BUNDLED_DIR: Dir = include_dir!("src/bundled");

pub const DEFAULT_BUNDLE: &str = "java_basics.txt";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notes fetch returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("no bundled notes named {0:?}")]
    MissingBundle(String),
}

/// Where the notes text comes from. The extractor only ever sees a string.
pub trait NotesSource {
    fn fetch(&self) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpNotesSource {
    url: String,
}

impl HttpNotesSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl NotesSource for HttpNotesSource {
    fn fetch(&self) -> Result<String, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;
        let resp = client.get(&self.url).send()?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }
        Ok(resp.text()?)
    }
}

/// Sample notes compiled into the binary, in the same format as the scraped
/// document. Keeps the tool usable with no network.
#[derive(Debug, Clone)]
pub struct BundledNotes {
    name: String,
}

impl BundledNotes {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn available() -> Vec<&'static str> {
        BUNDLED_DIR
            .files()
            .filter_map(|f| f.path().to_str())
            .collect()
    }
}

impl Default for BundledNotes {
    fn default() -> Self {
        Self::named(DEFAULT_BUNDLE)
    }
}

impl NotesSource for BundledNotes {
    fn fetch(&self) -> Result<String, FetchError> {
        BUNDLED_DIR
            .get_file(&self.name)
            .and_then(|f| f.contents_utf8())
            .map(str::to_string)
            .ok_or_else(|| FetchError::MissingBundle(self.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{parse_examples, Curation};

    #[test]
    fn test_bundled_default_loads() {
        let text = BundledNotes::default().fetch().unwrap();
        assert!(text.contains("class"));
    }

    #[test]
    fn test_bundled_missing_is_error() {
        let err = BundledNotes::named("nope.txt").fetch().unwrap_err();
        assert!(matches!(err, FetchError::MissingBundle(_)));
    }

    #[test]
    fn test_all_bundles_yield_curated_examples() {
        for name in BundledNotes::available() {
            let text = BundledNotes::named(name).fetch().unwrap();
            let curated = Curation::default().apply(parse_examples(&text));
            assert!(!curated.is_empty(), "bundle {name} produced no examples");
        }
    }

    #[test]
    fn test_bundled_error_examples_are_dropped() {
        let text = BundledNotes::default().fetch().unwrap();
        let examples = parse_examples(&text);
        assert!(
            examples.iter().all(|e| e.filename != "Broken.java"),
            "the known-erroring sample must be excluded"
        );
    }
}
