use chrono::Local;
use directories::ProjectDirs;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One completed drill, as written to the practice log.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeRecord {
    pub filename: String,
    pub topic: String,
    pub chars: usize,
    pub elapsed_secs: f64,
    pub wpm: f64,
    pub accuracy: f64,
}

pub fn default_log_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "jtype").map(|pd| pd.data_local_dir().join("log.csv"))
}

/// Appends one row, emitting the header when the file is new.
pub fn append_record(path: &Path, record: &PracticeRecord) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let needs_header = !path.exists();

    let mut log_file = OpenOptions::new().append(true).create(true).open(path)?;

    if needs_header {
        writeln!(log_file, "date,filename,topic,chars,elapsed_secs,wpm,accuracy")?;
    }

    writeln!(
        log_file,
        "{},{},{},{},{:.2},{},{}",
        Local::now().format("%c"),
        record.filename,
        record.topic,
        record.chars,
        record.elapsed_secs,
        record.wpm,
        record.accuracy,
    )
}
