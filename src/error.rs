use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Panel error taxonomy
// ---------------------------------------------------------------------------

/// Why a panel could not render. Every panel is isolated: one of these
/// replaces the failing panel's content and nothing else.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Expected input files are absent; rendered as setup instructions.
    #[error("{} of {} expected files are missing", .0.missing().count(), .0.files.len())]
    MissingInput(FileReport),

    /// A required field/column was not found under any known alias.
    #[error("cannot find {what} in {source_name}; expected one of: {}", .aliases.join(", "))]
    SchemaField {
        what: String,
        source_name: String,
        aliases: Vec<String>,
    },

    /// Anything else that went wrong while parsing or transforming.
    #[error("{0:#}")]
    UnexpectedLoad(anyhow::Error),
}

impl From<anyhow::Error> for PanelError {
    fn from(err: anyhow::Error) -> Self {
        PanelError::UnexpectedLoad(err)
    }
}

pub type PanelResult<T> = Result<T, PanelError>;

impl PanelError {
    pub fn schema_field(what: &str, source_name: &str, aliases: &[impl AsRef<str>]) -> Self {
        PanelError::SchemaField {
            what: what.to_string(),
            source_name: source_name.to_string(),
            aliases: aliases.iter().map(|a| a.as_ref().to_string()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// FileReport – presence of each expected input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExpectedFile {
    pub label: String,
    pub path: PathBuf,
    pub present: bool,
}

/// The set of files a panel needs, each checked for existence.
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub files: Vec<ExpectedFile>,
}

impl FileReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an expected file, checking whether it exists on disk.
    pub fn expect(&mut self, label: &str, path: &Path) -> &mut Self {
        self.files.push(ExpectedFile {
            label: label.to_string(),
            present: path.is_file(),
            path: path.to_path_buf(),
        });
        self
    }

    pub fn all_present(&self) -> bool {
        self.files.iter().all(|f| f.present)
    }

    pub fn missing(&self) -> impl Iterator<Item = &ExpectedFile> {
        self.files.iter().filter(|f| !f.present)
    }

    /// `Ok(())` when every file exists, otherwise a MissingInput error
    /// carrying this report.
    pub fn check(self) -> Result<(), PanelError> {
        if self.all_present() {
            Ok(())
        } else {
            Err(PanelError::MissingInput(self))
        }
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            let mark = if file.present { "✓" } else { "✗" };
            writeln!(f, "{mark} {}: {}", file.label, file.path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_present_and_absent() {
        let dir = std::env::temp_dir().join(format!("shorecast-report-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let present = dir.join("present.csv");
        std::fs::write(&present, "x\n").unwrap();

        let mut report = FileReport::new();
        report
            .expect("Statistics", &present)
            .expect("Time series", &dir.join("absent.csv"));

        assert!(!report.all_present());
        let text = report.to_string();
        assert!(text.contains("✓ Statistics"));
        assert!(text.contains("✗ Time series"));

        match report.check() {
            Err(PanelError::MissingInput(r)) => assert_eq!(r.missing().count(), 1),
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }

    #[test]
    fn schema_error_names_aliases() {
        let err = PanelError::schema_field("year field", "shorelines", &["year", "Year"]);
        assert_eq!(
            err.to_string(),
            "cannot find year field in shorelines; expected one of: year, Year"
        );
    }
}
