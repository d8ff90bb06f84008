/// Export downloads
///
/// Turns the service's portable document into a file the user can keep.

use crate::workflow::types::PortableWorkflow;
use std::path::{Path, PathBuf};

/// A ready-to-write export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    /// Pretty-printed JSON document
    pub contents: String,
}

impl ExportFile {
    pub fn from_portable(document: &PortableWorkflow) -> Result<Self, serde_json::Error> {
        Ok(Self {
            file_name: export_file_name(&document.name),
            contents: serde_json::to_string_pretty(document)?,
        })
    }

    /// Write the export into `dir`, returning the full path
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        tokio::fs::write(&path, self.contents.as_bytes()).await?;
        tracing::info!("💾 Exported workflow to {}", path.display());
        Ok(path)
    }
}

/// Lowercased name with every non-alphanumeric run collapsed to `_`, plus `.json`
pub fn export_file_name(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    let mut in_gap = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            stem.push(ch);
            in_gap = false;
        } else if !in_gap {
            stem.push('_');
            in_gap = true;
        }
    }

    format!("{stem}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_collapses_separator_runs() {
        assert_eq!(export_file_name("My Breakout  Strategy!"), "my_breakout_strategy_.json");
        assert_eq!(export_file_name("NIFTY-50 / Opening"), "nifty_50_opening.json");
        assert_eq!(export_file_name("simple"), "simple.json");
    }

    #[tokio::test]
    async fn export_writes_pretty_json() {
        let document = PortableWorkflow {
            name: "Gap Fill".to_string(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        let file = ExportFile::from_portable(&document).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let path = file.write_to(dir.path()).await.unwrap();

        assert!(path.ends_with("gap_fill.json"));
        let written = std::fs::read_to_string(path).unwrap();
        let parsed: PortableWorkflow = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, document);
        assert!(written.contains('\n'));
    }
}
