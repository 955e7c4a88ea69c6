//! Names of report files that an earlier run already consumed.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const HEADER: &str = "filename";

/// Set of processed report file names, persisted as a one-column CSV.
///
/// The set is passed into a scan and handed back updated; nothing reads or
/// writes the log behind the caller's back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedSet {
    names: BTreeSet<String>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the log at `path`; a missing file is an empty set.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open processed log: {}", path.display()))?;

        let mut set = Self::new();
        for row in reader.records() {
            let row = row.with_context(|| format!("failed to read processed log: {}", path.display()))?;
            if let Some(name) = row.get(0).filter(|n| !n.is_empty()) {
                set.insert(name);
            }
        }
        Ok(set)
    }

    /// Write the whole set to `path`, replacing any previous log.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create processed log: {}", path.display()))?;
        writer.write_record([HEADER])?;
        for name in &self.names {
            writer.write_record([name])?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Returns `true` if the name was not already present.
    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = ProcessedSet::load(&dir.path().join("processed_files.csv")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_files.csv");

        let mut set = ProcessedSet::new();
        assert!(set.insert("b.html"));
        assert!(set.insert("a, with comma.html"));
        assert!(!set.insert("b.html"));
        set.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("filename\n"));

        let loaded = ProcessedSet::load(&path).unwrap();
        assert_eq!(loaded, set);
        assert!(loaded.contains("a, with comma.html"));
        assert_eq!(loaded.iter().collect::<Vec<_>>(), vec!["a, with comma.html", "b.html"]);
    }

    #[test]
    fn test_load_log_written_by_hand() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_files.csv");
        std::fs::write(&path, "filename\nrun1.html\n\nrun2.html\n").unwrap();

        let set = ProcessedSet::load(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("run2.html"));
    }
}
