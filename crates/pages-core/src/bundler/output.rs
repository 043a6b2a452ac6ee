//! Output bundle handed to `generate_bundle`.

use crate::error::Error;
use std::collections::BTreeMap;

/// Emitted JavaScript chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    /// Output path relative to the output directory.
    pub file_name: String,
    /// Chunk name.
    pub name: String,
    /// Whether this chunk is an entry.
    pub is_entry: bool,
    /// Chunk code.
    pub code: String,
}

/// Emitted asset (HTML pages, styles, anything copied as-is).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputAsset {
    /// Output path relative to the output directory.
    pub file_name: String,
    /// Asset contents.
    pub source: Vec<u8>,
}

impl OutputAsset {
    pub fn new(file_name: impl Into<String>, source: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            source,
        }
    }
}

/// A single bundle artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputArtifact {
    Chunk(OutputChunk),
    Asset(OutputAsset),
}

impl OutputArtifact {
    /// Output path relative to the output directory.
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::Chunk(chunk) => &chunk.file_name,
            Self::Asset(asset) => &asset.file_name,
        }
    }

    fn set_file_name(&mut self, file_name: String) {
        match self {
            Self::Chunk(chunk) => chunk.file_name = file_name,
            Self::Asset(asset) => asset.file_name = file_name,
        }
    }

    /// Bytes to write for this artifact.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        match self {
            Self::Chunk(chunk) => chunk.code.as_bytes(),
            Self::Asset(asset) => &asset.source,
        }
    }
}

/// Output file name → artifact.
///
/// Keys always equal the artifact's own `file_name`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputBundle {
    artifacts: BTreeMap<String, OutputArtifact>,
}

impl OutputBundle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an artifact under its file name, returning any artifact it replaced.
    pub fn insert(&mut self, artifact: OutputArtifact) -> Option<OutputArtifact> {
        self.artifacts
            .insert(artifact.file_name().to_string(), artifact)
    }

    #[must_use]
    pub fn get(&self, file_name: &str) -> Option<&OutputArtifact> {
        self.artifacts.get(file_name)
    }

    #[must_use]
    pub fn contains(&self, file_name: &str) -> bool {
        self.artifacts.contains_key(file_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Snapshot of the current file names, sorted.
    #[must_use]
    pub fn file_names(&self) -> Vec<String> {
        self.artifacts.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputArtifact> {
        self.artifacts.values()
    }

    /// Move the artifact at `from` to `to`, updating its file name.
    ///
    /// Never drops an artifact: renaming onto an occupied name fails with
    /// `OutputConflict`. Renaming a missing name is a no-op.
    pub fn rename(&mut self, from: &str, to: String) -> Result<(), Error> {
        if from == to {
            return Ok(());
        }
        if self.contains(&to) {
            return Err(Error::OutputConflict {
                from: from.to_string(),
                to,
            });
        }
        if let Some(mut artifact) = self.artifacts.remove(from) {
            artifact.set_file_name(to.clone());
            self.artifacts.insert(to, artifact);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> OutputArtifact {
        OutputArtifact::Asset(OutputAsset::new(name, name.as_bytes().to_vec()))
    }

    #[test]
    fn test_rename_updates_key_and_field() {
        let mut bundle = OutputBundle::new();
        bundle.insert(asset("src/pages/about.html"));

        bundle
            .rename("src/pages/about.html", "about.html".to_string())
            .unwrap();

        assert_eq!(bundle.file_names(), vec!["about.html".to_string()]);
        let artifact = bundle.get("about.html").unwrap();
        assert_eq!(artifact.file_name(), "about.html");
        assert_eq!(artifact.contents(), b"src/pages/about.html");
    }

    #[test]
    fn test_rename_onto_existing_fails_without_dropping() {
        let mut bundle = OutputBundle::new();
        bundle.insert(asset("style.css"));
        bundle.insert(asset("src/pages/style.css"));

        let err = bundle
            .rename("src/pages/style.css", "style.css".to_string())
            .unwrap_err();

        assert!(matches!(err, Error::OutputConflict { .. }));
        assert_eq!(bundle.len(), 2);
    }

    #[test]
    fn test_chunk_contents_are_code() {
        let chunk = OutputArtifact::Chunk(OutputChunk {
            file_name: "assets/main.js".into(),
            name: "main".into(),
            is_entry: true,
            code: "console.log(1);".into(),
        });
        assert_eq!(chunk.contents(), b"console.log(1);");
    }
}
