//! Local transcript artifact storage.
//!
//! One text file per `id_path` under the transcript directory, created on
//! demand. A transcript with no spoken content is written as a fixed
//! sentinel line so the file still proves the download happened.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::fs;

use super::error::SyncError;

/// Placeholder written when the archive reports a null transcript.
pub const NULL_TRANSCRIPT_SENTINEL: &str = "--NULL TRANSCRIPT: NO YAPPING DETECTED--";

/// Body of the archive's transcript endpoint.
#[derive(Debug, Deserialize)]
pub struct TranscriptDoc {
    /// `null` when the stream had no spoken content.
    #[serde(rename = "transcriptLines")]
    pub transcript_lines: Option<Vec<Cue>>,
}

/// One caption cue, in the order received.
#[derive(Debug, Clone, Deserialize)]
pub struct Cue {
    pub start: String,
    pub text: String,
}

/// Stores transcript artifacts under a fixed output directory.
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    /// Create a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The artifact directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact path for an id.
    pub fn path_for(&self, id_path: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", id_path))
    }

    /// Whether an artifact already exists for this id.
    ///
    /// Existence is the whole check: no hash or freshness comparison. An
    /// existing artifact is trusted over a re-download.
    pub fn exists(&self, id_path: &str) -> bool {
        self.path_for(id_path).exists()
    }

    /// Write the artifact for an id from its cues.
    ///
    /// `None` cues produce the sentinel line; otherwise one
    /// ` [<start>] <text>` line per cue, order preserved.
    pub async fn write(&self, id_path: &str, cues: Option<&[Cue]>) -> Result<PathBuf, SyncError> {
        let path = self.path_for(id_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|source| SyncError::LocalIo {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut body = String::new();
        match cues {
            None => {
                body.push_str(NULL_TRANSCRIPT_SENTINEL);
                body.push('\n');
            }
            Some(cues) => {
                for cue in cues {
                    body.push_str(&format!(" [{}] {}\n", cue.start, cue.text));
                }
            }
        }

        fs::write(&path, body).await.map_err(|source| SyncError::LocalIo {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_formats_one_line_per_cue() {
        let temp = TempDir::new().unwrap();
        let store = TranscriptStore::new(temp.path());

        let cues = vec![
            Cue {
                start: "00:00".to_string(),
                text: "hi".to_string(),
            },
            Cue {
                start: "00:05".to_string(),
                text: "there".to_string(),
            },
        ];
        let path = store.write("vid1", Some(&cues)).await.unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, " [00:00] hi\n [00:05] there\n");
    }

    #[tokio::test]
    async fn test_write_null_transcript_writes_sentinel() {
        let temp = TempDir::new().unwrap();
        let store = TranscriptStore::new(temp.path());

        store.write("vid1", None).await.unwrap();

        let contents = std::fs::read_to_string(store.path_for("vid1")).unwrap();
        assert_eq!(contents, format!("{}\n", NULL_TRANSCRIPT_SENTINEL));
    }

    #[tokio::test]
    async fn test_exists_after_write() {
        let temp = TempDir::new().unwrap();
        let store = TranscriptStore::new(temp.path());

        assert!(!store.exists("vid1"));
        store.write("vid1", None).await.unwrap();
        assert!(store.exists("vid1"));
    }

    #[tokio::test]
    async fn test_write_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let store = TranscriptStore::new(temp.path().join("transcripts"));

        store.write("vid1", None).await.unwrap();
        assert!(store.path_for("vid1").exists());
    }

    #[test]
    fn test_transcript_doc_parses_null_lines() {
        let doc: TranscriptDoc = serde_json::from_str(r#"{"transcriptLines": null}"#).unwrap();
        assert!(doc.transcript_lines.is_none());

        let doc: TranscriptDoc =
            serde_json::from_str(r#"{"transcriptLines": [{"start": "00:00", "text": "hi"}]}"#)
                .unwrap();
        assert_eq!(doc.transcript_lines.unwrap().len(), 1);
    }
}
