//! Record types for the transcript catalog.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Source category of a stream.
///
/// Twitch VODs re-uploaded to YouTube carry the YouTube video id but are
/// still categorized as `Twitch` by the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Youtube,
    Twitch,
    External,
}

impl StreamKind {
    /// Fixed order in which categories are synchronized.
    pub const CATEGORIES: [StreamKind; 3] =
        [StreamKind::Youtube, StreamKind::Twitch, StreamKind::External];
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamKind::Youtube => write!(f, "youtube"),
            StreamKind::Twitch => write!(f, "twitch"),
            StreamKind::External => write!(f, "external"),
        }
    }
}

impl std::str::FromStr for StreamKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "youtube" => Ok(StreamKind::Youtube),
            "twitch" => Ok(StreamKind::Twitch),
            "external" => Ok(StreamKind::External),
            _ => anyhow::bail!("Unknown stream kind: {}", s),
        }
    }
}

/// One transcript/metadata entry.
///
/// `id_path` is the stable archive identifier and the primary key of the
/// catalog. A record discovered through the index starts as a stub with
/// only `kind` and `id_path` set; a successful metadata fetch fills in the
/// remaining fields. `downloaded` is true iff the transcript artifact for
/// `id_path` exists on disk.
///
/// Field order matches the persisted CSV columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stream date (ISO-like, as reported by the archive)
    pub date: Option<String>,

    /// Owning streamer/channel
    pub user: Option<String>,

    /// Source category
    #[serde(rename = "type")]
    pub kind: StreamKind,

    /// Stream title
    pub title: Option<String>,

    /// Whether the transcript artifact has been fetched and persisted
    pub downloaded: bool,

    /// Stable archive identifier (primary key)
    pub id_path: String,
}

impl Record {
    /// Create a stub record known only by kind and id.
    pub fn stub(kind: StreamKind, id_path: impl Into<String>) -> Self {
        Self {
            date: None,
            user: None,
            kind,
            title: None,
            downloaded: false,
            id_path: id_path.into(),
        }
    }

    /// Whether all metadata fields have been filled in.
    ///
    /// A record with complete metadata skips the metadata endpoint and goes
    /// straight to transcript materialization.
    pub fn has_metadata(&self) -> bool {
        self.date.is_some() && self.user.is_some() && self.title.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_kind_from_str() {
        assert_eq!("youtube".parse::<StreamKind>().unwrap(), StreamKind::Youtube);
        assert_eq!("Twitch".parse::<StreamKind>().unwrap(), StreamKind::Twitch);
        assert_eq!(
            "external".parse::<StreamKind>().unwrap(),
            StreamKind::External
        );
        assert!("twitchvod".parse::<StreamKind>().is_err());
    }

    #[test]
    fn test_stream_kind_display_round_trip() {
        for kind in StreamKind::CATEGORIES {
            assert_eq!(kind.to_string().parse::<StreamKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_stub_has_no_metadata() {
        let stub = Record::stub(StreamKind::Youtube, "vid1");
        assert!(!stub.has_metadata());
        assert!(!stub.downloaded);
        assert_eq!(stub.id_path, "vid1");
    }

    #[test]
    fn test_complete_record_has_metadata() {
        let record = Record {
            date: Some("20240101".to_string()),
            user: Some("A".to_string()),
            kind: StreamKind::Youtube,
            title: Some("T".to_string()),
            downloaded: false,
            id_path: "vid1".to_string(),
        };
        assert!(record.has_metadata());
    }
}
