//! Torrent descriptors - info hashes and the specs needed to re-create a session.
//!
//! A spec is either a magnet URI or the raw bytes of a .torrent file. Torrent
//! files are parsed with librqbit-core so the info hash and embedded name are
//! known without touching the network.

use std::fmt;
use std::str::FromStr;

use librqbit_core::torrent_metainfo::{torrent_from_bytes, TorrentMetaV1Owned};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing torrent descriptors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("Invalid info hash: {0}")]
    InvalidHash(String),

    #[error("Invalid magnet link: {0}")]
    InvalidMagnet(String),

    #[error("Failed to parse torrent: {0}")]
    ParseError(String),

    #[error("Unsupported link: {0}")]
    UnsupportedLink(String),
}

/// Content-addressing identifier of a torrent (lowercase hex SHA-1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InfoHash(String);

impl InfoHash {
    /// Parse a 40-character hex info hash (case-insensitive).
    pub fn parse(raw: &str) -> Result<Self, SpecError> {
        let trimmed = raw.trim();
        if trimmed.len() != 40 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(SpecError::InvalidHash(raw.to_string()));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this hash can be joined onto a directory without escaping it.
    pub fn is_safe_path_segment(&self) -> bool {
        is_safe_path_segment(&self.0)
    }
}

/// A path segment is safe when it is non-empty, not the root, and not a
/// relative component or a nested path.
pub fn is_safe_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "/"
        && segment != "."
        && segment != ".."
        && !segment.contains('/')
        && !segment.contains('\\')
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for InfoHash {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InfoHash {
    type Error = SpecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InfoHash> for String {
    fn from(hash: InfoHash) -> Self {
        hash.0
    }
}

/// Where a spec came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "payload")]
pub enum SpecSource {
    /// Magnet URI.
    Magnet(String),
    /// Raw .torrent file bytes.
    TorrentFile(Vec<u8>),
}

impl SpecSource {
    /// Short label used for storage and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SpecSource::Magnet(_) => "magnet",
            SpecSource::TorrentFile(_) => "torrent_file",
        }
    }
}

/// The opaque descriptor needed to (re-)create a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentSpec {
    pub info_hash: InfoHash,
    pub source: SpecSource,
    /// Name advertised by the descriptor itself (magnet `dn`, torrent `name`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl TorrentSpec {
    /// Parse a magnet URI.
    pub fn from_magnet(uri: &str) -> Result<Self, SpecError> {
        let query = uri
            .strip_prefix("magnet:?")
            .ok_or_else(|| SpecError::InvalidMagnet(uri.to_string()))?;

        let mut info_hash = None;
        let mut display_name = None;

        for part in query.split('&') {
            if let Some(hash) = part.strip_prefix("xt=urn:btih:") {
                info_hash = Some(
                    InfoHash::parse(hash).map_err(|_| SpecError::InvalidMagnet(uri.to_string()))?,
                );
            } else if let Some(name) = part.strip_prefix("dn=") {
                let name = name.replace('+', " ");
                display_name = urlencoding::decode(&name)
                    .map(|n| n.into_owned())
                    .ok()
                    .filter(|n| !n.is_empty());
            }
        }

        let info_hash = info_hash.ok_or_else(|| SpecError::InvalidMagnet(uri.to_string()))?;

        Ok(Self {
            info_hash,
            source: SpecSource::Magnet(uri.to_string()),
            display_name,
        })
    }

    /// Parse the raw bytes of a .torrent file.
    pub fn from_torrent_bytes(bytes: &[u8]) -> Result<Self, SpecError> {
        let torrent: TorrentMetaV1Owned =
            torrent_from_bytes(bytes).map_err(|e| SpecError::ParseError(e.to_string()))?;

        let info_hash = InfoHash::parse(&torrent.info_hash.as_string())?;
        let display_name = torrent
            .info
            .name
            .as_ref()
            .map(|b| bytes_to_string(b.as_ref()))
            .filter(|n| !n.is_empty());

        Ok(Self {
            info_hash,
            source: SpecSource::TorrentFile(bytes.to_vec()),
            display_name,
        })
    }

    /// Parse a user-supplied link: a magnet URI or a bare info hash.
    pub fn parse_link(link: &str) -> Result<Self, SpecError> {
        let link = link.trim();
        if link.starts_with("magnet:") {
            return Self::from_magnet(link);
        }
        if let Ok(hash) = InfoHash::parse(link) {
            let uri = format!("magnet:?xt=urn:btih:{}", hash);
            return Ok(Self {
                info_hash: hash,
                source: SpecSource::Magnet(uri),
                display_name: None,
            });
        }
        Err(SpecError::UnsupportedLink(link.to_string()))
    }

    /// Rebuild a spec from a stored source.
    pub fn from_source(source: SpecSource) -> Result<Self, SpecError> {
        match source {
            SpecSource::Magnet(uri) => Self::from_magnet(&uri),
            SpecSource::TorrentFile(bytes) => Self::from_torrent_bytes(&bytes),
        }
    }
}

/// Convert bytes to a UTF-8 string, replacing invalid sequences.
fn bytes_to_string(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}
