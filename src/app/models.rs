//! Data models shared across the download pipeline
//!
//! Asset references, archive entries, per-asset download outcomes and the
//! project metadata returned by the token lookup.

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::{archive, endpoints};
use crate::errors::DownloadError;

/// Composite `(id, format)` key pointing at one binary asset
///
/// Equality and hashing are by both fields. The archive entry name and the
/// asset endpoint path are both `"{id}.{format}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetReference {
    pub id: String,
    pub format: String,
}

impl AssetReference {
    /// Create a reference from separate id and format values
    pub fn new(id: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            format: format.into(),
        }
    }

    /// Parse the combined `"id.format"` form
    ///
    /// The format is everything after the last dot. Returns `None` when either
    /// side is empty or there is no dot.
    pub fn from_combined(combined: &str) -> Option<Self> {
        let (id, format) = combined.rsplit_once('.')?;
        if id.is_empty() || format.is_empty() {
            return None;
        }
        Some(Self::new(id, format))
    }

    /// Name of this asset's entry inside the archive
    pub fn entry_name(&self) -> String {
        self.to_string()
    }

    /// Download URL of this asset under the given base
    pub fn download_url(&self, asset_base: &str) -> String {
        format!("{}/{}/get/", asset_base.trim_end_matches('/'), self)
    }

    /// Download URL under the default asset endpoint
    pub fn default_download_url(&self) -> String {
        self.download_url(endpoints::ASSET_BASE_URL)
    }

    /// Whether the id looks like an MD5 content digest
    pub fn is_md5_id(&self) -> bool {
        self.id.len() == 32 && self.id.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id, self.format)
    }
}

/// One named file destined for the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Bytes,
}

impl ArchiveEntry {
    /// Entry holding the UTF-8 project descriptor
    pub fn descriptor(bytes: impl Into<Bytes>) -> Self {
        Self {
            name: archive::DESCRIPTOR_ENTRY.to_string(),
            bytes: bytes.into(),
        }
    }

    /// Entry holding one downloaded asset
    pub fn asset(reference: &AssetReference, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: reference.entry_name(),
            bytes: bytes.into(),
        }
    }
}

/// Result of downloading one asset with retries
#[derive(Debug)]
pub enum DownloadOutcome {
    /// Bytes received on the successful attempt
    Success { bytes: Bytes, size: u64, attempts: u32 },
    /// Permanent failure after `attempts` tries
    Failure { cause: DownloadError, attempts: u32 },
}

impl DownloadOutcome {
    /// Build a success outcome, deriving the size from the buffer
    pub fn success(bytes: Bytes, attempts: u32) -> Self {
        let size = bytes.len() as u64;
        Self::Success {
            bytes,
            size,
            attempts,
        }
    }

    /// Number of requests issued
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Success { attempts, .. } | Self::Failure { attempts, .. } => *attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Convert into the payload or the fatal cause
    pub fn into_result(self) -> Result<Bytes, DownloadError> {
        match self {
            Self::Success { bytes, .. } => Ok(bytes),
            Self::Failure { cause, .. } => Err(cause),
        }
    }
}

/// Project metadata returned by the token lookup endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_token: String,
    #[serde(default)]
    pub title: Option<String>,
}
