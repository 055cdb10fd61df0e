//! Package manifest: format version, timestamps, and the asset list.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Container format version written to new packages.
pub const FORMAT_VERSION: u32 = 1;

/// Manifest stored at the package root.
///
/// On decode the asset list is *derived* from the archive's actual
/// `assets/` contents; whatever list the stored manifest claims is never
/// trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub version: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
    pub assets: Vec<String>,
}

impl PackageManifest {
    /// Fresh manifest for a package being written now.
    pub fn new(assets: Vec<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            version: FORMAT_VERSION,
            created_at: now,
            modified_at: now,
            assets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_camel_case() {
        let manifest = PackageManifest::new(vec!["a.png".into()]);
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"modifiedAt\""));
    }
}
