use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content hash of a compressed passage.
///
/// Two calls over byte-identical passages carry the same version, which lets
/// callers key downstream caches on it without keeping the passage around.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassageVersion(String);

impl PassageVersion {
    pub fn from_content(content: &[u8]) -> Self {
        PassageVersion(sha256_tagged(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Digest of the canonical JSON form of a compressor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigFingerprint(String);

impl ConfigFingerprint {
    pub fn from_canonical_json(json: &[u8]) -> Self {
        ConfigFingerprint(sha256_tagged(json))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn sha256_tagged(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);

    let hash = hasher.finalize();
    format!("sha256:{}", hex::encode(hash))
}
