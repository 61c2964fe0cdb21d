//! Work identity: a content-derived key for one (account, workspace, file) run.
//!
//! Pure functions only: the caller reads the file bytes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of one unit of bulk-transfer work.
///
/// Two runs share an identity only when account, workspace and the exact
/// input bytes are all identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkIdentity {
    pub account: String,
    pub workspace: String,
    pub fingerprint: String,
}

impl WorkIdentity {
    /// Derive the identity for `bytes` read under `account`/`workspace`.
    #[must_use]
    pub fn new(account: &str, workspace: &str, bytes: &[u8]) -> Self {
        Self {
            account: account.to_owned(),
            workspace: workspace.to_owned(),
            fingerprint: fingerprint(account, workspace, bytes),
        }
    }
}

/// SHA-256 over `account`, `workspace` and `bytes`, hex encoded.
///
/// Fields are NUL-separated so shifting characters between account and
/// workspace never yields the same digest.
#[must_use]
pub fn fingerprint(account: &str, workspace: &str, bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account.as_bytes());
    hasher.update([0u8]);
    hasher.update(workspace.as_bytes());
    hasher.update([0u8]);
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

/// Encode bytes as lowercase hex.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
