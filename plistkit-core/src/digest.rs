use anyhow::Context;
use camino::Utf8Path;
use fs_err as fs;
use sha2::{Digest, Sha256};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of a file output; `None` for directory outputs.
pub fn output_sha256(path: &Utf8Path) -> anyhow::Result<Option<String>> {
    if path.is_dir() {
        return Ok(None);
    }
    let bytes = fs::read(path).with_context(|| format!("read {}", path))?;
    Ok(Some(sha256_hex(&bytes)))
}
