//! Pure, lexical path helpers. Nothing here touches the filesystem.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

pub use plistkit_types::path::normalize;

/// Express `path` relative to `base`.
///
/// Both are normalized first. Relative inputs are taken to share a root.
/// When no relative form exists (one side absolute and the other not, or
/// `base` climbing above the shared root) the normalized `path` is returned.
pub fn rebase_path(path: &Utf8Path, base: &Utf8Path) -> Utf8PathBuf {
    let path = normalize(path);
    let base = normalize(base);
    if path.is_absolute() != base.is_absolute() {
        return path;
    }

    let p: Vec<_> = path.components().filter(|c| *c != Utf8Component::CurDir).collect();
    let b: Vec<_> = base.components().filter(|c| *c != Utf8Component::CurDir).collect();
    let common = p.iter().zip(&b).take_while(|(x, y)| x == y).count();

    if b[common..].contains(&Utf8Component::ParentDir) {
        return path;
    }

    let mut out = Utf8PathBuf::new();
    for _ in common..b.len() {
        out.push("..");
    }
    for c in &p[common..] {
        out.push(c.as_str());
    }
    if out.as_str().is_empty() {
        Utf8PathBuf::from(".")
    } else {
        out
    }
}
