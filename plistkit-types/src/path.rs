//! Lexical path normalization shared by rule validation and the build graph.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Drop `.` segments and fold `..` into the preceding segment.
///
/// Leading `..` of a relative path are kept; `..` at the root is dropped.
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut parts: Vec<Utf8Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match parts.last() {
                Some(Utf8Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Utf8Component::RootDir) | Some(Utf8Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    let out: Utf8PathBuf = parts.iter().map(|c| c.as_str()).collect();
    if out.as_str().is_empty() {
        Utf8PathBuf::from(".")
    } else {
        out
    }
}
