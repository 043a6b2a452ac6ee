//! Lexical path helpers.
//!
//! None of these touch the filesystem: `..` is resolved against the
//! preceding component, never against a symlink target.

use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Lexically normalize a path: drop `.` segments and fold `..` into the
/// preceding normal segment.
///
/// Leading `..` segments of a relative path are kept (`../a` stays `../a`);
/// `..` directly under a root is dropped (`/../a` becomes `/a`). An input that
/// normalizes to nothing yields an empty path.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(segment) => out.push(segment),
        }
    }

    out
}

/// Whether `path` lies at or below `base`, comparing whole components.
///
/// Both paths are normalized first. A relative path that climbs above its
/// starting point is never within anything.
#[must_use]
pub fn is_within(path: &Path, base: &Path) -> bool {
    let path = normalize(path);
    if matches!(path.components().next(), Some(Component::ParentDir)) {
        return false;
    }
    path.starts_with(normalize(base))
}

/// Render a path with `/` separators regardless of platform.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    let rendered = path.to_string_lossy();
    if MAIN_SEPARATOR == '/' {
        rendered.into_owned()
    } else {
        rendered.replace(MAIN_SEPARATOR, "/")
    }
}

/// Whether `path` has the given extension, ignoring ASCII case and an
/// optional leading dot on `ext`.
#[must_use]
pub fn has_extension(path: &Path, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    path.extension()
        .is_some_and(|actual| actual.to_string_lossy().eq_ignore_ascii_case(ext))
}
