//! Mapping between logical paths (as requested or emitted) and physical paths
//! under the pages directory.
//!
//! ```text
//! logical             physical (dir = src/pages)
//! /about.html    ⇄    src/pages/about.html
//! /blog/post.html ⇄   src/pages/blog/post.html
//! ```

use pages_util::path::{is_within, normalize, to_slash};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// The pages directory, normalized, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagesDir {
    dir: PathBuf,
}

impl PagesDir {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: normalize(dir),
        }
    }

    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.dir
    }

    /// The pages directory resolved against `root`.
    #[must_use]
    pub fn absolute(&self, root: &Path) -> PathBuf {
        normalize(&root.join(&self.dir))
    }

    /// Physical candidate for a request path, relative to the root.
    ///
    /// Query and fragment are ignored and the path is percent-decoded.
    /// Returns `None` when the candidate would leave the pages directory or
    /// the path does not decode to UTF-8.
    #[must_use]
    pub fn physical_for_request(&self, request_path: &str) -> Option<PathBuf> {
        let path = request_path.split(['?', '#']).next().unwrap_or_default();
        let decoded = urlencoding::decode(path).ok()?;
        let candidate = normalize(&self.dir.join(decoded.trim_start_matches('/')));

        is_within(&candidate, &self.dir).then_some(candidate)
    }

    /// Logical path for a file, or `None` if it is not under the pages directory.
    ///
    /// `file` may be absolute or relative to `root`.
    #[must_use]
    pub fn logical_for_file(&self, root: &Path, file: &Path) -> Option<String> {
        let relative = self.strip(root, file)?;
        Some(format!("/{}", to_slash(&relative)))
    }

    /// Output name with the pages directory prefix removed, or `None` if the
    /// output does not lie strictly inside the pages directory.
    #[must_use]
    pub fn strip_output(&self, root: &Path, file_name: &str) -> Option<String> {
        let relative = self.strip(root, Path::new(file_name))?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        Some(to_slash(&relative))
    }

    fn strip(&self, root: &Path, file: &Path) -> Option<PathBuf> {
        let file = normalize(&root.join(file));
        file.strip_prefix(self.absolute(root))
            .ok()
            .map(Path::to_path_buf)
    }
}

/// URL path serving a physical candidate, rooted at `/`.
///
/// Segments are percent-encoded; a trailing slash on the incoming request is kept.
#[must_use]
pub fn request_target(candidate: &Path, request_path: &str) -> String {
    let slashed = to_slash(candidate);
    let mut target = String::from("/");
    let segments: Vec<Cow<'_, str>> = slashed
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(urlencoding::encode)
        .collect();
    target.push_str(&segments.join("/"));

    let wants_slash = request_path
        .split(['?', '#'])
        .next()
        .is_some_and(|path| path.ends_with('/'));
    if wants_slash && !target.ends_with('/') {
        target.push('/');
    }
    target
}
