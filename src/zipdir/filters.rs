use super::ZipRoFsError;
use super::path_utils::validate_path;
use rustc_hash::FxHashSet;

/// A set of filters restricting which file entries the directory view exposes.
///
/// Useful when only a known subset of an archive matters: entries that do not
/// match any filter are left out of the index entirely, as if the archive did
/// not contain them. Filters are added builder-style; each addition validates
/// and normalizes its input, so a filter can never select a path the
/// sanitizer would reject.
///
/// Three selector kinds are supported:
/// - exact paths (`add_exact`), matched in O(1);
/// - glob patterns (`add_glob`), evaluated in insertion order with
///   `fast_glob::glob_match`;
/// - directory subtrees (`add_dir`), matching every file below the prefix.
///
/// # Example
/// ```
/// # use zipdir::{FilterSet, ZipRoFsError};
/// # fn main() -> Result<(), ZipRoFsError> {
/// let filter = FilterSet::new()
///     .add_exact("manifest.toml")?
///     .add_glob("assets/*.png")?
///     .add_dir("docs")?;
///
/// assert!( filter.matches_str("manifest.toml"));
/// assert!( filter.matches_str("assets/logo.png"));
/// assert!( filter.matches_str("docs/guide/intro.md"));
/// assert!(!filter.matches_str("assets/logo.svg"));
/// # Ok(())
/// # }
/// ```
///
/// An empty `FilterSet` matches **no** paths. To expose the whole archive,
/// pass `None` instead of a filter.
#[derive(Debug, Default)]
pub struct FilterSet {
    /// Exact normalized paths, matched first.
    exact: FxHashSet<Box<str>>,
    /// Glob patterns, evaluated in the order they were added.
    globs: Vec<String>,
    /// Directory prefixes selecting whole subtrees (stored without a
    /// trailing separator).
    dirs: Vec<String>,
}

impl FilterSet {
    /// Creates an empty filter set.
    pub fn new() -> Self { Self::default() }

    /// Adds an exact path to the filter set.
    ///
    /// # Arguments
    /// * `path` – The exact path to match (e.g., `"assets/logo.png"`).
    ///
    /// # Errors
    /// Returns `ZipRoFsError::InvalidPattern` if the path is empty, absolute,
    /// or contains a parent-directory segment.
    pub fn add_exact(mut self, path: &str) -> Result<Self, ZipRoFsError> {
        let normalized = validate_path(path)?;
        self.exact.insert(normalized.into_boxed_str());
        Ok(self)
    }

    /// Adds a glob pattern to the filter set.
    ///
    /// Matching uses [`fast_glob::glob_match`] with the usual `*` and `?`
    /// wildcards.
    ///
    /// # Arguments
    /// * `pattern` – A glob pattern (e.g., `"assets/*.png"`).
    ///
    /// # Errors
    /// Returns `ZipRoFsError::InvalidPattern` if the pattern is empty,
    /// absolute, or contains a parent-directory segment.
    pub fn add_glob(mut self, pattern: &str) -> Result<Self, ZipRoFsError> {
        let normalized = validate_path(pattern)?;
        self.globs.push(normalized);
        Ok(self)
    }

    /// Adds a directory subtree to the filter set.
    ///
    /// Every file whose path lies below `dir` (at any depth) matches. The
    /// directory itself is a prefix, not a match: `add_dir("docs")` selects
    /// `docs/a.md` and `docs/x/y.md` but not a file named `docs`.
    ///
    /// # Arguments
    /// * `dir` – The subtree root (e.g., `"docs"` or `"assets/icons"`).
    ///
    /// # Errors
    /// Returns `ZipRoFsError::InvalidPattern` if the path is empty, absolute,
    /// or contains a parent-directory segment.
    pub fn add_dir(mut self, dir: &str) -> Result<Self, ZipRoFsError> {
        let normalized = validate_path(dir)?;
        self.dirs.push(normalized);
        Ok(self)
    }

    /// Checks whether the given normalized path matches any selector.
    ///
    /// Exact paths are tried first, then subtree prefixes, then glob
    /// patterns in insertion order.
    #[inline]
    pub fn matches_str(&self, path: &str) -> bool {
        if self.exact.contains(path) { return true; }
        if self.dirs.iter().any(|d| {
            path.len() > d.len()
                && path.starts_with(d.as_str())
                && path.as_bytes()[d.len()] == b'/'
        }) {
            return true;
        }
        self.globs.iter().any(|g| fast_glob::glob_match(g, path))
    }

    /// Returns `true` if no selectors have been added.
    ///
    /// An empty filter set matches **no** paths.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.globs.is_empty() && self.dirs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_glob_and_subtree_selectors() {
        let filter = FilterSet::new()
            .add_exact("manifest.toml").unwrap()
            .add_glob("assets/*.png").unwrap()
            .add_dir("docs").unwrap();

        assert!(filter.matches_str("manifest.toml"));
        assert!(filter.matches_str("assets/logo.png"));
        assert!(!filter.matches_str("assets/deep/logo.png"));
        assert!(filter.matches_str("docs/a.md"));
        assert!(filter.matches_str("docs/guide/intro.md"));
        assert!(!filter.matches_str("docs"));
        assert!(!filter.matches_str("docsx/a.md"));
    }

    #[test]
    fn empty_set_matches_nothing() {
        let filter = FilterSet::new();
        assert!(filter.is_empty());
        assert!(!filter.matches_str("anything"));
    }

    #[test]
    fn selectors_are_validated() {
        assert!(FilterSet::new().add_glob("../*.txt").is_err());
        assert!(FilterSet::new().add_dir("/abs").is_err());
        assert!(FilterSet::new().add_exact("").is_err());
    }

    #[test]
    fn selector_input_is_normalized() {
        let filter = FilterSet::new().add_exact("a\\b.txt").unwrap();
        assert!(filter.matches_str("a/b.txt"));
    }
}
