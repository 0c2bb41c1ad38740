use super::ZipRoFsError;
use std::borrow::Cow;

/// Normalizes a raw archive entry name into a canonical relative path.
///
/// Entry names inside an archive are untrusted strings: they may use either
/// separator convention, start with a separator (absolute), or smuggle
/// parent-directory segments that would resolve outside the logical root.
/// This function applies, in order:
///
/// - Unification of `\` to the canonical `/` separator.
/// - Rejection of absolute names (leading separator).
/// - Trimming of trailing separators (the archive convention for directory
///   markers; a trailing separator is a marker, not an empty segment).
/// - Rejection of any empty or `".."` segment.
/// - Dropping of `"."` segments (they denote the current directory).
///
/// # Arguments
///
/// * `path` - The raw entry name to normalize.
///
/// # Returns
///
/// `Some(path)` with the canonical relative path, borrowed from the input
/// when no rewriting was needed, or `None` if the name is unsafe or
/// malformed. There is no partially-normalized output: a name that cannot
/// be fully normalized is rejected outright.
pub fn normalize_name(path: &str) -> Option<Cow<'_, str>> {
    let unified: Cow<'_, str> = if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    };

    if unified.starts_with('/') { return None; }

    let trimmed_len = unified.trim_end_matches('/').len();
    if trimmed_len == 0 { return None; }

    let mut kept = 0usize;
    let mut dropped_dot = false;
    for segment in unified[..trimmed_len].split('/') {
        match segment {
            "" | ".." => return None,
            "." => dropped_dot = true,
            _ => kept += 1,
        }
    }
    if kept == 0 { return None; }

    if dropped_dot {
        let rebuilt = unified[..trimmed_len]
            .split('/')
            .filter(|s| *s != ".")
            .collect::<Vec<_>>()
            .join("/");
        return Some(Cow::Owned(rebuilt));
    }

    match unified {
        Cow::Borrowed(u) => Some(Cow::Borrowed(&u[..trimmed_len])),
        Cow::Owned(mut s) => {
            s.truncate(trimmed_len);
            Some(Cow::Owned(s))
        }
    }
}

/// Normalizes a caller-supplied directory path into a lookup key.
///
/// More lenient than [`normalize_name`] at the edges, since callers name
/// directories in several spellings: leading separators are trimmed, and the
/// empty string, `"/"`, and similar root spellings all map to the root key
/// (the empty string). The interior of the path is held to the same rules as
/// entry names.
///
/// # Arguments
///
/// * `dir` - The directory path to normalize (e.g., `"assets/icons"` or
///   `"/assets/icons/"`).
///
/// # Returns
///
/// `Some("")` for the root, `Some(path)` with the canonical relative path
/// otherwise, or `None` if the path is unsafe or malformed.
pub fn normalize_dir(dir: &str) -> Option<Cow<'_, str>> {
    let inner = dir.trim_start_matches(['/', '\\']);
    if inner.trim_end_matches(['/', '\\']).is_empty() {
        return Some(Cow::Borrowed(""));
    }
    normalize_name(inner)
}

/// Checks whether a name is a well-formed single path segment.
///
/// A safe segment is non-empty, is not `"."` or `".."`, and contains no
/// separator of either convention and no NUL byte. Child names in a
/// directory listing always satisfy this; the index re-checks it for every
/// segment it registers, independently of [`normalize_name`] having already
/// accepted the full path.
#[inline]
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('/')
        && !segment.contains('\\')
        && !segment.contains('\0')
}

/// Validates and normalizes a caller-supplied path or pattern.
///
/// Strict form of [`normalize_name`] for input that reaches the API from the
/// caller rather than from the archive: rejection is an error instead of a
/// silent skip.
///
/// # Arguments
///
/// * `path` - The raw path or glob pattern to validate.
///
/// # Errors
///
/// Returns `ZipRoFsError::InvalidPattern` if the input is empty, absolute,
/// or contains an empty or parent-directory segment.
#[inline]
pub fn validate_path(path: &str) -> Result<String, ZipRoFsError> {
    match normalize_name(path) {
        Some(normalized) => Ok(normalized.into_owned()),
        None => Err(ZipRoFsError::InvalidPattern(format!(
            "`{path}` is empty, absolute, or escapes the root"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> Option<String> {
        normalize_name(raw).map(Cow::into_owned)
    }

    #[test]
    fn unifies_both_separator_conventions() {
        assert_eq!(norm("x\\y\\z.txt").as_deref(), Some("x/y/z.txt"));
        assert_eq!(norm("x/y/z.txt").as_deref(), Some("x/y/z.txt"));
    }

    #[test]
    fn rejects_absolute_names() {
        assert_eq!(norm("/etc/passwd"), None);
        assert_eq!(norm("\\windows\\system32"), None);
        assert_eq!(norm("/"), None);
    }

    #[test]
    fn rejects_parent_segments_anywhere() {
        assert_eq!(norm("../secret.txt"), None);
        assert_eq!(norm("a/../b.txt"), None);
        assert_eq!(norm("a/b/.."), None);
        assert_eq!(norm("..\\secret.txt"), None);
    }

    #[test]
    fn rejects_interior_empty_segments() {
        assert_eq!(norm("a//b"), None);
        assert_eq!(norm("a/\\b.txt"), None);
    }

    #[test]
    fn trims_trailing_directory_markers() {
        assert_eq!(norm("a/b/").as_deref(), Some("a/b"));
        assert_eq!(norm("a/b///").as_deref(), Some("a/b"));
        assert_eq!(norm("a\\b\\").as_deref(), Some("a/b"));
    }

    #[test]
    fn drops_current_dir_segments() {
        assert_eq!(norm("./a/./b.txt").as_deref(), Some("a/b.txt"));
        assert_eq!(norm("."), None);
        assert_eq!(norm("./"), None);
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(norm(""), None);
    }

    #[test]
    fn borrows_when_already_canonical() {
        assert!(matches!(normalize_name("a/b.txt"), Some(Cow::Borrowed(_))));
        assert!(matches!(normalize_name("a/b/"), Some(Cow::Borrowed(_))));
    }

    #[test]
    fn normalize_dir_maps_root_spellings() {
        assert_eq!(normalize_dir("").as_deref(), Some(""));
        assert_eq!(normalize_dir("/").as_deref(), Some(""));
        assert_eq!(normalize_dir("///").as_deref(), Some(""));
    }

    #[test]
    fn normalize_dir_trims_edges() {
        assert_eq!(normalize_dir("/a/b/").as_deref(), Some("a/b"));
        assert_eq!(normalize_dir("a\\b").as_deref(), Some("a/b"));
        assert_eq!(normalize_dir("a/../b"), None);
    }

    #[test]
    fn safe_segment_rules() {
        assert!(is_safe_segment("readme.txt"));
        assert!(!is_safe_segment(""));
        assert!(!is_safe_segment("."));
        assert!(!is_safe_segment(".."));
        assert!(!is_safe_segment("a/b"));
        assert!(!is_safe_segment("a\\b"));
        assert!(!is_safe_segment("a\0b"));
    }

    #[test]
    fn validate_path_surfaces_rejection() {
        assert!(validate_path("docs/*.txt").is_ok());
        assert!(matches!(
            validate_path("../escape"),
            Err(ZipRoFsError::InvalidPattern(_))
        ));
        assert!(matches!(
            validate_path(""),
            Err(ZipRoFsError::InvalidPattern(_))
        ));
    }
}
