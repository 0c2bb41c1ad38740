use super::filters::FilterSet;
use super::path_utils::{is_safe_segment, normalize_name};
use rustc_hash::FxHashMap;
use tracing::debug;

// ---------------------------------------------------------------------------
// DirIndex – one-pass reconstruction of the logical directory tree
// ---------------------------------------------------------------------------

/// Metadata of one archive entry, as enumerated by the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntryMeta {
    /// Raw, untrusted entry name.
    pub name: String,
    /// Whether the container flags this entry as a directory.
    pub is_dir: bool,
    /// Position of the entry in the container's enumeration order.
    pub index: usize,
}

/// A file child of one directory listing.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct FileChild {
    /// Single-segment child name.
    pub name: Box<str>,
    /// Container entry index of the first entry that produced this child.
    pub entry_index: usize,
}

/// Immediate children of one logical directory, in first-encounter order.
///
/// Invariant: every name in `files` and `subdirs` is a safe single segment,
/// and no name appears in both.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DirListing {
    /// `""` for the root, else the normalized path ending in `/`.
    prefix: Box<str>,
    files: Vec<FileChild>,
    subdirs: Vec<Box<str>>,
}

impl DirListing {
    fn new(prefix: &str) -> Self {
        Self {
            prefix: Box::from(prefix),
            files: Vec::new(),
            subdirs: Vec::new(),
        }
    }

    pub(crate) fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn file_names(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.name.as_ref()).collect()
    }

    pub(crate) fn subdir_names(&self) -> Vec<&str> {
        self.subdirs.iter().map(AsRef::as_ref).collect()
    }

    pub(crate) fn file(&self, name: &str) -> Option<&FileChild> {
        self.files.iter().find(|f| &*f.name == name)
    }

    pub(crate) fn has_subdir(&self, name: &str) -> bool {
        self.subdirs.iter().any(|d| &**d == name)
    }

    // A name registered as a subdirectory blocks (or evicts) a same-named
    // file in this listing; entries beneath it must stay reachable.
    fn add_file(&mut self, name: &str, entry_index: usize) {
        if self.has_subdir(name) { return; }
        if self.file(name).is_some() { return; }
        self.files.push(FileChild { name: Box::from(name), entry_index });
    }

    fn add_subdir(&mut self, name: &str) {
        if let Some(pos) = self.files.iter().position(|f| &*f.name == name) {
            self.files.remove(pos);
        }
        if self.has_subdir(name) { return; }
        self.subdirs.push(Box::from(name));
    }
}

/// Mapping from every valid directory prefix to its immediate children.
///
/// Built once, in a single pass over the container's entry sequence; after
/// construction it is read-only, so repeated listings of the same directory
/// are identical by construction.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct DirIndex {
    root: DirListing,
    /// Non-root listings, keyed by prefix (`"a/b/"` form).
    dirs: FxHashMap<Box<str>, DirListing>,
}

impl DirIndex {
    fn new() -> Self {
        Self {
            root: DirListing::new(""),
            dirs: FxHashMap::default(),
        }
    }

    pub(crate) fn root(&self) -> &DirListing {
        &self.root
    }

    /// Looks up the listing for a prefix; `""` names the root.
    pub(crate) fn listing(&self, prefix: &str) -> Option<&DirListing> {
        if prefix.is_empty() {
            Some(&self.root)
        } else {
            self.dirs.get(prefix)
        }
    }

    /// Number of known directories, the root included.
    pub(crate) fn dir_count(&self) -> usize {
        self.dirs.len() + 1
    }

    fn listing_mut(&mut self, prefix: &str) -> &mut DirListing {
        if prefix.is_empty() {
            &mut self.root
        } else {
            self.dirs
                .entry(Box::from(prefix))
                .or_insert_with(|| DirListing::new(prefix))
        }
    }

    /// Registers one normalized entry path under every ancestor prefix.
    ///
    /// Every segment is re-validated here, unconditionally, even though
    /// `path` already passed normalization; a failing entry registers
    /// nothing at all.
    fn insert(&mut self, path: &str, marker: bool, entry_index: usize) {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| !is_safe_segment(s)) {
            debug!(path, "skipping entry that failed segment re-validation");
            return;
        }

        let last = segments.len() - 1;
        let mut prefix = String::new();
        for (depth, segment) in segments.iter().enumerate() {
            if depth == last && !marker {
                self.listing_mut(&prefix).add_file(segment, entry_index);
            } else {
                let child = format!("{prefix}{segment}/");
                self.listing_mut(&prefix).add_subdir(segment);
                // The child listing exists even before any of its own
                // children are seen.
                self.listing_mut(&child);
                prefix = child;
            }
        }
    }
}

/// Builds the directory index from the container's entry sequence.
///
/// Entries whose names fail sanitization are silently excluded (a single
/// adversarial or corrupt entry must not abort listing of an otherwise-valid
/// archive). When a filter is present it applies to file entries only;
/// explicit directory markers keep the structure visible.
pub(crate) fn build(entries: &[EntryMeta], filter: Option<&FilterSet>) -> DirIndex {
    let mut index = DirIndex::new();

    for entry in entries {
        let marker = entry.is_dir || entry.name.ends_with(['/', '\\']);

        let Some(normalized) = normalize_name(&entry.name) else {
            debug!(name = %entry.name, "excluding unsafe or malformed entry name");
            continue;
        };

        if !marker {
            if let Some(filter) = filter {
                if !filter.matches_str(&normalized) { continue; }
            }
        }

        index.insert(&normalized, marker, entry.index);
    }

    index
}
