mod filters;
mod index;
mod node;
mod path_utils;

pub use filters::FilterSet;
pub use node::DirNode;
pub use path_utils::{is_safe_segment, normalize_dir, normalize_name};
pub use zip::CompressionMethod;

use index::{DirIndex, EntryMeta};
use std::cell::RefCell;
use std::io::{Cursor, Read, Seek, SeekFrom};
use thiserror::Error;
use tracing::debug;
use zip::{ZipArchive, result::ZipError};

// ---------------------------------------------------------------------------
// Custom error type (thiserror)
// ---------------------------------------------------------------------------

/// Error type for read-only archive directory operations.
///
/// Wraps errors from the underlying ZIP crate and I/O, plus the typed
/// failures of the directory contract itself. Unsafe or malformed entry
/// names are never an error: they are silently excluded during indexing so
/// that a single adversarial entry cannot abort listing of an otherwise
/// valid archive.
#[derive(Error, Debug)]
pub enum ZipRoFsError {
    /// An error originating from the `zip` crate. Raised from
    /// [`ZipRoFs::new`] it means the container could not be opened.
    #[error("ZIP error: {0}")]
    Zip(#[from] ZipError),

    /// The archive size exceeds the configured maximum allowed size.
    #[error("Archive size {0} exceeds limit {1}")]
    ArchiveTooLarge(u64, u64),

    /// A caller-supplied path or pattern was invalid (empty, absolute,
    /// contains "..", etc.).
    #[error("Invalid path or pattern: {0}")]
    InvalidPattern(String),

    /// A queried name has no corresponding entry in the directory view.
    #[error("Path does not exist: {0}")]
    PathNotExist(String),

    /// A mutation was attempted on the read-only view.
    #[error("Unsupported operation `{0}`: the archive view is read-only")]
    Unsupported(&'static str),

    /// An I/O error while reading the archive.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// ZipRoFs – read-only directory tree over a ZIP archive
// ---------------------------------------------------------------------------

/// Read-only, traversal-safe directory view over a ZIP archive.
///
/// An archive is a flat sequence of named entries with no inherent
/// hierarchy. Opening a `ZipRoFs` reconstructs the logical tree in a single
/// pass: every entry name is sanitized (separator unification, rejection of
/// absolute names and of empty or parent-directory segments) and registered
/// under each of its ancestor directories. Entries whose names attempt to
/// escape the logical root are excluded from every listing.
///
/// # Features
/// - Directory listings store **only immediate children**, in the order
///   entries first appear in the archive.
/// - Optional [`FilterSet`] restricting which files the view exposes.
/// - Optional archive size limit (protection against OOM).
///
/// # Resource model
/// The handle owns the underlying reader; [`DirNode`] values borrow the
/// handle and own nothing. Dropping the handle releases the reader exactly
/// once, and the borrow checker prevents any node from outliving it. The
/// handle is not `Sync`: share it across threads only behind external
/// synchronization.
///
/// # Example
/// ```
/// # use zipdir::{ZipRoFs, ZipRoFsError};
/// # fn main() -> Result<(), ZipRoFsError> {
/// let data = std::fs::File::open("bundle.zip")?;
/// let fs = ZipRoFs::new(data, None, Some(100_000_000))?;
///
/// let root = fs.root();
/// for name in root.list_subdirectories() {
///     println!("{name}/");
/// }
/// for name in root.list_files() {
///     println!("{name}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct ZipRoFs<R> {
    /// The opened container; interior mutability covers its seek state.
    pub(crate) archive: RefCell<ZipArchive<R>>,
    /// Prefix → immediate children, built once at open time.
    pub(crate) index: DirIndex,
}

impl<R: Read + Seek> ZipRoFs<R> {
    /// Opens an archive and indexes its directory tree.
    ///
    /// # Arguments
    /// * `reader` – source of ZIP data (must implement `Read + Seek`).
    /// * `filter` – optional [`FilterSet`]; only matching files are exposed.
    /// * `max_archive_size` – optional maximum allowed archive size in
    ///   bytes. If the archive is larger, an `ArchiveTooLarge` error is
    ///   returned.
    ///
    /// # Errors
    /// * `ZipRoFsError::ArchiveTooLarge` – archive exceeds the size limit.
    /// * `ZipRoFsError::Zip` – malformed ZIP structure.
    /// * `ZipRoFsError::Io` – I/O error.
    pub fn new(
        reader: R,
        filter: Option<FilterSet>,
        max_archive_size: Option<u64>,
    ) -> Result<Self, ZipRoFsError> {
        let reader = Self::check_archive_size(reader, max_archive_size)?;

        let mut archive = ZipArchive::new(reader)?;
        let entries = Self::collect_entries(&mut archive);
        let index = index::build(&entries, filter.as_ref());
        debug!(
            entries = entries.len(),
            directories = index.dir_count(),
            "archive indexed"
        );

        Ok(Self { archive: RefCell::new(archive), index })
    }

    // -------------------------------------------------------------------------
    // Public API
    // -------------------------------------------------------------------------

    /// Returns the root directory node.
    pub fn root(&self) -> DirNode<'_, R> {
        DirNode::new(self, self.index.root())
    }

    /// Looks up a directory node by path.
    ///
    /// Accepts the usual spellings: `"assets/icons"`, `"assets/icons/"`,
    /// a leading separator, or the alternate separator convention. The empty
    /// string (or `"/"`) names the root.
    ///
    /// # Errors
    /// Returns `ZipRoFsError::PathNotExist` if the path is unsafe, malformed,
    /// or names no known directory.
    pub fn dir(&self, path: &str) -> Result<DirNode<'_, R>, ZipRoFsError> {
        let Some(normalized) = normalize_dir(path) else {
            return Err(ZipRoFsError::PathNotExist(path.to_string()));
        };
        if normalized.is_empty() { return Ok(self.root()); }

        let key = format!("{normalized}/");
        match self.index.listing(&key) {
            Some(listing) => Ok(DirNode::new(self, listing)),
            None => Err(ZipRoFsError::PathNotExist(key)),
        }
    }

    /// Opens a file by full path and returns its decompressed content as a
    /// readable stream.
    ///
    /// Convenience over [`dir`](Self::dir) +
    /// [`DirNode::open_file`]: the parent directory is resolved first, then
    /// the final segment as its child.
    ///
    /// # Errors
    /// Returns `ZipRoFsError::PathNotExist` if any component of the path
    /// does not resolve inside the view.
    pub fn open_file(&self, path: &str) -> Result<Cursor<Vec<u8>>, ZipRoFsError> {
        let Some(normalized) = normalize_name(path) else {
            return Err(ZipRoFsError::PathNotExist(path.to_string()));
        };
        match normalized.rfind('/') {
            Some(pos) => self.dir(&normalized[..pos])?.open_file(&normalized[pos + 1..]),
            None => self.root().open_file(&normalized),
        }
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    /// Collects raw metadata for every entry, in enumeration order.
    ///
    /// Corrupted entries are silently skipped; the index treats the archive
    /// as the sequence of entries that could actually be enumerated.
    fn collect_entries(archive: &mut ZipArchive<R>) -> Vec<EntryMeta> {
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let entry = match archive.by_index(i) {
                Ok(e) => e,
                Err(_) => {
                    debug!(index = i, "skipping unreadable entry");
                    continue;
                }
            };
            entries.push(EntryMeta {
                name: entry.name().to_owned(),
                is_dir: entry.is_dir(),
                index: i,
            });
        }
        entries
    }

    /// Checks whether the archive size exceeds the optional limit.
    ///
    /// If a limit is provided, the reader is seeked to the end to obtain the
    /// total size. After the check, the reader is rewound to the beginning
    /// so that it can be used to open the archive.
    ///
    /// # Errors
    /// Returns `ZipRoFsError::ArchiveTooLarge` if the size exceeds the
    /// limit, or `ZipRoFsError::Io` if seeking fails.
    fn check_archive_size(
        mut reader: R,
        max_archive_size: Option<u64>,
    ) -> Result<R, ZipRoFsError> {
        if let Some(limit) = max_archive_size {
            let size = reader.seek(SeekFrom::End(0))?;
            if size > limit { return Err(ZipRoFsError::ArchiveTooLarge(size, limit)); }
        }

        reader.seek(SeekFrom::Start(0))?;
        Ok(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn sample_zip_bytes() -> Cursor<Vec<u8>> {
        let mut zw = ZipWriter::new(Cursor::new(Vec::new()));
        let stored =
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zw.start_file("readme.txt", stored).unwrap();
        zw.write_all(b"hello").unwrap();
        zw.add_directory("assets", stored).unwrap();
        zw.start_file("assets/logo.png", deflated).unwrap();
        zw.write_all(&[0u8; 64]).unwrap();
        zw.start_file("assets/icons/home.svg", deflated).unwrap();
        zw.write_all(b"<svg/>").unwrap();

        zw.finish().unwrap()
    }

    fn sample_fs() -> ZipRoFs<Cursor<Vec<u8>>> {
        ZipRoFs::new(sample_zip_bytes(), None, None).unwrap()
    }

    #[test]
    fn root_listing() {
        let fs = sample_fs();
        let root = fs.root();
        assert_eq!(root.prefix(), "");
        assert_eq!(root.list_files(), vec!["readme.txt"]);
        assert_eq!(root.list_subdirectories(), vec!["assets"]);
    }

    #[test]
    fn nested_navigation() {
        let fs = sample_fs();
        let assets = fs.root().subdirectory("assets").unwrap();
        assert_eq!(assets.prefix(), "assets/");
        assert_eq!(assets.list_files(), vec!["logo.png"]);
        assert_eq!(assets.list_subdirectories(), vec!["icons"]);

        let icons = assets.subdirectory("icons").unwrap();
        assert_eq!(icons.list_files(), vec!["home.svg"]);
        assert_eq!(icons.list_subdirectories(), Vec::<&str>::new());
    }

    #[test]
    fn open_file_returns_decompressed_content() {
        let fs = sample_fs();
        let mut content = String::new();
        fs.root()
            .open_file("readme.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hello");
    }

    #[test]
    fn open_file_by_full_path() {
        let fs = sample_fs();
        let mut content = Vec::new();
        fs.open_file("assets/icons/home.svg")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"<svg/>");

        // Alternate separator convention resolves identically.
        let mut same = Vec::new();
        fs.open_file("assets\\icons\\home.svg")
            .unwrap()
            .read_to_end(&mut same)
            .unwrap();
        assert_eq!(same, content);
    }

    #[test]
    fn metadata_queries() {
        let fs = sample_fs();
        let root = fs.root();
        assert_eq!(root.size("readme.txt").unwrap(), 5);
        assert_eq!(
            root.compression_method("readme.txt").unwrap(),
            CompressionMethod::Stored
        );
        assert_eq!(root.compressed_size("readme.txt").unwrap(), 5);

        let assets = root.subdirectory("assets").unwrap();
        assert_eq!(assets.size("logo.png").unwrap(), 64);
        assert_eq!(
            assets.compression_method("logo.png").unwrap(),
            CompressionMethod::Deflated
        );
        assert!(assets.compressed_size("logo.png").unwrap() < 64);
    }

    #[test]
    fn missing_names_fail_with_path_not_exist() {
        let fs = sample_fs();
        let root = fs.root();
        assert!(matches!(
            root.size("nope.txt"),
            Err(ZipRoFsError::PathNotExist(_))
        ));
        assert!(matches!(
            root.open_file("nope.txt"),
            Err(ZipRoFsError::PathNotExist(_))
        ));
        assert!(matches!(
            root.subdirectory("nope"),
            Err(ZipRoFsError::PathNotExist(_))
        ));
        // A subdirectory name is not a file.
        assert!(matches!(
            root.open_file("assets"),
            Err(ZipRoFsError::PathNotExist(_))
        ));
        assert!(matches!(fs.dir("nope"), Err(ZipRoFsError::PathNotExist(_))));
        assert!(matches!(
            fs.open_file("../readme.txt"),
            Err(ZipRoFsError::PathNotExist(_))
        ));
    }

    #[test]
    fn mutation_is_unsupported_everywhere() {
        let fs = sample_fs();
        let assets = fs.dir("assets").unwrap();
        assert!(matches!(
            assets.create_subdirectory("new"),
            Err(ZipRoFsError::Unsupported("create_subdirectory"))
        ));
        assert!(matches!(
            assets.create_file("new.txt"),
            Err(ZipRoFsError::Unsupported("create_file"))
        ));
        assert!(matches!(
            assets.remove_file("logo.png"),
            Err(ZipRoFsError::Unsupported("remove_file"))
        ));
        assert!(matches!(
            assets.open_file_for_writing("logo.png"),
            Err(ZipRoFsError::Unsupported("open_file_for_writing"))
        ));
        // Nothing was mutated.
        assert_eq!(assets.list_files(), vec!["logo.png"]);
    }

    #[test]
    fn dir_lookup_accepts_usual_spellings() {
        let fs = sample_fs();
        for spelling in ["assets/icons", "assets/icons/", "/assets/icons", "assets\\icons"] {
            assert_eq!(fs.dir(spelling).unwrap().prefix(), "assets/icons/");
        }
        assert_eq!(fs.dir("").unwrap().prefix(), "");
        assert_eq!(fs.dir("/").unwrap().prefix(), "");
    }

    #[test]
    fn repeated_listings_are_identical() {
        let fs = sample_fs();
        let first: Vec<String> = fs
            .root()
            .list_files()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let second: Vec<String> = fs
            .root()
            .list_files()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn size_limit_is_enforced() {
        let result = ZipRoFs::new(sample_zip_bytes(), None, Some(10));
        assert!(matches!(result, Err(ZipRoFsError::ArchiveTooLarge(_, 10))));
    }

    #[test]
    fn filtered_view_hides_non_matching_files() {
        let filter = FilterSet::new().add_glob("assets/*.png").unwrap();
        let fs = ZipRoFs::new(sample_zip_bytes(), Some(filter), None).unwrap();

        let root = fs.root();
        assert_eq!(root.list_files(), Vec::<&str>::new());
        assert_eq!(root.list_subdirectories(), vec!["assets"]);

        let assets = root.subdirectory("assets").unwrap();
        assert_eq!(assets.list_files(), vec!["logo.png"]);
        // icons/ existed only through a filtered-out file.
        assert_eq!(assets.list_subdirectories(), Vec::<&str>::new());
    }

    #[test]
    fn empty_archive_has_empty_root() {
        let bytes = ZipWriter::new(Cursor::new(Vec::new())).finish().unwrap();
        let fs = ZipRoFs::new(bytes, None, None).unwrap();
        assert_eq!(fs.root().list_files(), Vec::<&str>::new());
        assert_eq!(fs.root().list_subdirectories(), Vec::<&str>::new());
    }

    #[test]
    fn garbage_input_fails_to_open() {
        let result = ZipRoFs::new(Cursor::new(b"not a zip archive".to_vec()), None, None);
        assert!(matches!(result, Err(ZipRoFsError::Zip(_))));
    }
}
