use super::ZipRoFs;
use super::ZipRoFsError;
use super::index::DirListing;
use super::path_utils::is_safe_segment;
use std::io::{Cursor, Read, Seek};
use zip::CompressionMethod;

// ---------------------------------------------------------------------------
// DirNode – a borrowed view of one logical directory
// ---------------------------------------------------------------------------

/// One logical directory inside a read-only archive view.
///
/// A `DirNode` is a thin view into the index built by [`ZipRoFs`]: it owns
/// nothing and borrows the handle, so nodes are cheap to create and can never
/// outlive the archive they came from. Listings are computed once when the
/// archive is opened; every call observes the same ordered content.
///
/// The view is strictly read-only. The mutation operations exist to make the
/// contract explicit at the call site and always fail with
/// [`ZipRoFsError::Unsupported`] without touching any state.
pub struct DirNode<'a, R> {
    fs: &'a ZipRoFs<R>,
    listing: &'a DirListing,
}

impl<'a, R: Read + Seek> DirNode<'a, R> {
    pub(crate) fn new(fs: &'a ZipRoFs<R>, listing: &'a DirListing) -> Self {
        Self { fs, listing }
    }

    /// The directory's normalized prefix: `""` for the root, otherwise a
    /// relative path ending in `/` (e.g., `"assets/icons/"`).
    pub fn prefix(&self) -> &str {
        self.listing.prefix()
    }

    // -------------------------------------------------------------------------
    // Listing
    // -------------------------------------------------------------------------

    /// Returns the names of the immediate child files, in the order their
    /// entries first appear in the archive.
    pub fn list_files(&self) -> Vec<&str> {
        self.listing.file_names()
    }

    /// Returns the names of the immediate child subdirectories, in
    /// first-encounter order.
    ///
    /// Names, not nodes: listing stays cheap. Use
    /// [`subdirectory`](Self::subdirectory) to descend.
    pub fn list_subdirectories(&self) -> Vec<&str> {
        self.listing.subdir_names()
    }

    /// Descends into an immediate child subdirectory.
    ///
    /// # Arguments
    /// * `name` – A single child name produced by
    ///   [`list_subdirectories`](Self::list_subdirectories).
    ///
    /// # Errors
    /// Returns `ZipRoFsError::PathNotExist` if `name` is not a registered
    /// subdirectory of this node.
    pub fn subdirectory(&self, name: &str) -> Result<DirNode<'a, R>, ZipRoFsError> {
        if !is_safe_segment(name) || !self.listing.has_subdir(name) {
            return Err(self.missing(name));
        }
        let key = format!("{}{name}/", self.listing.prefix());
        match self.fs.index.listing(&key) {
            Some(listing) => Ok(DirNode::new(self.fs, listing)),
            None => Err(ZipRoFsError::PathNotExist(key)),
        }
    }

    // -------------------------------------------------------------------------
    // File access
    // -------------------------------------------------------------------------

    /// Opens an immediate child file and returns its decompressed content as
    /// a readable stream.
    ///
    /// The entry is read fully into memory; memory for it is reserved up
    /// front so an absurd declared size fails cleanly instead of aborting.
    ///
    /// # Arguments
    /// * `name` – A single child name produced by
    ///   [`list_files`](Self::list_files).
    ///
    /// # Errors
    /// * `ZipRoFsError::PathNotExist` – `name` is not a file in this
    ///   directory.
    /// * `ZipRoFsError::Zip` / `ZipRoFsError::Io` – the backing entry could
    ///   not be read.
    pub fn open_file(&self, name: &str) -> Result<Cursor<Vec<u8>>, ZipRoFsError> {
        let index = self.entry_index(name)?;
        let mut archive = self.fs.archive.borrow_mut();
        let mut entry = archive.by_index(index)?;

        let size = usize::try_from(entry.size())
            .map_err(|_| std::io::Error::from(std::io::ErrorKind::OutOfMemory))?;
        let mut content = Vec::new();
        if content.try_reserve_exact(size).is_err() {
            return Err(std::io::Error::from(std::io::ErrorKind::OutOfMemory).into());
        }
        entry.read_to_end(&mut content)?;
        Ok(Cursor::new(content))
    }

    /// Returns the uncompressed size of an immediate child file, queried
    /// from the backing archive.
    ///
    /// # Errors
    /// Returns `ZipRoFsError::PathNotExist` if `name` is not a file in this
    /// directory.
    pub fn size(&self, name: &str) -> Result<u64, ZipRoFsError> {
        let index = self.entry_index(name)?;
        let mut archive = self.fs.archive.borrow_mut();
        let entry = archive.by_index(index)?;
        Ok(entry.size())
    }

    /// Returns the compressed size of an immediate child file.
    ///
    /// # Errors
    /// Returns `ZipRoFsError::PathNotExist` if `name` is not a file in this
    /// directory.
    pub fn compressed_size(&self, name: &str) -> Result<u64, ZipRoFsError> {
        let index = self.entry_index(name)?;
        let mut archive = self.fs.archive.borrow_mut();
        let entry = archive.by_index(index)?;
        Ok(entry.compressed_size())
    }

    /// Returns the compression method of an immediate child file.
    ///
    /// # Errors
    /// Returns `ZipRoFsError::PathNotExist` if `name` is not a file in this
    /// directory.
    pub fn compression_method(&self, name: &str) -> Result<CompressionMethod, ZipRoFsError> {
        let index = self.entry_index(name)?;
        let mut archive = self.fs.archive.borrow_mut();
        let entry = archive.by_index(index)?;
        Ok(entry.compression())
    }

    // -------------------------------------------------------------------------
    // Mutation – rejected by contract
    // -------------------------------------------------------------------------

    /// Always fails: the view is read-only.
    pub fn create_subdirectory(&self, _name: &str) -> Result<(), ZipRoFsError> {
        Err(ZipRoFsError::Unsupported("create_subdirectory"))
    }

    /// Always fails: the view is read-only.
    pub fn create_file(&self, _name: &str) -> Result<(), ZipRoFsError> {
        Err(ZipRoFsError::Unsupported("create_file"))
    }

    /// Always fails: the view is read-only.
    pub fn remove_file(&self, _name: &str) -> Result<(), ZipRoFsError> {
        Err(ZipRoFsError::Unsupported("remove_file"))
    }

    /// Always fails: the view is read-only.
    pub fn open_file_for_writing(&self, _name: &str) -> Result<(), ZipRoFsError> {
        Err(ZipRoFsError::Unsupported("open_file_for_writing"))
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn entry_index(&self, name: &str) -> Result<usize, ZipRoFsError> {
        if !is_safe_segment(name) {
            return Err(self.missing(name));
        }
        self.listing
            .file(name)
            .map(|f| f.entry_index)
            .ok_or_else(|| self.missing(name))
    }

    fn missing(&self, name: &str) -> ZipRoFsError {
        ZipRoFsError::PathNotExist(format!("{}{name}", self.listing.prefix()))
    }
}
