//! Key file sources.
//!
//! A [`KeySource`] is the filesystem-like collection a [`KeyStore`](crate::KeyStore)
//! is built from. Production code reads a directory with [`DirKeySource`];
//! tests and embedders hand files over directly with [`MemoryKeySource`].

use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
};

use fail::fail_point;
use zeroize::Zeroizing;

use crate::{
    error::{KeyStoreError, Result},
    kid::validate_kid,
};

/// Extension (compared ASCII case-insensitively) of files read as keys.
pub const KEY_FILE_EXTENSION: &str = "pem";

/// Largest key file accepted, in bytes (1 MiB).
pub const MAX_KEY_FILE_SIZE: u64 = 1024 * 1024;

/// A single key file: its name and raw PEM contents.
pub struct KeyFile {
    name: String,
    contents: Zeroizing<Vec<u8>>,
}

impl KeyFile {
    /// Creates a key file from a name and its contents.
    #[must_use]
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), contents: Zeroizing::new(contents.into()) }
    }

    /// The file name as reported by the source.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw file contents.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Derives the key identifier: the file name without its `.pem` extension.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::KeyLoad`] if the derived identifier is not a
    /// valid `kid`.
    pub fn kid(&self) -> Result<&str> {
        let kid = match self.name.rsplit_once('.') {
            Some((stem, ext)) if ext.eq_ignore_ascii_case(KEY_FILE_EXTENSION) => stem,
            _ => self.name.as_str(),
        };
        validate_kid(kid).map_err(|e| KeyStoreError::key_load(&self.name, e.to_string()))?;
        Ok(kid)
    }
}

impl std::fmt::Debug for KeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFile")
            .field("name", &self.name)
            .field("len", &self.contents.len())
            .finish_non_exhaustive()
    }
}

/// A collection of key files a [`KeyStore`](crate::KeyStore) can be loaded from.
pub trait KeySource {
    /// Human-readable description of the source, used in logs.
    fn describe(&self) -> String;

    /// Returns every key file in the source.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::KeyLoad`] if the source cannot be listed or a
    /// file cannot be read.
    fn key_files(&self) -> Result<Vec<KeyFile>>;
}

/// Reads key files from the top level of a directory.
///
/// Only regular files (or symlinks to them) whose extension is `pem` are
/// read; subdirectories and other files are skipped. The listing is not
/// recursive, so a `public/` subdirectory of distributable public halves can
/// live next to the signing keys without being loaded.
#[derive(Debug, Clone)]
pub struct DirKeySource {
    root: PathBuf,
}

impl DirKeySource {
    /// Creates a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this source reads.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl KeySource for DirKeySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn key_files(&self) -> Result<Vec<KeyFile>> {
        let root = self.describe();
        let entries = fs::read_dir(&self.root).map_err(|e| {
            KeyStoreError::key_load_with_source(&root, "failed to read key directory", e)
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                KeyStoreError::key_load_with_source(&root, "failed to list key directory", e)
            })?;
            let path = entry.path();
            if !has_key_extension(&path) {
                continue;
            }

            let name = entry.file_name().into_string().map_err(|raw| {
                KeyStoreError::key_load(raw.to_string_lossy(), "file name is not valid UTF-8")
            })?;

            // Follows symlinks, so mounted secret volumes resolve to their targets.
            let metadata = fs::metadata(&path)
                .map_err(|e| KeyStoreError::key_load_with_source(&name, "failed to stat file", e))?;
            if !metadata.is_file() {
                continue;
            }

            fail_point!("keystore-read-file", |_| {
                Err(KeyStoreError::key_load(&name, "injected read failure"))
            });

            let contents = read_limited(&path, &name)?;
            files.push(KeyFile { name, contents });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

fn has_key_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(KEY_FILE_EXTENSION))
}

fn read_limited(path: &Path, name: &str) -> Result<Zeroizing<Vec<u8>>> {
    let file = fs::File::open(path)
        .map_err(|e| KeyStoreError::key_load_with_source(name, "failed to open file", e))?;

    let mut contents = Zeroizing::new(Vec::new());
    file.take(MAX_KEY_FILE_SIZE + 1)
        .read_to_end(&mut contents)
        .map_err(|e| KeyStoreError::key_load_with_source(name, "failed to read file", e))?;

    if contents.len() as u64 > MAX_KEY_FILE_SIZE {
        return Err(KeyStoreError::key_load(
            name,
            format!("file exceeds maximum size of {MAX_KEY_FILE_SIZE} bytes"),
        ));
    }
    Ok(contents)
}

/// Key files held in memory.
///
/// Files are returned in insertion order and duplicates are kept, so the
/// store's duplicate-identifier check applies exactly as it does for a
/// directory.
#[derive(Debug, Default)]
pub struct MemoryKeySource {
    files: Vec<(String, Zeroizing<Vec<u8>>)>,
}

impl MemoryKeySource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and returns the source, for chaining.
    #[must_use]
    pub fn with_file(mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(name, contents);
        self
    }

    /// Adds a file.
    pub fn insert(&mut self, name: impl Into<String>, contents: impl Into<Vec<u8>>) {
        self.files.push((name.into(), Zeroizing::new(contents.into())));
    }
}

impl KeySource for MemoryKeySource {
    fn describe(&self) -> String {
        format!("memory ({} files)", self.files.len())
    }

    fn key_files(&self) -> Result<Vec<KeyFile>> {
        Ok(self
            .files
            .iter()
            .map(|(name, contents)| KeyFile { name: name.clone(), contents: contents.clone() })
            .collect())
    }
}
