//! Scoped access to zip-format archives (jar, zip, jmod)
//!
//! An [`ArchiveReader`] owns the open file handle; dropping it releases the
//! handle, so every exit path (including read failures) closes the archive.

use crate::error::{ImportError, Result};
use crate::models::location::CLASS_FILE_EXTENSION;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const MODULE_INFO: &str = "module-info.class";

pub struct ArchiveReader {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
}

impl ArchiveReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(ImportError::io_error)?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|source| ImportError::Zip {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all class entries below `prefix`, sorted, skipping `META-INF/`
    /// content and module descriptors
    pub fn class_entries(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .archive
            .file_names()
            .filter(|name| name.starts_with(prefix))
            .filter(|name| is_importable_entry(&name[prefix.len()..]))
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self.archive.by_name(name).map_err(|source| ImportError::Zip {
            path: self.path.clone(),
            source,
        })?;
        let mut buffer = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut buffer)
            .map_err(ImportError::io_error)?;
        Ok(buffer)
    }
}

/// Whether a relative entry name denotes a class file worth importing
pub fn is_importable_entry(name: &str) -> bool {
    if name.is_empty() || name.ends_with('/') {
        return false;
    }
    if name.starts_with("META-INF/") {
        return false;
    }
    if name == MODULE_INFO || name.ends_with("/module-info.class") {
        return false;
    }
    name.ends_with(CLASS_FILE_EXTENSION)
}

/// Whether a path looks like a zip-format archive by its extension
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| matches_ignore_case(ext, &["jar", "zip"]))
        .unwrap_or(false)
}

pub fn is_jmod(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case("jmod"))
        .unwrap_or(false)
}

fn matches_ignore_case(candidate: &str, values: &[&str]) -> bool {
    values
        .iter()
        .any(|value| candidate.eq_ignore_ascii_case(value))
}
