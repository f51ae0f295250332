//! Handles to byte sources of single class files
//!
//! A [`Location`] is identified by its URI. Three schemes are produced:
//!
//! - `file:///abs/classes/com/example/Foo.class` for loose class files
//! - `jar:file:///abs/lib.jar!/com/example/Foo.class` for archive entries
//! - `jrt:/java.base/java/lang/Object.class` for runtime-module entries
//!
//! Equality, hashing and ordering consider the URI only.

use crate::core::archive::ArchiveReader;
use crate::error::{ImportError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

pub const CLASS_FILE_EXTENSION: &str = ".class";

/// Origin kind of a location, one per URI scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    File,
    Jar,
    RuntimeModule,
}

impl LocationKind {
    pub fn scheme(&self) -> &'static str {
        match self {
            LocationKind::File => "file",
            LocationKind::Jar => "jar",
            LocationKind::RuntimeModule => "jrt",
        }
    }
}

/// Where the bytes physically live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Storage {
    /// A class file on disk
    Loose(PathBuf),
    /// A named entry inside a zip-format archive (jar, zip, jmod)
    ArchiveEntry { archive: PathBuf, name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    uri: String,
    kind: LocationKind,
    container: PathBuf,
    entry: String,
    module: Option<String>,
    storage: Storage,
}

impl Location {
    /// Loose class file `path` found below the directory `root`
    pub fn file(root: &Path, path: &Path) -> Self {
        let entry = path
            .strip_prefix(root)
            .map(to_entry_path)
            .unwrap_or_else(|_| file_name_of(path));
        Self {
            uri: file_uri(path),
            kind: LocationKind::File,
            container: root.to_path_buf(),
            entry,
            module: None,
            storage: Storage::Loose(path.to_path_buf()),
        }
    }

    /// Entry `name` of the jar or zip archive at `archive`
    pub fn jar_entry(archive: &Path, name: &str) -> Self {
        Self {
            uri: format!("jar:{}!/{}", file_uri(archive), name),
            kind: LocationKind::Jar,
            container: archive.to_path_buf(),
            entry: name.to_string(),
            module: None,
            storage: Storage::ArchiveEntry {
                archive: archive.to_path_buf(),
                name: name.to_string(),
            },
        }
    }

    /// Class `entry` of runtime module `module`, read from `storage`
    pub fn runtime_module(
        store_root: &Path,
        module: &str,
        entry: &str,
        storage: Storage,
    ) -> Self {
        Self {
            uri: format!("jrt:/{}/{}", module, entry),
            kind: LocationKind::RuntimeModule,
            container: store_root.to_path_buf(),
            entry: entry.to_string(),
            module: Some(module.to_string()),
            storage,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn scheme(&self) -> &'static str {
        self.kind.scheme()
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    /// Directory, archive file or module-store root this location belongs to
    pub fn container(&self) -> &Path {
        &self.container
    }

    /// `/`-separated class entry path relative to the container, e.g. `com/example/Foo.class`
    pub fn entry(&self) -> &str {
        &self.entry
    }

    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Dotted class name implied by the entry path; the authoritative name is
    /// the one decoded from the class file itself
    pub fn class_name_hint(&self) -> Option<String> {
        self.entry
            .strip_suffix(CLASS_FILE_EXTENSION)
            .map(|stem| stem.replace('/', "."))
    }

    pub fn contains(&self, part: &str) -> bool {
        self.uri.contains(part)
    }

    pub fn matches(&self, pattern: &glob::Pattern) -> bool {
        pattern.matches(&self.uri)
    }

    /// Jar entries and runtime-module entries are both archive-origin
    pub fn is_archive(&self) -> bool {
        matches!(self.kind, LocationKind::Jar | LocationKind::RuntimeModule)
    }

    pub fn is_jar(&self) -> bool {
        self.kind == LocationKind::Jar
    }

    pub fn is_runtime_module(&self) -> bool {
        self.kind == LocationKind::RuntimeModule
    }

    pub fn is_class_file(&self) -> bool {
        self.entry.ends_with(CLASS_FILE_EXTENSION)
    }

    /// Whether this location lives at or below `root` on disk
    pub fn is_under(&self, root: &Path) -> bool {
        let physical = match &self.storage {
            Storage::Loose(path) => path,
            Storage::ArchiveEntry { archive, .. } => archive,
        };
        physical.starts_with(root) || self.container.starts_with(root)
    }

    /// Read the whole class file; archive handles are opened and released
    /// within this call
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match &self.storage {
            Storage::Loose(path) => fs::read(path).with_location_context(&self.uri),
            Storage::ArchiveEntry { archive, name } => {
                let mut reader = ArchiveReader::open(archive)
                    .map_err(|err| ImportError::unreadable(&self.uri, err))?;
                reader
                    .read(name)
                    .map_err(|err| ImportError::unreadable(&self.uri, err))
            }
        }
    }

    /// Byte stream accessor
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        match &self.storage {
            Storage::Loose(path) => {
                let file = File::open(path).with_location_context(&self.uri)?;
                Ok(Box::new(file))
            }
            Storage::ArchiveEntry { .. } => Ok(Box::new(Cursor::new(self.read_bytes()?))),
        }
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uri.cmp(&other.uri)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri)
    }
}

/// `path` made absolute against the working directory, without touching the
/// file system. Relative roots would otherwise render as `file:///relative/..`
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// `file:` URI of a path, always with forward slashes. Expects an absolute
/// path; see [`absolute_path`]
pub fn file_uri(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    if text.starts_with('/') {
        format!("file://{}", text)
    } else {
        format!("file:///{}", text)
    }
}

fn to_entry_path(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
