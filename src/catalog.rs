use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{AnalysisError, Result};

pub const CLASS_EXTENSION: &str = ".class";

/// Where a [`BytecodeUnit`] came from; used to label errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOrigin {
    JarEntry { jar: PathBuf, entry: String },
    File(PathBuf),
}

impl std::fmt::Display for UnitOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitOrigin::JarEntry { jar, entry } => write!(f, "{}!{}", jar.display(), entry),
            UnitOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The bytes of exactly one compiled class.
#[derive(Debug, Clone)]
pub struct BytecodeUnit {
    pub origin: UnitOrigin,
    pub bytes: Vec<u8>,
}

impl BytecodeUnit {
    pub fn read_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| AnalysisError::io(format!("class file {}", path.display()), e))?;
        Ok(Self {
            origin: UnitOrigin::File(path.to_path_buf()),
            bytes,
        })
    }
}

/// Reads every non-directory entry of `jar_path` whose name ends in `.class`,
/// in archive order. Other entries are ignored.
pub fn read_class_entries(jar_path: &Path) -> Result<Vec<BytecodeUnit>> {
    let io_err = |what: &str, e: std::io::Error| {
        AnalysisError::io(format!("{what} {}", jar_path.display()), e)
    };

    let file = File::open(jar_path).map_err(|e| io_err("open jar", e))?;
    // SAFETY: The file is opened read-only and outlives the mapping, which is
    // dropped at the end of this function.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| io_err("mmap jar", e))?;
    let mut archive = ZipArchive::new(Cursor::new(&mmap[..]))
        .map_err(|e| io_err("read zip structure of", std::io::Error::other(e)))?;

    let mut units = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| io_err(&format!("entry #{i} of"), std::io::Error::other(e)))?;
        if entry.is_dir() || !entry.name().ends_with(CLASS_EXTENSION) {
            continue;
        }

        let name = entry.name().to_string();
        // The declared size is untrusted; the mapping bounds the preallocation.
        let mut bytes = Vec::with_capacity((entry.size() as usize).min(mmap.len()));
        entry.read_to_end(&mut bytes).map_err(|e| {
            AnalysisError::io(format!("entry {name} of {}", jar_path.display()), e)
        })?;

        units.push(BytecodeUnit {
            origin: UnitOrigin::JarEntry {
                jar: jar_path.to_path_buf(),
                entry: name,
            },
            bytes,
        });
    }

    debug!(
        "Read {} class entries from {} ({} entries total)",
        units.len(),
        jar_path.display(),
        archive.len()
    );
    Ok(units)
}
