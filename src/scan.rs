use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::debug;

use crate::catalog::CLASS_EXTENSION;
use crate::error::{AnalysisError, Result};

/// Expands class inputs: directories are walked for `.class` files, plain
/// files are kept when they carry the `.class` extension. The result is
/// sorted and deduplicated.
pub fn expand_class_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let metadata = std::fs::metadata(input)
            .map_err(|e| AnalysisError::io(format!("class input {}", input.display()), e))?;
        if metadata.is_dir() {
            files.extend(walk_files(input, |path| is_class_file(path))?);
        } else if is_class_file(input) {
            files.push(input.clone());
        } else {
            debug!("Ignoring non-class input {}", input.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Finds layout resources under a resource root: `.xml` files whose path
/// below the root mentions `layout` (`layout/`, `layout-land/`, ...).
pub fn scan_layout_files(res_root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = walk_files(res_root, |path| {
        let relative = path.strip_prefix(res_root).unwrap_or(path);
        path.extension().is_some_and(|e| e == "xml")
            && relative.to_string_lossy().contains("layout")
    })?;
    files.sort();
    Ok(files)
}

fn is_class_file(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().ends_with(CLASS_EXTENSION))
}

fn walk_files<F>(base_path: &Path, keep: F) -> Result<Vec<PathBuf>>
where
    F: Fn(&Path) -> bool + Sync,
{
    if !base_path.is_dir() {
        return Err(AnalysisError::io(
            format!("directory {}", base_path.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    let keep = &keep;
    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_some_and(|t| t.is_file()) && keep(path) {
                        let _ = tx.send(Ok(path.to_path_buf()));
                    }
                }
                Err(err) => {
                    let _ = tx.send(Err(err));
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    rx.iter()
        .map(|r| {
            r.map_err(|e| {
                AnalysisError::io(
                    format!("walking {}", base_path.display()),
                    std::io::Error::other(e),
                )
            })
        })
        .collect()
}
