//! Aggregation and persistence of the analysis report.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::extract::ReferenceSet;

/// Unions per-unit and per-layout sets into one ordered set. `String`
/// ordering is byte-wise, which for UTF-8 is code point order.
pub fn merge<I>(sets: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = ReferenceSet>,
{
    sets.into_iter().flatten().collect()
}

/// One name per line, no trailing newline.
pub fn render(names: &BTreeSet<String>) -> String {
    names.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
}

/// Replaces `path` with the rendered report. The text is written to a
/// sibling temporary file first and renamed over the target, so readers
/// never observe a partial report.
pub fn write_report(path: &Path, names: &BTreeSet<String>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            AnalysisError::io(format!("create report directory {}", parent.display()), e)
        })?;
    }

    let tmp = temp_sibling(path);
    std::fs::write(&tmp, render(names))
        .map_err(|e| AnalysisError::io(format!("write {}", tmp.display()), e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(AnalysisError::io(
            format!("replace report {}", path.display()),
            e,
        ));
    }

    debug!("Wrote {} references to {}", names.len(), path.display());
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut tmp_os = path.as_os_str().to_os_string();
    tmp_os.push(format!(".{}.tmp", std::process::id()));
    PathBuf::from(tmp_os)
}
