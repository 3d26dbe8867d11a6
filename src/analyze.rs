//! Execution coordinator.
//!
//! Work is scattered over a bounded rayon pool, one task per class unit and
//! per layout file. Each task returns its own [`ReferenceSet`]; the results
//! are gathered only after every task has finished, merged on the calling
//! thread and written once.

use rayon::ThreadPool;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::catalog::{BytecodeUnit, read_class_entries};
use crate::error::{AnalysisError, Result};
use crate::extract::{ReferenceSet, class_references, retain_non_platform};
use crate::layout::scan_layout_file;
use crate::report::{merge, write_report};

/// The compiled artifact to analyse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactInput {
    Jar(PathBuf),
    /// Individually addressable `.class` files, already located.
    ClassFiles(Vec<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub artifact: ArtifactInput,
    pub layouts: Vec<PathBuf>,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub threads: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub output: String,
    pub class_units: usize,
    pub layout_files: usize,
    pub references: usize,
    pub duration_ms: u64,
}

pub struct Analyzer {
    pool: ThreadPool,
    threads: usize,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let threads = config.threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("class-refs-worker-{i}"))
            .build()?;
        Ok(Self { pool, threads })
    }

    /// Runs one analysis and writes its report. On any failure the output
    /// file is left exactly as it was.
    pub fn run(&self, request: &AnalysisRequest) -> Result<AnalysisSummary> {
        let start = Instant::now();
        let (names, class_units) = self.collect(&request.artifact, &request.layouts)?;
        write_report(&request.output, &names)?;

        info!(
            "Wrote {} references from {} class units and {} layout files to {}",
            names.len(),
            class_units,
            request.layouts.len(),
            request.output.display()
        );

        Ok(AnalysisSummary {
            output: request.output.to_string_lossy().to_string(),
            class_units,
            layout_files: request.layouts.len(),
            references: names.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Extracts and merges every reference without writing anything.
    /// Returns the merged names and the number of class units analysed.
    pub fn collect(
        &self,
        artifact: &ArtifactInput,
        layouts: &[PathBuf],
    ) -> Result<(BTreeSet<String>, usize)> {
        let pending = match artifact {
            ArtifactInput::Jar(jar) => read_class_entries(jar)?
                .into_iter()
                .map(PendingUnit::Loaded)
                .collect::<Vec<_>>(),
            ArtifactInput::ClassFiles(files) => {
                files.iter().cloned().map(PendingUnit::File).collect()
            }
        };

        info!(
            "Analyzing {} class units and {} layout files on {} workers",
            pending.len(),
            layouts.len(),
            self.threads
        );

        // Every task runs to completion before either vector is returned.
        let (unit_results, layout_results): (Vec<Result<ReferenceSet>>, Vec<Result<ReferenceSet>>) =
            self.pool.install(|| {
                rayon::join(
                    || pending.par_iter().map(PendingUnit::extract).collect(),
                    || layouts.par_iter().map(|path| scan_layout(path)).collect(),
                )
            });

        let unit_sets = unit_results.into_iter().collect::<Result<Vec<_>>>()?;
        let layout_sets = layout_results.into_iter().collect::<Result<Vec<_>>>()?;

        let names = merge(unit_sets.into_iter().chain(layout_sets));
        debug!("Merged {} distinct references", names.len());
        Ok((names, pending.len()))
    }
}

enum PendingUnit {
    Loaded(BytecodeUnit),
    File(PathBuf),
}

impl PendingUnit {
    fn extract(&self) -> Result<ReferenceSet> {
        match self {
            PendingUnit::Loaded(unit) => extract_unit(unit),
            PendingUnit::File(path) => extract_unit(&BytecodeUnit::read_file(path)?),
        }
    }
}

fn extract_unit(unit: &BytecodeUnit) -> Result<ReferenceSet> {
    class_references(&unit.bytes).map_err(|source| AnalysisError::MalformedClass {
        unit: unit.origin.to_string(),
        source,
    })
}

fn scan_layout(path: &Path) -> Result<ReferenceSet> {
    let mut refs = scan_layout_file(path)?;
    retain_non_platform(&mut refs);
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_still_builds_a_pool() {
        let analyzer = Analyzer::new(AnalyzerConfig { threads: 0 }).unwrap();
        assert_eq!(analyzer.threads, 1);
    }

    #[test]
    fn empty_class_list_yields_empty_set() {
        let analyzer = Analyzer::new(AnalyzerConfig { threads: 2 }).unwrap();
        let (names, units) = analyzer
            .collect(&ArtifactInput::ClassFiles(Vec::new()), &[])
            .unwrap();
        assert!(names.is_empty());
        assert_eq!(units, 0);
    }

    #[test]
    fn missing_class_file_is_io_error() {
        let analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let err = analyzer
            .collect(
                &ArtifactInput::ClassFiles(vec![PathBuf::from("/nonexistent/A.class")]),
                &[],
            )
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }
}
