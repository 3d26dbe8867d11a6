use std::path::PathBuf;

use crate::analyze::{AnalysisRequest, AnalyzerConfig, ArtifactInput};
use crate::cli::{Cli, Commands};
use crate::error::Result;
use crate::scan::{expand_class_inputs, scan_layout_files};

pub fn resolve_analyzer_config(cli: &Cli) -> AnalyzerConfig {
    match cli.threads {
        Some(threads) if threads > 0 => AnalyzerConfig { threads },
        _ => AnalyzerConfig::default(),
    }
}

/// Turns the command line into a fully located request: class directories
/// are expanded and resource directories are searched for layouts.
pub fn resolve_request(cli: &Cli) -> Result<AnalysisRequest> {
    let artifact = match &cli.command {
        Commands::Jar { jar_path, .. } => ArtifactInput::Jar(jar_path.clone()),
        Commands::Classes { paths, .. } => ArtifactInput::ClassFiles(expand_class_inputs(paths)?),
    };

    let args = cli.command.report_args();
    Ok(AnalysisRequest {
        artifact,
        layouts: resolve_layouts(&args.layouts, &args.res_dirs)?,
        output: args.output.clone(),
    })
}

fn resolve_layouts(explicit: &[PathBuf], res_dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut layouts = explicit.to_vec();
    for res in res_dirs {
        layouts.extend(scan_layout_files(res)?);
    }
    layouts.sort();
    layouts.dedup();
    Ok(layouts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn zero_threads_means_default() {
        let cli = Cli::parse_from(["class-refs", "--threads", "0", "jar", "a.jar", "-o", "r"]);
        assert_eq!(resolve_analyzer_config(&cli), AnalyzerConfig::default());

        let cli = Cli::parse_from(["class-refs", "--threads", "3", "jar", "a.jar", "-o", "r"]);
        assert_eq!(resolve_analyzer_config(&cli).threads, 3);
    }

    #[test]
    fn jar_request_keeps_explicit_layouts() {
        let cli = Cli::parse_from([
            "class-refs",
            "jar",
            "lib.jar",
            "-o",
            "report.txt",
            "--layout",
            "b.xml",
            "--layout",
            "a.xml",
            "--layout",
            "b.xml",
        ]);
        let request = resolve_request(&cli).unwrap();
        assert_eq!(request.artifact, ArtifactInput::Jar(PathBuf::from("lib.jar")));
        assert_eq!(
            request.layouts,
            vec![PathBuf::from("a.xml"), PathBuf::from("b.xml")]
        );
        assert_eq!(request.output, PathBuf::from("report.txt"));
    }
}
