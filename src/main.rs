use anyhow::{Context, Result};
use clap::Parser;
use class_refs::analyze::Analyzer;
use class_refs::cli::Cli;
use class_refs::config::{resolve_analyzer_config, resolve_request};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let request = resolve_request(&cli).context("Failed to resolve analysis inputs")?;
    let analyzer = Analyzer::new(resolve_analyzer_config(&cli))?;
    let summary = analyzer.run(&request).with_context(|| {
        format!(
            "Class reference analysis failed; {} was not modified",
            request.output.display()
        )
    })?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
