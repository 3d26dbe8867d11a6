use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "class-refs")]
#[command(version, about = "Report every class referenced by a jar or a set of compiled classes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Worker threads; defaults to the available parallelism
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    #[arg(short, long)]
    pub verbose: bool,

    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Analyze the .class entries of a jar
    Jar {
        jar_path: PathBuf,

        #[command(flatten)]
        inputs: ReportArgs,
    },
    /// Analyze .class files; directories are searched recursively
    Classes {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        inputs: ReportArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: PathBuf,

    /// Layout resource file to scan for custom view classes
    #[arg(long = "layout", value_name = "FILE")]
    pub layouts: Vec<PathBuf>,

    /// Resource directory whose layout XML files are scanned
    #[arg(long = "res", value_name = "DIR")]
    pub res_dirs: Vec<PathBuf>,
}

impl Commands {
    pub fn report_args(&self) -> &ReportArgs {
        match self {
            Commands::Jar { inputs, .. } | Commands::Classes { inputs, .. } => inputs,
        }
    }
}
