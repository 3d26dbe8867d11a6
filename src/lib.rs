//! # class-refs
//!
//! Collects the fully-qualified names of every class a compiled artifact
//! references, as input for dependency-usage analysis.
//!
//! ## Architecture
//!
//! - **reader**: Bounds-checked big-endian cursor over class file bytes
//! - **pool**: Constant pool arena with index-based resolution
//! - **bytecode**: Instruction walker recording constant-pool operands
//! - **attribute**: Decoding of the attributes that can name a type
//! - **classfile**: Structured view of one compiled class
//! - **descriptor**: Descriptor and generic signature decoding
//! - **extract**: Reference visitor and the `java.` platform filter
//! - **layout**: Custom view classes named by layout resource tags
//! - **catalog**: Class entries of a jar
//! - **scan**: Class file and layout file discovery on disk
//! - **report**: Merge, sort and atomically write the report
//! - **analyze**: Parallel scatter/gather coordinator
//! - **config**: Command line to analysis request resolution

pub mod error;

pub mod analyze;
pub mod attribute;
pub mod bytecode;
pub mod catalog;
pub mod classfile;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod extract;
pub mod layout;
pub mod pool;
pub mod reader;
pub mod report;
pub mod scan;

pub use analyze::{AnalysisRequest, AnalysisSummary, Analyzer, AnalyzerConfig, ArtifactInput};
pub use error::{AnalysisError, FormatError, Result};
pub use extract::ReferenceSet;
