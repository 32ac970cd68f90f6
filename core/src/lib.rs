//! Root of the `triage-core` library.
//!
//! Classifies incoming emails as actionable ("Mina") or not ("Improdutivo")
//! and suggests a short reply, using a local model runner when available
//! and a keyword classifier otherwise.

// Library code reports through tracing; the CLI owns stdout.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod classification;
pub mod config;
pub mod error;
pub mod invoker;
pub mod keyword;
pub mod parser;
pub mod processor;
pub mod prompt;

pub use classification::Classification;
pub use config::ModelConfig;
pub use config::ServerConfig;
pub use config::TriageConfig;
pub use error::Result;
pub use error::TriageError;
pub use invoker::InvocationMethod;
pub use invoker::InvocationResult;
pub use invoker::ModelInvoker;
pub use keyword::classify_by_keyword;
pub use parser::ParseResult;
pub use parser::parse;
pub use processor::DebugInfo;
pub use processor::MessageProcessor;
pub use processor::ProcessingOutcome;
