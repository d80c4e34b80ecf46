pub mod linter;
pub mod parser;
pub mod runner;
pub mod types;

pub use runner::PipelineRunner;
pub use types::*;
