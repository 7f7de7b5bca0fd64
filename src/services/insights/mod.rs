pub mod analyzer;
pub mod types;
pub mod utils;

pub use analyzer::DataProfiler;
pub use types::ProfileOutcome;
