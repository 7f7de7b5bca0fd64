pub mod charts;
pub mod insights;
