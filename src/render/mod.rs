//! Report rendering.

pub mod table;

pub use table::{Report, ReportFormat};
