//! Report generation module.
//!
//! This module builds [`CleaningReport`]s and writes cleaned datasets and
//! reports to disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use autodata_cleaning::reporting::{CleaningReport, ReportWriter};
//!
//! let report = CleaningReport::build("data/sales.csv", None, &original_df, &outcome)?;
//!
//! // Print as JSON
//! println!("{}", report.to_json_pretty()?);
//!
//! // Or write to file
//! let writer = ReportWriter::new("output");
//! writer.write_report(&report, "sales")?;
//! ```

mod report;
mod writer;

pub use report::{CleaningReport, ProcessingSummary};
pub use writer::{ReportWriter, output_base_name};
