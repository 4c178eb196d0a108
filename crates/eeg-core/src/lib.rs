//! EEG-Core: Foundation types for single-channel EEG state monitoring
//!
//! Feature records, state labels, the report line codec and the interfaces
//! the processing core consumes (sample in, feature record out).

pub mod error;
pub mod record;
pub mod report;
pub mod interface;

pub use error::{EegError, EegResult, NumericFault, FaultStage};
pub use record::*;
pub use report::{ReportFormat, ReportHistory, format_report_line, parse_report_line};
pub use interface::{SampleSource, ReportSink};
