//! Error handling for the EEG monitor
//!
//! The pipeline has no I/O failure modes of its own; the only latent fault
//! class inside the core is numerical. Source and sink failures belong to
//! the collaborators and are carried through as messages.

use core::fmt;

/// Result type alias for EEG monitor operations
pub type EegResult<T> = Result<T, EegError>;

/// Stage of the per-sample path where a non-finite value was first seen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStage {
    /// Delay terms of one of the cascaded filter sections
    FilterState {
        /// Zero-based section index in cascade order
        section: usize,
    },
    /// Filtered sample leaving the cascade
    FilterOutput,
    /// Running sum of squares of the window buffer
    WindowEnergy,
}

/// Details of a latched numerical fault
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericFault {
    /// Window (1-based second counter) the fault belongs to
    pub window: u64,
    /// Tick within that window at which it was detected
    pub tick: usize,
    /// Where the value was found
    pub stage: FaultStage,
    /// The offending value
    pub value: f64,
}

/// Error type for all EEG monitor operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EegError {
    /// Invalid analysis configuration
    ConfigurationError {
        /// Description of the configuration error
        message: String,
    },

    /// A window was tainted by a non-finite value and is not classified
    NumericalFault {
        /// Where and when the fault was detected
        fault: NumericFault,
    },

    /// The pipeline stopped after a numerical fault and needs a reset
    PipelineHalted {
        /// Window in which the latched fault occurred
        window: u64,
    },

    /// A report line could not be parsed
    ReportParseError {
        /// Description of the parse failure
        reason: String,
    },

    /// The sample source failed
    SourceError {
        /// Source-specific error description
        message: String,
    },

    /// The report sink failed
    SinkError {
        /// Sink-specific error description
        message: String,
    },
}

impl fmt::Display for FaultStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultStage::FilterState { section } => write!(f, "filter section {} state", section + 1),
            FaultStage::FilterOutput => write!(f, "filter output"),
            FaultStage::WindowEnergy => write!(f, "window sum of squares"),
        }
    }
}

impl fmt::Display for EegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EegError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            EegError::NumericalFault { fault } => {
                write!(f, "Numerical fault in window {} at tick {}: {} became {}",
                       fault.window, fault.tick, fault.stage, fault.value)
            }
            EegError::PipelineHalted { window } => {
                write!(f, "Pipeline halted after numerical fault in window {}; reset required",
                       window)
            }
            EegError::ReportParseError { reason } => {
                write!(f, "Report parse error: {}", reason)
            }
            EegError::SourceError { message } => {
                write!(f, "Sample source error: {}", message)
            }
            EegError::SinkError { message } => {
                write!(f, "Report sink error: {}", message)
            }
        }
    }
}

impl std::error::Error for EegError {}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)+) => {
        $crate::error::EegError::ConfigurationError {
            message: format!($($arg)+),
        }
    };
}

/// Convenience macro for creating report parse errors
#[macro_export]
macro_rules! parse_error {
    ($($arg:tt)+) => {
        $crate::error::EegError::ReportParseError {
            reason: format!($($arg)+),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = EegError::NumericalFault {
            fault: NumericFault {
                window: 7,
                tick: 12,
                stage: FaultStage::FilterState { section: 2 },
                value: f64::INFINITY,
            },
        };
        let display = format!("{}", error);
        assert!(display.contains("window 7"));
        assert!(display.contains("tick 12"));
        assert!(display.contains("filter section 3"));
        assert!(display.contains("inf"));
    }

    #[test]
    fn test_config_error_macro() {
        let error = config_error!("sampling rate {} is not positive", -1.0);
        assert_eq!(
            error,
            EegError::ConfigurationError {
                message: "sampling rate -1 is not positive".to_string()
            }
        );
    }

    #[test]
    fn test_halted_display() {
        let display = EegError::PipelineHalted { window: 3 }.to_string();
        assert!(display.contains("window 3"));
        assert!(display.contains("reset"));
    }
}
