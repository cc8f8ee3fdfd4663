//! Verification Error Types
//!
//! Error taxonomy for register verification runs.

use thiserror::Error;

/// Result type for voltage-verify operations
pub type Result<T> = std::result::Result<T, VerifyError>;

/// Register verification errors
#[derive(Debug, Error, Clone)]
pub enum VerifyError {
    /// Function code outside {3, 4}
    #[error("Unsupported function code fc={0}")]
    UnsupportedFunction(u16),

    /// Declared slave or address that does not fit the Modbus field
    #[error("{field} {value} out of range (max {max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },

    /// Transient transport failure (device busy, socket hiccup, exception response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Per-read timeout reported by the transport
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Transport answered with a different register count than requested
    #[error("Short read: expected {expected}, got {actual}")]
    ShortRead { expected: u16, actual: usize },

    /// Connection establishment failed
    #[error("Connection failed: {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    /// Plan table could not be loaded
    #[error("Plan error: {0}")]
    Plan(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(String),

    /// Report serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for VerifyError {
    fn from(err: std::io::Error) -> Self {
        VerifyError::Io(err.to_string())
    }
}

impl From<csv::Error> for VerifyError {
    fn from(err: csv::Error) -> Self {
        VerifyError::Plan(format!("CSV error: {}", err))
    }
}

impl From<serde_json::Error> for VerifyError {
    fn from(err: serde_json::Error) -> Self {
        VerifyError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<figment::Error> for VerifyError {
    fn from(err: figment::Error) -> Self {
        VerifyError::Config(err.to_string())
    }
}

impl From<voltage_modbus::ModbusError> for VerifyError {
    fn from(err: voltage_modbus::ModbusError) -> Self {
        let msg = err.to_string();
        match err {
            voltage_modbus::ModbusError::Timeout { .. } => VerifyError::Timeout(msg),
            _ => VerifyError::Transport(msg),
        }
    }
}

// Helper methods for creating errors
impl VerifyError {
    pub fn out_of_range(field: &'static str, value: u32, max: u32) -> Self {
        VerifyError::OutOfRange { field, value, max }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        VerifyError::Transport(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        VerifyError::Timeout(msg.into())
    }

    pub fn plan(msg: impl Into<String>) -> Self {
        VerifyError::Plan(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        VerifyError::Config(msg.into())
    }

    pub fn connection(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        VerifyError::Connection {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

}
