//! Voltage Register Verification Library
//!
//! Plan-driven register acquisition and decoding for device bring-up.
//!
//! # Architecture
//!
//! A run flows leaf-first through four stages:
//! - **Plan**: ordered [`RegisterRequest`]s loaded from a CSV table
//! - **Acquisition**: [`AcquisitionPolicy`] wraps one [`RegisterTransport`] with
//!   bounded retry and uniform error classification
//! - **Decoding**: [`decoder`] turns raw 16-bit words into typed values under
//!   configurable byte endianness and word order
//! - **Reporting**: [`PollOrchestrator`] classifies each read as OK/WARN/FAIL and
//!   [`ReportAggregator`] collects the ordered results into a [`RunSummary`]
//!
//! The run is strictly sequential over a single transport session. Per-request
//! failures are captured as data; only connection establishment is run-fatal.
//!
//! # Features
//!
//! - `cli` - derive `clap::ValueEnum` for the ordering enums

pub mod bytes;
pub mod config;
pub mod decoder;
pub mod error;
pub mod orchestrator;
pub mod plan;
pub mod policy;
pub mod report;
pub mod transport;

// Re-export core types
pub use bytes::{ByteEndian, WordOrder};
pub use config::{Overrides, VerifyConfig};
pub use decoder::{select_and_decode, DecodedValue, ValueType};
pub use error::{Result, VerifyError};
pub use orchestrator::{PollOrchestrator, PollSettings, RecordObserver, RequestFilter};
pub use plan::{load_plan, parse_plan, FunctionCode, RegisterRequest};
pub use policy::{Acquisition, AcquisitionPolicy};
pub use report::{ReportAggregator, ResultRecord, RunSummary, Status, SummaryCounts, Target};
pub use transport::{ModbusTcpTransport, RegisterTransport};
