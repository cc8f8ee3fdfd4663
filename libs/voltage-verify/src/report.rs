//! Run reporting
//!
//! Per-request [`ResultRecord`]s are appended to a [`ReportAggregator`] in
//! processing order and frozen into a [`RunSummary`] at the end of the run.
//! Order is never re-sorted so reports from repeated runs diff cleanly.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::bytes::{ByteEndian, WordOrder};
use crate::decoder::DecodedValue;
use crate::error::Result;
use crate::plan::RegisterRequest;

/// Exit code for a run without failures
pub const EXIT_OK: u8 = 0;
/// Exit code for a run with at least one failed request
pub const EXIT_FAILURES: u8 = 1;
/// Exit code when the target could not be reached at startup
pub const EXIT_CONNECT_FAILED: u8 = 2;

/// Per-request verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Exact read, decoded
    Ok,
    /// Short read, decoded best-effort
    Warn,
    /// No words acquired
    Fail,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Honour width/alignment so console columns line up
        f.pad(self.as_str())
    }
}

/// Outcome of one processed request, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub group: String,
    pub name: String,
    pub slave: u32,
    pub fc: u16,
    pub address: u32,
    #[serde(rename = "qty")]
    pub quantity: u16,
    #[serde(rename = "type")]
    pub declared_type: String,
    pub value: Option<DecodedValue>,
    #[serde(rename = "value_pretty")]
    pub display: String,
    pub description: String,
    pub expected: String,
    pub status: Status,
    /// Empty when the read was clean
    pub error: String,
}

impl ResultRecord {
    fn from_request(
        request: &RegisterRequest,
        value: Option<DecodedValue>,
        display: String,
        status: Status,
        error: String,
    ) -> Self {
        Self {
            group: request.group.clone(),
            name: request.name.clone(),
            slave: request.slave,
            fc: request.fc,
            address: request.address,
            quantity: request.quantity,
            declared_type: request.declared_type.clone(),
            value,
            display,
            description: request.description.clone(),
            expected: request.expected.clone(),
            status,
            error,
        }
    }

    pub fn ok(request: &RegisterRequest, display: String, value: DecodedValue) -> Self {
        Self::from_request(request, Some(value), display, Status::Ok, String::new())
    }

    pub fn warn(
        request: &RegisterRequest,
        display: String,
        value: DecodedValue,
        error: impl Into<String>,
    ) -> Self {
        Self::from_request(request, Some(value), display, Status::Warn, error.into())
    }

    pub fn fail(request: &RegisterRequest, error: impl Into<String>) -> Self {
        Self::from_request(request, None, String::new(), Status::Fail, error.into())
    }
}

/// Running OK/WARN/FAIL counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub ok: usize,
    pub warn: usize,
    pub fail: usize,
}

impl SummaryCounts {
    pub fn total(&self) -> usize {
        self.ok + self.warn + self.fail
    }

    fn bump(&mut self, status: Status) {
        match status {
            Status::Ok => self.ok += 1,
            Status::Warn => self.warn += 1,
            Status::Fail => self.fail += 1,
        }
    }
}

/// Identity of the verified device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Append-only collector of per-request results
///
/// Owned by the single control task; a parallel poller would need to
/// serialize calls to [`ReportAggregator::record`].
#[derive(Debug, Default)]
pub struct ReportAggregator {
    counts: SummaryCounts,
    results: Vec<ResultRecord>,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: ResultRecord) {
        self.counts.bump(record.status);
        self.results.push(record);
    }

    pub fn counts(&self) -> SummaryCounts {
        self.counts
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    /// Freeze into the final summary
    pub fn finish(self, target: Target, endian: ByteEndian, word_order: WordOrder) -> RunSummary {
        RunSummary {
            target,
            endian,
            word_order,
            summary: self.counts,
            results: self.results,
        }
    }
}

/// Final, immutable result of a run; the only persisted artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub target: Target,
    pub endian: ByteEndian,
    #[serde(rename = "wordorder")]
    pub word_order: WordOrder,
    pub summary: SummaryCounts,
    pub results: Vec<ResultRecord>,
}

impl RunSummary {
    /// A run succeeds only when no request failed
    pub fn is_success(&self) -> bool {
        self.summary.fail == 0
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_success() {
            EXIT_OK
        } else {
            EXIT_FAILURES
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the pretty-printed JSON report to `path`
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
