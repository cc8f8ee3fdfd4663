//! Verification plan loading
//!
//! Reads the tabular plan (`group,name,slave,fc,address,qty,type,description,expected`)
//! into an ordered list of [`RegisterRequest`]s.
//!
//! Malformed numeric cells never fail the load; they fall back to documented
//! defaults (slave 1, fc 3, address 0, qty 1). Rows shorter than the header read
//! their missing cells as empty. Only an unreadable file or a broken CSV
//! structure is an error.
//!
//! A well-formed slave or address outside the Modbus range is kept as declared
//! and fails that one request at acquisition time.

use serde::{Deserialize, Serialize};
use csv::StringRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::decoder::ValueType;
use crate::error::{Result, VerifyError};

pub const DEFAULT_SLAVE: u32 = 1;
pub const DEFAULT_FUNCTION_CODE: u16 = 3;
pub const DEFAULT_ADDRESS: u32 = 0;
pub const DEFAULT_QUANTITY: u16 = 1;
pub const DEFAULT_TYPE: &str = "int";

/// Register read function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionCode {
    /// 0x03 Read Holding Registers
    ReadHolding = 3,
    /// 0x04 Read Input Registers
    ReadInput = 4,
}

impl FunctionCode {
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u16> for FunctionCode {
    type Error = VerifyError;

    fn try_from(code: u16) -> Result<Self> {
        match code {
            3 => Ok(Self::ReadHolding),
            4 => Ok(Self::ReadInput),
            other => Err(VerifyError::UnsupportedFunction(other)),
        }
    }
}

/// One row of the verification plan
///
/// Immutable once loaded. `fc` keeps the code exactly as declared so an
/// unsupported code can be reported per request instead of failing the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub group: String,
    pub name: String,
    /// Unit id as declared, see [`RegisterRequest::unit_id`]
    pub slave: u32,
    pub fc: u16,
    /// Start register as declared, see [`RegisterRequest::start_address`]
    pub address: u32,
    pub quantity: u16,
    /// Type string as written in the plan, kept for the report
    pub declared_type: String,
    /// Canonical type resolved at load time
    pub value_type: ValueType,
    pub description: String,
    pub expected: String,
}

impl RegisterRequest {
    /// Build a request, canonicalizing the declared type against `quantity`
    pub fn new(
        name: impl Into<String>,
        slave: u32,
        fc: u16,
        address: u32,
        quantity: u16,
        declared_type: impl Into<String>,
    ) -> Self {
        let declared_type = declared_type.into();
        Self {
            group: String::new(),
            name: name.into(),
            slave,
            fc,
            address,
            quantity,
            value_type: ValueType::canonicalize(&declared_type, quantity),
            declared_type,
            description: String::new(),
            expected: String::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = expected.into();
        self
    }

    /// Resolve the declared function code
    pub fn function_code(&self) -> Result<FunctionCode> {
        FunctionCode::try_from(self.fc)
    }

    /// Unit id for the wire, rejecting slaves above 255
    pub fn unit_id(&self) -> Result<u8> {
        u8::try_from(self.slave)
            .map_err(|_| VerifyError::out_of_range("slave", self.slave, u32::from(u8::MAX)))
    }

    /// Start register for the wire, rejecting addresses above 65535
    pub fn start_address(&self) -> Result<u16> {
        u16::try_from(self.address)
            .map_err(|_| VerifyError::out_of_range("address", self.address, u32::from(u16::MAX)))
    }

    /// Processing order key: (slave, address, name)
    fn sort_key(&self) -> (u32, u32, &str) {
        (self.slave, self.address, self.name.as_str())
    }
}

/// Raw CSV row, every cell optional
#[derive(Debug, Default)]
struct PlanRow {
    group: String,
    name: String,
    slave: String,
    fc: String,
    address: String,
    qty: String,
    typ: String,
    description: String,
    expected: String,
}

impl PlanRow {
    /// Pick cells by header name; absent columns and short rows read as empty
    fn from_record(headers: &StringRecord, record: &StringRecord) -> Self {
        let cell = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };

        Self {
            group: cell("group"),
            name: cell("name"),
            slave: cell("slave"),
            fc: cell("fc"),
            address: cell("address"),
            qty: cell("qty"),
            typ: cell("type"),
            description: cell("description"),
            expected: cell("expected"),
        }
    }

    fn into_request(self, line: usize) -> RegisterRequest {
        let slave = parse_or_default(&self.slave, DEFAULT_SLAVE, "slave", line);
        let fc = parse_or_default(&self.fc, DEFAULT_FUNCTION_CODE, "fc", line);
        let address = parse_or_default(&self.address, DEFAULT_ADDRESS, "address", line);
        let quantity = match parse_or_default(&self.qty, DEFAULT_QUANTITY, "qty", line) {
            0 => {
                debug!("Plan line {}: qty 0, using {}", line, DEFAULT_QUANTITY);
                DEFAULT_QUANTITY
            },
            q => q,
        };
        let typ = if self.typ.is_empty() {
            DEFAULT_TYPE.to_string()
        } else {
            self.typ
        };

        RegisterRequest::new(self.name, slave, fc, address, quantity, typ)
            .with_group(self.group)
            .with_description(self.description)
            .with_expected(self.expected)
    }
}

/// Parse a numeric cell, substituting `default` when empty, malformed or out of range
fn parse_or_default<T>(cell: &str, default: T, field: &str, line: usize) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match cell.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            if !cell.trim().is_empty() {
                debug!(
                    "Plan line {}: invalid {} '{}', using {}",
                    line, field, cell, default
                );
            }
            default
        },
    }
}

/// Parse a plan from any CSV source and return it in processing order
pub fn parse_plan<R: Read>(source: R) -> Result<Vec<RegisterRequest>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers()?.clone();
    let mut requests = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // Header is line 1
        let record = record?;
        requests.push(PlanRow::from_record(&headers, &record).into_request(index + 2));
    }

    // Stable: rows with identical keys keep file order
    requests.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    Ok(requests)
}

/// Load a plan file
pub fn load_plan(path: impl AsRef<Path>) -> Result<Vec<RegisterRequest>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| VerifyError::plan(format!("Cannot open {}: {}", path.display(), e)))?;

    let requests = parse_plan(BufReader::new(file))?;
    info!("Loaded {} plan rows from {}", requests.len(), path.display());
    Ok(requests)
}
