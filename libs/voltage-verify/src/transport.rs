//! Register transport capability
//!
//! The verification engine only consumes a register-read capability; the
//! Modbus framing itself lives in `voltage_modbus`.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use voltage_modbus::{ModbusClient, ModbusTcpClient};

use crate::error::{Result, VerifyError};
use crate::plan::FunctionCode;

/// Single-session register read capability
///
/// Implementations are stateful and are driven by one task at a time.
#[async_trait]
pub trait RegisterTransport: Send {
    /// Read `quantity` consecutive registers starting at `address`
    async fn read_registers(
        &mut self,
        slave: u8,
        function: FunctionCode,
        address: u16,
        quantity: u16,
    ) -> Result<Vec<u16>>;

    /// Release the session
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Modbus TCP transport backed by `voltage_modbus`
pub struct ModbusTcpTransport {
    client: ModbusTcpClient,
    endpoint: String,
}

impl ModbusTcpTransport {
    /// Connect to `host:port`; `timeout` bounds every individual read
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let endpoint = format!("{}:{}", host, port);
        debug!("Connecting to {} (timeout {:?})", endpoint, timeout);

        let client = ModbusTcpClient::from_address(&endpoint, timeout)
            .await
            .map_err(|e| VerifyError::connection(&endpoint, e.to_string()))?;

        info!("Connected to {}", endpoint);
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl RegisterTransport for ModbusTcpTransport {
    async fn read_registers(
        &mut self,
        slave: u8,
        function: FunctionCode,
        address: u16,
        quantity: u16,
    ) -> Result<Vec<u16>> {
        debug!(
            "Read fc={:02} unit={} addr={} qty={}",
            function.code(),
            slave,
            address,
            quantity
        );

        let result = match function {
            FunctionCode::ReadHolding => self.client.read_03(slave, address, quantity).await,
            FunctionCode::ReadInput => self.client.read_04(slave, address, quantity).await,
        };

        match result {
            Ok(words) => {
                debug!("Response unit={} addr={}: {:04X?}", slave, address, words);
                Ok(words)
            },
            Err(e) => {
                debug!("Read failed unit={} addr={}: {}", slave, address, e);
                Err(VerifyError::from(e))
            },
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.client.close().await {
            warn!("Error closing {}: {}", self.endpoint, e);
            return Err(VerifyError::from(e));
        }
        debug!("Closed {}", self.endpoint);
        Ok(())
    }
}
