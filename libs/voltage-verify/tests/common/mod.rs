//! Test Common Utilities
//!
//! Scripted register transport and plan fixtures for voltage-verify integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::NamedTempFile;

use voltage_verify::{FunctionCode, RegisterTransport, Result, VerifyError};

/// One observed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    pub slave: u8,
    pub function: FunctionCode,
    pub address: u16,
    pub quantity: u16,
}

/// Shared view of what a transport saw, usable after the transport is consumed
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
    closed: Arc<AtomicBool>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn addresses(&self) -> Vec<(u8, u16)> {
        self.calls().iter().map(|c| (c.slave, c.address)).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Replays scripted responses per (slave, address)
///
/// Each key holds a queue; the last response of a queue repeats once it is the
/// only one left. Unscripted reads fail with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: HashMap<(u8, u16), VecDeque<Result<Vec<u16>>>>,
    log: CallLog,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful read
    pub fn respond(mut self, slave: u8, address: u16, words: &[u16]) -> Self {
        self.push(slave, address, Ok(words.to_vec()));
        self
    }

    /// Queue a failed read
    pub fn fail(mut self, slave: u8, address: u16, error: VerifyError) -> Self {
        self.push(slave, address, Err(error));
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn push(&mut self, slave: u8, address: u16, response: Result<Vec<u16>>) {
        self.script
            .entry((slave, address))
            .or_default()
            .push_back(response);
    }
}

#[async_trait]
impl RegisterTransport for ScriptedTransport {
    async fn read_registers(
        &mut self,
        slave: u8,
        function: FunctionCode,
        address: u16,
        quantity: u16,
    ) -> Result<Vec<u16>> {
        self.log.calls.lock().unwrap().push(Call {
            slave,
            function,
            address,
            quantity,
        });

        match self.script.get_mut(&(slave, address)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Err(VerifyError::transport(format!(
                "no response scripted for slave={} addr={}",
                slave, address
            ))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.log.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Write `contents` to a temporary CSV plan file
pub fn plan_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp plan");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp plan");
    file
}

pub const PLAN_HEADER: &str = "group,name,slave,fc,address,qty,type,description,expected";
