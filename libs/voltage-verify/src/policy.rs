//! Acquisition policy
//!
//! Wraps a [`RegisterTransport`] with bounded retry and uniform classification
//! of the outcome of one register read.

use std::time::Duration;
use tracing::{debug, warn};

use crate::error::VerifyError;
use crate::plan::RegisterRequest;
use crate::transport::RegisterTransport;

/// Default retries per read (attempts = retries + 1)
pub const DEFAULT_RETRIES: u32 = 1;

/// Default pause between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(300);

/// Outcome of acquiring one request's registers
///
/// `Short` is the one case where words and an error coexist; it is kept as its
/// own variant so it cannot be mistaken for a clean read or a failure.
#[derive(Debug, Clone)]
pub enum Acquisition {
    /// Exactly the requested number of words
    Complete { words: Vec<u16>, attempts: u32 },
    /// Transport succeeded with a different word count (not retried)
    Short {
        words: Vec<u16>,
        expected: u16,
        attempts: u32,
    },
    /// No words; unsupported function or retries exhausted
    Failed { error: VerifyError, attempts: u32 },
}

impl Acquisition {
    /// Words returned by the transport, if any read succeeded
    pub fn words(&self) -> Option<&[u16]> {
        match self {
            Self::Complete { words, .. } | Self::Short { words, .. } => Some(words),
            Self::Failed { .. } => None,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Complete { attempts, .. }
            | Self::Short { attempts, .. }
            | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// Error attached to this outcome, `None` for a complete read
    pub fn error(&self) -> Option<VerifyError> {
        match self {
            Self::Complete { .. } => None,
            Self::Short {
                words, expected, ..
            } => Some(VerifyError::ShortRead {
                expected: *expected,
                actual: words.len(),
            }),
            Self::Failed { error, .. } => Some(error.clone()),
        }
    }

    /// Error text for reporting, empty when none
    pub fn message(&self) -> String {
        self.error().map(|e| e.to_string()).unwrap_or_default()
    }
}

/// Bounded retry policy for register reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionPolicy {
    retries: u32,
    retry_delay: Duration,
}

impl AcquisitionPolicy {
    pub fn new(retries: u32, retry_delay: Duration) -> Self {
        Self {
            retries,
            retry_delay,
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Total attempts allowed per read
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Acquire the registers of `request` through `transport`
    ///
    /// - unsupported function code or a slave/address outside the Modbus range:
    ///   `Failed` immediately, transport untouched
    /// - transport error: retried after `retry_delay` until attempts run out
    /// - word count mismatch: `Short`, returned at once
    /// - exact word count: `Complete`
    pub async fn acquire<T>(&self, transport: &mut T, request: &RegisterRequest) -> Acquisition
    where
        T: RegisterTransport + ?Sized,
    {
        let wire = request.function_code().and_then(|function| {
            Ok((function, request.unit_id()?, request.start_address()?))
        });
        let (function, slave, address) = match wire {
            Ok(wire) => wire,
            Err(error) => {
                warn!("{}: {}", request.name, error);
                return Acquisition::Failed { error, attempts: 0 };
            },
        };

        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                "{}: attempt {}/{} (unit={} addr={} qty={})",
                request.name, attempt, max_attempts, slave, address, request.quantity
            );

            match transport
                .read_registers(slave, function, address, request.quantity)
                .await
            {
                Ok(words) if words.len() == usize::from(request.quantity) => {
                    return Acquisition::Complete {
                        words,
                        attempts: attempt,
                    };
                },
                Ok(words) => {
                    warn!(
                        "{}: short read, expected {} got {}",
                        request.name,
                        request.quantity,
                        words.len()
                    );
                    return Acquisition::Short {
                        words,
                        expected: request.quantity,
                        attempts: attempt,
                    };
                },
                Err(error) => {
                    if attempt >= max_attempts {
                        warn!(
                            "{}: giving up after {} attempt(s): {}",
                            request.name, attempt, error
                        );
                        return Acquisition::Failed {
                            error,
                            attempts: attempt,
                        };
                    }

                    warn!(
                        "{}: attempt {} failed, retrying in {:?}: {}",
                        request.name, attempt, self.retry_delay, error
                    );
                    if !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                },
            }
        }
    }
}

impl Default for AcquisitionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES, DEFAULT_RETRY_DELAY)
    }
}
