//! Poll orchestration
//!
//! Walks the ordered plan against one transport session. Per request:
//!
//! ```text
//! filter ─▶ acquire ─┬─ Complete ─▶ decode ─▶ OK
//!                    ├─ Short ────▶ decode ─▶ WARN
//!                    └─ Failed ─────────────▶ FAIL
//! ```
//!
//! Requests run strictly one after another; the transport is a stateful
//! single-session resource.

use tracing::{debug, info, warn};

use crate::bytes::{ByteEndian, WordOrder};
use crate::decoder::{select_and_decode, DecodedValue};
use crate::plan::RegisterRequest;
use crate::policy::{Acquisition, AcquisitionPolicy};
use crate::report::{ReportAggregator, ResultRecord, RunSummary, Target};
use crate::transport::RegisterTransport;

/// Optional slave / group restriction of the plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    only_slave: Option<u8>,
    /// Stored lowercased
    only_group: Option<String>,
}

impl RequestFilter {
    /// `only_slave == 0` and an empty `only_group` disable the respective filter
    pub fn new(only_slave: u8, only_group: &str) -> Self {
        let group = only_group.trim();
        Self {
            only_slave: (only_slave != 0).then_some(only_slave),
            only_group: (!group.is_empty()).then(|| group.to_lowercase()),
        }
    }

    pub fn only_slave(&self) -> Option<u8> {
        self.only_slave
    }

    pub fn only_group(&self) -> Option<&str> {
        self.only_group.as_deref()
    }

    /// Slave must match exactly; group matches as a case-insensitive substring
    pub fn matches(&self, request: &RegisterRequest) -> bool {
        if let Some(slave) = self.only_slave {
            if request.slave != u32::from(slave) {
                return false;
            }
        }
        if let Some(group) = &self.only_group {
            if !request.group.to_lowercase().contains(group.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Receives each record as soon as it is built (console output, progress)
pub trait RecordObserver {
    fn on_record(&mut self, record: &ResultRecord);
}

impl<F> RecordObserver for F
where
    F: FnMut(&ResultRecord),
{
    fn on_record(&mut self, record: &ResultRecord) {
        self(record)
    }
}

/// Everything a run needs besides the plan and the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub target: Target,
    pub endian: ByteEndian,
    pub word_order: WordOrder,
    pub policy: AcquisitionPolicy,
    pub filter: RequestFilter,
}

impl PollSettings {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            endian: ByteEndian::default(),
            word_order: WordOrder::default(),
            policy: AcquisitionPolicy::default(),
            filter: RequestFilter::default(),
        }
    }

    pub fn with_ordering(mut self, endian: ByteEndian, word_order: WordOrder) -> Self {
        self.endian = endian;
        self.word_order = word_order;
        self
    }

    pub fn with_policy(mut self, policy: AcquisitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_filter(mut self, filter: RequestFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Drives a verification run
#[derive(Debug, Clone)]
pub struct PollOrchestrator {
    settings: PollSettings,
}

impl PollOrchestrator {
    pub fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Acquire, decode and classify a single request
    pub async fn process<T>(&self, transport: &mut T, request: &RegisterRequest) -> ResultRecord
    where
        T: RegisterTransport + ?Sized,
    {
        let acquisition = self.settings.policy.acquire(transport, request).await;
        let error = acquisition.message();

        match acquisition {
            Acquisition::Complete { words, .. } => {
                let (display, value) = self.decode(request, &words);
                ResultRecord::ok(request, display, value)
            },
            Acquisition::Short { words, .. } => {
                let (display, value) = self.decode(request, &words);
                ResultRecord::warn(request, display, value, error)
            },
            Acquisition::Failed { .. } => ResultRecord::fail(request, error),
        }
    }

    fn decode(&self, request: &RegisterRequest, words: &[u16]) -> (String, DecodedValue) {
        let decoded = select_and_decode(
            request.value_type,
            words,
            self.settings.word_order,
            self.settings.endian,
        );
        debug!(
            "{}: {} {:?} -> {}",
            request.name, request.value_type, words, decoded.0
        );
        decoded
    }

    /// Process every request that passes the filter, in plan order
    pub async fn run<T>(
        &self,
        plan: &[RegisterRequest],
        transport: &mut T,
        observer: &mut dyn RecordObserver,
    ) -> RunSummary
    where
        T: RegisterTransport + ?Sized,
    {
        info!(
            "Polling {} request(s) on {} (endian={}, wordorder={}, retries={})",
            plan.len(),
            self.settings.target,
            self.settings.endian,
            self.settings.word_order,
            self.settings.policy.retries()
        );

        let mut aggregator = ReportAggregator::new();
        let mut skipped = 0usize;

        for request in plan {
            if !self.settings.filter.matches(request) {
                skipped += 1;
                continue;
            }

            let record = self.process(transport, request).await;
            observer.on_record(&record);
            aggregator.record(record);
        }

        let counts = aggregator.counts();
        info!(
            "Run complete: OK={} WARN={} FAIL={} (skipped {})",
            counts.ok, counts.warn, counts.fail, skipped
        );

        aggregator.finish(
            self.settings.target.clone(),
            self.settings.endian,
            self.settings.word_order,
        )
    }

    /// Run the plan over an owned session and release it afterwards
    pub async fn run_session<T>(
        &self,
        plan: &[RegisterRequest],
        mut transport: T,
        observer: &mut dyn RecordObserver,
    ) -> RunSummary
    where
        T: RegisterTransport,
    {
        let summary = self.run(plan, &mut transport, observer).await;
        if let Err(e) = transport.close().await {
            warn!("Transport close failed: {}", e);
        }
        summary
    }
}
