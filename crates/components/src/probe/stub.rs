//! Scripted probe for tests: answers with a fixed outcome and counts calls.

use super::{ConnectivityProbe, ProbeFailure, ProbeOutcome};
use crate::config_map::ConfigMap;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug)]
pub struct StubProbe {
    outcome: ProbeOutcome,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubProbe {
    pub fn new(outcome: ProbeOutcome) -> Self {
        Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn reachable() -> Self {
        Self::new(ProbeOutcome::Reachable)
    }

    pub fn failing(failure: ProbeFailure) -> Self {
        Self::new(ProbeOutcome::Failed(failure))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectivityProbe for StubProbe {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn probe(&self, _config: &ConfigMap, _timeout: Duration) -> ProbeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}
