#[cfg(any(test, feature = "stub-probe"))]
pub mod stub;

use crate::config_map::ConfigMap;
use async_trait::async_trait;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

pub const UNABLE_TO_CONNECT: &str = "Unable to connect: ";

/// Upper bound of the share of a probe budget kept back from the driver.
pub const MAX_DEADLINE_MARGIN: Duration = Duration::from_secs(1);

/// Why a probe could not confirm the target store.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeFailureKind {
    /// Name resolution, refused or unroutable connections.
    Unreachable,
    /// The store answered but rejected the supplied credentials.
    AuthRejected,
    /// The store answered but its topology does not match the request,
    /// e.g. a replica set name that no member reports.
    TopologyMismatch,
    /// Nothing conclusive happened before the deadline.
    Timeout,
    Other,
}

impl fmt::Display for ProbeFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            ProbeFailureKind::Unreachable => "unreachable",
            ProbeFailureKind::AuthRejected => "auth-rejected",
            ProbeFailureKind::TopologyMismatch => "topology-mismatch",
            ProbeFailureKind::Timeout => "timeout",
            ProbeFailureKind::Other => "other",
        };
        f.write_str(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub kind: ProbeFailureKind,
    /// Most specific driver supplied text.
    pub detail: String,
}

impl ProbeFailure {
    pub fn new(kind: ProbeFailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self::new(ProbeFailureKind::Unreachable, detail)
    }

    pub fn auth_rejected(detail: impl Into<String>) -> Self {
        Self::new(ProbeFailureKind::AuthRejected, detail)
    }

    pub fn topology_mismatch(detail: impl Into<String>) -> Self {
        Self::new(ProbeFailureKind::TopologyMismatch, detail)
    }

    pub fn other(detail: impl Into<String>) -> Self {
        Self::new(ProbeFailureKind::Other, detail)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            ProbeFailureKind::Timeout,
            format!(
                "Timed out after {} ms waiting for the data source to respond",
                after.as_millis()
            ),
        )
    }

    /// User facing text attached to the connection property.
    pub fn message(&self) -> String {
        format!("{UNABLE_TO_CONNECT}{}", self.detail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable,
    Failed(ProbeFailure),
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeOutcome::Reachable)
    }
}

impl From<ProbeFailure> for ProbeOutcome {
    fn from(failure: ProbeFailure) -> Self {
        ProbeOutcome::Failed(failure)
    }
}

/// Live, single-shot check that the configured store can be reached and
/// accepts the supplied credentials.
///
/// Implementations wrap a native driver and must turn every driver fault
/// into a [`ProbeOutcome`]. They must also release whatever they open when
/// the returned future completes *or is dropped*: the caller abandons the
/// future once its deadline passes.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// `timeout` is the budget the caller enforces; pass it on to driver
    /// level connect/selection timeouts.
    async fn probe(&self, config: &ConfigMap, timeout: Duration) -> ProbeOutcome;
}

/// Runs `probe` with a deadline measured from this call.
pub async fn probe_with_deadline(
    probe: &dyn ConnectivityProbe,
    config: &ConfigMap,
    timeout: Duration,
) -> ProbeOutcome {
    match tokio::time::timeout(timeout, probe.probe(config, timeout)).await {
        Ok(outcome) => outcome,
        Err(_) => ProbeFailure::timeout(timeout).into(),
    }
}

/// Time a driver may spend on its own connect/selection timeouts inside a
/// probe budget. Strictly below `budget` (for any non-zero budget) so the
/// driver reports its own failure before [`probe_with_deadline`] gives up.
pub fn driver_deadline(budget: Duration) -> Duration {
    budget - (budget / 5).min(MAX_DEADLINE_MARGIN)
}

/// Text of the innermost error in a `source()` chain.
pub fn most_specific_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
