// self
use crate::obs::{CacheOutcome, FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_relay_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a cache consultation outcome via the global metrics recorder (when enabled).
pub fn record_cache_outcome(kind: FlowKind, outcome: CacheOutcome) {
	#[cfg(feature = "tracing")]
	tracing::debug!(flow = kind.as_str(), outcome = outcome.as_str(), "token cache consulted");

	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_relay_cache_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(all(not(feature = "metrics"), not(feature = "tracing")))]
	{
		let _ = (kind, outcome);
	}
}
