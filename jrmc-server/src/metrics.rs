//! Dispatch metrics
//!
//! OpenTelemetry instruments fed by the [`Dispatcher`](crate::Dispatcher) and
//! the WebSocket server. They report to the global meter provider, which
//! `jrmc_core::init_observability` points at the OTLP collector; without it
//! the global no-op provider swallows every measurement.
//!
//! # Metrics Collected
//!
//! - **jrmc.dispatch.requests**: dispatched requests by `resource`, `method`
//!   and `status` (counter)
//! - **jrmc.dispatch.errors**: failed dispatches by stage `kind` (counter)
//! - **jrmc.dispatch.duration**: time spent in dispatch, in seconds (histogram)
//! - **jrmc.server.connections.active**: open WebSocket connections (gauge)
//!
//! # Examples
//!
//! ```rust,no_run
//! use jrmc_server::DispatchMetrics;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! let metrics = DispatchMetrics::new("math-service");
//! metrics.record_dispatch("/math", "triple", &Ok(json!(30)), Duration::from_millis(2));
//! metrics.record_connection(3);
//! ```

use jrmc_core::DispatchError;
use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};
use serde_json::Value;
use std::time::Duration;

/// Instruments for dispatch and connection activity
pub struct DispatchMetrics {
    pub requests_total: Counter<u64>,
    pub errors_total: Counter<u64>,
    pub duration: Histogram<f64>,
    pub connections_active: Gauge<i64>,
}

impl DispatchMetrics {
    /// Instruments on the global meter named after the service
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Instruments on a caller-provided meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("jrmc.dispatch.requests")
                .with_description("Total number of dispatched requests")
                .build(),
            errors_total: meter
                .u64_counter("jrmc.dispatch.errors")
                .with_description("Total number of failed dispatches by stage")
                .build(),
            duration: meter
                .f64_histogram("jrmc.dispatch.duration")
                .with_description("Dispatch duration in seconds")
                .with_unit("s")
                .build(),
            connections_active: meter
                .i64_gauge("jrmc.server.connections.active")
                .with_description("Number of active WebSocket connections")
                .build(),
        }
    }

    /// Record one finished dispatch
    ///
    /// `resource` and `method` are empty for requests that failed validation.
    pub fn record_dispatch(
        &self,
        resource: &str,
        method: &str,
        outcome: &Result<Value, DispatchError>,
        elapsed: Duration,
    ) {
        let status = if outcome.is_ok() { "success" } else { "error" };
        let attributes = &[
            KeyValue::new("resource", resource.to_string()),
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status),
        ];
        self.requests_total.add(1, attributes);
        self.duration.record(elapsed.as_secs_f64(), attributes);

        if let Err(e) = outcome {
            self.errors_total.add(1, &[KeyValue::new("kind", e.kind())]);
        }
    }

    /// Record the current number of open connections
    pub fn record_connection(&self, active: i64) {
        self.connections_active.record(active, &[]);
    }
}

impl std::fmt::Debug for DispatchMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMetrics").finish_non_exhaustive()
    }
}
