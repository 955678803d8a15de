//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here; ticket, rate limit and platform metrics
//! are defined in the core crate and registered alongside them.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;
use ticketdesk_core::{TicketFilter, TicketStatus};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketdesk_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketdesk_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketdesk_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Interaction requests whose signature did not verify.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_auth_failures_total",
            "Total interaction verification failures",
        ),
        &["reason"],
    )
    .unwrap()
});

/// Interactions received by type.
pub static INTERACTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketdesk_interactions_total", "Interactions received"),
        &["kind"],
    )
    .unwrap()
});

/// Ticket actions answered late, by outcome of the deferred reply.
pub static DEFERRED_REPLIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_deferred_replies_total",
            "Interactions answered with a deferred reply",
        ),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Ticket Metrics
// =============================================================================

/// Tickets by current status (collected dynamically).
pub static TICKETS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("ticketdesk_tickets_by_status", "Current ticket count by status"),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(INTERACTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(DEFERRED_REPLIES_TOTAL.clone()))
        .unwrap();

    // Tickets
    registry
        .register(Box::new(TICKETS_BY_STATUS.clone()))
        .unwrap();

    // Core metrics (tickets, rate limiting, platform requests)
    for metric in ticketdesk_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Refresh gauges that mirror stored state before a scrape.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let store = state.ticket_store();
    for status in TicketStatus::ALL {
        let filter = TicketFilter::new().with_status(status);
        if let Ok(count) = store.count(&filter) {
            TICKETS_BY_STATUS
                .with_label_values(&[status.as_str()])
                .set(count);
        }
    }
}

static SNOWFLAKE_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    SNOWFLAKE_SEGMENT.replace_all(path, "/{id}$1").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(
            normalize_path("/api/v1/tickets/1130863192332058675"),
            "/api/v1/tickets/{id}"
        );
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/interactions"), "/interactions");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics().unwrap();
        assert!(output.contains("ticketdesk_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        ticketdesk_core::metrics::TICKETS_CREATED.inc();
        TICKETS_BY_STATUS.with_label_values(&["open"]).set(0);

        let output = encode_metrics().unwrap();

        assert!(output.contains("ticketdesk_tickets_created_total"));
        assert!(output.contains("ticketdesk_tickets_by_status"));
    }
}
