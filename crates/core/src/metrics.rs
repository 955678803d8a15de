//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ticket lifecycle (creations, transitions, rejections, side-effect warnings)
//! - Rate limiting
//! - Chat platform requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Tickets
// =============================================================================

/// Tickets opened total.
pub static TICKETS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ticketdesk_tickets_created_total", "Total tickets opened").unwrap()
});

/// Committed ticket transitions by kind.
pub static TICKET_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_ticket_transitions_total",
            "Total committed ticket transitions",
        ),
        &["kind"], // "claim", "resolve", "close"
    )
    .unwrap()
});

/// Rejected ticket transitions by reason.
pub static TRANSITION_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_transition_rejections_total",
            "Total ticket transitions rejected by a precondition",
        ),
        &["reason"],
    )
    .unwrap()
});

/// Side effects that failed after a transition was committed.
pub static SIDE_EFFECT_WARNINGS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_side_effect_warnings_total",
            "Total side effects that failed after commit",
        ),
        &["kind"], // "tracking_index", "notification", "store"
    )
    .unwrap()
});

// =============================================================================
// Rate limiting
// =============================================================================

/// Commands refused by the rate limiter.
pub static RATE_LIMIT_DENIALS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_rate_limit_denials_total",
            "Total command invocations denied by the rate limiter",
        ),
        &["command"],
    )
    .unwrap()
});

// =============================================================================
// Chat platform
// =============================================================================

/// Chat platform request duration in seconds.
pub static PLATFORM_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketdesk_platform_request_duration_seconds",
            "Duration of chat platform API requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["operation"],
    )
    .unwrap()
});

/// Chat platform requests by operation and result.
pub static PLATFORM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_platform_requests_total",
            "Total chat platform API requests",
        ),
        &["operation", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Every core metric, for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Tickets
        Box::new(TICKETS_CREATED.clone()),
        Box::new(TICKET_TRANSITIONS.clone()),
        Box::new(TRANSITION_REJECTIONS.clone()),
        Box::new(SIDE_EFFECT_WARNINGS.clone()),
        // Rate limiting
        Box::new(RATE_LIMIT_DENIALS.clone()),
        // Chat platform
        Box::new(PLATFORM_REQUEST_DURATION.clone()),
        Box::new(PLATFORM_REQUESTS.clone()),
    ]
}
