//! End-to-end tests for the interactions endpoint.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use common::fixtures::{ALICE_ID, BOB_ID, SUBMITTER_ID, TICKET_CHANNEL};
use common::*;
use ticketdesk_core::notify::Notification;
use ticketdesk_core::{TicketId, TicketStatus, TicketStore};

const MANAGE_GUILD: u64 = 0x20;

async fn open_ticket(fixture: &TestFixture, title: &str) -> TicketId {
    let response = fixture.interact(ticket_form_submit(SUBMITTER_ID, title)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["content"],
        "Your feedback was sent to the developers!"
    );

    let message = fixture.latest_ticket().await;
    TicketId::new(message.channel_id, message.id)
}

fn content(response: &TestResponse) -> &str {
    response.body["data"]["content"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn test_ping_is_answered_with_pong() {
    let fixture = TestFixture::new();

    let response = fixture.interact(ping()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"type": 1}));
}

#[tokio::test]
async fn test_unsigned_interaction_is_rejected() {
    let fixture = TestFixture::new();

    let response = fixture.interact_with_headers(ping(), &[]).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_badly_signed_interaction_is_rejected() {
    let fixture = TestFixture::new();
    let bogus = "00".repeat(64);

    let response = fixture
        .interact_with_headers(
            ping(),
            &[
                ("x-signature-ed25519", bogus.as_str()),
                ("x-signature-timestamp", SIGNATURE_TIMESTAMP),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ticket_command_opens_form_then_rate_limits() {
    let fixture = TestFixture::new();

    let first = fixture.interact(command("ticket", ALICE_ID, 0)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["type"], 9);
    assert_eq!(first.body["data"]["custom_id"], "ticket_form");
    assert_eq!(
        first.body["data"]["components"].as_array().map(Vec::len),
        Some(4)
    );

    let second = fixture.interact(command("ticket", ALICE_ID, 0)).await;
    assert_eq!(second.body["type"], 4);
    assert_eq!(second.body["data"]["flags"], 64);
    assert_eq!(second.body["data"]["embeds"][0]["title"], "Rate Limited");
    let description = second.body["data"]["embeds"][0]["description"]
        .as_str()
        .unwrap();
    assert!(description.starts_with("Please wait `"));
    assert!(description.ends_with("` seconds before using this command again."));

    // Someone else is not affected.
    let other = fixture.interact(command("ticket", BOB_ID, 0)).await;
    assert_eq!(other.body["type"], 9);
}

#[tokio::test]
async fn test_moderators_bypass_the_ticket_rate_limit() {
    let fixture = TestFixture::new();

    for _ in 0..3 {
        let response = fixture
            .interact(command("ticket", ALICE_ID, MANAGE_GUILD))
            .await;
        assert_eq!(response.body["type"], 9);
    }
    assert_eq!(fixture.limiter.history_len(ALICE_ID).await, 3);
}

#[tokio::test]
async fn test_unknown_command_gets_private_reply() {
    let fixture = TestFixture::new();

    let response = fixture.interact(command("restart", ALICE_ID, 0)).await;

    assert_eq!(response.body["type"], 4);
    assert_eq!(response.body["data"]["flags"], 64);
}

#[tokio::test]
async fn test_submitted_form_posts_and_tracks_ticket() {
    let fixture = TestFixture::new();

    let id = open_ticket(&fixture, "Login broken").await;

    assert_eq!(id.channel_id, TICKET_CHANNEL);
    let record = fixture.harness.store.get(&id).unwrap().unwrap();
    assert_eq!(record.status, TicketStatus::Open);
    assert_eq!(record.submitter_id, SUBMITTER_ID);
    assert_eq!(record.notes, None);
    assert_eq!(fixture.harness.tracked_titles().await, vec!["Login broken"]);
}

#[tokio::test]
async fn test_invalid_form_posts_nothing() {
    let fixture = TestFixture::new();

    let response = fixture
        .interact(form_submit(
            "ticket_form",
            SUBMITTER_ID,
            &[("title", "Crash"), ("description", "d"), ("impacted", "x")],
        ))
        .await;

    assert_eq!(response.body["data"]["flags"], 64);
    assert!(content(&response).contains("impacted service must be between 2 and 400"));
    assert!(fixture
        .harness
        .platform
        .channel_messages(TICKET_CHANNEL)
        .await
        .is_empty());
}

#[tokio::test]
async fn test_claim_then_resolve_notifies_submitter() {
    let fixture = TestFixture::new();
    let id = open_ticket(&fixture, "Crash on save").await;

    let claimed = fixture.interact(button("claim_btn", ALICE_ID, id)).await;
    assert_eq!(content(&claimed), "You've claimed this ticket!");

    let again = fixture.interact(button("claim_btn", BOB_ID, id)).await;
    assert_eq!(content(&again), "This ticket is already claimed!");

    let wrong = fixture.interact(button("resolved_btn", BOB_ID, id)).await;
    assert_eq!(
        content(&wrong),
        "You can not mark this ticket as resolved since you didn't claim this ticket!"
    );
    assert_eq!(
        fixture.harness.store.get(&id).unwrap().unwrap().status,
        TicketStatus::Claimed
    );

    let resolved = fixture.interact(button("resolved_btn", ALICE_ID, id)).await;
    assert_eq!(content(&resolved), "Ticket marked as resolved!");

    let record = fixture.harness.store.get(&id).unwrap().unwrap();
    assert_eq!(record.status, TicketStatus::Resolved);
    assert_eq!(record.claimant_id, Some(ALICE_ID));
    assert!(fixture.harness.tracked_titles().await.is_empty());

    let sent = fixture.harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, SUBMITTER_ID);
    assert!(matches!(
        &sent[0].1,
        Notification::Resolved { title, .. } if title == "Crash on save"
    ));
}

#[tokio::test]
async fn test_close_asks_for_reason_then_closes() {
    let fixture = TestFixture::new();
    let id = open_ticket(&fixture, "Typo on homepage").await;

    let unclaimed = fixture.interact(button("close_btn", ALICE_ID, id)).await;
    assert_eq!(content(&unclaimed), "You have to claim this ticket first!");

    fixture.interact(button("claim_btn", ALICE_ID, id)).await;

    let form = fixture.interact(button("close_btn", ALICE_ID, id)).await;
    assert_eq!(form.body["type"], 9);
    let custom_id = form.body["data"]["custom_id"].as_str().unwrap().to_string();
    assert!(custom_id.starts_with("close_reason"));

    let closed = fixture
        .interact(form_submit(&custom_id, ALICE_ID, &[("reason", "duplicate")]))
        .await;
    assert_eq!(content(&closed), "Ticket marked as closed!");

    let record = fixture.harness.store.get(&id).unwrap().unwrap();
    assert_eq!(record.status, TicketStatus::Closed);
    assert_eq!(record.close_reason.as_deref(), Some("duplicate"));
    assert!(fixture.harness.tracked_titles().await.is_empty());

    let sent = fixture.harness.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].1.message().contains("Reason: `duplicate`"));
}

#[tokio::test]
async fn test_slow_platform_gets_deferred_reply_then_follow_up() {
    let fixture = TestFixture::with_reply_deadline(Duration::from_millis(100));
    let id = open_ticket(&fixture, "Slow platform").await;
    assert!(fixture.harness.platform.interaction_replies().await.is_empty());
    fixture
        .harness
        .platform
        .set_latency(Duration::from_millis(400))
        .await;

    let response = fixture.interact(button("claim_btn", ALICE_ID, id)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"type": 5, "data": {"flags": 64}}));

    let replies = fixture.interaction_replies(1).await;
    assert_eq!(
        replies,
        vec![(
            INTERACTION_TOKEN.to_string(),
            "You've claimed this ticket!".to_string()
        )]
    );
    let record = fixture.harness.store.get(&id).unwrap().unwrap();
    assert_eq!(record.status, TicketStatus::Claimed);
    assert_eq!(record.claimant_id, Some(ALICE_ID));
}

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_config_endpoint_hides_secrets() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["discord"]["token_configured"], true);
    assert!(!response.text.contains("test-token"));
}

#[tokio::test]
async fn test_metrics_endpoint_reports_ticket_counts() {
    let fixture = TestFixture::new();
    open_ticket(&fixture, "Metrics").await;

    let response = fixture.get("/metrics").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("ticketdesk_tickets_by_status"));
    assert!(response.text.contains("ticketdesk_interactions_total"));
}
