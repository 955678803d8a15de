//! In-process server with a mock chat platform and signed requests.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde_json::{json, Value};
use tower::ServiceExt;

use ticketdesk_core::config::{
    AuthConfig, DatabaseConfig, DiscordConfig, RateLimitConfig, ServerConfig, TicketConfig,
};
use ticketdesk_core::platform::{PostedMessage, UserId};
use ticketdesk_core::testing::fixtures::{DeskHarness, TICKET_CHANNEL};
use ticketdesk_core::{
    AuthMethod, Authenticator, Config, Ed25519Authenticator, RateLimiter, TicketId,
};
use ticketdesk_server::api::{create_router, CommandRegistry};
use ticketdesk_server::state::{AppState, DEFAULT_REPLY_DEADLINE};

pub use ticketdesk_core::testing::fixtures;

pub const SIGNATURE_TIMESTAMP: &str = "1700000000";
pub const APPLICATION_ID: u64 = 1_090_319_800_632_201_306;
pub const INTERACTION_TOKEN: &str = "aW50ZXJhY3Rpb24tdG9rZW4";

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

pub struct TestFixture {
    pub router: Router,
    pub harness: DeskHarness,
    pub limiter: Arc<RateLimiter>,
    key_pair: Ed25519KeyPair,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_reply_deadline(DEFAULT_REPLY_DEADLINE)
    }

    pub fn with_reply_deadline(reply_deadline: Duration) -> Self {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new()).unwrap();
        let key_pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let public_key = hex::encode(key_pair.public_key().as_ref());

        let config = Config {
            auth: AuthConfig {
                method: AuthMethod::Ed25519,
                public_key: Some(public_key.clone()),
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            discord: DiscordConfig {
                api_base: "http://localhost".to_string(),
                token: "test-token".to_string(),
                timeout_secs: 5,
            },
            rate_limit: RateLimitConfig::default(),
            ticket: TicketConfig::default(),
        };

        let authenticator: Arc<dyn Authenticator> =
            Arc::new(Ed25519Authenticator::from_hex(&public_key).unwrap());

        let harness = DeskHarness::new();
        let limiter = Arc::new(
            RateLimiter::new(1, Duration::from_secs(180))
                .with_bypass(|actor| actor.can_manage_guild, true),
        );
        let commands = CommandRegistry::with_ticket_command(Arc::clone(&limiter));

        let state = Arc::new(
            AppState::new(config, authenticator, Arc::clone(&harness.desk), commands)
                .with_reply_deadline(reply_deadline),
        );

        Self {
            router: create_router(state),
            harness,
            limiter,
            key_pair,
        }
    }

    /// POST a correctly signed interaction.
    pub async fn interact(&self, payload: Value) -> TestResponse {
        let body = payload.to_string();
        let signature = self
            .key_pair
            .sign(format!("{}{}", SIGNATURE_TIMESTAMP, body).as_bytes());

        let request = Request::builder()
            .method("POST")
            .uri("/interactions")
            .header("content-type", "application/json")
            .header("x-signature-ed25519", hex::encode(signature.as_ref()))
            .header("x-signature-timestamp", SIGNATURE_TIMESTAMP)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// POST an interaction with whatever signature headers are given.
    pub async fn interact_with_headers(
        &self,
        payload: Value,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/interactions")
            .header("content-type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(payload.to_string())).unwrap();
        self.send(request).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body, text }
    }

    /// Deferred reply edits, once at least `count` have arrived.
    pub async fn interaction_replies(&self, count: usize) -> Vec<(String, String)> {
        for _ in 0..200 {
            let replies = self.harness.platform.interaction_replies().await;
            if replies.len() >= count {
                return replies;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("expected {} deferred replies", count);
    }

    /// The most recently posted ticket message.
    pub async fn latest_ticket(&self) -> PostedMessage {
        self.harness
            .platform
            .channel_messages(TICKET_CHANNEL)
            .await
            .pop()
            .expect("a ticket should have been posted")
    }
}

fn member(user_id: UserId, permissions: u64) -> Value {
    json!({
        "user": {"id": user_id.to_string(), "username": format!("user{}", user_id)},
        "permissions": permissions.to_string()
    })
}

pub fn ping() -> Value {
    json!({"type": 1})
}

pub fn command(name: &str, user_id: UserId, permissions: u64) -> Value {
    json!({
        "type": 2,
        "guild_id": fixtures::GUILD_ID.to_string(),
        "member": member(user_id, permissions),
        "data": {"name": name}
    })
}

pub fn button(custom_id: &str, user_id: UserId, ticket: TicketId) -> Value {
    json!({
        "type": 3,
        "application_id": APPLICATION_ID.to_string(),
        "token": INTERACTION_TOKEN,
        "guild_id": fixtures::GUILD_ID.to_string(),
        "member": member(user_id, 0),
        "message": {
            "id": ticket.message_id.to_string(),
            "channel_id": ticket.channel_id.to_string()
        },
        "data": {"custom_id": custom_id, "component_type": 2}
    })
}

pub fn form_submit(custom_id: &str, user_id: UserId, values: &[(&str, &str)]) -> Value {
    let rows: Vec<Value> = values
        .iter()
        .map(|(id, value)| {
            json!({"type": 1, "components": [{"type": 4, "custom_id": id, "value": value}]})
        })
        .collect();

    json!({
        "type": 5,
        "application_id": APPLICATION_ID.to_string(),
        "token": INTERACTION_TOKEN,
        "guild_id": fixtures::GUILD_ID.to_string(),
        "member": member(user_id, 0),
        "data": {"custom_id": custom_id, "components": rows}
    })
}

pub fn ticket_form_submit(user_id: UserId, title: &str) -> Value {
    form_submit(
        "ticket_form",
        user_id,
        &[
            ("title", title),
            ("description", "The app crashes when saving"),
            ("impacted", "web"),
            ("notes", ""),
        ],
    )
}
