//! Interaction webhook: payload model, dispatch and responses.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use ticketdesk_core::platform::discord::model::{
    modal_rows, snowflake, DiscordComponent, DiscordEmbed, DiscordUser,
};
use ticketdesk_core::platform::GuildId;
use ticketdesk_core::ticket::{
    CloseContext, TicketSubmission, CLAIM_BUTTON, CLOSE_BUTTON, CLOSE_REASON_PREFIX,
    CREATED_REPLY, INPUT_REASON, RESOLVED_BUTTON, TICKET_FORM_ID,
};
use ticketdesk_core::{
    Actor, CommandInvocation, InteractionReply, TicketError, TicketId, TransitionKind,
};

use crate::metrics::{DEFERRED_REPLIES_TOTAL, INTERACTIONS_TOTAL};
use crate::state::AppState;

pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_COMMAND: u8 = 2;
pub const INTERACTION_COMPONENT: u8 = 3;
pub const INTERACTION_MODAL_SUBMIT: u8 = 5;

pub const RESPONSE_PONG: u8 = 1;
pub const RESPONSE_MESSAGE: u8 = 4;
pub const RESPONSE_DEFERRED_MESSAGE: u8 = 5;
pub const RESPONSE_MODAL: u8 = 9;

/// Reply when a slow action cannot be followed up later.
pub const STILL_WORKING_REPLY: &str = "Still working on it, check the ticket in a moment.";

/// Message flag making a reply visible only to the invoking user.
pub const FLAG_EPHEMERAL: u64 = 1 << 6;
/// Permission bit for managing the guild.
pub const PERMISSION_MANAGE_GUILD: u64 = 1 << 5;

#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, deserialize_with = "snowflake::option::deserialize")]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub member: Option<InteractionMember>,
    /// Set instead of `member` outside guilds.
    #[serde(default)]
    pub user: Option<DiscordUser>,
    #[serde(default)]
    pub data: Option<InteractionData>,
    /// The message a pressed button belongs to.
    #[serde(default)]
    pub message: Option<InteractionMessage>,
    #[serde(default, deserialize_with = "snowflake::option::deserialize")]
    pub application_id: Option<u64>,
    /// Continuation token for editing the reply later.
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionMember {
    pub user: DiscordUser,
    /// Resolved permission bitset, as a decimal string.
    #[serde(default)]
    pub permissions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InteractionData {
    /// Command name.
    #[serde(default)]
    pub name: Option<String>,
    /// Button or form id.
    #[serde(default)]
    pub custom_id: Option<String>,
    /// Submitted form rows.
    #[serde(default)]
    pub components: Vec<DiscordComponent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionMessage {
    #[serde(with = "snowflake")]
    pub id: u64,
    #[serde(with = "snowflake")]
    pub channel_id: u64,
}

impl Interaction {
    /// The user behind the interaction and their guild permissions.
    pub fn actor(&self) -> Option<Actor> {
        let (user, permissions) = match (&self.member, &self.user) {
            (Some(member), _) => (&member.user, member.permissions.as_deref()),
            (None, Some(user)) => (user, None),
            (None, None) => return None,
        };

        let name = user.global_name.clone().unwrap_or_else(|| user.username.clone());
        let mut actor = Actor::new(user.id, name);
        let bits = permissions
            .and_then(|p| p.parse::<u64>().ok())
            .unwrap_or(0);
        if bits & PERMISSION_MANAGE_GUILD != 0 {
            actor = actor.with_manage_guild();
        }
        Some(actor)
    }

    fn kind_label(&self) -> &'static str {
        match self.kind {
            INTERACTION_PING => "ping",
            INTERACTION_COMMAND => "command",
            INTERACTION_COMPONENT => "component",
            INTERACTION_MODAL_SUBMIT => "modal_submit",
            _ => "unknown",
        }
    }
}

/// Submitted text input values by input id.
pub fn form_values(rows: &[DiscordComponent]) -> HashMap<String, String> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|input| Some((input.custom_id.clone()?, input.value.clone()?)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl InteractionResponse {
    pub fn pong() -> Self {
        Self {
            kind: RESPONSE_PONG,
            data: None,
        }
    }

    /// Acknowledge now, with the private text following later.
    pub fn deferred_private() -> Self {
        Self {
            kind: RESPONSE_DEFERRED_MESSAGE,
            data: Some(json!({ "flags": FLAG_EPHEMERAL })),
        }
    }

    pub fn from_reply(reply: &InteractionReply) -> Self {
        match reply {
            InteractionReply::Modal(modal) => Self {
                kind: RESPONSE_MODAL,
                data: Some(json!({
                    "custom_id": modal.custom_id,
                    "title": modal.title,
                    "components": modal_rows(modal),
                })),
            },
            InteractionReply::Message {
                content,
                embed,
                private,
            } => {
                let mut data = Map::new();
                if let Some(content) = content {
                    data.insert("content".to_string(), json!(content));
                }
                if let Some(embed) = embed {
                    data.insert("embeds".to_string(), json!([DiscordEmbed::from(embed)]));
                }
                if *private {
                    data.insert("flags".to_string(), json!(FLAG_EPHEMERAL));
                }
                Self {
                    kind: RESPONSE_MESSAGE,
                    data: Some(Value::Object(data)),
                }
            }
        }
    }
}

/// Entry point for every platform interaction.
pub async fn handle_interaction(
    State(state): State<Arc<AppState>>,
    Json(interaction): Json<Interaction>,
) -> Result<Json<InteractionResponse>, StatusCode> {
    INTERACTIONS_TOTAL
        .with_label_values(&[interaction.kind_label()])
        .inc();

    if interaction.kind == INTERACTION_PING {
        return Ok(Json(InteractionResponse::pong()));
    }

    let actor = interaction.actor().ok_or(StatusCode::BAD_REQUEST)?;
    let data = interaction.data.as_ref().ok_or(StatusCode::BAD_REQUEST)?;

    let response = match interaction.kind {
        INTERACTION_COMMAND => {
            InteractionResponse::from_reply(&run_command(&state, &interaction, actor, data).await)
        }
        // The reason form has to be the immediate reply, so this one is never deferred.
        INTERACTION_COMPONENT if data.custom_id.as_deref() == Some(CLOSE_BUTTON) => {
            InteractionResponse::from_reply(&begin_close(&state, &interaction, &actor).await?)
        }
        INTERACTION_COMPONENT | INTERACTION_MODAL_SUBMIT => {
            reply_in_time(Arc::clone(&state), interaction.clone(), actor).await?
        }
        other => {
            warn!(kind = other, "Unsupported interaction type");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(Json(response))
}

/// Run a ticket action and answer with its reply if it finishes within
/// the reply deadline. Otherwise answer with a deferred private reply and
/// fill it in once the action is done.
async fn reply_in_time(
    state: Arc<AppState>,
    interaction: Interaction,
    actor: Actor,
) -> Result<InteractionResponse, StatusCode> {
    let mut action = {
        let state = Arc::clone(&state);
        let interaction = interaction.clone();
        tokio::spawn(async move { ticket_action(&state, &interaction, &actor).await })
    };

    match tokio::time::timeout(state.reply_deadline(), &mut action).await {
        Ok(Ok(reply)) => reply.map(|reply| InteractionResponse::from_reply(&reply)),
        Ok(Err(e)) => {
            error!(error = %e, "Ticket action task failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(_) => {
            let (Some(application_id), Some(token)) =
                (interaction.application_id, interaction.token.clone())
            else {
                warn!("Ticket action is slow and the interaction cannot be followed up");
                return Ok(InteractionResponse::from_reply(&InteractionReply::private(
                    STILL_WORKING_REPLY,
                )));
            };

            DEFERRED_REPLIES_TOTAL.with_label_values(&["deferred"]).inc();
            debug!(application_id, "Deferring ticket action reply");
            tokio::spawn(follow_up(state, application_id, token, action));
            Ok(InteractionResponse::deferred_private())
        }
    }
}

/// Replace a deferred reply with the text the action finished with.
async fn follow_up(
    state: Arc<AppState>,
    application_id: u64,
    token: String,
    action: JoinHandle<Result<InteractionReply, StatusCode>>,
) {
    let content = match action.await {
        Ok(Ok(InteractionReply::Message {
            content: Some(content),
            ..
        })) => content,
        Ok(Ok(_)) => {
            warn!("Deferred ticket action produced no text reply");
            return;
        }
        Ok(Err(status)) => {
            warn!(status = %status, "Deferred ticket action was malformed");
            return;
        }
        Err(e) => {
            error!(error = %e, "Deferred ticket action task failed");
            return;
        }
    };

    let outcome = match state
        .desk()
        .platform()
        .edit_interaction_reply(application_id, &token, &content)
        .await
    {
        Ok(()) => "delivered",
        Err(e) => {
            warn!(error = %e, "Failed to deliver deferred reply");
            "failed"
        }
    };
    DEFERRED_REPLIES_TOTAL.with_label_values(&[outcome]).inc();
}

async fn ticket_action(
    state: &AppState,
    interaction: &Interaction,
    actor: &Actor,
) -> Result<InteractionReply, StatusCode> {
    let data = interaction.data.as_ref().ok_or(StatusCode::BAD_REQUEST)?;
    match interaction.kind {
        INTERACTION_COMPONENT => press_button(state, interaction, actor, data).await,
        _ => Ok(submit_form(state, actor, data).await),
    }
}

async fn run_command(
    state: &AppState,
    interaction: &Interaction,
    actor: Actor,
    data: &InteractionData,
) -> InteractionReply {
    let name = data.name.clone().unwrap_or_default();
    let Some(handler) = state.commands().get(&name) else {
        warn!(command = %name, "Unknown command");
        return InteractionReply::private("Unknown command.");
    };

    debug!(command = %name, actor_id = actor.id, "Running command");
    let mut invocation = CommandInvocation::new(name, actor);
    invocation.guild_id = interaction.guild_id;
    handler.handle(&invocation).await
}

fn pressed_ticket(interaction: &Interaction) -> Result<TicketId, StatusCode> {
    let message = interaction.message.as_ref().ok_or(StatusCode::BAD_REQUEST)?;
    Ok(TicketId::new(message.channel_id, message.id))
}

async fn begin_close(
    state: &AppState,
    interaction: &Interaction,
    actor: &Actor,
) -> Result<InteractionReply, StatusCode> {
    let id = pressed_ticket(interaction)?;
    Ok(match state.desk().begin_close(actor, id).await {
        Ok(form) => InteractionReply::Modal(form),
        Err(e) => rejection(e),
    })
}

async fn press_button(
    state: &AppState,
    interaction: &Interaction,
    actor: &Actor,
    data: &InteractionData,
) -> Result<InteractionReply, StatusCode> {
    let id = pressed_ticket(interaction)?;
    let desk = state.desk();

    let reply = match data.custom_id.as_deref() {
        Some(CLAIM_BUTTON) => transition_reply(TransitionKind::Claim, desk.claim(actor, id).await),
        Some(RESOLVED_BUTTON) => {
            transition_reply(TransitionKind::Resolve, desk.resolve(actor, id).await)
        }
        other => {
            warn!(custom_id = ?other, "Unknown button");
            InteractionReply::private("Unknown action.")
        }
    };
    Ok(reply)
}

async fn submit_form(state: &AppState, actor: &Actor, data: &InteractionData) -> InteractionReply {
    let values = form_values(&data.components);
    let custom_id = data.custom_id.as_deref().unwrap_or_default();

    if custom_id == TICKET_FORM_ID {
        let submission = match TicketSubmission::from_form(&values) {
            Ok(submission) => submission,
            Err(e) => return rejection(e),
        };
        return match state.desk().open_ticket(actor, submission).await {
            Ok(outcome) => {
                info!(ticket = %outcome.record.id, "Ticket submitted");
                InteractionReply::private(CREATED_REPLY)
            }
            Err(e) => rejection(e),
        };
    }

    if custom_id.starts_with(CLOSE_REASON_PREFIX) {
        let Some(context) = CloseContext::parse(custom_id) else {
            warn!(custom_id, "Malformed close form id");
            return InteractionReply::private("Unknown action.");
        };
        let reason = values.get(INPUT_REASON).map(String::as_str).unwrap_or("");
        return transition_reply(
            TransitionKind::Close,
            state.desk().close(actor, context.ticket, reason).await,
        );
    }

    warn!(custom_id, "Unknown form");
    InteractionReply::private("Unknown action.")
}

fn transition_reply<T>(kind: TransitionKind, result: Result<T, TicketError>) -> InteractionReply {
    match result {
        Ok(_) => InteractionReply::private(kind.success_reply()),
        Err(e) => rejection(e),
    }
}

fn rejection(error: TicketError) -> InteractionReply {
    if error.is_rejection() {
        debug!(reason = error.reason(), "Ticket action rejected");
    } else {
        error!(error = %error, "Ticket action failed");
    }
    InteractionReply::private(error.user_message())
}
