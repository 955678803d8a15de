//! Platform-neutral message, control and actor types.
//!
//! These cover exactly what the ticket desk needs from a chat platform:
//! embeds with named fields, a row of buttons, and text-input forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snowflake identifier of a user.
pub type UserId = u64;
/// Snowflake identifier of a channel (text channel or DM channel).
pub type ChannelId = u64;
/// Snowflake identifier of a message.
pub type MessageId = u64;
/// Snowflake identifier of a guild (community).
pub type GuildId = u64;

/// The user that triggered an interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    /// Whether the user holds the "manage guild" permission in the guild
    /// the interaction came from.
    #[serde(default)]
    pub can_manage_guild: bool,
}

impl Actor {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            can_manage_guild: false,
        }
    }

    /// Mark the actor as holding the manage-guild permission.
    pub fn with_manage_guild(mut self) -> Self {
        self.can_manage_guild = true;
        self
    }
}

/// One named field of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

impl EmbedField {
    /// Block (non-inline) field, the only layout the desk renders.
    pub fn block(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }
}

/// Author line of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Rich embed attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    /// Footer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>, description: impl Into<String>, color: u32) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            color: Some(color),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: EmbedField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Value of the first field whose name matches, ignoring ASCII case.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }
}

/// Visual style of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

impl ButtonStyle {
    /// Numeric style used on the wire.
    pub fn code(&self) -> u8 {
        match self {
            ButtonStyle::Primary => 1,
            ButtonStyle::Secondary => 2,
            ButtonStyle::Success => 3,
            ButtonStyle::Danger => 4,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => ButtonStyle::Primary,
            3 => ButtonStyle::Success,
            4 => ButtonStyle::Danger,
            _ => ButtonStyle::Secondary,
        }
    }
}

/// Interactive button attached below a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    #[serde(default)]
    pub disabled: bool,
}

impl Button {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

/// Message content to post or to replace an existing message with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutgoingMessage {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub buttons: Vec<Button>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Default::default()
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// A message as it currently exists on the platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub buttons: Vec<Button>,
}

impl PostedMessage {
    pub fn first_embed(&self) -> Option<&Embed> {
        self.embeds.first()
    }
}

/// Style of a form text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextInputStyle {
    Short,
    Paragraph,
}

/// One text input of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub style: TextInputStyle,
    pub required: bool,
    pub min_length: Option<u16>,
    pub max_length: Option<u16>,
    pub placeholder: Option<String>,
}

/// A pop-up form shown to the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

/// What to answer an interaction with.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionReply {
    /// Open a form.
    Modal(Modal),
    /// Answer with a message, visible only to the actor when `private`.
    Message {
        content: Option<String>,
        embed: Option<Embed>,
        private: bool,
    },
}

impl InteractionReply {
    /// Private plain-text reply.
    pub fn private(content: impl Into<String>) -> Self {
        InteractionReply::Message {
            content: Some(content.into()),
            embed: None,
            private: true,
        }
    }

    /// Private embed reply.
    pub fn private_embed(embed: Embed) -> Self {
        InteractionReply::Message {
            content: None,
            embed: Some(embed),
            private: true,
        }
    }

    /// Text of the reply, if it is a plain message.
    pub fn content(&self) -> Option<&str> {
        match self {
            InteractionReply::Message { content, .. } => content.as_deref(),
            InteractionReply::Modal(_) => None,
        }
    }
}
