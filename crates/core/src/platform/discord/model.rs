//! Discord wire representations and their conversions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::{
    Button, ButtonStyle, Embed, EmbedAuthor, EmbedField, Modal, OutgoingMessage, PostedMessage,
    TextInputStyle,
};

/// Component type codes.
pub const COMPONENT_ACTION_ROW: u8 = 1;
pub const COMPONENT_BUTTON: u8 = 2;
pub const COMPONENT_TEXT_INPUT: u8 = 4;

/// Snowflakes arrive as strings; accept bare numbers too.
pub mod snowflake {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Num(n) => Ok(n),
        }
    }

    pub mod option {
        use super::Raw;
        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<u64>, D::Error> {
            match Option::<Raw>::deserialize(deserializer)? {
                None => Ok(None),
                Some(Raw::Str(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
                Some(Raw::Num(n)) => Ok(Some(n)),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordUser {
    #[serde(with = "snowflake")]
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordEmbedFooter {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordEmbedAuthor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordEmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordEmbed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<DiscordEmbedAuthor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<DiscordEmbedField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<DiscordEmbedFooter>,
}

/// Any message component: action row, button or text input.
///
/// Incoming form submissions reuse the same shape with `value` filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscordComponent {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<DiscordComponent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordMessage {
    #[serde(with = "snowflake")]
    pub id: u64,
    #[serde(with = "snowflake")]
    pub channel_id: u64,
    pub author: DiscordUser,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub embeds: Vec<DiscordEmbed>,
    #[serde(default)]
    pub components: Vec<DiscordComponent>,
}

/// Body for creating or editing a message.
#[derive(Debug, Clone, Serialize)]
pub struct DiscordMessageBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<DiscordEmbed>,
    pub components: Vec<DiscordComponent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordChannel {
    #[serde(with = "snowflake")]
    pub id: u64,
}

impl From<&Embed> for DiscordEmbed {
    fn from(embed: &Embed) -> Self {
        Self {
            title: embed.title.clone(),
            description: embed.description.clone(),
            color: embed.color,
            timestamp: embed.timestamp,
            author: embed.author.as_ref().map(|a| DiscordEmbedAuthor {
                name: a.name.clone(),
                icon_url: a.icon_url.clone(),
            }),
            fields: embed
                .fields
                .iter()
                .map(|f| DiscordEmbedField {
                    name: f.name.clone(),
                    value: f.value.clone(),
                    inline: f.inline,
                })
                .collect(),
            footer: embed.footer.as_ref().map(|text| DiscordEmbedFooter {
                text: text.clone(),
                icon_url: None,
            }),
        }
    }
}

impl From<DiscordEmbed> for Embed {
    fn from(embed: DiscordEmbed) -> Self {
        Self {
            title: embed.title,
            description: embed.description,
            color: embed.color,
            timestamp: embed.timestamp,
            author: embed.author.map(|a| EmbedAuthor {
                name: a.name,
                icon_url: a.icon_url,
            }),
            fields: embed
                .fields
                .into_iter()
                .map(|f| EmbedField {
                    name: f.name,
                    value: f.value,
                    inline: f.inline,
                })
                .collect(),
            footer: embed.footer.map(|f| f.text),
        }
    }
}

/// Wrap buttons into a single action row.
pub fn button_rows(buttons: &[Button]) -> Vec<DiscordComponent> {
    if buttons.is_empty() {
        return Vec::new();
    }

    let row = buttons
        .iter()
        .map(|b| DiscordComponent {
            kind: COMPONENT_BUTTON,
            custom_id: Some(b.custom_id.clone()),
            label: Some(b.label.clone()),
            style: Some(b.style.code()),
            disabled: Some(b.disabled),
            ..Default::default()
        })
        .collect();

    vec![DiscordComponent {
        kind: COMPONENT_ACTION_ROW,
        components: row,
        ..Default::default()
    }]
}

/// Flatten action rows back into buttons.
pub fn buttons_from_rows(rows: &[DiscordComponent]) -> Vec<Button> {
    rows.iter()
        .flat_map(|row| row.components.iter())
        .filter(|c| c.kind == COMPONENT_BUTTON)
        .filter_map(|c| {
            Some(Button {
                custom_id: c.custom_id.clone()?,
                label: c.label.clone().unwrap_or_default(),
                style: ButtonStyle::from_code(c.style.unwrap_or(2)),
                disabled: c.disabled.unwrap_or(false),
            })
        })
        .collect()
}

/// Text inputs as one action row each, the layout forms require.
pub fn modal_rows(modal: &Modal) -> Vec<DiscordComponent> {
    modal
        .inputs
        .iter()
        .map(|input| DiscordComponent {
            kind: COMPONENT_ACTION_ROW,
            components: vec![DiscordComponent {
                kind: COMPONENT_TEXT_INPUT,
                custom_id: Some(input.custom_id.clone()),
                label: Some(input.label.clone()),
                style: Some(match input.style {
                    TextInputStyle::Short => 1,
                    TextInputStyle::Paragraph => 2,
                }),
                required: Some(input.required),
                min_length: input.min_length,
                max_length: input.max_length,
                placeholder: input.placeholder.clone(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .collect()
}

impl From<&OutgoingMessage> for DiscordMessageBody {
    fn from(message: &OutgoingMessage) -> Self {
        Self {
            content: message.content.clone(),
            embeds: message.embeds.iter().map(DiscordEmbed::from).collect(),
            components: button_rows(&message.buttons),
        }
    }
}

impl From<DiscordMessage> for PostedMessage {
    fn from(message: DiscordMessage) -> Self {
        let buttons = buttons_from_rows(&message.components);
        Self {
            id: message.id,
            channel_id: message.channel_id,
            author_id: message.author.id,
            content: if message.content.is_empty() {
                None
            } else {
                Some(message.content)
            },
            embeds: message.embeds.into_iter().map(Embed::from).collect(),
            buttons,
        }
    }
}
