//! Discord adapter: REST client and wire model.

mod client;
pub mod model;

pub use client::DiscordClient;
