//! Testing utilities and mock implementations.
//!
//! `MockPlatform` stands in for the chat platform and `RecordingNotifier`
//! for direct-message delivery, so the whole desk can run in-process.
//!
//! # Example
//!
//! ```rust,ignore
//! use ticketdesk_core::testing::fixtures::{self, DeskHarness};
//!
//! let harness = DeskHarness::new();
//! let outcome = harness
//!     .desk
//!     .open_ticket(&fixtures::submitter(), fixtures::submission("Crash"))
//!     .await?;
//! assert_eq!(harness.tracked_titles().await, vec!["Crash"]);
//! ```

mod mock_platform;
mod recording_notifier;

pub use mock_platform::MockPlatform;
pub use recording_notifier::RecordingNotifier;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use super::{MockPlatform, RecordingNotifier};
    use crate::platform::{Actor, ChannelId, GuildId, UserId};
    use crate::ticket::{DeskSettings, SqliteTicketStore, TicketDesk, TicketSubmission};
    use crate::tracking::TrackingIndex;

    pub const BOT_ID: UserId = 1_100_000_000_000_000_001;
    pub const GUILD_ID: GuildId = 850912717107625984;
    pub const TICKET_CHANNEL: ChannelId = 1090320030094348389;
    pub const TRACKING_CHANNEL: ChannelId = 1130863192332058675;
    pub const SUBMITTER_ID: UserId = 1_200_000_000_000_000_001;
    pub const ALICE_ID: UserId = 1_200_000_000_000_000_002;
    pub const BOB_ID: UserId = 1_200_000_000_000_000_003;
    pub const BRAND: &str = "Ticket Desk";

    pub fn submitter() -> Actor {
        Actor::new(SUBMITTER_ID, "submitter")
    }

    pub fn alice() -> Actor {
        Actor::new(ALICE_ID, "alice")
    }

    pub fn bob() -> Actor {
        Actor::new(BOB_ID, "bob")
    }

    pub fn submission(title: &str) -> TicketSubmission {
        TicketSubmission {
            title: title.to_string(),
            description: format!("{} happens every time", title),
            impacted_service: "website".to_string(),
            notes: None,
        }
    }

    pub fn desk_settings() -> DeskSettings {
        DeskSettings {
            guild_id: GUILD_ID,
            ticket_channel_id: TICKET_CHANNEL,
            brand: BRAND.to_string(),
        }
    }

    /// A desk wired to in-memory collaborators.
    pub struct DeskHarness {
        pub platform: Arc<MockPlatform>,
        pub store: Arc<SqliteTicketStore>,
        pub notifier: Arc<RecordingNotifier>,
        pub tracking: Arc<TrackingIndex>,
        pub desk: Arc<TicketDesk>,
    }

    impl Default for DeskHarness {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DeskHarness {
        pub fn new() -> Self {
            let platform = Arc::new(MockPlatform::new(BOT_ID));
            let store = Arc::new(
                SqliteTicketStore::in_memory().expect("in-memory store should open"),
            );
            let notifier = Arc::new(RecordingNotifier::new());
            let tracking = Arc::new(TrackingIndex::new(platform.clone(), TRACKING_CHANNEL));
            let desk = Arc::new(TicketDesk::new(
                platform.clone(),
                store.clone(),
                tracking.clone(),
                notifier.clone(),
                desk_settings(),
            ));

            Self {
                platform,
                store,
                notifier,
                tracking,
                desk,
            }
        }

        /// Titles currently listed in the tracking index.
        pub async fn tracked_titles(&self) -> Vec<String> {
            self.tracking
                .entries()
                .await
                .expect("tracking index should be reachable")
                .into_iter()
                .map(|entry| entry.title)
                .collect()
        }
    }
}
