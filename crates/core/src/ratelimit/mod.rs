//! Per-actor rate limiting for slash commands.

mod guard;
mod limiter;

pub use guard::{rate_limited_embed, RateLimitGuard};
pub use limiter::{BypassFn, Decision, RateLimiter};
