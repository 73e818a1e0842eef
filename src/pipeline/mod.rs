//! Pipeline entry points for poster operations.
//!
//! - `run_daily`: weather post, event collection, today-filter, event posts
//! - `post_weather`: the weather post alone
//! - `preview_events`: today's event posts, rendered but not sent

pub mod collect;
pub mod daily;

pub use collect::{Collected, collect_events, fetch_weather};
pub use daily::{compose_event_posts, post_weather, preview_events, publish_logged, run_daily};
