pub mod models;

pub use models::events::{AnalyticsEvent, EventFilters, ParseEventError, TrackedEvent};
