use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Storefront analytics event names accepted by the tracking endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackedEvent {
    OfferView,
    OfferClick,
    OfferApplied,
    CartUpdate,
    PurchaseComplete,
}

impl TrackedEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedEvent::OfferView => "offer_view",
            TrackedEvent::OfferClick => "offer_click",
            TrackedEvent::OfferApplied => "offer_applied",
            TrackedEvent::CartUpdate => "cart_update",
            TrackedEvent::PurchaseComplete => "purchase_complete",
        }
    }
}

impl std::fmt::Display for TrackedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrackedEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offer_view" => Ok(TrackedEvent::OfferView),
            "offer_click" => Ok(TrackedEvent::OfferClick),
            "offer_applied" => Ok(TrackedEvent::OfferApplied),
            "cart_update" => Ok(TrackedEvent::CartUpdate),
            "purchase_complete" => Ok(TrackedEvent::PurchaseComplete),
            other => Err(ParseEventError(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid event name: {0}")]
pub struct ParseEventError(pub String);

/// A single tracked event as persisted by the analytics ingestion endpoint
/// and the orders/create webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_name: TrackedEvent,
    pub offer_id: Option<Uuid>,
    pub product_id: Option<String>,
    pub cart_value: Option<f64>,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub shop_id: String,
}

/// Filter set for querying stored events.
#[derive(Debug, Clone, Default)]
pub struct EventFilters {
    pub shop_id: Option<String>,
    pub offer_id: Option<Uuid>,
    pub offer_ids: Option<Vec<Uuid>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl EventFilters {
    /// Whether a stored event passes every set filter.
    pub fn matches(&self, event: &AnalyticsEvent) -> bool {
        if let Some(shop_id) = &self.shop_id {
            if &event.shop_id != shop_id {
                return false;
            }
        }
        if let Some(offer_id) = &self.offer_id {
            if event.offer_id.as_ref() != Some(offer_id) {
                return false;
            }
        }
        if let Some(offer_ids) = &self.offer_ids {
            match &event.offer_id {
                Some(id) if offer_ids.contains(id) => {}
                _ => return false,
            }
        }
        if let Some(start) = &self.start_date {
            if event.timestamp < *start {
                return false;
            }
        }
        if let Some(end) = &self.end_date {
            if event.timestamp > *end {
                return false;
            }
        }
        true
    }
}
