//! In-memory analytics counters. The engine mutates its own snapshot; the
//! storage layer performs the durable, atomic increment (see
//! `OfferRepository::increment_counter`).

use smartoffers_shared::TrackedEvent;

use crate::models::Offer;

/// The four counter fields carried on every offer document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    Impressions,
    Clicks,
    Conversions,
    Revenue,
}

impl CounterField {
    /// Storage key / JSON field name for this counter.
    pub fn key(&self) -> &'static str {
        match self {
            CounterField::Impressions => "impressions",
            CounterField::Clicks => "clicks",
            CounterField::Conversions => "conversions",
            CounterField::Revenue => "revenue",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "impressions" => Some(CounterField::Impressions),
            "clicks" => Some(CounterField::Clicks),
            "conversions" => Some(CounterField::Conversions),
            "revenue" => Some(CounterField::Revenue),
            _ => None,
        }
    }
}

impl Offer {
    /// Increment the named counter by one. Unknown names are a silent no-op:
    /// a typo'd event must neither throw nor grow the counter set.
    ///
    /// Returns whether a counter was touched, so callers know to persist.
    pub fn track_event(&mut self, event_type: &str) -> bool {
        let Some(field) = CounterField::from_key(event_type) else {
            return false;
        };

        match field {
            CounterField::Impressions => self.analytics.impressions += 1,
            CounterField::Clicks => self.analytics.clicks += 1,
            CounterField::Conversions => self.analytics.conversions += 1,
            CounterField::Revenue => self.analytics.revenue += 1.0,
        }
        true
    }

    /// Apply a storefront event to the counters: views become impressions,
    /// clicks become clicks, completed purchases bump conversions and add
    /// the cart value to revenue. Applied offers and cart updates are stored
    /// as events only and touch no counter.
    pub fn record_event(&mut self, event: TrackedEvent, cart_value: f64) {
        match event {
            TrackedEvent::OfferView => self.analytics.impressions += 1,
            TrackedEvent::OfferClick => self.analytics.clicks += 1,
            TrackedEvent::PurchaseComplete => {
                self.analytics.conversions += 1;
                self.analytics.revenue += cart_value;
            }
            TrackedEvent::OfferApplied | TrackedEvent::CartUpdate => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Offer, OfferInput, OfferType};

    fn offer() -> Offer {
        Offer::from_input(OfferInput {
            shop_id: Some("test-shop.myshopify.com".to_string()),
            offer_type: Some(OfferType::CrossSell),
            name: Some("You may also like".to_string()),
            products: Some(vec!["prod-1".to_string()]),
            ..Default::default()
        })
    }

    #[test]
    fn test_track_event_increments_known_counters() {
        let mut offer = offer();

        assert!(offer.track_event("impressions"));
        assert!(offer.track_event("impressions"));
        assert!(offer.track_event("clicks"));
        assert!(offer.track_event("conversions"));

        assert_eq!(offer.analytics.impressions, 2);
        assert_eq!(offer.analytics.clicks, 1);
        assert_eq!(offer.analytics.conversions, 1);
        assert_eq!(offer.analytics.revenue, 0.0);
    }

    #[test]
    fn test_track_event_unknown_name_is_a_no_op() {
        let mut offer = offer();
        let before = offer.analytics.clone();

        assert!(!offer.track_event("not_a_real_event"));
        assert_eq!(offer.analytics, before);

        // The serialized counter set must not grow either.
        let json = serde_json::to_value(&offer.analytics).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_record_event_maps_storefront_events() {
        let mut offer = offer();

        offer.record_event(TrackedEvent::OfferView, 0.0);
        offer.record_event(TrackedEvent::OfferClick, 0.0);
        offer.record_event(TrackedEvent::PurchaseComplete, 59.9);
        offer.record_event(TrackedEvent::PurchaseComplete, 40.1);

        assert_eq!(offer.analytics.impressions, 1);
        assert_eq!(offer.analytics.clicks, 1);
        assert_eq!(offer.analytics.conversions, 2);
        assert_eq!(offer.analytics.revenue, 100.0);
    }

    #[test]
    fn test_record_event_neutral_events_touch_nothing() {
        let mut offer = offer();
        let before = offer.analytics.clone();

        offer.record_event(TrackedEvent::OfferApplied, 25.0);
        offer.record_event(TrackedEvent::CartUpdate, 25.0);

        assert_eq!(offer.analytics, before);
    }

    #[test]
    fn test_counter_field_keys_round_trip() {
        for field in [
            CounterField::Impressions,
            CounterField::Clicks,
            CounterField::Conversions,
            CounterField::Revenue,
        ] {
            assert_eq!(CounterField::from_key(field.key()), Some(field));
        }
        assert_eq!(CounterField::from_key("views"), None);
    }
}
