//! In-memory `OfferRepository` used by tests and local development. Mirrors
//! the Postgres implementation's semantics, including shop scoping and the
//! serialized counter increment.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use smartoffers_offer::repository::{OfferFilters, OfferRepository, RepoResult};
use smartoffers_offer::{CounterField, Offer, OfferStatus};
use smartoffers_shared::{AnalyticsEvent, EventFilters};

#[derive(Default)]
pub struct InMemoryOfferRepository {
    offers: Mutex<HashMap<Uuid, Offer>>,
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl InMemoryOfferRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OfferRepository for InMemoryOfferRepository {
    async fn create_offer(&self, offer: &Offer) -> RepoResult<Offer> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut stored = offer.clone();
        stored.id = Some(id);
        stored.created_at = now;
        stored.updated_at = now;

        let mut offers = self.offers.lock().unwrap();
        offers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_offer(&self, id: Uuid, shop_id: &str) -> RepoResult<Option<Offer>> {
        let offers = self.offers.lock().unwrap();
        Ok(offers
            .get(&id)
            .filter(|offer| offer.shop_id == shop_id)
            .cloned())
    }

    async fn list_offers(&self, filters: &OfferFilters) -> RepoResult<Vec<Offer>> {
        let offers = self.offers.lock().unwrap();
        let mut result: Vec<Offer> = offers
            .values()
            .filter(|offer| offer.shop_id == filters.shop_id)
            .filter(|offer| filters.status.map_or(true, |s| offer.status == s))
            .filter(|offer| filters.offer_type.map_or(true, |t| offer.offer_type == Some(t)))
            .cloned()
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn offers_by_product(&self, product_id: &str, shop_id: &str) -> RepoResult<Vec<Offer>> {
        let offers = self.offers.lock().unwrap();
        Ok(offers
            .values()
            .filter(|offer| offer.shop_id == shop_id)
            .filter(|offer| offer.products.iter().any(|p| p == product_id))
            .cloned()
            .collect())
    }

    async fn update_offer(&self, id: Uuid, offer: &Offer) -> RepoResult<Option<Offer>> {
        let mut offers = self.offers.lock().unwrap();
        let Some(existing) = offers.get(&id).filter(|o| o.shop_id == offer.shop_id) else {
            return Ok(None);
        };

        let mut updated = offer.clone();
        updated.id = Some(id);
        updated.created_at = existing.created_at;
        updated.updated_at = Utc::now();
        offers.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn set_status(
        &self,
        id: Uuid,
        shop_id: &str,
        status: OfferStatus,
    ) -> RepoResult<Option<Offer>> {
        let mut offers = self.offers.lock().unwrap();
        let Some(offer) = offers.get_mut(&id).filter(|o| o.shop_id == shop_id) else {
            return Ok(None);
        };

        offer.status = status;
        offer.updated_at = Utc::now();
        Ok(Some(offer.clone()))
    }

    async fn delete_offer(&self, id: Uuid, shop_id: &str) -> RepoResult<bool> {
        let mut offers = self.offers.lock().unwrap();
        match offers.get(&id) {
            Some(offer) if offer.shop_id == shop_id => {
                offers.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_counter(
        &self,
        id: Uuid,
        field: CounterField,
        amount: f64,
    ) -> RepoResult<()> {
        let mut offers = self.offers.lock().unwrap();
        if let Some(offer) = offers.get_mut(&id) {
            match field {
                CounterField::Impressions => offer.analytics.impressions += amount as u64,
                CounterField::Clicks => offer.analytics.clicks += amount as u64,
                CounterField::Conversions => offer.analytics.conversions += amount as u64,
                CounterField::Revenue => offer.analytics.revenue += amount,
            }
            offer.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn has_overlapping_offer(
        &self,
        candidate: &Offer,
        exclude: Option<Uuid>,
    ) -> RepoResult<bool> {
        let offers = self.offers.lock().unwrap();
        Ok(offers
            .values()
            .filter(|other| other.id != exclude)
            .any(|other| candidate.overlaps_with(other)))
    }

    async fn save_event(&self, event: &AnalyticsEvent) -> RepoResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn list_events(&self, filters: &EventFilters) -> RepoResult<Vec<AnalyticsEvent>> {
        let events = self.events.lock().unwrap();
        let mut result: Vec<AnalyticsEvent> = events
            .iter()
            .filter(|event| filters.matches(event))
            .cloned()
            .collect();

        result.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(result)
    }

    async fn delete_shop_data(&self, shop_id: &str) -> RepoResult<()> {
        self.offers
            .lock()
            .unwrap()
            .retain(|_, offer| offer.shop_id != shop_id);
        self.events
            .lock()
            .unwrap()
            .retain(|event| event.shop_id != shop_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use smartoffers_offer::{DiscountType, OfferInput, OfferType, Tier};
    use smartoffers_shared::TrackedEvent;

    const SHOP: &str = "test-shop.myshopify.com";

    fn draft_offer(name: &str, products: &[&str]) -> Offer {
        Offer::from_input(OfferInput {
            shop_id: Some(SHOP.to_string()),
            offer_type: Some(OfferType::QuantityBreak),
            name: Some(name.to_string()),
            products: Some(products.iter().map(|p| p.to_string()).collect()),
            discount_type: Some(DiscountType::Percentage),
            tiers: Some(vec![Tier { quantity: 2, discount: 10.0 }]),
            ..Default::default()
        })
    }

    fn purchase_event(offer_id: Option<Uuid>, cart_value: f64) -> AnalyticsEvent {
        AnalyticsEvent {
            event_name: TrackedEvent::PurchaseComplete,
            offer_id,
            product_id: Some("prod-1".to_string()),
            cart_value: Some(cart_value),
            currency: Some("USD".to_string()),
            metadata: serde_json::json!({"orderId": 1001}),
            timestamp: Utc::now(),
            shop_id: SHOP.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let repo = InMemoryOfferRepository::new();
        let created = repo
            .create_offer(&draft_offer("A", &["prod-1"]))
            .await
            .unwrap();

        let id = created.id.expect("storage assigns an id");
        let fetched = repo.get_offer(id, SHOP).await.unwrap().unwrap();
        assert_eq!(fetched.name, "A");
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_shop_scoping_hides_foreign_offers() {
        let repo = InMemoryOfferRepository::new();
        let created = repo
            .create_offer(&draft_offer("A", &["prod-1"]))
            .await
            .unwrap();
        let id = created.id.unwrap();

        assert!(repo
            .get_offer(id, "other-shop.myshopify.com")
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete_offer(id, "other-shop.myshopify.com").await.unwrap());
        assert!(repo.get_offer(id, SHOP).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_offers_filters_by_status_and_type() {
        let repo = InMemoryOfferRepository::new();
        let a = repo
            .create_offer(&draft_offer("A", &["prod-1"]))
            .await
            .unwrap();
        repo.create_offer(&draft_offer("B", &["prod-2"]))
            .await
            .unwrap();
        repo.set_status(a.id.unwrap(), SHOP, OfferStatus::Active)
            .await
            .unwrap();

        let active = repo
            .list_offers(&OfferFilters {
                shop_id: SHOP.to_string(),
                status: Some(OfferStatus::Active),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "A");

        let quantity_breaks = repo
            .list_offers(&OfferFilters {
                shop_id: SHOP.to_string(),
                offer_type: Some(OfferType::QuantityBreak),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(quantity_breaks.len(), 2);
    }

    #[tokio::test]
    async fn test_offers_by_product() {
        let repo = InMemoryOfferRepository::new();
        repo.create_offer(&draft_offer("A", &["prod-1", "prod-2"]))
            .await
            .unwrap();
        repo.create_offer(&draft_offer("B", &["prod-3"]))
            .await
            .unwrap();

        let for_prod_2 = repo.offers_by_product("prod-2", SHOP).await.unwrap();
        assert_eq!(for_prod_2.len(), 1);
        assert_eq!(for_prod_2[0].name, "A");
    }

    #[tokio::test]
    async fn test_update_preserves_identity() {
        let repo = InMemoryOfferRepository::new();
        let created = repo
            .create_offer(&draft_offer("A", &["prod-1"]))
            .await
            .unwrap();
        let id = created.id.unwrap();

        let mut revised = created.clone();
        revised.name = "A (renamed)".to_string();
        let saved = repo.update_offer(id, &revised).await.unwrap().unwrap();

        assert_eq!(saved.id, Some(id));
        assert_eq!(saved.name, "A (renamed)");
        assert_eq!(saved.created_at, created.created_at);

        assert!(repo
            .update_offer(Uuid::new_v4(), &revised)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_increment_counter_is_the_system_of_record() {
        let repo = InMemoryOfferRepository::new();
        let created = repo
            .create_offer(&draft_offer("A", &["prod-1"]))
            .await
            .unwrap();
        let id = created.id.unwrap();

        repo.increment_counter(id, CounterField::Impressions, 1.0)
            .await
            .unwrap();
        repo.increment_counter(id, CounterField::Impressions, 1.0)
            .await
            .unwrap();
        repo.increment_counter(id, CounterField::Conversions, 1.0)
            .await
            .unwrap();
        repo.increment_counter(id, CounterField::Revenue, 149.5)
            .await
            .unwrap();

        let stored = repo.get_offer(id, SHOP).await.unwrap().unwrap();
        assert_eq!(stored.analytics.impressions, 2);
        assert_eq!(stored.analytics.conversions, 1);
        assert_eq!(stored.analytics.revenue, 149.5);

        // Unknown offer: silently absorbed, like the SQL UPDATE matching no
        // rows.
        repo.increment_counter(Uuid::new_v4(), CounterField::Clicks, 1.0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_overlap_detection_with_exclusion() {
        let repo = InMemoryOfferRepository::new();
        let existing = repo
            .create_offer(&draft_offer("A", &["prod-1"]))
            .await
            .unwrap();

        let candidate = draft_offer("B", &["prod-1"]);
        assert!(repo.has_overlapping_offer(&candidate, None).await.unwrap());

        // Updating the existing offer must not collide with itself.
        assert!(!repo
            .has_overlapping_offer(&existing, existing.id)
            .await
            .unwrap());

        let disjoint = draft_offer("C", &["prod-9"]);
        assert!(!repo.has_overlapping_offer(&disjoint, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_events_round_trip_with_filters() {
        let repo = InMemoryOfferRepository::new();
        let offer_id = Uuid::new_v4();

        repo.save_event(&purchase_event(Some(offer_id), 100.0))
            .await
            .unwrap();
        repo.save_event(&purchase_event(None, 25.0)).await.unwrap();

        let all = repo
            .list_events(&EventFilters {
                shop_id: Some(SHOP.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let for_offer = repo
            .list_events(&EventFilters {
                offer_id: Some(offer_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_offer.len(), 1);
        assert_eq!(for_offer[0].cart_value, Some(100.0));

        let stale = repo
            .list_events(&EventFilters {
                end_date: Some(Utc::now() - Duration::days(1)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(stale.is_empty());
    }

    #[tokio::test]
    async fn test_delete_shop_data_removes_everything() {
        let repo = InMemoryOfferRepository::new();
        repo.create_offer(&draft_offer("A", &["prod-1"]))
            .await
            .unwrap();
        repo.save_event(&purchase_event(None, 10.0)).await.unwrap();

        let mut foreign = draft_offer("Other", &["prod-1"]);
        foreign.shop_id = "other-shop.myshopify.com".to_string();
        repo.create_offer(&foreign).await.unwrap();

        repo.delete_shop_data(SHOP).await.unwrap();

        let remaining = repo
            .list_offers(&OfferFilters {
                shop_id: SHOP.to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(remaining.is_empty());
        assert!(repo
            .list_events(&EventFilters::default())
            .await
            .unwrap()
            .is_empty());

        let untouched = repo
            .list_offers(&OfferFilters {
                shop_id: "other-shop.myshopify.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(untouched.len(), 1);
    }
}
