//! Eligibility gating: whether an offer should be shown or applied given
//! status, schedule, targeting and the current cart.

use chrono::{DateTime, Utc};

use crate::models::{CartItem, Offer, OfferStatus};

impl Offer {
    /// Whether the storefront widget should render this offer for the given
    /// cart. All conditions are AND'ed, cheapest first.
    pub fn should_display(&self, cart_items: &[CartItem], customer_segment: Option<&str>) -> bool {
        if self.status != OfferStatus::Active {
            return false;
        }

        if !self.is_within_schedule() {
            return false;
        }

        // An empty customer_groups list means no restriction, even when a
        // segment was supplied.
        if let Some(segment) = customer_segment {
            if !self.targeting.customer_groups.is_empty()
                && !self.targeting.customer_groups.iter().any(|g| g == segment)
            {
                return false;
            }
        }

        cart_items.iter().any(|item| self.in_scope(item))
    }

    /// Whether a cart line falls within the offer's product or collection
    /// scope.
    fn in_scope(&self, item: &CartItem) -> bool {
        if self.products.contains(&item.product_id) {
            return true;
        }

        match &item.collections {
            Some(item_collections) => self
                .collections
                .iter()
                .any(|col| item_collections.contains(col)),
            None => false,
        }
    }

    /// Schedule check against the wall clock.
    pub fn is_within_schedule(&self) -> bool {
        self.is_within_schedule_at(Utc::now())
    }

    /// Schedule check against an explicit instant. Comparisons are strict:
    /// an instant exactly equal to the start or end bound is in range.
    pub fn is_within_schedule_at(&self, now: DateTime<Utc>) -> bool {
        if let Some(start) = self.schedule.start_date {
            if start > now {
                return false;
            }
        }

        if let Some(end) = self.schedule.end_date {
            if end < now {
                return false;
            }
        }

        true
    }

    /// Whether two offers collide: same shop, intersecting product scope and
    /// overlapping schedule windows. Used by the admin layer to reject a
    /// second offer on the same products for the same period.
    pub fn overlaps_with(&self, other: &Offer) -> bool {
        if self.shop_id != other.shop_id {
            return false;
        }

        let shares_product = self
            .products
            .iter()
            .any(|p| other.products.contains(p));
        if !shares_product {
            return false;
        }

        schedules_overlap(&self.schedule, &other.schedule)
    }
}

/// Two windows overlap unless one ends before the other starts. Unset bounds
/// are open-ended.
fn schedules_overlap(a: &crate::models::Schedule, b: &crate::models::Schedule) -> bool {
    if let (Some(a_end), Some(b_start)) = (a.end_date, b.start_date) {
        if a_end < b_start {
            return false;
        }
    }

    if let (Some(b_end), Some(a_start)) = (b.end_date, a.start_date) {
        if b_end < a_start {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::models::{DiscountType, OfferInput, OfferType, Schedule, Targeting, Tier};

    fn item(product_id: &str) -> CartItem {
        CartItem {
            product_id: product_id.to_string(),
            quantity: 1,
            price: 10.0,
            collections: None,
        }
    }

    fn active_offer() -> Offer {
        Offer::from_input(OfferInput {
            shop_id: Some("test-shop.myshopify.com".to_string()),
            offer_type: Some(OfferType::QuantityBreak),
            name: Some("Buy More Save More".to_string()),
            status: Some(OfferStatus::Active),
            products: Some(vec!["prod-1".to_string()]),
            collections: Some(vec!["col-1".to_string()]),
            discount_type: Some(DiscountType::Percentage),
            tiers: Some(vec![Tier { quantity: 2, discount: 10.0 }]),
            ..Default::default()
        })
    }

    #[test]
    fn test_only_active_offers_display() {
        let cart = vec![item("prod-1")];

        for status in [OfferStatus::Draft, OfferStatus::Paused, OfferStatus::Scheduled] {
            let mut offer = active_offer();
            offer.status = status;
            assert!(!offer.should_display(&cart, None), "{status:?} displayed");
        }

        assert!(active_offer().should_display(&cart, None));
    }

    #[test]
    fn test_requires_scoped_product_in_cart() {
        let offer = active_offer();

        assert!(!offer.should_display(&[], None));
        assert!(!offer.should_display(&[item("other")], None));
        assert!(offer.should_display(&[item("other"), item("prod-1")], None));
    }

    #[test]
    fn test_collection_scope_matches_cart_item_collections() {
        let offer = active_offer();

        let mut in_collection = item("other");
        in_collection.collections = Some(vec!["col-1".to_string(), "col-9".to_string()]);
        assert!(offer.should_display(&[in_collection], None));

        let mut elsewhere = item("other");
        elsewhere.collections = Some(vec!["col-9".to_string()]);
        assert!(!offer.should_display(&[elsewhere], None));
    }

    #[test]
    fn test_segment_targeting() {
        let mut offer = active_offer();
        offer.targeting = Targeting {
            customer_groups: vec!["vip".to_string()],
            ..Default::default()
        };
        let cart = vec![item("prod-1")];

        assert!(offer.should_display(&cart, Some("vip")));
        assert!(!offer.should_display(&cart, Some("retail")));
        // No segment supplied: targeting is not evaluated.
        assert!(offer.should_display(&cart, None));

        // Empty groups means unrestricted even with a segment present.
        offer.targeting.customer_groups.clear();
        assert!(offer.should_display(&cart, Some("retail")));
    }

    #[test]
    fn test_expired_offer_never_displays() {
        let mut offer = active_offer();
        offer.schedule.end_date = Some(Utc::now() - Duration::hours(1));

        assert!(!offer.is_within_schedule());
        assert!(!offer.should_display(&[item("prod-1")], None));
    }

    #[test]
    fn test_future_start_blocks_display() {
        let mut offer = active_offer();
        offer.schedule.start_date = Some(Utc::now() + Duration::hours(1));

        assert!(!offer.is_within_schedule());
        assert!(!offer.should_display(&[item("prod-1")], None));
    }

    #[test]
    fn test_schedule_bounds_are_inclusive() {
        let now = Utc::now();
        let mut offer = active_offer();
        offer.schedule = Schedule {
            start_date: Some(now),
            end_date: Some(now),
            timezone: "UTC".to_string(),
        };

        // Strict comparisons: an instant equal to either bound is inside.
        assert!(offer.is_within_schedule_at(now));
        assert!(!offer.is_within_schedule_at(now - Duration::seconds(1)));
        assert!(!offer.is_within_schedule_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_unset_bounds_impose_no_constraint() {
        let offer = active_offer();
        assert!(offer.is_within_schedule_at(Utc::now() - Duration::days(365)));
        assert!(offer.is_within_schedule_at(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn test_overlap_requires_shared_products() {
        let a = active_offer();
        let mut b = active_offer();

        assert!(a.overlaps_with(&b));

        b.products = vec!["prod-2".to_string()];
        assert!(!a.overlaps_with(&b));
    }

    #[test]
    fn test_overlap_respects_disjoint_schedules() {
        let now = Utc::now();
        let mut a = active_offer();
        a.schedule.start_date = Some(now - Duration::days(10));
        a.schedule.end_date = Some(now - Duration::days(5));

        let mut b = active_offer();
        b.schedule.start_date = Some(now - Duration::days(4));
        b.schedule.end_date = Some(now);
        assert!(!a.overlaps_with(&b));

        // Touching windows count as overlapping.
        b.schedule.start_date = Some(now - Duration::days(5));
        assert!(a.overlaps_with(&b));

        // Open-ended window overlaps everything after its start.
        b.schedule.end_date = None;
        assert!(a.overlaps_with(&b));
    }

    #[test]
    fn test_overlap_ignores_other_shops() {
        let a = active_offer();
        let mut b = active_offer();
        b.shop_id = "another-shop.myshopify.com".to_string();
        assert!(!a.overlaps_with(&b));
    }
}
