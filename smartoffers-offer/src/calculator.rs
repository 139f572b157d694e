//! Discount calculation. Pure functions over the offer configuration and the
//! caller-supplied cart state; no I/O and no mutation.

use crate::models::{CartItem, DiscountType, Offer, OfferType};

impl Offer {
    /// Compute the discount amount for the given quantity and cart.
    ///
    /// Percentage quantity-break results are the percentage number itself
    /// (15 = 15%), applied by the caller as `price * qty * pct / 100`.
    /// Cross-sell and cart-upsell offers are presentation-only and never
    /// produce a locally computed discount.
    pub fn calculate_discount(&self, quantity: u32, cart_items: &[CartItem]) -> f64 {
        match self.offer_type {
            Some(OfferType::QuantityBreak) => self.quantity_break_discount(quantity),
            Some(OfferType::VolumeDiscount) => self.volume_discount(cart_items),
            Some(OfferType::Bundle) => self.bundle_discount(cart_items),
            Some(OfferType::CrossSell) | Some(OfferType::CartUpsell) | None => 0.0,
        }
    }

    /// Best-tier-wins selection: the highest satisfied threshold applies,
    /// regardless of the order tiers were configured in.
    pub fn quantity_break_discount(&self, quantity: u32) -> f64 {
        // Sort a copy descending; the configured order is display order and
        // must not change.
        let mut sorted = self.tiers.clone();
        sorted.sort_by(|a, b| b.quantity.cmp(&a.quantity));

        let Some(tier) = sorted.iter().find(|tier| quantity >= tier.quantity) else {
            return 0.0;
        };

        match self.discount_type {
            Some(DiscountType::Percentage) => tier.discount,
            // Fixed-amount tiers are per-unit: the discount scales with the
            // purchased quantity.
            Some(DiscountType::FixedAmount) => tier.discount * f64::from(quantity),
            _ => 0.0,
        }
    }

    /// Aggregate the quantity of every scoped cart line, then apply the
    /// quantity-break tiers to the total. Cross-product volume counts toward
    /// a single tier table.
    pub fn volume_discount(&self, cart_items: &[CartItem]) -> f64 {
        let total_quantity: u32 = cart_items
            .iter()
            .filter(|item| self.products.contains(&item.product_id))
            .map(|item| item.quantity)
            .sum();

        self.quantity_break_discount(total_quantity)
    }

    /// Bundle threshold is counted in distinct scoped line items, not summed
    /// quantity. Below `min_items` there is no discount.
    pub fn bundle_discount(&self, cart_items: &[CartItem]) -> f64 {
        let bundle_items: Vec<&CartItem> = cart_items
            .iter()
            .filter(|item| self.products.contains(&item.product_id))
            .collect();

        if (bundle_items.len() as u32) < self.bundle_config.min_items {
            return 0.0;
        }

        let subtotal: f64 = bundle_items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum();

        match self.discount_type {
            Some(DiscountType::Percentage) => subtotal * self.discount_value / 100.0,
            Some(DiscountType::FixedAmount) => self.discount_value,
            _ => 0.0,
        }
    }
}
