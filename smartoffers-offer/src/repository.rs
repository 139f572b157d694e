//! The interface the engine needs from its storage collaborator. The admin
//! API, storefront lookup and webhook handlers all talk to storage through
//! this trait; the engine itself performs no I/O.

use async_trait::async_trait;
use uuid::Uuid;

use smartoffers_shared::{AnalyticsEvent, EventFilters};

use crate::analytics::CounterField;
use crate::models::{Offer, OfferStatus, OfferType};

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Filter set for listing a shop's offers.
#[derive(Debug, Clone, Default)]
pub struct OfferFilters {
    pub shop_id: String,
    pub status: Option<OfferStatus>,
    pub offer_type: Option<OfferType>,
}

#[async_trait]
pub trait OfferRepository: Send + Sync {
    /// Persist a new offer. Storage assigns the id and both timestamps; the
    /// returned offer carries them.
    async fn create_offer(&self, offer: &Offer) -> RepoResult<Offer>;

    /// Fetch one offer, scoped to its owning shop.
    async fn get_offer(&self, id: Uuid, shop_id: &str) -> RepoResult<Option<Offer>>;

    async fn list_offers(&self, filters: &OfferFilters) -> RepoResult<Vec<Offer>>;

    /// Offers whose product scope contains the given product. Used by the
    /// storefront active-offers lookup.
    async fn offers_by_product(&self, product_id: &str, shop_id: &str) -> RepoResult<Vec<Offer>>;

    /// Replace an offer's stored document, refreshing `updated_at`. Returns
    /// the stored result, or `None` when the offer does not exist for the
    /// shop.
    async fn update_offer(&self, id: Uuid, offer: &Offer) -> RepoResult<Option<Offer>>;

    /// Status transition endpoint backing call.
    async fn set_status(
        &self,
        id: Uuid,
        shop_id: &str,
        status: OfferStatus,
    ) -> RepoResult<Option<Offer>>;

    /// Returns whether an offer was deleted.
    async fn delete_offer(&self, id: Uuid, shop_id: &str) -> RepoResult<bool>;

    /// Atomic counter increment, the system of record for analytics counts.
    /// The in-memory `Offer` counters are a snapshot; concurrent events on
    /// one offer are serialized here.
    async fn increment_counter(
        &self,
        id: Uuid,
        field: CounterField,
        amount: f64,
    ) -> RepoResult<()>;

    /// Whether another offer of the same shop collides with the candidate
    /// (shared products, overlapping schedule). `exclude` skips the offer
    /// being updated.
    async fn has_overlapping_offer(
        &self,
        candidate: &Offer,
        exclude: Option<Uuid>,
    ) -> RepoResult<bool>;

    async fn save_event(&self, event: &AnalyticsEvent) -> RepoResult<()>;

    async fn list_events(&self, filters: &EventFilters) -> RepoResult<Vec<AnalyticsEvent>>;

    /// Drop everything owned by a shop. Invoked from the app/uninstalled
    /// webhook.
    async fn delete_shop_data(&self, shop_id: &str) -> RepoResult<()>;
}
