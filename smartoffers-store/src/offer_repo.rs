use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use tracing::warn;
use uuid::Uuid;

use smartoffers_offer::repository::{OfferFilters, OfferRepository, RepoResult};
use smartoffers_offer::{CounterField, Offer, OfferStatus};
use smartoffers_shared::{AnalyticsEvent, EventFilters};

pub struct PostgresOfferRepository {
    pub pool: PgPool,
}

impl PostgresOfferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn offer_from_row(row: &PgRow) -> Result<Offer, sqlx::Error> {
    let offer_type: Option<String> = row.try_get("type")?;
    let discount_type: Option<String> = row.try_get("discount_type")?;
    let status: String = row.try_get("status")?;

    Ok(Offer {
        id: Some(row.try_get("id")?),
        shop_id: row.try_get("shop_id")?,
        offer_type: offer_type.and_then(|s| s.parse().ok()),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        status: status.parse().unwrap_or(OfferStatus::Draft),
        products: from_json_column(row, "products"),
        collections: from_json_column(row, "collections"),
        discount_type: discount_type.and_then(|s| s.parse().ok()),
        discount_value: row.try_get("discount_value")?,
        tiers: from_json_column(row, "tiers"),
        bundle_config: from_json_column(row, "bundle_config"),
        free_gift: from_json_column(row, "free_gift"),
        display_settings: from_json_column(row, "display_settings"),
        styling: from_json_column(row, "styling"),
        schedule: from_json_column(row, "schedule"),
        targeting: from_json_column(row, "targeting"),
        analytics: from_json_column(row, "analytics"),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Decode a JSONB column, falling back to the documented default when the
/// stored document predates the field.
fn from_json_column<T: serde::de::DeserializeOwned + Default>(row: &PgRow, column: &str) -> T {
    row.try_get::<serde_json::Value, _>(column)
        .ok()
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default()
}

fn event_from_row(row: &PgRow) -> Result<Option<AnalyticsEvent>, sqlx::Error> {
    let name: String = row.try_get("event_name")?;
    let Ok(event_name) = name.parse() else {
        warn!("Skipping stored event with unknown name: {}", name);
        return Ok(None);
    };

    Ok(Some(AnalyticsEvent {
        event_name,
        offer_id: row.try_get("offer_id")?,
        product_id: row.try_get("product_id")?,
        cart_value: row.try_get("cart_value")?,
        currency: row.try_get("currency")?,
        metadata: row.try_get("metadata")?,
        timestamp: row.try_get("timestamp")?,
        shop_id: row.try_get("shop_id")?,
    }))
}

fn json(value: &impl serde::Serialize) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_default()
}

#[async_trait]
impl OfferRepository for PostgresOfferRepository {
    async fn create_offer(&self, offer: &Offer) -> RepoResult<Offer> {
        let row = sqlx::query(
            r#"
            INSERT INTO offers (shop_id, type, name, description, status, products, collections,
                discount_type, discount_value, tiers, bundle_config, free_gift, display_settings,
                styling, schedule, targeting, analytics, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(&offer.shop_id)
        .bind(offer.offer_type.map(|t| t.as_str()))
        .bind(&offer.name)
        .bind(&offer.description)
        .bind(offer.status.as_str())
        .bind(json(&offer.products))
        .bind(json(&offer.collections))
        .bind(offer.discount_type.map(|t| t.as_str()))
        .bind(offer.discount_value)
        .bind(json(&offer.tiers))
        .bind(json(&offer.bundle_config))
        .bind(json(&offer.free_gift))
        .bind(json(&offer.display_settings))
        .bind(json(&offer.styling))
        .bind(json(&offer.schedule))
        .bind(json(&offer.targeting))
        .bind(json(&offer.analytics))
        .fetch_one(&self.pool)
        .await?;

        Ok(offer_from_row(&row)?)
    }

    async fn get_offer(&self, id: Uuid, shop_id: &str) -> RepoResult<Option<Offer>> {
        let row = sqlx::query("SELECT * FROM offers WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(offer_from_row).transpose()?)
    }

    async fn list_offers(&self, filters: &OfferFilters) -> RepoResult<Vec<Offer>> {
        let mut builder = QueryBuilder::new("SELECT * FROM offers WHERE shop_id = ");
        builder.push_bind(&filters.shop_id);

        if let Some(status) = filters.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }

        if let Some(offer_type) = filters.offer_type {
            builder.push(" AND type = ");
            builder.push_bind(offer_type.as_str());
        }

        builder.push(" ORDER BY created_at DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut offers = Vec::with_capacity(rows.len());
        for row in &rows {
            offers.push(offer_from_row(row)?);
        }
        Ok(offers)
    }

    async fn offers_by_product(&self, product_id: &str, shop_id: &str) -> RepoResult<Vec<Offer>> {
        // `?` is the JSONB "array contains string" operator, not a
        // placeholder.
        let rows = sqlx::query("SELECT * FROM offers WHERE shop_id = $1 AND products ? $2")
            .bind(shop_id)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        let mut offers = Vec::with_capacity(rows.len());
        for row in &rows {
            offers.push(offer_from_row(row)?);
        }
        Ok(offers)
    }

    async fn update_offer(&self, id: Uuid, offer: &Offer) -> RepoResult<Option<Offer>> {
        let row = sqlx::query(
            r#"
            UPDATE offers
            SET type = $3, name = $4, description = $5, status = $6, products = $7,
                collections = $8, discount_type = $9, discount_value = $10, tiers = $11,
                bundle_config = $12, free_gift = $13, display_settings = $14, styling = $15,
                schedule = $16, targeting = $17, analytics = $18, updated_at = NOW()
            WHERE id = $1 AND shop_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&offer.shop_id)
        .bind(offer.offer_type.map(|t| t.as_str()))
        .bind(&offer.name)
        .bind(&offer.description)
        .bind(offer.status.as_str())
        .bind(json(&offer.products))
        .bind(json(&offer.collections))
        .bind(offer.discount_type.map(|t| t.as_str()))
        .bind(offer.discount_value)
        .bind(json(&offer.tiers))
        .bind(json(&offer.bundle_config))
        .bind(json(&offer.free_gift))
        .bind(json(&offer.display_settings))
        .bind(json(&offer.styling))
        .bind(json(&offer.schedule))
        .bind(json(&offer.targeting))
        .bind(json(&offer.analytics))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(offer_from_row).transpose()?)
    }

    async fn set_status(
        &self,
        id: Uuid,
        shop_id: &str,
        status: OfferStatus,
    ) -> RepoResult<Option<Offer>> {
        let row = sqlx::query(
            "UPDATE offers SET status = $3, updated_at = NOW() WHERE id = $1 AND shop_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(shop_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(offer_from_row).transpose()?)
    }

    async fn delete_offer(&self, id: Uuid, shop_id: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1 AND shop_id = $2")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_counter(
        &self,
        id: Uuid,
        field: CounterField,
        amount: f64,
    ) -> RepoResult<()> {
        // Single-statement read-modify-write; concurrent events on one offer
        // serialize on the row lock.
        sqlx::query(
            r#"
            UPDATE offers
            SET analytics = jsonb_set(
                    analytics,
                    ARRAY[$2],
                    to_jsonb(COALESCE((analytics->>$2)::double precision, 0) + $3)
                ),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(field.key())
        .bind(amount)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn has_overlapping_offer(
        &self,
        candidate: &Offer,
        exclude: Option<Uuid>,
    ) -> RepoResult<bool> {
        let existing = self
            .list_offers(&OfferFilters {
                shop_id: candidate.shop_id.clone(),
                ..Default::default()
            })
            .await?;

        Ok(existing
            .iter()
            .filter(|other| other.id != exclude)
            .any(|other| candidate.overlaps_with(other)))
    }

    async fn save_event(&self, event: &AnalyticsEvent) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO analytics_events (shop_id, event_name, offer_id, product_id, cart_value, currency, metadata, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&event.shop_id)
        .bind(event.event_name.as_str())
        .bind(event.offer_id)
        .bind(&event.product_id)
        .bind(event.cart_value)
        .bind(&event.currency)
        .bind(&event.metadata)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_events(&self, filters: &EventFilters) -> RepoResult<Vec<AnalyticsEvent>> {
        let mut builder = QueryBuilder::new("SELECT * FROM analytics_events WHERE 1 = 1");

        if let Some(shop_id) = &filters.shop_id {
            builder.push(" AND shop_id = ");
            builder.push_bind(shop_id);
        }
        if let Some(offer_id) = filters.offer_id {
            builder.push(" AND offer_id = ");
            builder.push_bind(offer_id);
        }
        if let Some(offer_ids) = &filters.offer_ids {
            builder.push(" AND offer_id = ANY(");
            builder.push_bind(offer_ids.clone());
            builder.push(")");
        }
        if let Some(start) = filters.start_date {
            builder.push(" AND timestamp >= ");
            builder.push_bind(start);
        }
        if let Some(end) = filters.end_date {
            builder.push(" AND timestamp <= ");
            builder.push_bind(end);
        }

        builder.push(" ORDER BY timestamp DESC");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(event) = event_from_row(row)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    async fn delete_shop_data(&self, shop_id: &str) -> RepoResult<()> {
        let offers = sqlx::query("DELETE FROM offers WHERE shop_id = $1")
            .bind(shop_id)
            .execute(&self.pool)
            .await?;
        let events = sqlx::query("DELETE FROM analytics_events WHERE shop_id = $1")
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        tracing::info!(
            "Deleted shop data for {}: {} offers, {} events",
            shop_id,
            offers.rows_affected(),
            events.rows_affected()
        );
        Ok(())
    }
}
