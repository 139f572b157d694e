//! Aggregation of stored analytics events into the metrics the admin
//! dashboard and per-offer analytics views render.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use smartoffers_shared::{AnalyticsEvent, TrackedEvent};

use crate::models::Offer;

/// Dashboard reporting window. Parsed from the `period` query parameter;
/// anything unrecognized falls back to 30 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardPeriod {
    Last7Days,
    #[default]
    Last30Days,
    Last90Days,
}

impl DashboardPeriod {
    pub fn parse(s: &str) -> Self {
        match s {
            "7d" => DashboardPeriod::Last7Days,
            "90d" => DashboardPeriod::Last90Days,
            _ => DashboardPeriod::Last30Days,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            DashboardPeriod::Last7Days => 7,
            DashboardPeriod::Last30Days => 30,
            DashboardPeriod::Last90Days => 90,
        }
    }

    pub fn start_from(&self, end: DateTime<Utc>) -> DateTime<Utc> {
        end - Duration::days(self.days())
    }
}

/// Metrics for one offer over a set of events.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferMetrics {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: f64,
    pub click_through_rate: f64,
    pub conversion_rate: f64,
    pub average_order_value: f64,
}

impl OfferMetrics {
    pub fn from_events(events: &[AnalyticsEvent]) -> Self {
        let mut metrics = Self::default();

        for event in events {
            match event.event_name {
                TrackedEvent::OfferView => metrics.impressions += 1,
                TrackedEvent::OfferClick => metrics.clicks += 1,
                TrackedEvent::PurchaseComplete => {
                    metrics.conversions += 1;
                    metrics.revenue += event.cart_value.unwrap_or(0.0);
                }
                TrackedEvent::OfferApplied | TrackedEvent::CartUpdate => {}
            }
        }

        if metrics.impressions > 0 {
            metrics.click_through_rate =
                (metrics.clicks as f64 / metrics.impressions as f64) * 100.0;
            metrics.conversion_rate =
                (metrics.conversions as f64 / metrics.impressions as f64) * 100.0;
        }

        if metrics.conversions > 0 {
            metrics.average_order_value = metrics.revenue / metrics.conversions as f64;
        }

        metrics
    }
}

/// One row of the dashboard's top-offers table.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferPerformance {
    pub offer_id: Uuid,
    pub offer_name: String,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: f64,
    pub conversion_rate: f64,
}

/// Shop-wide dashboard summary over a reporting period.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_offers: usize,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_conversions: u64,
    pub total_revenue: f64,
    pub conversion_rate: f64,
    pub click_through_rate: f64,
    pub average_order_value: f64,
    pub top_performing_offers: Vec<OfferPerformance>,
}

impl DashboardSummary {
    /// Aggregate events across a shop. `offers` is the shop's offer list,
    /// used for the headline count and to resolve names in the top-offers
    /// table; events referencing a deleted offer report as "Unknown".
    pub fn build(offers: &[Offer], events: &[AnalyticsEvent]) -> Self {
        let totals = OfferMetrics::from_events(events);

        let mut per_offer: HashMap<Uuid, OfferMetrics> = HashMap::new();
        for event in events {
            if let Some(offer_id) = event.offer_id {
                let entry = per_offer.entry(offer_id).or_default();
                match event.event_name {
                    TrackedEvent::OfferView => entry.impressions += 1,
                    TrackedEvent::OfferClick => entry.clicks += 1,
                    TrackedEvent::PurchaseComplete => {
                        entry.conversions += 1;
                        entry.revenue += event.cart_value.unwrap_or(0.0);
                    }
                    TrackedEvent::OfferApplied | TrackedEvent::CartUpdate => {}
                }
            }
        }

        let mut top: Vec<OfferPerformance> = per_offer
            .into_iter()
            .map(|(offer_id, stats)| {
                let offer_name = offers
                    .iter()
                    .find(|o| o.id == Some(offer_id))
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                let conversion_rate = if stats.impressions > 0 {
                    (stats.conversions as f64 / stats.impressions as f64) * 100.0
                } else {
                    0.0
                };
                OfferPerformance {
                    offer_id,
                    offer_name,
                    impressions: stats.impressions,
                    clicks: stats.clicks,
                    conversions: stats.conversions,
                    revenue: stats.revenue,
                    conversion_rate,
                }
            })
            .collect();

        top.sort_by(|a, b| {
            b.revenue
                .partial_cmp(&a.revenue)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        top.truncate(5);

        Self {
            total_offers: offers.len(),
            total_impressions: totals.impressions,
            total_clicks: totals.clicks,
            total_conversions: totals.conversions,
            total_revenue: totals.revenue,
            conversion_rate: totals.conversion_rate,
            click_through_rate: totals.click_through_rate,
            average_order_value: totals.average_order_value,
            top_performing_offers: top,
        }
    }
}

/// Render events as the CSV document served by the analytics export.
pub fn export_csv(events: &[AnalyticsEvent]) -> String {
    let mut lines = vec!["Date,Event,Offer ID,Product ID,Cart Value,Currency".to_string()];

    for event in events {
        let row = [
            event.timestamp.to_rfc3339(),
            event.event_name.to_string(),
            event
                .offer_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            event.product_id.clone().unwrap_or_default(),
            event
                .cart_value
                .map(|v| v.to_string())
                .unwrap_or_default(),
            event.currency.clone().unwrap_or_default(),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}
