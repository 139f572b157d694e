pub mod analytics;
pub mod calculator;
pub mod eligibility;
pub mod models;
pub mod reporting;
pub mod repository;

pub use analytics::CounterField;
pub use models::{
    AnalyticsCounters, BundleConfig, CartItem, DiscountType, DisplaySettings, FreeGift, Offer,
    OfferInput, OfferStatus, OfferType, Schedule, Styling, Targeting, Tier, ValidationReport,
};
pub use reporting::{export_csv, DashboardPeriod, DashboardSummary, OfferMetrics, OfferPerformance};
pub use repository::{OfferFilters, OfferRepository};
