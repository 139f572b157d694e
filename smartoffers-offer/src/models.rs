use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offer type. Closed set; the calculator dispatch matches exhaustively so a
/// new variant cannot be added without deciding its discount semantics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    QuantityBreak,
    Bundle,
    VolumeDiscount,
    CrossSell,
    CartUpsell,
}

impl OfferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferType::QuantityBreak => "quantity_break",
            OfferType::Bundle => "bundle",
            OfferType::VolumeDiscount => "volume_discount",
            OfferType::CrossSell => "cross_sell",
            OfferType::CartUpsell => "cart_upsell",
        }
    }
}

impl std::str::FromStr for OfferType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quantity_break" => Ok(OfferType::QuantityBreak),
            "bundle" => Ok(OfferType::Bundle),
            "volume_discount" => Ok(OfferType::VolumeDiscount),
            "cross_sell" => Ok(OfferType::CrossSell),
            "cart_upsell" => Ok(OfferType::CartUpsell),
            other => Err(ParseEnumError::OfferType(other.to_string())),
        }
    }
}

/// Offer lifecycle status. Only `Active` offers display or apply discounts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Scheduled,
}

impl OfferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferStatus::Draft => "draft",
            OfferStatus::Active => "active",
            OfferStatus::Paused => "paused",
            OfferStatus::Scheduled => "scheduled",
        }
    }
}

impl std::str::FromStr for OfferStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OfferStatus::Draft),
            "active" => Ok(OfferStatus::Active),
            "paused" => Ok(OfferStatus::Paused),
            "scheduled" => Ok(OfferStatus::Scheduled),
            other => Err(ParseEnumError::Status(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
    FreeGift,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::FixedAmount => "fixed_amount",
            DiscountType::FreeGift => "free_gift",
        }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed_amount" => Ok(DiscountType::FixedAmount),
            "free_gift" => Ok(DiscountType::FreeGift),
            other => Err(ParseEnumError::DiscountType(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseEnumError {
    #[error("Invalid offer type: {0}")]
    OfferType(String),

    #[error("Invalid status: {0}")]
    Status(String),

    #[error("Invalid discount type: {0}")]
    DiscountType(String),
}

/// One quantity-break tier: buy at least `quantity`, get `discount`.
///
/// Percentage offers store the percentage number itself (15 = 15%); fixed
/// amount offers store the per-unit amount. No strictly-increasing order is
/// enforced across a tier list; tier selection sorts a copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tier {
    pub quantity: u32,
    pub discount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleConfig {
    pub min_items: u32,
    pub max_items: Option<u32>,
    pub allow_mix_match: bool,
    pub required_products: Vec<String>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            min_items: 1,
            max_items: None,
            allow_mix_match: false,
            required_products: Vec::new(),
        }
    }
}

/// Free-gift augmentation. Pass-through configuration; the calculator does
/// not act on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FreeGift {
    pub enabled: bool,
    pub product_id: Option<String>,
    pub variant_id: Option<String>,
    pub threshold: Option<f64>,
}

/// Widget presentation settings. Opaque to the engine, carried for the
/// storefront renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplaySettings {
    pub widget: String,
    pub position: String,
    pub show_progress_bar: bool,
    pub show_savings: bool,
    pub custom_css: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            widget: "inline".to_string(),
            position: "below_atc".to_string(),
            show_progress_bar: true,
            show_savings: true,
            custom_css: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Styling {
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    pub border_radius: String,
    pub button_style: String,
}

impl Default for Styling {
    fn default() -> Self {
        Self {
            primary_color: "#000000".to_string(),
            secondary_color: "#ffffff".to_string(),
            font_family: "inherit".to_string(),
            border_radius: "4px".to_string(),
            button_style: "solid".to_string(),
        }
    }
}

/// Optional activation window. Unset bounds impose no constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Schedule {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub timezone: String,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Targeting {
    pub customer_groups: Vec<String>,
    pub countries: Vec<String>,
    pub exclude_products: Vec<String>,
}

/// Monotonic per-offer counters. The in-memory copy is a read-mostly
/// snapshot; the storage layer owns the atomic increment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsCounters {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: f64,
}

/// One cart line as supplied by the storefront widget. Consumed only, never
/// persisted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
    pub price: f64,
    #[serde(default)]
    pub collections: Option<Vec<String>>,
}

/// A configured promotion: quantity break, bundle, volume discount,
/// cross-sell or cart upsell, scoped to products/collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Offer {
    /// Assigned by storage on creation.
    pub id: Option<Uuid>,
    pub shop_id: String,
    #[serde(rename = "type")]
    pub offer_type: Option<OfferType>,
    pub name: String,
    pub description: String,
    pub status: OfferStatus,
    pub products: Vec<String>,
    pub collections: Vec<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: f64,
    pub tiers: Vec<Tier>,
    pub bundle_config: BundleConfig,
    pub free_gift: FreeGift,
    pub display_settings: DisplaySettings,
    pub styling: Styling,
    pub schedule: Schedule,
    pub targeting: Targeting,
    pub analytics: AnalyticsCounters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Offer {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: None,
            shop_id: String::new(),
            offer_type: None,
            name: String::new(),
            description: String::new(),
            status: OfferStatus::Draft,
            products: Vec::new(),
            collections: Vec::new(),
            discount_type: None,
            discount_value: 0.0,
            tiers: Vec::new(),
            bundle_config: BundleConfig::default(),
            free_gift: FreeGift::default(),
            display_settings: DisplaySettings::default(),
            styling: Styling::default(),
            schedule: Schedule::default(),
            targeting: Targeting::default(),
            analytics: AnalyticsCounters::default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Loosely-typed construction payload, as produced by the admin create and
/// update endpoints. Every field is optional; `Offer::from_input` resolves
/// the defaults in one step so partial input never fails construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfferInput {
    pub id: Option<Uuid>,
    pub shop_id: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: Option<OfferType>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<OfferStatus>,
    pub products: Option<Vec<String>>,
    pub collections: Option<Vec<String>>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<f64>,
    pub tiers: Option<Vec<Tier>>,
    pub bundle_config: Option<BundleConfig>,
    pub free_gift: Option<FreeGift>,
    pub display_settings: Option<DisplaySettings>,
    pub styling: Option<Styling>,
    pub schedule: Option<Schedule>,
    pub targeting: Option<Targeting>,
    pub analytics: Option<AnalyticsCounters>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of `Offer::validate`. Collects every violated rule; never a
/// failure path.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl Offer {
    /// Resolve a partial payload against the documented defaults. This is
    /// the single defaulting step; no later code deals with absent nested
    /// structures.
    pub fn from_input(input: OfferInput) -> Self {
        let now = Utc::now();
        Self {
            id: input.id,
            shop_id: input.shop_id.unwrap_or_default(),
            offer_type: input.offer_type,
            name: input.name.unwrap_or_default(),
            description: input.description.unwrap_or_default(),
            status: input.status.unwrap_or_default(),
            products: input.products.unwrap_or_default(),
            collections: input.collections.unwrap_or_default(),
            discount_type: input.discount_type,
            discount_value: input.discount_value.unwrap_or(0.0),
            tiers: input.tiers.unwrap_or_default(),
            bundle_config: input.bundle_config.unwrap_or_default(),
            free_gift: input.free_gift.unwrap_or_default(),
            display_settings: input.display_settings.unwrap_or_default(),
            styling: input.styling.unwrap_or_default(),
            schedule: input.schedule.unwrap_or_default(),
            targeting: input.targeting.unwrap_or_default(),
            analytics: input.analytics.unwrap_or_default(),
            created_at: input.created_at.unwrap_or(now),
            updated_at: input.updated_at.unwrap_or(now),
        }
    }

    /// Validate the configuration before persistence. Runs every check so
    /// the admin UI can surface all violations in one pass.
    pub fn validate(&self) -> ValidationReport {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Offer name is required".to_string());
        }

        if self.offer_type.is_none() {
            errors.push("Invalid offer type".to_string());
        }

        if self.shop_id.is_empty() {
            errors.push("Shop ID is required".to_string());
        }

        if self.products.is_empty() && self.collections.is_empty() {
            errors.push("At least one product or collection must be selected".to_string());
        }

        if self.offer_type == Some(OfferType::QuantityBreak) && self.tiers.is_empty() {
            errors.push("Quantity breaks require at least one tier".to_string());
        }

        if self.offer_type == Some(OfferType::Bundle) && self.bundle_config.min_items < 1 {
            errors.push("Bundle must require at least 1 item".to_string());
        }

        ValidationReport {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}
