//! Pricing Settings Model (Singleton)
//!
//! One document for the whole company, edited in place by administrators:
//! base prices per service classification, per-municipality discount
//! percentages, and per-technician price overrides.

use std::collections::BTreeMap;

use super::serde_helpers;
use super::CustomerStatus;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Discount suggestion for one municipality, as entered in settings.
/// Only becomes authoritative once confirmed (see `DiscountConfirmation`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MunicipalityDiscount {
    pub municipality: String,
    pub discount_percent: f64,
}

/// Per-technician price table; overrides the split policy for this
/// technician on every classification it lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicianPriceOverride {
    #[serde(with = "serde_helpers::record_id")]
    pub technician: RecordId,
    #[serde(default)]
    pub prices_by_status: BTreeMap<CustomerStatus, f64>,
}

/// Pricing settings entity (singleton record `pricing_settings:main`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PricingSettings {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Base price charged to the customer, per service classification
    #[serde(default)]
    pub prices_by_status: BTreeMap<CustomerStatus, f64>,
    #[serde(default)]
    pub municipality_discounts: Vec<MunicipalityDiscount>,
    #[serde(default)]
    pub technician_prices: Vec<TechnicianPriceOverride>,
    #[serde(default)]
    pub updated_at: i64,
}

/// Result of a per-technician override lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverrideLookup {
    /// Technician has no override table at all; the split policy applies
    NoTable,
    /// Technician has an override table but it lacks this classification
    MissingEntry,
    /// Explicit price for this technician and classification
    Price(f64),
}

impl PricingSettings {
    /// Base price for a classification.
    ///
    /// Admin tooling writes zero for rows it has not filled in yet, so a
    /// non-positive entry counts as unpriced.
    pub fn price_for(&self, status: CustomerStatus) -> Option<f64> {
        self.prices_by_status
            .get(&status)
            .copied()
            .filter(|p| *p > 0.0)
    }

    /// Configured discount percent for a municipality (0 when none)
    pub fn discount_for(&self, municipality: &str) -> f64 {
        self.municipality_discounts
            .iter()
            .find(|d| eq_municipality(&d.municipality, municipality))
            .map(|d| d.discount_percent)
            .unwrap_or(0.0)
    }

    /// Per-technician override price for a classification
    pub fn technician_price(&self, technician: &RecordId, status: CustomerStatus) -> OverrideLookup {
        match self
            .technician_prices
            .iter()
            .find(|t| &t.technician == technician)
        {
            None => OverrideLookup::NoTable,
            Some(table) => match table.prices_by_status.get(&status).copied() {
                Some(p) if p > 0.0 => OverrideLookup::Price(p),
                _ => OverrideLookup::MissingEntry,
            },
        }
    }
}

/// Municipality comparison. Admins type these by hand, so compare
/// trimmed and case-insensitively.
pub fn eq_municipality(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
