//! Discount Confirmation Model
//!
//! One record per municipality. A configured municipality discount is only
//! honored by settlement after an administrator confirms it here; until
//! then the configured percent is a suggestion and settlement stalls in a
//! pending state.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Confirmation entity (record key = `municipality_key(municipality)`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountConfirmation {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    /// Municipality name as displayed (original casing preserved)
    pub municipality: String,
    pub discount_percent: f64,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub confirmed: bool,
    pub confirmed_by: String,
    pub confirmed_at: i64,
}

/// Stable record key for a municipality: lowercase, spaces collapsed to
/// dashes, everything but alphanumerics dropped. Keying the record this way
/// makes the per-municipality uniqueness a property of the storage layer.
pub fn municipality_key(municipality: &str) -> String {
    let mut key = String::with_capacity(municipality.len());
    let mut last_dash = true;
    for c in municipality.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            key.push(c);
            last_dash = false;
        } else if !last_dash {
            key.push('-');
            last_dash = true;
        }
    }
    while key.ends_with('-') {
        key.pop();
    }
    key
}
