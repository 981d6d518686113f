//! Evidence Record Model
//!
//! The technician-submitted classification of the performed service.
//! One record per work order, written by the field app.

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// Service classification chosen by the technician on site.
///
/// Wire values are the display strings the field app has always sent;
/// new categories are a code change, not a data change.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum CustomerStatus {
    #[serde(rename = "Nov korisnik")]
    NovKorisnik,
    #[serde(rename = "Nov korisnik HFC")]
    NovKorisnikHfc,
    #[serde(rename = "Nov korisnik GPON")]
    NovKorisnikGpon,
    #[serde(rename = "Nov korisnik DTH")]
    NovKorisnikDth,
    #[serde(rename = "Postojeći korisnik")]
    PostojeciKorisnik,
    #[serde(rename = "Postojeći korisnik HFC")]
    PostojeciKorisnikHfc,
    #[serde(rename = "Postojeći korisnik GPON")]
    PostojeciKorisnikGpon,
    #[serde(rename = "Zamena opreme")]
    ZamenaOpreme,
    #[serde(rename = "Preseljenje")]
    Preseljenje,
    #[serde(rename = "Dogradnja usluge")]
    DogradnjaUsluge,
    #[serde(rename = "Servis")]
    Servis,
    #[serde(rename = "Demontaža")]
    Demontaza,
}

impl CustomerStatus {
    /// The wire/display string for this status
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerStatus::NovKorisnik => "Nov korisnik",
            CustomerStatus::NovKorisnikHfc => "Nov korisnik HFC",
            CustomerStatus::NovKorisnikGpon => "Nov korisnik GPON",
            CustomerStatus::NovKorisnikDth => "Nov korisnik DTH",
            CustomerStatus::PostojeciKorisnik => "Postojeći korisnik",
            CustomerStatus::PostojeciKorisnikHfc => "Postojeći korisnik HFC",
            CustomerStatus::PostojeciKorisnikGpon => "Postojeći korisnik GPON",
            CustomerStatus::ZamenaOpreme => "Zamena opreme",
            CustomerStatus::Preseljenje => "Preseljenje",
            CustomerStatus::DogradnjaUsluge => "Dogradnja usluge",
            CustomerStatus::Servis => "Servis",
            CustomerStatus::Demontaza => "Demontaža",
        }
    }
}

impl std::fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    #[serde(with = "serde_helpers::record_id")]
    pub work_order: RecordId,
    /// Unset when the technician closed the job without classifying it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_status: Option<CustomerStatus>,
    pub submitted_at: i64,
}
