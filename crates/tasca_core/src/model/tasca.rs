//! Tasca (listed place) domain model.
//!
//! # Responsibility
//! - Define the canonical record for one listed place.
//! - Validate user-submitted fields before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused.
//! - `price_level` is always a tier in 1..=3.
//! - `schedule` is a validated `WeeklySchedule`, never raw JSON.

use crate::geo::GeoPoint;
use crate::schedule::WeeklySchedule;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TascaId = Uuid;

const NAME_MIN_CHARS: usize = 3;
const ADDRESS_MIN_CHARS: usize = 5;
const CITY_MIN_CHARS: usize = 2;

/// Price tier shown as one to three euro signs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PriceLevel {
    Cheap,
    Moderate,
    Pricey,
}

impl PriceLevel {
    /// Maps a numeric tier (1..=3).
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Cheap),
            2 => Some(Self::Moderate),
            3 => Some(Self::Pricey),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        match self {
            Self::Cheap => 1,
            Self::Moderate => 2,
            Self::Pricey => 3,
        }
    }
}

impl TryFrom<u8> for PriceLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_level(value).ok_or_else(|| format!("price level must be 1..=3, got {value}"))
    }
}

impl From<PriceLevel> for u8 {
    fn from(value: PriceLevel) -> Self {
        value.level()
    }
}

/// Write-side validation failure for tasca fields.
#[derive(Debug, Clone, PartialEq)]
pub enum TascaValidationError {
    NameTooShort,
    AddressTooShort,
    CityTooShort,
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    InvalidUrl { field: &'static str, value: String },
}

impl Display for TascaValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameTooShort => write!(f, "name must have at least {NAME_MIN_CHARS} characters"),
            Self::AddressTooShort => write!(
                f,
                "address must have at least {ADDRESS_MIN_CHARS} characters"
            ),
            Self::CityTooShort => write!(f, "city must have at least {CITY_MIN_CHARS} characters"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "lat must be within [-90, 90], got {value}")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "lng must be within [-180, 180], got {value}")
            }
            Self::InvalidUrl { field, value } => {
                write!(f, "{field} must be an http(s) URL, got `{value}`")
            }
        }
    }
}

impl Error for TascaValidationError {}

/// Canonical record for one listed place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tasca {
    pub id: TascaId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub price_level: PriceLevel,
    pub has_menu_of_day: bool,
    pub accepts_cards: bool,
    pub veg_options: bool,
    pub gluten_free: bool,
    /// Free-text, comma-separated tags.
    pub tags_csv: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub menu_url: Option<String>,
    pub schedule: WeeklySchedule,
    /// Epoch milliseconds. Stamped by the store when `None`.
    pub created_at: Option<i64>,
    /// Epoch milliseconds. Stamped by the store when `None`.
    pub updated_at: Option<i64>,
    /// Submitted locally, not yet synchronized.
    pub pending_sync: bool,
}

impl Tasca {
    /// Creates a place with a generated ID, no amenities and a closed schedule.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        location: GeoPoint,
        price_level: PriceLevel,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), name, address, city, location, price_level)
    }

    /// Creates a place with a caller-provided stable ID.
    pub fn with_id(
        id: TascaId,
        name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        location: GeoPoint,
        price_level: PriceLevel,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
            city: city.into(),
            lat: location.lat,
            lng: location.lng,
            price_level,
            has_menu_of_day: false,
            accepts_cards: false,
            veg_options: false,
            gluten_free: false,
            tags_csv: String::new(),
            phone: None,
            website: None,
            menu_url: None,
            schedule: WeeklySchedule::new(),
            created_at: None,
            updated_at: None,
            pending_sync: false,
        }
    }

    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Individual tags, trimmed, blanks dropped.
    pub fn tags(&self) -> Vec<&str> {
        self.tags_csv
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }

    /// Case-insensitive substring check over the raw tag list.
    pub fn tags_contain(&self, fragment: &str) -> bool {
        self.tags_csv
            .to_lowercase()
            .contains(&fragment.to_lowercase())
    }

    /// Validates user-submitted fields.
    pub fn validate(&self) -> Result<(), TascaValidationError> {
        if self.name.trim().chars().count() < NAME_MIN_CHARS {
            return Err(TascaValidationError::NameTooShort);
        }
        if self.address.trim().chars().count() < ADDRESS_MIN_CHARS {
            return Err(TascaValidationError::AddressTooShort);
        }
        if self.city.trim().chars().count() < CITY_MIN_CHARS {
            return Err(TascaValidationError::CityTooShort);
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(TascaValidationError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(TascaValidationError::LongitudeOutOfRange(self.lng));
        }
        validate_url("website", self.website.as_deref())?;
        validate_url("menu_url", self.menu_url.as_deref())?;
        Ok(())
    }
}

fn validate_url(field: &'static str, value: Option<&str>) -> Result<(), TascaValidationError> {
    let Some(value) = value else {
        return Ok(());
    };
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => Ok(()),
        _ => Err(TascaValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}
