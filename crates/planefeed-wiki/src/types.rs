use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Shown when no manufacturer could be resolved.
pub const UNKNOWN_MANUFACTURER: &str = "Unknown Manufacturer";
/// Shown when no first-flight date could be resolved.
pub const DATE_UNKNOWN: &str = "Date unknown";
/// Internal "nothing found" result of the manufacturer and first-flight chains.
pub const UNKNOWN: &str = "Unknown";
pub const PLACEHOLDER_IMAGE_URL: &str = "https://images.unsplash.com/photo-1540962351504-03099e0a754b?q=80&w=2070&auto=format&fit=crop";

/// One card in the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AircraftRecord {
    pub id: u64,
    pub name: String,
    pub manufacturer: String,
    pub first_flight: String,
    pub description: String,
    pub image_url: String,
}

impl AircraftRecord {
    /// Builds a record from raw pipeline results, mapping the internal
    /// `"Unknown"` results and missing thumbnails to their display fallbacks.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        manufacturer: String,
        first_flight: String,
        description: String,
        image_url: Option<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            manufacturer: display_or(manufacturer, UNKNOWN_MANUFACTURER),
            first_flight: display_or(first_flight, DATE_UNKNOWN),
            description,
            image_url: image_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string()),
        }
    }
}

fn display_or(value: String, sentinel: &str) -> String {
    if value.trim().is_empty() || value == UNKNOWN {
        sentinel.to_string()
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecField {
    Crew,
    Length,
    Wingspan,
    Height,
    MaxSpeed,
    Range,
    Service,
    Armament,
    Capacity,
    Engine,
    Weight,
    Ceiling,
    ClimbRate,
    UnitCost,
    Status,
    PrimaryUser,
    Produced,
    NumberBuilt,
}

impl SpecField {
    pub const ALL: [SpecField; 18] = [
        SpecField::Crew,
        SpecField::Length,
        SpecField::Wingspan,
        SpecField::Height,
        SpecField::MaxSpeed,
        SpecField::Range,
        SpecField::Service,
        SpecField::Armament,
        SpecField::Capacity,
        SpecField::Engine,
        SpecField::Weight,
        SpecField::Ceiling,
        SpecField::ClimbRate,
        SpecField::UnitCost,
        SpecField::Status,
        SpecField::PrimaryUser,
        SpecField::Produced,
        SpecField::NumberBuilt,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Crew => "Crew",
            Self::Length => "Length",
            Self::Wingspan => "Wingspan",
            Self::Height => "Height",
            Self::MaxSpeed => "Max speed",
            Self::Range => "Range",
            Self::Service => "Service",
            Self::Armament => "Armament",
            Self::Capacity => "Capacity",
            Self::Engine => "Engine",
            Self::Weight => "Weight",
            Self::Ceiling => "Ceiling",
            Self::ClimbRate => "Climb rate",
            Self::UnitCost => "Unit cost",
            Self::Status => "Status",
            Self::PrimaryUser => "Primary user",
            Self::Produced => "Produced",
            Self::NumberBuilt => "Number built",
        }
    }
}

/// Sparse: only fields that resolved are present.
pub type Specifications = BTreeMap<SpecField, String>;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ExtendedInfo {
    pub specifications: Specifications,
    pub history: Vec<String>,
    pub variants: Vec<String>,
}

impl ExtendedInfo {
    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty() && self.history.is_empty() && self.variants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_maps_unknowns_to_display_sentinels() {
        let record = AircraftRecord::new(
            7,
            "Mystery",
            UNKNOWN.to_string(),
            UNKNOWN.to_string(),
            String::new(),
            None,
        );
        assert_eq!(record.manufacturer, UNKNOWN_MANUFACTURER);
        assert_eq!(record.first_flight, DATE_UNKNOWN);
        assert_eq!(record.image_url, PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = AircraftRecord::new(
            1,
            "Concorde",
            "BAC".to_string(),
            "March 2, 1969".to_string(),
            "Supersonic airliner.".to_string(),
            Some("https://upload.wikimedia.org/concorde.jpg".to_string()),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["firstFlight"], "March 2, 1969");
        assert_eq!(json["imageUrl"], "https://upload.wikimedia.org/concorde.jpg");
    }

    #[test]
    fn specifications_serialize_sparse() {
        let mut info = ExtendedInfo::default();
        info.specifications.insert(SpecField::MaxSpeed, "2,179 km/h".to_string());
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["specifications"]["max_speed"], "2,179 km/h");
        assert!(json["specifications"].get("crew").is_none());
    }
}
