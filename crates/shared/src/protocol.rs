use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CityId, Coordinates};

/// A visited-city record as stored by the backend collection.
///
/// Field names on the wire are camelCase; `id` is assigned by the backend on
/// creation and never generated client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: CityId,
    pub city_name: String,
    pub country: String,
    pub emoji: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    pub position: Coordinates,
}

/// A city record before the backend has assigned an id.
///
/// This is the POST body for the create operation; the backend echoes it back
/// with an `id` attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDraft {
    pub city_name: String,
    pub country: String,
    pub emoji: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    pub position: Coordinates,
}

impl CityDraft {
    pub fn into_city(self, id: CityId) -> City {
        City {
            id,
            city_name: self.city_name,
            country: self.country,
            emoji: self.emoji,
            date: self.date,
            notes: self.notes,
            position: self.position,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_round_trips_camel_case_wire_names() {
        let raw = r#"{
            "id": 73930385,
            "cityName": "Lisbon",
            "country": "Portugal",
            "emoji": "🇵🇹",
            "date": "2027-10-31T15:59:59.138Z",
            "notes": "My favorite city so far!",
            "position": { "lat": 38.727881642324164, "lng": -9.140900099907554 }
        }"#;

        let city: City = serde_json::from_str(raw).expect("decode city");
        assert_eq!(city.id, CityId(73930385));
        assert_eq!(city.city_name, "Lisbon");
        assert_eq!(city.emoji, "🇵🇹");

        let encoded = serde_json::to_value(&city).expect("encode city");
        assert_eq!(encoded["cityName"], "Lisbon");
        assert_eq!(encoded["position"]["lng"], -9.140900099907554);
    }

    #[test]
    fn draft_encodes_without_id() {
        let draft = CityDraft {
            city_name: "Berlin".to_string(),
            country: "Germany".to_string(),
            emoji: "🇩🇪".to_string(),
            date: "2027-02-12T09:24:11Z".parse().expect("timestamp"),
            notes: String::new(),
            position: Coordinates::new(52.53586782505711, 13.376933665713324),
        };

        let encoded = serde_json::to_value(&draft).expect("encode draft");
        assert!(encoded.get("id").is_none());
        assert_eq!(encoded["cityName"], "Berlin");
    }
}
