use crate::geolocation::Coordinates;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use strum::Display;
use url::form_urlencoded;

const PHOTO_URL: &str = "https://maps.googleapis.com/maps/api/place/photo";

/// Anything that can run a Places text search.
pub trait PlacesSearch {
    fn text_search(&self, request: &TextSearchRequest) -> Result<PlacesResponse>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSearchRequest {
    pub query: String,
    pub location: Coordinates,
    /// Metres
    pub radius: u32,
    pub language: Option<String>,
}

// https://developers.google.com/maps/documentation/places/web-service/search-text#PlacesSearchStatus
#[derive(Debug, Clone, Copy, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacesStatus {
    Ok,
    ZeroResults,
    InvalidRequest,
    OverQueryLimit,
    RequestDenied,
    UnknownError,
    NotFound,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlacesResponse {
    pub status: PlacesStatus,
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    /// Never followed.
    pub next_page_token: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaceResult {
    pub place_id: String,
    pub name: String,
    #[serde(default)]
    pub formatted_address: String,
    pub rating: Option<f32>,
    pub user_ratings_total: Option<u32>,
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub website: Option<String>,
    pub geometry: Option<Geometry>,
    pub business_status: Option<String>,
}

impl PlaceResult {
    /// `None` when the API didn't say.
    pub fn open_now(&self) -> Option<bool> {
        self.opening_hours.as_ref().and_then(|h| h.open_now)
    }

    pub fn photo_reference(&self) -> Option<&str> {
        self.photos.first().map(|p| p.photo_reference.as_str())
    }

    pub fn photo_url(&self, key: &str, max_width: u32) -> Option<String> {
        let reference = self.photo_reference()?;
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("maxwidth", &max_width.to_string())
            .append_pair("photo_reference", reference)
            .append_pair("key", key)
            .finish();
        Some(format!("{PHOTO_URL}?{query}"))
    }

    pub fn position(&self) -> Option<Coordinates> {
        let location = &self.geometry.as_ref()?.location;
        Some(Coordinates::new(location.lat, location.lng))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Photo {
    pub photo_reference: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"{
        "html_attributions": [],
        "next_page_token": "Aap_uEA7vb0DDYVJWEaX3O",
        "results": [
            {
                "business_status": "OPERATIONAL",
                "formatted_address": "R. Augusta, 1500 - Consolação, São Paulo - SP, Brazil",
                "geometry": { "location": { "lat": -23.5581, "lng": -46.6603 } },
                "name": "Auto Mecânica Augusta",
                "opening_hours": { "open_now": true },
                "photos": [
                    { "height": 3024, "width": 4032, "photo_reference": "AUc7tXU", "html_attributions": [] }
                ],
                "place_id": "ChIJ1",
                "rating": 4.6,
                "user_ratings_total": 212
            },
            {
                "formatted_address": "Av. Paulista, 900",
                "name": "Oficina do Zé",
                "place_id": "ChIJ2"
            }
        ],
        "status": "OK"
    }"#;

    #[test]
    fn test_parse_text_search_response() {
        let response: PlacesResponse = serde_json::from_str(RESPONSE).unwrap();
        assert_eq!(response.status, PlacesStatus::Ok);
        assert_eq!(response.results.len(), 2);
        assert!(response.next_page_token.is_some());

        let first = &response.results[0];
        assert_eq!(first.open_now(), Some(true));
        assert_eq!(first.rating, Some(4.6));
        assert_eq!(first.photo_reference(), Some("AUc7tXU"));
        let position = first.position().unwrap();
        assert_eq!(position.latitude, -23.5581);

        let second = &response.results[1];
        assert_eq!(second.open_now(), None);
        assert_eq!(second.rating, None);
        assert!(second.photos.is_empty());
        assert!(second.position().is_none());
    }

    #[test]
    fn test_parse_statuses() {
        let json = r#"{ "status": "OVER_QUERY_LIMIT", "results": [] }"#;
        let response: PlacesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, PlacesStatus::OverQueryLimit);

        let json = r#"{ "status": "ZERO_RESULTS" }"#;
        let response: PlacesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, PlacesStatus::ZeroResults);
        assert!(response.results.is_empty());

        let json = r#"{ "status": "SOMETHING_NEW" }"#;
        let response: PlacesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, PlacesStatus::Unrecognized);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PlacesStatus::OverQueryLimit.to_string(), "OVER_QUERY_LIMIT");
        assert_eq!(PlacesStatus::Ok.to_string(), "OK");
    }

    #[test]
    fn test_photo_url() {
        let response: PlacesResponse = serde_json::from_str(RESPONSE).unwrap();
        let url = response.results[0].photo_url("k3y", 400).unwrap();
        assert_eq!(
            url,
            "https://maps.googleapis.com/maps/api/place/photo?maxwidth=400&photo_reference=AUc7tXU&key=k3y"
        );
        assert!(response.results[1].photo_url("k3y", 400).is_none());
    }
}
