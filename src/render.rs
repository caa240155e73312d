use crate::geolocation::Coordinates;
use crate::i18n::LanguageBundle;
use crate::places::PlaceResult;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use geo::{HaversineDistance, Point};
use url::form_urlencoded;

const MAP_URL: &str = "https://www.google.com/maps/search/";

/// A place as it is shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub link: Option<String>,
    pub address: String,
    pub map_link: String,
    pub stars: u8,
    pub open: bool,
    /// Kilometres from where the search was made
    pub distance: Option<f64>,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RowOptions<'a> {
    pub origin: Option<Coordinates>,
    /// API key and maximum width, when photos should be linked
    pub photos: Option<(&'a str, u32)>,
}

impl Row {
    pub fn new(place: &PlaceResult, opts: RowOptions) -> Self {
        let distance = match (opts.origin, place.position()) {
            (Some(origin), Some(position)) => Some(distance_km(origin, position)),
            _ => None,
        };
        let photo = opts
            .photos
            .and_then(|(key, width)| place.photo_url(key, width));
        Self {
            name: place.name.clone(),
            link: place.website.clone(),
            address: place.formatted_address.clone(),
            map_link: map_link(place),
            stars: stars(place.rating),
            open: place.open_now().unwrap_or(false),
            distance,
            photo,
        }
    }
}

pub fn rows(places: &[PlaceResult], opts: RowOptions) -> Vec<Row> {
    places.iter().map(|place| Row::new(place, opts)).collect()
}

/// Rating rounded to a whole star count between 0 and 5.
pub fn stars(rating: Option<f32>) -> u8 {
    rating.map_or(0, |r| r.round().clamp(0.0, 5.0) as u8)
}

pub fn map_link(place: &PlaceResult) -> String {
    let query = if place.formatted_address.is_empty() {
        &place.name
    } else {
        &place.formatted_address
    };
    let params = form_urlencoded::Serializer::new(String::new())
        .append_pair("api", "1")
        .append_pair("query", query)
        .append_pair("query_place_id", &place.place_id)
        .finish();
    format!("{MAP_URL}?{params}")
}

fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    let from = Point::new(from.longitude, from.latitude);
    let to = Point::new(to.longitude, to.latitude);
    from.haversine_distance(&to) / 1000.0
}

fn star_text(stars: u8) -> String {
    let stars = stars.min(5);
    let filled = "★".repeat(stars.into());
    let empty = "☆".repeat(5u8.saturating_sub(stars).into());
    format!("{filled}{empty}")
}

pub fn table(rows: &[Row], bundle: &LanguageBundle) -> Table {
    let columns = &bundle.columns;
    let show_distance = rows.iter().any(|r| r.distance.is_some());
    let show_photo = rows.iter().any(|r| r.photo.is_some());

    let mut header = vec![
        columns.name.as_str(),
        columns.address.as_str(),
        columns.rating.as_str(),
        columns.open.as_str(),
    ];
    if show_distance {
        header.push(&columns.distance);
    }
    if show_photo {
        header.push(&columns.photo);
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for row in rows {
        let name = match &row.link {
            Some(link) => format!("{}\n{link}", row.name),
            None => row.name.clone(),
        };
        let address = format!("{}\n{}: {}", row.address, bundle.view_on_map, row.map_link);
        let open = if row.open {
            Cell::new(&bundle.open).fg(Color::Green)
        } else {
            Cell::new(&bundle.closed).fg(Color::Red)
        };
        let mut cells = vec![
            Cell::new(name),
            Cell::new(address),
            Cell::new(star_text(row.stars)).fg(Color::Yellow),
            open,
        ];
        if show_distance {
            let distance = row.distance.map(|d| format!("{d:.1} km"));
            cells.push(Cell::new(distance.unwrap_or_default()));
        }
        if show_photo {
            cells.push(Cell::new(row.photo.as_deref().unwrap_or_default()));
        }
        table.add_row(cells);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::places::{Geometry, LatLng, OpeningHours, Photo};

    fn place() -> PlaceResult {
        PlaceResult {
            place_id: "ChIJ1".to_string(),
            name: "Auto Mecânica Augusta".to_string(),
            formatted_address: "R. Augusta, 1500".to_string(),
            rating: Some(4.6),
            user_ratings_total: Some(212),
            opening_hours: Some(OpeningHours {
                open_now: Some(true),
            }),
            photos: vec![Photo {
                photo_reference: "AUc7tXU".to_string(),
                width: Some(4032),
                height: Some(3024),
            }],
            website: Some("https://augusta.example".to_string()),
            geometry: Some(Geometry {
                location: LatLng {
                    lat: -23.5581,
                    lng: -46.6603,
                },
            }),
            business_status: None,
        }
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(None), 0);
        assert_eq!(stars(Some(0.0)), 0);
        assert_eq!(stars(Some(2.4)), 2);
        assert_eq!(stars(Some(2.5)), 3);
        assert_eq!(stars(Some(4.6)), 5);
        assert_eq!(stars(Some(7.0)), 5);
        assert_eq!(stars(Some(-1.0)), 0);
    }

    #[test]
    fn test_star_text() {
        assert_eq!(star_text(0), "☆☆☆☆☆");
        assert_eq!(star_text(3), "★★★☆☆");
        assert_eq!(star_text(5), "★★★★★");
        assert_eq!(star_text(7), "★★★★★");
    }

    #[test]
    fn test_unknown_open_shown_closed() {
        let mut unknown = place();
        unknown.opening_hours = Some(OpeningHours { open_now: None });
        assert!(!Row::new(&unknown, RowOptions::default()).open);
        unknown.opening_hours = None;
        assert!(!Row::new(&unknown, RowOptions::default()).open);
        assert!(Row::new(&place(), RowOptions::default()).open);
    }

    #[test]
    fn test_map_link() {
        assert_eq!(
            map_link(&place()),
            "https://www.google.com/maps/search/?api=1&query=R.+Augusta%2C+1500&query_place_id=ChIJ1"
        );
        let mut nameless = place();
        nameless.formatted_address.clear();
        assert!(map_link(&nameless).contains("query=Auto+Mec%C3%A2nica+Augusta"));
    }

    #[test]
    fn test_row_projection() {
        let opts = RowOptions {
            origin: Some(Coordinates::new(-23.5505, -46.6333)),
            photos: Some(("k3y", 400)),
        };
        let row = Row::new(&place(), opts);
        assert_eq!(row.name, "Auto Mecânica Augusta");
        assert_eq!(row.link.as_deref(), Some("https://augusta.example"));
        assert_eq!(row.stars, 5);
        let distance = row.distance.unwrap();
        assert!(distance > 2.0 && distance < 3.5, "{distance}");
        assert!(row.photo.unwrap().contains("photo_reference=AUc7tXU"));

        let row = Row::new(&place(), RowOptions::default());
        assert!(row.distance.is_none());
        assert!(row.photo.is_none());
    }

    #[test]
    fn test_table_localized() {
        let rows = rows(&[place()], RowOptions::default());
        let output = table(&rows, Language::Pt.bundle()).to_string();
        assert!(output.contains("Nome"));
        assert!(output.contains("Endereço"));
        assert!(output.contains("Sim"));
        assert!(output.contains("★★★★★"));
        assert!(!output.contains("Distância"));
    }
}
