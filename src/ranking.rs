use crate::places::PlaceResult;
use std::cmp::Ordering;

/// Open places first, then by descending rating. Places without a rating
/// sort below every rated place. Ties keep the order the API returned.
pub fn rank(places: &mut [PlaceResult]) {
    places.sort_by(compare);
}

fn compare(a: &PlaceResult, b: &PlaceResult) -> Ordering {
    is_open(b)
        .cmp(&is_open(a))
        .then_with(|| rating(b).total_cmp(&rating(a)))
}

fn is_open(place: &PlaceResult) -> bool {
    place.open_now() == Some(true)
}

fn rating(place: &PlaceResult) -> f32 {
    place.rating.unwrap_or(f32::NEG_INFINITY)
}
