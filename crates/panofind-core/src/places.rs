//! Place-type catalog used by the building-presence check.
//!
//! Place types attached to a panorama describe what is near it. Most of them
//! are businesses or buildings, but a fixed set describes areas, regions and
//! natural features instead. A panorama counts as building-adjacent when any
//! of its places has a type outside [`NON_BUILDING_PLACE_TYPES`].

/// Address-component place types: political areas and geographic regions.
pub const ADDRESS_COMPONENT_PLACE_TYPES: &[&str] = &[
    "Country",
    "Reservation",
    "Administrative Area1",
    "Administrative Area2",
    "Locality",
    "Sublocality1",
    "Sublocality2",
    "Sublocality3",
    "Neighborhood",
    "Continent",
    "Archipelago",
    "Island",
    "Lake",
    "Fjord",
    "Area",
    "Geocoded address",
    "Intersection",
];

/// Natural features, roads and open spaces.
const OPEN_AREA_PLACE_TYPES: &[&str] = &[
    "Crater",
    "Peninsula",
    "Volcano",
    "Water",
    "Colloquial area",
    "Colloquial city",
    "Road",
    "Route",
    "Trail",
    "Nature preserve",
    "National park",
    "National reserve",
    "Wetland",
    "Wildlife refuge",
    "Wildlife park",
    "Bay",
    "Harbor",
    "Hiking area",
    "Mountain peak",
    "Woods",
    "Beach",
    "Botanical garden",
    "Trail head",
    "Park",
    "Amusement park",
    "Agricultural production",
];

/// Every place type that indicates an area or feature rather than a building.
pub const NON_BUILDING_PLACE_TYPES: &[&[&str]] =
    &[ADDRESS_COMPONENT_PLACE_TYPES, OPEN_AREA_PLACE_TYPES];

/// Returns `true` if `place_type` is in the non-building catalog.
#[must_use]
pub fn is_non_building_place_type(place_type: &str) -> bool {
    NON_BUILDING_PLACE_TYPES
        .iter()
        .any(|group| group.contains(&place_type))
}
