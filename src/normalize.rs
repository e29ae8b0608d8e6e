//! Flattening of raw listings into warehouse records.

use crate::models::{FlatRecord, RawListing};

/// Flatten one listing. Missing nested objects leave their fields as `None`.
pub fn flatten(listing: &RawListing) -> FlatRecord {
    let contact = listing.contact_info.as_ref();
    let features = listing.features.as_ref();

    FlatRecord {
        property_code: listing.property_code.as_ref().and_then(|code| code.as_key()),
        price: listing.price,
        property_type: listing.property_type.clone(),
        operation: listing.operation.clone(),
        size: listing.size.map(|size| size / 10.0),
        rooms: listing.rooms,
        bathrooms: listing.bathrooms,
        address: listing.address.clone(),
        province: listing.province.clone(),
        municipality: listing.municipality.clone(),
        location_id: listing.location_id.clone(),
        latitude: listing.latitude,
        longitude: listing.longitude,
        url: listing.url.clone(),
        description: listing.description.clone(),
        status: listing.status.clone(),
        phone_number_for_mobile_dialing: contact
            .and_then(|c| c.phone1.as_ref())
            .and_then(|p| p.phone_number_for_mobile_dialing.clone()),
        contact_name: contact.and_then(|c| c.contact_name.clone()),
        user_type: contact.and_then(|c| c.user_type.clone()),
        has_parking_space: listing
            .parking_space
            .as_ref()
            .and_then(|p| p.has_parking_space),
        price_by_area: listing.price_by_area,
        has_swimming_pool: features.and_then(|f| f.has_swimming_pool),
        has_terrace: features.and_then(|f| f.has_terrace),
        has_air_conditioning: features.and_then(|f| f.has_air_conditioning),
        has_box_room: features.and_then(|f| f.has_box_room),
        has_garden: features.and_then(|f| f.has_garden),
        origin_location_name: None,
    }
}

/// Flatten every listing, keeping input order.
pub fn normalize(listings: &[RawListing]) -> Vec<FlatRecord> {
    listings.iter().map(flatten).collect()
}
