use crate::rng::{Fnv64, SimpleRng};

/// Seed mixed with the brand hash for placeholder coordinates.
const PLACEHOLDER_SEED: u64 = 42;

pub const PLACEHOLDER_LAT: (f64, f64) = (30.0, 50.0);
pub const PLACEHOLDER_LON: (f64, f64) = (-120.0, 140.0);
pub const UNKNOWN_LABEL: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownLocation {
    pub brand: &'static str,
    pub latitude: f64,
    pub longitude: f64,
    pub city: &'static str,
}

const fn hq(brand: &'static str, latitude: f64, longitude: f64, city: &'static str) -> KnownLocation {
    KnownLocation {
        brand,
        latitude,
        longitude,
        city,
    }
}

/// Headquarters of well-known brands, used when the geocoder is unavailable.
pub const KNOWN_HEADQUARTERS: &[KnownLocation] = &[
    hq("Dell", 30.2672, -97.7431, "Round Rock, Texas, USA"),
    hq("HP", 37.3541, -121.9552, "Palo Alto, California, USA"),
    hq("Lenovo", 39.9042, 116.4074, "Beijing, China"),
    hq("Apple", 37.3349, -122.0090, "Cupertino, California, USA"),
    hq("Asus", 25.0172, 121.3687, "Taipei, Taiwan"),
    hq("Acer", 25.0172, 121.3687, "Taipei, Taiwan"),
    hq("MSI", 25.0172, 121.3687, "Taipei, Taiwan"),
    hq("Samsung", 37.5665, 126.9780, "Seoul, South Korea"),
];

/// Case-insensitive lookup in [`KNOWN_HEADQUARTERS`].
pub fn known_location(brand: &str) -> Option<&'static KnownLocation> {
    let brand = brand.trim();
    KNOWN_HEADQUARTERS
        .iter()
        .find(|k| k.brand.eq_ignore_ascii_case(brand))
}

/// Reproducible pseudo-random coordinate inside the placeholder box. The
/// same brand always lands on the same spot.
pub fn placeholder_coordinate(brand: &str) -> (f64, f64) {
    let mut rng = SimpleRng::new(PLACEHOLDER_SEED ^ Fnv64::hash_str(brand));
    let lat = rng.uniform(PLACEHOLDER_LAT.0, PLACEHOLDER_LAT.1);
    let lon = rng.uniform(PLACEHOLDER_LON.0, PLACEHOLDER_LON.1);
    (lat, lon)
}
