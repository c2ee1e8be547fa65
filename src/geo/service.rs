use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

use super::cache::LocationCache;
use super::client::Geocoder;
use super::fallback::{UNKNOWN_LABEL, known_location, placeholder_coordinate};
use super::{BrandLocation, LocationSource};
use crate::data::model::Dataset;

/// Only this many distinct brands are resolved per invocation.
pub const MAX_BRANDS: usize = 10;
/// Pause after every external request.
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(1);

/// Resolves brands to headquarters coordinates: geocoder first, then the
/// static table, then a placeholder. Never fails.
pub struct GeoService {
    geocoder: Option<Box<dyn Geocoder>>,
    cache: LocationCache,
    pause: Duration,
}

impl GeoService {
    pub fn new(geocoder: Option<Box<dyn Geocoder>>) -> Self {
        Self {
            geocoder,
            cache: LocationCache::default(),
            pause: DEFAULT_PAUSE,
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_cache(mut self, cache: LocationCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    pub fn resolve(&mut self, brand: &str, brand_counts: &BTreeMap<String, usize>) -> BrandLocation {
        self.resolve_at(brand, brand_counts, Instant::now())
    }

    /// [`Self::resolve`] with an explicit clock, for cache expiry.
    pub fn resolve_at(
        &mut self,
        brand: &str,
        brand_counts: &BTreeMap<String, usize>,
        now: Instant,
    ) -> BrandLocation {
        let device_count = brand_counts.get(brand).copied().unwrap_or(0);
        if let Some(hit) = self.cache.get(brand, device_count, now) {
            log::debug!("Location cache hit for {brand}");
            return hit;
        }

        let location = match self.lookup(brand) {
            Some(hit) => BrandLocation {
                brand: brand.to_owned(),
                latitude: hit.latitude,
                longitude: hit.longitude,
                label: hit.display_name,
                device_count,
                source: LocationSource::Api,
            },
            None => fallback_location(brand, device_count),
        };
        self.cache.insert(location.clone(), now);
        location
    }

    /// Resolve the first [`MAX_BRANDS`] distinct brands of the dataset.
    pub fn resolve_brands(&mut self, dataset: &Dataset) -> Vec<BrandLocation> {
        dataset
            .brands
            .iter()
            .take(MAX_BRANDS)
            .map(|brand| self.resolve(brand, &dataset.brand_counts))
            .collect()
    }

    /// One external request, then the fixed pause. Failures are logged and
    /// swallowed.
    fn lookup(&self, brand: &str) -> Option<super::client::GeoHit> {
        let geocoder = self.geocoder.as_ref()?;
        let result = geocoder.search(brand);
        if !self.pause.is_zero() {
            thread::sleep(self.pause);
        }
        match result {
            Ok(hit) => {
                log::info!("Geocoded {brand} to {:.4},{:.4}", hit.latitude, hit.longitude);
                Some(hit)
            }
            Err(err) => {
                log::warn!("Geocoding {brand} failed, using fallback: {err}");
                None
            }
        }
    }
}

/// Static table entry if the brand is known, otherwise a placeholder.
pub fn fallback_location(brand: &str, device_count: usize) -> BrandLocation {
    match known_location(brand) {
        Some(known) => BrandLocation {
            brand: brand.to_owned(),
            latitude: known.latitude,
            longitude: known.longitude,
            label: known.city.to_owned(),
            device_count,
            source: LocationSource::StaticTable,
        },
        None => {
            let (latitude, longitude) = placeholder_coordinate(brand);
            BrandLocation {
                brand: brand.to_owned(),
                latitude,
                longitude,
                label: UNKNOWN_LABEL.to_owned(),
                device_count,
                source: LocationSource::Placeholder,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::geo::client::GeoHit;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Counts calls and answers from a fixed script.
    struct Scripted {
        calls: Rc<Cell<usize>>,
        hit: Option<GeoHit>,
    }

    impl Geocoder for Scripted {
        fn search(&self, _query: &str) -> Result<GeoHit, LookupError> {
            self.calls.set(self.calls.get() + 1);
            self.hit.clone().ok_or(LookupError::NoResults)
        }
    }

    fn service(hit: Option<GeoHit>) -> (GeoService, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let geocoder = Scripted {
            calls: Rc::clone(&calls),
            hit,
        };
        let svc = GeoService::new(Some(Box::new(geocoder))).with_pause(Duration::ZERO);
        (svc, calls)
    }

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|(b, c)| (b.to_string(), *c)).collect()
    }

    #[test]
    fn api_hit_is_marked_resolved() {
        let (mut svc, calls) = service(Some(GeoHit {
            latitude: 30.5,
            longitude: -97.6,
            display_name: "Round Rock".into(),
        }));
        let loc = svc.resolve("Dell", &counts(&[("Dell", 5)]));
        assert!(loc.is_resolved());
        assert_eq!(loc.label, "Round Rock");
        assert_eq!(loc.device_count, 5);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failure_falls_back_to_static_table() {
        let (mut svc, _) = service(None);
        let loc = svc.resolve("Dell", &counts(&[("Dell", 5)]));
        assert_eq!(loc.source, LocationSource::StaticTable);
        assert_eq!((loc.latitude, loc.longitude), (30.2672, -97.7431));
        assert!(!loc.is_resolved());
    }

    #[test]
    fn unknown_brand_gets_placeholder() {
        let (mut svc, _) = service(None);
        let loc = svc.resolve("Framework", &counts(&[]));
        assert_eq!(loc.source, LocationSource::Placeholder);
        assert_eq!(loc.label, UNKNOWN_LABEL);
        assert_eq!(loc.device_count, 0);
        assert!((30.0..50.0).contains(&loc.latitude));
    }

    #[test]
    fn cached_result_skips_the_geocoder() {
        let (mut svc, calls) = service(None);
        let c = counts(&[("Dell", 5)]);
        let t0 = Instant::now();
        svc.resolve_at("Dell", &c, t0);
        svc.resolve_at("Dell", &c, t0 + Duration::from_secs(30 * 60));
        assert_eq!(calls.get(), 1);

        svc.resolve_at("Dell", &c, t0 + Duration::from_secs(2 * 60 * 60));
        assert_eq!(calls.get(), 2);

        svc.resolve_at("Dell", &counts(&[("Dell", 6)]), t0);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn no_geocoder_goes_straight_to_fallback() {
        let mut svc = GeoService::new(None);
        let loc = svc.resolve("HP", &counts(&[("HP", 1)]));
        assert_eq!(loc.source, LocationSource::StaticTable);
    }
}
