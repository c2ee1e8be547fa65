use std::collections::BTreeMap;
use std::time::Duration;

use rigscope::data::model::{Dataset, DeviceRecord};
use rigscope::geo::cache::LocationCache;
use rigscope::geo::{GeoService, LocationSource, MAX_BRANDS, NominatimClient};

fn service(server: &mockito::Server) -> GeoService {
    let client = NominatimClient::new(&server.url(), Duration::from_secs(2)).unwrap();
    GeoService::new(Some(Box::new(client))).with_pause(Duration::ZERO)
}

fn counts(brand: &str, n: usize) -> BTreeMap<String, usize> {
    BTreeMap::from([(brand.to_string(), n)])
}

#[test]
fn failing_endpoint_falls_back_to_known_headquarters() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .expect(1)
        .create();

    let loc = service(&server).resolve("Dell", &counts("Dell", 5));
    assert_eq!((loc.latitude, loc.longitude), (30.2672, -97.7431));
    assert!(!loc.is_resolved());
    assert_eq!(loc.device_count, 5);
    mock.assert();
}

#[test]
fn successful_lookup_uses_first_hit() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("q".into(), "Lenovo".into()),
            mockito::Matcher::UrlEncoded("limit".into(), "1".into()),
            mockito::Matcher::UrlEncoded("format".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[{"lat":"35.7796","lon":"-78.6382","display_name":"Morrisville, North Carolina"},
                {"lat":"0","lon":"0","display_name":"ignored"}]"#,
        )
        .create();

    let loc = service(&server).resolve("Lenovo", &counts("Lenovo", 3));
    assert!(loc.is_resolved());
    assert_eq!(loc.source, LocationSource::Api);
    assert_eq!((loc.latitude, loc.longitude), (35.7796, -78.6382));
    assert_eq!(loc.short_label(), "Morrisville");
    mock.assert();
}

#[test]
fn empty_result_for_unknown_brand_gives_stable_placeholder() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();

    let mut svc = service(&server);
    let a = svc.resolve("Framework", &counts("Framework", 1));
    let b = service(&server).resolve("Framework", &counts("Framework", 1));
    assert_eq!(a.source, LocationSource::Placeholder);
    assert_eq!(a.label, "unknown");
    assert_eq!((a.latitude, a.longitude), (b.latitude, b.longitude));
    assert!((30.0..=50.0).contains(&a.latitude));
    assert!((-120.0..=140.0).contains(&a.longitude));
}

#[test]
fn out_of_range_coordinates_are_rejected() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"lat":"123.0","lon":"10.0","display_name":"Nowhere"}]"#)
        .create();

    let loc = service(&server).resolve("HP", &counts("HP", 2));
    assert_eq!(loc.source, LocationSource::StaticTable);
    assert!((-90.0..=90.0).contains(&loc.latitude));
}

#[test]
fn cache_hit_skips_the_endpoint_until_count_changes() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .expect(2)
        .create();

    let mut svc = service(&server);
    svc.resolve("Dell", &counts("Dell", 5));
    svc.resolve("Dell", &counts("Dell", 5));
    svc.resolve("Dell", &counts("Dell", 6));
    assert_eq!(svc.cache().len(), 2);
    mock.assert();
}

#[test]
fn only_the_first_ten_brands_are_resolved() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::Any)
        .with_status(404)
        .expect(MAX_BRANDS)
        .create();

    let records = (0..14)
        .map(|i| DeviceRecord {
            brand: Some(format!("Brand{i:02}")),
            ..Default::default()
        })
        .collect();
    let ds = Dataset::from_records(records, vec![]);

    let locations = service(&server).resolve_brands(&ds);
    assert_eq!(locations.len(), MAX_BRANDS);
    assert_eq!(locations[0].brand, "Brand00");
    assert_eq!(locations[9].brand, "Brand09");
    for loc in &locations {
        assert!((-90.0..=90.0).contains(&loc.latitude));
        assert!((-180.0..=180.0).contains(&loc.longitude));
        assert_eq!(loc.device_count, 1);
    }
    mock.assert();
}

#[test]
fn unreachable_endpoint_still_resolves() {
    // Nothing listens on port 9 on a test machine.
    let client = NominatimClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    let mut svc = GeoService::new(Some(Box::new(client))).with_pause(Duration::ZERO);
    let loc = svc.resolve("Samsung", &counts("Samsung", 4));
    assert_eq!(loc.source, LocationSource::StaticTable);
    assert!(!loc.is_resolved());
}

#[test]
fn zero_ttl_cache_never_serves_hits() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/search")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .expect(2)
        .create();

    let client = NominatimClient::new(&server.url(), Duration::from_secs(2)).unwrap();
    let mut svc = GeoService::new(Some(Box::new(client)))
        .with_pause(Duration::ZERO)
        .with_cache(LocationCache::new(Duration::ZERO));
    svc.resolve("Acer", &counts("Acer", 1));
    svc.resolve("Acer", &counts("Acer", 1));
    mock.assert();
}
