use std::fs;

use rigscope::data::model::{Dataset, DeviceRecord};
use rigscope::pricing::forest::ForestParams;
use rigscope::pricing::{
    ArtifactOrigin, FEATURE_COLUMNS, ModelArtifact, PriceModelService, PriceQuery, predict,
    similar_price,
};

fn device(brand: &str, ram_gb: f64, price: f64) -> DeviceRecord {
    DeviceRecord {
        brand: Some(brand.into()),
        device_type: Some("Laptop".into()),
        cpu_brand: Some("Intel".into()),
        cpu_cores: Some(8.0),
        ram_gb: Some(ram_gb),
        storage_gb: Some(512.0),
        gpu_brand: Some("NVIDIA".into()),
        display_size_in: Some(15.6),
        price: Some(price),
        release_year: Some(2023),
        ..Default::default()
    }
}

fn three_rows() -> Dataset {
    Dataset::from_records(
        vec![
            device("Dell", 8.0, 1000.0),
            device("Dell", 16.0, 1200.0),
            device("HP", 8.0, 900.0),
        ],
        vec![],
    )
}

fn catalogue() -> Dataset {
    let brands = ["Dell", "HP", "Lenovo", "Asus"];
    let rows = (0..60)
        .map(|i| {
            let brand = brands[i % brands.len()];
            let ram = [8.0, 16.0, 32.0][i % 3];
            device(brand, ram, 400.0 + ram * 40.0 + (i % 7) as f64 * 15.0)
        })
        .collect();
    Dataset::from_records(rows, vec![])
}

fn quick() -> ForestParams {
    ForestParams {
        n_trees: 12,
        ..Default::default()
    }
}

fn query(brand: &str, ram_gb: f64) -> PriceQuery {
    PriceQuery::from_record(&device(brand, ram_gb, 0.0)).expect("complete record")
}

#[test]
fn three_row_dell_prediction_stays_in_range() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = PriceModelService::new(dir.path().join("model.json"));
    let (artifact, origin) = service.load(&three_rows()).unwrap();
    assert_eq!(origin, ArtifactOrigin::Trained);

    let price = predict(&artifact, &query("Dell", 12.0));
    assert!((500.0..=2000.0).contains(&price), "predicted {price}");
}

#[test]
fn trained_artifact_has_all_features_and_sane_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let service = PriceModelService::with_params(dir.path().join("model.json"), quick());
    let artifact = service.train(&catalogue()).unwrap();

    assert_eq!(artifact.feature_columns.len(), 8);
    assert_eq!(artifact.feature_columns, FEATURE_COLUMNS);
    assert!(artifact.metrics.mae >= 0.0);
    assert!(artifact.metrics.r2.is_finite());
    assert_eq!(artifact.eval_rows, 12);
    assert_eq!(artifact.forest.n_trees(), 12);
    assert!(dir.path().join("model.json").exists());
}

#[test]
fn saved_artifact_predicts_identically_after_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("model.json");
    let service = PriceModelService::with_params(&path, quick());
    let trained = service.train(&catalogue()).unwrap();

    let reloaded = ModelArtifact::load(&path).unwrap();
    assert_eq!(reloaded, trained);
    for (brand, ram) in [("Dell", 8.0), ("HP", 32.0), ("Asus", 16.0)] {
        let q = query(brand, ram);
        assert_eq!(predict(&reloaded, &q), predict(&trained, &q));
    }
}

#[test]
fn unseen_category_still_gets_a_finite_price() {
    let dir = tempfile::tempdir().unwrap();
    let service = PriceModelService::with_params(dir.path().join("model.json"), quick());
    let artifact = service.train(&catalogue()).unwrap();

    let mut q = query("Framework", 16.0);
    q.gpu_brand = "Matrox".into();
    assert!(predict(&artifact, &q).is_finite());
}

#[test]
fn second_load_is_served_from_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let mut service = PriceModelService::with_params(&path, quick());
    let ds = catalogue();

    let (first, origin) = service.load(&ds).unwrap();
    assert_eq!(origin, ArtifactOrigin::Trained);

    fs::remove_file(&path).unwrap();
    let (second, origin) = service.load(&ds).unwrap();
    assert_eq!(origin, ArtifactOrigin::Memory);
    assert_eq!(*first, *second);
}

#[test]
fn fresh_service_reads_the_artifact_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let ds = catalogue();
    let trained = PriceModelService::with_params(&path, quick())
        .train(&ds)
        .unwrap();

    let mut service = PriceModelService::with_params(&path, quick());
    let (loaded, origin) = service.load(&ds).unwrap();
    assert_eq!(origin, ArtifactOrigin::Disk);
    assert_eq!(*loaded, trained);
}

#[test]
fn corrupt_artifact_file_is_retrained() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, b"{ not json").unwrap();

    let mut service = PriceModelService::with_params(&path, quick());
    let (_, origin) = service.load(&catalogue()).unwrap();
    assert_eq!(origin, ArtifactOrigin::Trained);
    assert!(ModelArtifact::load(&path).is_ok());
}

#[test]
fn artifact_with_other_features_is_retrained() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let ds = catalogue();
    let mut stale = PriceModelService::with_params(&path, quick())
        .train(&ds)
        .unwrap();
    stale.feature_columns.pop();
    stale.save(&path).unwrap();

    let mut service = PriceModelService::with_params(&path, quick());
    let (artifact, origin) = service.load(&ds).unwrap();
    assert_eq!(origin, ArtifactOrigin::Trained);
    assert_eq!(artifact.feature_columns.len(), 8);
}

#[test]
fn artifact_with_broken_trees_is_retrained() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let ds = catalogue();
    PriceModelService::with_params(&path, quick())
        .train(&ds)
        .unwrap();

    let mut raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    raw["forest"]["trees"][0]["nodes"] = serde_json::json!([]);
    fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();
    assert!(!ModelArtifact::load(&path).unwrap().is_compatible());

    let mut service = PriceModelService::with_params(&path, quick());
    let (artifact, origin) = service.load(&ds).unwrap();
    assert_eq!(origin, ArtifactOrigin::Trained);
    assert!(artifact.forest.is_well_formed());
    assert!(predict(&artifact, &query("Dell", 16.0)).is_finite());
}

#[test]
fn artifact_with_looping_split_is_retrained() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let ds = catalogue();
    PriceModelService::with_params(&path, quick())
        .train(&ds)
        .unwrap();

    let mut raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    raw["forest"]["trees"][0]["nodes"] = serde_json::json!([
        {"kind": "split", "feature": 0, "threshold": 1.0, "left": 0, "right": 0}
    ]);
    fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();

    let mut service = PriceModelService::with_params(&path, quick());
    let (_, origin) = service.load(&ds).unwrap();
    assert_eq!(origin, ArtifactOrigin::Trained);
}

#[test]
fn similar_price_averages_same_brand_type_and_ram_window() {
    let ds = Dataset::from_records(
        vec![
            device("Dell", 8.0, 1000.0),
            device("Dell", 12.0, 1400.0),
            device("Dell", 32.0, 3000.0),
            device("HP", 8.0, 500.0),
        ],
        vec![],
    );
    assert_eq!(similar_price(&ds, &query("Dell", 10.0)), Some(1200.0));
    assert_eq!(similar_price(&ds, &query("Acer", 10.0)), None);
}
