use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::artifact::{
    CATEGORICAL_FEATURES, FEATURE_COLUMNS, FeatureImportance, Metrics, ModelArtifact, PriceQuery,
    encode_features,
};
use super::encoder::LabelEncoder;
use super::forest::{ForestParams, RandomForest};
use super::metrics::{mean_absolute_error, r2_score, train_test_split};
use crate::data::filter::similar_devices;
use crate::data::model::{Dataset, PRICE};
use crate::data::stats::mean;
use crate::error::TrainingError;

pub const EVAL_FRACTION: f64 = 0.2;
pub const SPLIT_SEED: u64 = 42;
const MIN_TRAIN_ROWS: usize = 2;

/// Where the artifact handed out by [`PriceModelService::load`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    Memory,
    Disk,
    Trained,
}

struct CachedArtifact {
    fingerprint: u64,
    artifact: Arc<ModelArtifact>,
}

/// Trains, persists, reloads and serves the price model. The in-memory
/// copy lives as long as the service (one session).
pub struct PriceModelService {
    path: PathBuf,
    params: ForestParams,
    cached: Option<CachedArtifact>,
}

impl PriceModelService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_params(path, ForestParams::default())
    }

    pub fn with_params(path: impl Into<PathBuf>, params: ForestParams) -> Self {
        Self {
            path: path.into(),
            params,
            cached: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The artifact currently held in memory, if any.
    pub fn cached(&self) -> Option<Arc<ModelArtifact>> {
        self.cached.as_ref().map(|c| Arc::clone(&c.artifact))
    }

    /// Fit a fresh artifact and overwrite the artifact file with it.
    pub fn train(&self, dataset: &Dataset) -> Result<ModelArtifact, TrainingError> {
        let artifact = fit_artifact(dataset, &self.params)?;
        artifact.save(&self.path)?;
        log::info!("Saved price model to {}", self.path.display());
        Ok(artifact)
    }

    /// Return the session's artifact: from memory if this dataset was seen
    /// before, else from the artifact file, else by training.
    ///
    /// A file whose feature schema no longer matches, or that fails to parse,
    /// is replaced by a retrained artifact.
    pub fn load(
        &mut self,
        dataset: &Dataset,
    ) -> Result<(Arc<ModelArtifact>, ArtifactOrigin), TrainingError> {
        if let Some(cached) = &self.cached {
            if cached.fingerprint == dataset.fingerprint() {
                return Ok((Arc::clone(&cached.artifact), ArtifactOrigin::Memory));
            }
        }

        let (artifact, origin) = match self.read_persisted()? {
            Some(artifact) => {
                warn_unseen_categories(&artifact, dataset);
                (artifact, ArtifactOrigin::Disk)
            }
            None => {
                log::info!("Training a new price model");
                (self.train(dataset)?, ArtifactOrigin::Trained)
            }
        };

        let artifact = Arc::new(artifact);
        self.cached = Some(CachedArtifact {
            fingerprint: dataset.fingerprint(),
            artifact: Arc::clone(&artifact),
        });
        Ok((artifact, origin))
    }

    /// `Ok(None)` means "no usable file, train instead".
    fn read_persisted(&self) -> Result<Option<ModelArtifact>, TrainingError> {
        if !self.path.exists() {
            return Ok(None);
        }
        match ModelArtifact::load(&self.path) {
            Ok(artifact) if artifact.is_compatible() => {
                log::info!("Loaded price model from {}", self.path.display());
                Ok(Some(artifact))
            }
            Ok(_) => {
                log::warn!(
                    "Price model at {} has a different feature schema or malformed trees, retraining",
                    self.path.display()
                );
                Ok(None)
            }
            Err(TrainingError::Serialize(err)) => {
                log::warn!(
                    "Price model at {} is unreadable ({err}), retraining",
                    self.path.display()
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// Predict a price; unseen categories degrade to the sentinel code.
pub fn predict(artifact: &ModelArtifact, query: &PriceQuery) -> f64 {
    artifact.predict(query)
}

/// Mean price of comparable devices, for display next to a prediction.
pub fn similar_price(dataset: &Dataset, query: &PriceQuery) -> Option<f64> {
    let prices: Vec<f64> =
        similar_devices(dataset, &query.brand, &query.device_type, query.ram_gb)
            .filter_map(|r| r.price)
            .collect();
    mean(&prices)
}

/// Clean, encode, split, fit and evaluate.
pub fn fit_artifact(dataset: &Dataset, params: &ForestParams) -> Result<ModelArtifact, TrainingError> {
    let started = Instant::now();

    // Datasets built in memory carry no header; the loader already checked
    // file-backed ones, this guards hand-assembled tables.
    if !dataset.column_names.is_empty() {
        for required in FEATURE_COLUMNS.iter().chain(std::iter::once(&PRICE)) {
            if !dataset.has_column(required) {
                return Err(TrainingError::MissingColumn(*required));
            }
        }
    }

    // Drop rows with a null among the 8 features or the price.
    let rows: Vec<(PriceQuery, f64)> = dataset
        .records
        .iter()
        .filter_map(|r| Some((PriceQuery::from_record(r)?, r.price?)))
        .collect();
    if rows.len() < MIN_TRAIN_ROWS {
        return Err(TrainingError::InsufficientRows {
            needed: MIN_TRAIN_ROWS,
            found: rows.len(),
        });
    }
    log::debug!(
        "{} of {} rows complete for training",
        rows.len(),
        dataset.len()
    );

    let encoders: BTreeMap<String, LabelEncoder> = CATEGORICAL_FEATURES
        .iter()
        .map(|feature| {
            let enc = LabelEncoder::fit(rows.iter().filter_map(|(q, _)| q.category(feature)));
            (feature.to_string(), enc)
        })
        .collect();

    let feature_columns: Vec<String> = FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect();
    let x: Vec<Vec<f64>> = rows
        .iter()
        .map(|(q, _)| encode_features(&encoders, &feature_columns, q))
        .collect();
    let y: Vec<f64> = rows.iter().map(|(_, p)| *p).collect();

    let (train_idx, eval_idx) = train_test_split(rows.len(), EVAL_FRACTION, SPLIT_SEED);
    let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| x[i].clone()).collect();
    let y_train: Vec<f64> = train_idx.iter().map(|&i| y[i]).collect();

    let fit = RandomForest::fit(&x_train, &y_train, params);

    let y_eval: Vec<f64> = eval_idx.iter().map(|&i| y[i]).collect();
    let y_pred: Vec<f64> = eval_idx.iter().map(|&i| fit.forest.predict(&x[i])).collect();
    let metrics = Metrics {
        mae: mean_absolute_error(&y_eval, &y_pred),
        r2: r2_score(&y_eval, &y_pred),
    };

    let feature_importances = FEATURE_COLUMNS
        .iter()
        .zip(fit.importances)
        .map(|(feature, importance)| FeatureImportance {
            feature: feature.to_string(),
            importance,
        })
        .collect();
    let artifact = ModelArtifact {
        forest: fit.forest,
        encoders,
        feature_columns,
        metrics,
        feature_importances,
        train_rows: train_idx.len(),
        eval_rows: eval_idx.len(),
    };

    log::info!(
        "Trained price model on {} rows in {:.1?}: MAE {:.2}, R² {:.3}",
        artifact.train_rows,
        started.elapsed(),
        metrics.mae,
        metrics.r2
    );
    Ok(artifact)
}

fn warn_unseen_categories(artifact: &ModelArtifact, dataset: &Dataset) {
    for feature in CATEGORICAL_FEATURES {
        let Some(enc) = artifact.encoders.get(feature) else {
            continue;
        };
        let unseen = dataset
            .unique_text(feature)
            .into_iter()
            .filter(|v| !enc.contains(v))
            .count();
        if unseen > 0 {
            log::warn!(
                "{unseen} {feature} values in the dataset are unknown to the saved model; \
                 their predictions use the fallback code"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DeviceRecord;

    fn rec(brand: &str, ram: f64, price: Option<f64>) -> DeviceRecord {
        DeviceRecord {
            brand: Some(brand.into()),
            device_type: Some("Laptop".into()),
            cpu_brand: Some("Intel".into()),
            cpu_cores: Some(8.0),
            ram_gb: Some(ram),
            storage_gb: Some(512.0),
            gpu_brand: Some("Nvidia".into()),
            display_size_in: Some(15.6),
            price,
            release_year: Some(2022),
            ..Default::default()
        }
    }

    fn small_params() -> ForestParams {
        ForestParams {
            n_trees: 5,
            ..Default::default()
        }
    }

    #[test]
    fn incomplete_rows_are_dropped_before_fitting() {
        let ds = Dataset::from_records(
            vec![
                rec("Dell", 8.0, Some(1000.0)),
                rec("HP", 16.0, None),
                rec("Dell", 16.0, Some(1400.0)),
                rec("Asus", 32.0, Some(2000.0)),
            ],
            vec![],
        );
        let artifact = fit_artifact(&ds, &small_params()).expect("trains");
        assert_eq!(artifact.train_rows + artifact.eval_rows, 3);
        assert_eq!(artifact.encoders["brand"].classes(), ["Asus", "Dell"]);
    }

    #[test]
    fn too_few_rows_is_a_training_error() {
        let ds = Dataset::from_records(vec![rec("Dell", 8.0, Some(1000.0))], vec![]);
        match fit_artifact(&ds, &small_params()) {
            Err(TrainingError::InsufficientRows { needed: 2, found: 1 }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_feature_column_is_reported() {
        let columns = vec!["brand".to_string(), "price".to_string()];
        let ds = Dataset::from_records(vec![rec("Dell", 8.0, Some(1.0))], columns);
        match fit_artifact(&ds, &small_params()) {
            Err(TrainingError::MissingColumn("device_type")) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn importances_cover_every_feature() {
        let rows: Vec<DeviceRecord> = (0..30)
            .map(|i| {
                let brand = if i % 2 == 0 { "Dell" } else { "HP" };
                rec(brand, (4 + i) as f64, Some(500.0 + 50.0 * i as f64))
            })
            .collect();
        let ds = Dataset::from_records(rows, vec![]);
        let artifact = fit_artifact(&ds, &small_params()).expect("trains");
        assert_eq!(artifact.feature_importances.len(), FEATURE_COLUMNS.len());
        let sum: f64 = artifact.feature_importances.iter().map(|f| f.importance).sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(artifact.sorted_importances()[0].feature, "ram_gb");
    }
}
