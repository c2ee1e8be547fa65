use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::encoder::{LabelEncoder, UNKNOWN_CODE};
use super::forest::RandomForest;
use crate::data::model::{
    BRAND, CPU_BRAND, CPU_CORES, DEVICE_TYPE, DISPLAY_SIZE_IN, DeviceRecord, GPU_BRAND, RAM_GB,
    STORAGE_GB,
};
use crate::error::TrainingError;

/// Model inputs, in the order the regressor sees them.
pub const FEATURE_COLUMNS: [&str; 8] = [
    BRAND,
    DEVICE_TYPE,
    CPU_BRAND,
    CPU_CORES,
    RAM_GB,
    STORAGE_GB,
    GPU_BRAND,
    DISPLAY_SIZE_IN,
];

/// Features that go through a [`LabelEncoder`].
pub const CATEGORICAL_FEATURES: [&str; 4] = [BRAND, DEVICE_TYPE, CPU_BRAND, GPU_BRAND];

/// Raw values for one price query.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuery {
    pub brand: String,
    pub device_type: String,
    pub cpu_brand: String,
    pub cpu_cores: f64,
    pub ram_gb: f64,
    pub storage_gb: f64,
    pub gpu_brand: String,
    pub display_size_in: f64,
}

impl PriceQuery {
    /// `None` if any of the 8 features is null.
    pub fn from_record(rec: &DeviceRecord) -> Option<Self> {
        Some(Self {
            brand: rec.brand.clone()?,
            device_type: rec.device_type.clone()?,
            cpu_brand: rec.cpu_brand.clone()?,
            cpu_cores: rec.cpu_cores?,
            ram_gb: rec.ram_gb?,
            storage_gb: rec.storage_gb?,
            gpu_brand: rec.gpu_brand.clone()?,
            display_size_in: rec.display_size_in?,
        })
    }

    pub fn category(&self, feature: &str) -> Option<&str> {
        match feature {
            BRAND => Some(&self.brand),
            DEVICE_TYPE => Some(&self.device_type),
            CPU_BRAND => Some(&self.cpu_brand),
            GPU_BRAND => Some(&self.gpu_brand),
            _ => None,
        }
    }

    pub fn numeric(&self, feature: &str) -> Option<f64> {
        match feature {
            CPU_CORES => Some(self.cpu_cores),
            RAM_GB => Some(self.ram_gb),
            STORAGE_GB => Some(self.storage_gb),
            DISPLAY_SIZE_IN => Some(self.display_size_in),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub mae: f64,
    pub r2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Everything needed to answer price queries, persisted as one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub forest: RandomForest,
    pub encoders: BTreeMap<String, LabelEncoder>,
    pub feature_columns: Vec<String>,
    pub metrics: Metrics,
    pub feature_importances: Vec<FeatureImportance>,
    pub train_rows: usize,
    pub eval_rows: usize,
}

impl ModelArtifact {
    /// Encode a query into the artifact's column order.
    pub fn encode(&self, query: &PriceQuery) -> Vec<f64> {
        encode_features(&self.encoders, &self.feature_columns, query)
    }

    pub fn predict(&self, query: &PriceQuery) -> f64 {
        self.forest.predict(&self.encode(query))
    }

    /// Whether the artifact was built for the current feature set and its
    /// trees are safe to walk.
    pub fn is_compatible(&self) -> bool {
        self.feature_columns.iter().map(String::as_str).eq(FEATURE_COLUMNS)
            && CATEGORICAL_FEATURES
                .iter()
                .all(|f| self.encoders.contains_key(*f))
            && self.forest.n_features() == FEATURE_COLUMNS.len()
            && self.forest.is_well_formed()
    }

    /// Importances, largest first.
    pub fn sorted_importances(&self) -> Vec<FeatureImportance> {
        let mut out = self.feature_importances.clone();
        out.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        out
    }

    /// Overwrite `path` with this artifact.
    pub fn save(&self, path: &Path) -> Result<(), TrainingError> {
        let bytes = serde_json::to_vec(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| TrainingError::Persist {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, bytes).map_err(|source| TrainingError::Persist {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, TrainingError> {
        let bytes = fs::read(path).map_err(|source| TrainingError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Encode a query in `columns` order. Unknown categories map to the
/// sentinel code.
pub fn encode_features(
    encoders: &BTreeMap<String, LabelEncoder>,
    columns: &[String],
    query: &PriceQuery,
) -> Vec<f64> {
    columns
        .iter()
        .map(|feature| match query.category(feature) {
            Some(value) => match encoders.get(feature) {
                Some(enc) => {
                    if !enc.contains(value) {
                        log::debug!("Unseen {feature} '{value}', using sentinel code");
                    }
                    enc.encode_or_unknown(value) as f64
                }
                None => UNKNOWN_CODE as f64,
            },
            None => query.numeric(feature).unwrap_or(0.0),
        })
        .collect()
}
