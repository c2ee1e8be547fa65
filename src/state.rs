use std::ops::RangeInclusive;
use std::sync::Arc;

use rigscope::AppConfig;
use rigscope::Session;
use rigscope::chat::CompletionClient;
use rigscope::data::filter::{FilterState, QueryFilter, filtered_indices};
use rigscope::data::loader::{load_dataset, load_or_empty};
use rigscope::data::model::Dataset;
use rigscope::data::schema::Section;
use rigscope::geo::BrandLocation;
use rigscope::pricing::{ArtifactOrigin, ModelArtifact, PriceQuery, predict, similar_price};

use crate::color::BrandColors;

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    About,
    Statistics,
    Dynamics,
    Questions,
    Manufacturers,
    Prediction,
    Chat,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::About,
        Page::Statistics,
        Page::Dynamics,
        Page::Questions,
        Page::Manufacturers,
        Page::Prediction,
        Page::Chat,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::About => "About the dataset",
            Page::Statistics => "Statistics",
            Page::Dynamics => "Release dynamics",
            Page::Questions => "Questions",
            Page::Manufacturers => "Manufacturers",
            Page::Prediction => "Price prediction",
            Page::Chat => "Hardware assistant",
        }
    }
}

/// How the release-dynamics page draws its yearly counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearlyChart {
    #[default]
    Lines,
    Bars,
}

impl YearlyChart {
    pub const ALL: [YearlyChart; 2] = [YearlyChart::Lines, YearlyChart::Bars];

    pub fn label(self) -> &'static str {
        match self {
            YearlyChart::Lines => "Lines",
            YearlyChart::Bars => "Bars",
        }
    }
}

// ---------------------------------------------------------------------------
// Prediction form
// ---------------------------------------------------------------------------

pub struct PredictionForm {
    pub query: PriceQuery,
    pub result: Option<PredictionOutcome>,
}

#[derive(Debug, Clone, Copy)]
pub struct PredictionOutcome {
    pub price: f64,
    pub similar_price: Option<f64>,
}

/// Slider bounds for one numeric feature: the dataset's min and max, or
/// `fallback` when the column has no values.
pub fn slider_range(
    dataset: &Dataset,
    column: &str,
    fallback: RangeInclusive<f64>,
) -> RangeInclusive<f64> {
    match dataset.numeric_range(column) {
        Some((lo, hi)) if lo.is_finite() && hi.is_finite() => lo..=hi,
        _ => fallback,
    }
}

pub const CORES_FALLBACK: RangeInclusive<f64> = 2.0..=32.0;
pub const RAM_FALLBACK: RangeInclusive<f64> = 4.0..=128.0;
pub const STORAGE_FALLBACK: RangeInclusive<f64> = 128.0..=4096.0;
pub const DISPLAY_FALLBACK: RangeInclusive<f64> = 10.0..=34.0;

impl PredictionForm {
    /// Defaults taken from the first value of each categorical column, with
    /// numeric defaults pulled inside the dataset's ranges.
    fn for_dataset(dataset: &Dataset) -> Self {
        let first = |col: &str| dataset.unique_text(col).into_iter().next().unwrap_or_default();
        let within = |col: &str, fallback: RangeInclusive<f64>, default: f64| {
            let range = slider_range(dataset, col, fallback);
            default.clamp(*range.start(), *range.end())
        };
        Self {
            query: PriceQuery {
                brand: first("brand"),
                device_type: first("device_type"),
                cpu_brand: first("cpu_brand"),
                cpu_cores: within("cpu_cores", CORES_FALLBACK, 8.0),
                ram_gb: within("ram_gb", RAM_FALLBACK, 16.0),
                storage_gb: within("storage_gb", STORAGE_FALLBACK, 512.0),
                gpu_brand: first("gpu_brand"),
                display_size_in: within("display_size_in", DISPLAY_FALLBACK, 15.6),
            },
            result: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset; empty when the file was missing or unreadable.
    pub dataset: Dataset,

    /// Side panel selections.
    pub filters: FilterState,

    /// Indices of devices passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// One colour per brand, shared by every chart.
    pub brand_colors: BrandColors,

    pub page: Page,
    pub section: Section,
    pub yearly_chart: YearlyChart,
    pub query: QueryFilter,
    pub prediction: PredictionForm,

    /// Model handed out by the price service, and how it was obtained.
    pub model: Option<(Arc<ModelArtifact>, ArtifactOrigin)>,
    pub model_error: Option<String>,

    pub locations: Vec<BrandLocation>,
    /// Case-insensitive filter over the located brands.
    pub brand_search: String,
    /// Brand whose details are expanded on the manufacturers page.
    pub selected_brand: Option<String>,

    pub session: Session,
    pub chat_client: Option<CompletionClient>,
    pub chat_input: String,
    pub chat_error: Option<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Load the configured dataset and set up the session services.
    pub fn new(config: &AppConfig) -> Self {
        let (dataset, load_error) = load_or_empty(&config.data_path);
        let status_message = load_error.map(|e| format!("No data: {e}"));

        let (chat_client, chat_error) = match CompletionClient::from_config(config) {
            Ok(client) => (Some(client), None),
            Err(err) => {
                log::warn!("Chat disabled: {err}");
                (None, Some(err.to_string()))
            }
        };

        let session = Session::from_config(config);
        let mut state = Self {
            filters: FilterState::new(&dataset),
            visible_indices: (0..dataset.len()).collect(),
            brand_colors: BrandColors::new(&dataset.brands),
            prediction: PredictionForm::for_dataset(&dataset),
            dataset,
            page: Page::About,
            section: Section::Overview,
            yearly_chart: YearlyChart::default(),
            query: QueryFilter::default(),
            model: None,
            model_error: None,
            locations: Vec::new(),
            brand_search: String::new(),
            selected_brand: None,
            session,
            chat_client,
            chat_input: String::new(),
            chat_error,
            status_message,
        };
        state.refilter();
        state
    }

    pub fn has_data(&self) -> bool {
        !self.dataset.is_empty()
    }

    /// Replace the dataset with a user-picked file.
    pub fn open_dataset(&mut self, path: &std::path::Path) {
        match load_dataset(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} devices with columns {:?}",
                    dataset.len(),
                    dataset.column_names
                );
                self.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset; derived views are reset.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.filters = FilterState::new(&dataset);
        self.brand_colors = BrandColors::new(&dataset.brands);
        self.prediction = PredictionForm::for_dataset(&dataset);
        self.model = None;
        self.model_error = None;
        self.locations.clear();
        self.selected_brand = None;
        self.dataset = dataset;
        self.status_message = None;
        self.refilter();
        if self.page == Page::Prediction {
            self.ensure_model();
        }
    }

    /// Switch pages. Entering the prediction page loads the model so its
    /// metrics show before the first prediction.
    pub fn open_page(&mut self, page: Page) {
        self.page = page;
        if page == Page::Prediction {
            self.ensure_model();
        }
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = filtered_indices(&self.dataset, &self.filters);
    }

    pub fn visible_records(&self) -> impl Iterator<Item = &rigscope::data::model::DeviceRecord> {
        self.visible_indices.iter().map(|&i| &self.dataset.records[i])
    }

    /// Toggle a single value in a column's selection.
    pub fn toggle_filter_value(&mut self, column: &str, value: &str) {
        let selected = self.filters.selected.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    pub fn select_all(&mut self, column: &str) {
        let all = self.dataset.unique_text(column).into_iter().collect();
        self.filters.selected.insert(column.to_string(), all);
        self.refilter();
    }

    pub fn select_none(&mut self, column: &str) {
        self.filters.selected.entry(column.to_string()).or_default().clear();
        self.refilter();
    }

    // ---- price model ----

    /// Make sure a model is available, training one if needed.
    pub fn ensure_model(&mut self) {
        if self.model.is_some() || !self.has_data() {
            return;
        }
        match self.session.price_model.load(&self.dataset) {
            Ok(loaded) => {
                self.model = Some(loaded);
                self.model_error = None;
            }
            Err(err) => {
                log::error!("Price model unavailable: {err}");
                self.model_error = Some(err.to_string());
            }
        }
    }

    pub fn run_prediction(&mut self) {
        self.ensure_model();
        let Some((artifact, _)) = &self.model else {
            return;
        };
        let query = &self.prediction.query;
        self.prediction.result = Some(PredictionOutcome {
            price: predict(artifact, query),
            similar_price: similar_price(&self.dataset, query),
        });
    }

    // ---- manufacturers ----

    pub fn resolve_locations(&mut self) {
        self.locations = self.session.geo.resolve_brands(&self.dataset);
    }

    /// Located brands whose name contains the search text.
    pub fn matching_locations(&self) -> impl Iterator<Item = &BrandLocation> {
        let needle = self.brand_search.trim().to_lowercase();
        self.locations
            .iter()
            .filter(move |loc| loc.brand.to_lowercase().contains(&needle))
    }

    /// How many located brands came from the geocoder, out of all located.
    pub fn resolved_share(&self) -> (usize, usize) {
        let resolved = self.locations.iter().filter(|l| l.is_resolved()).count();
        (resolved, self.locations.len())
    }

    // ---- chat ----

    pub fn send_chat(&mut self) {
        let question = self.chat_input.trim().to_owned();
        if question.is_empty() {
            return;
        }
        let Some(client) = &self.chat_client else {
            return;
        };
        match self.session.ask(client, &question) {
            Ok(_) => {
                self.chat_input.clear();
                self.chat_error = None;
            }
            Err(err) => self.chat_error = Some(err.to_string()),
        }
    }

    pub fn clear_chat(&mut self) {
        self.session.clear_chat();
        self.chat_input.clear();
        if self.chat_client.is_some() {
            self.chat_error = None;
        }
    }
}
