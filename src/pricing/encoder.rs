use serde::{Deserialize, Serialize};

/// Code substituted for categories the encoder never saw.
pub const UNKNOWN_CODE: usize = 0;

/// String → integer label encoder. Codes follow sorted category order, so
/// the same training rows always produce the same mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut classes: Vec<String> = values.into_iter().map(str::to_owned).collect();
        classes.sort_unstable();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn contains(&self, value: &str) -> bool {
        self.encode(value).is_some()
    }

    pub fn encode(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Encode, degrading unseen categories to [`UNKNOWN_CODE`].
    pub fn encode_or_unknown(&self, value: &str) -> usize {
        self.encode(value).unwrap_or(UNKNOWN_CODE)
    }
}
