//! Wire and domain types shared by the editor and the backend client.

use serde::{Deserialize, Serialize};

/// Number of yearly samples in a factor's series.
pub const SERIES_LEN: usize = 25;
/// First year covered by a factor's series.
pub const SERIES_START_YEAR: i32 = 2000;

/// Creator marker of catalog-provided factors.
pub const ADMIN_CREATOR: &str = "admin";

/// Quality submitted with every save; the backend overwrites it.
pub const QUALITY_PLACEHOLDER: f64 = 0.12;
pub const DEFAULT_MODEL_DESCRIPTION: &str = "A brief description of the model";

/// One yearly sample of a factor series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub year: i32,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub normalized_value: Option<f64>,
}

/// A named model variable from the factor catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub time_series_data: Vec<TimePoint>,
}

impl Factor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            creator: None,
            base: None,
            time_series_data: Vec::new(),
        }
    }

    /// Identity used for deduplication: the backend id when present, else the name.
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    pub fn is_admin(&self) -> bool {
        self.creator.as_deref() == Some(ADMIN_CREATOR)
    }

    /// The series laid out on the fixed 25-year grid, `None` where a year is missing.
    pub fn samples(&self) -> [Option<f64>; SERIES_LEN] {
        let mut out = [None; SERIES_LEN];
        for point in &self.time_series_data {
            let Some(offset) = point.year.checked_sub(SERIES_START_YEAR) else {
                continue;
            };
            if (0..SERIES_LEN as i32).contains(&offset) {
                out[offset as usize] = point.value;
            }
        }
        out
    }
}

/// One derived edge of a saved model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub start_factor: String,
    pub end_factor: String,
    pub weight: f64,
}

/// Persisted model as posted to `POST /api/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub description: String,
    pub links: Vec<LinkRecord>,
    pub target_factor: String,
    pub creator: Option<String>,
    pub quality: f64,
    pub deleted: bool,
    /// Raw graph snapshot as a JSON string.
    #[serde(rename = "graphData")]
    pub graph_data: String,
}

/// Model quality as reported by the backend: a score, or a label such as "Not trained".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quality {
    Score(f64),
    Label(String),
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Label("Not trained yet".into())
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Score(q) => write!(f, "{:.3}", q),
            Self::Label(l) => write!(f, "{}", l),
        }
    }
}

/// A saved model as listed by `GET /api/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
    #[serde(default)]
    pub target_factor: Option<String>,
    #[serde(default)]
    pub graph_data: Option<serde_json::Value>,
}

impl ModelSummary {
    /// The stored graph snapshot as a JSON string, if one was saved.
    pub fn graph_json(&self) -> Option<String> {
        match self.graph_data.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            serde_json::Value::Array(a) if a.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

/// Saved models of one user level.
#[derive(Debug, Clone, Serialize)]
pub struct ModelLevel {
    /// Raw group key from the backend (a level number or "Unknown").
    pub key: String,
    pub level: Option<i64>,
    pub models: Vec<ModelSummary>,
}

/// Body of `POST /retrain`.
#[derive(Debug, Clone, Serialize)]
pub struct RetrainRequest {
    pub name: String,
    pub factors: Vec<Factor>,
    pub target: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrainResponse {
    pub quality: Quality,
}

/// Body returned by `POST /api/models`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
