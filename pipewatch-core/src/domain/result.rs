//! Analysis result types
//!
//! The job runner returns the terminal result as free-form JSON. It is
//! classified once, on receipt, into one of the shapes the dashboard knows
//! about, with anything else kept as raw JSON.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Message the runner reports when the mail check found nothing to process
pub const NO_NEW_ITEMS_MESSAGE: &str = "No new compliance emails found";

/// Terminal result payload of a run
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    /// The run ended early because no new mail was found
    NoNewItems { message: String },
    /// A compliance analysis produced by the AI step
    Analysis {
        analysis: ComplianceAnalysis,
        raw: Value,
    },
    /// A payload of unknown shape
    Unstructured(Value),
}

/// Changes the AI step detected between the reference and the new document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceAnalysis {
    #[serde(default)]
    pub summary_for_jira: Option<JiraSummary>,
    #[serde(default)]
    pub effective_date_changes: Option<EffectiveDateChange>,
    #[serde(default)]
    pub added_points: Vec<ChangePoint>,
    #[serde(default)]
    pub removed_points: Vec<ChangePoint>,
    #[serde(default)]
    pub updated_sections: Vec<UpdatedSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JiraSummary {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectiveDateChange {
    #[serde(default)]
    pub old_date: Option<String>,
    #[serde(default)]
    pub new_date: Option<String>,
}

/// A single added or removed requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChangePoint {
    Text(String),
    Detailed { point: String },
    Other(Value),
}

impl ChangePoint {
    /// Text shown for the point; unknown shapes fall back to compact JSON
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) | Self::Detailed { point: text } => text.clone(),
            Self::Other(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatedSection {
    #[serde(default)]
    pub section_title: Option<String>,
    #[serde(default)]
    pub change_summary: Option<String>,
}

const ANALYSIS_KEYS: [&str; 5] = [
    "summary_for_jira",
    "effective_date_changes",
    "added_points",
    "removed_points",
    "updated_sections",
];

impl AnalysisResult {
    /// Classifies a raw result payload
    pub fn from_value(value: Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Unstructured(value);
        };

        if object.get("message").and_then(Value::as_str) == Some(NO_NEW_ITEMS_MESSAGE) {
            return Self::NoNewItems {
                message: NO_NEW_ITEMS_MESSAGE.to_string(),
            };
        }

        if ANALYSIS_KEYS.iter().any(|key| object.contains_key(*key)) {
            if let Ok(analysis) = serde_json::from_value::<ComplianceAnalysis>(value.clone()) {
                return Self::Analysis {
                    analysis,
                    raw: value,
                };
            }
        }

        Self::Unstructured(value)
    }

    pub fn is_no_new_items(&self) -> bool {
        matches!(self, Self::NoNewItems { .. })
    }

    /// The payload as JSON, for raw display
    pub fn to_value(&self) -> Value {
        match self {
            Self::NoNewItems { message } => serde_json::json!({ "message": message }),
            Self::Analysis { raw, .. } => raw.clone(),
            Self::Unstructured(value) => value.clone(),
        }
    }
}

impl<'de> Deserialize<'de> for AnalysisResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl Serialize for AnalysisResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
