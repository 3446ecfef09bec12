use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A city the user chose to keep on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCity {
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub added_at: DateTime<Utc>,
}

impl SavedCity {
    /// Saved cities are keyed by name, ignoring case
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}
