use serde::{Deserialize, Serialize};

/// Short per-day forecast line included in the prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastBrief {
    pub date: String,
    pub temp: f64,
    pub description: String,
}

/// Weather facts a summary is written from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherFacts {
    pub temperature: f64,
    pub description: String,
    pub city: String,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub forecast: Vec<ForecastBrief>,
}

impl WeatherFacts {
    /// True when city, description and a finite temperature are all present
    pub fn is_complete(&self) -> bool {
        self.temperature.is_finite() && !self.city.trim().is_empty() && !self.description.trim().is_empty()
    }
}

#[derive(Serialize, Deserialize, Default)]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Serialize, Deserialize, Default)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Serialize)]
pub(crate) struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

#[derive(Serialize)]
pub(crate) struct GenerateRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<Content>,
}

#[derive(Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate, if it holds anything
    pub fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}
