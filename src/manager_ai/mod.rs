pub mod errors;
pub mod models;

use std::time::Duration;
use log::{info, warn};
use reqwest::Client;
use crate::initialization::AISettings;
use crate::manager_ai::errors::AIError;
use crate::manager_ai::models::{Content, GenerateRequest, GenerateResponse, GenerationConfig, Part, WeatherFacts};

const GENERATION_TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 200;
const CHECK_PROMPT: &str = "Hello, please respond with a simple greeting.";

/// Struct for generating natural language weather summaries with Gemini
pub struct Gemini {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl Gemini {
    /// Returns a Gemini struct ready for generating summaries
    ///
    /// # Arguments
    ///
    /// * 'settings' - provider url, model and request timeout
    /// * 'api_key' - Gemini api key
    pub fn new(settings: &AISettings, api_key: &str) -> Result<Gemini, AIError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        let endpoint = format!(
            "{}/v1/models/{}:generateContent",
            settings.base_url.trim_end_matches('/'),
            settings.model
        );

        Ok(Self { client, endpoint, api_key: api_key.to_string() })
    }

    /// Asks the provider for a short summary of the given facts.
    ///
    /// Never fails: timeouts, provider errors, unexpected responses and incomplete facts all
    /// give `None`, leaving it to the caller to fall back on [`fallback_summary`].
    ///
    /// # Arguments
    ///
    /// * 'facts' - current conditions and an optional short forecast
    pub async fn summarize(&self, facts: &WeatherFacts) -> Option<String> {
        if !facts.is_complete() {
            warn!("not asking for a summary, weather facts are incomplete");
            return None;
        }

        match self.generate(&build_prompt(facts)).await {
            Ok(summary) => {
                info!("received AI summary for {}", facts.city);
                Some(summary)
            }
            Err(e) => {
                warn!("AI summary unavailable for {}: {}", facts.city, e);
                None
            }
        }
    }

    /// Provider summary if one can be had, the local template otherwise
    pub async fn summary_or_fallback(&self, facts: &WeatherFacts) -> String {
        match self.summarize(facts).await {
            Some(summary) => summary,
            None => fallback_summary(facts),
        }
    }

    /// Sends a fixed greeting prompt to confirm the provider and key are working
    pub async fn check(&self) -> Result<String, AIError> {
        let reply = self.generate(CHECK_PROMPT).await?;
        info!("AI provider check succeeded");

        Ok(reply)
    }

    async fn generate(&self, prompt: &str) -> Result<String, AIError> {
        let request = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: Some(prompt.to_string()) }] }],
            generation_config: GenerationConfig {
                temperature: GENERATION_TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self.client
            .post(&self.endpoint)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AIError::Status(status.as_u16()));
        }

        let json = response.text().await?;
        let document: GenerateResponse = serde_json::from_str(&json)?;

        document.into_text().ok_or(AIError::MissingText)
    }
}

/// Builds the prompt sent to the provider
pub fn build_prompt(facts: &WeatherFacts) -> String {
    let mut prompt = format!(
        "Provide a friendly, concise summary of the current weather in {}. It's currently {}°C with {}. ",
        facts.city, facts.temperature, facts.description
    );

    if let Some(humidity) = facts.humidity {
        prompt.push_str(&format!("The humidity is {}%. ", humidity));
    }
    if let Some(wind_speed) = facts.wind_speed {
        prompt.push_str(&format!("Wind speed is {} m/s. ", wind_speed));
    }
    if !facts.forecast.is_empty() {
        let forecast = serde_json::to_string(&facts.forecast).unwrap_or_default();
        prompt.push_str(&format!("Here's a brief forecast for the next few days: {}. ", forecast));
    }

    prompt.push_str(
        "Include any relevant advice based on these conditions (what to wear, activities to consider, etc). \
         Keep it under 100 words and make it conversational.",
    );

    prompt
}

/// Summary built locally from the same facts, used when the provider gives nothing
pub fn fallback_summary(facts: &WeatherFacts) -> String {
    let temp = facts.temperature.round() as i64;
    let mut summary = format!("It's currently {}°C with {} in {}.", temp, facts.description, facts.city);

    match (facts.humidity, facts.wind_speed) {
        (Some(h), Some(w)) => summary.push_str(&format!(" The humidity is {}% and wind speed is {} m/s.", h, w)),
        (Some(h), None) => summary.push_str(&format!(" The humidity is {}%.", h)),
        (None, Some(w)) => summary.push_str(&format!(" Wind speed is {} m/s.", w)),
        (None, None) => {}
    }

    summary.push(' ');
    summary.push_str(advice(temp));

    summary
}

fn advice(temp: i64) -> &'static str {
    if temp < 10 {
        "Dress warmly!"
    } else if temp > 25 {
        "Stay cool and hydrated!"
    } else {
        "Enjoy the pleasant weather!"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager_ai::models::ForecastBrief;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT: &str = "/v1/models/gemini-1.5-flash:generateContent";

    fn facts() -> WeatherFacts {
        WeatherFacts {
            temperature: 12.4,
            description: "light rain".to_string(),
            city: "Bergen".to_string(),
            humidity: Some(88.0),
            wind_speed: Some(6.2),
            forecast: Vec::new(),
        }
    }

    fn client_for(server: &MockServer) -> Gemini {
        let settings = AISettings {
            base_url: server.uri(),
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 1,
        };
        Gemini::new(&settings, "ai-key").unwrap()
    }

    #[tokio::test]
    async fn returns_generated_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(query_param("key", "ai-key"))
            .and(body_partial_json(json!({"generationConfig": {"maxOutputTokens": 200}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "  Grab an umbrella in Bergen.  "}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = client_for(&server).summarize(&facts()).await;
        assert_eq!(summary.as_deref(), Some("Grab an umbrella in Bergen."));
    }

    #[tokio::test]
    async fn timeout_gives_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"candidates": [{"content": {"parts": [{"text": "late"}]}}]}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).summarize(&facts()).await, None);
    }

    #[tokio::test]
    async fn response_without_text_gives_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{}]}, "finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).summarize(&facts()).await, None);
    }

    #[tokio::test]
    async fn provider_error_and_garbage_give_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.summarize(&facts()).await, None);
        assert_eq!(client.summarize(&facts()).await, None);
    }

    #[tokio::test]
    async fn incomplete_facts_skip_the_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut incomplete = facts();
        incomplete.city = "  ".to_string();
        assert_eq!(client_for(&server).summarize(&incomplete).await, None);
    }

    #[tokio::test]
    async fn fallback_used_when_provider_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let summary = client_for(&server).summary_or_fallback(&facts()).await;
        assert_eq!(summary, fallback_summary(&facts()));
    }

    #[tokio::test]
    async fn check_reports_provider_state() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(json!({"contents": [{"parts": [{"text": CHECK_PROMPT}]}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Hello there!"}]}}]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.check().await.unwrap(), "Hello there!");
        assert!(matches!(client.check().await, Err(AIError::Status(403))));
    }

    #[test]
    fn prompt_includes_optional_facts() {
        let mut f = facts();
        f.forecast = vec![ForecastBrief { date: "2024-03-02".into(), temp: 9.0, description: "overcast clouds".into() }];

        let prompt = build_prompt(&f);
        assert!(prompt.contains("current weather in Bergen"));
        assert!(prompt.contains("12.4°C with light rain"));
        assert!(prompt.contains("The humidity is 88%"));
        assert!(prompt.contains("Wind speed is 6.2 m/s"));
        assert!(prompt.contains("\"description\":\"overcast clouds\""));
        assert!(prompt.contains("under 100 words"));

        f.humidity = None;
        f.forecast.clear();
        let prompt = build_prompt(&f);
        assert!(!prompt.contains("humidity"));
        assert!(!prompt.contains("forecast for the next few days"));
    }

    #[test]
    fn fallback_advice_thresholds() {
        let mut f = facts();
        assert_eq!(
            fallback_summary(&f),
            "It's currently 12°C with light rain in Bergen. The humidity is 88% and wind speed is 6.2 m/s. \
             Enjoy the pleasant weather!"
        );

        f.temperature = 9.4;
        assert!(fallback_summary(&f).ends_with("Dress warmly!"));

        f.temperature = 25.6;
        assert!(fallback_summary(&f).ends_with("Stay cool and hydrated!"));

        f.temperature = 25.4;
        f.humidity = None;
        f.wind_speed = None;
        assert_eq!(fallback_summary(&f), "It's currently 25°C with light rain in Bergen. Enjoy the pleasant weather!");
    }
}
