pub mod errors;
pub mod models;

use std::time::Duration;
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use crate::initialization::WeatherSettings;
use crate::manager_weather::errors::WeatherError;
use crate::manager_weather::models::{CitySuggestion, CurrentWeather, Forecast, ForecastResponse, Location};

/// Queries shorter than this never reach the provider
pub const MIN_SUGGEST_QUERY: usize = 2;
const SUGGEST_LIMIT: u8 = 5;
const UNITS: &str = "metric";

#[derive(Deserialize)]
struct UpstreamMessage {
    message: Option<String>,
}

/// Struct for fetching current conditions, forecasts and city suggestions from OpenWeatherMap
pub struct OpenWeather {
    client: Client,
    base_url: String,
    geo_url: String,
    api_key: String,
    retry_delay: Duration,
}

impl OpenWeather {
    /// Returns an OpenWeather struct ready for fetching weather data
    ///
    /// # Arguments
    ///
    /// * 'settings' - provider urls, request timeout and retry delay
    /// * 'api_key' - OpenWeatherMap api key
    pub fn new(settings: &WeatherSettings, api_key: &str) -> Result<OpenWeather, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            geo_url: settings.geo_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry_delay: Duration::from_millis(settings.retry_delay_ms),
        })
    }

    /// Retrieves current conditions for a city or a coordinate pair
    ///
    /// # Arguments
    ///
    /// * 'location' - city name or coordinates
    pub async fn current(&self, location: &Location) -> Result<CurrentWeather, WeatherError> {
        info!("fetching current weather for {}", location);
        let url = format!("{}/weather", self.base_url);

        self.get_with_retry(&url, &self.location_params(location)).await
    }

    /// Retrieves the 5 day, 3-hour interval forecast for a city or a coordinate pair
    ///
    /// # Arguments
    ///
    /// * 'location' - city name or coordinates
    pub async fn forecast(&self, location: &Location) -> Result<Forecast, WeatherError> {
        info!("fetching forecast for {}", location);
        let url = format!("{}/forecast", self.base_url);

        let response: ForecastResponse = self.get_with_retry(&url, &self.location_params(location)).await?;

        Ok(Forecast::from(response))
    }

    /// Returns up to five cities matching a partial name.
    ///
    /// Queries under two characters return an empty list without contacting the provider,
    /// and provider failures are logged and also give an empty list.
    ///
    /// # Arguments
    ///
    /// * 'query' - partial city name
    pub async fn suggest_cities(&self, query: &str) -> Vec<CitySuggestion> {
        let query = query.trim();
        if query.chars().count() < MIN_SUGGEST_QUERY {
            return Vec::new();
        }

        let url = format!("{}/direct", self.geo_url);
        let params = vec![
            ("q", query.to_string()),
            ("limit", SUGGEST_LIMIT.to_string()),
            ("appid", self.api_key.clone()),
        ];

        match self.get_with_retry::<Vec<CitySuggestion>>(&url, &params).await {
            Ok(cities) => cities,
            Err(e) => {
                warn!("failed to fetch city suggestions for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    fn location_params(&self, location: &Location) -> Vec<(&'static str, String)> {
        let mut params = match location {
            Location::City(name) => vec![("q", name.clone())],
            Location::Coordinates(c) => vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())],
        };
        params.push(("appid", self.api_key.clone()));
        params.push(("units", UNITS.to_string()));

        params
    }

    /// Performs a read and repeats it once after a short delay if the first attempt failed
    /// with a transient error
    async fn get_with_retry<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T, WeatherError> {
        match self.get_json(url, params).await {
            Err(e) if e.is_transient() => {
                warn!("transient error from {}: {}, retrying once", url, e);
                tokio::time::sleep(self.retry_delay).await;
                self.get_json(url, params).await
            }
            result => result,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, String)]) -> Result<T, WeatherError> {
        let response = self.client
            .get(url)
            .query(params)
            .send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<UpstreamMessage>(&body)
                .ok()
                .and_then(|m| m.message)
                .unwrap_or_else(|| status.to_string());
            debug!("{} returned {}: {}", url, status, message);

            return Err(WeatherError::from_status(status.as_u16(), message));
        }

        let json = response.text().await?;

        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager_weather::errors::ErrorKind;
    use crate::manager_weather::models::Coordinates;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenWeather {
        let settings = WeatherSettings {
            base_url: format!("{}/data/2.5", server.uri()),
            geo_url: format!("{}/geo/1.0", server.uri()),
            timeout_secs: 2,
            retry_delay_ms: 10,
        };
        OpenWeather::new(&settings, "test-key").unwrap()
    }

    fn current_body() -> serde_json::Value {
        json!({
            "name": "London",
            "coord": {"lat": 51.51, "lon": -0.13},
            "sys": {"country": "GB"},
            "main": {"temp": 12.3, "feels_like": 11.0, "temp_min": 10.0, "temp_max": 14.0, "pressure": 1015, "humidity": 70},
            "weather": [{"main": "Clouds", "description": "broken clouds", "icon": "04d"}],
            "wind": {"speed": 4.1},
            "visibility": 10000,
            "dt": 1709251200,
            "timezone": 0
        })
    }

    #[tokio::test]
    async fn current_by_city_sends_metric_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "London"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&server)
            .await;

        let weather = client_for(&server).current(&Location::City("London".into())).await.unwrap();

        assert_eq!(weather.name, "London");
        assert_eq!(weather.sys.country.as_deref(), Some("GB"));
        assert_eq!(weather.condition().map(|c| c.main.as_str()), Some("Clouds"));
    }

    #[tokio::test]
    async fn current_by_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "51.51"))
            .and(query_param("lon", "-0.13"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&server)
            .await;

        let location = Location::Coordinates(Coordinates { lat: 51.51, lon: -0.13 });
        let weather = client_for(&server).current(&location).await.unwrap();
        assert_eq!(weather.coord.lat, 51.51);
    }

    #[tokio::test]
    async fn unknown_city_is_not_found_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"cod": "404", "message": "city not found"})))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).current(&Location::City("Atlantis".into())).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "city not found");
    }

    #[tokio::test]
    async fn server_error_is_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let err = client_for(&server).current(&Location::City("London".into())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }

    #[tokio::test]
    async fn retry_recovers_from_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&server)
            .await;

        let weather = client_for(&server).current(&Location::City("London".into())).await.unwrap();
        assert_eq!(weather.name, "London");
    }

    #[tokio::test]
    async fn malformed_body_is_a_document_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).current(&Location::City("London".into())).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUpstreamResponse);
    }

    #[tokio::test]
    async fn forecast_flattens_samples() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [{
                    "dt": 1709251200,
                    "main": {"temp": 7.5, "temp_min": 7.0, "temp_max": 8.0, "humidity": 75, "pressure": 1010},
                    "weather": [{"main": "Rain", "description": "light rain", "icon": "10n"}],
                    "clouds": {"all": 100},
                    "wind": {"speed": 5.5},
                    "visibility": 9000
                }],
                "city": {"name": "London", "country": "GB", "coord": {"lat": 51.51, "lon": -0.13}, "timezone": 0}
            })))
            .mount(&server)
            .await;

        let forecast = client_for(&server).forecast(&Location::City("London".into())).await.unwrap();

        assert_eq!(forecast.city.name, "London");
        assert_eq!(forecast.samples.len(), 1);
        assert_eq!(forecast.samples[0].wind_speed, Some(5.5));
        assert_eq!(forecast.samples[0].description.as_deref(), Some("light rain"));
    }

    #[tokio::test]
    async fn short_query_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.suggest_cities("a").await.is_empty());
        assert!(client.suggest_cities(" ").await.is_empty());
    }

    #[tokio::test]
    async fn suggestions_are_mapped_and_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .and(query_param("q", "Lon"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "London", "local_names": {"fr": "Londres"}, "country": "GB", "state": "England", "lat": 51.5, "lon": -0.12},
                {"name": "London", "country": "CA", "lat": 42.98, "lon": -81.24}
            ])))
            .mount(&server)
            .await;

        let cities = client_for(&server).suggest_cities("Lon").await;

        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0].state.as_deref(), Some("England"));
        assert_eq!(cities[1].country, "CA");
        assert_eq!(cities[1].state, None);
    }

    #[tokio::test]
    async fn suggestion_failure_gives_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geo/1.0/direct"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        assert!(client_for(&server).suggest_cities("Paris").await.is_empty());
    }
}
