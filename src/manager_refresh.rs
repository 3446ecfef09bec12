use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use std::time::Duration;
use log::{info, warn};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use crate::dashboard::{reduce, Action, DashboardState};
use crate::manager_cities::models::SavedCity;
use crate::manager_cities::storage::KeyValueStore;
use crate::manager_cities::SavedCities;
use crate::manager_weather::models::{Coordinates, CurrentWeather, Location};
use crate::manager_weather::OpenWeather;

/// Fetches current conditions for every given city concurrently, one task per city.
///
/// Cities that fail are logged and left out of the result.
///
/// # Arguments
///
/// * 'weather' - weather provider client
/// * 'cities' - cities to refresh, looked up by their saved coordinates
pub async fn refresh_saved(weather: Arc<OpenWeather>, cities: Vec<SavedCity>) -> HashMap<String, CurrentWeather> {
    let mut tasks = JoinSet::new();

    for city in cities {
        let weather = weather.clone();
        tasks.spawn(async move {
            let location = Location::Coordinates(Coordinates { lat: city.lat, lon: city.lon });
            let result = weather.current(&location).await;
            (city.name, result)
        });
    }

    let mut refreshed = HashMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((name, Ok(current))) => {
                refreshed.insert(name, current);
            }
            Ok((name, Err(e))) => warn!("failed to refresh weather for {}: {}", name, e),
            Err(e) => warn!("refresh task failed: {}", e),
        }
    }

    refreshed
}

/// One refresh pass over the saved cities, merged into the dashboard state
///
/// Neither lock is held while the provider is being queried.
///
/// # Arguments
///
/// * 'weather' - weather provider client
/// * 'saved' - the saved cities
/// * 'state' - dashboard state to merge results into
pub async fn refresh_once<S: KeyValueStore>(
    weather: Arc<OpenWeather>,
    saved: &Mutex<SavedCities<S>>,
    state: &Mutex<DashboardState>,
) -> usize {
    let cities = saved.lock().await.cities().to_vec();
    if cities.is_empty() {
        return 0;
    }

    let refreshed = refresh_saved(weather, cities).await;
    let count = refreshed.len();

    let mut state = state.lock().await;
    *state = reduce(mem::take(&mut *state), Action::SavedWeatherRefreshed(refreshed));

    count
}

/// Saved city refresh loop
///
/// # Arguments
///
/// * 'weather' - weather provider client
/// * 'saved' - the saved cities
/// * 'state' - dashboard state to merge results into
/// * 'period' - time between refresh passes
pub async fn run_refresh<S: KeyValueStore>(
    weather: Arc<OpenWeather>,
    saved: Arc<Mutex<SavedCities<S>>>,
    state: Arc<Mutex<DashboardState>>,
    period: Duration,
) {
    loop {
        let count = refresh_once(weather.clone(), &saved, &state).await;
        info!("refreshed weather for {} saved cities", count);

        tokio::time::sleep(period).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initialization::WeatherSettings;
    use crate::manager_cities::storage::MemoryStore;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> Arc<OpenWeather> {
        let settings = WeatherSettings {
            base_url: format!("{}/data/2.5", server.uri()),
            geo_url: format!("{}/geo/1.0", server.uri()),
            timeout_secs: 2,
            retry_delay_ms: 10,
        };
        Arc::new(OpenWeather::new(&settings, "test-key").unwrap())
    }

    fn city(name: &str, lat: f64) -> SavedCity {
        SavedCity {
            name: name.to_string(),
            country: "XX".to_string(),
            state: None,
            lat,
            lon: 10.0,
            added_at: Utc::now(),
        }
    }

    async fn mount_current(server: &MockServer, lat: &str, name: &str, temp: f64) {
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", lat))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": name,
                "coord": {"lat": 1.0, "lon": 10.0},
                "main": {"temp": temp, "humidity": 50},
                "weather": [{"main": "Clear", "description": "clear sky", "icon": "01d"}],
                "wind": {"speed": 1.0},
                "dt": 1709290800
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn failures_are_skipped() {
        let server = MockServer::start().await;
        mount_current(&server, "1", "Oslo", 3.0).await;
        mount_current(&server, "2", "Lima", 19.0).await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "3"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let cities = vec![city("Oslo", 1.0), city("Lima", 2.0), city("Nowhere", 3.0)];
        let refreshed = refresh_saved(client_for(&server), cities).await;

        assert_eq!(refreshed.len(), 2);
        assert_eq!(refreshed["Oslo"].main.temp, 3.0);
        assert_eq!(refreshed["Lima"].main.temp, 19.0);
        assert!(!refreshed.contains_key("Nowhere"));
    }

    #[tokio::test]
    async fn refresh_merges_into_state() {
        let server = MockServer::start().await;
        mount_current(&server, "1", "Oslo", 3.0).await;

        let mut saved = SavedCities::load(MemoryStore::new()).unwrap();
        saved.add(city("Oslo", 1.0)).unwrap();
        let saved = Mutex::new(saved);

        let mut initial = DashboardState::new(3);
        initial.error = Some("kept".to_string());
        let state = Mutex::new(initial);

        let count = refresh_once(client_for(&server), &saved, &state).await;

        let state = state.lock().await;
        assert_eq!(count, 1);
        assert_eq!(state.saved_weather["Oslo"].name, "Oslo");
        assert_eq!(state.forecast_days, 3);
        assert_eq!(state.error.as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn nothing_saved_makes_no_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let saved = Mutex::new(SavedCities::load(MemoryStore::new()).unwrap());
        let state = Mutex::new(DashboardState::default());

        assert_eq!(refresh_once(client_for(&server), &saved, &state).await, 0);
    }

    #[tokio::test]
    async fn loop_refreshes_in_background() {
        let server = MockServer::start().await;
        mount_current(&server, "1", "Oslo", 3.0).await;

        let mut saved = SavedCities::load(MemoryStore::new()).unwrap();
        saved.add(city("Oslo", 1.0)).unwrap();
        let saved = Arc::new(Mutex::new(saved));
        let state = Arc::new(Mutex::new(DashboardState::default()));

        let handle = tokio::spawn(run_refresh(
            client_for(&server),
            saved.clone(),
            state.clone(),
            Duration::from_millis(20),
        ));

        let mut refreshed = false;
        for _ in 0..100 {
            if state.lock().await.saved_weather.contains_key("Oslo") {
                refreshed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert!(refreshed);
    }
}
