//! Dashboard state and the single transition function that changes it.
//!
//! Every user action or finished fetch is expressed as an [`Action`] and folded into a
//! [`DashboardState`] by [`reduce`]. The async helpers in this module perform the network
//! work and hand back the action to apply.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use chrono::Utc;
use log::{info, warn};
use crate::aggregator::{aggregate, Aggregation, DailyAggregate};
use crate::manager_ai::models::{ForecastBrief, WeatherFacts};
use crate::manager_ai::Gemini;
use crate::manager_cities::errors::CityError;
use crate::manager_cities::models::SavedCity;
use crate::manager_cities::storage::KeyValueStore;
use crate::manager_cities::SavedCities;
use crate::manager_weather::errors::{ErrorKind, WeatherError};
use crate::manager_weather::models::{Coordinates, CurrentWeather, Forecast, Location};
use crate::manager_weather::OpenWeather;

/// The provider's forecast covers five days
pub const MAX_FORECAST_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub loading: bool,
    pub error: Option<String>,
    pub selected: Option<Location>,
    pub current: Option<CurrentWeather>,
    pub forecast: Option<Forecast>,
    pub forecast_days: usize,
    pub daily: Aggregation,
    pub summary: Option<String>,
    pub requesting_location: bool,
    /// Latest current conditions per saved city, keyed by saved name
    pub saved_weather: HashMap<String, CurrentWeather>,
}

impl DashboardState {
    pub fn new(forecast_days: usize) -> Self {
        Self {
            forecast_days: forecast_days.clamp(1, MAX_FORECAST_DAYS),
            ..Self::default()
        }
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            loading: false,
            error: None,
            selected: None,
            current: None,
            forecast: None,
            forecast_days: MAX_FORECAST_DAYS,
            daily: Aggregation::default(),
            summary: None,
            requesting_location: false,
            saved_weather: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A city was picked from search or the saved list, or geolocation resolved
    LocationSelected(Location),
    LocationRequested,
    /// Geolocation failed or timed out, the user has to search instead
    LocationFailed(String),
    WeatherLoaded { current: CurrentWeather, forecast: Forecast },
    FetchFailed(String),
    ForecastDaysChanged(usize),
    SummaryReady(String),
    SavedWeatherRefreshed(HashMap<String, CurrentWeather>),
    SavedCityRemoved(String),
}

/// Applies one action to the dashboard state
///
/// # Arguments
///
/// * 'state' - the current state, consumed
/// * 'action' - what happened
pub fn reduce(mut state: DashboardState, action: Action) -> DashboardState {
    match action {
        Action::LocationSelected(location) => {
            state.selected = Some(location);
            state.loading = true;
            state.error = None;
            state.requesting_location = false;
            state.summary = None;
        }
        Action::LocationRequested => {
            state.requesting_location = true;
            state.error = None;
        }
        Action::LocationFailed(message) => {
            state.requesting_location = false;
            state.loading = false;
            state.error = Some(message);
        }
        Action::WeatherLoaded { current, forecast } => {
            state.loading = false;
            state.error = None;
            state.current = Some(current);
            state.forecast = Some(forecast);
            state.summary = None;
            recompute_daily(&mut state);
        }
        Action::FetchFailed(message) => {
            // Last good data stays on screen
            state.loading = false;
            state.error = Some(message);
        }
        Action::ForecastDaysChanged(days) => {
            state.forecast_days = days.clamp(1, MAX_FORECAST_DAYS);
            recompute_daily(&mut state);
        }
        Action::SummaryReady(summary) => {
            state.summary = Some(summary);
        }
        Action::SavedWeatherRefreshed(weather) => {
            state.saved_weather.extend(weather);
        }
        Action::SavedCityRemoved(name) => {
            let name = name.trim().to_lowercase();
            state.saved_weather.retain(|k, _| k.to_lowercase() != name);
        }
    }

    state
}

fn recompute_daily(state: &mut DashboardState) {
    state.daily = match &state.forecast {
        Some(forecast) => aggregate(&forecast.samples, state.forecast_days, &forecast.city.offset()),
        None => Aggregation::default(),
    };
}

/// Fetches current conditions and forecast concurrently and returns the action to apply
///
/// # Arguments
///
/// * 'weather' - weather provider client
/// * 'location' - city name or coordinates
pub async fn load_weather(weather: &OpenWeather, location: &Location) -> Action {
    let (current, forecast) = tokio::join!(weather.current(location), weather.forecast(location));

    match (current, forecast) {
        (Ok(current), Ok(forecast)) => Action::WeatherLoaded { current, forecast },
        (Err(e), _) | (_, Err(e)) => {
            warn!("failed to load weather for {}: {}", location, e);
            Action::FetchFailed(user_message(&e, location))
        }
    }
}

/// Selects a location and loads its weather in one go
pub async fn show_location(weather: &OpenWeather, state: DashboardState, location: Location) -> DashboardState {
    let state = reduce(state, Action::LocationSelected(location.clone()));
    let action = load_weather(weather, &location).await;

    reduce(state, action)
}

/// Message shown to the user for a failed weather fetch
pub fn user_message(error: &WeatherError, location: &Location) -> String {
    match error.kind() {
        ErrorKind::NotFound => format!("Could not find weather for {}. Please check the city name.", location),
        ErrorKind::Validation => "Please enter a valid city name or coordinates.".to_string(),
        ErrorKind::UpstreamUnavailable => "Weather service temporarily unavailable. Please try again later.".to_string(),
        ErrorKind::InvalidUpstreamResponse => "Received an unexpected response from the weather service.".to_string(),
    }
}

/// Waits for a position from the given locator, but never longer than `limit`
///
/// # Arguments
///
/// * 'locate' - future resolving to the device's coordinates or a failure reason
/// * 'limit' - how long to wait before falling back to manual search
pub async fn request_location<F>(locate: F, limit: Duration) -> Action
where
    F: Future<Output = Result<Coordinates, String>>,
{
    match tokio::time::timeout(limit, locate).await {
        Ok(Ok(coordinates)) => {
            info!("resolved device location to ({:.4}, {:.4})", coordinates.lat, coordinates.lon);
            Action::LocationSelected(Location::Coordinates(coordinates))
        }
        Ok(Err(reason)) => {
            warn!("geolocation failed: {}", reason);
            Action::LocationFailed(format!("Unable to get your location ({}). Please search for a city instead.", reason))
        }
        Err(_) => {
            warn!("geolocation timed out after {:?}", limit);
            Action::LocationFailed("Location request timed out. Please search for a city instead.".to_string())
        }
    }
}

/// Saves a city after confirming the provider knows it
///
/// Names already saved are rejected before any request is made. The stored city carries
/// the provider's spelling, country and coordinates.
///
/// # Arguments
///
/// * 'weather' - weather provider client
/// * 'saved' - the saved cities
/// * 'name' - city name as typed by the user
pub async fn add_saved_city<S: KeyValueStore>(
    weather: &OpenWeather,
    saved: &mut SavedCities<S>,
    name: &str,
) -> Result<(SavedCity, CurrentWeather), CityError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CityError::Lookup("Please enter a city name".to_string()));
    }
    if saved.contains(name) {
        return Err(CityError::Duplicate(name.to_string()));
    }

    let location = Location::City(name.to_string());
    let current = weather
        .current(&location)
        .await
        .map_err(|e| CityError::Lookup(user_message(&e, &location)))?;

    let city = SavedCity {
        name: current.name.clone(),
        country: current.sys.country.clone().unwrap_or_default(),
        state: None,
        lat: current.coord.lat,
        lon: current.coord.lon,
        added_at: Utc::now(),
    };
    saved.add(city.clone())?;

    Ok((city, current))
}

/// Facts for an AI summary, or `None` when the current conditions carry no description
///
/// # Arguments
///
/// * 'current' - current conditions
/// * 'days' - aggregated forecast, one brief line per day
pub fn facts_from(current: &CurrentWeather, days: &[DailyAggregate]) -> Option<WeatherFacts> {
    let condition = current.condition()?;

    Some(WeatherFacts {
        temperature: current.main.temp,
        description: condition.description.clone(),
        city: current.name.clone(),
        humidity: Some(f64::from(current.main.humidity)),
        wind_speed: Some(current.wind.speed),
        forecast: days.iter().map(brief).collect(),
    })
}

fn brief(day: &DailyAggregate) -> ForecastBrief {
    let description = day
        .samples
        .iter()
        .find(|s| s.condition.is_some() && s.condition == day.condition)
        .and_then(|s| s.description.clone())
        .or_else(|| day.condition.clone())
        .unwrap_or_default();

    ForecastBrief {
        date: day.date.to_string(),
        temp: day.display_temp() as f64,
        description,
    }
}

/// Summary action for the state's current conditions, or `None` if nothing is loaded
pub async fn annotate(ai: &Gemini, state: &DashboardState) -> Option<Action> {
    let facts = facts_from(state.current.as_ref()?, &state.daily.days)?;

    Some(Action::SummaryReady(ai.summary_or_fallback(&facts).await))
}
