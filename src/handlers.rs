use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{get, post, web, HttpResponse};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use crate::aggregator::aggregate;
use crate::analytics::{analytics, DayPoint, Stats};
use crate::dashboard::MAX_FORECAST_DAYS;
use crate::errors::ApiError;
use crate::manager_ai::models::{ForecastBrief, WeatherFacts};
use crate::manager_ai::Gemini;
use crate::manager_weather::models::{Coordinates, Location};
use crate::manager_weather::OpenWeather;
use crate::views::{forecast_cards, ForecastCard};

pub struct AppState {
    pub weather: OpenWeather,
    pub ai: Gemini,
    pub forecast_days: usize,
}

#[derive(Deserialize, Debug)]
struct LocationQuery {
    city: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
}

#[derive(Deserialize, Debug)]
struct DailyQuery {
    city: Option<String>,
    lat: Option<String>,
    lon: Option<String>,
    days: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CityQuery {
    #[serde(default)]
    q: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SummaryRequest {
    temperature: Option<f64>,
    description: Option<String>,
    city: Option<String>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
    #[serde(default)]
    forecast: Option<Vec<ForecastBrief>>,
}

#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Serialize)]
struct DailyResponse {
    city: String,
    country: Option<String>,
    skipped: usize,
    days: Vec<ForecastCard>,
}

#[derive(Serialize)]
struct AnalyticsStats {
    #[serde(flatten)]
    stats: Stats,
    #[serde(rename = "lastUpdated")]
    last_updated: DateTime<Utc>,
}

#[derive(Serialize)]
struct AnalyticsResponse {
    city: String,
    days: usize,
    #[serde(rename = "temperatureData")]
    temperature_data: Vec<DayPoint>,
    stats: AnalyticsStats,
}

#[derive(Serialize)]
struct ProviderCheck {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    message: &'static str,
}

/// Resolves query parameters into a location, a non-blank city taking precedence over coordinates
fn parse_location(city: Option<&str>, lat: Option<&str>, lon: Option<&str>) -> Result<Location, ApiError> {
    if let Some(city) = city.map(str::trim).filter(|c| !c.is_empty()) {
        return Ok(Location::City(city.to_string()));
    }

    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            let lat = parse_coordinate(lat, "Latitude", 90.0)?;
            let lon = parse_coordinate(lon, "Longitude", 180.0)?;
            Ok(Location::Coordinates(Coordinates { lat, lon }))
        }
        _ => Err(ApiError::Validation("City name or both latitude and longitude are required".to_string())),
    }
}

fn parse_coordinate(value: &str, name: &str, bound: f64) -> Result<f64, ApiError> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::Validation(format!("{} must be a number", name)))?;

    if !(-bound..=bound).contains(&parsed) {
        return Err(ApiError::Validation(format!("{} must be between {} and {}", name, -bound, bound)));
    }

    Ok(parsed)
}

fn parse_days(days: Option<&str>, default: usize) -> Result<usize, ApiError> {
    let Some(days) = days else {
        return Ok(default);
    };

    days.trim()
        .parse::<usize>()
        .ok()
        .filter(|d| (1..=MAX_FORECAST_DAYS).contains(d))
        .ok_or_else(|| ApiError::Validation(format!("days must be between 1 and {}", MAX_FORECAST_DAYS)))
}

impl SummaryRequest {
    fn into_facts(self) -> Result<WeatherFacts, ApiError> {
        let missing = || ApiError::Validation("Missing required weather data".to_string());

        let facts = WeatherFacts {
            temperature: self.temperature.ok_or_else(missing)?,
            description: self.description.filter(|d| !d.trim().is_empty()).ok_or_else(missing)?,
            city: self.city.filter(|c| !c.trim().is_empty()).ok_or_else(missing)?,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            forecast: self.forecast.unwrap_or_default(),
        };

        Ok(facts)
    }
}

#[get("/weather/current")]
async fn current_weather(params: web::Query<LocationQuery>, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    info!("{:?}", params);

    let location = parse_location(params.city.as_deref(), params.lat.as_deref(), params.lon.as_deref())?;
    let current = data.weather.current(&location).await?;

    Ok(HttpResponse::Ok().json(current))
}

#[get("/weather/forecast")]
async fn forecast_weather(params: web::Query<LocationQuery>, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    info!("{:?}", params);

    let location = parse_location(params.city.as_deref(), params.lat.as_deref(), params.lon.as_deref())?;
    let fetched = data.weather.forecast(&location).await?;

    Ok(HttpResponse::Ok().json(fetched))
}

#[get("/weather/daily")]
async fn daily_forecast(params: web::Query<DailyQuery>, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    info!("{:?}", params);

    let location = parse_location(params.city.as_deref(), params.lat.as_deref(), params.lon.as_deref())?;
    let days = parse_days(params.days.as_deref(), data.forecast_days)?;
    let fetched = data.weather.forecast(&location).await?;

    let offset = fetched.city.offset();
    let aggregation = aggregate(&fetched.samples, days, &offset);
    let today = Utc::now().with_timezone(&offset).date_naive();

    Ok(HttpResponse::Ok().json(DailyResponse {
        days: forecast_cards(&aggregation.days, today, &offset),
        skipped: aggregation.skipped,
        city: fetched.city.name,
        country: fetched.city.country,
    }))
}

#[get("/weather/analytics")]
async fn weather_analytics(params: web::Query<DailyQuery>, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    info!("{:?}", params);

    let location = parse_location(params.city.as_deref(), params.lat.as_deref(), params.lon.as_deref())?;
    let days = parse_days(params.days.as_deref(), data.forecast_days)?;
    let fetched = data.weather.forecast(&location).await?;

    let aggregation = aggregate(&fetched.samples, days, &fetched.city.offset());
    let result = analytics(&aggregation.days);

    Ok(HttpResponse::Ok().json(AnalyticsResponse {
        city: fetched.city.name,
        days: result.series.len(),
        temperature_data: result.series,
        stats: AnalyticsStats { stats: result.stats, last_updated: Utc::now() },
    }))
}

#[get("/weather/cities")]
async fn city_suggestions(params: web::Query<CityQuery>, data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.weather.suggest_cities(&params.q).await)
}

#[post("/gemini/ai-summary")]
async fn ai_summary(body: web::Json<SummaryRequest>, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let facts = body.into_inner().into_facts()?;
    info!("summary requested for {}", facts.city);

    let summary = data.ai.summary_or_fallback(&facts).await;

    Ok(HttpResponse::Ok().json(SummaryResponse { summary }))
}

#[get("/gemini/test")]
async fn ai_check(data: web::Data<AppState>) -> HttpResponse {
    match data.ai.check().await {
        Ok(reply) => HttpResponse::Ok().json(ProviderCheck { success: true, result: Some(reply), error: None }),
        Err(e) => {
            warn!("AI provider check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(ProviderCheck { success: false, result: None, error: Some(e.to_string()) })
        }
    }
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(Health { status: "OK", message: "Server is running" })
}

/// Registers all routes, with malformed query strings and bodies answered as validation errors
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|e, _| ApiError::Validation(e.to_string()).into()))
        .app_data(web::JsonConfig::default().error_handler(|e, _| ApiError::Validation(e.to_string()).into()))
        .service(current_weather)
        .service(forecast_weather)
        .service(daily_forecast)
        .service(weather_analytics)
        .service(city_suggestions)
        .service(ai_summary)
        .service(ai_check)
        .service(health);
}

/// CORS policy for the browser frontend
///
/// # Arguments
///
/// * 'origins' - allowed origins, `*` allows any origin
pub fn cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_any_origin();
    }

    origins
        .iter()
        .fold(cors.supports_credentials(), |cors, origin| cors.allowed_origin(origin))
}
