use std::fmt;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError, TimestampSeconds};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// What a weather lookup is keyed on
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    City(String),
    Coordinates(Coordinates),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::City(name) => write!(f, "{}", name),
            Location::Coordinates(c) => write!(f, "({:.4}, {:.4})", c.lat, c.lon),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub feels_like: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub pressure: Option<u32>,
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clouds {
    pub all: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sys {
    pub country: Option<String>,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
}

/// Current conditions, in the provider's own layout so it can be passed through as is
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub name: String,
    pub coord: Coordinates,
    #[serde(default)]
    pub sys: Sys,
    pub main: MainReadings,
    pub weather: Vec<Condition>,
    pub wind: Wind,
    pub clouds: Option<Clouds>,
    pub visibility: Option<u32>,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub dt: DateTime<Utc>,
    #[serde(default)]
    pub timezone: i32,
}

impl CurrentWeather {
    /// The primary condition reported by the provider
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

/// One 3-hour forecast point.
///
/// Every field is optional so a sample with missing or garbled values still parses
/// and can be skipped during aggregation instead of failing the whole forecast.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    pub timestamp: Option<DateTime<Utc>>,
    pub temperature: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<u8>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<u32>,
    pub clouds: Option<u8>,
    pub visibility: Option<u32>,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    #[serde(default)]
    pub name: String,
    pub country: Option<String>,
    pub coord: Coordinates,
    /// Shift in seconds from UTC
    #[serde(default)]
    pub timezone: i32,
}

impl ForecastCity {
    /// The city's UTC offset, falling back to UTC when the provider value is out of range
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: ForecastCity,
    pub samples: Vec<WeatherSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitySuggestion {
    pub name: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[serde_as]
#[derive(Deserialize, Default)]
pub(crate) struct ItemMain {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub temp: Option<f64>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub temp_max: Option<f64>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub pressure: Option<u32>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub humidity: Option<u8>,
}

#[derive(Deserialize, Default)]
pub(crate) struct ItemCondition {
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[serde_as]
#[derive(Deserialize, Default)]
pub(crate) struct ItemWind {
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub speed: Option<f64>,
}

#[serde_as]
#[derive(Deserialize, Default)]
pub(crate) struct ForecastItem {
    #[serde_as(as = "DefaultOnError<Option<TimestampSeconds<i64>>>")]
    #[serde(default)]
    pub dt: Option<DateTime<Utc>>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub main: ItemMain,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub weather: Vec<ItemCondition>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub clouds: Option<Clouds>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub wind: ItemWind,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub visibility: Option<u32>,
}

/// A list entry that is not an object at all becomes an empty item, skipped during aggregation
#[serde_as]
#[derive(Deserialize)]
pub(crate) struct ForecastResponse {
    #[serde_as(as = "Vec<DefaultOnError>")]
    pub list: Vec<ForecastItem>,
    pub city: ForecastCity,
}

impl From<ForecastItem> for WeatherSample {
    fn from(item: ForecastItem) -> Self {
        let condition = item.weather.into_iter().next().unwrap_or_default();

        WeatherSample {
            timestamp: item.dt,
            temperature: item.main.temp,
            temp_min: item.main.temp_min,
            temp_max: item.main.temp_max,
            feels_like: item.main.feels_like,
            humidity: item.main.humidity,
            wind_speed: item.wind.speed,
            pressure: item.main.pressure,
            clouds: item.clouds.map(|c| c.all),
            visibility: item.visibility,
            condition: condition.main,
            description: condition.description,
            icon: condition.icon,
        }
    }
}

impl From<ForecastResponse> for Forecast {
    fn from(response: ForecastResponse) -> Self {
        Forecast {
            city: response.city,
            samples: response.list.into_iter().map(WeatherSample::from).collect(),
        }
    }
}
