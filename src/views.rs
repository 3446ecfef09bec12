//! Display-ready forecast cards built from daily aggregates.

use chrono::{Datelike, NaiveDate, TimeZone};
use serde::Serialize;
use crate::aggregator::DailyAggregate;
use crate::feels_like::feels_like;
use crate::manager_weather::models::WeatherSample;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// One row of a day's drill-down view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyEntry {
    pub time: String,
    pub temp: Option<f64>,
    pub feels_like: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub humidity: Option<u8>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<u32>,
    pub clouds: Option<u8>,
    pub visibility: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastCard {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub weekday: String,
    pub day_of_month: u32,
    pub month: String,
    pub avg_temp: i64,
    pub min_temp: i64,
    pub max_temp: i64,
    pub condition: Option<String>,
    pub icon_url: Option<String>,
    pub humidity: u8,
    pub wind_speed: String,
    pub feels_like: Option<i64>,
    pub pressure: Option<i64>,
    pub clouds: Option<i64>,
    pub is_today: bool,
    pub hourly: Vec<HourlyEntry>,
}

/// Large icon url for a provider icon code
pub fn icon_url(icon: &str) -> String {
    format!("{}/{}@2x.png", ICON_BASE_URL, icon)
}

/// Builds one card per aggregated day
///
/// # Arguments
///
/// * 'days' - aggregated forecast
/// * 'today' - date flagged as today on the matching card
/// * 'tz' - time zone the hourly times are shown in
pub fn forecast_cards<Tz: TimeZone>(days: &[DailyAggregate], today: NaiveDate, tz: &Tz) -> Vec<ForecastCard> {
    days.iter().map(|day| forecast_card(day, today, tz)).collect()
}

fn forecast_card<Tz: TimeZone>(day: &DailyAggregate, today: NaiveDate, tz: &Tz) -> ForecastCard {
    let hourly: Vec<HourlyEntry> = day.samples.iter().map(|s| hourly_entry(s, tz)).collect();

    ForecastCard {
        date: day.date,
        day_of_week: day.date.format("%a").to_string(),
        weekday: day.date.format("%A").to_string(),
        day_of_month: day.date.day(),
        month: day.date.format("%b").to_string(),
        avg_temp: day.display_temp(),
        min_temp: day.min_temp.round() as i64,
        max_temp: day.max_temp.round() as i64,
        condition: day.condition.clone(),
        icon_url: day.icon.as_deref().map(icon_url),
        humidity: day.avg_humidity,
        wind_speed: format!("{:.1}", day.avg_wind_speed),
        feels_like: rounded_mean(hourly.iter().filter_map(|h| h.feels_like)),
        pressure: rounded_mean(hourly.iter().filter_map(|h| h.pressure.map(f64::from))),
        clouds: rounded_mean(hourly.iter().filter_map(|h| h.clouds.map(f64::from))),
        is_today: day.date == today,
        hourly,
    }
}

fn hourly_entry<Tz: TimeZone>(sample: &WeatherSample, tz: &Tz) -> HourlyEntry {
    let time = sample
        .timestamp
        .map(|ts| ts.with_timezone(tz).naive_local().format("%I %p").to_string())
        .unwrap_or_default();

    HourlyEntry {
        time,
        temp: sample.temperature,
        feels_like: feels_like(sample),
        description: sample.description.clone(),
        icon: sample.icon.clone(),
        humidity: sample.humidity,
        wind_speed: sample.wind_speed,
        pressure: sample.pressure,
        clouds: sample.clouds,
        visibility: sample.visibility,
    }
}

fn rounded_mean<I: Iterator<Item = f64>>(values: I) -> Option<i64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| (sum / count as f64).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use chrono::{FixedOffset, NaiveDate, Utc};

    fn sample(hour: u32, temp: f64, pressure: u32) -> WeatherSample {
        WeatherSample {
            timestamp: Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(hour, 0, 0).unwrap().and_utc()),
            temperature: Some(temp),
            temp_min: Some(temp - 0.4),
            temp_max: Some(temp + 0.6),
            feels_like: Some(temp - 2.0),
            humidity: Some(70),
            wind_speed: Some(3.25),
            pressure: Some(pressure),
            clouds: Some(40),
            visibility: Some(10000),
            condition: Some("Clouds".into()),
            description: Some("scattered clouds".into()),
            icon: Some("03d".into()),
        }
    }

    #[test]
    fn card_fields() {
        let samples = vec![sample(9, 8.0, 1010), sample(12, 11.0, 1013), sample(15, 12.0, 1012)];
        let days = aggregate(&samples, 5, &Utc).days;
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let cards = forecast_cards(&days, today, &Utc);
        let card = &cards[0];

        assert_eq!(card.day_of_week, "Fri");
        assert_eq!(card.weekday, "Friday");
        assert_eq!(card.day_of_month, 1);
        assert_eq!(card.month, "Mar");
        assert_eq!(card.avg_temp, 10);
        assert_eq!(card.min_temp, 8);
        assert_eq!(card.max_temp, 13);
        assert_eq!(card.icon_url.as_deref(), Some("https://openweathermap.org/img/wn/03d@2x.png"));
        assert_eq!(card.wind_speed, "3.3");
        assert_eq!(card.feels_like, Some(8));
        assert_eq!(card.pressure, Some(1012));
        assert_eq!(card.clouds, Some(40));
        assert!(card.is_today);
        assert_eq!(card.hourly.len(), 3);
        assert_eq!(card.hourly[0].time, "09 AM");
        assert_eq!(card.hourly[2].time, "03 PM");
    }

    #[test]
    fn hourly_times_follow_time_zone() {
        let samples = vec![sample(9, 8.0, 1010)];
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let days = aggregate(&samples, 5, &tz).days;

        let cards = forecast_cards(&days, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), &tz);
        assert_eq!(cards[0].hourly[0].time, "04 AM");
        assert!(!cards[0].is_today);
    }

    #[test]
    fn missing_feels_like_is_computed() {
        let mut s = sample(12, 15.0, 1010);
        s.feels_like = None;
        let days = aggregate(&[s], 1, &Utc).days;

        let cards = forecast_cards(&days, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(), &Utc);
        assert!(cards[0].hourly[0].feels_like.is_some());
    }
}
