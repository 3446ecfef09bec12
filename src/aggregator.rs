//! Groups 3-hour forecast samples into per-day summaries.

use std::collections::BTreeMap;
use chrono::{NaiveDate, TimeZone};
use serde::Serialize;
use crate::manager_weather::models::WeatherSample;

/// One calendar day summarised from the forecast samples that fall on it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    /// Unrounded mean temperature, see [`DailyAggregate::display_temp`]
    pub avg_temp: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub avg_humidity: u8,
    /// Mean wind speed rounded to one decimal
    pub avg_wind_speed: f64,
    pub condition: Option<String>,
    pub icon: Option<String>,
    pub samples: Vec<WeatherSample>,
}

impl DailyAggregate {
    /// Mean temperature rounded to a whole degree
    pub fn display_temp(&self) -> i64 {
        self.avg_temp.round() as i64
    }
}

/// Result of one aggregation pass
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Aggregation {
    pub days: Vec<DailyAggregate>,
    /// Samples left out because a required value was missing
    pub skipped: usize,
}

/// Readings of a sample that has everything aggregation needs
struct Reading<'a> {
    sample: &'a WeatherSample,
    temp: f64,
    low: f64,
    high: f64,
    humidity: u8,
    wind_speed: f64,
}

impl<'a> Reading<'a> {
    fn from_sample(sample: &'a WeatherSample) -> Option<Self> {
        let temp = sample.temperature.filter(|t| t.is_finite())?;
        let humidity = sample.humidity?;
        let wind_speed = sample.wind_speed.filter(|w| w.is_finite())?;

        // Bounds always enclose the sample's own temperature so min <= avg <= max holds per day
        let low = sample.temp_min.filter(|t| t.is_finite()).map_or(temp, |t| t.min(temp));
        let high = sample.temp_max.filter(|t| t.is_finite()).map_or(temp, |t| t.max(temp));

        Some(Reading { sample, temp, low, high, humidity, wind_speed })
    }
}

/// Aggregates forecast samples into at most `day_limit` days, in calendar order.
///
/// Samples are grouped by the calendar date of their timestamp in `tz`. Within a day the
/// dominant condition is the most frequent label, ties going to the label seen first in
/// sample order, and the icon comes from the first sample carrying that label.
///
/// A sample without timestamp, temperature, humidity or wind speed is counted in
/// [`Aggregation::skipped`] and left out. A day with no usable sample is omitted.
///
/// # Arguments
///
/// * 'samples' - forecast samples, normally in time order
/// * 'day_limit' - maximum number of days to return, the earliest dates win
/// * 'tz' - time zone deciding where one day ends and the next begins
pub fn aggregate<Tz: TimeZone>(samples: &[WeatherSample], day_limit: usize, tz: &Tz) -> Aggregation {
    let mut skipped = 0;
    let mut groups: BTreeMap<NaiveDate, Vec<Reading>> = BTreeMap::new();

    for sample in samples {
        let date = sample.timestamp.map(|ts| ts.with_timezone(tz).date_naive());
        match (date, Reading::from_sample(sample)) {
            (Some(date), Some(reading)) => groups.entry(date).or_default().push(reading),
            _ => skipped += 1,
        }
    }

    let days = groups
        .into_iter()
        .take(day_limit)
        .map(|(date, readings)| summarise(date, &readings))
        .collect();

    Aggregation { days, skipped }
}

fn summarise(date: NaiveDate, readings: &[Reading]) -> DailyAggregate {
    let count = readings.len() as f64;

    let avg_temp = readings.iter().map(|r| r.temp).sum::<f64>() / count;
    let min_temp = readings.iter().map(|r| r.low).fold(f64::INFINITY, f64::min);
    let max_temp = readings.iter().map(|r| r.high).fold(f64::NEG_INFINITY, f64::max);
    let avg_humidity = (readings.iter().map(|r| f64::from(r.humidity)).sum::<f64>() / count).round() as u8;
    let avg_wind_speed = round_one_decimal(readings.iter().map(|r| r.wind_speed).sum::<f64>() / count);

    let (condition, icon) = match dominant_condition(readings) {
        Some((label, icon)) => (Some(label.to_string()), icon.map(str::to_string)),
        None => (None, None),
    };

    DailyAggregate {
        date,
        avg_temp,
        min_temp,
        max_temp,
        avg_humidity,
        avg_wind_speed,
        condition,
        icon,
        samples: readings.iter().map(|r| r.sample.clone()).collect(),
    }
}

/// Most frequent condition label and the icon of its first occurrence.
///
/// Labels are kept in first-seen order and only a strictly higher count replaces the
/// current leader, so ties resolve to the earliest label.
fn dominant_condition<'a>(readings: &'a [Reading]) -> Option<(&'a str, Option<&'a str>)> {
    let mut tally: Vec<(&str, Option<&str>, usize)> = Vec::new();

    for r in readings {
        let Some(label) = r.sample.condition.as_deref() else { continue };
        match tally.iter_mut().find(|(l, _, _)| *l == label) {
            Some(entry) => entry.2 += 1,
            None => tally.push((label, r.sample.icon.as_deref(), 1)),
        }
    }

    let mut leader: Option<&(&str, Option<&str>, usize)> = None;
    for entry in &tally {
        if leader.map_or(true, |l| entry.2 > l.2) {
            leader = Some(entry);
        }
    }

    leader.map(|(label, icon, _)| (*label, *icon))
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
