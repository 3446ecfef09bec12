//! Per-day series and summary statistics over the aggregated forecast.

use chrono::NaiveDate;
use serde::Serialize;
use crate::aggregator::{round_one_decimal, DailyAggregate};

/// One day of the analytics series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub temp: f64,
    pub humidity: u8,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stat {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

/// Statistics over the series, `None` when there are no days
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub temperature: Option<Stat>,
    pub humidity: Option<Stat>,
    pub wind_speed: Option<Stat>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub series: Vec<DayPoint>,
    pub stats: Stats,
}

/// Builds the analytics series and statistics from daily aggregates
///
/// # Arguments
///
/// * 'days' - aggregated forecast in date order
pub fn analytics(days: &[DailyAggregate]) -> Analytics {
    let series: Vec<DayPoint> = days
        .iter()
        .map(|d| DayPoint {
            date: d.date,
            temp: round_one_decimal(d.avg_temp),
            humidity: d.avg_humidity,
            wind_speed: d.avg_wind_speed,
        })
        .collect();

    let stats = Stats {
        temperature: stat(series.iter().map(|p| p.temp)),
        humidity: stat(series.iter().map(|p| f64::from(p.humidity))),
        wind_speed: stat(series.iter().map(|p| p.wind_speed)),
    };

    Analytics { series, stats }
}

fn stat<I: Iterator<Item = f64>>(values: I) -> Option<Stat> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for v in values {
        count += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }

    (count > 0).then(|| Stat { avg: round_one_decimal(sum / count as f64), min, max })
}
