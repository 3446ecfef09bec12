//! Perceived temperature for forecast samples that arrive without one.

use crate::manager_weather::models::WeatherSample;

const MPS_TO_MPH: f64 = 3.6 / 1.609344;

/// Wind chill applies at or below this temperature (°F) ...
const WIND_CHILL_MAX_F: f64 = 50.0;
/// ... and above this wind speed (mph)
const WIND_CHILL_MIN_MPH: f64 = 3.0;

/// Returns the sample's feels-like temperature in Celsius.
///
/// The provider value is used when present, otherwise it is computed from temperature,
/// humidity and wind speed. Samples lacking any of those give `None`.
pub fn feels_like(sample: &WeatherSample) -> Option<f64> {
    if let Some(value) = sample.feels_like {
        return Some(value);
    }

    Some(perceived_temperature(
        sample.temperature?,
        f64::from(sample.humidity?),
        sample.wind_speed?,
    ))
}

/// Calculates the perceived temperature in Celsius, rounded to a tenth.
///
/// Cold and windy conditions use the NWS wind chill formula
/// (https://www.weather.gov/safety/cold-wind-chill-chart), everything else the NOAA heat
/// index (https://www.wpc.ncep.noaa.gov/html/heatindex_equation.shtml).
///
/// # Arguments
///
/// * 'temp_c' - temperature in Celsius
/// * 'humidity' - relative humidity in percent
/// * 'wind_mps' - wind speed in m/s
pub fn perceived_temperature(temp_c: f64, humidity: f64, wind_mps: f64) -> f64 {
    let temp_f = temp_c * 1.8 + 32.0;
    let mph = wind_mps * MPS_TO_MPH;

    let perceived_f = if temp_f <= WIND_CHILL_MAX_F && mph > WIND_CHILL_MIN_MPH {
        wind_chill(temp_f, mph)
    } else {
        heat_index(temp_f, humidity)
    };

    ((perceived_f - 32.0) / 1.8 * 10.0).round() / 10.0
}

fn wind_chill(t: f64, mph: f64) -> f64 {
    let v = mph.powf(0.16);
    35.74 + 0.6215 * t - 35.75 * v + 0.4275 * t * v
}

fn heat_index(t: f64, rh: f64) -> f64 {
    let simple = 0.5 * (t + 61.0 + (t - 68.0) * 1.2 + rh * 0.094);
    if simple < 80.0 {
        return simple;
    }

    let mut hi = -42.379 + 2.04901523 * t + 10.14333127 * rh
        - 0.22475541 * t * rh
        - 0.00683783 * t * t
        - 0.05481717 * rh * rh
        + 0.00122874 * t * t * rh
        + 0.00085282 * t * rh * rh
        - 0.00000199 * t * t * rh * rh;

    if rh < 13.0 && (80.0..=112.0).contains(&t) {
        hi -= ((13.0 - rh) / 4.0) * ((17.0 - (t - 95.0).abs()) / 17.0).sqrt();
    } else if rh > 85.0 && (80.0..=87.0).contains(&t) {
        hi += ((rh - 85.0) / 10.0) * ((87.0 - t) / 5.0);
    }

    hi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_and_windy_uses_wind_chill() {
        // -10 °C at 10 m/s is well below the air temperature
        let value = perceived_temperature(-10.0, 80.0, 10.0);
        assert!(value < -17.0 && value > -22.0, "{}", value);
    }

    #[test]
    fn calm_mild_weather_is_close_to_air_temperature() {
        let value = perceived_temperature(15.0, 50.0, 0.5);
        assert!((value - 15.0).abs() < 1.5, "{}", value);
    }

    #[test]
    fn hot_and_humid_feels_hotter() {
        let value = perceived_temperature(32.0, 70.0, 1.0);
        assert!(value > 36.0, "{}", value);
    }

    #[test]
    fn provider_value_wins() {
        let sample = WeatherSample { feels_like: Some(3.3), temperature: Some(8.0), ..Default::default() };
        assert_eq!(feels_like(&sample), Some(3.3));
    }

    #[test]
    fn computed_when_missing() {
        let sample = WeatherSample {
            temperature: Some(15.0),
            humidity: Some(50),
            wind_speed: Some(0.5),
            ..Default::default()
        };
        assert_eq!(feels_like(&sample), Some(perceived_temperature(15.0, 50.0, 0.5)));

        let incomplete = WeatherSample { temperature: Some(15.0), ..Default::default() };
        assert_eq!(feels_like(&incomplete), None);
    }
}
