use std::{fmt, str::FromStr};

use crate::{DailyObservation, HourlyObservation};

/// Unit system applied to materialized observations.
///
/// Bulk data is stored metric, so `Metric` is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Scientific,
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "scientific" => Ok(Units::Scientific),
            other => Err(format!("unknown unit system: {}", other)),
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Metric => write!(f, "metric"),
            Units::Imperial => write!(f, "imperial"),
            Units::Scientific => write!(f, "scientific"),
        }
    }
}

impl Units {
    fn temperature(self, celsius: f64) -> f64 {
        match self {
            Units::Metric => celsius,
            Units::Imperial => round(celsius * 9.0 / 5.0 + 32.0, 1),
            Units::Scientific => round(celsius + 273.15, 1),
        }
    }

    /// Millimetres of precipitation or snow depth
    fn depth(self, mm: f64) -> f64 {
        match self {
            Units::Imperial => round(mm / 25.4, 3),
            Units::Metric | Units::Scientific => mm,
        }
    }

    /// km/h
    fn speed(self, kmh: f64) -> f64 {
        match self {
            Units::Metric => kmh,
            Units::Imperial => round(kmh * 0.6214, 1),
            Units::Scientific => round(kmh / 3.6, 1),
        }
    }

    pub fn convert_daily(self, obs: &mut DailyObservation) {
        if self == Units::Metric {
            return;
        }
        for value in [&mut obs.tavg, &mut obs.tmin, &mut obs.tmax] {
            *value = value.map(|v| self.temperature(v));
        }
        for value in [&mut obs.prcp, &mut obs.snow] {
            *value = value.map(|v| self.depth(v));
        }
        for value in [&mut obs.wspd, &mut obs.wpgt] {
            *value = value.map(|v| self.speed(v));
        }
    }

    pub fn convert_hourly(self, obs: &mut HourlyObservation) {
        if self == Units::Metric {
            return;
        }
        for value in [&mut obs.temp, &mut obs.dwpt] {
            *value = value.map(|v| self.temperature(v));
        }
        for value in [&mut obs.prcp, &mut obs.snow] {
            *value = value.map(|v| self.depth(v));
        }
        for value in [&mut obs.wspd, &mut obs.wpgt] {
            *value = value.map(|v| self.speed(v));
        }
    }
}

fn round(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
