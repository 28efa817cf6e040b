use std::{collections::HashSet, ops::Deref};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A named place. Identity is the `name` alone: two entries with the same name
/// and different coordinates are treated as the same place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self { name: name.into(), latitude: Some(latitude), longitude: Some(longitude) }
    }

    /// `(latitude, longitude)` when both are present and finite.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Keeps the first occurrence of every name, in order, up to `limit` entries.
fn dedup_by_name(locations: impl IntoIterator<Item = Location>, limit: usize) -> Vec<Location> {
    let mut seen = HashSet::new();
    locations
        .into_iter()
        .filter(|location| seen.insert(location.name.clone()))
        .take(limit)
        .collect()
}

/// Search suggestions: at most [`CandidateSet::LIMIT`] entries, unique by name,
/// in the order the geocoder returned them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandidateSet(Vec<Location>);

impl CandidateSet {
    pub const LIMIT: usize = 3;

    pub fn from_results(results: impl IntoIterator<Item = Location>) -> Self {
        Self(dedup_by_name(results, Self::LIMIT))
    }

    pub fn find(&self, name: &str) -> Option<&Location> {
        self.0.iter().find(|location| location.name == name)
    }
}

impl Deref for CandidateSet {
    type Target = [Location];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Recently viewed places, most recent first.
///
/// Holds at most [`HistoryList::CAPACITY`] entries with unique names. Lists
/// read back from storage are normalized to the same rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Location>", into = "Vec<Location>")]
pub struct HistoryList(Vec<Location>);

impl HistoryList {
    pub const CAPACITY: usize = 3;

    /// New list with `location` at the front and any older entry of the same
    /// name removed.
    pub fn with_recorded(&self, location: Location) -> Self {
        let entries: Vec<_> = std::iter::once(location).chain(self.0.iter().cloned()).collect();
        Self::from(entries)
    }

    pub fn find(&self, name: &str) -> Option<&Location> {
        self.0.iter().find(|location| location.name == name)
    }
}

impl From<Vec<Location>> for HistoryList {
    fn from(locations: Vec<Location>) -> Self {
        Self(dedup_by_name(locations, Self::CAPACITY))
    }
}

impl From<HistoryList> for Vec<Location> {
    fn from(list: HistoryList) -> Self {
        list.0
    }
}

impl Deref for HistoryList {
    type Target = [Location];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Coarse weather categories for WMO weather interpretation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Showers,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    /// See https://open-meteo.com/en/docs, "WMO Weather interpretation codes".
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1 | 2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51..=57 => Self::Drizzle,
            61..=67 => Self::Rain,
            71..=77 | 85 | 86 => Self::Snow,
            80..=82 => Self::Showers,
            95..=99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear sky",
            Self::PartlyCloudy => "Cloudy with sun",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Showers => "Rain showers",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }
}

/// Current conditions as reported by the weather collaborator.
///
/// Units are kept as delivered: `windspeed` is km/h, `wind_gust` is m/s.
/// The collaborator does not currently send a gust value, so `wind_gust` is
/// normally `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub windspeed: f64,
    pub wind_gust: Option<f64>,
    pub condition: Option<WeatherCondition>,
}

/// Daily forecast as parallel sequences; index `i` is the same day in each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub dates: Vec<NaiveDate>,
    pub max_temps: Vec<f64>,
    pub min_temps: Vec<f64>,
    /// Same length as `dates`, or empty when the collaborator sent no codes.
    pub conditions: Vec<WeatherCondition>,
    /// Same length as `dates`, or empty when the collaborator sent none.
    pub max_windspeeds: Vec<f64>,
}

impl Forecast {
    pub const DAYS: usize = 5;

    /// Truncates every series to the shortest of the three required ones, and
    /// to at most [`Forecast::DAYS`] entries. Optional series that are too
    /// short to cover every day are dropped.
    pub fn from_daily(
        mut dates: Vec<NaiveDate>,
        mut max_temps: Vec<f64>,
        mut min_temps: Vec<f64>,
        weather_codes: Vec<i32>,
        mut max_windspeeds: Vec<f64>,
    ) -> Self {
        let days = dates.len().min(max_temps.len()).min(min_temps.len()).min(Self::DAYS);

        dates.truncate(days);
        max_temps.truncate(days);
        min_temps.truncate(days);

        let conditions = if weather_codes.len() >= days {
            weather_codes.into_iter().take(days).map(WeatherCondition::from_wmo_code).collect()
        } else {
            Vec::new()
        };

        if max_windspeeds.len() >= days {
            max_windspeeds.truncate(days);
        } else {
            max_windspeeds.clear();
        }

        Self { dates, max_temps, min_temps, conditions, max_windspeeds }
    }

    /// Number of days covered by all three required series.
    pub fn len(&self) -> usize {
        self.dates.len().min(self.max_temps.len()).min(self.min_temps.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn days(&self) -> impl Iterator<Item = ForecastDay> + '_ {
        self.dates.iter().zip(&self.max_temps).zip(&self.min_temps).enumerate().map(
            move |(i, ((&date, &max_temp), &min_temp))| ForecastDay {
                date,
                max_temp,
                min_temp,
                condition: self.conditions.get(i).copied(),
                max_windspeed: self.max_windspeeds.get(i).copied(),
            },
        )
    }
}

/// One row of a [`Forecast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub max_temp: f64,
    pub min_temp: f64,
    pub condition: Option<WeatherCondition>,
    pub max_windspeed: Option<f64>,
}

impl ForecastDay {
    /// e.g. "Monday"
    pub fn weekday_name(&self) -> String {
        self.date.format("%A").to_string()
    }

    /// e.g. "06/03"
    pub fn short_date(&self) -> String {
        self.date.format("%m/%d").to_string()
    }
}

/// Result of one weather fetch, shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub conditions: CurrentConditions,
    pub forecast: Forecast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    Loading,
    Ready,
}

/// Everything the rendering layer needs, published as one snapshot per update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selected_location: Option<Location>,
    pub expanded_location_name: Option<String>,
    pub conditions: Option<CurrentConditions>,
    pub forecast: Option<Forecast>,
    pub is_loading: bool,
    pub history: HistoryList,
}

impl SelectionState {
    pub fn phase(&self) -> SelectionPhase {
        match (&self.selected_location, self.is_loading) {
            (None, _) => SelectionPhase::Idle,
            (Some(_), true) => SelectionPhase::Loading,
            (Some(_), false) => SelectionPhase::Ready,
        }
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected_location.as_ref().is_some_and(|location| location.name == name)
    }

    pub fn is_expanded(&self, name: &str) -> bool {
        self.expanded_location_name.as_deref() == Some(name)
    }
}
