//! Plain-text rendering of search results, history and weather.

use std::fmt::Write;

use cityweather_core::{CandidateSet, CurrentConditions, Forecast, SelectionState};

pub fn candidates(candidates: &CandidateSet) -> String {
    if candidates.is_empty() {
        return "No suggestions.\n".to_string();
    }

    let mut out = String::new();
    for location in candidates.iter() {
        match location.coordinates() {
            Some((lat, lon)) => {
                let _ = writeln!(out, "{}  ({lat:.2}, {lon:.2})", location.name);
            }
            None => {
                let _ = writeln!(out, "{}  (no coordinates)", location.name);
            }
        }
    }
    out
}

pub fn history(state: &SelectionState) -> String {
    if state.history.is_empty() {
        return "No recently viewed cities yet.\n".to_string();
    }

    let mut out = String::from("Mostly viewed cities:\n");
    for location in state.history.iter() {
        let marker = if state.is_expanded(&location.name) { 'v' } else { '>' };
        let _ = writeln!(out, "  {marker} {}", location.name);
    }
    out
}

/// Weather block for the selected city.
pub fn selection(state: &SelectionState) -> String {
    let Some(location) = &state.selected_location else {
        return "No city selected.\n".to_string();
    };

    let mut out = format!("{}\n", location.name);

    if state.is_loading {
        out.push_str("  Loading weather...\n");
        return out;
    }

    match &state.conditions {
        Some(conditions) => out.push_str(&current(conditions)),
        None => out.push_str("  Weather unavailable.\n"),
    }

    if let Some(forecast) = state.forecast.as_ref().filter(|f| !f.is_empty()) {
        out.push_str(&daily(forecast));
    }

    out
}

fn current(conditions: &CurrentConditions) -> String {
    let description = conditions.condition.map(|c| c.description()).unwrap_or("Unknown");
    let gust = conditions.wind_gust.map(|g| g.to_string()).unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "  {}°C  {description}", conditions.temperature);
    // No apparent temperature in the payload; shown as the air temperature.
    let _ = writeln!(out, "  Feels like: {}°C", conditions.temperature);
    let _ = writeln!(out, "  Wind speed  {} km/h", conditions.windspeed);
    let _ = writeln!(out, "  Wind gust   {gust} m/s");
    out
}

fn daily(forecast: &Forecast) -> String {
    let mut out = String::from("  5-Day Forecast\n");
    for day in forecast.days() {
        let _ = writeln!(
            out,
            "    {:<10} {}  day {}°C  night {}°C",
            day.weekday_name(),
            day.short_date(),
            day.max_temp,
            day.min_temp,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cityweather_core::{HistoryList, Location, WeatherCondition};

    fn london() -> Location {
        Location::new("London", 51.5, -0.12)
    }

    fn ready_state() -> SelectionState {
        let dates = (3..=4)
            .map(|d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap())
            .collect();
        SelectionState {
            selected_location: Some(london()),
            conditions: Some(CurrentConditions {
                temperature: 15.0,
                windspeed: 10.0,
                wind_gust: None,
                condition: Some(WeatherCondition::PartlyCloudy),
            }),
            forecast: Some(Forecast::from_daily(
                dates,
                vec![20.5, 21.0],
                vec![10.0, 11.0],
                vec![],
                vec![],
            )),
            ..Default::default()
        }
    }

    #[test]
    fn selection_shows_current_and_forecast() {
        let text = selection(&ready_state());

        assert!(text.starts_with("London\n"));
        assert!(text.contains("15°C  Cloudy with sun"));
        assert!(text.contains("Wind speed  10 km/h"));
        assert!(text.contains("Wind gust   - m/s"));
        assert!(text.contains("Monday     06/03  day 20.5°C  night 10°C"));
        assert!(text.contains("Tuesday    06/04"));
    }

    #[test]
    fn selection_while_loading_or_failed() {
        let mut state = ready_state();
        state.is_loading = true;
        assert!(selection(&state).contains("Loading weather..."));

        state.is_loading = false;
        state.conditions = None;
        state.forecast = None;
        let text = selection(&state);
        assert!(text.contains("Weather unavailable."));
        assert!(!text.contains("Forecast"));
    }

    #[test]
    fn history_marks_expanded_row() {
        let state = SelectionState {
            history: HistoryList::from(vec![london(), Location::new("Paris", 48.85, 2.35)]),
            expanded_location_name: Some("Paris".to_string()),
            ..Default::default()
        };

        assert_eq!(history(&state), "Mostly viewed cities:\n  > London\n  v Paris\n");
        assert_eq!(history(&SelectionState::default()), "No recently viewed cities yet.\n");
    }

    #[test]
    fn candidates_list_names_and_coordinates() {
        let set = CandidateSet::from_results(vec![
            london(),
            Location { name: "Lost".into(), latitude: None, longitude: None },
        ]);

        assert_eq!(candidates(&set), "London  (51.50, -0.12)\nLost  (no coordinates)\n");
        assert_eq!(candidates(&CandidateSet::default()), "No suggestions.\n");
    }
}
