//! Prompt-driven flows. `inquire` blocks, so every prompt runs on the
//! blocking pool.

use std::{fmt, sync::Arc};

use anyhow::Context;
use cityweather_core::{
    CandidateSet, CitySearchService, Config, Location, Session, config::DEFAULT_TELEMETRY_URL,
};
use inquire::{
    Confirm, CustomType, CustomUserError, InquireError, Select, Text,
    autocompletion::{Autocomplete, Replacement},
};
use tokio::runtime::Handle;

use crate::{cli::show_location, render};

/// Runs a blocking prompt. `Ok(None)` when the user cancelled it (Esc / Ctrl-C).
async fn prompt<T, F>(ask: F) -> anyhow::Result<Option<T>>
where
    F: FnOnce() -> Result<T, InquireError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(ask).await.context("Prompt task failed")? {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Prompt failed"),
    }
}

/// Suggests city names on every keystroke through the search service.
/// Out-of-date answers are dropped by the service's sequencing.
#[derive(Clone)]
struct CitySuggester {
    search: Arc<CitySearchService>,
    runtime: Handle,
}

impl Autocomplete for CitySuggester {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        let candidates = self.runtime.block_on(self.search.search(input));
        Ok(candidates.iter().map(|location| location.name.clone()).collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        Ok(highlighted_suggestion)
    }
}

struct CandidateOption(Location);

impl fmt::Display for CandidateOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.coordinates() {
            Some((lat, lon)) => write!(f, "{} ({lat:.2}, {lon:.2})", self.0.name),
            None => write!(f, "{}", self.0.name),
        }
    }
}

/// Asks which candidate to use. `None` when there are none or the user backed out.
pub async fn choose_candidate(candidates: &CandidateSet) -> anyhow::Result<Option<Location>> {
    if candidates.is_empty() {
        return Ok(None);
    }

    let options: Vec<_> = candidates.iter().cloned().map(CandidateOption).collect();
    let chosen = prompt(move || Select::new("Which city?", options).prompt()).await?;
    Ok(chosen.map(|option| option.0))
}

enum MenuItem {
    Search,
    History { name: String, expanded: bool },
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MenuItem::Search => f.write_str("Search city"),
            MenuItem::History { name, expanded: true } => write!(f, "v {name}"),
            MenuItem::History { name, expanded: false } => write!(f, "> {name}"),
            MenuItem::Quit => f.write_str("Quit"),
        }
    }
}

/// Menu loop: search, open or collapse history rows, quit.
pub async fn run(session: &Session) -> anyhow::Result<()> {
    loop {
        let state = session.selection.snapshot();

        let mut items = vec![MenuItem::Search];
        items.extend(state.history.iter().map(|location| MenuItem::History {
            name: location.name.clone(),
            expanded: state.is_expanded(&location.name),
        }));
        items.push(MenuItem::Quit);

        let Some(item) = prompt(move || Select::new("What next?", items).prompt()).await? else {
            return Ok(());
        };

        match item {
            MenuItem::Search => search_and_show(session).await?,
            MenuItem::History { name, .. } => {
                let state = session.selection.toggle_expand(name.as_str()).await?;
                if state.is_expanded(&name) {
                    let state = session.selection.settled().await?;
                    print!("{}", render::selection(&state));
                }
            }
            MenuItem::Quit => return Ok(()),
        }
    }
}

async fn search_and_show(session: &Session) -> anyhow::Result<()> {
    let suggester =
        CitySuggester { search: Arc::clone(&session.search), runtime: Handle::current() };

    let Some(query) =
        prompt(move || Text::new("City:").with_autocomplete(suggester).prompt()).await?
    else {
        return Ok(());
    };

    // Accepting a suggestion yields its exact name.
    let location = match session.search.last_known().find(&query) {
        Some(location) => Some(location.clone()),
        None => {
            let candidates = session.search.search(&query).await;
            choose_candidate(&candidates).await?
        }
    };

    match location {
        Some(location) => show_location(session, location).await,
        None => {
            println!("No cities found for '{query}'.");
            Ok(())
        }
    }
}

/// Interactive configuration, saved to the platform config dir.
pub async fn configure() -> anyhow::Result<()> {
    let current = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "ignoring unreadable config; starting from defaults");
        Config::default()
    });

    let Some(config) = prompt(move || ask_config(current)).await? else {
        println!("Configuration unchanged.");
        return Ok(());
    };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn ask_config(current: Config) -> Result<Config, InquireError> {
    let geocoding_url =
        Text::new("Geocoding API base URL:").with_default(&current.geocoding_url).prompt()?;
    let weather_url =
        Text::new("Weather API base URL:").with_default(&current.weather_url).prompt()?;
    let telemetry_enabled = Confirm::new("Log selected cities to a telemetry sink?")
        .with_default(current.telemetry_endpoint().is_some())
        .prompt()?;
    let telemetry_url = if telemetry_enabled {
        let default_url = current.telemetry_endpoint().unwrap_or(DEFAULT_TELEMETRY_URL);
        Some(Text::new("Telemetry sink URL:").with_default(default_url).prompt()?)
    } else {
        None
    };
    let request_timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(current.request_timeout_secs)
        .prompt()?;

    Ok(Config {
        geocoding_url,
        weather_url,
        telemetry_url,
        request_timeout_secs,
        ..current
    })
}
