use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};
use cityweather_core::{Config, Location, SelectionState, Session};

use crate::{interactive, render};

/// How long queued selection logs may take to go out before we exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Search cities and view their weather")]
pub struct Cli {
    /// Defaults to `interactive`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set API endpoints, timeout and telemetry.
    Configure,

    /// List up to three cities matching a name.
    Search {
        /// City name or prefix, e.g. "Lond".
        query: String,
    },

    /// Show current weather and the 5-day forecast for a city.
    Show {
        /// City name or prefix.
        query: String,

        /// Take the first match instead of asking.
        #[arg(long)]
        first: bool,
    },

    /// List recently viewed cities, most recent first.
    History,

    /// Expand a recently viewed city and show its weather.
    Open {
        /// Name exactly as listed by `cityweather history`.
        name: String,
    },

    /// Search and browse interactively.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let command = self.command();

        // Must work even when the current config file is broken.
        if let Command::Configure = command {
            return interactive::configure().await;
        }

        let config = Config::load()?;
        let session = Session::start(&config)?;

        let result = command.execute(&session).await;

        session.shutdown(SHUTDOWN_GRACE).await;
        result
    }
}

impl Cli {
    fn command(self) -> Command {
        self.command.unwrap_or(Command::Interactive)
    }
}

/// What `open` did with a history row.
#[derive(Debug, PartialEq, Eq)]
enum OpenOutcome {
    Expanded,
    Collapsed,
    NoCoordinates,
    NotInHistory,
}

impl OpenOutcome {
    /// Reads the outcome off the state returned by the toggle.
    fn of(state: &SelectionState, name: &str) -> Self {
        if state.is_expanded(name) {
            return OpenOutcome::Expanded;
        }
        match state.history.find(name) {
            None => OpenOutcome::NotInHistory,
            Some(location) if location.coordinates().is_none() => OpenOutcome::NoCoordinates,
            Some(_) => OpenOutcome::Collapsed,
        }
    }
}

impl Command {
    async fn execute(self, session: &Session) -> anyhow::Result<()> {
        match self {
            Command::Configure => unreachable!("configure runs without a session"),
            Command::Search { query } => {
                let candidates = session.search.search(&query).await;
                print!("{}", render::candidates(&candidates));
                Ok(())
            }
            Command::Show { query, first } => {
                let candidates = session.search.search(&query).await;
                let location = if first || candidates.len() == 1 {
                    candidates.first().cloned()
                } else {
                    interactive::choose_candidate(&candidates).await?
                };

                let Some(location) = location else {
                    println!("No cities found for '{query}'.");
                    return Ok(());
                };
                show_location(session, location).await
            }
            Command::History => {
                print!("{}", render::history(&session.selection.snapshot()));
                Ok(())
            }
            Command::Open { name } => {
                let state = session.selection.toggle_expand(name.as_str()).await?;
                match OpenOutcome::of(&state, &name) {
                    OpenOutcome::Expanded => {
                        let state = session.selection.settled().await?;
                        print!("{}", render::selection(&state));
                        Ok(())
                    }
                    OpenOutcome::Collapsed => {
                        println!("Collapsed '{name}'.");
                        Ok(())
                    }
                    OpenOutcome::NoCoordinates => {
                        bail!("'{name}' has no coordinates and cannot be shown.")
                    }
                    OpenOutcome::NotInHistory => bail!(
                        "'{name}' is not in the recently viewed list.\n\
                         Hint: run `cityweather history` to see it."
                    ),
                }
            }
            Command::Interactive => interactive::run(session).await,
        }
    }
}

pub async fn show_location(session: &Session, location: Location) -> anyhow::Result<()> {
    let state = session.selection.select_city(location.clone()).await?;
    if !state.is_selected(&location.name) {
        bail!("'{}' has no coordinates and cannot be shown.", location.name);
    }

    let state = session.selection.settled().await?;
    print!("{}", render::selection(&state));
    Ok(())
}
