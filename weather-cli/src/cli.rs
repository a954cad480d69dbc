use std::{io::Stdout, process::ExitCode, sync::Arc};

use anyhow::Result;
use chrono::Local;
use clap::{ArgAction, Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use weather_core::{Config, FileStore, ViewController, ViewState, provider_from_config};

use crate::{locate::IpGeolocator, terminal::TerminalRenderer};

type Controller = ViewController<TerminalRenderer<Stdout>>;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the weatherapi.com API key.
    Configure,

    /// Show weather for a city, a "lat,lon" pair, or "my location".
    Show {
        /// Place name, e.g. `Paris, FR`.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Show weather for the current (IP-derived) position.
    Locate,

    /// Repeat the last successful lookup.
    Last,

    /// Keep searching until an empty line is entered.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> Result<ExitCode> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { query } => {
                let mut controller = build_controller(false)?;
                controller.type_input(&query.join(" "));
                Ok(exit_code(controller.submit(None).await.is_ok()))
            }
            Command::Locate => {
                let mut controller = build_controller(false)?;
                Ok(exit_code(controller.use_location().await.is_ok()))
            }
            Command::Last => last().await,
            Command::Interactive => interactive().await,
        }
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

/// Wire the controller to the terminal. Refuses to start without an API key.
fn build_controller(chatty: bool) -> Result<Controller> {
    let config = Config::load()?;
    let provider = provider_from_config(&config)?;
    let store = FileStore::new(Config::last_query_path()?);
    let locator = IpGeolocator::new(&config.geolocation)?;

    let controller = ViewController::new(
        provider,
        Box::new(store),
        TerminalRenderer::new(std::io::stdout(), chatty),
        config.theme.clone(),
    )
    .with_locator(Arc::new(locator));

    Ok(controller)
}

fn configure() -> Result<ExitCode> {
    let mut config = Config::load()?;

    let key = Password::new("weatherapi.com API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    if key.trim().is_empty() {
        println!("No key entered; configuration unchanged.");
        return Ok(ExitCode::FAILURE);
    }

    config.set_api_key(key);
    config.save()?;
    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(ExitCode::SUCCESS)
}

async fn last() -> Result<ExitCode> {
    let store = FileStore::new(Config::last_query_path()?);
    let Some(entry) = store.load_entry() else {
        println!("No saved location yet.");
        return Ok(ExitCode::FAILURE);
    };

    let saved = entry.saved_at.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    println!("{} ({}), saved {saved}", entry.value.label, entry.value.q);

    let mut controller = build_controller(false)?;
    Ok(exit_code(controller.select_last().await.is_ok()))
}

async fn interactive() -> Result<ExitCode> {
    let mut controller = build_controller(true)?;

    loop {
        let line = Text::new("City:")
            .with_help_message("\"my location\", lat,lon, :locate, :last; empty line quits")
            .prompt_skippable()?;

        let line = line.unwrap_or_default();
        match line.trim() {
            "" => break,
            ":locate" => {
                let _ = controller.use_location().await;
            }
            ":last" => {
                let _ = controller.select_last().await;
            }
            text => {
                controller.type_input(text);
                let _ = controller.submit(None).await;
            }
        }

        if controller.state() == ViewState::Result {
            controller.back();
            controller.settle().await;
        }
    }

    Ok(ExitCode::SUCCESS)
}
