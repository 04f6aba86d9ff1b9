//! Black Stories in the terminal.
//!
//! Runs one AI game (classic, fight or council) and prints the event stream.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use game::core::difficulty::Difficulty;
use game::error::GameError;
use game::events::{EventSink, GameEvent, Summary, render_text};
use game::exit_codes;
use game::io::config::{GameConfig, ProviderSettings, load_config, write_config};
use game::io::provider::{HttpProvider, ModelSpec};
use game::modes::GameContext;
use game::modes::council::{CouncilRequest, run_council};
use game::modes::fight::{FightRequest, run_fight};
use game::modes::solo::{SoloRequest, run_solo};
use game::roles::council::CouncilModels;

#[derive(Parser)]
#[command(
    name = "black-stories",
    version,
    about = "Black Stories deduction game between AI detectives and an AI narrator"
)]
struct Cli {
    /// TOML configuration file. Missing file means defaults.
    #[arg(long, env = "BLACK_STORIES_CONFIG", default_value = "black-stories.toml")]
    config: PathBuf,

    /// Write a transcript of each finished game into this directory.
    #[arg(long)]
    transcript_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// One AI detective against the AI narrator.
    Play {
        /// facil, media or dificil.
        #[arg(short, long, default_value = "media", value_parser = Difficulty::parse_player)]
        difficulty: Difficulty,
        /// Narrator model as provider:model.
        #[arg(long)]
        narrator: Option<ModelSpec>,
        #[arg(long)]
        detective: Option<ModelSpec>,
    },
    /// Two AI detectives race on the same mystery.
    Fight {
        #[arg(long)]
        narrator: Option<ModelSpec>,
        #[arg(long)]
        detective1: Option<ModelSpec>,
        #[arg(long)]
        detective2: Option<ModelSpec>,
        /// Run both detectives of a round concurrently.
        #[arg(long)]
        parallel: bool,
    },
    /// A council of three AI roles shares one interrogation.
    Council {
        #[arg(short, long, default_value = "media", value_parser = Difficulty::parse_player)]
        difficulty: Difficulty,
        #[arg(long)]
        narrator: Option<ModelSpec>,
        #[arg(long)]
        visionary: Option<ModelSpec>,
        #[arg(long)]
        skeptic: Option<ModelSpec>,
        #[arg(long)]
        leader: Option<ModelSpec>,
    },
    /// Write the default configuration to the config path.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Prints each event with its speaker.
struct PrintSink;

impl EventSink for PrintSink {
    fn emit(&mut self, event: GameEvent) -> Result<(), GameError> {
        let text = render_text(&event);
        match &event {
            GameEvent::Question { seat, .. } | GameEvent::SolveIntent { seat, .. } => {
                println!("{}: {text}", seat.label());
            }
            GameEvent::Answer { .. } => println!("Narrador: {text}"),
            GameEvent::Error(_) => eprintln!("Error: {text}"),
            GameEvent::Summary(_) => println!("\n{text}"),
            _ => println!("{text}"),
        }
        Ok(())
    }
}

fn main() {
    game::logging::init("warn");
    match run() {
        Ok(Ended::Configured) => std::process::exit(exit_codes::OK),
        Ok(Ended::Played(summary)) if summary.is_victory() => std::process::exit(exit_codes::OK),
        Ok(Ended::Played(_)) => std::process::exit(exit_codes::DEFEAT),
        // `PrintSink` has already shown the error event.
        Ok(Ended::Aborted) => std::process::exit(exit_codes::ERROR),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}

enum Ended {
    Configured,
    Played(Summary),
    Aborted,
}

fn run() -> Result<Ended> {
    let cli = Cli::parse();
    if let Command::Init { force } = cli.command {
        if cli.config.exists() && !force {
            return Err(anyhow!(
                "{} already exists (use --force to overwrite)",
                cli.config.display()
            ));
        }
        write_config(&cli.config, &GameConfig::default())?;
        println!("wrote {}", cli.config.display());
        return Ok(Ended::Configured);
    }
    let mut config = load_config(&cli.config)?;
    if let Some(dir) = cli.transcript_dir {
        config.transcript_dir = Some(dir);
    }
    let defaults = DefaultModels::from_config(&config)?;
    let provider =
        HttpProvider::new(ProviderSettings::from_env(&config)).context("create provider")?;

    let mut sink = PrintSink;
    let summary = match cli.command {
        Command::Play {
            difficulty,
            narrator,
            detective,
        } => {
            let ctx = GameContext::new(Arc::new(provider), config);
            let request = SoloRequest {
                difficulty,
                narrator: narrator.unwrap_or_else(|| defaults.narrator.clone()),
                detective: detective.unwrap_or_else(|| defaults.detective.clone()),
            };
            run_solo(&ctx, &request, &mut sink)
        }
        Command::Fight {
            narrator,
            detective1,
            detective2,
            parallel,
        } => {
            config.parallel_fight_turns |= parallel;
            let ctx = GameContext::new(Arc::new(provider), config);
            let request = FightRequest {
                narrator: narrator.unwrap_or_else(|| defaults.narrator.clone()),
                detectives: [
                    detective1.unwrap_or_else(|| defaults.detective.clone()),
                    detective2.unwrap_or_else(|| defaults.detective.clone()),
                ],
            };
            run_fight(&ctx, &request, &mut sink)
        }
        Command::Council {
            difficulty,
            narrator,
            visionary,
            skeptic,
            leader,
        } => {
            let ctx = GameContext::new(Arc::new(provider), config);
            let request = CouncilRequest {
                difficulty,
                narrator: narrator.unwrap_or_else(|| defaults.narrator.clone()),
                members: CouncilModels {
                    visionary: visionary.unwrap_or_else(|| defaults.detective.clone()),
                    skeptic: skeptic.unwrap_or_else(|| defaults.detective.clone()),
                    leader: leader.unwrap_or_else(|| defaults.detective.clone()),
                },
            };
            run_council(&ctx, &request, &mut sink)
        }
        Command::Init { .. } => return Ok(Ended::Configured),
    };
    match summary {
        Ok(summary) => Ok(Ended::Played(summary)),
        Err(GameError::Abandoned) => Err(anyhow!(GameError::Abandoned).context("game aborted")),
        Err(_) => Ok(Ended::Aborted),
    }
}

struct DefaultModels {
    narrator: ModelSpec,
    detective: ModelSpec,
}

impl DefaultModels {
    fn from_config(config: &GameConfig) -> Result<Self> {
        Ok(Self {
            narrator: config
                .models
                .narrator
                .parse()
                .context("parse models.narrator")?,
            detective: config
                .models
                .detective
                .parse()
                .context("parse models.detective")?,
        })
    }
}
