// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wordcast - daily vocabulary delivery over WhatsApp and SMS.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod commands;
mod import;
mod serve;
mod shutdown;
mod status;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use wordcast_config::model::WordcastConfig;
use wordcast_core::{Category, WordcastError};

use crate::commands::{ScheduleTarget, SubscribeArgs};

/// Wordcast - daily vocabulary delivery over WhatsApp and SMS.
#[derive(Parser, Debug)]
#[command(name = "wordcast", version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the XDG search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the scheduler, the dispatcher, and the HTTP gateway.
    Serve,
    /// Schedule one user's day, or every active subscription with --all.
    Schedule {
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        user: Option<String>,
        #[arg(long, requires = "user")]
        phone: Option<String>,
        #[arg(long, requires = "user")]
        category: Option<Category>,
        #[arg(long)]
        all: bool,
        /// Local date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Send everything that is due now, once.
    Dispatch,
    /// Import words from a CSV file into the catalog.
    ImportWords {
        path: PathBuf,
    },
    /// Create or update a user's delivery settings and subscription.
    Subscribe {
        #[arg(long)]
        user: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        category: Category,
        #[arg(long)]
        words_per_day: u32,
        /// Comma-separated HH:MM slot times; omit for automatic spacing.
        #[arg(long)]
        times: Option<String>,
        /// Per-user offset from UTC in minutes; defaults to the service offset.
        #[arg(long, allow_hyphen_values = true)]
        utc_offset_minutes: Option<i32>,
    },
    /// Show outbox counts.
    Status {
        /// Output structured JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> WordcastConfig {
    let loaded = match path {
        Some(path) => wordcast_config::load_and_validate_path(path),
        None => wordcast_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            wordcast_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli, config: WordcastConfig) -> Result<(), WordcastError> {
    if let Commands::Serve = cli.command {
        return serve::run_serve(config).await;
    }

    let storage = serve::open_storage(&config).await?;
    let result = match cli.command {
        Commands::Serve => Ok(()),
        Commands::Schedule {
            user,
            phone,
            category,
            all,
            date,
        } => {
            let target = if all {
                ScheduleTarget::All
            } else {
                match (user, phone, category) {
                    (Some(user_id), Some(phone_number), Some(category)) => ScheduleTarget::User {
                        user_id,
                        phone_number,
                        category,
                    },
                    _ => {
                        return Err(WordcastError::Validation(
                            "schedule needs --user, --phone and --category, or --all".into(),
                        ));
                    }
                }
            };
            commands::run_schedule(&config, storage.clone(), target, date).await
        }
        Commands::Dispatch => commands::run_dispatch(&config, storage.clone()).await,
        Commands::ImportWords { path } => import::run_import(storage.as_ref(), &path).await,
        Commands::Subscribe {
            user,
            phone,
            category,
            words_per_day,
            times,
            utc_offset_minutes,
        } => {
            commands::run_subscribe(
                storage.as_ref(),
                SubscribeArgs {
                    user_id: user,
                    phone_number: phone,
                    category,
                    words_per_day,
                    times,
                    utc_offset_minutes,
                },
            )
            .await
        }
        Commands::Status { json, plain } => status::run_status(storage.as_ref(), json, plain).await,
    };
    storage.close().await?;
    result
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    serve::init_tracing(&config.service.log_level);

    if let Err(e) = run(cli, config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
