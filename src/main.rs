use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ladder_board::api::{build_router, state::AppState};
use ladder_board::config::AppConfig;
use ladder_board::fetch::TableRecordSource;
use ladder_board::ingest::RecordSet;
use ladder_board::ladder::{board_view, compute, Badge, BoardView, RecencySettings, Standing};
use ladder_board::sync::Refresher;

#[derive(Parser)]
#[command(name = "ladder-board")]
#[command(about = "Challenge-ladder rankings for armwrestling weight classes")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address (default from config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (default from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the ladders computed from local CSV files
    Standings {
        /// Roster CSV
        #[arg(long)]
        players: PathBuf,

        /// Match results CSV
        #[arg(long)]
        matches: PathBuf,

        /// Recency window in days (default from config)
        #[arg(long)]
        window_days: Option<u32>,

        /// Hide rank deltas and badges
        #[arg(long)]
        no_badges: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Report how the rows of local CSV files were read
    Check {
        /// Roster CSV
        #[arg(long)]
        players: PathBuf,

        /// Match results CSV
        #[arg(long)]
        matches: PathBuf,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn load_records(players: &Path, matches: &Path, config: &AppConfig) -> Result<RecordSet> {
    let players_csv = std::fs::read_to_string(players)
        .with_context(|| format!("Failed to read {}", players.display()))?;
    let matches_csv = std::fs::read_to_string(matches)
        .with_context(|| format!("Failed to read {}", matches.display()))?;
    Ok(RecordSet::from_csv(&players_csv, &matches_csv, &config.ladder)?)
}

fn format_movement(standing: &Standing) -> String {
    let delta = match standing.delta {
        Some(d) if d > 0 => format!("+{}", d),
        Some(d) if d < 0 => d.to_string(),
        _ => String::new(),
    };
    let badge = match standing.badge {
        Some(Badge::Takeover { up: Some(n) }) => format!("takeover +{}", n),
        Some(Badge::Takeover { up: None }) => "takeover".to_string(),
        Some(Badge::Defense) => "defense".to_string(),
        None => String::new(),
    };
    format!("{:>4}  {}", delta, badge).trim_end().to_string()
}

fn print_board(board: &BoardView) {
    match board.cutoff {
        Some(cutoff) => println!(
            "Recent: since {} ({} days)\n",
            cutoff.format("%Y-%m-%d %H:%M UTC"),
            board.settings.window_days
        ),
        None => println!("Recent: hidden\n"),
    }

    for ladder in &board.ladders {
        println!("=== {} ===", ladder.label);
        if ladder.standings.is_empty() {
            println!("  (no competitors)");
        }
        for s in &ladder.standings {
            println!(
                "{:>3}. {:<24} {:<16} {}",
                s.rank,
                s.name,
                s.id.as_str(),
                format_movement(s)
            );
        }
        if ladder.total > ladder.standings.len() {
            println!("     ... {} more", ladder.total - ladder.standings.len());
        }
        println!();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_tracing(&level, cli.json_logs);

    tracing::info!("Starting ladder-board v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port } => {
            let source = TableRecordSource::from_config(&config.source, &config.ladder)?;
            let refresher = Arc::new(Refresher::new(Arc::new(source)));

            if let Err(e) = refresher.refresh_once().await {
                tracing::warn!("Initial load failed, serving without records: {}", e);
            }

            let interval = config.refresh.interval()?;
            tokio::spawn(refresher.clone().run_periodic(interval));

            let state = AppState::from_config(&config, refresher);
            let app = build_router(state);
            let addr = format!(
                "{}:{}",
                host.unwrap_or_else(|| config.server.host.clone()),
                port.unwrap_or(config.server.port)
            );
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Board: http://{}/api/board", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Standings {
            players,
            matches,
            window_days,
            no_badges,
            json,
        } => {
            let records = load_records(&players, &matches, &config)?;
            let defaults = RecencySettings::from(&config.ladder);
            let settings = RecencySettings {
                window_days: window_days.unwrap_or(defaults.window_days),
                show_badges: defaults.show_badges && !no_badges,
            };

            let dual = compute(
                &config.ladder,
                &records.competitors,
                &records.matches,
                settings,
                Utc::now(),
            );
            let board = board_view(&dual, &config.ladder);

            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                print_board(&board);
            }
        }
        Commands::Check { players, matches } => {
            let records = load_records(&players, &matches, &config)?;

            println!("\n=== Ingest Report ===");
            println!("{}", records.report);
            println!("Revision:             {}", records.revision);
            if !records.report.unplaced_competitors.is_empty() {
                println!("\nUnplaced competitors:");
                for id in &records.report.unplaced_competitors {
                    println!("  {}", id);
                }
            }
        }
    }

    Ok(())
}
