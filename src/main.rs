use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rl_ones::api::state::AppState;
use rl_ones::api::{build_router, cors_layer};
use rl_ones::catalog::{Selection, StatisticsCatalog};
use rl_ones::config::AppConfig;
use rl_ones::hierarchy::{GroupHierarchyIndex, LeafGroupResolver, ResolvedLeafSet};
use rl_ones::models::{GroupId, Tables};
use rl_ones::storage::SnapshotReader;

#[derive(Parser)]
#[command(name = "rl-ones")]
#[command(about = "Rocket League 1v1 player statistics")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
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
    /// List player names
    Players,

    /// Games per map
    Maps {
        /// Restrict to the leaves under these groups (comma-separated)
        #[arg(long, value_delimiter = ',')]
        group: Vec<String>,
    },

    /// Resolve groups to the leaf groups beneath them
    Leaves {
        /// Seed groups (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        group: Vec<String>,
    },

    /// Player statistics summary
    Stats {
        /// Player name (defaults to the configured default player)
        #[arg(long)]
        player: Option<String>,

        /// Restrict to the leaves under these groups (comma-separated)
        #[arg(long, value_delimiter = ',')]
        group: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },
}

struct Snapshot {
    tables: Tables,
    index: GroupHierarchyIndex,
}

impl Snapshot {
    fn load(config: &AppConfig) -> Result<Self> {
        let reader = SnapshotReader::new(config.storage());
        let tables = reader
            .load()
            .with_context(|| format!("loading snapshot from {}", config.data_dir.display()))?;
        let index = GroupHierarchyIndex::build(&tables.groups)?;
        if index.is_empty() {
            tracing::warn!("Group table is empty; every group resolves to itself");
        } else {
            tracing::info!(
                "Indexed {} parent groups under {} roots",
                index.len(),
                index.roots().len()
            );
        }
        Ok(Self { tables, index })
    }

    /// Leaf scope for `--group`; empty means everything.
    fn scope(&self, groups: &[String]) -> Option<ResolvedLeafSet> {
        if groups.is_empty() {
            return None;
        }
        let seeds: Vec<GroupId> = groups.iter().map(|g| GroupId::from(g.as_str())).collect();
        for seed in seeds.iter().filter(|s| !self.index.contains(s)) {
            tracing::warn!("Group {} is not in the hierarchy", seed);
        }
        Some(LeafGroupResolver::new(&self.index).resolve(&seeds))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&PathBuf::from(&cli.config))
        .with_context(|| format!("loading config {}", cli.config))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let json_layer = cli
        .json_logs
        .then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!cli.json_logs).then(|| tracing_subscriber::fmt::layer());

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!("Starting rl-ones v{}", env!("CARGO_PKG_VERSION"));

    let snapshot = Snapshot::load(&config)?;

    match cli.command {
        Commands::Players => {
            let catalog = StatisticsCatalog::new(&snapshot.tables);
            for name in catalog.player_names() {
                println!("{}", name);
            }
        }
        Commands::Maps { group } => {
            let scope = snapshot.scope(&group);
            let catalog = StatisticsCatalog::new(&snapshot.tables);
            for entry in catalog.map_histogram(scope.as_ref()) {
                println!("{:>6}  {}", entry.games, entry.map_name);
            }
        }
        Commands::Leaves { group } => {
            if let Some(leaves) = snapshot.scope(&group) {
                for leaf in leaves.iter() {
                    println!("{}", leaf);
                }
            }
        }
        Commands::Stats {
            player,
            group,
            json,
        } => {
            let player = player.unwrap_or_else(|| config.dashboard.default_player.clone());
            let scope = snapshot.scope(&group);
            let catalog = StatisticsCatalog::new(&snapshot.tables);

            let mut sel = Selection::player(&player);
            if let Some(leaves) = &scope {
                sel = sel.within(leaves);
            }

            let summary = catalog.player_summary(sel)?;
            let recent = catalog.recent_camera_settings(sel, config.dashboard.recent_camera_limit)?;

            if json {
                let body = serde_json::json!({
                    "summary": summary,
                    "recent_cameras": recent,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                let pct = |v: Option<f64>| v.map_or("n/a".to_string(), |p| format!("{:.1}%", p));

                println!("=== {} ===", summary.player);
                println!("Latest activity:          {}", summary.latest_activity);
                println!("Recorded games:           {}", summary.recorded_games);
                println!("Distinct camera settings: {}", summary.distinct_camera_settings);
                println!("Series with camera change: {}", pct(summary.camera_change_pct));
                println!("Most used car:            {}", summary.most_used_car);
                println!("Distinct cars:            {}", summary.distinct_cars);
                println!("Series with car change:   {}", pct(summary.car_change_pct));
                println!("\nRecent camera settings:");
                for camera in &recent {
                    let values: Vec<String> = camera.values().iter().map(|v| v.to_string()).collect();
                    println!("  {}", values.join(" / "));
                }
            }
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let cors = cors_layer(&config.server.cors_origin)
                .with_context(|| format!("invalid cors_origin {}", config.server.cors_origin))?;

            let state = AppState::new(snapshot.tables, snapshot.index, config.dashboard.clone());
            let app = build_router(state).layer(cors);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Dashboard API: http://{}", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
