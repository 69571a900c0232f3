// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::Result;
use clap::{Parser, Subcommand};
use intervals_gear::config::Config;
use intervals_gear::constants::ids;
use intervals_gear::coordinator::GearCoordinator;
use intervals_gear::display::render_all;
use intervals_gear::gear::GearView;
use intervals_gear::logging;
use intervals_gear::models::GearSnapshot;
use intervals_gear::providers::memory::InMemoryProvider;
use intervals_gear::providers::{create_provider, GearProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "intervals-gear")]
#[command(author, version, about = "Track bike and component mileage from intervals.icu")]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Work offline against an exported gear list instead of the API
    #[arg(long, global = true)]
    gear_file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every parent with its equipped slots, then spare components
    List,

    /// Print all rendered sensors as JSON
    Sensors,

    /// Equip a component on a bike
    Equip {
        /// Gear id of the bike
        #[arg(long)]
        bike: String,

        /// Gear id of the component
        #[arg(long)]
        component: String,

        /// Remove components of the same type first
        #[arg(long)]
        exclusive: bool,
    },

    /// Poll on an interval and log each refresh until interrupted
    Watch {
        /// Poll interval in seconds, at least 60 (default: from config)
        #[arg(long)]
        interval: Option<u64>,
    },
}

struct Runtime {
    coordinator: Arc<GearCoordinator>,
    poll_interval: Duration,
}

fn build_runtime(cli: &Cli) -> Result<Runtime> {
    if let Some(path) = &cli.gear_file {
        info!(path = %path, "Using offline gear file");
        let provider: Arc<dyn GearProvider> = Arc::new(InMemoryProvider::from_json_file(path)?);
        return Ok(Runtime {
            coordinator: Arc::new(GearCoordinator::new(provider, "offline")),
            poll_interval: Duration::from_secs(intervals_gear::constants::limits::DEFAULT_POLL_INTERVAL_SECS),
        });
    }

    let config = Config::load(cli.config.clone())?;
    let provider: Arc<dyn GearProvider> = Arc::from(create_provider("intervals", &config)?);
    Ok(Runtime {
        coordinator: Arc::new(GearCoordinator::new(provider, config.athlete_id.clone())),
        poll_interval: config.poll_interval(),
    })
}

fn print_hierarchy(snapshot: &GearSnapshot) {
    let view = GearView::build(snapshot);

    for parent in &view.parents {
        println!(
            "{} [{}] {} - {}",
            parent.gear.display_name(),
            parent.gear.id,
            parent.gear.gear_type_label(),
            format_km(parent.gear.distance_km())
        );
        for slot in &parent.slots {
            println!(
                "  {:<16} {} [{}] - {}",
                slot.key.label(),
                slot.component.display_name(),
                slot.component.id,
                format_km(slot.component.distance_km())
            );
        }
    }

    let spares: Vec<_> = view.components.iter().filter(|c| c.equipped_on.is_none()).collect();
    if !spares.is_empty() {
        println!("Not equipped:");
        for spare in spares {
            println!(
                "  {} [{}] {} - {}",
                spare.gear.display_name(),
                spare.gear.id,
                spare.gear.component_type(),
                format_km(spare.gear.distance_km())
            );
        }
    }
}

fn format_km(km: Option<f64>) -> String {
    km.map(|km| format!("{:.1} km", km))
        .unwrap_or_else(|| "unknown".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let cli = Cli::parse();
    let runtime = build_runtime(&cli)?;
    let coordinator = runtime.coordinator;

    match cli.command {
        Commands::List => {
            let snapshot = coordinator.first_refresh().await?;
            print_hierarchy(&snapshot);
        }
        Commands::Sensors => {
            let snapshot = coordinator.first_refresh().await?;
            println!("{}", serde_json::to_string_pretty(&render_all(&snapshot))?);
        }
        Commands::Equip { bike, component, exclusive } => {
            let event = coordinator.equip(&bike, &component, exclusive).await?;
            info!(event = ids::EQUIPPED_EVENT, bike.id = %event.bike_id, "Component equipped");
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        Commands::Watch { interval } => {
            coordinator.first_refresh().await?;

            let interval = interval.map(Duration::from_secs).unwrap_or(runtime.poll_interval);
            let (shutdown_tx, shutdown_rx) = watch::channel(false);

            let poller = {
                let coordinator = Arc::clone(&coordinator);
                tokio::spawn(async move { coordinator.run(interval, shutdown_rx).await })
            };

            tokio::signal::ctrl_c().await?;
            info!("Shutdown requested");
            shutdown_tx.send(true)?;
            poller.await?;
        }
    }

    Ok(())
}
