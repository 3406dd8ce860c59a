use std::{fs::File, io::BufWriter, path::{Path, PathBuf}};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_log_data_management::{gpx_util::read_gpx_path, DataManager, StorageConfig, DEFAULT_DATA_DIR};
use travel_log_lib::{haversine::path_distance_km, stats::format_trip_duration};

#[derive(Parser)]
#[command(name = "TravelLogCLI")]
#[command(about = "A CLI to inspect and maintain the travel log", long_about = None)]
struct Cli {
    /// Directory holding the database
    #[arg(long, env = "TRAVEL_LOG_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List archived trips, newest first
    List,
    /// Print one trip as JSON
    Show { trip_id: String },
    /// Delete a trip. BE CAREFUL
    Delete { trip_id: String },
    /// Total distance and favourite transport mode
    Stats,
    /// Past trips between two places
    Analytics { origin: String, destination: String },
    /// Write a trip's path to a GPX file
    ExportGpx { trip_id: String, file: PathBuf },
    /// Print point count and distance of a GPX track
    InspectGpx { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InspectGpx { file } => inspect_gpx(&file),
        command => {
            let data_manager = DataManager::start(&StorageConfig::new(&cli.data_dir)).await?;
            run(&data_manager, command).await
        },
    }
}

fn inspect_gpx(file: &Path) -> anyhow::Result<()> {
    let reader = File::open(file).with_context(|| format!("Failed to open {:?}", file))?;
    let path = read_gpx_path(reader)?;
    println!("{} points, {:.2} km", path.len(), path_distance_km(path.points()));
    Ok(())
}

async fn run(data_manager: &DataManager, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::List => {
            for trip in data_manager.get_trips().await? {
                let duration = trip.end_time
                    .map(|end| format_trip_duration(trip.details.date_time, end))
                    .unwrap_or_else(|| "N/A".into());
                println!(
                    "{}  {} -> {}  [{}]  {}  {} points",
                    trip.id,
                    trip.details.origin,
                    trip.details.destination,
                    trip.details.mode,
                    duration,
                    trip.path_points().len()
                );
            }
        },
        Commands::Show { trip_id } => {
            let trip = data_manager.get_trip(&trip_id).await?;
            println!("{}", serde_json::to_string_pretty(&trip)?);
        },
        Commands::Delete { trip_id } => {
            data_manager.delete_trip(&trip_id).await?;
            tracing::info!("Deleted trip {trip_id}");
        },
        Commands::Stats => {
            let stats = data_manager.travel_stats().await?;
            println!("Trips: {}", stats.trip_count);
            println!("Total distance: {} km", stats.total_distance_km.round());
            println!("Favourite mode: {}", stats.favorite_mode.map(|mode| mode.label()).unwrap_or("N/A"));
        },
        Commands::Analytics { origin, destination } => {
            match data_manager.route_analytics(&origin, &destination).await? {
                Some(analytics) => println!("{}", serde_json::to_string_pretty(&analytics)?),
                None => println!("No past trips found for this route."),
            }
        },
        Commands::ExportGpx { trip_id, file } => {
            let writer = BufWriter::new(File::create(&file).with_context(|| format!("Failed to create {:?}", file))?);
            data_manager.export_gpx(&trip_id, writer).await?;
            tracing::info!("Exported trip {trip_id} to {:?}", file);
        },
        Commands::InspectGpx { file } => inspect_gpx(&file)?,
    }

    Ok(())
}
