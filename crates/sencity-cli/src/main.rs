mod route;
mod spots;

use clap::{Parser, Subcommand};
use sencity_core::{load_place_resolver, AppConfig, Coordinate, PlaceResolver};
use sencity_navitia::{NavitiaClient, NavitiaSettings};
use tracing_subscriber::EnvFilter;

use crate::spots::SpotsCommands;

#[derive(Debug, Parser)]
#[command(name = "sencity-cli")]
#[command(about = "Sencity command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Plan a journey and optionally detour it for a user
    Route {
        /// Origin as `lon,lat`
        #[arg(long, value_parser = parse_coord, allow_hyphen_values = true)]
        from: Coordinate,
        /// Destination as `lon,lat`
        #[arg(long, value_parser = parse_coord, allow_hyphen_values = true)]
        to: Coordinate,
        /// Detour walking legs through this user's spots and nearby parks
        #[arg(long)]
        user: Option<i64>,
        /// Print the route as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Find the nearest park or garden around a point
    Poi {
        /// Search centre as `lon,lat`
        #[arg(long, value_parser = parse_coord, allow_hyphen_values = true)]
        at: Coordinate,
        /// Search radius in meters (defaults to `SENCITY_CLOSEST_POI_RADIUS_M`)
        #[arg(long)]
        radius: Option<f64>,
    },
    /// Manage user-curated spots
    Spots {
        #[command(subcommand)]
        command: SpotsCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

/// Parses `lon,lat` into a coordinate.
fn parse_coord(raw: &str) -> Result<Coordinate, String> {
    let (lon, lat) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected `lon,lat`, got '{raw}'"))?;
    Coordinate::parse(lon, lat).map_err(|e| e.to_string())
}

/// Builds a Navitia client from config, honouring the place kinds override.
fn build_navitia_client(config: &AppConfig) -> anyhow::Result<NavitiaClient> {
    let resolver = match &config.place_kinds_path {
        Some(path) => load_place_resolver(path)?,
        None => PlaceResolver::default(),
    };
    let client = NavitiaClient::with_base_url(
        NavitiaSettings::from_app_config(config),
        resolver,
        &config.navitia_base_url,
    )
    .map_err(|e| anyhow::anyhow!("failed to build Navitia client: {e}"))?;
    Ok(client)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("sencity-cli: no command given, see --help");
        return Ok(());
    };

    let config = sencity_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = sencity_db::PoolConfig::from_app_config(&config);
    let pool = sencity_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            sencity_db::health_check(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let applied = sencity_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
        Commands::Route {
            from,
            to,
            user,
            json,
        } => {
            let client = build_navitia_client(&config)?;
            route::run_route(pool, &config, client, from, to, user, json).await?;
        }
        Commands::Poi { at, radius } => {
            let client = build_navitia_client(&config)?;
            route::run_poi(&client, at, radius.unwrap_or(config.closest_poi_radius_m)).await?;
        }
        Commands::Spots { command } => spots::run_spots(&pool, command).await?,
    }

    Ok(())
}
