//! Spot management handlers for the CLI.

use clap::Subcommand;
use sencity_core::Coordinate;
use sencity_db::NewSpot;

use crate::parse_coord;

/// Sub-commands available under `spots`.
#[derive(Debug, Subcommand)]
pub enum SpotsCommands {
    /// Add a spot
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// Position as `lon,lat`
        #[arg(long, value_parser = parse_coord, allow_hyphen_values = true)]
        at: Coordinate,
        /// Free-form spot type code
        #[arg(long = "type", default_value = "0")]
        spot_type: i32,
        /// Record the spot as added by this user
        #[arg(long)]
        user: Option<i64>,
    },
    /// List every spot with the visited flag for one user
    List {
        #[arg(long)]
        user: i64,
    },
    /// Mark a spot as visited by a user
    Visit {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        spot: i64,
    },
}

/// Dispatches a `spots` sub-command.
///
/// # Errors
///
/// Returns an error if the database operation fails or a referenced user or
/// spot does not exist.
pub(crate) async fn run_spots(pool: &sqlx::PgPool, command: SpotsCommands) -> anyhow::Result<()> {
    match command {
        SpotsCommands::Add {
            name,
            at,
            spot_type,
            user,
        } => {
            let spot = NewSpot {
                name,
                spot_type,
                coord: at,
            };
            let row = sencity_db::insert_spot(pool, &spot, user).await?;
            println!("added spot {} '{}'", row.id, row.name);
        }
        SpotsCommands::List { user } => {
            let rows = sencity_db::list_spots_for_user(pool, user).await?;
            if rows.is_empty() {
                println!("no spots found; add one with `spots add`");
                return Ok(());
            }
            println!("{:<8}{:<6}{:<9}{:<24}NAME", "ID", "TYPE", "VISITED", "LON,LAT");
            for row in &rows {
                let coord = format!("{:.5},{:.5}", row.lon, row.lat);
                println!(
                    "{:<8}{:<6}{:<9}{:<24}{}",
                    row.id,
                    row.spot_type,
                    if row.visited { "yes" } else { "no" },
                    coord,
                    row.name
                );
            }
        }
        SpotsCommands::Visit { user, spot } => {
            sencity_db::mark_spot_visited(pool, user, spot)
                .await
                .map_err(|e| match e {
                    sencity_db::DbError::NotFound => {
                        anyhow::anyhow!("user {user} or spot {spot} does not exist")
                    }
                    other => other.into(),
                })?;
            println!("spot {spot} marked visited for user {user}");
        }
    }
    Ok(())
}
