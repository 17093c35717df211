use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use client_core::{CityForm, CityStore, FormPhase, SubmitOutcome};
use geocode::BigDataCloudGeocoder;
use shared::domain::{CityId, Coordinates};
use tracing::info;

mod config;

use config::{load_settings, validate_base_url};

#[derive(Parser, Debug)]
#[command(name = "citylog", about = "Track the cities you have visited")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every recorded city.
    List,
    /// Show a single recorded city.
    Show {
        #[arg(long)]
        id: i64,
    },
    /// Reverse-geocode a position and record the visit.
    Add {
        #[arg(long)]
        lat: f64,
        #[arg(long)]
        lng: f64,
        /// Override the resolved city name.
        #[arg(long)]
        name: Option<String>,
        /// Visit date, RFC 3339; defaults to now.
        #[arg(long)]
        date: Option<DateTime<Utc>>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a recorded city.
    Delete {
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let settings = load_settings();
    let api_base_url = validate_base_url(&settings.api_base_url)?;
    let geocode_base_url = validate_base_url(&settings.geocode_base_url)?;
    let store = CityStore::new(api_base_url);

    match args.command {
        Command::List => {
            let cities = store.load_all().await?;
            for city in &cities {
                println!(
                    "{:>10}  {} {}, {} — {}",
                    city.id.0,
                    city.emoji,
                    city.city_name,
                    city.country,
                    city.date.format("%Y-%m-%d")
                );
            }
            info!(count = cities.len(), "listed cities");
        }
        Command::Show { id } => {
            let city = store.get_city(CityId(id)).await?;
            println!("{} {} ({})", city.emoji, city.city_name, city.country);
            println!("visited {}", city.date.format("%Y-%m-%d"));
            if !city.notes.is_empty() {
                println!("{}", city.notes);
            }
        }
        Command::Add {
            lat,
            lng,
            name,
            date,
            notes,
        } => {
            let geocoder = Arc::new(BigDataCloudGeocoder::new(geocode_base_url));
            let form = CityForm::new(geocoder, store);

            form.set_position(Coordinates::new(lat, lng)).await;
            match form.phase().await {
                FormPhase::Ready => {}
                FormPhase::GeoError(message) => bail!("could not resolve position: {message}"),
                phase => bail!("unexpected form phase after lookup: {phase:?}"),
            }

            if let Some(name) = name {
                form.set_city_name(name).await;
            }
            if let Some(date) = date {
                form.set_date(Some(date)).await;
            }
            if let Some(notes) = notes {
                form.set_notes(notes).await;
            }

            match form.submit().await? {
                SubmitOutcome::Created(city) => {
                    println!(
                        "recorded {} {} (id={})",
                        city.emoji, city.city_name, city.id.0
                    );
                }
                SubmitOutcome::Skipped => {
                    bail!("nothing recorded: no city name at that position (pass --name)")
                }
            }
        }
        Command::Delete { id } => {
            store.delete_city(CityId(id)).await?;
            println!("deleted city {id}");
        }
    }

    Ok(())
}
