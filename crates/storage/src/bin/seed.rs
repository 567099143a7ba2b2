use std::path::PathBuf;

use catapult_core::model::{Cat, CatId, PhotoUrl, User};
use serde::Deserialize;
use storage::repository::Storage;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    cats_file: Option<PathBuf>,
    nickname: String,
}

#[derive(Debug, Error)]
enum ArgsError {
    #[error("{flag} requires a value")]
    MissingValue { flag: &'static str },
    #[error("unknown argument: {0}")]
    UnknownArg(String),
    #[error("--db expects a database url, got {raw:?}")]
    InvalidDbUrl { raw: String },
    #[error("--user expects a non-empty nickname, got {raw:?}")]
    InvalidNickname { raw: String },
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("CATAPULT_DB_URL").unwrap_or_else(|_| "sqlite:catapult.sqlite3".into());
        let mut cats_file = std::env::var("CATAPULT_CATS_FILE").ok().map(PathBuf::from);
        let mut nickname = std::env::var("CATAPULT_USER").unwrap_or_else(|_| "player".into());

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--cats" => {
                    cats_file = Some(PathBuf::from(require_value(&mut args, "--cats")?));
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidNickname { raw: value });
                    }
                    nickname = value;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            cats_file,
            nickname,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:catapult.sqlite3)");
    eprintln!("  --cats <file.json>        Import cats from a JSON array (default: built-in sample)");
    eprintln!("  --user <nickname>         Ensure this user exists and is active (default: player)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  CATAPULT_DB_URL, CATAPULT_CATS_FILE, CATAPULT_USER");
    eprintln!("Logging is controlled by RUST_LOG (default: info).");
}

/// One catalog entry as exported by the cat API.
#[derive(Debug, Deserialize)]
struct CatRecord {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    alt_names: String,
    #[serde(default)]
    temperament: String,
    #[serde(default)]
    photos: Vec<String>,
}

fn sample_records() -> Vec<CatRecord> {
    let raw = [
        ("abys", "Abyssinian", "", "Active, Energetic, Independent, Intelligent, Gentle"),
        ("beng", "Bengal", "", "Alert, Agile, Energetic, Demanding, Intelligent"),
        ("bsho", "British Shorthair", "Highlander", "Affectionate, Easy Going, Gentle, Loyal, Patient, Calm"),
        ("mcoo", "Maine Coon", "Coon Cat, Maine Cat", "Adaptable, Intelligent, Loving, Gentle, Independent"),
        ("pers", "Persian", "Longhair", "Affectionate, Loyal, Sedate, Quiet"),
        ("rblu", "Russian Blue", "Archangel Blue", "Eager, Quiet, Gentle, Intelligent, Playful"),
        ("siam", "Siamese", "Meezer", "Active, Agile, Clever, Sociable, Loving, Energetic"),
        ("sphy", "Sphynx", "Canadian Hairless", "Loyal, Inquisitive, Friendly, Quiet, Gentle"),
    ];
    raw.into_iter()
        .map(|(id, name, alt_names, temperament)| CatRecord {
            id: id.to_owned(),
            name: name.to_owned(),
            description: String::new(),
            alt_names: alt_names.to_owned(),
            temperament: temperament.to_owned(),
            photos: (1..=2)
                .map(|n| format!("https://cdn.example.com/cats/{id}-{n}.jpg"))
                .collect(),
        })
        .collect()
}

fn load_records(args: &Args) -> Result<Vec<CatRecord>, Box<dyn std::error::Error>> {
    match &args.cats_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&raw)?)
        }
        None => Ok(sample_records()),
    }
}

fn into_cat(record: CatRecord) -> Result<(Cat, Vec<PhotoUrl>), catapult_core::Error> {
    let id = CatId::new(&record.id)?;
    let cat = Cat::new(
        id,
        record.name,
        record.description,
        record.alt_names,
        record.temperament,
    )?;
    let photos = record
        .photos
        .iter()
        .map(PhotoUrl::parse)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((cat, photos))
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let records = load_records(&args)?;
    let mut cats = Vec::with_capacity(records.len());
    let mut photos = Vec::with_capacity(records.len());
    for record in records {
        let raw_id = record.id.clone();
        match into_cat(record) {
            Ok((cat, urls)) => {
                photos.push((cat.id().clone(), urls));
                cats.push(cat);
            }
            Err(err) => warn!(cat_id = %raw_id, %err, "skipping invalid cat record"),
        }
    }

    storage.catalog.upsert_cats(&cats).await?;
    for (id, urls) in &photos {
        storage.catalog.insert_photos(id, urls).await?;
    }

    let mut profiles = storage.users.load_profiles().await?;
    let existing = profiles
        .users()
        .iter()
        .find(|u| u.nickname().eq_ignore_ascii_case(args.nickname.trim()))
        .map(User::id);
    match existing {
        Some(id) => profiles.select(id)?,
        None => {
            let user = User::new(profiles.next_id(), args.nickname.as_str(), "", "")?;
            profiles.add(user)?;
        }
    }
    storage.users.save_profiles(&profiles).await?;

    info!(
        cats = cats.len(),
        user = %args.nickname,
        db = %args.db_url,
        "seed complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
