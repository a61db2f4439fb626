//! Seed the catalog from the Google Books volumes API.
//!
//! Runs a handful of publisher and title qualified variants of `--query`
//! and stores each volume that carries a page count and a usable ISBN,
//! until `--count` books have been added.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use reqwest::Client;
use serde::Deserialize;

use library_server::config::{Config, StorageBackend};
use library_server::db;
use library_server::models::NewBook;
use library_server::store::{LibraryStore, PgStore, StoreError};
use library_server::validation::normalize_isbn;

const VOLUMES_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const BATCH_SIZE: u32 = 10;
const MAX_START_INDEX: u32 = 40;
const MAX_FIELD_CHARS: usize = 200;

/// `populate-books` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "populate-books",
    about = "Populate the catalog with books from the Google Books API",
    version
)]
struct CliArgs {
    /// Search query for the Google Books API.
    #[arg(long, default_value = "subject:fiction")]
    query: String,
    /// Number of books to add.
    #[arg(long, default_value_t = 50)]
    count: usize,
}

#[derive(Debug, Default, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo", default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    page_count: Option<i32>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

/// What a single volume turned into
#[derive(Debug, PartialEq)]
enum Candidate {
    Book(NewBook),
    MissingIsbn,
    NoPageCount,
}

#[derive(Debug, Default)]
struct ImportTally {
    added: usize,
    skipped_no_isbn: usize,
    skipped_exists: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env().context("load configuration")?;
    if config.storage_backend == StorageBackend::Memory {
        bail!("populate-books needs STORAGE_BACKEND=postgres; the in-memory store is not shared");
    }

    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;
    let store: Arc<dyn LibraryStore> = Arc::new(PgStore::new(pool));

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("build HTTP client")?;

    println!(
        "Fetching books from Google Books API with query: \"{}\"",
        args.query
    );
    let tally = populate(&client, store.as_ref(), &args.query, args.count).await?;

    println!();
    println!("Books added: {}", tally.added);
    println!("Books skipped (no ISBN): {}", tally.skipped_no_isbn);
    println!("Books skipped (already exists): {}", tally.skipped_exists);
    Ok(())
}

async fn populate(
    client: &Client,
    store: &dyn LibraryStore,
    query: &str,
    target: usize,
) -> anyhow::Result<ImportTally> {
    let mut tally = ImportTally::default();

    'queries: for search in search_variants(query) {
        for start_index in (0..MAX_START_INDEX).step_by(BATCH_SIZE as usize) {
            if tally.added >= target {
                break 'queries;
            }

            let volumes = match fetch_batch(client, &search, start_index).await {
                Ok(volumes) => volumes,
                Err(e) => {
                    tracing::warn!(search = %search, start_index, error = %e, "Skipping batch");
                    continue;
                }
            };

            for volume in volumes.items {
                if tally.added >= target {
                    break 'queries;
                }
                match candidate_from(volume.volume_info) {
                    Candidate::NoPageCount => {}
                    Candidate::MissingIsbn => tally.skipped_no_isbn += 1,
                    Candidate::Book(book) => store_book(store, book, &mut tally).await?,
                }
            }
        }
    }

    Ok(tally)
}

async fn store_book(
    store: &dyn LibraryStore,
    book: NewBook,
    tally: &mut ImportTally,
) -> anyhow::Result<()> {
    if store.find_book_by_isbn(&book.isbn).await?.is_some() {
        tally.skipped_exists += 1;
        return Ok(());
    }

    let title = book.title.clone();
    match store.insert_book(book).await {
        Ok(_) => {
            tally.added += 1;
            println!("  Added: {}", preview(&title));
            Ok(())
        }
        Err(StoreError::Duplicate { .. }) => {
            tally.skipped_exists += 1;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn fetch_batch(
    client: &Client,
    search: &str,
    start_index: u32,
) -> Result<VolumesResponse, reqwest::Error> {
    client
        .get(VOLUMES_URL)
        .query(&[
            ("q", search.to_string()),
            ("maxResults", BATCH_SIZE.to_string()),
            ("startIndex", start_index.to_string()),
            ("printType", "books".to_string()),
            ("langRestrict", "en".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json::<VolumesResponse>()
        .await
}

/// Publisher and title qualified variants spread results across the catalog
fn search_variants(query: &str) -> Vec<String> {
    [
        "inpublisher:penguin",
        "inpublisher:harper",
        "inpublisher:random house",
        "inpublisher:simon",
        "intitle:novel",
        "intitle:story",
    ]
    .iter()
    .map(|qualifier| format!("{} {}", query, qualifier))
    .collect()
}

fn candidate_from(info: VolumeInfo) -> Candidate {
    let page_count = match info.page_count {
        Some(count) if count > 0 => count,
        _ => return Candidate::NoPageCount,
    };

    let Some(isbn) = pick_isbn(&info.industry_identifiers) else {
        return Candidate::MissingIsbn;
    };

    let title = info.title.unwrap_or_else(|| "No Title".to_string());
    let author = match info.authors {
        Some(authors) if !authors.is_empty() => authors.join(", "),
        _ => "Unknown Author".to_string(),
    };

    Candidate::Book(NewBook {
        title: truncate(&title, MAX_FIELD_CHARS),
        author: truncate(&author, MAX_FIELD_CHARS),
        isbn,
        page_count,
    })
}

/// ISBN_13 wins over ISBN_10; identifiers that do not normalize are ignored
fn pick_isbn(identifiers: &[IndustryIdentifier]) -> Option<String> {
    ["ISBN_13", "ISBN_10"].iter().find_map(|kind| {
        identifiers
            .iter()
            .filter(|id| id.kind == *kind)
            .find_map(|id| normalize_isbn(&id.identifier).ok())
    })
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

fn preview(title: &str) -> String {
    if title.chars().count() > 50 {
        format!("{}...", truncate(title, 50))
    } else {
        title.to_string()
    }
}
