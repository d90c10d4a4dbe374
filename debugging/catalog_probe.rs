//! Query the catalog through the same client the server uses and print the
//! normalized JSON.
//! Usage:
//!   cargo run --bin catalog_probe -- popular|top-rated|tv-popular|trending [page]
//!   cargo run --bin catalog_probe -- search <query> [page]
//!   cargo run --bin catalog_probe -- movie <tmdb_id>
//!   cargo run --bin catalog_probe -- tv <tmdb_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use flickpick::config::Config;
use flickpick::tmdb::{CatalogApi, TmdbClient};
use flickpick::views::DetailView;
use serde::Serialize;
use std::env;

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin catalog_probe -- popular|top-rated|tv-popular|trending [page]");
    eprintln!("       cargo run --bin catalog_probe -- search <query> [page]");
    eprintln!("       cargo run --bin catalog_probe -- movie <tmdb_id>");
    eprintln!("       cargo run --bin catalog_probe -- tv <tmdb_id>");
    std::process::exit(1);
}

fn page_arg(arg: Option<&String>) -> Result<u32> {
    match arg {
        Some(raw) => raw.parse().context("page must be a positive integer"),
        None => Ok(1),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let config = Config::from_env()?;
    let client = TmdbClient::new(config.tmdb_base_url, config.tmdb_api_key)?
        .with_search_policy(config.search_policy);
    if !client.has_credentials() {
        anyhow::bail!("TMDB_API_KEY not set");
    }

    match (args[1].as_str(), args.get(2)) {
        ("popular", page) => print_json(&client.popular_movies(page_arg(page)?).await?)?,
        ("top-rated", page) => print_json(&client.top_rated_movies(page_arg(page)?).await?)?,
        ("tv-popular", page) => print_json(&client.popular_tv_shows(page_arg(page)?).await?)?,
        ("trending", page) => print_json(&client.trending_all_week(page_arg(page)?).await?)?,
        ("search", Some(query)) => {
            let page = page_arg(args.get(3))?;
            let results = client.search_content(query, page).await?;
            eprintln!(
                "{} of {} results kept on page {}",
                results.results.len(),
                results.total_results,
                page
            );
            print_json(&results)?
        }
        ("movie", Some(id)) => {
            let id: u64 = id.parse().context("tmdb_id must be an integer")?;
            let movie = client.movie_details(id).await?;
            print_json(&DetailView::from_item(movie.into()))?
        }
        ("tv", Some(id)) => {
            let id: u64 = id.parse().context("tmdb_id must be an integer")?;
            let show = client.tv_show_details(id).await?;
            print_json(&DetailView::from_item(show.into()))?
        }
        _ => usage(),
    }

    Ok(())
}
