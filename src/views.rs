use serde::Serialize;
use tracing::{error, info};

use crate::error::{CatalogError, CatalogResult};
use crate::media::{self, ImageSize};
use crate::models::{ContentItem, MediaType, Page, Season};
use crate::tmdb::CatalogApi;

const HERO_ITEMS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct LandingView {
    pub hero: Vec<ContentItem>,
    pub trending: Vec<ContentItem>,
    pub popular_movies: Vec<ContentItem>,
    pub popular_tv_shows: Vec<ContentItem>,
    /// Set when nothing could be loaded; callers show a "could not load" panel.
    pub load_failed: bool,
}

/// Fetches the three landing lists concurrently. A failing list is logged and
/// left empty; the others are still shown.
pub async fn landing(catalog: &dyn CatalogApi) -> LandingView {
    let (movies, shows, trending) = tokio::join!(
        catalog.popular_movies(1),
        catalog.popular_tv_shows(1),
        catalog.trending_all_week(1),
    );
    let popular_movies = results_or_empty("popular movies", movies);
    let popular_tv_shows = results_or_empty("popular TV shows", shows);
    let trending = results_or_empty("trending", trending);

    let hero: Vec<ContentItem> = if !trending.is_empty() {
        trending.iter().take(HERO_ITEMS).cloned().collect()
    } else {
        popular_movies.iter().take(1).cloned().collect()
    };

    let load_failed = popular_movies.is_empty()
        && popular_tv_shows.is_empty()
        && trending.is_empty()
        && hero.is_empty();

    LandingView {
        hero,
        trending,
        popular_movies,
        popular_tv_shows,
        load_failed,
    }
}

fn results_or_empty(label: &str, result: CatalogResult<Page<ContentItem>>) -> Vec<ContentItem> {
    match result {
        Ok(page) => page.results,
        Err(e) => {
            error!("Failed to load {} for landing view: {}", label, e);
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Pagination {
    pub fn new(page: u32, total_pages: u32) -> Self {
        let total_pages = total_pages.max(1);
        Self {
            page,
            total_pages,
            has_previous: page > 1,
            has_next: page < total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchView {
    pub query: String,
    pub results: Vec<ContentItem>,
    pub pagination: Pagination,
    pub query_missing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A blank query issues no catalog call.
pub async fn search(catalog: &dyn CatalogApi, query: &str, page: u32) -> SearchView {
    let query = query.trim();
    if query.is_empty() {
        return SearchView {
            query: String::new(),
            results: Vec::new(),
            pagination: Pagination::new(1, 1),
            query_missing: true,
            error: None,
        };
    }

    match catalog.search_content(query, page).await {
        Ok(data) => {
            info!(
                "Search '{}' page {} -> {} results",
                query,
                page,
                data.results.len()
            );
            SearchView {
                query: query.to_string(),
                pagination: Pagination::new(page, data.total_pages),
                results: data.results,
                query_missing: false,
                error: None,
            }
        }
        Err(e) => {
            error!("Failed to search content for '{}': {}", query, e);
            SearchView {
                query: query.to_string(),
                results: Vec::new(),
                pagination: Pagination::new(page, 1),
                query_missing: false,
                error: Some(e.to_string()),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    pub item: ContentItem,
    pub poster_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_url: Option<String>,
    pub player_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailer_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    pub seasons: Vec<Season>,
}

impl DetailView {
    pub fn from_item(item: ContentItem) -> Self {
        let seasons = match &item {
            ContentItem::Tv(show) => show
                .seasons
                .as_deref()
                .map(media::displayable_seasons)
                .unwrap_or_default(),
            ContentItem::Movie(_) => Vec::new(),
        };
        Self {
            poster_url: media::image_url(item.poster_path(), ImageSize::W500),
            backdrop_url: item
                .backdrop_path()
                .filter(|p| !p.is_empty())
                .map(|p| media::image_url(Some(p), ImageSize::Original)),
            player_url: media::player_url(item.media_type(), item.id()),
            imdb_url: media::imdb_url(item.external_ids()),
            trailer_url: media::trailer_url(item.videos()),
            release_year: media::release_year(item.release_date()),
            seasons,
            item,
        }
    }
}

pub async fn detail(
    catalog: &dyn CatalogApi,
    media_type: MediaType,
    id: u64,
) -> Result<DetailView, CatalogError> {
    let item: ContentItem = match media_type {
        MediaType::Movie => catalog.movie_details(id).await?.into(),
        MediaType::Tv => catalog.tv_show_details(id).await?.into(),
    };
    Ok(DetailView::from_item(item))
}
