use chrono::{Datelike, NaiveDate};

use crate::models::{ExternalIds, MediaType, Season, Videos};

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";
const PLACEHOLDER_IMAGE: &str = "https://placehold.co/500x750.png";
const PLAYER_BASE: &str = "https://vidsrc.to/embed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageSize {
    W300,
    #[default]
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W300 => "w300",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::Original => "original",
        }
    }
}

/// Full image URL for a catalog image path, or a 2:3 placeholder when the
/// item has no image.
pub fn image_url(path: Option<&str>, size: ImageSize) -> String {
    match path.filter(|p| !p.is_empty()) {
        Some(p) => format!("{IMAGE_BASE}{}{p}", size.as_str()),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

/// Embedded third-party player for a movie or show.
pub fn player_url(media_type: MediaType, id: u64) -> String {
    format!("{PLAYER_BASE}/{}/{id}", media_type.as_str())
}

pub fn imdb_url(external_ids: Option<&ExternalIds>) -> Option<String> {
    external_ids
        .and_then(|ids| ids.imdb_id.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| format!("https://www.imdb.com/title/{id}"))
}

pub fn trailer_url(videos: Option<&Videos>) -> Option<String> {
    let videos = videos?;
    let youtube = |kind: &str| {
        videos
            .results
            .iter()
            .find(|v| v.site.eq_ignore_ascii_case("YouTube") && v.video_type == kind)
    };
    youtube("Trailer")
        .or_else(|| youtube("Teaser"))
        .map(|v| format!("https://www.youtube.com/watch?v={}", v.key))
}

/// Seasons worth showing: specials (season 0) and seasons without a poster
/// are hidden.
pub fn displayable_seasons(seasons: &[Season]) -> Vec<Season> {
    seasons
        .iter()
        .filter(|s| s.season_number > 0)
        .filter(|s| s.poster_path.as_deref().is_some_and(|p| !p.is_empty()))
        .cloned()
        .collect()
}

pub fn release_year(date: &str) -> Option<i32> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}
