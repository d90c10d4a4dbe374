use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminant attached to every catalog item right after it is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "tv" => Ok(MediaType::Tv),
            other => Err(anyhow::anyhow!("media type must be 'movie' or 'tv', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub iso_639_1: String,
    #[serde(default)]
    pub iso_3166_1: String,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub official: bool,
    #[serde(default)]
    pub published_at: String,
    pub site: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u32,
    #[serde(rename = "type")]
    pub video_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Videos {
    #[serde(default)]
    pub results: Vec<Video>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original_title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub release_date: String,
    #[serde(default, deserialize_with = "clamped_vote")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<Videos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ids: Option<ExternalIds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub season_number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub episode_count: u32,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

impl Season {
    /// Name shown for the season, "Season N" when the catalog left it blank.
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Season {}", self.season_number)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TvShow {
    pub id: u64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original_name: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub first_air_date: String,
    #[serde(default, deserialize_with = "clamped_vote")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub popularity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasons: Option<Vec<Season>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<Videos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ids: Option<ExternalIds>,
}

/// A movie or a show. `media_type` is the only discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media_type", rename_all = "lowercase")]
pub enum ContentItem {
    Movie(Movie),
    Tv(TvShow),
}

impl ContentItem {
    pub fn media_type(&self) -> MediaType {
        match self {
            ContentItem::Movie(_) => MediaType::Movie,
            ContentItem::Tv(_) => MediaType::Tv,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            ContentItem::Movie(m) => m.id,
            ContentItem::Tv(t) => t.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ContentItem::Movie(m) => &m.title,
            ContentItem::Tv(t) => &t.name,
        }
    }

    pub fn poster_path(&self) -> Option<&str> {
        match self {
            ContentItem::Movie(m) => m.poster_path.as_deref(),
            ContentItem::Tv(t) => t.poster_path.as_deref(),
        }
    }

    pub fn backdrop_path(&self) -> Option<&str> {
        match self {
            ContentItem::Movie(m) => m.backdrop_path.as_deref(),
            ContentItem::Tv(t) => t.backdrop_path.as_deref(),
        }
    }

    pub fn vote_average(&self) -> f64 {
        match self {
            ContentItem::Movie(m) => m.vote_average,
            ContentItem::Tv(t) => t.vote_average,
        }
    }

    /// Release date for movies, first air date for shows.
    pub fn release_date(&self) -> &str {
        match self {
            ContentItem::Movie(m) => &m.release_date,
            ContentItem::Tv(t) => &t.first_air_date,
        }
    }

    pub fn external_ids(&self) -> Option<&ExternalIds> {
        match self {
            ContentItem::Movie(m) => m.external_ids.as_ref(),
            ContentItem::Tv(t) => t.external_ids.as_ref(),
        }
    }

    pub fn videos(&self) -> Option<&Videos> {
        match self {
            ContentItem::Movie(m) => m.videos.as_ref(),
            ContentItem::Tv(t) => t.videos.as_ref(),
        }
    }

    /// Route of the detail view, e.g. `/movie/550`.
    pub fn detail_path(&self) -> String {
        format!("/{}/{}", self.media_type(), self.id())
    }
}

impl From<Movie> for ContentItem {
    fn from(movie: Movie) -> Self {
        ContentItem::Movie(movie)
    }
}

impl From<TvShow> for ContentItem {
    fn from(show: TvShow) -> Self {
        ContentItem::Tv(show)
    }
}

/// Paginated list wrapper returned by every list endpoint of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

impl<T> Page<T> {
    pub fn map_results<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            page: self.page,
            results: self.results.into_iter().map(f).collect(),
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }

    pub fn filter_map_results<U>(self, f: impl FnMut(T) -> Option<U>) -> Page<U> {
        Page {
            page: self.page,
            results: self.results.into_iter().filter_map(f).collect(),
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}

fn first_page() -> u32 {
    1
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Keeps vote_average inside [0, 10] whatever the catalog sends.
fn clamped_vote<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 10.0))
        .unwrap_or(0.0))
}
