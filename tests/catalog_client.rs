use flickpick::error::CatalogError;
use flickpick::models::{ContentItem, MediaType};
use flickpick::tmdb::{CatalogApi, SearchPolicy, TmdbClient};
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn client_for(server: &MockServer) -> TmdbClient {
    let base = Url::parse(&format!("{}/3/", server.uri())).unwrap();
    TmdbClient::new(base, Some(TOKEN.to_string())).unwrap()
}

fn movie(id: u64, title: &str, poster: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "original_title": title,
        "poster_path": poster,
        "backdrop_path": null,
        "overview": "",
        "release_date": "2024-03-01",
        "vote_average": 7.1,
        "vote_count": 120,
        "popularity": 33.0
    })
}

fn show(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "original_name": name,
        "poster_path": "/show.jpg",
        "overview": "",
        "first_air_date": "2019-07-04",
        "vote_average": 8.0
    })
}

#[tokio::test]
async fn popular_movies_are_tagged_as_movies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .and(query_param("page", "2"))
        .and(query_param("language", "en-US"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 2,
            "results": [movie(1, "Dune: Part Two", Some("/dune.jpg")), movie(2, "Civil War", None)],
            "total_pages": 40,
            "total_results": 800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server).popular_movies(2).await.unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.total_pages, 40);
    assert_eq!(page.results.len(), 2);
    assert!(page.results.len() as u64 <= page.total_results);
    assert!(page.results.iter().all(|i| i.media_type() == MediaType::Movie));
    assert_eq!(page.results[0].title(), "Dune: Part Two");
}

#[tokio::test]
async fn popular_tv_shows_are_tagged_as_tv() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/tv/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [show(1399, "Game of Thrones")],
            "total_pages": 1,
            "total_results": 1
        })))
        .mount(&server)
        .await;

    let page = client_for(&server).popular_tv_shows(1).await.unwrap();
    let value = serde_json::to_value(&page.results[0]).unwrap();
    assert_eq!(value["media_type"], "tv");
    assert_eq!(value["name"], "Game of Thrones");
}

#[tokio::test]
async fn trending_keeps_catalog_tags_and_drops_people() {
    let server = MockServer::start().await;
    let mut tagged_movie = movie(10, "Oppenheimer", Some("/opp.jpg"));
    tagged_movie["media_type"] = json!("movie");
    let mut tagged_show = show(20, "Severance");
    tagged_show["media_type"] = json!("tv");
    Mock::given(method("GET"))
        .and(path("/3/trending/all/week"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [
                tagged_movie,
                { "media_type": "person", "id": 30, "name": "Cillian Murphy" },
                tagged_show
            ],
            "total_pages": 1,
            "total_results": 3
        })))
        .mount(&server)
        .await;

    let page = client_for(&server).trending_all_week(1).await.unwrap();
    let kinds: Vec<MediaType> = page.results.iter().map(ContentItem::media_type).collect();
    assert_eq!(kinds, vec![MediaType::Movie, MediaType::Tv]);
    assert_eq!(page.total_results, 3);
}

#[tokio::test]
async fn search_drops_people_and_posterless_items() {
    let server = MockServer::start().await;
    let mut with_poster = movie(1, "Alien", Some("/alien.jpg"));
    with_poster["media_type"] = json!("movie");
    let mut without_poster = movie(2, "Alien Covenant Short", None);
    without_poster["media_type"] = json!("movie");
    let mut tagged_show = show(3, "Alien: Earth");
    tagged_show["media_type"] = json!("tv");

    Mock::given(method("GET"))
        .and(path("/3/search/multi"))
        .and(query_param("query", "alien"))
        .and(query_param("include_adult", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [
                with_poster,
                without_poster,
                { "media_type": "person", "id": 4, "name": "Sigourney Weaver", "profile_path": "/sw.jpg" },
                tagged_show
            ],
            "total_pages": 1,
            "total_results": 4
        })))
        .expect(2)
        .mount(&server)
        .await;

    let strict = client_for(&server).search_content("alien", 1).await.unwrap();
    let ids: Vec<u64> = strict.results.iter().map(ContentItem::id).collect();
    assert_eq!(ids, vec![1, 3]);

    let lenient = client_for(&server)
        .with_search_policy(SearchPolicy::AllowPosterless)
        .search_content("alien", 1)
        .await
        .unwrap();
    let ids: Vec<u64> = lenient.results.iter().map(ContentItem::id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn movie_details_request_videos_and_external_ids() {
    let server = MockServer::start().await;
    let mut body = movie(550, "Fight Club", Some("/fc.jpg"));
    body["runtime"] = json!(139);
    body["videos"] = json!({ "results": [
        { "key": "abc123", "site": "YouTube", "type": "Trailer", "name": "Official Trailer" }
    ]});
    body["external_ids"] = json!({ "imdb_id": "tt0137523" });

    Mock::given(method("GET"))
        .and(path("/3/movie/550"))
        .and(query_param("append_to_response", "videos,external_ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let movie = client_for(&server).movie_details(550).await.unwrap();
    assert_eq!(movie.id, 550);
    assert_eq!(movie.runtime, Some(139));
    assert_eq!(
        movie.external_ids.and_then(|ids| ids.imdb_id).as_deref(),
        Some("tt0137523")
    );
    assert_eq!(movie.videos.map(|v| v.results.len()), Some(1));
}

#[tokio::test]
async fn tv_show_details_keep_seasons() {
    let server = MockServer::start().await;
    let mut body = show(1399, "Game of Thrones");
    body["number_of_seasons"] = json!(8);
    body["seasons"] = json!([
        { "id": 1, "name": "Specials", "season_number": 0, "episode_count": 12, "poster_path": "/s0.jpg" },
        { "id": 2, "name": "Season 1", "season_number": 1, "episode_count": 10, "poster_path": "/s1.jpg" }
    ]);
    Mock::given(method("GET"))
        .and(path("/3/tv/1399"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let show = client_for(&server).tv_show_details(1399).await.unwrap();
    assert_eq!(show.id, 1399);
    assert_eq!(show.number_of_seasons, Some(8));
    assert_eq!(show.seasons.map(|s| s.len()), Some(2));
}

#[tokio::test]
async fn missing_credential_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let base = Url::parse(&format!("{}/3/", server.uri())).unwrap();
    let client = TmdbClient::new(base, None).unwrap();
    let err = client.popular_movies(1).await.unwrap_err();
    assert!(matches!(err, CatalogError::Configuration));
    assert!(err.to_string().contains("TMDB_API_KEY"));

    let err = client.movie_details(550).await.unwrap_err();
    assert!(matches!(err, CatalogError::Configuration));
}

#[tokio::test]
async fn upstream_status_becomes_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/999999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status_code": 34,
            "status_message": "The resource you requested could not be found."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/movie/top_rated"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.movie_details(999999).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Failed to fetch data from TMDB: Not Found");

    let err = client.top_rated_movies(1).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn malformed_body_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).popular_movies(1).await.unwrap_err();
    assert!(matches!(err, CatalogError::Transport(_)));
    assert!(err.to_string().starts_with("TMDB API request failed:"));
}

#[tokio::test]
async fn unreachable_catalog_is_transport_error() {
    // Nothing listens on port 9 locally.
    let base = Url::parse("http://127.0.0.1:9/3/").unwrap();
    let client = TmdbClient::new(base, Some(TOKEN.to_string())).unwrap();
    let err = client.trending_all_week(1).await.unwrap_err();
    assert!(matches!(err, CatalogError::Transport(_)));
}

#[tokio::test]
async fn cached_responses_are_reused_within_ttl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/movie/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "results": [movie(1, "Dune: Part Two", Some("/dune.jpg"))],
            "total_pages": 1,
            "total_results": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).with_cache_ttl(Duration::from_secs(60));
    let first = client.popular_movies(1).await.unwrap();
    let second = client.popular_movies(1).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn failures_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/tv/popular"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server).with_cache_ttl(Duration::from_secs(60));
    assert!(client.popular_tv_shows(1).await.is_err());
    assert!(client.popular_tv_shows(1).await.is_err());
}
