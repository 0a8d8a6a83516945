//! Shared fixtures for the mock-server tests
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anicat_core::{AnimeClient, AnimeRecord, Catalog, ClientConfig};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

/// Client config for tests: no retries, short timeouts
pub fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        max_retries: 0,
        retry_base_delay_ms: 10,
        ..Default::default()
    }
}

pub fn catalog(server: &MockServer) -> Catalog {
    catalog_with(test_config(server))
}

pub fn catalog_with(config: ClientConfig) -> Catalog {
    Catalog::with_client(AnimeClient::with_config(config).expect("client"))
}

pub fn anime_json(id: &str) -> Value {
    json!({
        "id": id,
        "type": "anime",
        "attributes": {
            "canonicalTitle": format!("Anime {}", id),
            "averageRating": "80.5",
            "episodeCount": 12
        }
    })
}

pub fn anime_record(id: &str) -> AnimeRecord {
    serde_json::from_value(anime_json(id)).expect("anime fixture")
}

pub fn anime_list(ids: &[&str], count: u64) -> Value {
    json!({
        "data": ids.iter().map(|id| anime_json(id)).collect::<Vec<_>>(),
        "meta": { "count": count }
    })
}

pub async fn mount_json(server: &MockServer, at: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, at: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

pub async fn mount_genres(server: &MockServer, anime_id: &str) {
    mount_json(
        server,
        &format!("/anime/{}/genres", anime_id),
        json!({"data": [{"id": "1", "type": "genres", "attributes": {"name": "Action", "slug": "action"}}]}),
    )
    .await;
}

pub async fn mount_episodes(server: &MockServer, anime_id: &str) {
    mount_json(
        server,
        &format!("/anime/{}/episodes", anime_id),
        json!({"data": [
            {"id": "e1", "type": "episodes", "attributes": {"canonicalTitle": "Pilot", "number": 1, "length": 24}},
            {"id": "e2", "type": "episodes", "attributes": {"canonicalTitle": "Second", "number": 2, "length": 24}}
        ]}),
    )
    .await;
}

pub async fn mount_reviews(server: &MockServer, anime_id: &str) {
    mount_json(
        server,
        &format!("/anime/{}/reviews", anime_id),
        json!({"data": [{"id": "r1", "type": "reviews", "attributes": {"content": "Great", "rating": 9}}]}),
    )
    .await;
}

/// Character list of `(character_id, role)` pairs plus one detail route
/// per character
pub async fn mount_characters(server: &MockServer, anime_id: &str, characters: &[(&str, &str)]) {
    let refs: Vec<Value> = characters
        .iter()
        .map(|(id, role)| json!({"id": id, "type": "animeCharacters", "attributes": {"role": role}}))
        .collect();
    mount_json(
        server,
        &format!("/anime/{}/characters", anime_id),
        json!({ "data": refs }),
    )
    .await;

    for (id, _) in characters {
        mount_character(server, id).await;
    }
}

pub async fn mount_character(server: &MockServer, character_id: &str) {
    mount_json(
        server,
        &format!("/characters/{}", character_id),
        json!({"data": {
            "id": character_id,
            "type": "characters",
            "attributes": {"name": format!("Character {}", character_id), "description": "..."}
        }}),
    )
    .await;
}

/// All four relations of an anime, with the given characters
pub async fn mount_relations(server: &MockServer, anime_id: &str, characters: &[(&str, &str)]) {
    mount_genres(server, anime_id).await;
    mount_episodes(server, anime_id).await;
    mount_reviews(server, anime_id).await;
    mount_characters(server, anime_id, characters).await;
}

/// Matches requests that do not carry the given query parameter
pub struct NoParam(pub &'static str);

impl Match for NoParam {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(key, _)| key == self.0)
    }
}

/// Serves every hydration route after a fixed delay and records when each
/// request arrived, tagged with the anime it belongs to.
///
/// Each anime `X` has one character with id `X-c`.
#[derive(Clone)]
pub struct DelayedCatalog {
    delay: Duration,
    arrivals: Arc<Mutex<Vec<(Instant, String)>>>,
}

impl DelayedCatalog {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            arrivals: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn mount(&self, server: &MockServer) {
        Mock::given(method("GET"))
            .respond_with(self.clone())
            .mount(server)
            .await;
    }

    pub fn request_count(&self) -> usize {
        self.arrivals.lock().unwrap().len()
    }

    /// Most requests that arrived within half the response delay of each
    /// other. Every such request was still unanswered when the last of
    /// them arrived, so this never exceeds the real peak in flight.
    pub fn peak_requests(&self) -> usize {
        self.peak(|window| window.len())
    }

    /// Most distinct anime with requests arriving within half the response
    /// delay of each other
    pub fn peak_anime(&self) -> usize {
        self.peak(|window| {
            window
                .iter()
                .map(|(_, anime)| anime.as_str())
                .collect::<HashSet<_>>()
                .len()
        })
    }

    fn peak<F>(&self, measure: F) -> usize
    where
        F: Fn(&[(Instant, String)]) -> usize,
    {
        let mut arrivals = self.arrivals.lock().unwrap().clone();
        arrivals.sort_by_key(|(at, _)| *at);
        let window = self.delay / 2;

        (0..arrivals.len())
            .map(|end| {
                let last = arrivals[end].0;
                let start = arrivals[..=end]
                    .iter()
                    .position(|(at, _)| last.duration_since(*at) < window)
                    .unwrap_or(end);
                measure(&arrivals[start..=end])
            })
            .max()
            .unwrap_or(0)
    }
}

impl Respond for DelayedCatalog {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let segments: Vec<&str> = request.url.path().trim_start_matches('/').split('/').collect();
        let (anime, body) = match segments.as_slice() {
            ["anime", id, "characters"] => (
                id.to_string(),
                json!({"data": [{"id": format!("{}-c", id), "attributes": {"role": "main"}}]}),
            ),
            ["anime", id, _] => (id.to_string(), json!({"data": []})),
            ["characters", id] => (
                id.trim_end_matches("-c").to_string(),
                json!({"data": {"id": id, "type": "characters", "attributes": {"name": id}}}),
            ),
            _ => return ResponseTemplate::new(404),
        };

        self.arrivals.lock().unwrap().push((Instant::now(), anime));
        ResponseTemplate::new(200)
            .set_body_json(body)
            .set_delay(self.delay)
    }
}
