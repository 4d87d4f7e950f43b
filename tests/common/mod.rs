#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use pokedex_catalog::app::{ProgressEvent, ProgressSink};
use pokedex_catalog::config::ResolvedConfig;
use pokedex_catalog::error::FetchError;
use pokedex_catalog::fetch::{ApiEndpoints, ResourceFetcher};

pub const BASE: &str = "https://pokeapi.test/api/v2";

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

pub fn test_config() -> ResolvedConfig {
    ResolvedConfig {
        base_url: BASE.to_string(),
        ..ResolvedConfig::default()
    }
}

pub fn endpoints() -> ApiEndpoints {
    ApiEndpoints::new(BASE)
}

pub fn pokemon_url(id: u32) -> String {
    format!("{BASE}/pokemon/{id}/")
}

pub fn pokemon_json(id: u32, name: &str, types: &[&str]) -> Value {
    let types = types
        .iter()
        .enumerate()
        .map(|(index, name)| {
            json!({
                "slot": index + 1,
                "type": { "name": name, "url": format!("{BASE}/type/{name}/") }
            })
        })
        .collect::<Vec<_>>();
    json!({
        "id": id,
        "name": name,
        "weight": id * 10,
        "height": id,
        "types": types,
        "sprites": { "front_default": format!("https://sprites.test/{id}.png") }
    })
}

/// In-memory upstream that records calls and the peak number of overlapping requests.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Value>,
    failures: HashMap<String, u16>,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn respond(&mut self, url: impl Into<String>, body: Value) {
        self.responses.insert(url.into(), body);
    }

    pub fn fail(&mut self, url: impl Into<String>, status: u16) {
        self.failures.insert(url.into(), status);
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Requests that ran to the end of their delay.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_called(&self, url: &str) -> bool {
        self.calls().iter().any(|call| call == url)
    }
}

#[async_trait]
impl ResourceFetcher for ScriptedFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = self.failures.get(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
                message: "scripted failure".to_string(),
            });
        }
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
                message: "Not Found".to_string(),
            })
    }
}

/// A small upstream: pokemon `(id, name, types)` and habitats `(name, members)`.
pub struct Upstream {
    pub pokemon: Vec<(u32, String, Vec<String>)>,
    pub habitats: Vec<(String, Vec<String>)>,
    pub reported_count: Option<u64>,
}

impl Upstream {
    pub fn new(pokemon: &[(u32, &str, &[&str])], habitats: &[(&str, &[&str])]) -> Self {
        Self {
            pokemon: pokemon
                .iter()
                .map(|(id, name, types)| {
                    (
                        *id,
                        name.to_string(),
                        types.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
            habitats: habitats
                .iter()
                .map(|(name, members)| {
                    (
                        name.to_string(),
                        members.iter().map(|m| m.to_string()).collect(),
                    )
                })
                .collect(),
            reported_count: None,
        }
    }

    /// `count` entries named `mon-<id>`, none of them in a habitat.
    pub fn numbered(count: u32) -> Self {
        Self {
            pokemon: (1..=count)
                .map(|id| (id, format!("mon-{id}"), vec!["normal".to_string()]))
                .collect(),
            habitats: vec![("grassland".to_string(), vec!["mon-1".to_string()])],
            reported_count: None,
        }
    }

    pub fn listing(&self, limit: usize, offset: usize) -> Value {
        let results = self
            .pokemon
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(id, name, _)| json!({ "name": name, "url": pokemon_url(*id) }))
            .collect::<Vec<_>>();
        json!({
            "count": self.reported_count.unwrap_or(self.pokemon.len() as u64),
            "results": results
        })
    }

    /// Registers details, habitats and types; listings are added per test.
    pub fn into_fetcher(&self) -> ScriptedFetcher {
        let mut fetcher = ScriptedFetcher::new();
        self.install(&mut fetcher);
        fetcher
    }

    pub fn install(&self, fetcher: &mut ScriptedFetcher) {
        let endpoints = endpoints();
        for (id, name, types) in &self.pokemon {
            let types = types.iter().map(String::as_str).collect::<Vec<_>>();
            fetcher.respond(pokemon_url(*id), pokemon_json(*id, name, &types));
        }

        let habitat_refs = self
            .habitats
            .iter()
            .map(|(name, _)| json!({ "name": name, "url": format!("{BASE}/pokemon-habitat/{name}/") }))
            .collect::<Vec<_>>();
        fetcher.respond(
            endpoints.habitat_list(),
            json!({ "count": habitat_refs.len(), "results": habitat_refs }),
        );
        for (name, members) in &self.habitats {
            let species = members
                .iter()
                .map(|member| json!({ "name": member, "url": format!("{BASE}/pokemon-species/{member}/") }))
                .collect::<Vec<_>>();
            fetcher.respond(
                format!("{BASE}/pokemon-habitat/{name}/"),
                json!({ "name": name, "pokemon_species": species }),
            );
        }

        fetcher.respond(
            endpoints.type_list(),
            json!({
                "count": 3,
                "results": [
                    { "name": "fire", "url": format!("{BASE}/type/fire/") },
                    { "name": "water", "url": format!("{BASE}/type/water/") },
                    { "name": "grass", "url": format!("{BASE}/type/grass/") }
                ]
            }),
        );
    }

    pub fn install_listing(&self, fetcher: &mut ScriptedFetcher, limit: usize, offset: usize) {
        fetcher.respond(
            endpoints().pokemon_list(limit, offset),
            self.listing(limit, offset),
        );
    }
}
