use serde::Serialize;
use tracing::info;

use crate::app::{ProgressEvent, ProgressSink};
use crate::config::ResolvedConfig;
use crate::domain::{ResourceList, StoredPokemon};
use crate::enrich::enrich;
use crate::error::PokedexError;
use crate::fetch::{ApiEndpoints, ResourceFetcher, fetch_as};
use crate::habitat::build_habitat_index;
use crate::store::Store;

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub listed: usize,
    pub habitats: usize,
    pub enriched: usize,
    pub failed: usize,
    pub stored: usize,
    pub seeded_at: String,
    pub catalog_path: String,
}

/// One-shot import of the whole collection into the local catalogue.
///
/// The catalogue write lock is held for the whole run and released on return,
/// whether the job succeeds or fails. Listing and habitat failures abort the
/// job; individual detail failures only shrink the stored set.
pub async fn seed<F>(
    fetcher: &F,
    store: &Store,
    config: &ResolvedConfig,
    sink: &dyn ProgressSink,
) -> Result<SeedReport, PokedexError>
where
    F: ResourceFetcher + ?Sized,
{
    let mut writer = store.open_writer()?;
    let endpoints = ApiEndpoints::new(config.base_url.as_str());

    sink.event(ProgressEvent::new(format!(
        "phase=Resolve; listing {} pokemon and habitats",
        config.collection_limit
    )));
    let listing_url = endpoints.pokemon_list(config.collection_limit, 0);
    let habitat_url = endpoints.habitat_list();
    let (listing, habitats) = tokio::try_join!(
        fetch_as::<_, ResourceList>(fetcher, &listing_url),
        build_habitat_index(fetcher, &habitat_url),
    )?;

    sink.event(ProgressEvent::new(format!(
        "phase=Enrich; fetching {} details (concurrency {})",
        listing.results.len(),
        config.concurrency.seed
    )));
    let mut pokemon = enrich(
        fetcher,
        &listing.results,
        &habitats,
        config.concurrency.seed,
    )
    .await;
    pokemon.sort_by_key(|pokemon| pokemon.id);

    let seeded_at = chrono::Utc::now().to_rfc3339();
    let rows = pokemon
        .iter()
        .map(|pokemon| StoredPokemon::from_pokemon(pokemon, &seeded_at))
        .collect::<Vec<_>>();

    sink.event(ProgressEvent::new(format!(
        "phase=Store; writing {} rows",
        rows.len()
    )));
    let stored = writer.insert_many(&rows)?;
    info!(stored, path = %store.catalog_path(), "stored pokemon in catalogue");

    Ok(SeedReport {
        listed: listing.results.len(),
        habitats: habitats.len(),
        enriched: rows.len(),
        failed: listing.results.len() - rows.len(),
        stored,
        seeded_at,
        catalog_path: store.catalog_path().to_string(),
    })
}
