use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::domain::{NamedResource, Pokemon, PokemonPayload, display_name};
use crate::error::PokedexError;
use crate::fetch::{ResourceFetcher, fetch_as};
use crate::habitat::HabitatIndex;

/// Builds the display record. The habitat lookup uses the raw API name,
/// before hyphens are replaced.
pub fn build_pokemon(payload: PokemonPayload, habitats: &HabitatIndex) -> Pokemon {
    let habitat = habitats.habitat_of(&payload.name).map(str::to_string);
    let mut types = payload.types;
    types.sort_by_key(|slot| slot.slot);
    Pokemon {
        id: payload.id,
        name: display_name(&payload.name),
        weight: payload.weight,
        height: payload.height,
        habitat,
        types,
        sprite_url: payload.sprites.front_default,
    }
}

/// Fetches every reference with at most `limit` detail requests in flight.
///
/// Each reference settles independently. Outcomes are returned in completion
/// order, not input order.
pub async fn enrich_settled<F>(
    fetcher: &F,
    references: &[NamedResource],
    habitats: &HabitatIndex,
    limit: usize,
) -> Vec<Result<Pokemon, PokedexError>>
where
    F: ResourceFetcher + ?Sized,
{
    let gate = Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS));
    let mut pending = references
        .iter()
        .map(|reference| enrich_one(fetcher, reference, habitats, &gate))
        .collect::<FuturesUnordered<_>>();

    let mut outcomes = Vec::with_capacity(references.len());
    while let Some(outcome) = pending.next().await {
        outcomes.push(outcome);
    }
    outcomes
}

/// Like [`enrich_settled`], keeping the successes and dropping every failure.
pub async fn enrich<F>(
    fetcher: &F,
    references: &[NamedResource],
    habitats: &HabitatIndex,
    limit: usize,
) -> Vec<Pokemon>
where
    F: ResourceFetcher + ?Sized,
{
    let outcomes = enrich_settled(fetcher, references, habitats, limit).await;
    let mut enriched = Vec::with_capacity(outcomes.len());
    let mut failed = 0usize;
    for outcome in outcomes {
        match outcome {
            Ok(pokemon) => enriched.push(pokemon),
            Err(err) => {
                failed += 1;
                warn!(error = %err, "dropping pokemon that failed to enrich");
            }
        }
    }
    info!(
        requested = references.len(),
        enriched = enriched.len(),
        failed,
        limit,
        "enrichment finished"
    );
    enriched
}

async fn enrich_one<F>(
    fetcher: &F,
    reference: &NamedResource,
    habitats: &HabitatIndex,
    gate: &Semaphore,
) -> Result<Pokemon, PokedexError>
where
    F: ResourceFetcher + ?Sized,
{
    // the gate is local to one enrichment run and never closed
    let permit = gate.acquire().await.expect("enrichment gate closed");
    debug!(url = %reference.url, "detail fetch admitted");
    let payload = fetch_as::<_, PokemonPayload>(fetcher, &reference.url).await;
    drop(permit);
    Ok(build_pokemon(payload?, habitats))
}
