use std::collections::HashMap;

use futures::future::try_join_all;
use tracing::debug;

use crate::domain::{HabitatPayload, HabitatRecord, NamedResource, ResourceList};
use crate::error::PokedexError;
use crate::fetch::{ResourceFetcher, fetch_as};

/// Reverse lookup from species name to habitat name.
///
/// Records keep the order of the habitat listing. When a name belongs to more
/// than one habitat the first record in that order wins; the choice is made
/// once here rather than on every lookup.
#[derive(Debug, Clone, Default)]
pub struct HabitatIndex {
    records: Vec<HabitatRecord>,
    by_member: HashMap<String, usize>,
}

impl HabitatIndex {
    pub fn from_records(records: Vec<HabitatRecord>) -> Self {
        let mut by_member = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            for member in &record.member_names {
                by_member.entry(member.clone()).or_insert(position);
            }
        }
        Self { records, by_member }
    }

    /// Habitat of the raw API name, if any habitat lists it.
    pub fn habitat_of(&self, name: &str) -> Option<&str> {
        self.by_member
            .get(name)
            .map(|&position| self.records[position].name.as_str())
    }

    pub fn records(&self) -> &[HabitatRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Fetches the habitat listing, then every habitat's member list concurrently.
pub async fn build_habitat_index<F>(
    fetcher: &F,
    listing_url: &str,
) -> Result<HabitatIndex, PokedexError>
where
    F: ResourceFetcher + ?Sized,
{
    let listing: ResourceList = fetch_as(fetcher, listing_url).await?;
    let records = try_join_all(
        listing
            .results
            .iter()
            .map(|habitat| fetch_habitat(fetcher, habitat)),
    )
    .await?;
    debug!(habitats = records.len(), "habitat index built");
    Ok(HabitatIndex::from_records(records))
}

async fn fetch_habitat<F>(
    fetcher: &F,
    habitat: &NamedResource,
) -> Result<HabitatRecord, PokedexError>
where
    F: ResourceFetcher + ?Sized,
{
    let payload: HabitatPayload = fetch_as(fetcher, &habitat.url).await?;
    Ok(HabitatRecord {
        name: payload.name,
        member_names: payload
            .pokemon_species
            .into_iter()
            .map(|species| species.name)
            .collect(),
    })
}
