use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::detail::{PokemonDetails, fetch_details};
use crate::domain::{ResourceList, SpriteVariant};
use crate::enrich::enrich;
use crate::error::PokedexError;
use crate::fetch::{ApiEndpoints, ResourceFetcher, fetch_as};
use crate::habitat::{HabitatIndex, build_habitat_index};
use crate::page::{
    Filters, Mode, PageRequest, PageResult, clamp_page, select_page, window_offset,
    windowed_total_pages,
};
use crate::seed::{SeedReport, seed};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            elapsed: None,
        }
    }

    pub fn timed(message: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            message: message.into(),
            elapsed: Some(elapsed),
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

/// Values a front end offers in its type and habitat selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub types: Vec<String>,
    pub habitats: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub mode: Mode,
    pub filters: Filters,
    pub page_size: usize,
    #[serde(flatten)]
    pub result: PageResult,
    pub options: FilterOptions,
}

/// Live catalogue reading straight from the upstream API.
pub struct Catalog<F: ResourceFetcher> {
    fetcher: F,
    config: ResolvedConfig,
    endpoints: ApiEndpoints,
}

impl<F: ResourceFetcher> Catalog<F> {
    pub fn new(fetcher: F, config: ResolvedConfig) -> Self {
        let endpoints = ApiEndpoints::new(config.base_url.as_str());
        Self {
            fetcher,
            config,
            endpoints,
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    /// Detail fetch cap for a page request with these filters.
    pub fn concurrency_for(&self, filters: &Filters) -> usize {
        let limits = &self.config.concurrency;
        match filters.mode() {
            Mode::Windowed => limits.windowed,
            Mode::FullScanFiltered if filters.name.is_some() => limits.name_filtered,
            Mode::FullScanFiltered => limits.full_scan,
        }
    }

    pub async fn page(
        &self,
        request: &PageRequest,
        sink: &dyn ProgressSink,
    ) -> Result<CatalogPage, PokedexError> {
        let start = Instant::now();
        let mode = request.mode();
        let page_size = self.config.page_size;

        let listing_url = match mode {
            Mode::Windowed => {
                let page = clamp_page(request.page, self.config.max_pages);
                self.endpoints
                    .pokemon_list(page_size, window_offset(page, page_size))
            }
            Mode::FullScanFiltered => self.endpoints.pokemon_list(self.config.collection_limit, 0),
        };
        sink.event(ProgressEvent::new(format!(
            "phase=Resolve; mode={mode:?} listing {listing_url}"
        )));

        let types_url = self.endpoints.type_list();
        let habitat_url = self.endpoints.habitat_list();
        let (listing, habitats, types) = tokio::try_join!(
            fetch_as::<_, ResourceList>(&self.fetcher, &listing_url),
            build_habitat_index(&self.fetcher, &habitat_url),
            fetch_as::<_, ResourceList>(&self.fetcher, &types_url),
        )?;

        let result = match mode {
            Mode::Windowed => self.windowed_page(request, listing, &habitats, sink).await?,
            Mode::FullScanFiltered => self.filtered_page(request, listing, &habitats, sink).await,
        };

        sink.event(ProgressEvent::timed(
            format!(
                "phase=Done; page {}/{} with {} items",
                result.page,
                result.total_pages,
                result.items.len()
            ),
            start.elapsed(),
        ));

        Ok(CatalogPage {
            mode,
            filters: request.filters.clone(),
            page_size,
            result,
            options: FilterOptions {
                types: types.results.into_iter().map(|entry| entry.name).collect(),
                habitats: habitat_names(&habitats),
            },
        })
    }

    pub async fn filter_options(&self) -> Result<FilterOptions, PokedexError> {
        let types_url = self.endpoints.type_list();
        let habitat_url = self.endpoints.habitat_list();
        let (types, habitats) = tokio::try_join!(
            fetch_as::<_, ResourceList>(&self.fetcher, &types_url),
            fetch_as::<_, ResourceList>(&self.fetcher, &habitat_url),
        )?;
        Ok(FilterOptions {
            types: types.results.into_iter().map(|entry| entry.name).collect(),
            habitats: habitats.results.into_iter().map(|entry| entry.name).collect(),
        })
    }

    pub async fn details(
        &self,
        id: &str,
        form: Option<&str>,
        variant: SpriteVariant,
    ) -> Result<PokemonDetails, PokedexError> {
        fetch_details(&self.fetcher, &self.endpoints, id, form, variant).await
    }

    pub async fn seed(
        &self,
        store: &Store,
        sink: &dyn ProgressSink,
    ) -> Result<SeedReport, PokedexError> {
        seed(&self.fetcher, store, &self.config, sink).await
    }

    async fn windowed_page(
        &self,
        request: &PageRequest,
        listing: ResourceList,
        habitats: &HabitatIndex,
        sink: &dyn ProgressSink,
    ) -> Result<PageResult, PokedexError> {
        let page_size = self.config.page_size;
        let total_count = usize::try_from(listing.count).unwrap_or(usize::MAX);
        let total_pages = windowed_total_pages(total_count, page_size, self.config.max_pages);
        let fetched_page = clamp_page(request.page, self.config.max_pages);
        let page = clamp_page(fetched_page, total_pages);

        let references = if page == fetched_page {
            listing.results
        } else {
            // the requested window lay past the end; list the last valid one instead
            let url = self
                .endpoints
                .pokemon_list(page_size, window_offset(page, page_size));
            fetch_as::<_, ResourceList>(&self.fetcher, &url)
                .await?
                .results
        };

        sink.event(ProgressEvent::new(format!(
            "phase=Enrich; fetching {} details",
            references.len()
        )));
        let mut items = enrich(
            &self.fetcher,
            &references,
            habitats,
            self.concurrency_for(&request.filters),
        )
        .await;
        items.sort_by_key(|pokemon| pokemon.id);

        Ok(PageResult {
            items,
            page,
            total_count,
            total_pages,
        })
    }

    async fn filtered_page(
        &self,
        request: &PageRequest,
        listing: ResourceList,
        habitats: &HabitatIndex,
        sink: &dyn ProgressSink,
    ) -> PageResult {
        let candidates = listing
            .results
            .into_iter()
            .filter(|reference| request.filters.matches_reference(reference))
            .collect::<Vec<_>>();

        sink.event(ProgressEvent::new(format!(
            "phase=Enrich; fetching {} details",
            candidates.len()
        )));
        let enriched = enrich(
            &self.fetcher,
            &candidates,
            habitats,
            self.concurrency_for(&request.filters),
        )
        .await;

        sink.event(ProgressEvent::new("phase=Filter; applying filters"));
        select_page(
            enriched,
            &request.filters,
            request.page,
            self.config.page_size,
        )
    }
}

fn habitat_names(habitats: &HabitatIndex) -> Vec<String> {
    habitats
        .records()
        .iter()
        .map(|record| record.name.clone())
        .collect()
}
