use serde::Serialize;

use crate::domain::{NamedResource, Pokemon, display_name};

/// How a page request reaches upstream, decided before any fetch happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Only the requested window of references is listed and enriched.
    Windowed,
    /// The whole collection is listed, enriched, filtered, then sliced.
    FullScanFiltered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub name: Option<String>,
    pub type_name: Option<String>,
    pub habitat: Option<String>,
}

impl Filters {
    /// Blank values count as absent.
    pub fn new(name: Option<String>, type_name: Option<String>, habitat: Option<String>) -> Self {
        Self {
            name: non_blank(name),
            type_name: non_blank(type_name),
            habitat: non_blank(habitat),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.type_name.is_none() && self.habitat.is_none()
    }

    pub fn mode(&self) -> Mode {
        if self.is_empty() {
            Mode::Windowed
        } else {
            Mode::FullScanFiltered
        }
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name
            .as_deref()
            .is_none_or(|query| name.to_lowercase().contains(&query.to_lowercase()))
    }

    /// Name check against a listing entry, used to skip detail fetches that
    /// could never pass the name predicate.
    pub fn matches_reference(&self, reference: &NamedResource) -> bool {
        self.matches_name(&display_name(&reference.name))
    }

    pub fn matches_habitat(&self, habitat: Option<&str>) -> bool {
        match self.habitat.as_deref() {
            None => true,
            Some(query) => habitat.is_some_and(|habitat| habitat.contains(query)),
        }
    }

    pub fn matches_type(&self, pokemon: &Pokemon) -> bool {
        self.type_name.as_deref().is_none_or(|query| {
            pokemon
                .types
                .iter()
                .any(|slot| slot.name().contains(query))
        })
    }

    pub fn matches(&self, pokemon: &Pokemon) -> bool {
        self.matches_name(&pokemon.name)
            && self.matches_habitat(pokemon.habitat.as_deref())
            && self.matches_type(pokemon)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    /// 1-based.
    pub page: usize,
    pub filters: Filters,
}

impl PageRequest {
    pub fn new(page: Option<usize>, filters: Filters) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            filters,
        }
    }

    pub fn mode(&self) -> Mode {
        self.filters.mode()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    pub items: Vec<Pokemon>,
    /// Page actually served after clamping.
    pub page: usize,
    pub total_count: usize,
    pub total_pages: usize,
}

/// `ceil(total_count / page_size)`, never below one page.
pub fn total_pages(total_count: usize, page_size: usize) -> usize {
    total_count.div_ceil(page_size.max(1)).max(1)
}

/// Page count for the windowed path, capped so a pathological upstream count
/// cannot produce an unbounded page range.
pub fn windowed_total_pages(upstream_count: usize, page_size: usize, max_pages: usize) -> usize {
    total_pages(upstream_count, page_size).min(max_pages.max(1))
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Offset of the first item of the 1-based `page`.
pub fn window_offset(page: usize, page_size: usize) -> usize {
    page.saturating_sub(1).saturating_mul(page_size)
}

/// Filters the full collection, orders it by id and slices out one page.
///
/// The page count comes from the filtered length.
pub fn select_page(
    entities: Vec<Pokemon>,
    filters: &Filters,
    page: usize,
    page_size: usize,
) -> PageResult {
    let page_size = page_size.max(1);
    let mut matching = entities
        .into_iter()
        .filter(|pokemon| filters.matches(pokemon))
        .collect::<Vec<_>>();
    matching.sort_by_key(|pokemon| pokemon.id);

    let total_count = matching.len();
    let total_pages = total_pages(total_count, page_size);
    let page = clamp_page(page, total_pages);
    let items = matching
        .into_iter()
        .skip(window_offset(page, page_size))
        .take(page_size)
        .collect();

    PageResult {
        items,
        page,
        total_count,
        total_pages,
    }
}
