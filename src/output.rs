use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::app::{CatalogPage, FilterOptions, ProgressEvent, ProgressSink};
use crate::detail::PokemonDetails;
use crate::domain::StoredPokemon;
use crate::seed::SeedReport;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_page(page: &CatalogPage) -> io::Result<()> {
        Self::print_json(page)
    }

    pub fn print_details(details: &PokemonDetails) -> io::Result<()> {
        Self::print_json(details)
    }

    pub fn print_seed(report: &SeedReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_stored(rows: &[StoredPokemon]) -> io::Result<()> {
        Self::print_json(&rows)
    }

    pub fn print_options(options: &FilterOptions) -> io::Result<()> {
        Self::print_json(options)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

pub struct TextOutput;

impl TextOutput {
    pub fn print_page(page: &CatalogPage) -> io::Result<()> {
        let mut out = io::stdout().lock();
        for pokemon in &page.result.items {
            writeln!(
                out,
                "#{:<5} {:<24} {:<18} {:<14} w={:<5} h={}",
                pokemon.id,
                pokemon.name,
                pokemon.type_names().join("/"),
                pokemon.habitat.as_deref().unwrap_or("-"),
                pokemon.weight,
                pokemon.height
            )?;
        }
        writeln!(
            out,
            "page {}/{} ({} total)",
            page.result.page, page.result.total_pages, page.result.total_count
        )
    }

    pub fn print_details(details: &PokemonDetails) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} #{}", details.title, details.id)?;
        writeln!(out, "Weight: {}kg", details.weight_kg)?;
        writeln!(out, "Height: {}m", details.height_m)?;
        writeln!(out, "Types: {}", details.types.join(", "))?;
        let abilities = details
            .abilities
            .iter()
            .map(|ability| {
                if ability.hidden {
                    format!("{} (hidden)", ability.name)
                } else {
                    ability.name.clone()
                }
            })
            .collect::<Vec<_>>();
        writeln!(out, "Abilities: {}", abilities.join(", "))?;
        writeln!(out, "Pokedex entry: {}", details.pokedex_entry)?;
        if let Some(url) = &details.artwork_url {
            writeln!(out, "Artwork ({}): {url}", details.variant)?;
        }
        for form in &details.forms {
            let id = form.id.map(|id| id.to_string()).unwrap_or_default();
            writeln!(out, "  form {:<14} {} {id}", form.label, form.name)?;
        }
        Ok(())
    }

    pub fn print_seed(report: &SeedReport) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "Stored {} pokemon in {}", report.stored, report.catalog_path)?;
        if report.failed > 0 {
            writeln!(out, "Skipped {} pokemon that failed to load", report.failed)?;
        }
        Ok(())
    }

    pub fn print_stored(rows: &[StoredPokemon]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        for row in rows {
            writeln!(
                out,
                "#{:<5} {:<24} {:<18} {:<14} w={:<5} h={}",
                row.id,
                row.name,
                row.type_names().join("/"),
                row.habitat,
                row.weight,
                row.height
            )?;
        }
        writeln!(out, "{} stored pokemon", rows.len())
    }

    pub fn print_options(options: &FilterOptions) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "Types: {}", options.types.join(", "))?;
        writeln!(out, "Habitats: {}", options.habitats.join(", "))
    }
}

/// Forwards progress events to the log.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message),
            None => info!("{}", event.message),
        }
    }
}
