use serde::{Deserialize, Serialize};

use crate::domain::{NamedResource, SpriteVariant, TypeSlot, display_name};
use crate::error::{FetchError, PokedexError};
use crate::fetch::{ApiEndpoints, ResourceFetcher, fetch_as};

pub const MISSING_ENTRY: &str = "No description available";

#[derive(Debug, Clone, Deserialize)]
pub struct DetailPayload {
    pub id: u32,
    pub name: String,
    pub weight: u32,
    pub height: u32,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub abilities: Vec<AbilitySlot>,
    #[serde(default)]
    pub sprites: DetailSprites,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    #[serde(default)]
    pub is_hidden: bool,
    pub slot: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailSprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: OtherSprites,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OtherSprites {
    #[serde(default, rename = "official-artwork")]
    pub official_artwork: Option<Artwork>,
    #[serde(default)]
    pub home: Option<Artwork>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artwork {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub front_shiny: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesPayload {
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorText>,
    #[serde(default)]
    pub varieties: Vec<Variety>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlavorText {
    pub flavor_text: String,
    pub language: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Variety {
    #[serde(default)]
    pub is_default: bool,
    pub pokemon: NamedResource,
}

#[derive(Debug, Clone, Serialize)]
pub struct PokemonDetails {
    pub id: u32,
    pub name: String,
    pub title: String,
    pub weight_kg: f64,
    pub height_m: f64,
    pub types: Vec<String>,
    pub abilities: Vec<Ability>,
    pub pokedex_entry: String,
    pub variant: SpriteVariant,
    pub artwork_url: Option<String>,
    pub forms: Vec<PokemonForm>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ability {
    pub name: String,
    pub slot: u32,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PokemonForm {
    pub label: String,
    pub name: String,
    pub id: Option<u32>,
    pub is_default: bool,
}

/// Loads a pokemon (or one of its forms) together with its species entry.
///
/// `form` selects the `/pokemon` resource; the species is always looked up by `id`.
pub async fn fetch_details<F>(
    fetcher: &F,
    endpoints: &ApiEndpoints,
    id: &str,
    form: Option<&str>,
    variant: SpriteVariant,
) -> Result<PokemonDetails, PokedexError>
where
    F: ResourceFetcher + ?Sized,
{
    let pokemon_url = endpoints.pokemon(form.unwrap_or(id));
    let species_url = endpoints.species(id);
    let (pokemon, species) = tokio::try_join!(
        fetch_as::<_, DetailPayload>(fetcher, &pokemon_url),
        fetch_as::<_, SpeciesPayload>(fetcher, &species_url),
    )
    .map_err(|err| match err {
        PokedexError::Fetch(FetchError::Status { status: 404, .. }) => {
            PokedexError::PokemonNotFound(form.unwrap_or(id).to_string())
        }
        other => other,
    })?;
    Ok(assemble_details(pokemon, species, variant))
}

pub fn assemble_details(
    pokemon: DetailPayload,
    species: SpeciesPayload,
    variant: SpriteVariant,
) -> PokemonDetails {
    let mut types = pokemon.types;
    types.sort_by_key(|slot| slot.slot);
    let mut abilities = pokemon
        .abilities
        .iter()
        .map(|slot| Ability {
            name: display_name(&slot.ability.name),
            slot: slot.slot,
            hidden: slot.is_hidden,
        })
        .collect::<Vec<_>>();
    abilities.sort_by_key(|ability| ability.slot);

    let forms = if species.varieties.len() > 1 {
        species
            .varieties
            .iter()
            .map(|variety| PokemonForm {
                label: if variety.is_default {
                    "Default".to_string()
                } else {
                    form_label(&variety.pokemon.name)
                },
                name: variety.pokemon.name.clone(),
                id: resource_id(&variety.pokemon.url),
                is_default: variety.is_default,
            })
            .collect()
    } else {
        Vec::new()
    };

    PokemonDetails {
        id: pokemon.id,
        name: display_name(&pokemon.name),
        title: title(&pokemon.name),
        // hectograms and decimetres
        weight_kg: f64::from(pokemon.weight) / 10.0,
        height_m: f64::from(pokemon.height) / 10.0,
        types: types.iter().map(|slot| slot.name().to_string()).collect(),
        abilities,
        pokedex_entry: pokedex_entry(&species.flavor_text_entries),
        variant,
        artwork_url: artwork_url(&pokemon.sprites, variant),
        forms,
    }
}

/// First English flavor text with whitespace collapsed and the first letter upper-cased.
pub fn pokedex_entry(entries: &[FlavorText]) -> String {
    let Some(entry) = entries.iter().find(|entry| entry.language.name == "en") else {
        return MISSING_ENTRY.to_string();
    };
    let collapsed = entry.flavor_text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => MISSING_ENTRY.to_string(),
    }
}

/// Heading for a pokemon; Gigantamax forms read as `<base> Gigantamax`.
pub fn title(api_name: &str) -> String {
    let parts = api_name.split('-').collect::<Vec<_>>();
    if parts.contains(&"gmax") {
        let base = parts
            .iter()
            .filter(|part| **part != "gmax")
            .copied()
            .collect::<Vec<_>>()
            .join(" ");
        return format!("{base} Gigantamax");
    }
    display_name(api_name)
}

/// Button label for a non-default form name such as `charizard-mega-x`.
pub fn form_label(api_name: &str) -> String {
    let parts = api_name.split('-').collect::<Vec<_>>();
    if parts.contains(&"gmax") {
        return "Gigantamax".to_string();
    }
    if let Some(position) = parts.iter().position(|part| *part == "mega") {
        return match parts.get(position + 1).copied() {
            Some(suffix) if suffix == "x" || suffix == "y" => {
                format!("Mega {}", suffix.to_uppercase())
            }
            _ => "Mega".to_string(),
        };
    }
    if parts.len() > 1 {
        return parts[1..].join(" ");
    }
    "Default".to_string()
}

/// Trailing numeric id of a resource URL such as `.../pokemon/10034/`.
pub fn resource_id(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

fn artwork_url(sprites: &DetailSprites, variant: SpriteVariant) -> Option<String> {
    let artwork = sprites
        .other
        .official_artwork
        .as_ref()
        .filter(|artwork| artwork.front_default.is_some())
        .or(sprites.other.home.as_ref());
    let chosen = artwork.and_then(|artwork| match variant {
        SpriteVariant::Shiny => artwork
            .front_shiny
            .clone()
            .or_else(|| artwork.front_default.clone()),
        SpriteVariant::Default => artwork.front_default.clone(),
    });
    chosen.or_else(|| sprites.front_default.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flavor(text: &str, language: &str) -> FlavorText {
        FlavorText {
            flavor_text: text.to_string(),
            language: NamedResource {
                name: language.to_string(),
                url: String::new(),
            },
        }
    }

    #[test]
    fn pokedex_entry_prefers_english_and_collapses_whitespace() {
        let entries = vec![
            flavor("Lorsqu'il", "fr"),
            flavor("when several of\nthese POKéMON\u{c}gather", "en"),
        ];
        assert_eq!(
            pokedex_entry(&entries),
            "When several of these POKéMON gather"
        );
        assert_eq!(pokedex_entry(&[flavor("texte", "fr")]), MISSING_ENTRY);
    }

    #[test]
    fn form_labels() {
        assert_eq!(form_label("charizard-gmax"), "Gigantamax");
        assert_eq!(form_label("charizard-mega-x"), "Mega X");
        assert_eq!(form_label("venusaur-mega"), "Mega");
        assert_eq!(form_label("pikachu-rock-star"), "rock star");
        assert_eq!(form_label("pikachu"), "Default");
    }

    #[test]
    fn gigantamax_title() {
        assert_eq!(title("charizard-gmax"), "charizard Gigantamax");
        assert_eq!(title("mr-mime"), "mr mime");
    }

    #[test]
    fn resource_id_reads_last_segment() {
        assert_eq!(
            resource_id("https://pokeapi.co/api/v2/pokemon/10034/"),
            Some(10034)
        );
        assert_eq!(resource_id("https://pokeapi.co/api/v2/pokemon/"), None);
    }

    #[test]
    fn shiny_artwork_falls_back_to_default() {
        let sprites = DetailSprites {
            front_default: Some("front.png".to_string()),
            other: OtherSprites {
                official_artwork: Some(Artwork {
                    front_default: Some("art.png".to_string()),
                    front_shiny: None,
                }),
                home: None,
            },
        };
        assert_eq!(
            artwork_url(&sprites, SpriteVariant::Shiny).as_deref(),
            Some("art.png")
        );
        assert_eq!(
            artwork_url(&DetailSprites::default(), SpriteVariant::Default),
            None
        );
    }
}
