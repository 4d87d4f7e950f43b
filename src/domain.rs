use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// `{name, url}` pair produced by every PokéAPI listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceList {
    pub count: u64,
    #[serde(default)]
    pub results: Vec<NamedResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub type_: NamedResource,
}

impl TypeSlot {
    pub fn name(&self) -> &str {
        &self.type_.name
    }
}

/// A habitat and the species names it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitatRecord {
    pub name: String,
    pub member_names: Vec<String>,
}

impl HabitatRecord {
    pub fn contains(&self, name: &str) -> bool {
        self.member_names.iter().any(|member| member == name)
    }
}

/// Fully populated display record built from a detail fetch plus a habitat lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    pub weight: u32,
    pub height: u32,
    pub habitat: Option<String>,
    pub types: Vec<TypeSlot>,
    pub sprite_url: Option<String>,
}

impl Pokemon {
    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(TypeSlot::name).collect()
    }
}

/// Shape of the `/pokemon/{id}` fields the catalogue relies on.
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonPayload {
    pub id: u32,
    pub name: String,
    pub weight: u32,
    pub height: u32,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub sprites: SpritePayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpritePayload {
    #[serde(default)]
    pub front_default: Option<String>,
}

/// Shape of `/pokemon-habitat/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct HabitatPayload {
    pub name: String,
    #[serde(default)]
    pub pokemon_species: Vec<NamedResource>,
}

/// Row shape of the persisted catalogue. `types` is a JSON-encoded list of type names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPokemon {
    pub id: u32,
    pub name: String,
    pub weight: u32,
    pub height: u32,
    pub habitat: String,
    pub types: String,
    pub sprites: Option<String>,
    pub seeded_at: String,
}

pub const UNKNOWN_HABITAT: &str = "unknown";

impl StoredPokemon {
    pub fn from_pokemon(pokemon: &Pokemon, seeded_at: &str) -> Self {
        let type_names = pokemon.type_names();
        Self {
            id: pokemon.id,
            name: pokemon.name.clone(),
            weight: pokemon.weight,
            height: pokemon.height,
            habitat: pokemon
                .habitat
                .clone()
                .unwrap_or_else(|| UNKNOWN_HABITAT.to_string()),
            // a Vec<&str> always serializes
            types: serde_json::to_string(&type_names).unwrap_or_else(|_| "[]".to_string()),
            sprites: pokemon.sprite_url.clone(),
            seeded_at: seeded_at.to_string(),
        }
    }

    /// Decodes the flat `types` column; malformed values read as no types.
    pub fn type_names(&self) -> Vec<String> {
        serde_json::from_str(&self.types).unwrap_or_default()
    }
}

/// Replaces the API's `-` separators with spaces.
pub fn display_name(api_name: &str) -> String {
    api_name.replace('-', " ")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SpriteVariant {
    #[default]
    Default,
    Shiny,
}

impl fmt::Display for SpriteVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpriteVariant::Default => write!(f, "default"),
            SpriteVariant::Shiny => write!(f, "shiny"),
        }
    }
}
