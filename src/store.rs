use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tempfile::Builder;
use tracing::{debug, warn};

use crate::domain::StoredPokemon;
use crate::error::PokedexError;

/// File-backed catalogue written by the seed job and read by the offline view.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, PokedexError> {
        let root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("pokedex-catalog"))
                    .ok()
            })
            .ok_or_else(|| {
                PokedexError::Filesystem("unable to resolve cache directory".to_string())
            })?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn catalog_dir(&self) -> Utf8PathBuf {
        self.root.join("catalog")
    }

    pub fn catalog_path(&self) -> Utf8PathBuf {
        self.catalog_dir().join("pokemon.json")
    }

    pub fn lock_path(&self) -> Utf8PathBuf {
        self.catalog_dir().join(".lock")
    }

    pub fn ensure_root(&self) -> Result<(), PokedexError> {
        fs::create_dir_all(self.catalog_dir().as_std_path())
            .map_err(|err| PokedexError::Filesystem(err.to_string()))
    }

    /// Takes the catalogue's write lock; it is released when the writer drops.
    pub fn open_writer(&self) -> Result<CatalogWriter, PokedexError> {
        self.ensure_root()?;
        let lock_path = self.lock_path();
        let mut lock = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(lock_path.as_std_path())
            .map_err(|err| match err.kind() {
                io::ErrorKind::AlreadyExists => PokedexError::StoreLocked(lock_path.to_string()),
                _ => PokedexError::Filesystem(format!("create lock {lock_path}: {err}")),
            })?;
        let writer = CatalogWriter {
            store: self.clone(),
            lock_path,
        };
        // from here on an early return drops the writer, which removes the lock
        writeln!(lock, "{}", std::process::id())
            .map_err(|err| PokedexError::Filesystem(err.to_string()))?;
        debug!(lock = %writer.lock_path, "catalogue lock acquired");
        Ok(writer)
    }

    /// Every persisted row, ordered by id. A missing catalogue reads as empty.
    pub fn read_all(&self) -> Result<Vec<StoredPokemon>, PokedexError> {
        let path = self.catalog_path();
        if !path.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| PokedexError::Filesystem(format!("read {path}: {err}")))?;
        let mut rows: Vec<StoredPokemon> = serde_json::from_str(&content)
            .map_err(|err| PokedexError::Filesystem(format!("parse {path}: {err}")))?;
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    pub fn clear(&self) -> Result<(), PokedexError> {
        let path = self.catalog_path();
        if path.as_std_path().exists() {
            fs::remove_file(path.as_std_path())
                .map_err(|err| PokedexError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }

    fn write_rows_atomic(&self, rows: &[StoredPokemon]) -> Result<(), PokedexError> {
        let dir = self.catalog_dir();
        fs::create_dir_all(dir.as_std_path())
            .map_err(|err| PokedexError::Filesystem(err.to_string()))?;
        let content = serde_json::to_vec_pretty(rows)
            .map_err(|err| PokedexError::Filesystem(err.to_string()))?;
        let mut temp = Builder::new()
            .prefix("pokedex-catalog")
            .tempfile_in(dir.as_std_path())
            .map_err(|err| PokedexError::Filesystem(err.to_string()))?;
        temp.write_all(&content)
            .map_err(|err| PokedexError::Filesystem(err.to_string()))?;
        temp.persist(self.catalog_path().as_std_path())
            .map_err(|err| PokedexError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

/// Exclusive write access to the catalogue.
#[derive(Debug)]
pub struct CatalogWriter {
    store: Store,
    lock_path: Utf8PathBuf,
}

impl CatalogWriter {
    /// Appends rows whose id is not stored yet and returns how many were added.
    pub fn insert_many(&mut self, rows: &[StoredPokemon]) -> Result<usize, PokedexError> {
        let mut by_id = self
            .store
            .read_all()?
            .into_iter()
            .map(|row| (row.id, row))
            .collect::<BTreeMap<_, _>>();

        let mut inserted = 0usize;
        for row in rows {
            if by_id.contains_key(&row.id) {
                continue;
            }
            by_id.insert(row.id, row.clone());
            inserted += 1;
        }

        let all = by_id.into_values().collect::<Vec<_>>();
        self.store.write_rows_atomic(&all)?;
        Ok(inserted)
    }
}

impl Drop for CatalogWriter {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(self.lock_path.as_std_path()) {
            warn!(lock = %self.lock_path, error = %err, "failed to release catalogue lock");
        } else {
            debug!(lock = %self.lock_path, "catalogue lock released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new_with_root(Utf8PathBuf::from("/tmp/pokedex"));
        assert!(store.catalog_path().ends_with("catalog/pokemon.json"));
        assert!(store.lock_path().ends_with("catalog/.lock"));
    }
}
