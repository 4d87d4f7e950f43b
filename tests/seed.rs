mod common;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use pokedex_catalog::error::{FetchError, PokedexError};
use pokedex_catalog::seed::seed;
use pokedex_catalog::store::Store;

use common::{NoopSink, Upstream, endpoints, pokemon_url, test_config};

fn temp_store(temp: &tempfile::TempDir) -> Store {
    Store::new_with_root(Utf8PathBuf::from_path_buf(temp.path().join("store")).unwrap())
}

fn upstream() -> Upstream {
    Upstream::new(
        &[
            (1, "bulbasaur", &["grass", "poison"]),
            (6, "charizard", &["fire", "flying"]),
            (122, "mr-mime", &["psychic", "fairy"]),
            (41, "zubat", &["poison", "flying"]),
        ],
        &[("grassland", &["bulbasaur"]), ("cave", &["zubat"])],
    )
}

#[tokio::test]
async fn seeds_every_enriched_pokemon() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    let upstream = upstream();
    let mut fetcher = upstream.into_fetcher();
    upstream.install_listing(&mut fetcher, 1025, 0);

    let report = seed(&fetcher, &store, &test_config(), &NoopSink)
        .await
        .unwrap();

    assert_eq!(report.listed, 4);
    assert_eq!(report.habitats, 2);
    assert_eq!(report.stored, 4);
    assert_eq!(report.failed, 0);

    let rows = store.read_all().unwrap();
    let ids = rows.iter().map(|row| row.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 6, 41, 122]);
    assert_eq!(rows[0].habitat, "grassland");
    assert_eq!(rows[1].habitat, "unknown");
    assert_eq!(rows[1].types, r#"["fire","flying"]"#);
    assert_eq!(rows[3].name, "mr mime");
    assert_eq!(rows[3].seeded_at, report.seeded_at);
    assert!(!store.lock_path().as_std_path().exists());
}

#[tokio::test]
async fn failed_details_are_left_out() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    let upstream = upstream();
    let mut fetcher = upstream.into_fetcher();
    upstream.install_listing(&mut fetcher, 1025, 0);
    fetcher.fail(pokemon_url(6), 500);

    let report = seed(&fetcher, &store, &test_config(), &NoopSink)
        .await
        .unwrap();

    assert_eq!(report.stored, 3);
    assert_eq!(report.failed, 1);
    assert!(store.read_all().unwrap().iter().all(|row| row.id != 6));
}

#[tokio::test]
async fn unreachable_listing_aborts_and_releases_the_lock() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    let upstream = upstream();
    let mut fetcher = upstream.into_fetcher();
    fetcher.fail(endpoints().pokemon_list(1025, 0), 503);

    let err = seed(&fetcher, &store, &test_config(), &NoopSink)
        .await
        .unwrap_err();

    assert_matches!(
        err,
        PokedexError::Fetch(FetchError::Status { status: 503, .. })
    );
    assert!(store.read_all().unwrap().is_empty());
    assert!(!store.lock_path().as_std_path().exists());
    assert!(store.open_writer().is_ok());
}

#[tokio::test]
async fn concurrent_seed_is_refused() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    let upstream = upstream();
    let mut fetcher = upstream.into_fetcher();
    upstream.install_listing(&mut fetcher, 1025, 0);

    let _held = store.open_writer().unwrap();
    let err = seed(&fetcher, &store, &test_config(), &NoopSink)
        .await
        .unwrap_err();

    assert_matches!(err, PokedexError::StoreLocked(_));
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn reseeding_does_not_duplicate_rows() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    let upstream = upstream();
    let mut fetcher = upstream.into_fetcher();
    upstream.install_listing(&mut fetcher, 1025, 0);

    seed(&fetcher, &store, &test_config(), &NoopSink)
        .await
        .unwrap();
    let second = seed(&fetcher, &store, &test_config(), &NoopSink)
        .await
        .unwrap();

    assert_eq!(second.stored, 0);
    assert_eq!(store.read_all().unwrap().len(), 4);
}
