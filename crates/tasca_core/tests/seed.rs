use rusqlite::Connection;
use tasca_core::db::open_db_in_memory;
use tasca_core::{
    reset_database, seed_if_empty, GeoPoint, PriceLevel, SeedDataset, SeedOutcome,
    SqliteTascaRepository, Tasca, TascaRepository,
};

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn seeding_empty_store_inserts_bundled_dataset() {
    let conn = open_db_in_memory().unwrap();
    let dataset = SeedDataset::bundled().unwrap();

    let outcome = seed_if_empty(&conn, &dataset).unwrap();
    assert_eq!(
        outcome,
        SeedOutcome::Seeded {
            tascas: 11,
            reviews: 22
        }
    );
    assert_eq!(count(&conn, "tascas"), 11);
    assert_eq!(count(&conn, "reviews"), 22);

    let pending: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM tascas WHERE pending_sync = 1;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(pending, 0);
}

#[test]
fn seeding_twice_is_skipped() {
    let conn = open_db_in_memory().unwrap();
    let dataset = SeedDataset::bundled().unwrap();

    seed_if_empty(&conn, &dataset).unwrap();
    let outcome = seed_if_empty(&conn, &dataset).unwrap();

    assert_eq!(outcome, SeedOutcome::Skipped { existing: 11 });
    assert_eq!(count(&conn, "tascas"), 11);
}

#[test]
fn store_with_user_data_is_not_seeded() {
    let conn = open_db_in_memory().unwrap();
    SqliteTascaRepository::try_new(&conn)
        .unwrap()
        .create_tasca(&Tasca::new(
            "Tasca Particular",
            "Rua Escondida 1",
            "Lisboa",
            GeoPoint::new(38.7, -9.1),
            PriceLevel::Cheap,
        ))
        .unwrap();

    let outcome = seed_if_empty(&conn, &SeedDataset::bundled().unwrap()).unwrap();
    assert_eq!(outcome, SeedOutcome::Skipped { existing: 1 });
    assert_eq!(count(&conn, "reviews"), 0);
}

#[test]
fn reset_replaces_existing_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let dataset = SeedDataset::bundled().unwrap();
    seed_if_empty(&conn, &dataset).unwrap();
    SqliteTascaRepository::try_new(&conn)
        .unwrap()
        .create_tasca(&Tasca::new(
            "Tasca Particular",
            "Rua Escondida 1",
            "Lisboa",
            GeoPoint::new(38.7, -9.1),
            PriceLevel::Cheap,
        ))
        .unwrap();
    assert_eq!(count(&conn, "tascas"), 12);

    let outcome = reset_database(&mut conn, &dataset).unwrap();
    assert_eq!(
        outcome,
        SeedOutcome::Seeded {
            tascas: 11,
            reviews: 22
        }
    );
    assert_eq!(count(&conn, "tascas"), 11);
    assert_eq!(count(&conn, "reviews"), 22);
}

#[test]
fn invalid_dataset_rolls_back() {
    let conn = open_db_in_memory().unwrap();
    let dataset = SeedDataset::from_json(
        r#"{"tascas": [
            {"name": "Tasca Boa", "address": "Rua Boa 1", "city": "Lisboa",
             "lat": 38.7, "lng": -9.1, "price_level": 1,
             "reviews": [{"user_nick": "Ana", "comida": 4, "ambiente": 4, "preco_justo": 4}]},
            {"name": "Má", "address": "Rua Má 1", "city": "Lisboa",
             "lat": 38.7, "lng": -9.1, "price_level": 1}
        ]}"#,
    )
    .unwrap();

    assert!(seed_if_empty(&conn, &dataset).is_err());
    assert_eq!(count(&conn, "tascas"), 0);
    assert_eq!(count(&conn, "reviews"), 0);
}
