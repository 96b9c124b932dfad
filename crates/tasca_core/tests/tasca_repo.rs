use rusqlite::Connection;
use tasca_core::db::migrations::latest_version;
use tasca_core::db::open_db_in_memory;
use tasca_core::{
    DayKey, GeoPoint, PriceLevel, RepoError, SqliteTascaRepository, Tasca, TascaRepository,
    TascaValidationError, TimeRange, WeeklySchedule,
};
use uuid::Uuid;

fn tasca(name: &str, address: &str, city: &str) -> Tasca {
    Tasca::new(
        name,
        address,
        city,
        GeoPoint::new(38.7, -9.1),
        PriceLevel::Moderate,
    )
}

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTascaRepository::try_new(&conn).unwrap();

    let mut record = tasca("Tasca do Chico", "Rua do Diário de Notícias 39", "Lisboa");
    record.tags_csv = "fado, petiscos".to_string();
    record.website = Some("https://tascadochico.pt".to_string());
    record.schedule = WeeklySchedule::new().with_day(
        DayKey::Fri,
        vec![TimeRange::parse("19:00", "02:00").unwrap()],
    );
    let id = repo.create_tasca(&record).unwrap();

    let loaded = repo.get_tasca(id).unwrap().unwrap();
    assert_eq!(loaded.id, record.id);
    assert_eq!(loaded.name, "Tasca do Chico");
    assert_eq!(loaded.tags(), vec!["fado", "petiscos"]);
    assert_eq!(loaded.website.as_deref(), Some("https://tascadochico.pt"));
    assert_eq!(loaded.phone, None);
    assert_eq!(loaded.schedule, record.schedule);
    assert!(loaded.created_at.is_some());
    assert_eq!(loaded.created_at, loaded.updated_at);
    assert!(!loaded.pending_sync);
}

#[test]
fn get_unknown_id_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTascaRepository::try_new(&conn).unwrap();

    assert!(repo.get_tasca(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn create_rejects_invalid_tasca_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTascaRepository::try_new(&conn).unwrap();

    let err = repo.create_tasca(&tasca("Zé", "Rua Nova 1", "Lisboa")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidTasca(TascaValidationError::NameTooShort)
    ));
    assert_eq!(repo.count_tascas().unwrap(), 0);
}

#[test]
fn list_preserves_insertion_order_without_query() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTascaRepository::try_new(&conn).unwrap();

    for name in ["Primeira Tasca", "Segunda Tasca", "Terceira Tasca"] {
        let mut record = tasca(name, "Rua Augusta 10", "Lisboa");
        record.created_at = Some(1_000);
        repo.create_tasca(&record).unwrap();
    }

    let names: Vec<String> = repo
        .list_tascas(None)
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(
        names,
        vec!["Primeira Tasca", "Segunda Tasca", "Terceira Tasca"]
    );
    assert_eq!(repo.count_tascas().unwrap(), 3);
}

#[test]
fn list_query_matches_name_city_or_address_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTascaRepository::try_new(&conn).unwrap();

    repo.create_tasca(&tasca("Adega Ribeira", "Rua Nova 1", "Lisboa"))
        .unwrap();
    repo.create_tasca(&tasca("Casa Minhota", "Largo da Ribeira 4", "Porto"))
        .unwrap();
    repo.create_tasca(&tasca("Tasca Central", "Praça Velha 2", "Ribeira Grande"))
        .unwrap();
    repo.create_tasca(&tasca("O Fadista", "Rua do Carmo 8", "Lisboa"))
        .unwrap();

    assert_eq!(repo.list_tascas(Some("RIBEIRA")).unwrap().len(), 3);
    assert_eq!(repo.list_tascas(Some("  lisboa ")).unwrap().len(), 2);
    assert_eq!(repo.list_tascas(Some("   ")).unwrap().len(), 4);
    assert!(repo.list_tascas(Some("braga")).unwrap().is_empty());
}

#[test]
fn list_query_ignores_surrounding_whitespace() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTascaRepository::try_new(&conn).unwrap();

    repo.create_tasca(&tasca("Adega Ribeira", "Rua Nova 1", "Lisboa"))
        .unwrap();
    repo.create_tasca(&tasca("Casa Minhota", "Largo da Ribeira 4", "Porto"))
        .unwrap();

    let padded = repo.list_tascas(Some(" porto\t")).unwrap();
    assert_eq!(padded.len(), 1);
    assert_eq!(padded[0].name, "Casa Minhota");
    assert_eq!(repo.list_tascas(Some("\n")).unwrap().len(), 2);
}

#[test]
fn list_query_treats_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTascaRepository::try_new(&conn).unwrap();

    repo.create_tasca(&tasca("Tasca 100% Caseira", "Rua Nova 1", "Lisboa"))
        .unwrap();
    repo.create_tasca(&tasca("Tasca 1000 Sabores", "Rua Nova 2", "Lisboa"))
        .unwrap();

    let hits = repo.list_tascas(Some("100%")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Tasca 100% Caseira");
    assert!(repo.list_tascas(Some("_")).unwrap().is_empty());
}

#[test]
fn invalid_persisted_price_level_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTascaRepository::try_new(&conn).unwrap();
    let record = tasca("Tasca do Canto", "Rua do Canto 3", "Lisboa");
    repo.create_tasca(&record).unwrap();

    conn.execute(
        "UPDATE tascas SET price_level = 7 WHERE id = ?1;",
        [record.id.to_string()],
    )
    .unwrap();

    let err = repo.get_tasca(record.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("price level")));
}

#[test]
fn invalid_persisted_schedule_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTascaRepository::try_new(&conn).unwrap();
    let record = tasca("Tasca do Canto", "Rua do Canto 3", "Lisboa");
    repo.create_tasca(&record).unwrap();

    conn.execute(
        "UPDATE tascas SET schedule_json = '{\"mon\": [[\"25:00\", \"26:00\"]]}' WHERE id = ?1;",
        [record.id.to_string()],
    )
    .unwrap();

    let err = repo.list_tascas(None).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("schedule")));
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteTascaRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}

#[test]
fn try_new_rejects_missing_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE tascas (id TEXT PRIMARY KEY NOT NULL, name TEXT NOT NULL);
         PRAGMA user_version = {};",
        latest_version()
    ))
    .unwrap();

    assert!(matches!(
        SqliteTascaRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "tascas",
            column: "address"
        })
    ));
}
