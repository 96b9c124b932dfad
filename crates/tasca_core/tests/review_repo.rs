use tasca_core::db::open_db_in_memory;
use tasca_core::{
    GeoPoint, PriceLevel, RepoError, Review, ReviewRepository, ReviewValidationError,
    SqliteReviewRepository, SqliteTascaRepository, Tasca, TascaRepository,
};
use uuid::Uuid;

fn stored_tasca(conn: &rusqlite::Connection) -> Tasca {
    let repo = SqliteTascaRepository::try_new(conn).unwrap();
    let tasca = Tasca::new(
        "Tasca da Esquina",
        "Rua Domingos Sequeira 41",
        "Lisboa",
        GeoPoint::new(38.716, -9.163),
        PriceLevel::Pricey,
    );
    repo.create_tasca(&tasca).unwrap();
    tasca
}

#[test]
fn reviews_are_listed_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let tasca = stored_tasca(&conn);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();

    let mut older = Review::new(tasca.id, "Ana", 4.0, 4.0, 4.0, "boa");
    older.created_at = Some(1_000);
    let mut newer = Review::new(tasca.id, "Rui", 3.0, 5.0, 2.5, "cara");
    newer.created_at = Some(2_000);
    repo.create_review(&older).unwrap();
    repo.create_review(&newer).unwrap();

    let reviews = repo.list_reviews_for_tasca(tasca.id).unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].id, newer.id);
    assert_eq!(reviews[0].preco_justo, 2.5);
    assert_eq!(reviews[1].user_nick, "Ana");
}

#[test]
fn same_timestamp_falls_back_to_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let tasca = stored_tasca(&conn);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();

    let mut first = Review::new(tasca.id, "Ana", 4.0, 4.0, 4.0, "");
    first.created_at = Some(5_000);
    let mut second = Review::new(tasca.id, "Rui", 4.0, 4.0, 4.0, "");
    second.created_at = Some(5_000);
    repo.create_review(&first).unwrap();
    repo.create_review(&second).unwrap();

    let reviews = repo.list_reviews_for_tasca(tasca.id).unwrap();
    assert_eq!(reviews[0].id, second.id);
    assert_eq!(reviews[1].id, first.id);
}

#[test]
fn review_for_missing_tasca_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();
    let missing = Uuid::new_v4();

    let err = repo
        .create_review(&Review::new(missing, "Ana", 4.0, 4.0, 4.0, ""))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
}

#[test]
fn invalid_review_is_rejected_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let tasca = stored_tasca(&conn);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();

    let err = repo
        .create_review(&Review::new(tasca.id, "Ana", 5.5, 4.0, 4.0, ""))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::InvalidReview(ReviewValidationError::ScoreOutOfRange { .. })
    ));
    assert!(repo.list_reviews_for_tasca(tasca.id).unwrap().is_empty());
}

#[test]
fn reviews_of_other_tascas_are_not_listed() {
    let conn = open_db_in_memory().unwrap();
    let first = stored_tasca(&conn);
    let second = stored_tasca(&conn);
    let repo = SqliteReviewRepository::try_new(&conn).unwrap();

    repo.create_review(&Review::new(first.id, "Ana", 4.0, 4.0, 4.0, ""))
        .unwrap();

    assert_eq!(repo.list_reviews_for_tasca(first.id).unwrap().len(), 1);
    assert!(repo.list_reviews_for_tasca(second.id).unwrap().is_empty());
}
