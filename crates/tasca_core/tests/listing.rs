use chrono::NaiveDateTime;
use rusqlite::Connection;
use tasca_core::db::open_db_in_memory;
use tasca_core::{
    seed_if_empty, GeoPoint, ListingFilters, ListingOptions, ListingService, RankedTasca,
    SeedDataset,
};
use uuid::Uuid;

const LISBOA_CENTRO: GeoPoint = GeoPoint {
    lat: 38.7223,
    lng: -9.1393,
};

fn seeded() -> Connection {
    let conn = open_db_in_memory().unwrap();
    seed_if_empty(&conn, &SeedDataset::bundled().unwrap()).unwrap();
    conn
}

fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").unwrap()
}

fn names(items: &[RankedTasca]) -> Vec<&str> {
    items.iter().map(|item| item.tasca.name.as_str()).collect()
}

#[test]
fn default_listing_is_sorted_by_score_descending() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();

    let items = service.list(&ListingOptions::default()).unwrap();
    assert_eq!(items.len(), 11);
    assert!(items
        .windows(2)
        .all(|pair| pair[0].score.score >= pair[1].score.score));
    assert!(items.iter().all(|item| item.distance_km.is_none()));
    assert!(items.iter().all(|item| item.score.reviews_count == 2));
}

#[test]
fn listing_with_location_is_sorted_by_distance() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();

    let items = service
        .list(&ListingOptions {
            location: Some(LISBOA_CENTRO),
            ..ListingOptions::default()
        })
        .unwrap();

    assert_eq!(items.len(), 11);
    assert_eq!(items[0].tasca.name, "A Tasquinha do Fado");
    assert_eq!(items[1].tasca.name, "Casa das Iscas");
    assert!(items[0].distance_km.unwrap() < 2.0);
    assert!(items.windows(2).all(|pair| {
        pair[0].distance_km.unwrap() <= pair[1].distance_km.unwrap()
    }));
}

#[test]
fn query_narrows_by_city() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();

    let items = service
        .list(&ListingOptions {
            query: Some("porto".to_string()),
            ..ListingOptions::default()
        })
        .unwrap();

    let mut found = names(&items);
    found.sort_unstable();
    assert_eq!(
        found,
        vec![
            "Adega São Nicolau",
            "Taberna Santo António",
            "Tasquinha do Olival"
        ]
    );
}

#[test]
fn query_also_matches_addresses() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();

    let items = service
        .list(&ListingOptions {
            query: Some("LARGO".to_string()),
            ..ListingOptions::default()
        })
        .unwrap();

    let mut found = names(&items);
    found.sort_unstable();
    assert_eq!(found, vec!["Cantinho Minhoto", "Taberna do Largo"]);
}

#[test]
fn barato_keeps_only_cheapest_tier() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();

    let items = service
        .list(&ListingOptions {
            filters: ListingFilters {
                barato: true,
                ..ListingFilters::default()
            },
            ..ListingOptions::default()
        })
        .unwrap();

    let mut found = names(&items);
    found.sort_unstable();
    assert_eq!(
        found,
        vec![
            "Adega do Rocha",
            "Casa das Iscas",
            "Taberna Santo António",
            "Tasquinha do Rossio"
        ]
    );
}

#[test]
fn tag_filters_match_tag_substrings() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();

    let petiscos = service
        .list(&ListingOptions {
            filters: ListingFilters {
                petiscos: true,
                ..ListingFilters::default()
            },
            ..ListingOptions::default()
        })
        .unwrap();
    let mut found = names(&petiscos);
    found.sort_unstable();
    assert_eq!(found, vec!["Casa das Iscas", "Tasquinha do Olival"]);

    let caseira = service
        .list(&ListingOptions {
            filters: ListingFilters {
                comida_caseira: true,
                ..ListingFilters::default()
            },
            ..ListingOptions::default()
        })
        .unwrap();
    assert!(caseira.is_empty());
}

#[test]
fn filters_combine_with_and() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();

    let items = service
        .list(&ListingOptions {
            filters: ListingFilters {
                menu: true,
                petiscos: true,
                ..ListingFilters::default()
            },
            ..ListingOptions::default()
        })
        .unwrap();

    assert_eq!(names(&items), vec!["Casa das Iscas"]);
}

#[test]
fn aberto_agora_uses_reference_time() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();
    let open_now = |when: &str| {
        service
            .list(&ListingOptions {
                filters: ListingFilters {
                    aberto_agora: true,
                    ..ListingFilters::default()
                },
                reference_time: Some(at(when)),
                ..ListingOptions::default()
            })
            .unwrap()
    };

    // 2024-01-01 is a Monday, 2024-01-07 a Sunday.
    assert_eq!(open_now("2024-01-01 13:00").len(), 11);
    assert!(open_now("2024-01-01 16:30").is_empty());

    let mut sunday = names(&open_now("2024-01-07 14:00"))
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    sunday.sort_unstable();
    assert_eq!(
        sunday,
        vec![
            "A Tasquinha do Fado",
            "Botequim da Mouraria",
            "Cantinho Minhoto",
            "Tasquinha do Olival",
            "Tasquinha do Rossio"
        ]
    );
}

#[test]
fn get_by_id_returns_detail_with_reviews() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();
    let listed = service.list(&ListingOptions::default()).unwrap();
    let fado = listed
        .iter()
        .find(|item| item.tasca.name == "A Tasquinha do Fado")
        .unwrap();

    let detail = service
        .get_by_id(fado.tasca.id, Some(LISBOA_CENTRO))
        .unwrap()
        .unwrap();
    assert_eq!(detail.ranked.score.score, 4.3);
    assert_eq!(detail.ranked.score.comida, 4.3);
    assert_eq!(detail.ranked.score.ambiente, 4.8);
    assert_eq!(detail.ranked.score.preco_justo, 3.8);
    assert_eq!(detail.reviews.len(), 2);
    assert!(detail.ranked.distance_km.is_some());
}

#[test]
fn get_by_id_unknown_returns_none() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();

    assert!(service.get_by_id(Uuid::new_v4(), None).unwrap().is_none());
}

#[test]
fn empty_store_lists_nothing() {
    let conn = open_db_in_memory().unwrap();
    let service = ListingService::try_from_connection(&conn).unwrap();

    assert!(service.list(&ListingOptions::default()).unwrap().is_empty());
}

#[test]
fn ranked_tasca_serializes_flat() {
    let conn = seeded();
    let service = ListingService::try_from_connection(&conn).unwrap();
    let items = service
        .list(&ListingOptions {
            location: Some(LISBOA_CENTRO),
            ..ListingOptions::default()
        })
        .unwrap();

    let value = serde_json::to_value(&items[0]).unwrap();
    assert_eq!(value["name"], "A Tasquinha do Fado");
    assert_eq!(value["score"], 4.3);
    assert_eq!(value["reviews_count"], 2);
    assert!(value["distance_km"].is_number());
}
