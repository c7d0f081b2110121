//! PostgreSQL store tests. Run with `DATABASE_URL` set and `--ignored`.

use sqlx::PgPool;
use std::sync::Arc;
use linkcore::domain::entities::NewUrlRecord;
use linkcore::domain::repositories::{
    CodeUpdate, ListQuery, OwnerFilter, SortDir, SortKey, UrlRepository,
};
use linkcore::infrastructure::persistence::PgUrlRepository;

fn new_record(code: &str, url: &str, owner: Option<&str>) -> NewUrlRecord {
    NewUrlRecord {
        original_url: url.to_string(),
        short_code: code.to_string(),
        owner_id: owner.map(str::to_string),
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_and_find(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));

    let record = repo
        .insert_if_absent(new_record("abc123", "https://example.com", Some("u1")))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.short_code, "abc123");
    assert_eq!(record.clicks, 0);
    assert!(!record.flagged);

    let found = repo.find_by_code("abc123").await.unwrap().unwrap();
    assert_eq!(found, record);
    assert!(repo.find_by_code("ABC123").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_longest_custom_code_fits_column(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));
    let longest = "abcdefghij0123456789";

    let record = repo
        .insert_if_absent(new_record(longest, "https://example.com", None))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.short_code, longest);

    let moved = repo
        .update_code(record.id, "ABCDEFGHIJ0123456789")
        .await
        .unwrap();
    assert!(matches!(moved, CodeUpdate::Updated(r) if r.short_code == "ABCDEFGHIJ0123456789"));
    assert_eq!(
        repo.find_by_code("ABCDEFGHIJ0123456789").await.unwrap().unwrap().id,
        record.id
    );
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_taken_code_writes_nothing(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));

    repo.insert_if_absent(new_record("taken1", "https://a.com", None))
        .await
        .unwrap()
        .unwrap();

    let second = repo
        .insert_if_absent(new_record("taken1", "https://b.com", None))
        .await
        .unwrap();
    assert!(second.is_none());

    let summary = repo.summary().await.unwrap();
    assert_eq!(summary.total_urls, 1);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_increment_clicks(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));
    let record = repo
        .insert_if_absent(new_record("click1", "https://a.com", None))
        .await
        .unwrap()
        .unwrap();

    assert!(repo.increment_clicks(record.id).await.unwrap());
    assert!(repo.increment_clicks(record.id).await.unwrap());
    assert!(!repo.increment_clicks(record.id + 1000).await.unwrap());

    let stored = repo.find_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(stored.clicks, 2);
    assert_eq!(stored.updated_at, record.updated_at);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_code(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));
    let first = repo
        .insert_if_absent(new_record("first1", "https://a.com", None))
        .await
        .unwrap()
        .unwrap();
    repo.insert_if_absent(new_record("second", "https://b.com", None))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        repo.update_code(first.id, "second").await.unwrap(),
        CodeUpdate::Taken
    );
    assert_eq!(repo.update_code(9999, "free01").await.unwrap(), CodeUpdate::NotFound);

    match repo.update_code(first.id, "moved1").await.unwrap() {
        CodeUpdate::Updated(updated) => {
            assert_eq!(updated.short_code, "moved1");
            assert!(updated.updated_at >= first.updated_at);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(repo.find_by_code("first1").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_flag_and_unflag(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));
    let record = repo
        .insert_if_absent(new_record("flag01", "https://a.com", None))
        .await
        .unwrap()
        .unwrap();

    let flagged = repo
        .set_flag(record.id, true, Some("phishing".to_string()))
        .await
        .unwrap()
        .unwrap();
    assert!(flagged.flagged);
    assert_eq!(flagged.flag_reason.as_deref(), Some("phishing"));

    let cleared = repo
        .set_flag(record.id, false, Some("ignored".to_string()))
        .await
        .unwrap()
        .unwrap();
    assert!(!cleared.flagged);
    assert_eq!(cleared.flag_reason, None);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_with_search_and_escaping(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));
    for (code, url, owner) in [
        ("gh0001", "https://github.com/rust-lang", Some("u1")),
        ("pct001", "https://example.com/100%_off", Some("u1")),
        ("ex0001", "https://example.com", Some("u1")),
        ("other1", "https://github.com/other", Some("u2")),
    ] {
        repo.insert_if_absent(new_record(code, url, owner))
            .await
            .unwrap()
            .unwrap();
    }

    let (items, total) = repo
        .list_by_owner(
            OwnerFilter::User("u1".to_string()),
            ListQuery {
                search: Some("GITHUB".to_string()),
                ..ListQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].short_code, "gh0001");

    let (items, total) = repo
        .list_by_owner(
            OwnerFilter::Any,
            ListQuery {
                search: Some("%_".to_string()),
                ..ListQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(items[0].short_code, "pct001");

    let (items, total) = repo
        .list_by_owner(
            OwnerFilter::Any,
            ListQuery {
                page: 2,
                page_size: 3,
                sort_by: SortKey::ShortCode,
                sort_dir: SortDir::Asc,
                ..ListQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(total, 4);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].short_code, "pct001");
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL"]
async fn test_clear_owner_and_delete(pool: PgPool) {
    let repo = PgUrlRepository::new(Arc::new(pool));
    let record = repo
        .insert_if_absent(new_record("gone01", "https://a.com", Some("gone")))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(repo.clear_owner("gone").await.unwrap(), 1);
    assert_eq!(repo.clear_owner("gone").await.unwrap(), 0);

    let summary = repo.summary().await.unwrap();
    assert_eq!(summary.anonymous_urls, 1);

    assert!(repo.delete(record.id).await.unwrap());
    assert!(!repo.delete(record.id).await.unwrap());
    assert!(
        repo.insert_if_absent(new_record("gone01", "https://b.com", None))
            .await
            .unwrap()
            .is_some()
    );
    assert!(repo.ping().await.is_ok());
}
