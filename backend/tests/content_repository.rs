use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use folio_backend::{
    repositories::{blog as blog_repo, content as content_repo},
    models::blog::UpsertPostRequest,
    services::cache::{memory::MemoryStore, Cache},
};

mod support;

fn cache_with_store() -> (Cache, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (Cache::new(store.clone(), 60), store)
}

fn unique_locale() -> String {
    // Per-test locale keeps list assertions independent of other tests
    // sharing the database.
    format!("xx-{}", &Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn known_slug_falls_back_to_default_and_persists_it() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (cache, _store) = cache_with_store();
    let locale = unique_locale();

    let block = content_repo::read_content(&pool, &cache, "home-intro", &locale)
        .await
        .expect("read")
        .expect("default document");
    assert_eq!(block.document["title"], "Hello");

    // The default was lazily persisted on first read.
    let row = content_repo::find_content_block(&pool, "home-intro", &locale)
        .await
        .expect("query")
        .expect("row exists");
    assert_eq!(row.document, block.document);
}

#[tokio::test]
async fn unknown_slug_without_row_is_none() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (cache, _store) = cache_with_store();

    let block = content_repo::read_content(&pool, &cache, "no-such-slug", &unique_locale())
        .await
        .expect("read");
    assert!(block.is_none());
}

#[tokio::test]
async fn write_invalidates_entry_and_list_caches() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (cache, store) = cache_with_store();
    let locale = unique_locale();

    // Prime both the entry and the list cache.
    content_repo::read_content(&pool, &cache, "about", &locale)
        .await
        .expect("read")
        .expect("default");
    let listed = content_repo::list_content(&pool, &cache, &locale)
        .await
        .expect("list");
    assert_eq!(listed.len(), 1);
    assert!(store.contains(&format!("content:{}:all", locale)));

    // Write through; the next read and list must observe the new payload.
    let updated = json!({"title": "About v2", "paragraphs": ["hi"], "highlights": []});
    content_repo::write_content(&pool, &cache, "about", &locale, &updated)
        .await
        .expect("write");

    let block = content_repo::read_content(&pool, &cache, "about", &locale)
        .await
        .expect("read")
        .expect("block");
    assert_eq!(block.document["title"], "About v2");

    let listed = content_repo::list_content(&pool, &cache, &locale)
        .await
        .expect("list again");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].document["title"], "About v2");
}

#[tokio::test]
async fn content_roundtrip_works_without_cache_backend() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let cache = Cache::disabled();
    let locale = unique_locale();

    let doc = json!({"title": "T", "subtitle": "S", "paragraphs": []});
    content_repo::write_content(&pool, &cache, "home-intro", &locale, &doc)
        .await
        .expect("write");
    let block = content_repo::read_content(&pool, &cache, "home-intro", &locale)
        .await
        .expect("read")
        .expect("block");
    assert_eq!(block.document["title"], "T");
}

fn post_payload(slug: &str, title: &str, published: bool) -> UpsertPostRequest {
    UpsertPostRequest {
        slug: slug.into(),
        title: title.into(),
        summary: None,
        body: "body".into(),
        published: Some(published),
    }
}

#[tokio::test]
async fn blog_upsert_drops_aggregate_list_cache() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (cache, store) = cache_with_store();
    let slug = format!("post-{}", Uuid::new_v4());

    blog_repo::write_post(&pool, &cache, post_payload(&slug, "v1", true), "Alice".into())
        .await
        .expect("create");

    // Prime the list cache, then upsert the same slug.
    let before = blog_repo::list_posts(&pool, &cache).await.expect("list");
    assert!(before.iter().any(|p| p.slug == slug && p.title == "v1"));
    assert!(store.contains("blog:all"));

    blog_repo::write_post(&pool, &cache, post_payload(&slug, "v2", true), "Alice".into())
        .await
        .expect("update");

    let after = blog_repo::list_posts(&pool, &cache).await.expect("list again");
    assert!(after.iter().any(|p| p.slug == slug && p.title == "v2"));
    assert!(!after.iter().any(|p| p.slug == slug && p.title == "v1"));

    let single = blog_repo::read_post(&pool, &cache, &slug)
        .await
        .expect("read")
        .expect("post");
    assert_eq!(single.title, "v2");
}

#[tokio::test]
async fn blog_update_preserves_identity_and_publication_time() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (cache, _store) = cache_with_store();
    let slug = format!("post-{}", Uuid::new_v4());

    let created =
        blog_repo::write_post(&pool, &cache, post_payload(&slug, "v1", true), "Alice".into())
            .await
            .expect("create");
    let updated =
        blog_repo::write_post(&pool, &cache, post_payload(&slug, "v2", true), "Alice".into())
            .await
            .expect("update");

    assert_eq!(created.id, updated.id);
    assert_eq!(created.published_at, updated.published_at);

    // Unpublishing drops the timestamp.
    let draft =
        blog_repo::write_post(&pool, &cache, post_payload(&slug, "v3", false), "Alice".into())
            .await
            .expect("unpublish");
    assert!(!draft.published);
    assert!(draft.published_at.is_none());
}

#[tokio::test]
async fn blog_delete_invalidates_caches() {
    let pool = support::test_pool().await;
    support::migrate_db(&pool).await;
    let (cache, store) = cache_with_store();
    let slug = format!("post-{}", Uuid::new_v4());

    blog_repo::write_post(&pool, &cache, post_payload(&slug, "v1", true), "Alice".into())
        .await
        .expect("create");
    blog_repo::read_post(&pool, &cache, &slug)
        .await
        .expect("read")
        .expect("post");
    assert!(store.contains(&format!("blog:{}", slug)));

    assert!(blog_repo::remove_post(&pool, &cache, &slug).await.expect("delete"));
    assert!(!store.contains(&format!("blog:{}", slug)));
    assert!(blog_repo::read_post(&pool, &cache, &slug)
        .await
        .expect("read")
        .is_none());

    // Deleting again reports nothing removed.
    assert!(!blog_repo::remove_post(&pool, &cache, &slug).await.expect("delete again"));
}
