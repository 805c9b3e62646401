//! Reference sequencing tests: uniqueness, ordering, retry behavior

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use core_kernel::{Currency, TenantContext, TenantId};
use domain_posting::{
    parse_suffix, DocumentIssuer, PostingError, PostingStore, RetryPolicy,
};
use test_utils::{ContextFixtures, DocumentRequestBuilder, MemoryPostingStore, TemporalFixtures};

fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(1),
    }
}

fn issuer(store: &Arc<MemoryPostingStore>) -> DocumentIssuer {
    let as_port: Arc<dyn PostingStore> = store.clone();
    DocumentIssuer::new(as_port, quick_retry())
}

#[tokio::test]
async fn references_are_strictly_increasing_per_tenant() {
    let store = Arc::new(MemoryPostingStore::new());
    let issuer = issuer(&store);
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();

    let mut previous = 0;
    for _ in 0..5 {
        let document = issuer
            .create(ctx, &actor, &period, DocumentRequestBuilder::new().build())
            .await
            .unwrap();
        let suffix = parse_suffix(&document.reference).unwrap();
        assert!(suffix > previous);
        previous = suffix;
    }
    assert_eq!(previous, 5);
}

#[tokio::test]
async fn concurrent_creations_get_distinct_sequential_references() {
    let store = Arc::new(MemoryPostingStore::new());
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let issuer = issuer(&store);
        let actor = actor.clone();
        let period = period.clone();
        handles.push(tokio::spawn(async move {
            issuer
                .create(ctx, &actor, &period, DocumentRequestBuilder::new().build())
                .await
        }));
    }

    let mut suffixes = HashSet::new();
    for handle in handles {
        let document = handle.await.unwrap().unwrap();
        suffixes.insert(parse_suffix(&document.reference).unwrap());
    }

    // no duplicates, no gaps
    assert_eq!(suffixes, (1..=8).collect::<HashSet<u64>>());
}

#[tokio::test]
async fn two_tenants_may_share_a_reference() {
    let store = Arc::new(MemoryPostingStore::new());
    let issuer = issuer(&store);
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();
    let ctx_a = TenantContext::new(TenantId::new(), Currency::USD);
    let ctx_b = TenantContext::new(TenantId::new(), Currency::USD);

    let doc_a = issuer
        .create(ctx_a, &actor, &period, DocumentRequestBuilder::new().build())
        .await
        .unwrap();
    let doc_b = issuer
        .create(ctx_b, &actor, &period, DocumentRequestBuilder::new().build())
        .await
        .unwrap();

    assert_eq!(doc_a.reference, doc_b.reference);
    assert_ne!(doc_a.tenant_id, doc_b.tenant_id);
}

#[tokio::test]
async fn collisions_are_retried_until_success() {
    let store = Arc::new(MemoryPostingStore::new());
    let issuer = issuer(&store);
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();

    store.fail_next_inserts(3);
    let document = issuer
        .create(ctx, &actor, &period, DocumentRequestBuilder::new().build())
        .await
        .unwrap();

    assert_eq!(parse_suffix(&document.reference), Some(1));
    assert_eq!(store.documents_for(ctx.tenant_id).await.len(), 1);
}

#[tokio::test]
async fn exhausted_retries_surface_the_conflict() {
    let store = Arc::new(MemoryPostingStore::new());
    let issuer = issuer(&store);
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();

    store.fail_next_inserts(5);
    let result = issuer
        .create(ctx, &actor, &period, DocumentRequestBuilder::new().build())
        .await;

    assert!(matches!(result, Err(PostingError::Conflict(_))));
    assert!(store.documents_for(ctx.tenant_id).await.is_empty());
}

#[tokio::test]
async fn creation_outside_the_open_period_is_rejected() {
    let store = Arc::new(MemoryPostingStore::new());
    let issuer = issuer(&store);
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::closed_period();

    let result = issuer
        .create(ctx, &actor, &period, DocumentRequestBuilder::new().build())
        .await;

    assert!(matches!(result, Err(PostingError::Validation(_))));
}
