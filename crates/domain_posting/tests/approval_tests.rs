//! Approval orchestration tests against the in-memory store

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, ProductId, TaxCodeId};
use domain_documents::DocumentStatus;
use domain_ledger::EntryNature;
use domain_posting::{
    ApprovalOrchestrator, DocumentIssuer, LoyaltyProgram, PostingError, PostingStore, RetryPolicy,
    TaxCode,
};
use test_utils::{
    assert_balanced, assert_single_group, ContextFixtures, DocumentRequestBuilder, LineBuilder,
    MasterDataFixtures, MemoryPostingStore, TemporalFixtures,
};

fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(1),
    }
}

struct Harness {
    store: Arc<MemoryPostingStore>,
    issuer: DocumentIssuer,
    orchestrator: ApprovalOrchestrator,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryPostingStore::new());
        let as_port: Arc<dyn PostingStore> = store.clone();
        Self {
            issuer: DocumentIssuer::new(as_port.clone(), quick_retry()),
            orchestrator: ApprovalOrchestrator::new(as_port),
            store,
        }
    }
}

fn no_tax_codes() -> HashMap<TaxCodeId, TaxCode> {
    HashMap::new()
}

#[tokio::test]
async fn approval_posts_receivable_revenue_and_tax() {
    let harness = Harness::new();
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();
    let accounts = MasterDataFixtures::accounts();

    let product = ProductId::new();
    let request = DocumentRequestBuilder::new()
        .with_lines(vec![LineBuilder::new().with_product(product).build()])
        .build();
    let store_id = request.store_id;
    harness
        .store
        .seed_stock(ctx.tenant_id, store_id, product, dec!(50))
        .await;

    let document = harness
        .issuer
        .create(ctx, &actor, &period, request)
        .await
        .unwrap();
    assert_eq!(document.total.amount(), dec!(1100));

    let (approved, outcome) = harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &no_tax_codes(),
            &period,
            None,
        )
        .await
        .unwrap();

    assert_eq!(approved.status, DocumentStatus::Approved);
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.ledger_entries, 3);

    let entries = harness.store.ledger_entries().await;
    assert_eq!(entries.len(), 3);
    assert_balanced(&entries);
    assert_single_group(&entries);

    let find = |account, nature| {
        entries
            .iter()
            .find(|e| e.account_id == account && e.nature == nature)
            .map(|e| e.amount.amount())
    };
    assert_eq!(
        find(accounts.accounts_receivable, EntryNature::Debit),
        Some(dec!(1100))
    );
    assert_eq!(find(accounts.revenue, EntryNature::Credit), Some(dec!(1000)));
    assert_eq!(
        find(accounts.tax_payable, EntryNature::Credit),
        Some(dec!(100))
    );
}

#[tokio::test]
async fn approval_decrements_stock_and_records_movements() {
    let harness = Harness::new();
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();
    let accounts = MasterDataFixtures::accounts();

    let product = ProductId::new();
    let request = DocumentRequestBuilder::new()
        .with_lines(vec![LineBuilder::new()
            .with_product(product)
            .with_quantity(dec!(10))
            .build()])
        .build();
    let store_id = request.store_id;
    harness
        .store
        .seed_stock(ctx.tenant_id, store_id, product, dec!(25))
        .await;

    let document = harness
        .issuer
        .create(ctx, &actor, &period, request)
        .await
        .unwrap();
    harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &no_tax_codes(),
            &period,
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        harness.store.stock_level(ctx.tenant_id, store_id, product).await,
        dec!(15)
    );
    let movements = harness.store.movements().await;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity, dec!(-10));
    assert_eq!(movements[0].document_id, document.id);
}

#[tokio::test]
async fn insufficient_stock_rejects_and_posts_nothing() {
    let harness = Harness::new();
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();
    let accounts = MasterDataFixtures::accounts();

    let product = ProductId::new();
    let request = DocumentRequestBuilder::new()
        .with_lines(vec![LineBuilder::new()
            .with_product(product)
            .with_quantity(dec!(10))
            .build()])
        .build();
    let store_id = request.store_id;
    harness
        .store
        .seed_stock(ctx.tenant_id, store_id, product, dec!(3))
        .await;

    let document = harness
        .issuer
        .create(ctx, &actor, &period, request)
        .await
        .unwrap();
    let result = harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &no_tax_codes(),
            &period,
            None,
        )
        .await;

    assert!(matches!(result, Err(PostingError::Validation(_))));
    assert!(harness.store.ledger_entries().await.is_empty());
    assert!(harness.store.movements().await.is_empty());
    assert_eq!(
        harness.store.stock_level(ctx.tenant_id, store_id, product).await,
        dec!(3)
    );
    let stored = harness.store.document(document.id).await.unwrap();
    assert_eq!(stored.status, DocumentStatus::Draft);
}

#[tokio::test]
async fn approving_twice_is_rejected() {
    let harness = Harness::new();
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();
    let accounts = MasterDataFixtures::accounts();

    let product = ProductId::new();
    let request = DocumentRequestBuilder::new()
        .with_lines(vec![LineBuilder::new().with_product(product).build()])
        .build();
    let store_id = request.store_id;
    harness
        .store
        .seed_stock(ctx.tenant_id, store_id, product, dec!(100))
        .await;

    let document = harness
        .issuer
        .create(ctx, &actor, &period, request)
        .await
        .unwrap();
    harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &no_tax_codes(),
            &period,
            None,
        )
        .await
        .unwrap();

    let second = harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &no_tax_codes(),
            &period,
            None,
        )
        .await;

    assert!(matches!(second, Err(PostingError::Validation(_))));
    // still only the first group
    assert_eq!(harness.store.ledger_entries().await.len(), 3);
}

#[tokio::test]
async fn withholding_lines_add_a_balanced_pair_per_code() {
    let harness = Harness::new();
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();
    let accounts = MasterDataFixtures::accounts();
    let code = MasterDataFixtures::withholding_code("PPh 23");

    let product = ProductId::new();
    let request = DocumentRequestBuilder::new()
        .with_lines(vec![LineBuilder::new()
            .with_product(product)
            .with_withholding(Money::new(dec!(20), Currency::USD), code.id)
            .build()])
        .build();
    let store_id = request.store_id;
    harness
        .store
        .seed_stock(ctx.tenant_id, store_id, product, dec!(100))
        .await;

    let document = harness
        .issuer
        .create(ctx, &actor, &period, request)
        .await
        .unwrap();
    let tax_codes = HashMap::from([(code.id, code.clone())]);

    let (approved, outcome) = harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &tax_codes,
            &period,
            None,
        )
        .await
        .unwrap();

    // receivable debit, revenue credit, tax credit, withholding pair
    assert_eq!(outcome.ledger_entries, 5);
    assert_eq!(approved.withholding_total.amount(), dec!(20));
    // withholding never reduces the receivable debit
    assert_eq!(approved.total.amount(), dec!(1100));

    let entries = harness.store.ledger_entries().await;
    assert_balanced(&entries);
    assert!(entries.iter().any(|e| {
        e.account_id == code.withholding_account
            && e.nature == EntryNature::Credit
            && e.amount.amount() == dec!(20)
    }));
    assert!(entries.iter().any(|e| {
        e.account_id == accounts.withholding_clearing
            && e.nature == EntryNature::Debit
            && e.amount.amount() == dec!(20)
    }));
}

#[tokio::test]
async fn unresolved_withholding_code_is_a_configuration_error() {
    let harness = Harness::new();
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();
    let accounts = MasterDataFixtures::accounts();
    let code = MasterDataFixtures::withholding_code("PPh 23");

    let product = ProductId::new();
    let request = DocumentRequestBuilder::new()
        .with_lines(vec![LineBuilder::new()
            .with_product(product)
            .with_withholding(Money::new(dec!(20), Currency::USD), code.id)
            .build()])
        .build();
    let store_id = request.store_id;
    harness
        .store
        .seed_stock(ctx.tenant_id, store_id, product, dec!(100))
        .await;

    let document = harness
        .issuer
        .create(ctx, &actor, &period, request)
        .await
        .unwrap();

    // the code is never handed to the orchestrator
    let result = harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &no_tax_codes(),
            &period,
            None,
        )
        .await;

    assert!(matches!(result, Err(PostingError::Configuration(_))));
    assert!(harness.store.ledger_entries().await.is_empty());
}

#[tokio::test]
async fn loyalty_accrual_failure_is_a_warning_not_a_rollback() {
    let harness = Harness::new();
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();
    let accounts = MasterDataFixtures::accounts();

    let product = ProductId::new();
    let request = DocumentRequestBuilder::new()
        .with_lines(vec![LineBuilder::new().with_product(product).build()])
        .build();
    let store_id = request.store_id;
    harness
        .store
        .seed_stock(ctx.tenant_id, store_id, product, dec!(100))
        .await;

    let document = harness
        .issuer
        .create(ctx, &actor, &period, request)
        .await
        .unwrap();

    harness.store.fail_loyalty_accrual(true);
    let (approved, outcome) = harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &no_tax_codes(),
            &period,
            Some(LoyaltyProgram {
                points_per_unit: dec!(0.01),
            }),
        )
        .await
        .unwrap();

    assert_eq!(approved.status, DocumentStatus::Approved);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].contains("loyalty"));
    assert_eq!(outcome.ledger_entries, 3);
}

#[tokio::test]
async fn closed_period_blocks_approval() {
    let harness = Harness::new();
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let open = TemporalFixtures::open_period();
    let closed = TemporalFixtures::closed_period();
    let accounts = MasterDataFixtures::accounts();

    let product = ProductId::new();
    let request = DocumentRequestBuilder::new()
        .with_lines(vec![LineBuilder::new().with_product(product).build()])
        .build();
    let store_id = request.store_id;
    harness
        .store
        .seed_stock(ctx.tenant_id, store_id, product, dec!(100))
        .await;

    let document = harness
        .issuer
        .create(ctx, &actor, &open, request)
        .await
        .unwrap();
    let result = harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &no_tax_codes(),
            &closed,
            None,
        )
        .await;

    assert!(matches!(result, Err(PostingError::Validation(_))));
}

#[tokio::test]
async fn approval_updates_customer_debt() {
    let harness = Harness::new();
    let ctx = ContextFixtures::tenant();
    let actor = ContextFixtures::actor();
    let period = TemporalFixtures::open_period();
    let accounts = MasterDataFixtures::accounts();

    let product = ProductId::new();
    let request = DocumentRequestBuilder::new()
        .with_lines(vec![LineBuilder::new().with_product(product).build()])
        .build();
    let store_id = request.store_id;
    let customer = request.customer_id;
    harness
        .store
        .seed_stock(ctx.tenant_id, store_id, product, dec!(100))
        .await;

    let document = harness
        .issuer
        .create(ctx, &actor, &period, request)
        .await
        .unwrap();
    harness
        .orchestrator
        .approve(
            ctx,
            &actor,
            document.id,
            &accounts,
            &no_tax_codes(),
            &period,
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        harness.store.customer_debt(ctx.tenant_id, customer).await,
        dec!(1100)
    );
}
