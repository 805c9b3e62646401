//! PostgreSQL posting store
//!
//! One [`PgPostingTx`] wraps one database transaction. Uniqueness
//! violations on `(tenant_id, reference)` surface as conflicts for the
//! sequence retry loop; everything else unexpected is an internal error.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use core_kernel::{
    Actor, Currency, CustomerId, DocumentId, DocumentLineId, ExchangeRate, Money, PeriodId,
    ProductId, StoreId, TaxCodeId, TenantId, UserId,
};
use domain_documents::{Document, DocumentLine, DocumentStatus, PaymentStatus};
use domain_ledger::{EntryNature, LedgerEntry};
use domain_posting::{
    PostingError, PostingStore, PostingTx, Receipt, SequenceKind, StockMovement,
};

use crate::error::DatabaseError;

/// PostgreSQL-backed [`PostingStore`]
#[derive(Debug, Clone)]
pub struct PgPostingStore {
    pool: PgPool,
}

impl PgPostingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostingStore for PgPostingStore {
    async fn begin(&self) -> Result<Box<dyn PostingTx>, PostingError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(Box::new(PgPostingTx { tx }))
    }
}

struct PgPostingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PostingTx for PgPostingTx {
    async fn find_document_for_update(
        &mut self,
        tenant_id: TenantId,
        document_id: DocumentId,
    ) -> Result<Option<Document>, PostingError> {
        let row = sqlx::query(
            "SELECT * FROM documents WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(document_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        let Some(row) = row else { return Ok(None) };
        let lines = self.load_lines(document_id).await?;
        Ok(Some(document_from_row(&row, lines)?))
    }

    async fn insert_document(&mut self, document: &Document) -> Result<(), PostingError> {
        sqlx::query(
            r#"
            INSERT INTO documents (
                id, tenant_id, reference, customer_id, store_id, currency,
                exchange_rate, period_id, document_date, due_date, status,
                payment_status, subtotal, discount_total, tax_total,
                withholding_total, total, paid, balance, equivalent_amount,
                equivalent_currency, status_reason, created_by,
                created_by_name, created_at, updated_at, sent_at,
                approved_by, approved_by_name, approved_at, rejected_by,
                rejected_by_name, rejected_at, cancelled_by,
                cancelled_by_name, cancelled_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
                $27, $28, $29, $30, $31, $32, $33, $34, $35, $36
            )
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(document.tenant_id.as_uuid())
        .bind(&document.reference)
        .bind(document.customer_id.as_uuid())
        .bind(document.store_id.as_uuid())
        .bind(document.currency.code())
        .bind(document.exchange_rate.value())
        .bind(document.period_id.as_uuid())
        .bind(document.document_date)
        .bind(document.due_date)
        .bind(status_to_str(document.status))
        .bind(payment_status_to_str(document.payment_status))
        .bind(document.subtotal.amount())
        .bind(document.discount_total.amount())
        .bind(document.tax_total.amount())
        .bind(document.withholding_total.amount())
        .bind(document.total.amount())
        .bind(document.paid.amount())
        .bind(document.balance.amount())
        .bind(document.equivalent_amount.amount())
        .bind(document.equivalent_amount.currency().code())
        .bind(&document.status_reason)
        .bind(document.created_by.id.as_uuid())
        .bind(&document.created_by.display_name)
        .bind(document.created_at)
        .bind(document.updated_at)
        .bind(document.sent_at)
        .bind(document.approved_by.as_ref().map(|a| *a.id.as_uuid()))
        .bind(document.approved_by.as_ref().map(|a| a.display_name.clone()))
        .bind(document.approved_at)
        .bind(document.rejected_by.as_ref().map(|a| *a.id.as_uuid()))
        .bind(document.rejected_by.as_ref().map(|a| a.display_name.clone()))
        .bind(document.rejected_at)
        .bind(document.cancelled_by.as_ref().map(|a| *a.id.as_uuid()))
        .bind(document.cancelled_by.as_ref().map(|a| a.display_name.clone()))
        .bind(document.cancelled_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        self.replace_lines(document).await?;
        Ok(())
    }

    async fn update_document(&mut self, document: &Document) -> Result<(), PostingError> {
        let result = sqlx::query(
            r#"
            UPDATE documents SET
                status = $3, payment_status = $4, subtotal = $5,
                discount_total = $6, tax_total = $7, withholding_total = $8,
                total = $9, paid = $10, balance = $11,
                equivalent_amount = $12, status_reason = $13,
                updated_at = $14, sent_at = $15, approved_by = $16,
                approved_by_name = $17, approved_at = $18, rejected_by = $19,
                rejected_by_name = $20, rejected_at = $21, cancelled_by = $22,
                cancelled_by_name = $23, cancelled_at = $24
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(document.id.as_uuid())
        .bind(document.tenant_id.as_uuid())
        .bind(status_to_str(document.status))
        .bind(payment_status_to_str(document.payment_status))
        .bind(document.subtotal.amount())
        .bind(document.discount_total.amount())
        .bind(document.tax_total.amount())
        .bind(document.withholding_total.amount())
        .bind(document.total.amount())
        .bind(document.paid.amount())
        .bind(document.balance.amount())
        .bind(document.equivalent_amount.amount())
        .bind(&document.status_reason)
        .bind(document.updated_at)
        .bind(document.sent_at)
        .bind(document.approved_by.as_ref().map(|a| *a.id.as_uuid()))
        .bind(document.approved_by.as_ref().map(|a| a.display_name.clone()))
        .bind(document.approved_at)
        .bind(document.rejected_by.as_ref().map(|a| *a.id.as_uuid()))
        .bind(document.rejected_by.as_ref().map(|a| a.display_name.clone()))
        .bind(document.rejected_at)
        .bind(document.cancelled_by.as_ref().map(|a| *a.id.as_uuid()))
        .bind(document.cancelled_by.as_ref().map(|a| a.display_name.clone()))
        .bind(document.cancelled_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(PostingError::internal("document vanished mid-transaction"));
        }
        self.replace_lines(document).await?;
        Ok(())
    }

    async fn max_reference_suffix(
        &mut self,
        tenant_id: TenantId,
        kind: SequenceKind,
    ) -> Result<Option<u64>, PostingError> {
        let table = match kind {
            SequenceKind::Invoice => "documents",
            SequenceKind::Receipt => "receipts",
        };
        // suffix is the third dash-separated segment of the reference
        let sql = format!(
            "SELECT MAX(CAST(SPLIT_PART(reference, '-', 3) AS BIGINT)) AS max_suffix \
             FROM {table} WHERE tenant_id = $1"
        );
        let row = sqlx::query(&sql)
            .bind(tenant_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        let max: Option<i64> = row.try_get("max_suffix").map_err(DatabaseError::from)?;
        Ok(max.map(|n| n as u64))
    }

    async fn stock_on_hand(
        &mut self,
        tenant_id: TenantId,
        store_id: StoreId,
        product_id: ProductId,
    ) -> Result<Decimal, PostingError> {
        let row = sqlx::query(
            "SELECT COALESCE(
                (SELECT quantity FROM stock_levels
                 WHERE tenant_id = $1 AND store_id = $2 AND product_id = $3),
                0) AS quantity",
        )
        .bind(tenant_id.as_uuid())
        .bind(store_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(row.try_get("quantity").map_err(DatabaseError::from)?)
    }

    async fn adjust_stock(
        &mut self,
        tenant_id: TenantId,
        store_id: StoreId,
        product_id: ProductId,
        delta: Decimal,
    ) -> Result<(), PostingError> {
        sqlx::query(
            r#"
            INSERT INTO stock_levels (tenant_id, store_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (tenant_id, store_id, product_id)
            DO UPDATE SET quantity = stock_levels.quantity + EXCLUDED.quantity
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(store_id.as_uuid())
        .bind(product_id.as_uuid())
        .bind(delta)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn record_stock_movement(
        &mut self,
        movement: &StockMovement,
    ) -> Result<(), PostingError> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, tenant_id, store_id, product_id, document_id, quantity,
                movement_date, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(movement.id.as_uuid())
        .bind(movement.tenant_id.as_uuid())
        .bind(movement.store_id.as_uuid())
        .bind(movement.product_id.as_uuid())
        .bind(movement.document_id.as_uuid())
        .bind(movement.quantity)
        .bind(movement.movement_date)
        .bind(movement.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn append_posting_group(
        &mut self,
        entries: &[LedgerEntry],
    ) -> Result<(), PostingError> {
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO ledger_entries (
                    id, tenant_id, posting_group_id, account_id, nature,
                    amount, currency, exchange_rate, equivalent,
                    equivalent_currency, entry_date, source_type, source_id,
                    memo, created_at
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15
                )
                "#,
            )
            .bind(entry.id.as_uuid())
            .bind(entry.tenant_id.as_uuid())
            .bind(entry.posting_group_id.as_uuid())
            .bind(entry.account_id.as_uuid())
            .bind(nature_to_str(entry.nature))
            .bind(entry.amount.amount())
            .bind(entry.amount.currency().code())
            .bind(entry.exchange_rate.value())
            .bind(entry.equivalent.amount())
            .bind(entry.equivalent.currency().code())
            .bind(entry.entry_date)
            .bind(&entry.source_type)
            .bind(entry.source_id)
            .bind(&entry.memo)
            .bind(entry.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        }
        Ok(())
    }

    async fn adjust_customer_debt(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> Result<(), PostingError> {
        self.adjust_customer_stat(tenant_id, customer_id, "debt", delta)
            .await
    }

    async fn deposit_balance(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Decimal, PostingError> {
        self.customer_stat(tenant_id, customer_id, "deposit").await
    }

    async fn adjust_deposit(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> Result<(), PostingError> {
        self.adjust_customer_stat(tenant_id, customer_id, "deposit", delta)
            .await
    }

    async fn loyalty_balance(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
    ) -> Result<Decimal, PostingError> {
        self.customer_stat(tenant_id, customer_id, "loyalty").await
    }

    async fn adjust_loyalty(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        delta: Decimal,
    ) -> Result<(), PostingError> {
        self.adjust_customer_stat(tenant_id, customer_id, "loyalty", delta)
            .await
    }

    async fn accrue_loyalty(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        points: Decimal,
    ) -> Result<(), PostingError> {
        sqlx::query(
            r#"
            INSERT INTO loyalty_accruals (id, tenant_id, customer_id, points, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(tenant_id.as_uuid())
        .bind(customer_id.as_uuid())
        .bind(points)
        .bind(Utc::now())
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn paid_against_line(
        &mut self,
        tenant_id: TenantId,
        line_id: DocumentLineId,
    ) -> Result<Decimal, PostingError> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(rl.amount), 0) AS paid
            FROM receipt_lines rl
            JOIN receipts r ON r.id = rl.receipt_id
            WHERE r.tenant_id = $1 AND rl.document_line_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(line_id.as_uuid())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;
        Ok(row.try_get("paid").map_err(DatabaseError::from)?)
    }

    async fn insert_receipt(&mut self, receipt: &Receipt) -> Result<(), PostingError> {
        sqlx::query(
            r#"
            INSERT INTO receipts (
                id, tenant_id, reference, document_id, customer_id,
                receipt_date, currency, exchange_rate, amount,
                payment_type_id, payment_type_amount, deposit_amount,
                loyalty_amount, withholding_amount, created_by,
                created_by_name, created_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17
            )
            "#,
        )
        .bind(receipt.id.as_uuid())
        .bind(receipt.tenant_id.as_uuid())
        .bind(&receipt.reference)
        .bind(receipt.document_id.as_uuid())
        .bind(receipt.customer_id.as_uuid())
        .bind(receipt.receipt_date)
        .bind(receipt.currency.code())
        .bind(receipt.exchange_rate.value())
        .bind(receipt.amount.amount())
        .bind(receipt.payment_type_id.as_ref().map(|id| *id.as_uuid()))
        .bind(receipt.payment_type_amount.amount())
        .bind(receipt.deposit_amount.amount())
        .bind(receipt.loyalty_amount.amount())
        .bind(receipt.withholding_amount.amount())
        .bind(receipt.created_by.id.as_uuid())
        .bind(&receipt.created_by.display_name)
        .bind(receipt.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        for line in &receipt.lines {
            sqlx::query(
                r#"
                INSERT INTO receipt_lines (id, receipt_id, document_line_id, amount, currency)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(line.receipt_id.as_uuid())
            .bind(line.document_line_id.as_uuid())
            .bind(line.amount.amount())
            .bind(line.amount.currency().code())
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), PostingError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PostingError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }
}

impl PgPostingTx {
    async fn load_lines(
        &mut self,
        document_id: DocumentId,
    ) -> Result<Vec<DocumentLine>, PostingError> {
        let rows = sqlx::query(
            "SELECT * FROM document_lines WHERE document_id = $1 ORDER BY position",
        )
        .bind(document_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(DatabaseError::from)?;

        rows.iter().map(line_from_row).collect()
    }

    /// Lines are fully owned by the document; replace them wholesale
    async fn replace_lines(&mut self, document: &Document) -> Result<(), PostingError> {
        sqlx::query("DELETE FROM document_lines WHERE document_id = $1")
            .bind(document.id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;

        for (position, line) in document.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO document_lines (
                    id, document_id, position, product_id, description,
                    quantity, unit_price, currency, discount_amount,
                    tax_amount, withholding_amount, withholding_tax_code,
                    line_total
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13
                )
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(document.id.as_uuid())
            .bind(position as i32)
            .bind(line.product_id.as_uuid())
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price.amount())
            .bind(line.unit_price.currency().code())
            .bind(line.discount_amount.amount())
            .bind(line.tax_amount.amount())
            .bind(line.withholding_amount.amount())
            .bind(line.withholding_tax_code.as_ref().map(|id| *id.as_uuid()))
            .bind(line.line_total.amount())
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        }
        Ok(())
    }

    async fn customer_stat(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        column: &str,
    ) -> Result<Decimal, PostingError> {
        let sql = format!(
            "SELECT COALESCE(
                (SELECT {column} FROM customer_stats
                 WHERE tenant_id = $1 AND customer_id = $2),
                0) AS value"
        );
        let row = sqlx::query(&sql)
            .bind(tenant_id.as_uuid())
            .bind(customer_id.as_uuid())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        Ok(row.try_get("value").map_err(DatabaseError::from)?)
    }

    async fn adjust_customer_stat(
        &mut self,
        tenant_id: TenantId,
        customer_id: CustomerId,
        column: &str,
        delta: Decimal,
    ) -> Result<(), PostingError> {
        let sql = format!(
            r#"
            INSERT INTO customer_stats (tenant_id, customer_id, {column})
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, customer_id)
            DO UPDATE SET {column} = customer_stats.{column} + EXCLUDED.{column}
            "#
        );
        sqlx::query(&sql)
            .bind(tenant_id.as_uuid())
            .bind(customer_id.as_uuid())
            .bind(delta)
            .execute(&mut *self.tx)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

fn status_to_str(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Draft => "draft",
        DocumentStatus::Sent => "sent",
        DocumentStatus::Approved => "approved",
        DocumentStatus::Rejected => "rejected",
        DocumentStatus::Cancelled => "cancelled",
        DocumentStatus::Paid => "paid",
        DocumentStatus::Partial => "partial",
        // never reaches storage; the overdue presentation is derived on read
        DocumentStatus::Overdue => "overdue",
    }
}

fn status_from_str(value: &str) -> Result<DocumentStatus, DatabaseError> {
    match value {
        "draft" => Ok(DocumentStatus::Draft),
        "sent" => Ok(DocumentStatus::Sent),
        "approved" => Ok(DocumentStatus::Approved),
        "rejected" => Ok(DocumentStatus::Rejected),
        "cancelled" => Ok(DocumentStatus::Cancelled),
        "paid" => Ok(DocumentStatus::Paid),
        "partial" => Ok(DocumentStatus::Partial),
        other => Err(DatabaseError::CorruptRow(format!(
            "unknown document status '{other}'"
        ))),
    }
}

fn payment_status_to_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Unpaid => "unpaid",
        PaymentStatus::Partial => "partial",
        PaymentStatus::Paid => "paid",
        PaymentStatus::Overpaid => "overpaid",
    }
}

fn payment_status_from_str(value: &str) -> Result<PaymentStatus, DatabaseError> {
    match value {
        "unpaid" => Ok(PaymentStatus::Unpaid),
        "partial" => Ok(PaymentStatus::Partial),
        "paid" => Ok(PaymentStatus::Paid),
        "overpaid" => Ok(PaymentStatus::Overpaid),
        other => Err(DatabaseError::CorruptRow(format!(
            "unknown payment status '{other}'"
        ))),
    }
}

fn nature_to_str(nature: EntryNature) -> &'static str {
    match nature {
        EntryNature::Debit => "debit",
        EntryNature::Credit => "credit",
    }
}

fn currency_from_code(code: &str) -> Result<Currency, DatabaseError> {
    match code.trim() {
        "USD" => Ok(Currency::USD),
        "EUR" => Ok(Currency::EUR),
        "GBP" => Ok(Currency::GBP),
        "JPY" => Ok(Currency::JPY),
        "IDR" => Ok(Currency::IDR),
        "SGD" => Ok(Currency::SGD),
        "MYR" => Ok(Currency::MYR),
        "AUD" => Ok(Currency::AUD),
        other => Err(DatabaseError::CorruptRow(format!(
            "unknown currency code '{other}'"
        ))),
    }
}

fn optional_actor(
    id: Option<Uuid>,
    name: Option<String>,
) -> Option<Actor> {
    match (id, name) {
        (Some(id), Some(name)) => Some(Actor::new(UserId::from_uuid(id), name)),
        _ => None,
    }
}

fn document_from_row(row: &PgRow, lines: Vec<DocumentLine>) -> Result<Document, DatabaseError> {
    let currency = currency_from_code(row.try_get::<String, _>("currency")?.as_str())?;
    let rate_value: Decimal = row.try_get("exchange_rate")?;
    let exchange_rate = ExchangeRate::new(rate_value)
        .map_err(|e| DatabaseError::CorruptRow(e.to_string()))?;
    let equivalent_amount: Decimal = row.try_get("equivalent_amount")?;

    // the equivalent is carried in the tenant's system currency
    let system_currency =
        currency_from_code(row.try_get::<String, _>("equivalent_currency")?.as_str())?;

    let money = |column: &str| -> Result<Money, DatabaseError> {
        Ok(Money::new(row.try_get(column)?, currency))
    };

    Ok(Document {
        id: DocumentId::from_uuid(row.try_get("id")?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id")?),
        reference: row.try_get("reference")?,
        customer_id: CustomerId::from_uuid(row.try_get("customer_id")?),
        store_id: StoreId::from_uuid(row.try_get("store_id")?),
        currency,
        exchange_rate,
        period_id: PeriodId::from_uuid(row.try_get("period_id")?),
        document_date: row.try_get::<NaiveDate, _>("document_date")?,
        due_date: row.try_get::<NaiveDate, _>("due_date")?,
        status: status_from_str(row.try_get::<String, _>("status")?.as_str())?,
        payment_status: payment_status_from_str(
            row.try_get::<String, _>("payment_status")?.as_str(),
        )?,
        subtotal: money("subtotal")?,
        discount_total: money("discount_total")?,
        tax_total: money("tax_total")?,
        withholding_total: money("withholding_total")?,
        total: money("total")?,
        paid: money("paid")?,
        balance: money("balance")?,
        equivalent_amount: Money::new(equivalent_amount, system_currency),
        lines,
        status_reason: row.try_get("status_reason")?,
        created_by: Actor::new(
            UserId::from_uuid(row.try_get("created_by")?),
            row.try_get::<String, _>("created_by_name")?,
        ),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        sent_at: row.try_get("sent_at")?,
        approved_by: optional_actor(
            row.try_get("approved_by")?,
            row.try_get("approved_by_name")?,
        ),
        approved_at: row.try_get("approved_at")?,
        rejected_by: optional_actor(
            row.try_get("rejected_by")?,
            row.try_get("rejected_by_name")?,
        ),
        rejected_at: row.try_get("rejected_at")?,
        cancelled_by: optional_actor(
            row.try_get("cancelled_by")?,
            row.try_get("cancelled_by_name")?,
        ),
        cancelled_at: row.try_get("cancelled_at")?,
    })
}

fn line_from_row(row: &PgRow) -> Result<DocumentLine, PostingError> {
    let currency = currency_from_code(
        row.try_get::<String, _>("currency")
            .map_err(DatabaseError::from)?
            .as_str(),
    )?;
    let money = |column: &str| -> Result<Money, DatabaseError> {
        Ok(Money::new(row.try_get(column)?, currency))
    };

    Ok(DocumentLine {
        id: DocumentLineId::from_uuid(row.try_get("id").map_err(DatabaseError::from)?),
        product_id: ProductId::from_uuid(row.try_get("product_id").map_err(DatabaseError::from)?),
        description: row.try_get("description").map_err(DatabaseError::from)?,
        quantity: row.try_get("quantity").map_err(DatabaseError::from)?,
        unit_price: money("unit_price")?,
        discount_amount: money("discount_amount")?,
        tax_amount: money("tax_amount")?,
        withholding_amount: money("withholding_amount")?,
        withholding_tax_code: row
            .try_get::<Option<Uuid>, _>("withholding_tax_code")
            .map_err(DatabaseError::from)?
            .map(TaxCodeId::from_uuid),
        line_total: money("line_total")?,
    })
}
