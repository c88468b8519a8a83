//! Quote persistence: materializing a pricing breakdown into a numbered
//! quote with line items, and atomically regenerating those lines on
//! recalculation.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{Row, Sqlite, Transaction};

use pvquote_core::{
    materialize_lines, quote_number, totals_from_lines, validity_deadline, verify_line_totals,
    vat_rate, PricingBreakdown, QuoteLine, QuoteStatus,
};

use super::RepositoryError;
use crate::DbPool;

#[derive(Clone, Debug, Serialize)]
pub struct QuoteRecord {
    pub id: i64,
    pub precheck_id: i64,
    pub quote_number: String,
    pub package: String,
    pub subtotal: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub status: QuoteStatus,
    pub valid_until: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub lines: Vec<QuoteLine>,
}

fn decimal_column(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Decimal, RepositoryError> {
    let text: String = row.try_get(column)?;
    Decimal::from_str(&text)
        .map_err(|_| RepositoryError::Decode(format!("quote.{column} holds non-decimal `{text}`")))
}

fn status_column(row: &sqlx::sqlite::SqliteRow) -> Result<QuoteStatus, RepositoryError> {
    let text: String = row.try_get("status")?;
    QuoteStatus::from_str(&text)
        .map_err(|_| RepositoryError::Decode(format!("quote.status holds unknown `{text}`")))
}

pub struct SqlQuoteRepository {
    pool: DbPool,
}

impl SqlQuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Materializes a breakdown into a new quote. Number allocation, the
    /// quote row and all line rows go through one transaction, so a quote
    /// is either fully visible with its lines or not at all.
    pub async fn create_from_breakdown(
        &self,
        precheck_id: i64,
        breakdown: &PricingBreakdown,
    ) -> Result<QuoteRecord, RepositoryError> {
        let lines = materialize_lines(breakdown);
        verify_line_totals(&lines, breakdown)?;
        let totals = totals_from_lines(&lines);

        let today = Utc::now().date_naive();
        let valid_until = validity_deadline(today);

        let mut tx = self.pool.begin().await?;

        let year = today.year();
        let taken: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM quote WHERE quote_number LIKE ?")
                .bind(format!("PV-{year}-%"))
                .fetch_one(&mut *tx)
                .await?;
        let number = quote_number(year, taken as u32 + 1);

        let result = sqlx::query(
            "INSERT INTO quote (precheck_id, quote_number, package, subtotal, vat_rate, \
               vat_amount, total, status, valid_until) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(precheck_id)
        .bind(&number)
        .bind(breakdown.package.as_str())
        .bind(totals.subtotal.to_string())
        .bind((vat_rate() * Decimal::ONE_HUNDRED).to_string())
        .bind(totals.vat_amount.to_string())
        .bind(totals.total.to_string())
        .bind(QuoteStatus::Review.as_str())
        .bind(valid_until.to_string())
        .execute(&mut *tx)
        .await?;
        let quote_id = result.last_insert_rowid();

        insert_lines(&mut tx, quote_id, &lines).await?;
        tx.commit().await?;

        self.find_by_id(quote_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("quote {quote_id} after insert")))
    }

    /// Replaces a quote's pricing with a fresh breakdown. Line deletion,
    /// line insertion and the totals update share one transaction; a reader
    /// never observes a quote with half its lines.
    pub async fn recalculate(
        &self,
        quote_id: i64,
        breakdown: &PricingBreakdown,
    ) -> Result<QuoteRecord, RepositoryError> {
        let lines = materialize_lines(breakdown);
        verify_line_totals(&lines, breakdown)?;
        let totals = totals_from_lines(&lines);

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE quote SET package = ?, subtotal = ?, vat_amount = ?, total = ?, \
               updated_at = datetime('now') \
             WHERE id = ?",
        )
        .bind(breakdown.package.as_str())
        .bind(totals.subtotal.to_string())
        .bind(totals.vat_amount.to_string())
        .bind(totals.total.to_string())
        .bind(quote_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("quote {quote_id}")));
        }

        sqlx::query("DELETE FROM quote_line WHERE quote_id = ?")
            .bind(quote_id)
            .execute(&mut *tx)
            .await?;
        insert_lines(&mut tx, quote_id, &lines).await?;
        tx.commit().await?;

        self.find_by_id(quote_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("quote {quote_id} after update")))
    }

    /// Applies a lifecycle transition, rejecting any move the state machine
    /// does not allow.
    pub async fn update_status(
        &self,
        quote_id: i64,
        next: QuoteStatus,
    ) -> Result<QuoteRecord, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT status FROM quote WHERE id = ?")
            .bind(quote_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("quote {quote_id}")))?;
        let mut status = status_column(&row)?;
        status.transition_to(next)?;

        sqlx::query("UPDATE quote SET status = ?, updated_at = datetime('now') WHERE id = ?")
            .bind(status.as_str())
            .bind(quote_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        self.find_by_id(quote_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("quote {quote_id} after update")))
    }

    pub async fn find_by_id(&self, quote_id: i64) -> Result<Option<QuoteRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, precheck_id, quote_number, package, subtotal, vat_rate, vat_amount, \
               total, status, valid_until, created_at, updated_at \
             FROM quote WHERE id = ?",
        )
        .bind(quote_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else { return Ok(None) };

        let valid_until: Option<String> = row.try_get("valid_until")?;
        let valid_until = valid_until
            .map(|text| {
                NaiveDate::from_str(&text).map_err(|_| {
                    RepositoryError::Decode(format!("quote.valid_until holds non-date `{text}`"))
                })
            })
            .transpose()?;

        let lines = self.lines_for(quote_id).await?;

        Ok(Some(QuoteRecord {
            id: row.try_get("id")?,
            precheck_id: row.try_get("precheck_id")?,
            quote_number: row.try_get("quote_number")?,
            package: row.try_get("package")?,
            subtotal: decimal_column(&row, "subtotal")?,
            vat_rate: decimal_column(&row, "vat_rate")?,
            vat_amount: decimal_column(&row, "vat_amount")?,
            total: decimal_column(&row, "total")?,
            status: status_column(&row)?,
            valid_until,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            lines,
        }))
    }

    async fn lines_for(&self, quote_id: i64) -> Result<Vec<QuoteLine>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT position, label, quantity, unit_price, line_total \
             FROM quote_line WHERE quote_id = ? ORDER BY position",
        )
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let position: i64 = row.try_get("position")?;
                Ok(QuoteLine {
                    position: position as u32,
                    label: row.try_get("label")?,
                    quantity: decimal_column(row, "quantity")?,
                    unit_price: decimal_column(row, "unit_price")?,
                    line_total: decimal_column(row, "line_total")?,
                })
            })
            .collect()
    }
}

async fn insert_lines(
    tx: &mut Transaction<'_, Sqlite>,
    quote_id: i64,
    lines: &[QuoteLine],
) -> Result<(), RepositoryError> {
    for line in lines {
        sqlx::query(
            "INSERT INTO quote_line (quote_id, position, label, quantity, unit_price, line_total) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(quote_id)
        .bind(i64::from(line.position))
        .bind(&line.label)
        .bind(line.quantity.to_string())
        .bind(line.unit_price.to_string())
        .bind(line.line_total.to_string())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
