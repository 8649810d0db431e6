use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use crate::{
    error::{Error, Result},
    models::{
        new_object_id,
        shifts::{
            CleanerSnapshot, ClientSnapshot, NewShift, PaymentMethod, Shift, ShiftTotals,
            SummaryFilter, UpdateShift,
        },
    },
    queries::{PgStore, ShiftStore},
};

const SHIFT_COLUMNS: &str = "id, client, cleaner, date, hours, amount, paid, payment_date, payment_method, commission, notes, is_deleted, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ShiftRow {
    id: String,
    client: Json<ClientSnapshot>,
    cleaner: Json<CleanerSnapshot>,
    date: DateTime<Utc>,
    hours: f64,
    amount: f64,
    paid: bool,
    payment_date: Option<DateTime<Utc>>,
    payment_method: PaymentMethod,
    commission: Option<f64>,
    notes: Option<String>,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Self {
            id: row.id,
            client: row.client.0,
            cleaner: row.cleaner.0,
            date: row.date,
            hours: row.hours,
            amount: row.amount,
            paid: row.paid,
            payment_date: row.payment_date,
            payment_method: row.payment_method,
            commission: row.commission,
            notes: row.notes,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TotalsRow {
    num: i64,
    commission: f64,
    cash_amount: f64,
}

#[async_trait]
impl ShiftStore for PgStore {
    async fn create_shift(&self, new_shift: NewShift) -> Result<Shift> {
        let id = new_object_id();
        let mut tx = self.pool().begin().await?;

        let sql = format!(
            r#"
            INSERT INTO shifts (id, client, cleaner, date, hours, amount, paid, payment_date, payment_method, commission, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {SHIFT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(&id)
            .bind(Json(&new_shift.client))
            .bind(Json(&new_shift.cleaner))
            .bind(new_shift.date)
            .bind(new_shift.hours)
            .bind(new_shift.amount)
            .bind(new_shift.paid)
            .bind(new_shift.payment_date)
            .bind(new_shift.payment_method)
            .bind(new_shift.commission)
            .bind(&new_shift.notes)
            .fetch_one(&mut *tx)
            .await?;

        for participant in [&new_shift.client.id, &new_shift.cleaner.id] {
            let updated = sqlx::query(
                "UPDATE users SET shifts = array_append(shifts, $1), updated_at = now() WHERE id = $2",
            )
            .bind(&id)
            .bind(participant)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                tx.rollback().await?;
                return Err(Error::NoUserFound(format!("No user found with id {}", participant)));
            }
        }

        tx.commit().await?;
        Ok(row.into())
    }

    async fn get_shift_by_id(&self, id: &str) -> Result<Option<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = $1");
        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(Shift::from))
    }

    async fn list_shifts(&self) -> Result<Vec<Shift>> {
        let sql = format!("SELECT {SHIFT_COLUMNS} FROM shifts WHERE NOT is_deleted ORDER BY date");
        let rows = sqlx::query_as::<_, ShiftRow>(&sql)
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(Shift::from).collect())
    }

    async fn update_shift(&self, id: &str, update: UpdateShift) -> Result<Option<Shift>> {
        let sql = format!(
            r#"
            UPDATE shifts
            SET date = COALESCE($2, date),
                hours = COALESCE($3, hours),
                amount = COALESCE($4, amount),
                paid = COALESCE($5, paid),
                payment_date = COALESCE($6, payment_date),
                payment_method = COALESCE($7, payment_method),
                commission = COALESCE($8, commission),
                notes = COALESCE($9, notes),
                is_deleted = COALESCE($10, is_deleted),
                updated_at = now()
            WHERE id = $1
            RETURNING {SHIFT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(id)
            .bind(update.date)
            .bind(update.hours)
            .bind(update.amount)
            .bind(update.paid)
            .bind(update.payment_date)
            .bind(update.payment_method)
            .bind(update.commission)
            .bind(update.notes)
            .bind(update.is_deleted)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(Shift::from))
    }

    async fn shift_totals(&self, filter: &SummaryFilter) -> Result<ShiftTotals> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT COUNT(*) AS num,
                   COALESCE(SUM(commission), 0)::DOUBLE PRECISION AS commission,
                   COALESCE(SUM(amount) FILTER (WHERE payment_method = 'cash'), 0)::DOUBLE PRECISION AS cash_amount
            FROM shifts
            WHERE NOT is_deleted
              AND date >= $1
              AND date <= $2
              AND ($3::TEXT IS NULL OR client->>'id' = $3)
              AND ($4::TEXT IS NULL OR cleaner->>'id' = $4)
            "#,
        )
        .bind(filter.from)
        .bind(filter.to)
        .bind(&filter.client_id)
        .bind(&filter.cleaner_id)
        .fetch_one(self.pool())
        .await?;

        Ok(ShiftTotals {
            num: row.num,
            commission: row.commission,
            cash_amount: row.cash_amount,
        })
    }

    async fn purge_shift(&self, id: &str) -> Result<u64> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("UPDATE users SET shifts = array_remove(shifts, $1) WHERE $1 = ANY(shifts)")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let rows_affected = sqlx::query("DELETE FROM shifts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(rows_affected)
    }
}
