use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;

use crate::{
    error::{Error, Result},
    models::{
        new_object_id,
        users::{Address, NewUser, User, UserChanges, UserType},
    },
    queries::{PgStore, UserStore},
};

const USER_COLUMNS: &str = "id, email, password_hash, name, phone, address, deposit, user_type, active, shifts, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    name: String,
    phone: Option<String>,
    address: Option<Json<Address>>,
    deposit: Option<f64>,
    user_type: UserType,
    active: bool,
    shifts: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            phone: row.phone,
            address: row.address.map(|Json(address)| address),
            deposit: row.deposit,
            user_type: row.user_type,
            active: row.active,
            shifts: row.shifts,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Turns the `lower(email)` unique index violation into a domain error.
fn map_email_conflict(e: sqlx::Error, email: &str) -> Error {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return Error::AccountAlreadyExists(email.to_string());
        }
    }
    Error::Sqlx(e)
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, email, password_hash, name, phone, address, deposit, user_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(new_object_id())
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.name)
            .bind(&new_user.phone)
            .bind(new_user.address.clone().map(Json))
            .bind(new_user.deposit)
            .bind(new_user.user_type)
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_email_conflict(e, &new_user.email))?;

        Ok(row.into())
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(User::from))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE active AND user_type <> 'admin'
            ORDER BY created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_user(&self, id: &str, changes: UserChanges) -> Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                name = COALESCE($4, name),
                phone = COALESCE($5, phone),
                address = COALESCE($6, address),
                deposit = COALESCE($7, deposit),
                user_type = COALESCE($8, user_type),
                active = COALESCE($9, active),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let email = changes.email.clone().unwrap_or_default();
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.name)
            .bind(changes.phone)
            .bind(changes.address.map(Json))
            .bind(changes.deposit)
            .bind(changes.user_type)
            .bind(changes.active)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_email_conflict(e, &email))?;

        Ok(row.map(User::from))
    }

    async fn purge_user(&self, id: &str) -> Result<u64> {
        let rows_affected = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}
