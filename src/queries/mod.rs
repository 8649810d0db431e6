//! Persistence seam.
//!
//! Services only see the `UserStore`, `SessionStore` and `ShiftStore` traits.
//! `PgStore` is the production implementation; `MemoryStore` keeps everything
//! in-process for tests and local runs.

pub mod memory;
pub mod sessions;
pub mod shifts;
pub mod users;

use async_trait::async_trait;

use crate::{
    database::DbPool,
    error::Result,
    models::{
        sessions::{Session, SessionQuery, SessionUpdate},
        shifts::{NewShift, Shift, ShiftTotals, SummaryFilter, UpdateShift},
        users::{NewUser, User, UserChanges},
    },
};

pub use memory::MemoryStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. A taken email (any case) is `Error::AccountAlreadyExists`.
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    /// Direct lookup, not subject to the default listing filter.
    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Case-insensitive email lookup.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Active, non-admin users, newest first.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Applies a partial update. `None` when the user does not exist.
    async fn update_user(&self, id: &str, changes: UserChanges) -> Result<Option<User>>;

    /// Physically removes a user. Only test fixtures call this.
    async fn purge_user(&self, id: &str) -> Result<u64>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, user_id: &str, user_agent: &str) -> Result<Session>;

    async fn get_session(&self, id: &str) -> Result<Option<Session>>;

    /// Newest first.
    async fn find_sessions(&self, query: SessionQuery) -> Result<Vec<Session>>;

    /// Returns the number of sessions touched.
    async fn update_sessions(&self, query: SessionQuery, update: SessionUpdate) -> Result<u64>;

    /// Physically removes a session. Only test fixtures call this.
    async fn purge_session(&self, id: &str) -> Result<u64>;
}

#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// Inserts the shift and appends its id to both participants' `shifts`
    /// in one unit of work. If either participant is missing nothing is
    /// written and `Error::NoUserFound` is returned.
    async fn create_shift(&self, new_shift: NewShift) -> Result<Shift>;

    /// Direct lookup, soft-deleted shifts included.
    async fn get_shift_by_id(&self, id: &str) -> Result<Option<Shift>>;

    /// Shifts not soft-deleted, by date.
    async fn list_shifts(&self) -> Result<Vec<Shift>>;

    /// Applies a partial update. `None` when the shift does not exist.
    async fn update_shift(&self, id: &str, update: UpdateShift) -> Result<Option<Shift>>;

    /// Count, commission sum and cash amount sum over the filter.
    async fn shift_totals(&self, filter: &SummaryFilter) -> Result<ShiftTotals>;

    /// Physically removes a shift. Only test fixtures call this.
    async fn purge_shift(&self, id: &str) -> Result<u64>;
}

/// Everything the services need from persistence.
pub trait Store: UserStore + SessionStore + ShiftStore {}

impl<T> Store for T where T: UserStore + SessionStore + ShiftStore {}

/// Postgres-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}
