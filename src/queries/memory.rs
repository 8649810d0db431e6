use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    error::{Error, Result},
    models::{
        new_object_id,
        sessions::{Session, SessionQuery, SessionUpdate},
        shifts::{NewShift, PaymentMethod, Shift, ShiftTotals, SummaryFilter, UpdateShift},
        users::{NewUser, User, UserChanges},
    },
    queries::{SessionStore, ShiftStore, UserStore},
};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<String, User>,
    sessions: HashMap<String, Session>,
    shifts: HashMap<String, Shift>,
}

/// In-process store with the same semantics as `PgStore`.
///
/// All three collections sit behind one lock so shift creation updates the
/// shift and both participants atomically. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<String, User>, email: &str, except_id: Option<&str>) -> bool {
    users
        .values()
        .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id.as_str()) != except_id)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let mut data = self.inner.write().await;
        if email_taken(&data.users, &new_user.email, None) {
            return Err(Error::AccountAlreadyExists(new_user.email));
        }

        let now = Utc::now();
        let user = User {
            id: new_object_id(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            phone: new_user.phone,
            address: new_user.address,
            deposit: new_user.deposit,
            user_type: new_user.user_type,
            active: true,
            shifts: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        data.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let data = self.inner.read().await;
        Ok(data
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let data = self.inner.read().await;
        let mut users: Vec<User> = data.users.values().filter(|u| u.is_listed()).cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_user(&self, id: &str, changes: UserChanges) -> Result<Option<User>> {
        let mut data = self.inner.write().await;
        if let Some(email) = &changes.email {
            if email_taken(&data.users, email, Some(id)) {
                return Err(Error::AccountAlreadyExists(email.clone()));
            }
        }

        let Some(user) = data.users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        if let Some(address) = changes.address {
            user.address = Some(address);
        }
        if let Some(deposit) = changes.deposit {
            user.deposit = Some(deposit);
        }
        if let Some(user_type) = changes.user_type {
            user.user_type = user_type;
        }
        if let Some(active) = changes.active {
            user.active = active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn purge_user(&self, id: &str) -> Result<u64> {
        Ok(self.inner.write().await.users.remove(id).map_or(0, |_| 1))
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, user_id: &str, user_agent: &str) -> Result<Session> {
        let now = Utc::now();
        let session = Session {
            id: new_object_id(),
            user_id: user_id.to_string(),
            valid: true,
            user_agent: user_agent.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.inner.read().await.sessions.get(id).cloned())
    }

    async fn find_sessions(&self, query: SessionQuery) -> Result<Vec<Session>> {
        let data = self.inner.read().await;
        let mut sessions: Vec<Session> = data
            .sessions
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn update_sessions(&self, query: SessionQuery, update: SessionUpdate) -> Result<u64> {
        let mut data = self.inner.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for session in data.sessions.values_mut().filter(|s| query.matches(s)) {
            if let Some(valid) = update.valid {
                session.valid = valid;
            }
            session.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn purge_session(&self, id: &str) -> Result<u64> {
        Ok(self.inner.write().await.sessions.remove(id).map_or(0, |_| 1))
    }
}

#[async_trait]
impl ShiftStore for MemoryStore {
    async fn create_shift(&self, new_shift: NewShift) -> Result<Shift> {
        let mut data = self.inner.write().await;
        for participant in [&new_shift.client.id, &new_shift.cleaner.id] {
            if !data.users.contains_key(participant) {
                return Err(Error::NoUserFound(format!("No user found with id {}", participant)));
            }
        }

        let now = Utc::now();
        let shift = Shift {
            id: new_object_id(),
            client: new_shift.client,
            cleaner: new_shift.cleaner,
            date: new_shift.date,
            hours: new_shift.hours,
            amount: new_shift.amount,
            paid: new_shift.paid,
            payment_date: new_shift.payment_date,
            payment_method: new_shift.payment_method,
            commission: new_shift.commission,
            notes: new_shift.notes,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        for participant in [&shift.client.id, &shift.cleaner.id] {
            if let Some(user) = data.users.get_mut(participant) {
                user.shifts.push(shift.id.clone());
                user.updated_at = now;
            }
        }
        data.shifts.insert(shift.id.clone(), shift.clone());
        Ok(shift)
    }

    async fn get_shift_by_id(&self, id: &str) -> Result<Option<Shift>> {
        Ok(self.inner.read().await.shifts.get(id).cloned())
    }

    async fn list_shifts(&self) -> Result<Vec<Shift>> {
        let data = self.inner.read().await;
        let mut shifts: Vec<Shift> = data
            .shifts
            .values()
            .filter(|s| !s.is_deleted)
            .cloned()
            .collect();
        shifts.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(shifts)
    }

    async fn update_shift(&self, id: &str, update: UpdateShift) -> Result<Option<Shift>> {
        let mut data = self.inner.write().await;
        let Some(shift) = data.shifts.get_mut(id) else {
            return Ok(None);
        };
        if let Some(date) = update.date {
            shift.date = date;
        }
        if let Some(hours) = update.hours {
            shift.hours = hours;
        }
        if let Some(amount) = update.amount {
            shift.amount = amount;
        }
        if let Some(paid) = update.paid {
            shift.paid = paid;
        }
        if let Some(payment_date) = update.payment_date {
            shift.payment_date = Some(payment_date);
        }
        if let Some(payment_method) = update.payment_method {
            shift.payment_method = payment_method;
        }
        if let Some(commission) = update.commission {
            shift.commission = Some(commission);
        }
        if let Some(notes) = update.notes {
            shift.notes = Some(notes);
        }
        if let Some(is_deleted) = update.is_deleted {
            shift.is_deleted = is_deleted;
        }
        shift.updated_at = Utc::now();
        Ok(Some(shift.clone()))
    }

    async fn shift_totals(&self, filter: &SummaryFilter) -> Result<ShiftTotals> {
        let data = self.inner.read().await;
        let totals = data
            .shifts
            .values()
            .filter(|s| filter.matches(s))
            .fold(ShiftTotals::default(), |mut acc, s| {
                acc.num += 1;
                acc.commission += s.commission.unwrap_or_default();
                if s.payment_method == PaymentMethod::Cash {
                    acc.cash_amount += s.amount;
                }
                acc
            });
        Ok(totals)
    }

    async fn purge_shift(&self, id: &str) -> Result<u64> {
        let mut data = self.inner.write().await;
        for user in data.users.values_mut() {
            user.shifts.retain(|shift_id| shift_id != id);
        }
        Ok(data.shifts.remove(id).map_or(0, |_| 1))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::{
        shifts::{CleanerSnapshot, ClientSnapshot},
        users::{Address, UserType},
    };

    fn new_user(email: &str, user_type: UserType) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Test".to_string(),
            phone: None,
            address: None,
            deposit: None,
            user_type,
        }
    }

    fn new_shift(client: &User, cleaner: &User, amount: f64, method: PaymentMethod) -> NewShift {
        NewShift {
            client: ClientSnapshot {
                id: client.id.clone(),
                name: client.name.clone(),
                email: client.email.clone(),
                phone: "0123".to_string(),
                address: Address {
                    street: "1 High St".to_string(),
                    city: "Leeds".to_string(),
                    postcode: "LS1 1AA".to_string(),
                },
            },
            cleaner: CleanerSnapshot {
                id: cleaner.id.clone(),
                name: cleaner.name.clone(),
            },
            date: Utc::now(),
            hours: 2.0,
            amount,
            paid: false,
            payment_date: None,
            payment_method: method,
            commission: Some(5.0),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_email_is_unique_ignoring_case() {
        let store = MemoryStore::new();
        store.create_user(new_user("kate@example.com", UserType::Client)).await.unwrap();

        let err = store
            .create_user(new_user("KATE@example.com", UserType::Client))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AccountAlreadyExists(_)));

        let found = store.get_user_by_email("Kate@Example.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_listing_hides_admins_and_inactive_users() {
        let store = MemoryStore::new();
        let client = store.create_user(new_user("c@example.com", UserType::Client)).await.unwrap();
        store.create_user(new_user("a@example.com", UserType::Admin)).await.unwrap();
        let gone = store.create_user(new_user("g@example.com", UserType::Cleaner)).await.unwrap();
        store
            .update_user(&gone.id, UserChanges { active: Some(false), ..Default::default() })
            .await
            .unwrap();

        let listed = store.list_users().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, client.id);

        // Direct lookup still sees the deactivated user.
        assert!(store.get_user_by_id(&gone.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_missing_user_returns_none() {
        let store = MemoryStore::new();
        let result = store
            .update_user(&new_object_id(), UserChanges { name: Some("X".into()), ..Default::default() })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_create_shift_links_both_participants() {
        let store = MemoryStore::new();
        let client = store.create_user(new_user("c@example.com", UserType::Client)).await.unwrap();
        let cleaner = store.create_user(new_user("b@example.com", UserType::Cleaner)).await.unwrap();

        let shift = store
            .create_shift(new_shift(&client, &cleaner, 40.0, PaymentMethod::Cash))
            .await
            .unwrap();

        let client = store.get_user_by_id(&client.id).await.unwrap().unwrap();
        let cleaner = store.get_user_by_id(&cleaner.id).await.unwrap().unwrap();
        assert_eq!(client.shifts, vec![shift.id.clone()]);
        assert_eq!(cleaner.shifts, vec![shift.id]);
    }

    #[tokio::test]
    async fn test_create_shift_with_missing_cleaner_writes_nothing() {
        let store = MemoryStore::new();
        let client = store.create_user(new_user("c@example.com", UserType::Client)).await.unwrap();
        let mut ghost = client.clone();
        ghost.id = new_object_id();

        let err = store
            .create_shift(new_shift(&client, &ghost, 40.0, PaymentMethod::Cash))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoUserFound(_)));
        assert!(store.list_shifts().await.unwrap().is_empty());
        let client = store.get_user_by_id(&client.id).await.unwrap().unwrap();
        assert!(client.shifts.is_empty());
    }

    #[tokio::test]
    async fn test_totals_count_cash_only_and_skip_deleted() {
        let store = MemoryStore::new();
        let client = store.create_user(new_user("c@example.com", UserType::Client)).await.unwrap();
        let cleaner = store.create_user(new_user("b@example.com", UserType::Cleaner)).await.unwrap();

        store.create_shift(new_shift(&client, &cleaner, 40.0, PaymentMethod::Cash)).await.unwrap();
        store.create_shift(new_shift(&client, &cleaner, 60.0, PaymentMethod::Bank)).await.unwrap();
        let deleted = store
            .create_shift(new_shift(&client, &cleaner, 100.0, PaymentMethod::Cash))
            .await
            .unwrap();
        store
            .update_shift(&deleted.id, UpdateShift { is_deleted: Some(true), ..Default::default() })
            .await
            .unwrap();

        let filter = SummaryFilter {
            from: Utc::now() - Duration::days(1),
            to: Utc::now() + Duration::days(1),
            client_id: None,
            cleaner_id: Some(cleaner.id.clone()),
        };
        let totals = store.shift_totals(&filter).await.unwrap();
        assert_eq!(totals.num, 2);
        assert_eq!(totals.commission, 10.0);
        assert_eq!(totals.cash_amount, 40.0);
    }

    #[tokio::test]
    async fn test_invalidate_sessions_for_user() {
        let store = MemoryStore::new();
        let user_id = new_object_id();
        store.create_session(&user_id, "curl/8").await.unwrap();
        store.create_session(&user_id, "firefox").await.unwrap();
        store.create_session(&new_object_id(), "other").await.unwrap();

        let touched = store
            .update_sessions(SessionQuery::active_for_user(&user_id), SessionUpdate::invalidate())
            .await
            .unwrap();
        assert_eq!(touched, 2);
        assert!(store
            .find_sessions(SessionQuery::active_for_user(&user_id))
            .await
            .unwrap()
            .is_empty());
    }
}
