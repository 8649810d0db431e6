use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::models::users::Address;

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Bank,
}

/// Client details copied into the shift when it is booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: Address,
}

/// Cleaner details copied into the shift when it is booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanerSnapshot {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub client: ClientSnapshot,
    pub cleaner: CleanerSnapshot,
    pub date: DateTime<Utc>,
    pub hours: f64,
    pub amount: f64,
    pub paid: bool,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: PaymentMethod,
    pub commission: Option<f64>,
    pub notes: Option<String>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl Shift {
    /// `amount / hours` to two decimals. Zero-hour shifts report 0.
    pub fn amount_per_hour(&self) -> f64 {
        if self.hours > 0.0 {
            round2(self.amount / self.hours)
        } else {
            0.0
        }
    }

    /// `commission / hours` to two decimals, 0 without a commission.
    pub fn commission_per_hour(&self) -> f64 {
        match self.commission {
            Some(commission) if commission != 0.0 && self.hours > 0.0 => {
                round2(commission / self.hours)
            }
            _ => 0.0,
        }
    }
}

/// Outward representation with the derived per-hour figures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftResponse {
    #[serde(flatten)]
    pub shift: Shift,
    pub amount_per_hour: f64,
    pub commission_per_hour: f64,
}

impl From<Shift> for ShiftResponse {
    fn from(shift: Shift) -> Self {
        Self {
            amount_per_hour: shift.amount_per_hour(),
            commission_per_hour: shift.commission_per_hour(),
            shift,
        }
    }
}

/// `POST /api/v1/shift` body, also what the store inserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShift {
    pub client: ClientSnapshot,
    pub cleaner: CleanerSnapshot,
    pub date: DateTime<Utc>,
    pub hours: f64,
    pub amount: f64,
    #[serde(default)]
    pub paid: bool,
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub commission: Option<f64>,
    pub notes: Option<String>,
}

/// `PATCH /api/v1/shift/{id}` body. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShift {
    pub date: Option<DateTime<Utc>>,
    pub hours: Option<f64>,
    pub amount: Option<f64>,
    pub paid: Option<bool>,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
    pub commission: Option<f64>,
    pub notes: Option<String>,
    pub is_deleted: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedShift {
    pub shift_id: String,
}

/// `POST /api/v1/shift/summary` body. Missing bounds default to now.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftSummaryRequest {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub client: Option<String>,
    pub cleaner: Option<String>,
}

/// Resolved filter passed to the store's aggregation.
#[derive(Debug, Clone)]
pub struct SummaryFilter {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub client_id: Option<String>,
    pub cleaner_id: Option<String>,
}

impl SummaryFilter {
    pub fn matches(&self, shift: &Shift) -> bool {
        !shift.is_deleted
            && shift.date >= self.from
            && shift.date <= self.to
            && self.client_id.as_ref().is_none_or(|id| *id == shift.client.id)
            && self.cleaner_id.as_ref().is_none_or(|id| *id == shift.cleaner.id)
    }
}

/// Raw sums from the store.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShiftTotals {
    pub num: i64,
    pub commission: f64,
    pub cash_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub num: i64,
    pub commission: f64,
    /// Cash taken by the cleaner in the range
    pub amount: f64,
    /// Commission still owed once cash taken is deducted
    pub outstanding: f64,
    /// `dd/mm/yyyy - dd/mm/yyyy`
    pub range: String,
}
