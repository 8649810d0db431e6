use crate::{
    error::{Error, Result},
    models::shifts::{
        round2, CreatedShift, NewShift, ShiftResponse, ShiftSummary, ShiftSummaryRequest,
        SummaryFilter, UpdateShift,
    },
    queries::Store,
    validation,
};
use chrono::Utc;

const RANGE_DATE_FORMAT: &str = "%d/%m/%Y";

fn no_shift_found(id: &str) -> Error {
    Error::NoShiftFound(format!("No shift found with id {}", id))
}

/// Books a shift and links it to both participants.
pub async fn create_shift(store: &dyn Store, body: NewShift) -> Result<CreatedShift> {
    validation::validate_new_shift(&body)?;

    let shift = store.create_shift(body).await?;
    tracing::info!(
        shift_id = %shift.id,
        client_id = %shift.client.id,
        cleaner_id = %shift.cleaner.id,
        "Shift created"
    );

    Ok(CreatedShift { shift_id: shift.id })
}

pub async fn get_all_shifts(store: &dyn Store) -> Result<Vec<ShiftResponse>> {
    let shifts = store.list_shifts().await?;
    Ok(shifts.into_iter().map(ShiftResponse::from).collect())
}

pub async fn get_single_shift(store: &dyn Store, id: &str) -> Result<ShiftResponse> {
    store
        .get_shift_by_id(id)
        .await?
        .map(ShiftResponse::from)
        .ok_or_else(|| no_shift_found(id))
}

pub async fn update_shift(store: &dyn Store, id: &str, body: UpdateShift) -> Result<ShiftResponse> {
    validation::validate_update_shift(&body)?;

    store
        .update_shift(id, body)
        .await?
        .map(ShiftResponse::from)
        .ok_or_else(|| no_shift_found(id))
}

/// Soft delete: the shift is flagged and drops out of listings and summaries.
pub async fn delete_shift(store: &dyn Store, id: &str) -> Result<()> {
    let update = UpdateShift {
        is_deleted: Some(true),
        ..UpdateShift::default()
    };
    store
        .update_shift(id, update)
        .await?
        .ok_or_else(|| no_shift_found(id))?;
    tracing::info!(shift_id = %id, "Shift deleted");

    Ok(())
}

/// Totals over the shifts in `[from, to]`, optionally narrowed to one client
/// and/or cleaner. `None` when nothing matches.
pub async fn shift_summary(
    store: &dyn Store,
    body: ShiftSummaryRequest,
) -> Result<Option<ShiftSummary>> {
    validation::validate_summary_request(&body)?;

    let now = Utc::now();
    let filter = SummaryFilter {
        from: body.from.unwrap_or(now),
        to: body.to.unwrap_or(now),
        client_id: body.client,
        cleaner_id: body.cleaner,
    };

    let totals = store.shift_totals(&filter).await?;
    if totals.num == 0 {
        return Ok(None);
    }

    Ok(Some(ShiftSummary {
        num: totals.num,
        commission: round2(totals.commission),
        amount: round2(totals.cash_amount),
        outstanding: round2(totals.commission - totals.cash_amount),
        range: format!(
            "{} - {}",
            filter.from.format(RANGE_DATE_FORMAT),
            filter.to.format(RANGE_DATE_FORMAT)
        ),
    }))
}
