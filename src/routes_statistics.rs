use axum::{extract::State, response::IntoResponse};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::envelope::ok;
use crate::error::ApiResult;
use crate::extract::AppQuery;
use crate::state::{now, AppState};
use crate::statistics::{daily_chart, overview, type_distribution, weekly_comparison, DateWindow};
use crate::store::EntryRepository;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tz: Option<String>,
}

impl StatsQuery {
    fn window(&self) -> DateWindow {
        DateWindow::from_query(self.start_date, self.end_date)
    }
}

// -----------------------------
// GET /api/statistics/overview
// Totals for the date range, or the last 7 days
// -----------------------------
pub async fn get_overview(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<StatsQuery>,
) -> ApiResult<impl IntoResponse> {
    let tz = state.timezone(q.tz.as_deref())?;
    let entries = state.store.list_entries(user.id, None)?;
    Ok(ok(overview(&entries, user.id, q.window(), now(), &tz)?))
}

// -----------------------------
// GET /api/statistics/daily-chart
// -----------------------------
pub async fn get_daily_chart(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<StatsQuery>,
) -> ApiResult<impl IntoResponse> {
    let tz = state.timezone(q.tz.as_deref())?;
    let entries = state.store.list_entries(user.id, None)?;
    Ok(ok(daily_chart(&entries, user.id, q.window(), now(), &tz)?))
}

// -----------------------------
// GET /api/statistics/type-distribution
// -----------------------------
pub async fn get_type_distribution(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<StatsQuery>,
) -> ApiResult<impl IntoResponse> {
    let tz = state.timezone(q.tz.as_deref())?;
    let entries = state.store.list_entries(user.id, None)?;
    Ok(ok(type_distribution(&entries, user.id, q.window(), now(), &tz)?))
}

// -----------------------------
// GET /api/statistics/weekly-comparison
// -----------------------------
pub async fn get_weekly_comparison(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let entries = state.store.list_entries(user.id, None)?;
    Ok(ok(weekly_comparison(&entries, user.id, now())))
}
