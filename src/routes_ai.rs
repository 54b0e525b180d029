// --------------------------------------------------
// Rule-based assistant endpoints.
//
// Responsibilities:
// - Chat: classify the message, answer from a template,
//   log the answer
// - Suggest free slots for a day
// - 30-day performance report
// - Past assistant output
// --------------------------------------------------

use axum::{extract::State, response::IntoResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::advice::{advise, analyze_performance, AdviceSink, IntentCategory};
use crate::aggregate::{aggregate, AggregateStats};
use crate::auth::AuthUser;
use crate::envelope::{ok, ok_with_message};
use crate::error::{ApiResult, AppError};
use crate::extract::{AppJson, AppQuery};
use crate::free_slots::{find_free_slots, FreeSlot, SlotQuery};
use crate::models::{AdviceRecord, ScheduleEntry};
use crate::state::{now, AppState};
use crate::store::EntryRepository;
use crate::timerange::{clip_to_day, date_of, hour_window, TimeRange};

pub const CHAT_WINDOW_DAYS: i64 = 7;
pub const REPORT_WINDOW_DAYS: i64 = 30;

/// Full name of the signed-in user, falling back to the username.
pub fn display_name(state: &AppState, user: &AuthUser) -> ApiResult<String> {
    let db = state.store.load()?;
    Ok(db
        .users
        .iter()
        .find(|u| u.id == user.id)
        .map(|u| u.full_name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(&user.username)
        .to_string())
}

/// Rolling-window statistics for the signed-in user.
pub fn window_stats(state: &AppState, user: &AuthUser, days: i64, tz: Option<&str>) -> ApiResult<AggregateStats> {
    let tz = state.timezone(tz)?;
    let entries = state.store.list_entries(user.id, None)?;
    Ok(aggregate(&entries, user.id, days, now(), &tz)?)
}

#[derive(Debug, Deserialize)]
pub struct TzQuery {
    pub tz: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatInput {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub category: IntentCategory,
    pub stats: AggregateStats,
}

// -----------------------------
// POST /api/ai/chat
// POST /api/personal-ai/chat
// Answers from the last 7 days; the reply is appended to the suggestion log
// -----------------------------
pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<TzQuery>,
    AppJson(input): AppJson<ChatInput>,
) -> ApiResult<impl IntoResponse> {
    if input.message.trim().is_empty() {
        return Err(AppError::BadRequest("message required".to_string()));
    }

    let stats = window_stats(&state, &user, CHAT_WINDOW_DAYS, q.tz.as_deref())?;
    let name = display_name(&state, &user)?;
    let (category, message) = advise(state.store.as_ref(), user.id, &input.message, &stats, &name, now());

    tracing::info!(user_id = %user.id, category = category.as_str(), "Assistant reply");
    Ok(ok(ChatReply {
        message,
        category,
        stats,
    }))
}

fn span(e: &ScheduleEntry) -> TimeRange {
    TimeRange {
        start: e.start,
        end: e.end,
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateInput {
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub preferences: SlotQuery,
}

#[derive(Debug, Serialize)]
pub struct GeneratedSchedule {
    pub date: NaiveDate,
    pub existing_schedules: Vec<ScheduleEntry>,
    pub suggested_schedules: Vec<FreeSlot>,
}

// -----------------------------
// POST /api/ai/generate-schedule
// Free slots on `date` (today when omitted) around every entry touching that
// day, including ones carried over from the night before
// -----------------------------
pub async fn generate_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<TzQuery>,
    AppJson(input): AppJson<GenerateInput>,
) -> ApiResult<impl IntoResponse> {
    input.preferences.validate()?;
    let tz = state.timezone(q.tz.as_deref())?;
    let day = input.date.unwrap_or_else(|| date_of(&now(), &tz));

    let whole_day = hour_window(day, 0, 24, &tz)?;
    let existing: Vec<ScheduleEntry> = state
        .store
        .list_entries(user.id, None)?
        .into_iter()
        .filter(|e| whole_day.contains(&e.start) || clip_to_day(&span(e), day, &tz).is_some())
        .collect();
    let busy: Vec<TimeRange> = existing
        .iter()
        .filter_map(|e| clip_to_day(&span(e), day, &tz))
        .collect();

    let slots = find_free_slots(&busy, day, &tz, &input.preferences);
    let message = format!("{} suggestion(s) for {day}", slots.len());

    Ok(ok_with_message(
        GeneratedSchedule {
            date: day,
            existing_schedules: existing,
            suggested_schedules: slots,
        },
        message,
    ))
}

// -----------------------------
// GET /api/ai/analyze-performance
// The report is appended to the suggestion log
// -----------------------------
pub async fn analyze(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<TzQuery>,
) -> ApiResult<impl IntoResponse> {
    let stats = window_stats(&state, &user, REPORT_WINDOW_DAYS, q.tz.as_deref())?;
    let report = analyze_performance(&stats);

    match serde_json::to_string(&report) {
        Ok(text) => state.store.append(user.id, "performance", &text, now()),
        Err(e) => tracing::warn!(error = %e, "Could not serialize report for the log"),
    }
    Ok(ok(report))
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

// -----------------------------
// GET /api/ai/suggestions?limit=10
// Newest first
// -----------------------------
pub async fn suggestions(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<SuggestionsQuery>,
) -> ApiResult<impl IntoResponse> {
    let db = state.store.load()?;
    let mut mine: Vec<AdviceRecord> = db.suggestions.into_iter().filter(|s| s.owner == user.id).collect();
    mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    mine.truncate(q.limit);
    Ok(ok(mine))
}
