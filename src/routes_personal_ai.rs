// --------------------------------------------------
// Personal assistant endpoints built on the owner's history:
// habit analysis, goal advice, weekly plans and recurring-activity
// reminders.
// --------------------------------------------------

use axum::{extract::State, response::IntoResponse};
use serde::Deserialize;

use crate::advice::AdviceSink;
use crate::aggregate::in_window;
use crate::auth::AuthUser;
use crate::envelope::ok;
use crate::error::ApiResult;
use crate::extract::{AppJson, AppQuery};
use crate::insights::habit_report;
use crate::patterns::{detect_patterns, smart_reminders, PatternQuery};
use crate::planner::{personal_advice, personal_plan, Goal, PlanType};
use crate::routes_ai::{display_name, window_stats, TzQuery, CHAT_WINDOW_DAYS, REPORT_WINDOW_DAYS};
use crate::state::{now, AppState};
use crate::store::EntryRepository;

pub const PATTERN_WINDOW_DAYS: i64 = 60;

// -----------------------------
// GET /api/personal-ai/analyze-habits
// Last 30 days
// -----------------------------
pub async fn analyze_habits(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<TzQuery>,
) -> ApiResult<impl IntoResponse> {
    let stats = window_stats(&state, &user, REPORT_WINDOW_DAYS, q.tz.as_deref())?;
    let name = display_name(&state, &user)?;
    Ok(ok(habit_report(&stats, &name)))
}

#[derive(Debug, Deserialize)]
pub struct AdviceInput {
    #[serde(default)]
    pub goal: String,
}

// -----------------------------
// POST /api/personal-ai/personal-advice
// Last 7 days; the advice is appended to the suggestion log
// -----------------------------
pub async fn get_personal_advice(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<TzQuery>,
    AppJson(input): AppJson<AdviceInput>,
) -> ApiResult<impl IntoResponse> {
    let stats = window_stats(&state, &user, CHAT_WINDOW_DAYS, q.tz.as_deref())?;
    let name = display_name(&state, &user)?;
    let advice = personal_advice(Goal::parse(&input.goal), &stats, &name);

    match serde_json::to_string(&advice) {
        Ok(text) => state.store.append(user.id, "personal_advice", &text, now()),
        Err(e) => tracing::warn!(error = %e, "Could not serialize advice for the log"),
    }
    Ok(ok(advice))
}

#[derive(Debug, Deserialize)]
pub struct PlanInput {
    #[serde(default)]
    pub plan_type: String,
    pub duration: Option<String>,
}

// -----------------------------
// POST /api/personal-ai/create-personal-plan
// Preferred hours come from completed entries of the last 30 days
// -----------------------------
pub async fn create_personal_plan(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<TzQuery>,
    AppJson(input): AppJson<PlanInput>,
) -> ApiResult<impl IntoResponse> {
    let tz = state.timezone(q.tz.as_deref())?;
    let entries = state.store.list_entries(user.id, None)?;
    let (_, history) = in_window(&entries, user.id, REPORT_WINDOW_DAYS, now())?;
    let name = display_name(&state, &user)?;

    let plan = personal_plan(PlanType::parse(&input.plan_type), input.duration, &history, &name, &tz);
    Ok(ok(plan))
}

#[derive(Debug, Deserialize)]
pub struct RemindersQuery {
    pub tz: Option<String>,
    pub min_frequency: Option<usize>,
    pub max_patterns: Option<usize>,
}

// -----------------------------
// GET /api/personal-ai/smart-reminders
// Recurring activities of the last 60 days
// -----------------------------
pub async fn get_smart_reminders(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<RemindersQuery>,
) -> ApiResult<impl IntoResponse> {
    let tz = state.timezone(q.tz.as_deref())?;
    let defaults = PatternQuery::default();
    let query = PatternQuery {
        min_frequency: q.min_frequency.unwrap_or(defaults.min_frequency),
        max_patterns: q.max_patterns.unwrap_or(defaults.max_patterns),
    };

    let entries = state.store.list_entries(user.id, None)?;
    let patterns = detect_patterns(&entries, user.id, PATTERN_WINDOW_DAYS, now(), &tz, &query)?;
    let name = display_name(&state, &user)?;
    Ok(ok(smart_reminders(patterns, &name)))
}
