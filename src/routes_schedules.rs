// --------------------------------------------------
// Schedule entry CRUD for the signed-in owner.
//
// Responsibilities:
// - List entries (optionally by calendar date range)
// - Create / update / delete entries
// - Mark entries complete
// - Keyword search over title and description
// Every lookup is owner-scoped; another owner's id is a 404.
// --------------------------------------------------

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::envelope::{done, ok, ok_with_message};
use crate::error::{ApiResult, AppError};
use crate::extract::{AppJson, AppQuery};
use crate::models::{Category, Priority, ScheduleEntry};
use crate::state::{now, AppState};
use crate::store::EntryRepository;
use crate::timerange::date_of;

pub const DEFAULT_COLOR: &str = "#3B82F6";
pub const DEFAULT_REMINDER_MIN: i64 = 15;

pub fn parse_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::BadRequest("invalid id".to_string()))
}

fn parse_instant(field: &str, value: &str) -> ApiResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|_| AppError::BadRequest(format!("invalid {field}")))
}

fn check_order(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> ApiResult<()> {
    if end <= start {
        return Err(AppError::BadRequest("end_time must be after start_time".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub tz: Option<String>,
}

// -----------------------------
// GET /api/schedules?start=YYYY-MM-DD&end=YYYY-MM-DD
// Entries ordered by start; the date filter applies only when both ends are given
// -----------------------------
pub async fn list_schedules(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let tz = state.timezone(q.tz.as_deref())?;
    let mut entries = state.store.list_entries(user.id, None)?;

    if let (Some(from), Some(to)) = (q.start, q.end) {
        if to < from {
            return Err(AppError::BadRequest("end date is before start date".to_string()));
        }
        entries.retain(|e| {
            let d = date_of(&e.start, &tz);
            from <= d && d <= to
        });
    }

    tracing::debug!(user_id = %user.id, count = entries.len(), "Listed schedules");
    Ok(ok(entries))
}

#[derive(Debug, Deserialize)]
pub struct CreateScheduleInput {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: String, // RFC3339
    pub end_time: String,   // RFC3339
    pub category: Category,
    pub color: Option<String>,
    pub priority: Option<Priority>,
    pub reminder_min: Option<i64>,
}

// -----------------------------
// POST /api/schedules
// -----------------------------
pub async fn create_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(input): AppJson<CreateScheduleInput>,
) -> ApiResult<impl IntoResponse> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title required".to_string()));
    }
    let start = parse_instant("start_time", &input.start_time)?;
    let end = parse_instant("end_time", &input.end_time)?;
    check_order(start, end)?;

    let entry = ScheduleEntry {
        id: Uuid::new_v4(),
        owner: user.id,
        title: input.title.trim().to_string(),
        description: input.description.filter(|s| !s.trim().is_empty()),
        location: input.location.filter(|s| !s.trim().is_empty()),
        start,
        end,
        category: input.category,
        priority: input.priority.unwrap_or_default(),
        color: input.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        reminder_min: input.reminder_min.unwrap_or(DEFAULT_REMINDER_MIN),
        completed: false,
        duration_min: Some((end - start).num_minutes()),
        created_at: now(),
    };

    state.store.update(|db| {
        db.schedules.push(entry.clone());
        Ok::<_, AppError>(())
    })?;

    tracing::info!(user_id = %user.id, schedule_id = %entry.id, "Created schedule");
    Ok((StatusCode::CREATED, ok_with_message(entry, "schedule created")))
}

#[derive(Debug, Deserialize)]
pub struct UpdateScheduleInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub category: Option<Category>,
    pub color: Option<String>,
    pub priority: Option<Priority>,
    pub reminder_min: Option<i64>,
    pub completed: Option<bool>,
}

impl UpdateScheduleInput {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.category.is_none()
            && self.color.is_none()
            && self.priority.is_none()
            && self.reminder_min.is_none()
            && self.completed.is_none()
    }
}

// -----------------------------
// PUT /api/schedules/:id
// Partial update; start/end are re-validated together
// -----------------------------
pub async fn update_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    AppJson(input): AppJson<UpdateScheduleInput>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    if input.is_empty() {
        return Err(AppError::BadRequest("nothing to update".to_string()));
    }
    if input.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }
    let start = input.start_time.as_deref().map(|s| parse_instant("start_time", s)).transpose()?;
    let end = input.end_time.as_deref().map(|s| parse_instant("end_time", s)).transpose()?;

    let updated = state.store.update(|db| {
        let Some(e) = db
            .schedules
            .iter_mut()
            .find(|e| e.id == id && e.owner == user.id)
        else {
            return Err(AppError::NotFound("schedule not found".to_string()));
        };

        let new_start = start.unwrap_or(e.start);
        let new_end = end.unwrap_or(e.end);
        check_order(new_start, new_end)?;

        e.start = new_start;
        e.end = new_end;
        e.duration_min = Some((new_end - new_start).num_minutes());
        if let Some(title) = input.title {
            e.title = title.trim().to_string();
        }
        if let Some(description) = input.description {
            e.description = Some(description).filter(|s| !s.trim().is_empty());
        }
        if let Some(location) = input.location {
            e.location = Some(location).filter(|s| !s.trim().is_empty());
        }
        if let Some(category) = input.category {
            e.category = category;
        }
        if let Some(color) = input.color {
            e.color = color;
        }
        if let Some(priority) = input.priority {
            e.priority = priority;
        }
        if let Some(reminder) = input.reminder_min {
            e.reminder_min = reminder;
        }
        if let Some(completed) = input.completed {
            e.completed = completed;
        }
        Ok(e.clone())
    })?;

    tracing::info!(user_id = %user.id, schedule_id = %id, "Updated schedule");
    Ok(ok_with_message(updated, "schedule updated"))
}

#[derive(Debug, Default, Deserialize)]
pub struct CompleteInput {
    pub completed: Option<bool>,
}

// -----------------------------
// PATCH|PUT /api/schedules/:id/complete
// Sets the flag from the body, or toggles it when the body is absent
// -----------------------------
pub async fn complete_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<AppJson<CompleteInput>>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let requested = body.and_then(|AppJson(b)| b.completed);

    let updated = state.store.update(|db| {
        let Some(e) = db
            .schedules
            .iter_mut()
            .find(|e| e.id == id && e.owner == user.id)
        else {
            return Err(AppError::NotFound("schedule not found".to_string()));
        };
        e.completed = requested.unwrap_or(!e.completed);
        Ok(e.clone())
    })?;

    tracing::info!(user_id = %user.id, schedule_id = %id, completed = updated.completed, "Completion changed");
    Ok(ok_with_message(updated, "status updated"))
}

// -----------------------------
// DELETE /api/schedules/:id
// Notifications pointing at the entry are removed with it
// -----------------------------
pub async fn delete_schedule(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;

    state.store.update(|db| {
        let before = db.schedules.len();
        db.schedules.retain(|e| !(e.id == id && e.owner == user.id));
        if db.schedules.len() == before {
            return Err(AppError::NotFound("schedule not found".to_string()));
        }
        db.notifications
            .retain(|n| !(n.owner == user.id && n.schedule_id == Some(id)));
        Ok(())
    })?;

    tracing::info!(user_id = %user.id, schedule_id = %id, "Deleted schedule");
    Ok(done("schedule deleted"))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
}

// -----------------------------
// GET /api/schedules/search?keyword=...
// Case-insensitive, newest first
// -----------------------------
pub async fn search_schedules(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let keyword = q.keyword.unwrap_or_default().trim().to_lowercase();
    if keyword.is_empty() {
        return Err(AppError::BadRequest("keyword required".to_string()));
    }

    let mut found: Vec<ScheduleEntry> = state
        .store
        .list_entries(user.id, None)?
        .into_iter()
        .filter(|e| {
            e.title.to_lowercase().contains(&keyword)
                || e
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&keyword))
        })
        .collect();
    found.sort_by(|a, b| b.start.cmp(&a.start));

    Ok(ok(found))
}
