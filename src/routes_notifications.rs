// --------------------------------------------------
// Notification inbox and reminder generation.
// --------------------------------------------------

use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::envelope::{done, ok, ok_with_message};
use crate::error::{ApiResult, AppError};
use crate::extract::AppQuery;
use crate::models::{Notification, NotificationKind, OwnerId, ScheduleEntry};
use crate::routes_schedules::parse_id;
use crate::state::{now, AppState};
use crate::store::EntryRepository;
use crate::timerange::TimeRange;

/// How far ahead reminders are created, and how long one suppresses another.
pub const REMINDER_HORIZON_HOURS: i64 = 24;

fn default_limit() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub read: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub schedule_title: Option<String>,
    pub schedule_start_time: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Serialize)]
pub struct Inbox {
    pub notifications: Vec<NotificationView>,
    pub unread_count: usize,
}

// -----------------------------
// GET /api/notifications?read=false&limit=50
// Newest first, joined with the entry they point at
// -----------------------------
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let db = state.store.load()?;

    let mut mine: Vec<&Notification> = db.notifications.iter().filter(|n| n.owner == user.id).collect();
    let unread_count = mine.iter().filter(|n| !n.read).count();

    if let Some(read) = q.read {
        mine.retain(|n| n.read == read);
    }
    mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let notifications = mine
        .into_iter()
        .take(q.limit)
        .map(|n| {
            let entry = n
                .schedule_id
                .and_then(|id| db.schedules.iter().find(|e| e.id == id && e.owner == user.id));
            NotificationView {
                notification: n.clone(),
                schedule_title: entry.map(|e| e.title.clone()),
                schedule_start_time: entry.map(|e| e.start),
            }
        })
        .collect();

    Ok(ok(Inbox {
        notifications,
        unread_count,
    }))
}

// -----------------------------
// PATCH /api/notifications/:id/read
// -----------------------------
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    state.store.update(|db| {
        let Some(n) = db
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.owner == user.id)
        else {
            return Err(AppError::NotFound("notification not found".to_string()));
        };
        n.read = true;
        Ok(())
    })?;
    Ok(done("marked as read"))
}

// -----------------------------
// PATCH /api/notifications/read-all
// -----------------------------
pub async fn mark_all_read(State(state): State<AppState>, user: AuthUser) -> ApiResult<impl IntoResponse> {
    let changed = state.store.update(|db| {
        let mut changed = 0;
        for n in db.notifications.iter_mut().filter(|n| n.owner == user.id && !n.read) {
            n.read = true;
            changed += 1;
        }
        Ok::<_, AppError>(changed)
    })?;
    tracing::debug!(user_id = %user.id, changed, "Marked all notifications read");
    Ok(done("all notifications marked as read"))
}

// -----------------------------
// DELETE /api/notifications/:id
// -----------------------------
pub async fn delete_notification(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    state.store.update(|db| {
        let before = db.notifications.len();
        db.notifications.retain(|n| !(n.id == id && n.owner == user.id));
        if db.notifications.len() == before {
            return Err(AppError::NotFound("notification not found".to_string()));
        }
        Ok(())
    })?;
    Ok(done("notification deleted"))
}

/// Reminders for incomplete entries starting within the next 24 hours that
/// have not had a reminder in the last 24 hours.
pub fn due_reminders<Tz: TimeZone>(
    upcoming: &[ScheduleEntry],
    existing: &[Notification],
    owner: OwnerId,
    now: DateTime<FixedOffset>,
    tz: &Tz,
) -> Vec<Notification>
where
    Tz::Offset: std::fmt::Display,
{
    let horizon = now + Duration::hours(REMINDER_HORIZON_HOURS);
    let recent = now - Duration::hours(REMINDER_HORIZON_HOURS);

    upcoming
        .iter()
        .filter(|e| e.owner == owner && !e.completed)
        .filter(|e| e.start >= now && e.start <= horizon)
        .filter(|e| {
            !existing.iter().any(|n| {
                n.schedule_id == Some(e.id) && n.kind == NotificationKind::Reminder && n.created_at > recent
            })
        })
        .map(|e| Notification {
            id: Uuid::new_v4(),
            owner,
            schedule_id: Some(e.id),
            title: format!("Reminder: {}", e.title),
            message: format!(
                "You have \"{}\" at {}",
                e.title,
                e.start.with_timezone(tz).format("%H:%M %d/%m/%Y")
            ),
            kind: NotificationKind::Reminder,
            read: false,
            created_at: now,
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct ReminderQuery {
    pub tz: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedReminders {
    pub created: usize,
}

// -----------------------------
// POST /api/notifications/create-reminders
// -----------------------------
pub async fn create_reminders(
    State(state): State<AppState>,
    user: AuthUser,
    AppQuery(q): AppQuery<ReminderQuery>,
) -> ApiResult<impl IntoResponse> {
    let tz = state.timezone(q.tz.as_deref())?;
    let at = now();
    let window = TimeRange::new(at, at + Duration::hours(REMINDER_HORIZON_HOURS))?;
    let upcoming = state.store.list_entries(user.id, Some(window))?;

    let created = state.store.update(|db| {
        let fresh = due_reminders(&upcoming, &db.notifications, user.id, at, &tz);
        let n = fresh.len();
        db.notifications.extend(fresh);
        Ok::<_, AppError>(n)
    })?;

    tracing::info!(user_id = %user.id, created, "Created reminders");
    Ok(ok_with_message(
        CreatedReminders { created },
        format!("created {created} reminder(s)"),
    ))
}
