// Analysis core (pure, no I/O)
pub mod timerange; // Half-open ranges and timezone-aware wall-clock helpers
pub mod free_slots; // Free slot finder over working hours
pub mod aggregate; // Rolling window statistics
pub mod statistics; // Dashboard counters and charts
pub mod advice; // Intent classification and advice templates
pub mod insights; // Habit report and insight cards
pub mod planner; // Goal advice and weekly plan templates
pub mod patterns; // Recurring activity detection

// Boundary
pub mod models; // Data structures (ScheduleEntry, User, Db, etc.)
pub mod error;
pub mod envelope;
pub mod extract;
pub mod config;
pub mod store; // Persistent storage (db.json)
pub mod auth;
pub mod state;

// HTTP handlers
pub mod routes_auth;
pub mod routes_user;
pub mod routes_schedules;
pub mod routes_notifications;
pub mod routes_statistics;
pub mod routes_ai;
pub mod routes_personal_ai;

#[cfg(test)]
mod testutil;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::envelope::done;
use crate::state::AppState;

async fn health() -> axum::Json<envelope::Envelope<()>> {
    done("ok")
}

/// All API routes under `/api`, the static frontend for everything else.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        // auth
        .route("/auth/register", post(routes_auth::register))
        .route("/auth/login", post(routes_auth::login))
        .route("/auth/me", get(routes_auth::me))
        .route("/auth/change-password", post(routes_auth::change_password))
        .route("/auth/logout", post(routes_auth::logout))
        // user
        .route(
            "/user/profile",
            get(routes_user::get_profile).put(routes_user::update_profile),
        )
        // schedules
        .route(
            "/schedules",
            get(routes_schedules::list_schedules).post(routes_schedules::create_schedule),
        )
        .route("/schedules/search", get(routes_schedules::search_schedules))
        .route(
            "/schedules/:id",
            put(routes_schedules::update_schedule).delete(routes_schedules::delete_schedule),
        )
        .route(
            "/schedules/:id/complete",
            patch(routes_schedules::complete_schedule).put(routes_schedules::complete_schedule),
        )
        // notifications
        .route("/notifications", get(routes_notifications::list_notifications))
        .route("/notifications/read-all", patch(routes_notifications::mark_all_read))
        .route("/notifications/create-reminders", post(routes_notifications::create_reminders))
        .route("/notifications/:id/read", patch(routes_notifications::mark_read))
        .route("/notifications/:id", delete(routes_notifications::delete_notification))
        // statistics
        .route("/statistics/overview", get(routes_statistics::get_overview))
        .route("/statistics/daily-chart", get(routes_statistics::get_daily_chart))
        .route("/statistics/type-distribution", get(routes_statistics::get_type_distribution))
        .route("/statistics/weekly-comparison", get(routes_statistics::get_weekly_comparison))
        // assistant
        .route("/ai/chat", post(routes_ai::chat))
        .route("/ai/generate-schedule", post(routes_ai::generate_schedule))
        .route("/ai/analyze-performance", get(routes_ai::analyze))
        .route("/ai/suggestions", get(routes_ai::suggestions))
        // personal assistant
        .route("/personal-ai/chat", post(routes_ai::chat))
        .route("/personal-ai/analyze-habits", get(routes_personal_ai::analyze_habits))
        .route("/personal-ai/personal-advice", post(routes_personal_ai::get_personal_advice))
        .route("/personal-ai/create-personal-plan", post(routes_personal_ai::create_personal_plan))
        .route("/personal-ai/smart-reminders", get(routes_personal_ai::get_smart_reminders));

    let static_dir = state.config.static_dir.clone();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
