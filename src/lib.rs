//! Role-scoped task dashboard for a content agency.
//!
//! The core is [`scope::AccessScope`], which decides what each user may see
//! and change, and [`calendar::CalendarProjector`], which lays a scoped task
//! list out on a month grid. The HTTP handlers load a fresh snapshot from
//! [`storage::Storage`] on every request and compose the two.

pub mod app_state;
pub mod auth;
pub mod calendar;
pub mod calendar_view;
pub mod clients;
pub mod config;
pub mod dashboard_data;
pub mod error;
pub mod models;
pub mod notifications;
pub mod scope;
pub mod storage;
pub mod task_board;
pub mod team_management;
pub mod user_management;

use actix_web::web;

pub use app_state::AppState;

/// Registers every route. Auth is applied by the caller with
/// [`auth::Authentication`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // TASKS
        .service(
            web::scope("/tasks")
                .route("", web::get().to(task_board::list_tasks))
                .route("", web::post().to(task_board::create_task))
                .route("/{id}", web::get().to(task_board::get_task))
                .route("/{id}", web::put().to(task_board::update_task))
                .route("/{id}", web::delete().to(task_board::delete_task)),
        )
        // CLIENTS
        .service(
            web::scope("/clients")
                .route("", web::get().to(clients::list_clients))
                .route("", web::post().to(clients::create_client))
                .route("/{id}", web::put().to(clients::update_client))
                .route("/{id}", web::delete().to(clients::delete_client))
                .route("/{id}/approve", web::post().to(clients::approve_client)),
        )
        // EMPLOYEES
        .service(
            web::scope("/employees")
                .route("", web::get().to(user_management::list_employees))
                .route("/{id}", web::put().to(user_management::update_employee))
                .route("/{id}", web::delete().to(user_management::delete_employee)),
        )
        // GROUPS
        .service(
            web::scope("/groups")
                .route("", web::get().to(team_management::list_groups))
                .route("", web::post().to(team_management::create_group))
                .route("/{id}", web::put().to(team_management::rename_group))
                .route("/{id}/members", web::get().to(team_management::group_members)),
        )
        // CALENDAR
        .service(
            web::scope("/calendar")
                .route("", web::get().to(calendar_view::get_calendar))
                .route("/navigate", web::post().to(calendar_view::navigate))
                .route("/day/{date}", web::get().to(calendar_view::open_day)),
        )
        // NOTIFICATIONS
        .service(
            web::scope("/notifications")
                .route("", web::get().to(notifications::list_notifications))
                .route("/unread-count", web::get().to(notifications::unread_count))
                .route("/read-all", web::post().to(notifications::mark_all_read))
                .route("/{id}/read", web::post().to(notifications::mark_read))
                .route("/{id}", web::delete().to(notifications::delete_notification)),
        )
        .route("/stats", web::get().to(dashboard_data::get_stats))
        .route("/stats/timeline", web::get().to(dashboard_data::get_timeline));
}
