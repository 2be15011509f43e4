use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Local;
use log::debug;
use serde::Serialize;

use crate::app_state::{AppState, Session};
use crate::calendar::{CalendarCommand, CalendarProjector, CalendarView, DayDetail, MonthBuckets, Navigation};
use crate::error::BoardError;
use crate::models::task::parse_date;

#[derive(Debug, Serialize)]
pub struct CalendarResponse<'a> {
    pub view: CalendarView,
    pub month: &'a MonthBuckets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<DayDetail>,
    /// Present after a navigation; `false` when the step was not valid in
    /// the view it was sent from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<bool>,
}

/// Runs `step` against the caller's calendar after loading the scoped
/// tasks from a fresh snapshot, and renders the result.
///
/// Signed-in users keep their calendar between requests; anonymous callers
/// get a throwaway one showing the current month with no tasks.
fn render(data: &AppState, session: &Session, step: Option<Navigation>) -> HttpResponse {
    let tasks = session.scope().scope_tasks(&session.snapshot.tasks);
    let policy = data.config.undated_policy;
    let actor = session.actor.as_ref();
    let today = Local::now().date_naive();

    let respond = |projector: &mut CalendarProjector| {
        projector.replace_tasks(tasks, today);
        let applied = step.map(|step| projector.apply(step));
        HttpResponse::Ok().json(CalendarResponse {
            view: projector.view(),
            month: projector.visible_buckets(),
            day: projector.day_detail(actor),
            applied,
        })
    };

    match actor {
        Some(actor) => {
            let mut projector = data
                .calendars
                .entry(actor.id.clone())
                .or_insert_with(|| CalendarProjector::new(today, policy));
            respond(&mut *projector)
        }
        None => respond(&mut CalendarProjector::new(today, policy)),
    }
}

/// GET /calendar
pub async fn get_calendar(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    Ok(render(&data, &session, None))
}

/// POST /calendar/navigate
pub async fn navigate(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CalendarCommand>,
) -> Result<HttpResponse, BoardError> {
    let step = payload.into_inner().validate()?;
    debug!("Calendar step {:?}", step);
    let session = Session::load(&data, &req).await;
    Ok(render(&data, &session, Some(step)))
}

/// GET /calendar/day/{date}
pub async fn open_day(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BoardError> {
    let date = parse_date(&path).ok_or_else(|| BoardError::BadRequest(format!("invalid date {}", path.as_str())))?;
    let session = Session::load(&data, &req).await;
    Ok(render(&data, &session, Some(Navigation::OpenDay(date))))
}
