use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::{info, warn};
use serde_json::json;
use uuid::Uuid;

use crate::app_state::{AppState, Session};
use crate::error::BoardError;
use crate::models::task::{CreateTaskRequest, TaskListQuery};
use crate::models::{Task, TaskStatus, TaskUpdate};
use crate::notifications::{notify_assigned, notify_status_changed};

fn warn_if_deadline_precedes_start(task: &Task) {
    if let (Some(assigned), Some(deadline)) = (task.assigned_date, task.deadline) {
        if deadline < assigned {
            warn!(
                "Task {} has deadline {} before its assigned date {}",
                task.id, deadline, assigned
            );
        }
    }
}

/// GET /tasks?status=
pub async fn list_tasks(
    req: HttpRequest,
    data: web::Data<AppState>,
    query: web::Query<TaskListQuery>,
) -> Result<HttpResponse, BoardError> {
    let status = match query.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(slug) => Some(
            TaskStatus::from_filter(slug)
                .ok_or_else(|| BoardError::BadRequest(format!("unknown status filter {slug}")))?,
        ),
    };

    let session = Session::load(&data, &req).await;
    let tasks: Vec<Task> = session
        .scope()
        .scope_tasks(&session.snapshot.tasks)
        .into_iter()
        .filter(|t| status.map_or(true, |s| t.status == s))
        .collect();
    Ok(HttpResponse::Ok().json(tasks))
}

/// GET /tasks/{id}
pub async fn get_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BoardError> {
    let task_id = path.into_inner();
    let session = Session::load(&data, &req).await;
    match session.find_task(&task_id) {
        Some(task) if session.scope().can_view_task(task) => Ok(HttpResponse::Ok().json(task)),
        _ => Err(BoardError::NotFound("task")),
    }
}

/// POST /tasks
pub async fn create_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, BoardError> {
    let payload = payload.into_inner();
    let session = Session::load(&data, &req).await;
    let actor = session.require_actor()?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(BoardError::BadRequest("title is required".into()));
    }
    let assignee_id = payload
        .assignee_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| actor.id.clone());
    if !session.scope().can_create_task(&assignee_id) {
        return Err(BoardError::PermissionDenied("cannot assign tasks to this user"));
    }

    let task = Task {
        id: Uuid::new_v4().to_string(),
        title: title.to_string(),
        project: payload.project.filter(|p| !p.trim().is_empty()),
        stage: payload.stage,
        status: payload.status.unwrap_or_default(),
        priority: payload.priority.unwrap_or_default(),
        client_id: payload.client_id.filter(|id| !id.is_empty()),
        assignee_id,
        assigned_date: payload.assigned_date,
        deadline: payload.deadline.or(payload.assigned_date),
        created_by: Some(actor.id.clone()),
        created_at: Some(Utc::now()),
    };
    warn_if_deadline_precedes_start(&task);

    data.storage.insert_task(&task).await?;
    info!("Task created: {} by {}", task.id, actor.id);
    notify_assigned(data.storage.as_ref(), actor, &task).await;

    Ok(HttpResponse::Created().json(task))
}

/// PUT /tasks/{id}
pub async fn update_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<TaskUpdate>,
) -> Result<HttpResponse, BoardError> {
    let task_id = path.into_inner();
    let update = payload.into_inner();
    if update.is_empty() {
        return Err(BoardError::BadRequest("nothing to update".into()));
    }

    let session = Session::load(&data, &req).await;
    let actor = session.require_actor()?;
    let scope = session.scope();
    let task = match session.find_task(&task_id) {
        Some(task) if scope.can_view_task(task) => task,
        _ => return Err(BoardError::NotFound("task")),
    };
    if !scope.can_apply_update(task, &update) {
        return Err(BoardError::PermissionDenied("not allowed to make this change"));
    }

    let reassigned = update.reassigns(task).is_some();
    let previous_status = task.status;
    let mut updated = task.clone();
    update.apply_to(&mut updated);
    warn_if_deadline_precedes_start(&updated);

    if !data.storage.update_task(&updated).await? {
        return Err(BoardError::NotFound("task"));
    }
    info!("Task updated: {} by {}", updated.id, actor.id);

    let storage = data.storage.as_ref();
    if reassigned {
        notify_assigned(storage, actor, &updated).await;
    }
    if updated.status != previous_status {
        notify_status_changed(storage, actor, &updated, previous_status).await;
    }

    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BoardError> {
    let task_id = path.into_inner();
    let session = Session::load(&data, &req).await;
    let actor = session.require_actor()?;
    let scope = session.scope();
    let task = match session.find_task(&task_id) {
        Some(task) if scope.can_view_task(task) => task,
        _ => return Err(BoardError::NotFound("task")),
    };
    if !scope.can_delete_task(task) {
        return Err(BoardError::PermissionDenied("not allowed to delete this task"));
    }

    if !data.storage.delete_task(&task.id).await? {
        return Err(BoardError::NotFound("task"));
    }
    info!("Task deleted: {} by {}", task.id, actor.id);
    Ok(HttpResponse::Ok().json(json!({ "status": "Task deleted" })))
}
