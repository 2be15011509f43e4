use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info};
use serde::Serialize;
use serde_json::json;

use crate::app_state::AppState;
use crate::auth::actor_id;
use crate::error::BoardError;
use crate::models::{Notification, NotificationKind, Task, TaskStatus, User};
use crate::storage::{resolve_actor, Storage};

/// Stores a notification. Failures are logged and swallowed so they never
/// undo the task operation that triggered them.
pub async fn send(storage: &dyn Storage, notification: Notification) {
    match storage.insert_notification(&notification).await {
        Ok(()) => info!(
            "Notification {:?} sent to {}",
            notification.kind, notification.user_id
        ),
        Err(e) => error!(
            "Error sending notification to {}: {}",
            notification.user_id, e
        ),
    }
}

pub async fn notify_assigned(storage: &dyn Storage, actor: &User, task: &Task) {
    if task.assignee_id == actor.id {
        return;
    }
    let message = format!("New task assigned: {}", task.title);
    send(
        storage,
        Notification::new(&task.assignee_id, NotificationKind::TaskAssigned, message, &task.id),
    )
    .await;
}

/// Tells the other party about a status change: the assignee when someone
/// else moved the task, otherwise its creator.
pub async fn notify_status_changed(storage: &dyn Storage, actor: &User, task: &Task, from: TaskStatus) {
    let recipient = if task.assignee_id != actor.id {
        Some(task.assignee_id.as_str())
    } else {
        task.created_by.as_deref().filter(|creator| *creator != actor.id)
    };
    let Some(recipient) = recipient else {
        return;
    };
    let message = format!("Task status updated: {} ({} -> {})", task.title, from, task.status);
    send(
        storage,
        Notification::new(recipient, NotificationKind::StatusChanged, message, &task.id),
    )
    .await;
}

/// The caller's account, or `None` when the token names nobody that exists.
async fn signed_in(req: &HttpRequest, data: &AppState) -> Option<User> {
    resolve_actor(data.storage.as_ref(), actor_id(req).as_deref()).await
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: usize,
}

/// GET /notifications
pub async fn list_notifications(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, BoardError> {
    let Some(actor) = signed_in(&req, &data).await else {
        return Ok(HttpResponse::Ok().json(Vec::<Notification>::new()));
    };
    let feed = feed_for(&data, &actor.id).await;
    Ok(HttpResponse::Ok().json(feed))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, BoardError> {
    let unread = match signed_in(&req, &data).await {
        Some(actor) => feed_for(&data, &actor.id)
            .await
            .iter()
            .filter(|n| !n.is_read)
            .count(),
        None => 0,
    };
    Ok(HttpResponse::Ok().json(UnreadCount { unread }))
}

async fn feed_for(data: &AppState, user_id: &str) -> Vec<Notification> {
    data.storage
        .fetch_notifications(user_id, data.config.notification_limit)
        .await
        .unwrap_or_else(|e| {
            error!("Error fetching notifications for {}: {}", user_id, e);
            Vec::new()
        })
}

/// POST /notifications/{id}/read
pub async fn mark_read(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BoardError> {
    let user_id = signed_in(&req, &data)
        .await
        .map(|actor| actor.id)
        .ok_or(BoardError::PermissionDenied("sign in required"))?;
    let notification_id = path.into_inner();
    if !data.storage.mark_notification_read(&user_id, &notification_id).await? {
        return Err(BoardError::NotFound("notification"));
    }
    Ok(HttpResponse::Ok().json(json!({ "status": "read" })))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, BoardError> {
    let user_id = signed_in(&req, &data)
        .await
        .map(|actor| actor.id)
        .ok_or(BoardError::PermissionDenied("sign in required"))?;
    let marked = data.storage.mark_all_notifications_read(&user_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "marked": marked })))
}

/// DELETE /notifications/{id}
pub async fn delete_notification(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BoardError> {
    let user_id = signed_in(&req, &data)
        .await
        .map(|actor| actor.id)
        .ok_or(BoardError::PermissionDenied("sign in required"))?;
    let notification_id = path.into_inner();
    if !data.storage.delete_notification(&user_id, &notification_id).await? {
        return Err(BoardError::NotFound("notification"));
    }
    info!("Notification {} deleted by {}", notification_id, user_id);
    Ok(HttpResponse::Ok().json(json!({ "status": "Notification deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn status_change_notifies_the_other_party() {
        let storage = MemoryStorage::default();
        let lead = User::new("lead", "Lee", Role::TeamLeader);
        let worker = User::new("u1", "Ana", Role::Employee);
        let mut task = Task::new("t1", "Cut teaser", "u1").with_status(TaskStatus::InProgress);
        task.created_by = Some("lead".into());

        notify_status_changed(&storage, &lead, &task, TaskStatus::Pending).await;
        notify_status_changed(&storage, &worker, &task, TaskStatus::Pending).await;

        let to_worker = storage.fetch_notifications("u1", 20).await.unwrap();
        let to_lead = storage.fetch_notifications("lead", 20).await.unwrap();
        assert_eq!(to_worker.len(), 1);
        assert_eq!(to_lead.len(), 1);
        assert_eq!(to_lead[0].kind, NotificationKind::StatusChanged);
        assert!(to_lead[0].message.contains("Pending -> In Progress"));
    }

    #[tokio::test]
    async fn self_assigned_tasks_do_not_notify() {
        let storage = MemoryStorage::default();
        let worker = User::new("u1", "Ana", Role::Employee);
        let task = Task::new("t1", "Edit reel", "u1");
        notify_assigned(&storage, &worker, &task).await;
        notify_status_changed(&storage, &worker, &task, TaskStatus::Done).await;
        assert!(storage.fetch_notifications("u1", 20).await.unwrap().is_empty());
    }
}
