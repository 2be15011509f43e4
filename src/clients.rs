use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::info;
use serde_json::json;
use uuid::Uuid;

use crate::app_state::{AppState, Session};
use crate::error::BoardError;
use crate::models::client::{CreateClientRequest, UpdateClientRequest};
use crate::models::{Client, ClientStatus, Role};

/// Status a new client starts in, or `None` if the role may not add clients.
pub fn initial_status(role: Role) -> Option<ClientStatus> {
    match role {
        Role::Admin | Role::TeamLeader => Some(ClientStatus::Approved),
        Role::Employee | Role::Manager => Some(ClientStatus::Pending),
        Role::Client | Role::Unknown => None,
    }
}

/// GET /clients
pub async fn list_clients(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let clients = session
        .scope()
        .scope_clients(&session.snapshot.clients, &session.snapshot.tasks);
    Ok(HttpResponse::Ok().json(clients))
}

/// POST /clients
pub async fn create_client(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateClientRequest>,
) -> Result<HttpResponse, BoardError> {
    let payload = payload.into_inner();
    let session = Session::load(&data, &req).await;
    let actor = session.require_actor()?;
    let status = initial_status(actor.role).ok_or(BoardError::PermissionDenied("cannot add clients"))?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(BoardError::BadRequest("client name is required".into()));
    }

    let client = Client {
        email: payload.email,
        phone: payload.phone,
        address: payload.address,
        company: payload.company,
        status,
        created_at: Some(Utc::now()),
        ..Client::new(Uuid::new_v4().to_string(), name)
    };
    data.storage.insert_client(&client).await?;
    info!("Client created: {} ({:?}) by {}", client.id, client.status, actor.id);
    Ok(HttpResponse::Created().json(client))
}

async fn find_client(data: &AppState, client_id: &str) -> Result<Client, BoardError> {
    data.storage
        .fetch_clients()
        .await?
        .into_iter()
        .find(|c| c.id == client_id)
        .ok_or(BoardError::NotFound("client"))
}

/// PUT /clients/{id}
pub async fn update_client(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateClientRequest>,
) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    session.require_admin()?;
    let mut client = find_client(&data, &path).await?;
    payload.into_inner().apply_to(&mut client);
    if client.name.trim().is_empty() {
        return Err(BoardError::BadRequest("client name is required".into()));
    }
    data.storage.update_client(&client).await?;
    Ok(HttpResponse::Ok().json(client))
}

/// POST /clients/{id}/approve
pub async fn approve_client(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let admin = session.require_admin()?;
    let mut client = find_client(&data, &path).await?;
    client.status = ClientStatus::Approved;
    data.storage.update_client(&client).await?;
    info!("Client approved: {} by {}", client.id, admin.id);
    Ok(HttpResponse::Ok().json(client))
}

/// DELETE /clients/{id}
///
/// Tasks that reference the client are left as they are.
pub async fn delete_client(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let admin = session.require_admin()?;
    let client_id = path.into_inner();
    if !data.storage.delete_client(&client_id).await? {
        return Err(BoardError::NotFound("client"));
    }
    info!("Client deleted: {} by {}", client_id, admin.id);
    Ok(HttpResponse::Ok().json(json!({ "status": "Client deleted" })))
}
