use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info};
use serde::Serialize;
use uuid::Uuid;

use crate::app_state::{AppState, Session};
use crate::error::BoardError;
use crate::models::team::{CreateGroupRequest, RenameGroupRequest};
use crate::models::{Group, GroupName, Role, User};
use crate::user_management::EmployeeInfo;

/// Groups the actor may browse: all of them for Admin, their own group for
/// other rostered roles, none otherwise.
pub fn visible_groups(actor: Option<&User>, groups: Vec<Group>) -> Vec<Group> {
    match actor {
        Some(actor) if actor.role == Role::Admin => groups,
        Some(actor) if actor.role.is_rostered() => match &actor.team {
            Some(team) => groups.into_iter().filter(|g| &g.name == team).collect(),
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}

async fn load_groups(data: &AppState) -> Vec<Group> {
    data.storage.fetch_groups().await.unwrap_or_else(|e| {
        error!("Error fetching groups: {}", e);
        Vec::new()
    })
}

fn parse_name(raw: &str) -> Result<GroupName, BoardError> {
    GroupName::new(raw).ok_or_else(|| BoardError::BadRequest("group name is required".into()))
}

/// GET /groups
pub async fn list_groups(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let groups = visible_groups(session.actor.as_ref(), load_groups(&data).await);
    Ok(HttpResponse::Ok().json(groups))
}

/// POST /groups
pub async fn create_group(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CreateGroupRequest>,
) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let admin = session.require_admin()?;
    let payload = payload.into_inner();
    let name = parse_name(&payload.name)?;

    let existing = data.storage.fetch_groups().await?;
    if existing.iter().any(|g| g.name == name) {
        return Err(BoardError::BadRequest(format!("group {name} already exists")));
    }

    let group = Group {
        id: Uuid::new_v4().to_string(),
        name,
        description: payload.description.filter(|d| !d.trim().is_empty()),
    };
    data.storage.insert_group(&group).await?;
    info!("Group created: {} ({}) by {}", group.name, group.id, admin.id);
    Ok(HttpResponse::Created().json(group))
}

#[derive(Debug, Serialize)]
pub struct RenamedGroup {
    #[serde(flatten)]
    pub group: Group,
    pub members_moved: u64,
}

/// PUT /groups/{id}
///
/// Members are linked by name, so the rename carries every member along.
pub async fn rename_group(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<RenameGroupRequest>,
) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let admin = session.require_admin()?;
    let group_id = path.into_inner();
    let name = parse_name(&payload.name)?;

    let groups = data.storage.fetch_groups().await?;
    let mut group = groups
        .iter()
        .find(|g| g.id == group_id)
        .cloned()
        .ok_or(BoardError::NotFound("group"))?;
    if groups.iter().any(|g| g.id != group_id && g.name == name) {
        return Err(BoardError::BadRequest(format!("group {name} already exists")));
    }

    let members_moved = data
        .storage
        .rename_group(&group_id, &name)
        .await?
        .ok_or(BoardError::NotFound("group"))?;
    info!(
        "Group {} renamed to {} by {}, {} members moved",
        group_id, name, admin.id, members_moved
    );
    group.name = name;
    Ok(HttpResponse::Ok().json(RenamedGroup { group, members_moved }))
}

/// GET /groups/{id}/members
pub async fn group_members(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let groups = visible_groups(session.actor.as_ref(), load_groups(&data).await);
    let group = groups
        .into_iter()
        .find(|g| g.id == *path)
        .ok_or(BoardError::NotFound("group"))?;

    let members: Vec<EmployeeInfo> = session
        .scope()
        .scope_employees()
        .into_iter()
        .filter(|u| u.belongs_to(&group.name))
        .map(EmployeeInfo::from)
        .collect();
    Ok(HttpResponse::Ok().json(members))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<Group> {
        ["Alpha", "Beta"]
            .iter()
            .enumerate()
            .map(|(i, name)| Group {
                id: format!("g{i}"),
                name: GroupName::new(*name).unwrap(),
                description: None,
            })
            .collect()
    }

    #[test]
    fn group_visibility_follows_role() {
        let admin = User::new("admin", "Ada", Role::Admin);
        let lead = User::new("lead", "Lee", Role::TeamLeader).with_team("Beta");
        let loner = User::new("u9", "Sol", Role::Employee);
        let client = User::new("c1", "Acme", Role::Client).with_team("Alpha");

        assert_eq!(visible_groups(Some(&admin), groups()).len(), 2);
        let mine = visible_groups(Some(&lead), groups());
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name.as_str(), "Beta");
        assert!(visible_groups(Some(&loner), groups()).is_empty());
        assert!(visible_groups(Some(&client), groups()).is_empty());
        assert!(visible_groups(None, groups()).is_empty());
    }
}
