use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use serde::Serialize;
use serde_json::json;

use crate::app_state::{AppState, Session};
use crate::error::BoardError;
use crate::models::user::UpdateEmployeeRequest;
use crate::models::{GroupName, Role, User};
use crate::scope::can_assign_role;

/// Roster entry as shown in assignment dropdowns.
#[derive(Debug, Serialize)]
pub struct EmployeeInfo {
    #[serde(flatten)]
    pub user: User,
    pub initials: String,
}

impl From<User> for EmployeeInfo {
    fn from(user: User) -> Self {
        let initials = user.initials();
        EmployeeInfo { user, initials }
    }
}

/// GET /employees
pub async fn list_employees(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let roster: Vec<EmployeeInfo> = session
        .scope()
        .scope_employees()
        .into_iter()
        .map(EmployeeInfo::from)
        .collect();
    Ok(HttpResponse::Ok().json(roster))
}

/// Applies `update` to `target` on behalf of `actor`.
///
/// Anyone may rename themselves; every other change, including moving a
/// user between groups, needs the right to assign roles.
pub fn apply_employee_update(
    actor: &User,
    target: &mut User,
    update: UpdateEmployeeRequest,
) -> Result<(), BoardError> {
    if update.name.is_none() && update.role.is_none() && update.team.is_none() {
        return Err(BoardError::BadRequest("nothing to update".into()));
    }
    if update.role == Some(Role::Unknown) {
        return Err(BoardError::BadRequest("unknown role".into()));
    }
    if update.role.is_some() || update.team.is_some() {
        let role = update.role.unwrap_or(target.role);
        if !can_assign_role(Some(actor), role) {
            return Err(BoardError::PermissionDenied("only an admin may change roles or groups"));
        }
    } else if actor.id != target.id && actor.role != Role::Admin {
        return Err(BoardError::PermissionDenied("cannot edit another user"));
    }

    if let Some(name) = update.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(BoardError::BadRequest("name is required".into()));
        }
        target.name = name.to_string();
    }
    if let Some(role) = update.role {
        target.role = role;
    }
    if let Some(team) = update.team {
        target.team = GroupName::new(team);
    }
    Ok(())
}

/// PUT /employees/{id}
pub async fn update_employee(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateEmployeeRequest>,
) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let actor = session.require_actor()?;
    let mut target = session
        .snapshot
        .users
        .iter()
        .find(|u| u.id == *path)
        .cloned()
        .ok_or(BoardError::NotFound("employee"))?;

    apply_employee_update(actor, &mut target, payload.into_inner())?;
    if !data.storage.update_user(&target).await? {
        return Err(BoardError::NotFound("employee"));
    }
    info!("Employee {} updated by {}", target.id, actor.id);
    Ok(HttpResponse::Ok().json(EmployeeInfo::from(target)))
}

/// DELETE /employees/{id}
pub async fn delete_employee(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, BoardError> {
    let session = Session::load(&data, &req).await;
    let admin = session.require_admin()?;
    let user_id = path.into_inner();
    if user_id == admin.id {
        return Err(BoardError::BadRequest("cannot delete your own account".into()));
    }
    if !data.storage.delete_user(&user_id).await? {
        return Err(BoardError::NotFound("employee"));
    }
    info!("Employee {} deleted by {}", user_id, admin.id);
    Ok(HttpResponse::Ok().json(json!({ "status": "Employee deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: Option<&str>, role: Option<Role>, team: Option<&str>) -> UpdateEmployeeRequest {
        UpdateEmployeeRequest {
            name: name.map(String::from),
            role,
            team: team.map(String::from),
        }
    }

    #[test]
    fn admin_can_promote_and_regroup() {
        let admin = User::new("admin", "Ada", Role::Admin);
        let mut target = User::new("u1", "Ana", Role::Employee).with_team("Alpha");
        apply_employee_update(&admin, &mut target, request(None, Some(Role::TeamLeader), Some("Beta"))).unwrap();
        assert_eq!(target.role, Role::TeamLeader);
        assert_eq!(target.team, GroupName::new("Beta"));

        apply_employee_update(&admin, &mut target, request(None, None, Some(""))).unwrap();
        assert_eq!(target.team, None);
    }

    #[test]
    fn non_admins_cannot_escalate() {
        let lead = User::new("lead", "Lee", Role::TeamLeader).with_team("Alpha");
        let mut target = User::new("u1", "Ana", Role::Employee).with_team("Alpha");
        for update in [
            request(None, Some(Role::Admin), None),
            request(None, None, Some("Beta")),
            request(Some("Renamed"), None, None),
        ] {
            assert!(matches!(
                apply_employee_update(&lead, &mut target, update),
                Err(BoardError::PermissionDenied(_))
            ));
        }
        assert_eq!(target.name, "Ana");
    }

    #[test]
    fn users_can_rename_themselves() {
        let mut me = User::new("u1", "Ana", Role::Employee);
        let actor = me.clone();
        apply_employee_update(&actor, &mut me, request(Some(" Ana Lima "), None, None)).unwrap();
        assert_eq!(me.name, "Ana Lima");
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let admin = User::new("admin", "Ada", Role::Admin);
        let mut target = User::new("u1", "Ana", Role::Employee);
        assert!(matches!(
            apply_employee_update(&admin, &mut target, request(None, Some(Role::Unknown), None)),
            Err(BoardError::BadRequest(_))
        ));
    }
}
