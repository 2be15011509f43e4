use std::sync::Arc;

use actix_web::HttpRequest;
use dashmap::DashMap;

use crate::auth::actor_id;
use crate::calendar::CalendarProjector;
use crate::config::Config;
use crate::error::BoardError;
use crate::models::{Role, Task, User};
use crate::scope::AccessScope;
use crate::storage::{resolve_actor, Snapshot, Storage};

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: Config,
    /// One calendar per authenticated user, keyed by user id.
    pub calendars: Arc<DashMap<String, CalendarProjector>>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Self {
        AppState {
            storage,
            config,
            calendars: Arc::new(DashMap::new()),
        }
    }
}

/// Per-request view of the world: a fresh snapshot and the resolved actor.
pub struct Session {
    pub snapshot: Snapshot,
    pub actor: Option<User>,
}

impl Session {
    pub async fn load(data: &AppState, req: &HttpRequest) -> Self {
        let user_id = actor_id(req);
        let storage = data.storage.as_ref();
        let (snapshot, actor) = futures::join!(
            Snapshot::load(storage),
            resolve_actor(storage, user_id.as_deref()),
        );
        Session { snapshot, actor }
    }

    pub fn scope(&self) -> AccessScope<'_> {
        AccessScope::new(self.actor.as_ref(), &self.snapshot.users)
    }

    pub fn require_actor(&self) -> Result<&User, BoardError> {
        self.actor
            .as_ref()
            .ok_or(BoardError::PermissionDenied("sign in required"))
    }

    pub fn require_admin(&self) -> Result<&User, BoardError> {
        match self.require_actor()? {
            actor if actor.role == Role::Admin => Ok(actor),
            _ => Err(BoardError::PermissionDenied("admin only")),
        }
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.snapshot.tasks.iter().find(|t| t.id == task_id)
    }
}
