//! Persistence behind the dashboard.
//!
//! Two backends implement [`Storage`]: [`MongoStorage`] for deployments and
//! [`MemoryStorage`] for local mode and tests. Handlers never talk to a
//! backend directly for reads; they go through [`Snapshot::load`], which
//! turns any failed fetch into an empty list so a flaky backend yields an
//! empty board instead of an error page.

mod memory;
mod mongo;

use async_trait::async_trait;
use log::error;

use crate::error::BoardError;
use crate::models::{Client, Group, GroupName, Notification, Task, User};

pub use memory::MemoryStorage;
pub use mongo::MongoStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, BoardError>;
    async fn fetch_clients(&self) -> Result<Vec<Client>, BoardError>;
    /// Every account, regardless of role. Role filtering happens in `AccessScope`.
    async fn fetch_employees(&self) -> Result<Vec<User>, BoardError>;
    async fn fetch_current_actor(&self, user_id: &str) -> Result<Option<User>, BoardError>;
    async fn fetch_groups(&self) -> Result<Vec<Group>, BoardError>;

    async fn insert_task(&self, task: &Task) -> Result<(), BoardError>;
    /// Returns `false` when no task has that id.
    async fn update_task(&self, task: &Task) -> Result<bool, BoardError>;
    async fn delete_task(&self, task_id: &str) -> Result<bool, BoardError>;

    async fn insert_client(&self, client: &Client) -> Result<(), BoardError>;
    async fn update_client(&self, client: &Client) -> Result<bool, BoardError>;
    async fn delete_client(&self, client_id: &str) -> Result<bool, BoardError>;

    async fn update_user(&self, user: &User) -> Result<bool, BoardError>;
    async fn delete_user(&self, user_id: &str) -> Result<bool, BoardError>;

    async fn insert_group(&self, group: &Group) -> Result<(), BoardError>;
    /// Renames the group and moves its members to the new name.
    /// Returns the number of members moved, or `None` if the group is unknown.
    async fn rename_group(&self, group_id: &str, name: &GroupName) -> Result<Option<u64>, BoardError>;

    /// Newest first.
    async fn fetch_notifications(&self, user_id: &str, limit: i64) -> Result<Vec<Notification>, BoardError>;
    async fn insert_notification(&self, notification: &Notification) -> Result<(), BoardError>;
    async fn mark_notification_read(&self, user_id: &str, notification_id: &str) -> Result<bool, BoardError>;
    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, BoardError>;
    async fn delete_notification(&self, user_id: &str, notification_id: &str) -> Result<bool, BoardError>;
}

/// One consistent read of the three collections scoping works on.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub clients: Vec<Client>,
    pub users: Vec<User>,
}

impl Snapshot {
    pub async fn load(storage: &dyn Storage) -> Self {
        let (tasks, clients, users) = futures::join!(
            storage.fetch_tasks(),
            storage.fetch_clients(),
            storage.fetch_employees(),
        );
        Snapshot {
            tasks: or_empty("tasks", tasks),
            clients: or_empty("clients", clients),
            users: or_empty("users", users),
        }
    }
}

fn or_empty<T>(what: &str, fetched: Result<Vec<T>, BoardError>) -> Vec<T> {
    fetched.unwrap_or_else(|e| {
        error!("Error fetching {}: {}", what, e);
        Vec::new()
    })
}

/// Resolves the authenticated user id to an account.
///
/// A missing id, an unknown id, or a failed lookup all resolve to `None`,
/// which scoping treats as "sees nothing".
pub async fn resolve_actor(storage: &dyn Storage, user_id: Option<&str>) -> Option<User> {
    let user_id = user_id?;
    match storage.fetch_current_actor(user_id).await {
        Ok(actor) => actor,
        Err(e) => {
            error!("Error resolving actor {}: {}", user_id, e);
            None
        }
    }
}
