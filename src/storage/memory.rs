use async_trait::async_trait;
use chrono::Utc;
use log::info;
use tokio::sync::RwLock;

use super::Storage;
use crate::error::BoardError;
use crate::models::{Client, ClientStatus, Group, GroupName, Notification, Role, Task, User};

/// Process-local tables, used for `STORAGE_BACKEND=memory` and in tests.
#[derive(Default)]
pub struct MemoryStorage {
    users: RwLock<Vec<User>>,
    tasks: RwLock<Vec<Task>>,
    clients: RwLock<Vec<Client>>,
    groups: RwLock<Vec<Group>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStorage {
    pub fn new(users: Vec<User>, tasks: Vec<Task>, clients: Vec<Client>) -> Self {
        MemoryStorage {
            users: RwLock::new(users),
            tasks: RwLock::new(tasks),
            clients: RwLock::new(clients),
            ..MemoryStorage::default()
        }
    }

    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        *self.groups.get_mut() = groups;
        self
    }

    /// Seed for local mode: one admin, one employee so assignment dropdowns
    /// are never empty, and one approved client.
    pub fn with_sample_data() -> Self {
        info!("Seeding in-memory storage with sample data");
        let users = vec![
            User::new("admin", "Admin", Role::Admin).with_email("admin@agency.com"),
            User::new("emp_default", "Default Employee", Role::Employee).with_email("employee@agency.com"),
        ];
        let acme = Client {
            email: Some("contact@acme.com".into()),
            phone: Some("555-0123".into()),
            address: Some("123 Tech Park".into()),
            status: ClientStatus::Approved,
            created_at: Some(Utc::now()),
            ..Client::new("client_acme", "Acme Corp")
        };
        MemoryStorage::new(users, Vec::new(), vec![acme])
    }
}

fn replace_by_id<T>(rows: &mut [T], id: &str, key: impl Fn(&T) -> &str, row: &T) -> bool
where
    T: Clone,
{
    match rows.iter_mut().find(|r| key(r) == id) {
        Some(slot) => {
            *slot = row.clone();
            true
        }
        None => false,
    }
}

fn remove_by_id<T>(rows: &mut Vec<T>, id: &str, key: impl Fn(&T) -> &str) -> bool {
    let before = rows.len();
    rows.retain(|r| key(r) != id);
    rows.len() != before
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, BoardError> {
        Ok(self.tasks.read().await.clone())
    }

    async fn fetch_clients(&self) -> Result<Vec<Client>, BoardError> {
        Ok(self.clients.read().await.clone())
    }

    async fn fetch_employees(&self) -> Result<Vec<User>, BoardError> {
        Ok(self.users.read().await.clone())
    }

    async fn fetch_current_actor(&self, user_id: &str) -> Result<Option<User>, BoardError> {
        Ok(self.users.read().await.iter().find(|u| u.id == user_id).cloned())
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>, BoardError> {
        let mut groups = self.groups.read().await.clone();
        groups.sort_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        Ok(groups)
    }

    async fn insert_task(&self, task: &Task) -> Result<(), BoardError> {
        self.tasks.write().await.push(task.clone());
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> Result<bool, BoardError> {
        let mut tasks = self.tasks.write().await;
        Ok(replace_by_id(tasks.as_mut_slice(), &task.id, |t| t.id.as_str(), task))
    }

    async fn delete_task(&self, task_id: &str) -> Result<bool, BoardError> {
        Ok(remove_by_id(&mut *self.tasks.write().await, task_id, |t| t.id.as_str()))
    }

    async fn insert_client(&self, client: &Client) -> Result<(), BoardError> {
        self.clients.write().await.push(client.clone());
        Ok(())
    }

    async fn update_client(&self, client: &Client) -> Result<bool, BoardError> {
        let mut clients = self.clients.write().await;
        Ok(replace_by_id(clients.as_mut_slice(), &client.id, |c| c.id.as_str(), client))
    }

    async fn delete_client(&self, client_id: &str) -> Result<bool, BoardError> {
        Ok(remove_by_id(&mut *self.clients.write().await, client_id, |c| c.id.as_str()))
    }

    async fn update_user(&self, user: &User) -> Result<bool, BoardError> {
        let mut users = self.users.write().await;
        Ok(replace_by_id(users.as_mut_slice(), &user.id, |u| u.id.as_str(), user))
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, BoardError> {
        Ok(remove_by_id(&mut *self.users.write().await, user_id, |u| u.id.as_str()))
    }

    async fn insert_group(&self, group: &Group) -> Result<(), BoardError> {
        self.groups.write().await.push(group.clone());
        Ok(())
    }

    async fn rename_group(&self, group_id: &str, name: &GroupName) -> Result<Option<u64>, BoardError> {
        let mut groups = self.groups.write().await;
        let Some(group) = groups.iter_mut().find(|g| g.id == group_id) else {
            return Ok(None);
        };
        let old = std::mem::replace(&mut group.name, name.clone());

        let mut users = self.users.write().await;
        let mut moved = 0;
        for user in users.iter_mut().filter(|u| u.belongs_to(&old)) {
            user.team = Some(name.clone());
            moved += 1;
        }
        Ok(Some(moved))
    }

    async fn fetch_notifications(&self, user_id: &str, limit: i64) -> Result<Vec<Notification>, BoardError> {
        let mut feed: Vec<Notification> = self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        feed.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(feed)
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), BoardError> {
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }

    async fn mark_notification_read(&self, user_id: &str, notification_id: &str) -> Result<bool, BoardError> {
        let mut notifications = self.notifications.write().await;
        match notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, BoardError> {
        let mut marked = 0;
        for n in self
            .notifications
            .write()
            .await
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            n.is_read = true;
            marked += 1;
        }
        Ok(marked)
    }

    async fn delete_notification(&self, user_id: &str, notification_id: &str) -> Result<bool, BoardError> {
        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| !(n.id == notification_id && n.user_id == user_id));
        Ok(notifications.len() != before)
    }
}
