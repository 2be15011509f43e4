use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use log::{debug, info, warn};
use mongodb::bson::{doc, DateTime};
use mongodb::{options::ClientOptions, Client as MongoClient, ClientSession, Collection, Database};
use serde::{Deserialize, Serialize};

use super::Storage;
use crate::error::BoardError;
use crate::models::{Client, Group, GroupName, Notification, NotificationKind, Task, User};

/// Notification as kept in the collection. `created_at` is a BSON date so
/// the feed sort is chronological rather than lexical.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNotification {
    id: String,
    user_id: String,
    message: String,
    #[serde(rename = "type")]
    kind: NotificationKind,
    #[serde(default, alias = "related_id")]
    related_task_id: Option<String>,
    #[serde(default)]
    is_read: bool,
    created_at: DateTime,
}

impl From<&Notification> for StoredNotification {
    fn from(n: &Notification) -> Self {
        StoredNotification {
            id: n.id.clone(),
            user_id: n.user_id.clone(),
            message: n.message.clone(),
            kind: n.kind,
            related_task_id: n.related_task_id.clone(),
            is_read: n.is_read,
            created_at: DateTime::from_millis(n.created_at.timestamp_millis()),
        }
    }
}

impl From<StoredNotification> for Notification {
    fn from(n: StoredNotification) -> Self {
        let created_at = chrono::DateTime::from_timestamp_millis(n.created_at.timestamp_millis())
            .unwrap_or_else(Utc::now);
        Notification {
            id: n.id,
            user_id: n.user_id,
            message: n.message,
            kind: n.kind,
            related_task_id: n.related_task_id,
            is_read: n.is_read,
            created_at,
        }
    }
}

pub struct MongoStorage {
    pub client: MongoClient,
    pub db: Database,
}

impl MongoStorage {
    pub async fn init(uri: &str, db_name: &str) -> Result<Self, BoardError> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = MongoClient::with_options(client_options)?;
        let db = client.database(db_name);
        info!("Connected to MongoDB database {}", db_name);
        Ok(MongoStorage { client, db })
    }

    fn tasks(&self) -> Collection<Task> {
        self.db.collection("tasks")
    }

    fn clients(&self) -> Collection<Client> {
        self.db.collection("clients")
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn groups(&self) -> Collection<Group> {
        self.db.collection("groups")
    }

    fn notifications(&self) -> Collection<StoredNotification> {
        self.db.collection("notifications")
    }

    /// Group name and member teams change together or not at all.
    async fn rename_in(
        &self,
        session: &mut ClientSession,
        group_id: &str,
        name: &GroupName,
    ) -> Result<Option<u64>, BoardError> {
        let Some(group) = self
            .groups()
            .find_one(doc! { "id": group_id })
            .session(&mut *session)
            .await?
        else {
            return Ok(None);
        };
        self.groups()
            .update_one(doc! { "id": group_id }, doc! { "$set": { "name": name.as_str() } })
            .session(&mut *session)
            .await?;
        let moved = self
            .users()
            .update_many(
                doc! { "team": group.name.as_str() },
                doc! { "$set": { "team": name.as_str() } },
            )
            .session(&mut *session)
            .await?;
        debug!("Group {} was {}", group_id, group.name);
        Ok(Some(moved.modified_count))
    }
}

#[async_trait]
impl Storage for MongoStorage {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, BoardError> {
        let tasks: Vec<Task> = self.tasks().find(doc! {}).await?.try_collect().await?;
        debug!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    async fn fetch_clients(&self) -> Result<Vec<Client>, BoardError> {
        Ok(self.clients().find(doc! {}).await?.try_collect().await?)
    }

    async fn fetch_employees(&self) -> Result<Vec<User>, BoardError> {
        Ok(self.users().find(doc! {}).await?.try_collect().await?)
    }

    async fn fetch_current_actor(&self, user_id: &str) -> Result<Option<User>, BoardError> {
        Ok(self.users().find_one(doc! { "id": user_id }).await?)
    }

    async fn fetch_groups(&self) -> Result<Vec<Group>, BoardError> {
        Ok(self.groups().find(doc! {}).sort(doc! { "name": 1 }).await?.try_collect().await?)
    }

    async fn insert_task(&self, task: &Task) -> Result<(), BoardError> {
        self.tasks().insert_one(task).await?;
        Ok(())
    }

    async fn update_task(&self, task: &Task) -> Result<bool, BoardError> {
        let result = self.tasks().replace_one(doc! { "id": &task.id }, task).await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_task(&self, task_id: &str) -> Result<bool, BoardError> {
        let result = self.tasks().delete_one(doc! { "id": task_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_client(&self, client: &Client) -> Result<(), BoardError> {
        self.clients().insert_one(client).await?;
        Ok(())
    }

    async fn update_client(&self, client: &Client) -> Result<bool, BoardError> {
        let result = self.clients().replace_one(doc! { "id": &client.id }, client).await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_client(&self, client_id: &str) -> Result<bool, BoardError> {
        let result = self.clients().delete_one(doc! { "id": client_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn update_user(&self, user: &User) -> Result<bool, BoardError> {
        let result = self.users().replace_one(doc! { "id": &user.id }, user).await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_user(&self, user_id: &str) -> Result<bool, BoardError> {
        let result = self.users().delete_one(doc! { "id": user_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_group(&self, group: &Group) -> Result<(), BoardError> {
        self.groups().insert_one(group).await?;
        Ok(())
    }

    async fn rename_group(&self, group_id: &str, name: &GroupName) -> Result<Option<u64>, BoardError> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;
        match self.rename_in(&mut session, group_id, name).await {
            Ok(Some(moved)) => {
                session.commit_transaction().await?;
                info!("Group {} renamed to {}, {} members moved", group_id, name, moved);
                Ok(Some(moved))
            }
            Ok(None) => {
                session.abort_transaction().await?;
                Ok(None)
            }
            Err(e) => {
                warn!("Rename of group {} rolled back: {}", group_id, e);
                if let Err(abort) = session.abort_transaction().await {
                    warn!("Abort failed for group {}: {}", group_id, abort);
                }
                Err(e)
            }
        }
    }

    async fn fetch_notifications(&self, user_id: &str, limit: i64) -> Result<Vec<Notification>, BoardError> {
        let stored: Vec<StoredNotification> = self
            .notifications()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .limit(limit)
            .await?
            .try_collect()
            .await?;
        Ok(stored.into_iter().map(Notification::from).collect())
    }

    async fn insert_notification(&self, notification: &Notification) -> Result<(), BoardError> {
        self.notifications().insert_one(StoredNotification::from(notification)).await?;
        Ok(())
    }

    async fn mark_notification_read(&self, user_id: &str, notification_id: &str) -> Result<bool, BoardError> {
        let result = self
            .notifications()
            .update_one(
                doc! { "id": notification_id, "user_id": user_id },
                doc! { "$set": { "is_read": true } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> Result<u64, BoardError> {
        let result = self
            .notifications()
            .update_many(
                doc! { "user_id": user_id, "is_read": false },
                doc! { "$set": { "is_read": true } },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_notification(&self, user_id: &str, notification_id: &str) -> Result<bool, BoardError> {
        let result = self
            .notifications()
            .delete_one(doc! { "id": notification_id, "user_id": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }
}
