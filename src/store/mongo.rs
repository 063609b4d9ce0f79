use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use log::{debug, info};
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};

use super::{SessionRepository, TaskRepository, UserRepository};
use crate::db::MongoDB;
use crate::error::StoreError;
use crate::models::{NewTask, Session, Task, TaskList, User};

/// Stored shape of a task. Field names match what the browser client sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Deadline")]
    deadline: BsonDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<ObjectId>,
}

impl From<TaskDocument> for Task {
    fn from(d: TaskDocument) -> Self {
        Self {
            id: d.id.to_hex(),
            name: d.name,
            deadline: to_chrono(d.deadline),
            owner: d.owner.map(|o| o.to_hex()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    username: String,
    #[serde(rename = "passwordHash")]
    password_hash: String,
    #[serde(rename = "createdAt")]
    created_at: BsonDateTime,
}

impl From<UserDocument> for User {
    fn from(d: UserDocument) -> Self {
        Self {
            id: d.id.to_hex(),
            username: d.username,
            password_hash: d.password_hash,
            created_at: to_chrono(d.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(rename = "_id")]
    id: String,
    user_id: String,
    created_at: BsonDateTime,
    expires_at: BsonDateTime,
}

fn to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

fn to_chrono(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(dt.to_system_time())
}

/// `None` means the id can never match a stored document.
fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// Filter for one task by id, optionally restricted to an owner. `None` when
/// the id or owner is malformed, which the callers treat as "not found".
fn task_filter(owner: Option<&str>, id: &str) -> Option<Document> {
    let id = parse_id(id)?;
    let mut filter = doc! { "_id": id };
    if let Some(owner) = owner {
        filter.insert("owner", parse_id(owner)?);
    }
    Some(filter)
}

/// Creates the indexes the stores rely on. Safe to run on every start.
pub async fn ensure_indexes(db: &Database) -> Result<(), StoreError> {
    db.collection::<Document>("users")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "username": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;

    db.collection::<Document>("sessions")
        .create_index(
            IndexModel::builder()
                .keys(doc! { "expires_at": 1 })
                .options(
                    IndexOptions::builder()
                        .expire_after(StdDuration::from_secs(0))
                        .build(),
                )
                .build(),
        )
        .await?;

    for list in [TaskList::Pending, TaskList::Completed] {
        db.collection::<Document>(list.collection_name())
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "owner": 1, "Deadline": 1 })
                    .build(),
            )
            .await?;
    }

    info!("MongoDB indexes ensured");
    Ok(())
}

pub struct MongoTaskStore {
    client: Client,
    db: Database,
}

impl MongoTaskStore {
    pub fn new(mongodb: &MongoDB) -> Self {
        Self {
            client: mongodb.client.clone(),
            db: mongodb.db.clone(),
        }
    }

    fn coll(&self, list: TaskList) -> Collection<TaskDocument> {
        self.db.collection(list.collection_name())
    }
}

#[async_trait]
impl TaskRepository for MongoTaskStore {
    async fn list(&self, list: TaskList, owner: Option<&str>) -> Result<Vec<Task>, StoreError> {
        let filter = match owner {
            Some(owner) => match parse_id(owner) {
                Some(owner) => doc! { "owner": owner },
                None => return Ok(Vec::new()),
            },
            None => doc! {},
        };
        let docs: Vec<TaskDocument> = self
            .coll(list)
            .find(filter)
            .sort(doc! { "Deadline": 1 })
            .await?
            .try_collect()
            .await?;
        debug!("Fetched {} documents from {}", docs.len(), list.collection_name());
        Ok(docs.into_iter().map(Task::from).collect())
    }

    async fn insert(
        &self,
        list: TaskList,
        owner: Option<&str>,
        task: NewTask,
    ) -> Result<Task, StoreError> {
        let document = TaskDocument {
            id: ObjectId::new(),
            name: task.name,
            deadline: to_bson(task.deadline),
            owner: owner.and_then(parse_id),
        };
        self.coll(list).insert_one(&document).await?;
        Ok(document.into())
    }

    async fn update(
        &self,
        owner: Option<&str>,
        id: &str,
        task: NewTask,
    ) -> Result<Option<Task>, StoreError> {
        let Some(filter) = task_filter(owner, id) else {
            return Ok(None);
        };
        let update = doc! {
            "$set": { "Name": task.name, "Deadline": to_bson(task.deadline) }
        };
        let updated = self
            .coll(TaskList::Pending)
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated.map(Task::from))
    }

    async fn delete(
        &self,
        list: TaskList,
        owner: Option<&str>,
        id: &str,
    ) -> Result<bool, StoreError> {
        let Some(filter) = task_filter(owner, id) else {
            return Ok(false);
        };
        let res = self.coll(list).delete_one(filter).await?;
        Ok(res.deleted_count > 0)
    }

    async fn complete(&self, owner: Option<&str>, id: &str) -> Result<Option<Task>, StoreError> {
        let Some(filter) = task_filter(owner, id) else {
            return Ok(None);
        };

        // Dropping the session before commit aborts the transaction, so an
        // early `?` return leaves both collections untouched.
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let pending = self
            .coll(TaskList::Pending)
            .find_one_and_delete(filter)
            .session(&mut session)
            .await?;
        let Some(pending) = pending else {
            session.abort_transaction().await?;
            return Ok(None);
        };

        let completed = TaskDocument {
            id: ObjectId::new(),
            ..pending
        };
        self.coll(TaskList::Completed)
            .insert_one(&completed)
            .session(&mut session)
            .await?;
        session.commit_transaction().await?;

        Ok(Some(completed.into()))
    }
}

pub struct MongoUserStore {
    users: Collection<UserDocument>,
}

impl MongoUserStore {
    pub fn new(mongodb: &MongoDB) -> Self {
        Self {
            users: mongodb.db.collection("users"),
        }
    }
}

#[async_trait]
impl UserRepository for MongoUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = self.users.find_one(doc! { "username": username }).await?;
        Ok(user.map(User::from))
    }

    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let document = UserDocument {
            id: ObjectId::new(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: BsonDateTime::now(),
        };
        self.users
            .insert_one(&document)
            .await
            .map_err(StoreError::from_write)?;
        Ok(document.into())
    }
}

pub struct MongoSessionStore {
    sessions: Collection<SessionDocument>,
}

impl MongoSessionStore {
    pub fn new(mongodb: &MongoDB) -> Self {
        Self {
            sessions: mongodb.db.collection("sessions"),
        }
    }
}

#[async_trait]
impl SessionRepository for MongoSessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        let document = SessionDocument {
            id: session.id.clone(),
            user_id: session.user_id.clone(),
            created_at: to_bson(session.created_at),
            expires_at: to_bson(session.expires_at),
        };
        self.sessions.insert_one(&document).await?;
        Ok(())
    }

    async fn find(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        // The TTL monitor runs about once a minute, so expiry is also checked here.
        let filter = doc! { "_id": id, "expires_at": { "$gt": to_bson(now) } };
        let found = self.sessions.find_one(filter).await?;
        Ok(found.map(|d| Session {
            id: d.id,
            user_id: d.user_id,
            created_at: to_chrono(d.created_at),
            expires_at: to_chrono(d.expires_at),
        }))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let res = self.sessions.delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_never_build_a_filter() {
        assert!(task_filter(None, "not-an-object-id").is_none());
        let id = ObjectId::new().to_hex();
        assert!(task_filter(Some("nope"), &id).is_none());
        let filter = task_filter(Some(&ObjectId::new().to_hex()), &id).unwrap();
        assert!(filter.contains_key("_id"));
        assert!(filter.contains_key("owner"));
    }

    #[test]
    fn bson_round_trip_keeps_millisecond_precision() {
        let now = Utc::now();
        let back = to_chrono(to_bson(now));
        assert_eq!(back.timestamp_millis(), now.timestamp_millis());
    }
}
