use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use super::{SessionRepository, TaskRepository, UserRepository};
use crate::error::StoreError;
use crate::models::{NewTask, Session, Task, TaskList, User};

#[derive(Default)]
struct Lists {
    pending: Vec<Task>,
    completed: Vec<Task>,
}

impl Lists {
    fn get_mut(&mut self, list: TaskList) -> &mut Vec<Task> {
        match list {
            TaskList::Pending => &mut self.pending,
            TaskList::Completed => &mut self.completed,
        }
    }

    fn get(&self, list: TaskList) -> &Vec<Task> {
        match list {
            TaskList::Pending => &self.pending,
            TaskList::Completed => &self.completed,
        }
    }
}

/// Both lists sit behind one lock, so a completion is never observed half-done.
#[derive(Default)]
pub struct MemoryTaskStore {
    lists: RwLock<Lists>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn visible(task: &Task, owner: Option<&str>) -> bool {
    owner.map_or(true, |owner| task.owner.as_deref() == Some(owner))
}

fn new_id() -> String {
    ObjectId::new().to_hex()
}

#[async_trait]
impl TaskRepository for MemoryTaskStore {
    async fn list(&self, list: TaskList, owner: Option<&str>) -> Result<Vec<Task>, StoreError> {
        let lists = self.lists.read().map_err(|_| StoreError::Poisoned)?;
        let mut tasks: Vec<Task> = lists
            .get(list)
            .iter()
            .filter(|t| visible(t, owner))
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.deadline);
        Ok(tasks)
    }

    async fn insert(
        &self,
        list: TaskList,
        owner: Option<&str>,
        task: NewTask,
    ) -> Result<Task, StoreError> {
        let task = Task {
            id: new_id(),
            name: task.name,
            deadline: task.deadline,
            owner: owner.map(String::from),
        };
        let mut lists = self.lists.write().map_err(|_| StoreError::Poisoned)?;
        lists.get_mut(list).push(task.clone());
        Ok(task)
    }

    async fn update(
        &self,
        owner: Option<&str>,
        id: &str,
        task: NewTask,
    ) -> Result<Option<Task>, StoreError> {
        let mut lists = self.lists.write().map_err(|_| StoreError::Poisoned)?;
        let existing = lists
            .get_mut(TaskList::Pending)
            .iter_mut()
            .find(|t| t.id == id && visible(t, owner));
        Ok(existing.map(|t| {
            t.name = task.name;
            t.deadline = task.deadline;
            t.clone()
        }))
    }

    async fn delete(
        &self,
        list: TaskList,
        owner: Option<&str>,
        id: &str,
    ) -> Result<bool, StoreError> {
        let mut lists = self.lists.write().map_err(|_| StoreError::Poisoned)?;
        let tasks = lists.get_mut(list);
        match tasks.iter().position(|t| t.id == id && visible(t, owner)) {
            Some(index) => {
                tasks.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn complete(&self, owner: Option<&str>, id: &str) -> Result<Option<Task>, StoreError> {
        let mut lists = self.lists.write().map_err(|_| StoreError::Poisoned)?;
        let Some(index) = lists
            .pending
            .iter()
            .position(|t| t.id == id && visible(t, owner))
        else {
            return Ok(None);
        };
        let pending = lists.pending.remove(index);
        let completed = Task {
            id: new_id(),
            ..pending
        };
        lists.completed.push(completed.clone());
        Ok(Some(completed))
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::Poisoned)?;
        Ok(users.get(username).cloned())
    }

    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().map_err(|_| StoreError::Poisoned)?;
        if users.contains_key(username) {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            id: new_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.insert(username.to_string(), user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionStore {
    async fn create(&self, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| StoreError::Poisoned)?;
        // Expired entries are dropped lazily here instead of by a sweeper.
        let now = Utc::now();
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().map_err(|_| StoreError::Poisoned)?;
        Ok(sessions.get(id).filter(|s| !s.is_expired(now)).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().map_err(|_| StoreError::Poisoned)?;
        Ok(sessions.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn new_task(name: &str, day: u32) -> NewTask {
        NewTask {
            name: name.to_string(),
            deadline: Utc.with_ymd_and_hms(2025, 1, day, 9, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn list_is_sorted_and_owner_scoped() {
        let store = MemoryTaskStore::new();
        store.insert(TaskList::Pending, Some("a"), new_task("late", 20)).await.unwrap();
        store.insert(TaskList::Pending, Some("b"), new_task("other", 1)).await.unwrap();
        store.insert(TaskList::Pending, Some("a"), new_task("early", 2)).await.unwrap();

        let names: Vec<String> = store
            .list(TaskList::Pending, Some("a"))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["early", "late"]);
        assert_eq!(store.list(TaskList::Pending, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn complete_moves_exactly_once() {
        let store = MemoryTaskStore::new();
        let task = store.insert(TaskList::Pending, Some("a"), new_task("x", 3)).await.unwrap();

        let done = store.complete(Some("a"), &task.id).await.unwrap().unwrap();
        assert_ne!(done.id, task.id);
        assert_eq!(done.owner.as_deref(), Some("a"));
        assert!(store.list(TaskList::Pending, Some("a")).await.unwrap().is_empty());

        assert!(store.complete(Some("a"), &task.id).await.unwrap().is_none());
        assert_eq!(store.list(TaskList::Completed, Some("a")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn other_owners_cannot_touch_a_task() {
        let store = MemoryTaskStore::new();
        let task = store.insert(TaskList::Pending, Some("a"), new_task("x", 3)).await.unwrap();

        assert!(store.update(Some("b"), &task.id, new_task("y", 4)).await.unwrap().is_none());
        assert!(!store.delete(TaskList::Pending, Some("b"), &task.id).await.unwrap());
        assert!(store.complete(Some("b"), &task.id).await.unwrap().is_none());
        assert_eq!(store.list(TaskList::Pending, Some("a")).await.unwrap()[0].name, "x");
    }

    #[tokio::test]
    async fn expired_sessions_are_not_found() {
        let store = MemorySessionStore::new();
        let now = Utc::now();
        let session = Session {
            id: "s1".into(),
            user_id: "u1".into(),
            created_at: now,
            expires_at: now + Duration::hours(1),
        };
        store.create(&session).await.unwrap();
        assert_eq!(store.find("s1", now).await.unwrap(), Some(session));
        assert!(store.find("s1", now + Duration::hours(2)).await.unwrap().is_none());
        assert!(store.delete("s1").await.unwrap());
        assert!(!store.delete("s1").await.unwrap());
    }
}
