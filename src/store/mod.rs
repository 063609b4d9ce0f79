//! Persistence seams. Handlers only see these traits, so the MongoDB
//! implementation can be swapped for the in-memory one in tests.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::{NewTask, Session, Task, TaskList, User};

pub use memory::{MemorySessionStore, MemoryTaskStore, MemoryUserStore};
pub use mongo::{MongoSessionStore, MongoTaskStore, MongoUserStore};

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks in `list` visible to `owner`, sorted by deadline ascending.
    /// `owner == None` means ownership is not enforced.
    async fn list(&self, list: TaskList, owner: Option<&str>) -> Result<Vec<Task>, StoreError>;

    async fn insert(
        &self,
        list: TaskList,
        owner: Option<&str>,
        task: NewTask,
    ) -> Result<Task, StoreError>;

    /// Replaces name and deadline of a pending task. `None` if no such task.
    async fn update(
        &self,
        owner: Option<&str>,
        id: &str,
        task: NewTask,
    ) -> Result<Option<Task>, StoreError>;

    /// Returns `false` if nothing matched.
    async fn delete(&self, list: TaskList, owner: Option<&str>, id: &str)
        -> Result<bool, StoreError>;

    /// Moves a pending task into the completed list as one atomic unit and
    /// returns the new completed record. `None` if no such pending task, in
    /// which case neither list changes.
    async fn complete(&self, owner: Option<&str>, id: &str) -> Result<Option<Task>, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Fails with `StoreError::Duplicate` if the username is taken.
    async fn insert(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), StoreError>;

    /// Only unexpired sessions are returned.
    async fn find(&self, id: &str, now: DateTime<Utc>) -> Result<Option<Session>, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}
