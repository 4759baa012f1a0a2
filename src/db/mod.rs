//! Storage abstraction.
//!
//! Handlers and the authentication service only see [`Database`], injected as
//! `Arc<dyn Database>` through application state.

mod memory;

pub use memory::MemoryDatabase;

use async_trait::async_trait;

use crate::{
    models::{Course, CourseFields, CourseId, CourseWithOwner, NewCourse, NewUser, User, UserId},
    utils::validation::FieldViolation,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A constraint rejected the record
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldViolation>),
    /// The backend could not serve the request
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Create/find/update/delete over users and courses.
///
/// Implementations provide atomic single-record operations; callers take no
/// locks of their own.
#[async_trait]
pub trait Database: Send + Sync {
    /// Insert a user. Fails with `StoreError::Validation` when the email
    /// address is already taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Exact, case-sensitive match on the email address
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn create_course(&self, course: NewCourse) -> StoreResult<Course>;

    async fn find_course(&self, id: CourseId) -> StoreResult<Option<Course>>;

    async fn find_course_with_owner(&self, id: CourseId) -> StoreResult<Option<CourseWithOwner>>;

    /// All courses in primary key order, each joined with its owner
    async fn list_courses_with_owners(&self) -> StoreResult<Vec<CourseWithOwner>>;

    /// Replace the content of course `id` if it still exists and is still
    /// owned by `owner`. Returns whether a record was changed.
    async fn update_owned_course(
        &self,
        id: CourseId,
        owner: UserId,
        fields: CourseFields,
    ) -> StoreResult<bool>;

    /// Delete course `id` if it still exists and is still owned by `owner`.
    /// Returns whether a record was removed.
    async fn delete_owned_course(&self, id: CourseId, owner: UserId) -> StoreResult<bool>;
}
