//! In-memory storage backend

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Database, StoreError, StoreResult};
use crate::{
    models::{Course, CourseFields, CourseId, CourseWithOwner, NewCourse, NewUser, User, UserId},
    utils::validation::FieldViolation,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    courses: BTreeMap<CourseId, Course>,
    last_user_id: UserId,
    last_course_id: CourseId,
}

impl Tables {
    fn join(&self, course: &Course) -> StoreResult<CourseWithOwner> {
        let owner = self.users.get(&course.user_id).cloned().ok_or_else(|| {
            StoreError::Unavailable(format!(
                "course {} references missing user {}",
                course.id, course.user_id
            ))
        })?;

        Ok(CourseWithOwner {
            course: course.clone(),
            owner,
        })
    }
}

/// Process-local store. Every operation takes the single table lock, so each
/// create/update/delete is atomic. Data is lost on drop.
#[derive(Default)]
pub struct MemoryDatabase {
    tables: RwLock<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }

    pub async fn course_count(&self) -> usize {
        self.tables.read().await.courses.len()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables
            .users
            .values()
            .any(|existing| existing.email_address == user.email_address)
        {
            return Err(StoreError::Validation(vec![FieldViolation::unique(
                "emailAddress",
                "This email address is already in use",
            )]));
        }

        tables.last_user_id += 1;
        let now = Utc::now();
        let record = User {
            id: tables.last_user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email_address: user.email_address,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());

        tracing::debug!(user_id = record.id, "User created");
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|user| user.email_address == email)
            .cloned())
    }

    async fn create_course(&self, course: NewCourse) -> StoreResult<Course> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&course.user_id) {
            return Err(StoreError::Unavailable(format!(
                "foreign key violation: user {} does not exist",
                course.user_id
            )));
        }

        tables.last_course_id += 1;
        let now = Utc::now();
        let record = Course {
            id: tables.last_course_id,
            user_id: course.user_id,
            fields: course.fields,
            created_at: now,
            updated_at: now,
        };
        tables.courses.insert(record.id, record.clone());

        tracing::debug!(course_id = record.id, user_id = record.user_id, "Course created");
        Ok(record)
    }

    async fn find_course(&self, id: CourseId) -> StoreResult<Option<Course>> {
        Ok(self.tables.read().await.courses.get(&id).cloned())
    }

    async fn find_course_with_owner(&self, id: CourseId) -> StoreResult<Option<CourseWithOwner>> {
        let tables = self.tables.read().await;
        tables
            .courses
            .get(&id)
            .map(|course| tables.join(course))
            .transpose()
    }

    async fn list_courses_with_owners(&self) -> StoreResult<Vec<CourseWithOwner>> {
        let tables = self.tables.read().await;
        tables
            .courses
            .values()
            .map(|course| tables.join(course))
            .collect()
    }

    async fn update_owned_course(
        &self,
        id: CourseId,
        owner: UserId,
        fields: CourseFields,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        match tables.courses.get_mut(&id) {
            Some(course) if course.user_id == owner => {
                course.fields = fields;
                course.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_owned_course(&self, id: CourseId, owner: UserId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        match tables.courses.get(&id) {
            Some(course) if course.user_id == owner => {
                tables.courses.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
