//! Owner-gated course mutation.
//!
//! Existence is checked first, then ownership, and only then is anything
//! written. The store's conditional update/delete re-checks the owner under
//! its own lock, so a course removed between the check and the write is
//! reported as missing rather than silently recreated or half-applied.

use crate::{
    auth::AuthUser,
    db::Database,
    models::{Course, CourseId, CoursePatch},
    utils::{ApiError, ApiResult},
};

pub const NOT_OWNER_MESSAGE: &str = "You must be the course owner to update/delete it";
pub const COURSE_NOT_FOUND_MESSAGE: &str = "Course not found";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Forbidden,
    NotFound,
}

impl Decision {
    pub fn into_result(self) -> ApiResult<()> {
        match self {
            Self::Allowed => Ok(()),
            Self::Forbidden => Err(ApiError::authorization_error(NOT_OWNER_MESSAGE)),
            Self::NotFound => Err(ApiError::not_found_error(COURSE_NOT_FOUND_MESSAGE)),
        }
    }
}

pub fn authorize_mutation(course: Option<&Course>, requester: &AuthUser) -> Decision {
    match course {
        None => Decision::NotFound,
        Some(course) if course.user_id != requester.id => Decision::Forbidden,
        Some(_) => Decision::Allowed,
    }
}

#[derive(Debug, Clone)]
pub enum Mutation {
    /// Replace the supplied fields; absent fields keep their stored value
    Update(CoursePatch),
    Delete,
}

/// Apply `mutation` to course `id` on behalf of `requester`.
pub async fn mutate_owned_course(
    db: &dyn Database,
    id: CourseId,
    requester: &AuthUser,
    mutation: Mutation,
) -> ApiResult<()> {
    let course = db.find_course(id).await?;
    let decision = authorize_mutation(course.as_ref(), requester);

    if decision == Decision::Forbidden {
        tracing::info!(course_id = id, user_id = requester.id, "Rejected mutation by non-owner");
    }
    decision.into_result()?;

    let applied = match (mutation, course) {
        (Mutation::Update(patch), Some(current)) => {
            let fields = patch.merged_over(&current.fields).validated()?;
            db.update_owned_course(id, requester.id, fields).await?
        }
        (Mutation::Delete, Some(_)) => db.delete_owned_course(id, requester.id).await?,
        (_, None) => false,
    };

    if applied {
        Ok(())
    } else {
        Err(ApiError::not_found_error(COURSE_NOT_FOUND_MESSAGE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryDatabase,
        models::{CourseFields, NewCourse, NewUser},
    };
    use chrono::Utc;

    fn requester(id: i64) -> AuthUser {
        AuthUser {
            id,
            first_name: "Test".into(),
            last_name: "User".into(),
            email_address: format!("user{id}@example.com"),
        }
    }

    fn course(owner: i64) -> Course {
        Course {
            id: 1,
            user_id: owner,
            fields: fields("Intro"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn fields(title: &str) -> CourseFields {
        CourseFields {
            title: title.into(),
            description: "Desc".into(),
            estimated_time: "1h".into(),
            materials_needed: "Pen".into(),
        }
    }

    async fn seeded() -> (MemoryDatabase, CourseId) {
        let db = MemoryDatabase::new();
        for email in ["owner@example.com", "other@example.com"] {
            db.create_user(NewUser {
                first_name: "F".into(),
                last_name: "L".into(),
                email_address: email.into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        }
        let course = db
            .create_course(NewCourse {
                user_id: 1,
                fields: fields("Intro"),
            })
            .await
            .unwrap();
        (db, course.id)
    }

    #[test]
    fn decisions() {
        assert_eq!(authorize_mutation(None, &requester(1)), Decision::NotFound);
        assert_eq!(authorize_mutation(Some(&course(1)), &requester(2)), Decision::Forbidden);
        assert_eq!(authorize_mutation(Some(&course(1)), &requester(1)), Decision::Allowed);
    }

    #[test]
    fn forbidden_carries_actionable_message() {
        assert_eq!(
            Decision::Forbidden.into_result(),
            Err(ApiError::Forbidden(NOT_OWNER_MESSAGE.to_string()))
        );
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let (db, id) = seeded().await;
        let patch = CoursePatch {
            title: Some(Some("Hijacked".into())),
            ..CoursePatch::default()
        };

        let update = mutate_owned_course(&db, id, &requester(2), Mutation::Update(patch)).await;
        let delete = mutate_owned_course(&db, id, &requester(2), Mutation::Delete).await;

        assert!(matches!(update, Err(ApiError::Forbidden(_))));
        assert!(matches!(delete, Err(ApiError::Forbidden(_))));
        assert_eq!(db.find_course(id).await.unwrap().unwrap().fields, fields("Intro"));
    }

    #[tokio::test]
    async fn forbidden_wins_over_invalid_body() {
        let (db, id) = seeded().await;
        let patch = CoursePatch {
            title: Some(Some(String::new())),
            ..CoursePatch::default()
        };

        let result = mutate_owned_course(&db, id, &requester(2), Mutation::Update(patch)).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn owner_update_validates_merged_course() {
        let (db, id) = seeded().await;
        let patch = CoursePatch {
            description: Some(Some("   ".into())),
            ..CoursePatch::default()
        };

        let result = mutate_owned_course(&db, id, &requester(1), Mutation::Update(patch)).await;
        assert_eq!(
            result,
            Err(ApiError::Validation(vec!["Please provide a description".to_string()]))
        );
    }

    #[tokio::test]
    async fn repeated_delete_is_not_found() {
        let (db, id) = seeded().await;

        assert_eq!(mutate_owned_course(&db, id, &requester(1), Mutation::Delete).await, Ok(()));
        assert!(matches!(
            mutate_owned_course(&db, id, &requester(1), Mutation::Delete).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            mutate_owned_course(&db, id, &requester(2), Mutation::Delete).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
