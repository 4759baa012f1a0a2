use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::{
    auth::AuthUser,
    utils::validation::{self, FieldSource, FieldViolation, Rule},
};

pub type UserId = i64;
pub type CourseId = i64;

/// Stored user record. Not `Serialize`; the password hash must
/// never reach a response body.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email_address", &self.email_address)
            .finish_non_exhaustive()
    }
}

/// User record ready for insertion
#[derive(Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub password_hash: String,
}

/// Content fields shared by every course representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseFields {
    pub title: String,
    pub description: String,
    pub estimated_time: String,
    pub materials_needed: String,
}

/// Stored course record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: CourseId,
    pub user_id: UserId,
    pub fields: CourseFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Course record ready for insertion; the owner is fixed here and never changes
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub user_id: UserId,
    pub fields: CourseFields,
}

/// A course joined with the user that owns it
#[derive(Debug, Clone)]
pub struct CourseWithOwner {
    pub course: Course,
    pub owner: User,
}

/// Registration fields once every rule has passed
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
    pub password: String,
}

/// Body of `POST /users`
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_address: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl fmt::Debug for NewUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUserRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email_address", &self.email_address)
            .field("password", &self.password.as_ref().map(|_| "[redacted]"))
            .field("confirm_password", &self.confirm_password.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

pub const USER_RULES: &[Rule] = &[
    Rule::required("firstName", "A first name is required", "Please provide a first name"),
    Rule::required("lastName", "A last name is required", "Please provide a last name"),
    Rule::required(
        "emailAddress",
        "An email address is required",
        "Please provide an email address",
    ),
    Rule::email("emailAddress", "Please provide a valid email address"),
    Rule::required("password", "A password is required", "Please provide a password"),
    Rule::matches("confirmPassword", "password", "Both passwords must match"),
];

impl FieldSource for NewUserRequest {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "firstName" => self.first_name.as_deref(),
            "lastName" => self.last_name.as_deref(),
            "emailAddress" => self.email_address.as_deref(),
            "password" => self.password.as_deref(),
            "confirmPassword" => self.confirm_password.as_deref(),
            _ => None,
        }
    }
}

impl NewUserRequest {
    /// Check every registration rule. The confirmation is compared here and
    /// then dropped; only the password itself moves on to hashing.
    pub fn validated(self) -> Result<Registration, Vec<FieldViolation>> {
        let violations = validation::validate(USER_RULES, &self);
        if !violations.is_empty() {
            return Err(violations);
        }

        match (self.first_name, self.last_name, self.email_address, self.password) {
            (Some(first_name), Some(last_name), Some(email_address), Some(password)) => {
                Ok(Registration {
                    first_name,
                    last_name,
                    email_address,
                    password,
                })
            }
            _ => Err(validation::validate(USER_RULES, &NewUserRequest::default())),
        }
    }
}

/// Body of `POST /courses`. An explicit `null` counts as missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub estimated_time: Option<String>,
    pub materials_needed: Option<String>,
}

pub const COURSE_RULES: &[Rule] = &[
    Rule::required("title", "A title is required", "Please provide a title"),
    Rule::required("description", "A description is required", "Please provide a description"),
    Rule::required(
        "estimatedTime",
        "An estimated time is required",
        "Please provide an estimated time",
    ),
    Rule::required(
        "materialsNeeded",
        "Materials needed are required",
        "Please provide the materials needed",
    ),
];

impl FieldSource for CourseRequest {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "title" => self.title.as_deref(),
            "description" => self.description.as_deref(),
            "estimatedTime" => self.estimated_time.as_deref(),
            "materialsNeeded" => self.materials_needed.as_deref(),
            _ => None,
        }
    }
}

impl CourseRequest {
    pub fn validated(self) -> Result<CourseFields, Vec<FieldViolation>> {
        let violations = validation::validate(COURSE_RULES, &self);
        if !violations.is_empty() {
            return Err(violations);
        }

        match (self.title, self.description, self.estimated_time, self.materials_needed) {
            (Some(title), Some(description), Some(estimated_time), Some(materials_needed)) => {
                Ok(CourseFields {
                    title,
                    description,
                    estimated_time,
                    materials_needed,
                })
            }
            _ => Err(validation::validate(COURSE_RULES, &CourseRequest::default())),
        }
    }
}

/// Body of `PUT /courses/:id`.
///
/// The outer `Option` records whether the field was sent at all; the inner one
/// is `None` when it was sent as `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoursePatch {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub estimated_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub materials_needed: Option<Option<String>>,
}

/// Only called for keys that appear in the body, so the result is always `Some`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl CoursePatch {
    /// Overlay this patch on an existing course. Absent fields keep their
    /// stored value; `null` fields stay missing and fail validation.
    pub fn merged_over(self, current: &CourseFields) -> CourseRequest {
        CourseRequest {
            title: self.title.unwrap_or_else(|| Some(current.title.clone())),
            description: self
                .description
                .unwrap_or_else(|| Some(current.description.clone())),
            estimated_time: self
                .estimated_time
                .unwrap_or_else(|| Some(current.estimated_time.clone())),
            materials_needed: self
                .materials_needed
                .unwrap_or_else(|| Some(current.materials_needed.clone())),
        }
    }
}

/// Response body of `GET /users`
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

/// Owner embedded in course responses
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

/// Course as returned by the read endpoints
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: CourseId,
    pub title: String,
    pub description: String,
    pub estimated_time: String,
    pub materials_needed: String,
    pub user_id: UserId,
    pub owner: OwnerSummary,
}

impl From<AuthUser> for UserProfile {
    fn from(user: AuthUser) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            email_address: user.email_address,
        }
    }
}

impl From<User> for OwnerSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email_address: user.email_address,
        }
    }
}

impl From<CourseWithOwner> for CourseResponse {
    fn from(joined: CourseWithOwner) -> Self {
        let CourseWithOwner { course, owner } = joined;
        Self {
            id: course.id,
            title: course.fields.title,
            description: course.fields.description,
            estimated_time: course.fields.estimated_time,
            materials_needed: course.fields.materials_needed,
            user_id: course.user_id,
            owner: owner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_request(title: Option<&str>, description: Option<&str>) -> CourseRequest {
        CourseRequest {
            title: title.map(str::to_string),
            description: description.map(str::to_string),
            estimated_time: Some("2 hours".to_string()),
            materials_needed: Some("Laptop".to_string()),
        }
    }

    #[test]
    fn missing_title_and_description_yield_two_messages_in_order() {
        let violations = course_request(None, None).validated().unwrap_err();
        assert_eq!(
            validation::messages(&violations),
            vec!["A title is required", "A description is required"]
        );
    }

    #[test]
    fn blank_fields_are_empty_not_missing() {
        let violations = course_request(Some("  "), Some("")).validated().unwrap_err();
        assert_eq!(
            validation::messages(&violations),
            vec!["Please provide a title", "Please provide a description"]
        );
    }

    #[test]
    fn merge_keeps_existing_values_for_absent_fields() {
        let current = CourseFields {
            title: "Old".into(),
            description: "Desc".into(),
            estimated_time: "1h".into(),
            materials_needed: "None".into(),
        };
        let patch = CoursePatch {
            title: Some(Some("New".into())),
            ..CoursePatch::default()
        };

        let merged = patch.merged_over(&current).validated().unwrap();
        assert_eq!(merged.title, "New");
        assert_eq!(merged.description, "Desc");
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: CoursePatch =
            serde_json::from_str(r#"{"title": null, "estimatedTime": "2h"}"#).unwrap();

        assert_eq!(patch.title, Some(None));
        assert_eq!(patch.description, None);
        assert_eq!(patch.estimated_time, Some(Some("2h".to_string())));
    }

    #[test]
    fn null_in_patch_reports_missing_field() {
        let current = CourseFields {
            title: "Old".into(),
            description: "Desc".into(),
            estimated_time: "1h".into(),
            materials_needed: "None".into(),
        };
        let patch: CoursePatch =
            serde_json::from_str(r#"{"title": null, "description": null}"#).unwrap();

        let violations = patch.merged_over(&current).validated().unwrap_err();
        assert_eq!(
            validation::messages(&violations),
            vec!["A title is required", "A description is required"]
        );
    }

    #[test]
    fn registration_reports_fields_in_declaration_order() {
        let request = NewUserRequest {
            email_address: Some("not-an-email".into()),
            password: Some("secret1".into()),
            confirm_password: Some("secret2".into()),
            ..NewUserRequest::default()
        };
        let violations = request.validated().err().unwrap();
        assert_eq!(
            validation::messages(&violations),
            vec![
                "A first name is required",
                "A last name is required",
                "Please provide a valid email address",
                "Both passwords must match",
            ]
        );
    }

    #[test]
    fn registration_without_confirmation_is_accepted() {
        let request = NewUserRequest {
            first_name: Some("A".into()),
            last_name: Some("B".into()),
            email_address: Some("a@b.com".into()),
            password: Some("secret1".into()),
            confirm_password: None,
        };
        let registration = request.validated().ok().unwrap();
        assert_eq!(registration.password, "secret1");
    }

    #[test]
    fn request_debug_redacts_passwords() {
        let request = NewUserRequest {
            password: Some("hunter22".into()),
            confirm_password: Some("hunter22".into()),
            ..NewUserRequest::default()
        };
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("hunter22"));
    }
}
