use std::collections::BTreeMap;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::pagination::{PageLinks, PageWindow};
use crate::core::error::AppError;
use super::sorting::SortHeader;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

// =============================================================================
// LISTINGS
// =============================================================================

/// A sorted, filtered, paginated admin listing
#[derive(Debug, Serialize, ToSchema)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub page: PageWindow,
    pub links: PageLinks,
    pub headers: Vec<SortHeader>,
    /// Active ordering, `-` prefixed when descending
    pub sort: String,
    /// Filters in effect, by query parameter name
    pub filters: BTreeMap<String, String>,
}

// =============================================================================
// FORMS
// =============================================================================

/// A validation error on a submitted form or formset row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    /// Index of the row in a formset, `None` for the form as a whole
    pub row: Option<usize>,
    /// Identifier of the record the row edits
    pub id: Option<String>,
    /// Offending field, `None` for row-level errors
    pub field: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FormErrors {
    pub errors: Vec<FieldError>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        row: Option<usize>,
        id: Option<String>,
        field: Option<&str>,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldError {
            row,
            id,
            field: field.map(str::to_string),
            message: message.into(),
        });
    }

    /// Error on a whole form (no row).
    pub fn field(&mut self, field: &str, message: impl Into<String>) {
        self.add(None, None, Some(field), message);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[cfg(test)]
    pub fn has_row(&self, row: usize) -> bool {
        self.errors.iter().any(|e| e.row == Some(row))
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| match (e.row, &e.field) {
                (Some(row), Some(field)) => format!("row {}: {}: {}", row, field, e.message),
                (Some(row), None) => format!("row {}: {}", row, e.message),
                (None, Some(field)) => format!("{}: {}", field, e.message),
                (None, None) => e.message.clone(),
            })
            .collect()
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Result of submitting a form or formset.
///
/// Invalid submissions persist nothing and answer HTTP 200 with
/// `success: false`, the per-row errors in `data` and their messages in `errors`.
#[derive(Debug)]
pub enum FormOutcome<T> {
    Saved { data: T, message: String },
    Invalid(FormErrors),
}

impl<T> FormOutcome<T> {
    pub fn saved(data: T, message: impl Into<String>) -> Self {
        Self::Saved {
            data,
            message: message.into(),
        }
    }

    #[cfg(test)]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }

    /// Field error for a write that lost a uniqueness race, `None` for any
    /// other error.
    pub fn unique_violation(e: &AppError) -> Option<Self> {
        match e {
            AppError::UniqueViolation { field, message } => {
                let mut errors = FormErrors::new();
                errors.field(field, *message);
                Some(Self::Invalid(errors))
            }
            _ => None,
        }
    }
}

impl<T: Serialize> IntoResponse for FormOutcome<T> {
    fn into_response(self) -> Response {
        match self {
            FormOutcome::Saved { data, message } => {
                Json(ApiResponse::success(Some(data), Some(message), None)).into_response()
            }
            FormOutcome::Invalid(errors) => {
                let messages = errors.messages();
                Json(ApiResponse {
                    success: false,
                    data: Some(errors),
                    message: Some("Please correct the errors below".to_string()),
                    meta: None,
                    errors: Some(messages),
                })
                .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_messages_include_row_and_field() {
        let mut errors = FormErrors::new();
        errors.add(Some(2), Some("c1".into()), Some("name"), "This field is required.");
        errors.add(Some(0), None, None, "Cycle");
        errors.field("slug", "Taken");

        assert!(errors.has_row(2));
        assert!(!errors.has_row(1));
        assert_eq!(
            errors.messages(),
            vec![
                "row 2: name: This field is required.".to_string(),
                "row 0: Cycle".to_string(),
                "slug: Taken".to_string(),
            ]
        );
    }

    #[test]
    fn test_invalid_outcome_is_ok_status() {
        let mut errors = FormErrors::new();
        errors.field("name", "required");

        let response = FormOutcome::<()>::Invalid(errors).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_unique_violation_becomes_field_error() {
        let outcome = FormOutcome::<()>::unique_violation(&AppError::UniqueViolation {
            field: "slug",
            message: "Category with this slug already exists.",
        });

        match outcome {
            Some(FormOutcome::Invalid(errors)) => {
                assert_eq!(errors.errors.len(), 1);
                assert_eq!(errors.errors[0].field.as_deref(), Some("slug"));
                assert_eq!(errors.errors[0].row, None);
            }
            other => panic!("expected field error, got {:?}", other),
        }

        assert!(FormOutcome::<()>::unique_violation(&AppError::NotFound("x".into())).is_none());
    }
}
