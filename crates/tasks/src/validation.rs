//! Checks applied before a task is sent to the server

use std::fmt;
use thiserror::Error;

use crate::models::{NewTask, TaskUpdate};

pub const MIN_TITLE_LEN: usize = 3;
pub const MAX_DESCRIPTION_LEN: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Description => f.write_str("description"),
        }
    }
}

/// A field that failed local validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: TaskField,
    pub message: String,
}

impl ValidationError {
    fn new(field: TaskField, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Trimmed title, at least [`MIN_TITLE_LEN`] characters
pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::new(TaskField::Title, "Title is required"));
    }
    if title.chars().count() < MIN_TITLE_LEN {
        return Err(ValidationError::new(
            TaskField::Title,
            "Title must be at least 3 characters",
        ));
    }
    Ok(title.to_string())
}

/// Trimmed description, at most [`MAX_DESCRIPTION_LEN`] characters
pub fn validate_description(description: &str) -> Result<String, ValidationError> {
    let description = description.trim();
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::new(
            TaskField::Description,
            "Description cannot exceed 10,000 characters",
        ));
    }
    Ok(description.to_string())
}

impl NewTask {
    /// The body actually sent: trimmed, with a blank description dropped
    pub fn validated(&self) -> Result<NewTask, ValidationError> {
        let title = validate_title(&self.title)?;
        let description = match &self.description {
            Some(d) => Some(validate_description(d)?).filter(|d| !d.is_empty()),
            None => None,
        };
        Ok(NewTask { title, description })
    }
}

impl TaskUpdate {
    /// Validate and trim whichever text fields the update carries
    pub fn validated(&self) -> Result<TaskUpdate, ValidationError> {
        let mut update = self.clone();
        if let Some(title) = &self.title {
            update.title = Some(validate_title(title)?);
        }
        if let Some(description) = &self.description {
            update.description = Some(validate_description(description)?);
        }
        Ok(update)
    }
}
