//! HTTP handlers. Each submodule exposes a `router()` merged in
//! [`crate::router::create_router`].

use serde::Deserialize;

use crate::error::AppError;

pub mod admin;
pub mod email;
pub mod pages;
pub mod public;

/// Browsers post form numbers as either JSON numbers or strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl NumberOrText {
    pub fn parse(field: &str, value: Option<Self>) -> Result<Option<i64>, AppError> {
        match value {
            None => Ok(None),
            Some(NumberOrText::Number(n)) => Ok(Some(n)),
            Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(NumberOrText::Text(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| AppError::validation(format!("{field} must be a number"))),
        }
    }
}
