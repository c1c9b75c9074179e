//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate scoring, store and source calls into use-case level APIs.
//! - Keep the CLI decoupled from storage and scoring details.

use crate::repo::entry_repo::StoreError;
use crate::source::SourceError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod feedback;
pub mod rescore;
pub mod review;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a driver that reads a document source and writes the store.
#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    Source(SourceError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Source(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Source(err) => Some(err),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SourceError> for ServiceError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}
