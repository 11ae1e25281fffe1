/*! Core value types for axquery. */

#![allow(missing_docs)]

mod error;
mod geometry;
mod ids;

pub use error::{AxError, AxResult, NameKind, SearchFailure, ServiceError, ServiceResult};
pub use geometry::{Bounds, Point, Size, TextRange};
pub use ids::ProcessId;
