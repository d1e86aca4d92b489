//! Domain models for lanes
//!
//! Contains the core business logic without any I/O concerns.

mod id;
mod client;
pub mod lanes;
mod reorder;
mod request;

pub use id::{ClientId, IdError};
pub use client::{Client, ClientStatus, StatusError};
pub use lanes::LaneError;
pub use reorder::{apply, changes, plan_move, reorder, Assignment, ReorderError};
pub use request::{ErrorBody, MoveRequest, ValidationError};
