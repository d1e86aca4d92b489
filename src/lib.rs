//! lanes - A local-first client tracker with ranked swimlanes
//!
//! Clients live in one of three lanes (backlog, in-progress, complete) and
//! hold a dense 1-based rank within their lane. The [`domain`] module holds
//! the reorder engine that keeps those ranks consistent when clients move;
//! [`storage`] persists them and [`handler`] glues the two together.

pub mod domain;
pub mod storage;
pub mod handler;
pub mod cli;

pub use domain::{Assignment, Client, ClientId, ClientStatus, MoveRequest};
