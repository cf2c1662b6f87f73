//! Shared types for Bloodlink: API payloads, domain models, and the small
//! pieces of pure logic (distance, request fulfillment) that both the store
//! and the HTTP layer rely on.

pub mod api;
pub mod geo;
pub mod models;
pub mod status;

pub use geo::{Coordinate, Urgency};
pub use status::{RequestStatus, ResponseStatus, Role};
