//! Domain layer - Core business objects with no infrastructure dependencies
//!
//! This layer contains:
//! - Entities: Passenger, Notification and their DTO projections
//! - Traits: The storage abstraction (PassengerRepository)

pub mod entities;
pub mod traits;
