//! Application services - Use-case orchestration

pub mod passenger_service;

pub use passenger_service::PassengerService;
