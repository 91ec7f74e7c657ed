use serde::{Deserialize, Serialize};
use std::fmt;

use super::Notification;

/// A traveler record tied to one flight.
///
/// `flight_id` is an opaque reference; nothing checks it against a flight
/// entity, so any value is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Passenger {
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub flight_id: i64,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl Passenger {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        flight_id: i64,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            flight_id,
            notifications: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Attach a notification. It is written together with the passenger on
    /// the next `persist`.
    pub fn add_notification(&mut self, mut notification: Notification) {
        notification.passenger_id = self.id;
        self.notifications.push(notification);
    }

    pub fn from_dto(dto: CreatePassengerDto) -> Self {
        Self::new(dto.first_name, dto.last_name, dto.email, dto.flight_id)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Passenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "#{} {} <{}>", id, self.full_name(), self.email),
            None => write!(f, "{} <{}>", self.full_name(), self.email),
        }
    }
}

/// Everything needed to create a passenger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePassengerDto {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub flight_id: i64,
}
