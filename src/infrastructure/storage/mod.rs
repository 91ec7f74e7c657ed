//! In-memory passenger repository

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::{Notification, NotificationDto, Passenger};
use crate::domain::traits::PassengerRepository;

#[derive(Default)]
struct Tables {
    passengers: BTreeMap<i64, Passenger>,
    next_passenger_id: i64,
    next_notification_id: i64,
}

impl Tables {
    fn passenger_id(&mut self) -> Result<i64, StorageError> {
        self.next_passenger_id = next_id(self.next_passenger_id, "passenger")?;
        Ok(self.next_passenger_id)
    }

    fn notification_id(&mut self) -> Result<i64, StorageError> {
        self.next_notification_id = next_id(self.next_notification_id, "notification")?;
        Ok(self.next_notification_id)
    }
}

fn next_id(current: i64, table: &'static str) -> Result<i64, StorageError> {
    current.checked_add(1).ok_or(StorageError::IdExhausted(table))
}

/// Map-backed store. Notifications live inside their owning passenger, so
/// removing the passenger removes them too.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PassengerRepository for MemoryStore {
    async fn persist(&self, mut passenger: Passenger) -> Result<Passenger, StorageError> {
        let mut tables = self.tables.write().await;

        let id = match passenger.id {
            Some(id) => {
                tables.next_passenger_id = tables.next_passenger_id.max(id);
                id
            }
            None => tables.passenger_id()?,
        };
        passenger.id = Some(id);

        // Keyed by id so a row carried twice is stored once, last copy wins.
        let mut attached: BTreeMap<i64, Notification> = BTreeMap::new();
        for mut notification in std::mem::take(&mut passenger.notifications) {
            let notification_id = match notification.id {
                Some(notification_id) => {
                    tables.next_notification_id = tables.next_notification_id.max(notification_id);
                    notification_id
                }
                None => tables.notification_id()?,
            };
            notification.id = Some(notification_id);
            notification.passenger_id = Some(id);
            attached.insert(notification_id, notification);
        }

        // Rows stored earlier but absent from this copy stay attached; rows
        // carried by this copy leave any previous owner.
        for other in tables.passengers.values_mut() {
            other
                .notifications
                .retain(|n| !n.id.is_some_and(|nid| attached.contains_key(&nid)));
        }
        let mut notifications = tables
            .passengers
            .remove(&id)
            .map(|existing| existing.notifications)
            .unwrap_or_default();
        notifications.extend(attached.into_values());
        notifications.sort_by_key(|n| n.id);
        passenger.notifications = notifications;

        tables.passengers.insert(id, passenger.clone());
        Ok(passenger)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Passenger>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.passengers.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StorageError> {
        let mut tables = self.tables.write().await;
        Ok(tables.passengers.remove(&id).is_some())
    }

    async fn delete_all(&self) -> Result<u64, StorageError> {
        let mut tables = self.tables.write().await;
        let count = tables.passengers.len() as u64;
        tables.passengers.clear();
        Ok(count)
    }

    async fn list_all(&self) -> Result<Vec<Passenger>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables.passengers.values().cloned().collect())
    }

    async fn find_passengers_for_flight(
        &self,
        flight_id: i64,
    ) -> Result<Vec<Passenger>, StorageError> {
        let tables = self.tables.read().await;
        Ok(tables
            .passengers
            .values()
            .filter(|p| p.flight_id == flight_id)
            .cloned()
            .collect())
    }

    async fn find_notifications_for_passenger(
        &self,
        passenger_id: i64,
    ) -> Result<Vec<Notification>, StorageError> {
        let tables = self.tables.read().await;
        match tables.passengers.get(&passenger_id) {
            Some(passenger) => Ok(passenger.notifications.clone()),
            None => Ok(Vec::new()),
        }
    }

    async fn add_notification_by_flight_id(
        &self,
        flight_id: i64,
        notification: &Notification,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write().await;
        let targets: Vec<i64> = tables
            .passengers
            .values()
            .filter(|p| p.flight_id == flight_id)
            .filter_map(|p| p.id)
            .collect();

        // Allocate every id before writing so a failure leaves no partial fan-out.
        let mut copies = Vec::with_capacity(targets.len());
        for passenger_id in &targets {
            let mut copy = notification.copy_for(*passenger_id);
            copy.id = Some(tables.notification_id()?);
            copies.push(copy);
        }
        for (passenger_id, copy) in targets.iter().zip(copies) {
            if let Some(passenger) = tables.passengers.get_mut(passenger_id) {
                passenger.notifications.push(copy);
            }
        }

        tracing::debug!(flight_id, written = targets.len(), "Notification fanned out");
        Ok(())
    }

    async fn find_notifications_with_email(&self) -> Result<Vec<NotificationDto>, StorageError> {
        let tables = self.tables.read().await;
        let mut joined: Vec<(Option<i64>, NotificationDto)> = tables
            .passengers
            .values()
            .flat_map(|p| {
                p.notifications.iter().map(move |n| {
                    (
                        n.id,
                        NotificationDto {
                            message: n.message.clone(),
                            email: p.email.clone(),
                        },
                    )
                })
            })
            .collect();
        joined.sort_by_key(|(id, _)| *id);
        Ok(joined.into_iter().map(|(_, dto)| dto).collect())
    }
}
