use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::types::WsMessage;

pub type WsSender = mpsc::UnboundedSender<WsMessage>;

struct Subscriber {
    user_id: Uuid,
    sender: WsSender,
}

/// Open sockets grouped by room. A user may hold several connections to the
/// same room (one per tab), each keyed by its own connection id.
#[derive(Clone)]
pub struct ConnectionManager {
    rooms: Arc<DashMap<Uuid, DashMap<Uuid, Subscriber>>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
        }
    }

    /// Registers a socket and returns its connection id.
    pub fn join(&self, room_id: Uuid, user_id: Uuid, sender: WsSender) -> Uuid {
        let connection_id = Uuid::new_v4();
        self.rooms
            .entry(room_id)
            .or_default()
            .insert(connection_id, Subscriber { user_id, sender });
        tracing::info!("User {} connected to room {} via WebSocket", user_id, room_id);
        connection_id
    }

    pub fn leave(&self, room_id: Uuid, connection_id: Uuid) {
        if let Some(connections) = self.rooms.get(&room_id) {
            if let Some((_, subscriber)) = connections.remove(&connection_id) {
                tracing::info!(
                    "User {} disconnected from room {}",
                    subscriber.user_id,
                    room_id
                );
            }
        }
        self.rooms.remove_if(&room_id, |_, connections| connections.is_empty());
    }

    /// Sends to every socket in the room. Returns how many accepted the frame.
    pub fn broadcast_to_room(&self, room_id: Uuid, message: WsMessage) -> usize {
        let Some(connections) = self.rooms.get(&room_id) else {
            return 0;
        };
        connections
            .iter()
            .filter(|entry| entry.value().sender.send(message.clone()).is_ok())
            .count()
    }

    /// Distinct users with at least one open socket in the room.
    pub fn online_users(&self, room_id: Uuid) -> Vec<Uuid> {
        let Some(connections) = self.rooms.get(&room_id) else {
            return Vec::new();
        };
        let mut users: Vec<Uuid> = connections.iter().map(|e| e.value().user_id).collect();
        users.sort();
        users.dedup();
        users
    }

    pub fn is_user_online(&self, room_id: Uuid, user_id: Uuid) -> bool {
        self.rooms
            .get(&room_id)
            .map(|connections| connections.iter().any(|e| e.value().user_id == user_id))
            .unwrap_or(false)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::types::ErrorPayload;

    fn frame(text: &str) -> WsMessage {
        WsMessage::Error(ErrorPayload {
            message: text.to_string(),
        })
    }

    #[test]
    fn test_broadcast_reaches_only_the_room() {
        let manager = ConnectionManager::new();
        let (room_a, room_b) = (Uuid::new_v4(), Uuid::new_v4());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        manager.join(room_a, Uuid::new_v4(), tx_a);
        manager.join(room_b, Uuid::new_v4(), tx_b);

        assert_eq!(manager.broadcast_to_room(room_a, frame("hello")), 1);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_user_stays_online_until_last_connection_leaves() {
        let manager = ConnectionManager::new();
        let room = Uuid::new_v4();
        let user = Uuid::new_v4();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        let first = manager.join(room, user, tx1);
        let second = manager.join(room, user, tx2);

        assert_eq!(manager.online_users(room), vec![user]);
        manager.leave(room, first);
        assert!(manager.is_user_online(room, user));
        manager.leave(room, second);
        assert!(!manager.is_user_online(room, user));
        assert!(manager.online_users(room).is_empty());
    }

    #[test]
    fn test_closed_receivers_are_not_counted() {
        let manager = ConnectionManager::new();
        let room = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        manager.join(room, Uuid::new_v4(), tx);
        drop(rx);
        assert_eq!(manager.broadcast_to_room(room, frame("gone")), 0);
        assert_eq!(manager.broadcast_to_room(Uuid::new_v4(), frame("nobody")), 0);
    }
}
