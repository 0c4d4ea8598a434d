//! # Event System
//!
//! Bounded crossbeam channels carrying scene-wide notifications.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │  Collision  │─────>│   Event     │─────>│   Script    │
//! │   system    │      │   Channel   │      │  dispatch   │
//! └─────────────┘      └─────────────┘      └─────────────┘
//!        ▲                                        │
//!        └──────── scripts may emit too ◀─────────┘
//! ```
//!
//! Producers never block: a full channel drops the event and logs a
//! warning so the frame keeps its budget.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;

use crate::ecs::EntityId;
use crate::math::Vec2;

/// Input forwarded from the platform layer.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// A key went down.
    KeyPressed {
        /// Platform key code.
        key: u32,
        /// Auto-repeat rather than a fresh press.
        repeat: bool,
    },
    /// A key went up.
    KeyReleased {
        /// Platform key code.
        key: u32,
    },
    /// The cursor moved.
    MouseMoved {
        /// Cursor position in window pixels.
        position: Vec2,
    },
    /// The window changed size.
    Resized {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
    /// The user asked to close the window.
    Quit,
}

/// Notifications delivered to native scripts.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    /// Platform input.
    Input(InputEvent),

    /// Two colliders overlap and at least one is a trigger.
    Trigger {
        /// First collider.
        a: EntityId,
        /// Second collider.
        b: EntityId,
    },

    /// Two solid colliders collided and were separated.
    Collision {
        /// First collider.
        a: EntityId,
        /// Second collider.
        b: EntityId,
        /// Contact normal, pointing from `a` towards `b`.
        normal: Vec2,
        /// Overlap depth before correction.
        penetration: f32,
    },
}

impl SceneEvent {
    /// Entities the event concerns; `None` for input.
    #[must_use]
    pub fn entities(&self) -> Option<(EntityId, EntityId)> {
        match self {
            Self::Input(_) => None,
            Self::Trigger { a, b } | Self::Collision { a, b, .. } => Some((*a, *b)),
        }
    }
}

/// Bounded multi-producer event channel.
///
/// Pre-allocates the channel so the hot path never grows memory.
pub struct EventBus<E> {
    sender: Sender<E>,
    receiver: Receiver<E>,
}

impl<E> EventBus<E> {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight; further sends are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender<E> {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver<E> {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

/// Handle for sending events.
pub struct EventSender<E> {
    sender: Sender<E>,
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E> EventSender<E> {
    /// Sends an event without blocking.
    ///
    /// Returns `false` if the channel is full or closed; the event is dropped.
    #[inline]
    pub fn send(&self, event: E) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(capacity = ?self.sender.capacity(), "event channel full, event dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
pub struct EventReceiver<E> {
    receiver: Receiver<E>,
}

impl<E> Clone for EventReceiver<E> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
        }
    }
}

impl<E> EventReceiver<E> {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<E> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<E> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_send_receive() {
        let bus = EventBus::new(16);
        let sender = bus.sender();
        let receiver = bus.receiver();

        let event = SceneEvent::Trigger {
            a: EntityId::new(1, 0),
            b: EntityId::new(2, 0),
        };
        assert!(sender.send(event.clone()));
        assert!(receiver.has_events());
        assert_eq!(receiver.try_recv(), Some(event));
        assert_eq!(receiver.try_recv(), None);
    }

    #[test]
    fn test_full_channel_drops() {
        let bus = EventBus::new(2);
        let sender = bus.sender();
        let receiver = bus.receiver();

        assert!(sender.send(SceneEvent::Input(InputEvent::Quit)));
        assert!(sender.send(SceneEvent::Input(InputEvent::Quit)));
        assert!(!sender.send(SceneEvent::Input(InputEvent::Quit)));

        assert_eq!(receiver.drain().len(), 2);
        assert_eq!(receiver.pending_count(), 0);
    }

    #[test]
    fn test_event_entities() {
        let a = EntityId::new(4, 0);
        let b = EntityId::new(5, 0);
        let event = SceneEvent::Collision {
            a,
            b,
            normal: Vec2::X,
            penetration: 0.5,
        };
        assert_eq!(event.entities(), Some((a, b)));
        assert_eq!(SceneEvent::Input(InputEvent::Quit).entities(), None);
    }
}
