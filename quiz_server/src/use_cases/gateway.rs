// Realtime fan-out: binds connections to sessions and broadcasts registry changes.

use crate::domain::{Identity, SessionError, SessionId};
use crate::use_cases::session_registry::SessionRegistry;
use crate::use_cases::types::{Binding, InboundEvent, RoomEvent, StartOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

/// Owns one broadcast channel per session and the registry mutations that feed them.
///
/// Every mutation commits to the registry and publishes its event inside the
/// same `rooms` critical section, so per-session events leave in commit order.
/// Nothing in here awaits while the lock is held.
#[derive(Debug)]
pub struct Gateway {
    registry: Arc<SessionRegistry>,
    rooms: Mutex<HashMap<SessionId, broadcast::Sender<RoomEvent>>>,
    room_capacity: usize,
}

impl Gateway {
    pub fn new(registry: Arc<SessionRegistry>, room_capacity: usize) -> Self {
        Self {
            registry,
            rooms: Mutex::new(HashMap::new()),
            room_capacity: room_capacity.max(1),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Opens a new, unbound connection.
    pub fn connect(self: &Arc<Self>) -> Connection {
        Connection {
            gateway: self.clone(),
            binding: None,
            room_rx: None,
        }
    }

    /// Current non-admin count, read under the same lock that orders broadcasts.
    pub fn participant_count(&self, session_id: &SessionId) -> usize {
        let _rooms = self.lock_rooms();
        self.registry.participant_count(session_id)
    }

    fn join(
        &self,
        session_id: &SessionId,
        identity: &Identity,
    ) -> (broadcast::Receiver<RoomEvent>, usize) {
        let mut rooms = self.lock_rooms();
        let room = rooms
            .entry(session_id.clone())
            .or_insert_with(|| broadcast::channel(self.room_capacity).0);
        // Subscribe before publishing so the joiner sees its own count update.
        let room_rx = room.subscribe();
        let count = self.registry.join(session_id, identity);
        let _ = room.send(RoomEvent::ParticipantCount {
            session_id: session_id.clone(),
            count,
        });
        (room_rx, count)
    }

    fn rejoin(&self, binding: &Binding) -> usize {
        let rooms = self.lock_rooms();
        let count = self.registry.join(&binding.session_id, &binding.identity);
        if let Some(room) = rooms.get(&binding.session_id) {
            let _ = room.send(RoomEvent::ParticipantCount {
                session_id: binding.session_id.clone(),
                count,
            });
        }
        count
    }

    // Callers must drop their receiver first so the leaver is not notified.
    fn leave(&self, binding: &Binding) -> usize {
        let mut rooms = self.lock_rooms();
        let count = self.registry.leave(&binding.session_id, &binding.identity);
        let drained = rooms
            .get(&binding.session_id)
            .is_some_and(|room| room.receiver_count() == 0);
        if drained {
            rooms.remove(&binding.session_id);
        } else if let Some(room) = rooms.get(&binding.session_id) {
            let _ = room.send(RoomEvent::ParticipantCount {
                session_id: binding.session_id.clone(),
                count,
            });
        }
        count
    }

    fn start_quiz(&self, session_id: &SessionId) -> StartOutcome {
        let rooms = self.lock_rooms();
        if !self.registry.has_members(session_id) {
            return StartOutcome::UnknownSession;
        }
        let Some(room) = rooms.get(session_id) else {
            return StartOutcome::UnknownSession;
        };
        let notified = room
            .send(RoomEvent::QuizStarted {
                session_id: session_id.clone(),
            })
            .unwrap_or(0);
        StartOutcome::Started { notified }
    }

    fn lock_rooms(&self) -> MutexGuard<'_, HashMap<SessionId, broadcast::Sender<RoomEvent>>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One client's view of the gateway.
///
/// Holds at most one binding. Cleanup runs exactly once: on `disconnect`, or
/// on drop if the transport task ends some other way.
#[derive(Debug)]
pub struct Connection {
    gateway: Arc<Gateway>,
    binding: Option<Binding>,
    room_rx: Option<broadcast::Receiver<RoomEvent>>,
}

impl Connection {
    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Dispatches an inbound event. Only joins produce an acknowledgment.
    pub fn handle(&mut self, event: InboundEvent) -> Option<Result<usize, SessionError>> {
        match event {
            InboundEvent::JoinRoom {
                session_id,
                identity,
            } => Some(self.join_room(&session_id, &identity)),
            InboundEvent::LeaveRoom => {
                self.leave_room();
                None
            }
            InboundEvent::StartQuiz { session_id } => {
                self.start_quiz(&session_id);
                None
            }
        }
    }

    /// Binds this connection to a session and broadcasts the new count.
    ///
    /// Invalid input is rejected before any state changes. Joining a different
    /// session first releases the current binding.
    pub fn join_room(&mut self, session_id: &str, identity: &str) -> Result<usize, SessionError> {
        let session_id = SessionId::parse(session_id)?;
        let identity = Identity::parse(identity)?;
        let binding = Binding {
            session_id,
            identity,
        };

        if self.binding.as_ref() == Some(&binding) {
            return Ok(self.gateway.rejoin(&binding));
        }

        self.leave_room();
        let (room_rx, count) = self.gateway.join(&binding.session_id, &binding.identity);
        debug!(
            session_id = %binding.session_id,
            identity = %binding.identity,
            count,
            "joined session"
        );
        self.room_rx = Some(room_rx);
        self.binding = Some(binding);
        Ok(count)
    }

    /// Releases the current binding, if any. Returns whether one existed.
    pub fn leave_room(&mut self) -> bool {
        self.room_rx = None;
        let Some(binding) = self.binding.take() else {
            return false;
        };
        let count = self.gateway.leave(&binding);
        debug!(
            session_id = %binding.session_id,
            identity = %binding.identity,
            count,
            "left session"
        );
        true
    }

    /// Broadcasts `quiz_started` when requested by the admin identity.
    /// Does not touch the quiz-active flag.
    pub fn start_quiz(&self, session_id: &str) -> StartOutcome {
        let is_admin = self
            .binding
            .as_ref()
            .is_some_and(|binding| self.gateway.registry.is_admin(&binding.identity));
        if !is_admin {
            warn!(session_id, "start_quiz rejected: caller is not the admin");
            return StartOutcome::NotAdmin;
        }

        let Ok(session_id) = SessionId::parse(session_id) else {
            warn!("start_quiz ignored: missing session id");
            return StartOutcome::UnknownSession;
        };
        let outcome = self.gateway.start_quiz(&session_id);
        match &outcome {
            StartOutcome::Started { notified } => {
                info!(session_id = %session_id, notified, "quiz started")
            }
            _ => warn!(session_id = %session_id, "start_quiz ignored: session has no members"),
        }
        outcome
    }

    /// Waits for the next event of the bound session. Pending while unbound.
    ///
    /// A receiver that falls behind is moved to the channel tail and handed a
    /// fresh count snapshot, so it never observes counts out of commit order.
    pub async fn next_event(&mut self) -> RoomEvent {
        loop {
            let Some(room_rx) = self.room_rx.as_mut() else {
                return std::future::pending().await;
            };
            match room_rx.recv().await {
                Ok(event) => return event,
                Err(RecvError::Lagged(missed)) => {
                    *room_rx = room_rx.resubscribe();
                    if let Some(binding) = &self.binding {
                        warn!(missed, session_id = %binding.session_id, "room events lagged; sending snapshot");
                        return RoomEvent::ParticipantCount {
                            session_id: binding.session_id.clone(),
                            count: self.gateway.participant_count(&binding.session_id),
                        };
                    }
                }
                Err(RecvError::Closed) => {
                    self.room_rx = None;
                }
            }
        }
    }

    /// Transport-level disconnect. Consumes the connection.
    pub fn disconnect(mut self) {
        if !self.leave_room() {
            debug!("connection closed without a session binding");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.leave_room();
    }
}
