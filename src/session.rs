//! The session context: dispatch surface, snapshots, and subscriptions.
//!
//! A [`GameSession`] is the explicit per-game context object handed to
//! every consumer — board renderer, navigation chrome, tutorial flow,
//! persistence, a future network layer. There is no process-wide
//! singleton: construct one session per active game and thread it to
//! whoever needs it.
//!
//! The session owns the current [`Snapshot`] and the single mutation entry
//! point, [`GameSession::dispatch`]. Every accepted command publishes the
//! new snapshot to all subscribers; a rejected command publishes nothing
//! and returns the typed reason. Snapshots are `Arc`-shared and never
//! mutated after publication, so any number of readers can hold one
//! without observing a partial update.

use crate::game::{Command, GameState, Rejection, reduce};
use crate::movegen;
use crate::storage::Profile;
use crate::types::{Board, GameStatus, MoveRecord, Square};
use std::collections::BTreeSet;
use std::sync::Arc;

/// An immutable, shareable view of the full game state at one instant.
pub type Snapshot = Arc<GameState>;

/// Token returned by [`GameSession::subscribe`], used to unsubscribe.
pub type SubscriberId = u64;

type Subscriber = Box<dyn Fn(&Snapshot)>;

/// One active game session: the current snapshot plus its subscribers.
pub struct GameSession {
    state: Snapshot,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber_id: SubscriberId,
}

impl GameSession {
    /// Creates a session with the default initial state (standard starting
    /// position, `waiting`). A valid snapshot exists before any command is
    /// dispatched.
    pub fn new() -> Self {
        Self::from_state(GameState::new())
    }

    /// Creates a session with a restored profile sub-aggregate (tutorial
    /// progress, lessons, settings) applied over the initial state.
    pub fn with_profile(profile: &Profile) -> Self {
        let mut state = GameState::new();
        profile.apply_to(&mut state);
        Self::from_state(state)
    }

    fn from_state(state: GameState) -> Self {
        Self {
            state: Arc::new(state),
            subscribers: Vec::new(),
            next_subscriber_id: 0,
        }
    }

    /// The current snapshot, cheaply shareable.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.state)
    }

    /// Borrows the current state for ad-hoc reads.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Dispatches a command — the only way state changes.
    ///
    /// On acceptance the new snapshot is published to every subscriber
    /// (in subscription order) and returned. On rejection nothing is
    /// published and the state is unchanged.
    pub fn dispatch(&mut self, command: Command) -> Result<Snapshot, Rejection> {
        match reduce(&self.state, &command) {
            Ok(next) => {
                self.state = Arc::new(next);
                log::debug!(
                    "{} accepted; status={} moves={}",
                    command.name(),
                    self.state.game_status,
                    self.state.moves.len()
                );
                for (_, notify) in &self.subscribers {
                    notify(&self.state);
                }
                Ok(self.snapshot())
            }
            Err(rejection) => {
                log::debug!("{} rejected: {}", command.name(), rejection);
                Err(rejection)
            }
        }
    }

    /// Registers a callback invoked with each newly published snapshot.
    pub fn subscribe(&mut self, subscriber: impl Fn(&Snapshot) + 'static) -> SubscriberId {
        let id = self.next_subscriber_id;
        self.next_subscriber_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Removes a subscriber. Returns `false` for an unknown id.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    // -- granular read selectors -------------------------------------------

    /// The current board.
    pub fn current_board(&self) -> &Board {
        &self.state.board
    }

    /// Legal destinations for the piece on `square` in the current
    /// position (empty set for an empty square).
    pub fn legal_moves_from(&self, square: Square) -> BTreeSet<Square> {
        movegen::legal_destinations(&self.state.board, square, &self.state.moves)
    }

    /// The current game status.
    pub fn status(&self) -> GameStatus {
        self.state.game_status
    }

    /// The move history, oldest first.
    pub fn move_history(&self) -> &[MoveRecord] {
        &self.state.moves
    }

    /// Extracts the persistent profile sub-aggregate from the current
    /// state (what the persistence layer saves).
    pub fn profile(&self) -> Profile {
        Profile::from_state(&self.state)
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mv(from: &str, to: &str) -> Command {
        Command::MovePiece {
            from: Square::from_algebraic(from).unwrap(),
            to: Square::from_algebraic(to).unwrap(),
            promotion: None,
        }
    }

    #[test]
    fn test_subscribers_receive_each_accepted_snapshot() {
        let mut session = GameSession::new();
        let seen: Rc<RefCell<Vec<usize>>> = Rc::default();

        let sink = Rc::clone(&seen);
        session.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.moves.len()));

        session.dispatch(mv("e2", "e4")).unwrap();
        session.dispatch(mv("e7", "e5")).unwrap();

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_rejected_commands_publish_nothing() {
        let mut session = GameSession::new();
        let count = Rc::new(RefCell::new(0u32));

        let sink = Rc::clone(&count);
        session.subscribe(move |_| *sink.borrow_mut() += 1);

        let before = session.snapshot();
        assert!(session.dispatch(mv("e4", "e5")).is_err());

        assert_eq!(*count.borrow(), 0);
        assert_eq!(*before, *session.snapshot());
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut session = GameSession::new();
        let count = Rc::new(RefCell::new(0u32));

        let sink = Rc::clone(&count);
        let id = session.subscribe(move |_| *sink.borrow_mut() += 1);

        session.dispatch(mv("e2", "e4")).unwrap();
        assert!(session.unsubscribe(id));
        assert!(!session.unsubscribe(id));
        session.dispatch(mv("e7", "e5")).unwrap();

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_published_snapshots_are_stable() {
        let mut session = GameSession::new();
        let first = session.dispatch(mv("e2", "e4")).unwrap();
        let second = session.dispatch(mv("e7", "e5")).unwrap();

        // Earlier snapshots are unaffected by later transitions.
        assert_eq!(first.moves.len(), 1);
        assert_eq!(second.moves.len(), 2);
        assert_eq!(first.current_player, Color::Black);
    }

    #[test]
    fn test_selectors_track_dispatches() {
        let mut session = GameSession::new();
        assert_eq!(session.status(), GameStatus::Waiting);

        let e2 = Square::from_algebraic("e2").unwrap();
        assert_eq!(session.legal_moves_from(e2).len(), 2);

        session.dispatch(mv("e2", "e4")).unwrap();
        assert_eq!(session.status(), GameStatus::Playing);
        assert_eq!(session.move_history().len(), 1);
        let e4 = Square::from_algebraic("e4").unwrap();
        assert!(session.current_board().get(e4).is_some());
    }

    #[test]
    fn test_session_restores_profile() {
        let profile = Profile {
            tutorial_progress: 80,
            completed_lessons: vec!["endgames-1".into()],
            ..Profile::default()
        };
        let session = GameSession::with_profile(&profile);

        assert_eq!(session.state().tutorial_progress, 80);
        assert_eq!(session.state().completed_lessons, vec!["endgames-1"]);
        assert_eq!(session.status(), GameStatus::Waiting);
        assert_eq!(session.profile(), profile);
    }
}
