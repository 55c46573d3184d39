//! Per-tab session controller
//!
//! A `SessionClient` is the one object a connected tab holds: it
//! creates or joins a session, owns the snapshot subscription, caches
//! the latest snapshot, and turns user intents into document patches by
//! running the pure state machine against that snapshot.
//!
//! Failure policy per the error design: store failures surface as typed
//! errors for the caller to display, with no automatic retry; action
//! rejections (wrong role, wrong phase, answer already locked) are
//! local no-ops reported as `Ok(false)`; malformed snapshots degrade to
//! the previous known state and never crash the view.

use std::{cell::RefCell, rc::Rc};

use serde_json::Value;
use thiserror::Error;

use crate::{
    SESSIONS_COLLECTION,
    games::{self, GameData, ViewModel, board},
    join,
    participant::{Id, Role},
    session::{ActionError, Session, SessionPatch},
    session_code::SessionCode,
    store::{self, DocumentStore, Subscription},
};

/// Maximum attempts to find a free session code before giving up
const MAX_CODE_ATTEMPTS: usize = 16;

/// Errors surfaced to the acting user
#[derive(Error, Debug)]
pub enum Error {
    /// The session code does not name an existing session
    ///
    /// Terminal for the join screen; never retried automatically.
    #[error("session not found")]
    SessionNotFound,
    /// No free session code could be found
    #[error("could not allocate a session code")]
    CodesExhausted,
    /// The requested display name was rejected
    #[error(transparent)]
    Name(#[from] join::Error),
    /// The store failed to apply an operation
    #[error(transparent)]
    Store(#[from] store::Error),
    /// The session document could not be interpreted
    #[error("session document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// One client's connection to a shared session
///
/// Generic over the store implementation so the whole controller is
/// testable against [`store::MemoryStore`] and deployable against a
/// hosted adapter.
pub struct SessionClient<S: DocumentStore> {
    /// The document store this client patches and watches
    store: S,
    /// The session this client is connected to
    code: SessionCode,
    /// This client's role; host authority is this flag, nothing more
    role: Role,
    /// This client's identity, cached for the lifetime of the tab
    ///
    /// Caching is what makes joining effectively idempotent per tab:
    /// repeated actions reuse this identity instead of re-joining.
    participant: Id,
    /// Latest snapshot delivered by the subscription (if watching)
    latest: Rc<RefCell<Option<Session>>>,
    /// Active snapshot subscription, if any
    subscription: Option<S::Subscription>,
}

impl<S: DocumentStore> SessionClient<S> {
    /// Creates a new session and returns its host client
    ///
    /// Generates a fresh session code, retrying on collision, and
    /// persists the initial document (`waiting`, question index 0, no
    /// players).
    pub fn host(store: S, game_data: GameData) -> Result<Self, Error> {
        let host_id = Id::new();

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = SessionCode::new();
            let session = Session::new(code, game_data.clone(), host_id);
            match store.create(SESSIONS_COLLECTION, &code.to_string(), session.to_document()?) {
                Ok(()) => {
                    tracing::info!(%code, "hosting session");
                    return Ok(Self {
                        store,
                        code,
                        role: Role::Host,
                        participant: host_id,
                        latest: Rc::new(RefCell::new(Some(session))),
                        subscription: None,
                    });
                }
                Err(store::Error::AlreadyExists) => {}
                Err(error) => return Err(error.into()),
            }
        }
        Err(Error::CodesExhausted)
    }

    /// Joins an existing session as a player
    ///
    /// Reads the session document, validates the display name, and
    /// registers the new identity with a field patch scoped to this
    /// participant's `players` entry.
    pub fn join(store: S, code: SessionCode, name: &str) -> Result<Self, Error> {
        let document = match store.read(SESSIONS_COLLECTION, &code.to_string()) {
            Ok(document) => document,
            Err(store::Error::NotFound) => return Err(Error::SessionNotFound),
            Err(error) => return Err(error.into()),
        };
        let mut session: Session = serde_json::from_value(Value::Object(document))?;

        let registration = join::register(&session, name)?;
        store.patch_field(
            SESSIONS_COLLECTION,
            &code.to_string(),
            &registration.patch.path,
            registration.patch.value.clone(),
        )?;
        tracing::info!(%code, participant = %registration.participant, "joined session");

        // Seed the local snapshot with the entry just written, so the
        // client renders sensibly before the first snapshot arrives.
        session.players.insert(
            registration.participant,
            crate::session::PlayerEntry::new(registration.name.clone()),
        );

        Ok(Self {
            store,
            code,
            role: Role::Player,
            participant: registration.participant,
            latest: Rc::new(RefCell::new(Some(session))),
            subscription: None,
        })
    }

    /// The session code this client is connected to
    pub fn code(&self) -> SessionCode {
        self.code
    }

    /// This client's role
    pub fn role(&self) -> Role {
        self.role
    }

    /// This client's cached identity
    pub fn participant_id(&self) -> Id {
        self.participant
    }

    /// Starts watching the session's snapshot stream
    ///
    /// Replaces any previous subscription. A snapshot that fails to
    /// deserialize is logged and dropped; the previous snapshot stays
    /// current rather than poisoning the view.
    pub fn watch(&mut self) {
        self.unwatch();

        let latest = Rc::clone(&self.latest);
        let subscription = self.store.subscribe(
            SESSIONS_COLLECTION,
            &self.code.to_string(),
            Box::new(move |document| {
                match serde_json::from_value::<Session>(Value::Object(document.clone())) {
                    Ok(session) => {
                        *latest.borrow_mut() = Some(session);
                    }
                    Err(error) => {
                        tracing::warn!(%error, "ignoring malformed session snapshot");
                    }
                }
            }),
        );
        self.subscription = Some(subscription);
    }

    /// Stops watching the session's snapshot stream
    ///
    /// Called when the tab navigates away. This is the only
    /// cancellation primitive: patches already sent cannot be recalled.
    pub fn unwatch(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
        }
    }

    /// The latest known session snapshot, if any
    pub fn snapshot(&self) -> Option<Session> {
        self.latest.borrow().clone()
    }

    /// Derives the screen this client should render
    pub fn view(&self) -> Result<ViewModel, Error> {
        Ok(games::view_model(&self.current()?, self.role))
    }

    /// Starts the game (host only)
    pub fn start(&self) -> Result<bool, Error> {
        let session = self.current()?;
        self.act(session.start(self.role))
    }

    /// Advances to the next question or finishes the game (host only)
    pub fn advance_question(&self) -> Result<bool, Error> {
        let session = self.current()?;
        self.act(session.advance_question(self.role))
    }

    /// Ends the session (host only)
    pub fn end_session(&self) -> Result<bool, Error> {
        let session = self.current()?;
        self.act(session.end_session(self.role))
    }

    /// Declares the cooperative puzzle complete (host only)
    pub fn complete_board(&self) -> Result<bool, Error> {
        let session = self.current()?;
        self.act(session.complete_board(self.role))
    }

    /// Submits a cooperative answer for the current question
    pub fn submit_answer(&self, answer: &str) -> Result<bool, Error> {
        let session = self.current()?;
        self.act(session.submit_answer(answer))
    }

    /// Records local progress on the cooperative board
    pub fn record_board_progress(&self, progress: &board::Progress) -> Result<bool, Error> {
        let session = self.current()?;
        self.act(session.record_board_progress(progress))
    }

    /// Awards a point to a player (host only)
    pub fn award_point(&self, player: Id) -> Result<bool, Error> {
        let session = self.current()?;
        match session.award_point(self.role, player) {
            Ok(field) => {
                self.store.patch_field(
                    SESSIONS_COLLECTION,
                    &self.code.to_string(),
                    &field.path,
                    field.value,
                )?;
                Ok(true)
            }
            Err(rejection) => Ok(Self::rejected(&rejection)),
        }
    }

    /// The session as this client currently knows it
    ///
    /// Uses the cached snapshot when watching, falling back to a direct
    /// read otherwise.
    fn current(&self) -> Result<Session, Error> {
        if let Some(session) = self.latest.borrow().clone() {
            return Ok(session);
        }
        match self.store.read(SESSIONS_COLLECTION, &self.code.to_string()) {
            Ok(document) => Ok(serde_json::from_value(Value::Object(document))?),
            Err(store::Error::NotFound) => Err(Error::SessionNotFound),
            Err(error) => Err(error.into()),
        }
    }

    /// Sends an accepted patch, or drops a rejected action locally
    fn act(&self, action: Result<SessionPatch, ActionError>) -> Result<bool, Error> {
        match action {
            Ok(patch) => {
                self.store
                    .patch(SESSIONS_COLLECTION, &self.code.to_string(), patch.to_document()?)?;
                Ok(true)
            }
            Err(rejection) => Ok(Self::rejected(&rejection)),
        }
    }

    /// Logs a local rejection; always evaluates to `false`
    fn rejected(rejection: &ActionError) -> bool {
        tracing::debug!(%rejection, "action rejected locally");
        false
    }
}

impl<S: DocumentStore> Drop for SessionClient<S> {
    /// Detaches the snapshot listener when the tab goes away
    fn drop(&mut self) {
        self.unwatch();
    }
}
