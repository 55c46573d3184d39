//! Session document and state machine
//!
//! This module defines the authoritative shape of a live session
//! document and the legal transitions between its status values. Every
//! transition is expressed as a partial-document patch: the store
//! applies patches without validation, so legality is enforced only by
//! the pure, role-gated action methods here. A logically adversarial
//! client could bypass them; that is a known trust assumption of the
//! single-classroom deployment, not a property this layer can provide.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;
use web_time::SystemTime;

use crate::{
    games::{GameData, GameKind, board},
    participant::{Id, Role},
    session_code::SessionCode,
    store::Document,
};

/// The lifecycle phase of a session
///
/// Status only advances forward along `Waiting → Active → Finished`;
/// no action ever rewinds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Lobby phase: players are joining, the game has not started
    Waiting,
    /// The game is in progress
    Active,
    /// Terminal phase: the game has ended
    Finished,
}

impl Status {
    /// Returns `true` if no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Finished)
    }

    /// Returns `true` if moving to `next` only advances forward
    ///
    /// Used by tests to assert monotonicity over arbitrary patch
    /// sequences produced by the action methods.
    pub fn may_transition_to(self, next: Status) -> bool {
        let rank = |s: Status| match s {
            Status::Waiting => 0,
            Status::Active => 1,
            Status::Finished => 2,
        };
        rank(next) >= rank(self)
    }
}

/// One entry in the session's `players` map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// The display name the player joined with
    pub name: String,
    /// The player's accumulated score
    #[serde(default)]
    pub score: u64,
}

impl PlayerEntry {
    /// Creates a fresh entry for a newly joined player
    pub fn new(name: String) -> Self {
        Self { name, score: 0 }
    }
}

/// The single shared document representing one live game instance
///
/// One document exists per session, read and patched by every
/// subscribed client. `game_data` is fixed at creation; all other
/// mutable fields change only through the action methods below.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The session's shareable identifier, immutable after creation
    pub session_id: SessionCode,
    /// Current lifecycle phase
    pub status: Status,
    /// Static content of the selected game, fixed at creation
    pub game_data: GameData,
    /// Index of the current question (question-sequenced games only)
    pub current_question_index: usize,
    /// The answer currently locked for all cooperative participants
    pub shared_answer: Option<String>,
    /// Correctness of `shared_answer`; always paired with it
    pub answer_feedback: Option<bool>,
    /// Cooperative puzzle progress (cooperative board games only)
    pub board_state: Option<board::BoardState>,
    /// Joined participants keyed by their identity
    pub players: HashMap<Id, PlayerEntry>,
    /// Identity of the creating client; not cryptographically enforced
    pub host_id: Id,
    /// Creation time of the document
    pub created_at: SystemTime,
}

/// A partial update to a session document
///
/// Fields left as `None` are absent from the serialized patch and are
/// preserved by the store's shallow merge. The doubly-optional fields
/// distinguish "leave untouched" (outer `None`) from "clear to null"
/// (`Some(None)`), which question advances rely on.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    /// New lifecycle phase, if transitioning
    pub status: Option<Status>,
    /// New question index, if advancing
    pub current_question_index: Option<usize>,
    /// Set or clear the shared answer
    #[serde(default, with = "serde_with::rust::double_option")]
    pub shared_answer: Option<Option<String>>,
    /// Set or clear the answer feedback
    #[serde(default, with = "serde_with::rust::double_option")]
    pub answer_feedback: Option<Option<bool>>,
    /// Replacement value for the cooperative board state
    pub board_state: Option<board::BoardState>,
}

impl SessionPatch {
    /// Serializes the patch into a store document for shallow merging
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            // A struct with named fields always serializes to an object.
            _ => unreachable!("session patch serializes to an object"),
        }
    }
}

/// A surgical update to one nested field of a session document
///
/// Produced by actions that must not clobber sibling entries of a
/// shared map, such as join registration and score awards.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPatch {
    /// Dotted path of the field to set, e.g. `players.<id>`
    pub path: String,
    /// The new value for that field
    pub value: Value,
}

/// Rejections produced by the action methods
///
/// Every rejection is a local no-op: the caller drops the action and
/// sends nothing to the store. The UI should not expose host controls
/// to non-hosts in the first place; the variants here are the
/// defensive backstop for when it does anyway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// A host-only action was attempted by a non-host
    #[error("only the host may perform this action")]
    NotHost,
    /// The action is not legal in the session's current phase
    #[error("action is not legal while the session is {0:?}")]
    WrongPhase(Status),
    /// An answer is already locked for the current question
    #[error("an answer is already locked for this question")]
    AnswerTaken,
    /// The action does not apply to this session's game type
    #[error("action does not apply to this game type")]
    WrongGameKind,
    /// The question index points outside the game content
    #[error("no question exists at the current index")]
    NoCurrentQuestion,
    /// The referenced player is not registered in this session
    #[error("player is not part of this session")]
    UnknownPlayer,
}

impl Session {
    /// Creates the initial session document for a host
    ///
    /// The session starts in the `Waiting` phase with no players. For
    /// cooperative board games the initial board state is derived
    /// deterministically from the game content, so every subscriber
    /// renders the same starting arrangement.
    pub fn new(session_id: SessionCode, game_data: GameData, host_id: Id) -> Self {
        let board_state = game_data.initial_board_state();
        Self {
            session_id,
            status: Status::Waiting,
            game_data,
            current_question_index: 0,
            shared_answer: None,
            answer_feedback: None,
            board_state,
            players: HashMap::new(),
            host_id,
            created_at: SystemTime::now(),
        }
    }

    /// Serializes the full session into a store document
    pub fn to_document(&self) -> Result<Document, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => unreachable!("session serializes to an object"),
        }
    }

    /// Applies a patch locally, mirroring the store's shallow merge
    ///
    /// The store applies patches blindly; so does this. Invariants hold
    /// because the action methods only ever produce legal patches.
    pub fn apply(&mut self, patch: &SessionPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(index) = patch.current_question_index {
            self.current_question_index = index;
        }
        if let Some(answer) = &patch.shared_answer {
            self.shared_answer = answer.clone();
        }
        if let Some(feedback) = &patch.answer_feedback {
            self.answer_feedback = *feedback;
        }
        if let Some(board) = &patch.board_state {
            self.board_state = Some(board.clone());
        }
    }

    /// Starts the game: `Waiting → Active` (host only)
    pub fn start(&self, role: Role) -> Result<SessionPatch, ActionError> {
        if !role.is_host() {
            return Err(ActionError::NotHost);
        }
        match self.status {
            Status::Waiting => Ok(SessionPatch {
                status: Some(Status::Active),
                ..SessionPatch::default()
            }),
            other => Err(ActionError::WrongPhase(other)),
        }
    }

    /// Advances to the next question, or finishes the game (host only)
    ///
    /// Bumps `current_question_index` and clears the answer pair in the
    /// same patch, keeping the pairing invariant atomic with respect to
    /// snapshot delivery. When the next index would run past the end of
    /// the question list, the session transitions to `Finished` instead
    /// and the index stays at its last valid value.
    pub fn advance_question(&self, role: Role) -> Result<SessionPatch, ActionError> {
        if !role.is_host() {
            return Err(ActionError::NotHost);
        }
        if self.status != Status::Active {
            return Err(ActionError::WrongPhase(self.status));
        }
        let count = self
            .game_data
            .question_count()
            .ok_or(ActionError::WrongGameKind)?;

        let next = self.current_question_index + 1;
        if next >= count {
            Ok(SessionPatch {
                status: Some(Status::Finished),
                shared_answer: Some(None),
                answer_feedback: Some(None),
                ..SessionPatch::default()
            })
        } else {
            Ok(SessionPatch {
                current_question_index: Some(next),
                shared_answer: Some(None),
                answer_feedback: Some(None),
                ..SessionPatch::default()
            })
        }
    }

    /// Ends the session explicitly: `Waiting/Active → Finished` (host only)
    ///
    /// A host may also abort a lobby that never started; the transition
    /// stays forward-only either way.
    pub fn end_session(&self, role: Role) -> Result<SessionPatch, ActionError> {
        if !role.is_host() {
            return Err(ActionError::NotHost);
        }
        match self.status {
            Status::Waiting | Status::Active => Ok(SessionPatch {
                status: Some(Status::Finished),
                ..SessionPatch::default()
            }),
            other => Err(ActionError::WrongPhase(other)),
        }
    }

    /// Declares a cooperative puzzle complete: `Active → Finished` (host only)
    ///
    /// The adapter never judges puzzle completion itself; the host
    /// makes that call based on game-specific logic outside this core.
    pub fn complete_board(&self, role: Role) -> Result<SessionPatch, ActionError> {
        if !role.is_host() {
            return Err(ActionError::NotHost);
        }
        if self.game_data.kind() != GameKind::Cooperative {
            return Err(ActionError::WrongGameKind);
        }
        match self.status {
            Status::Active => Ok(SessionPatch {
                status: Some(Status::Finished),
                ..SessionPatch::default()
            }),
            other => Err(ActionError::WrongPhase(other)),
        }
    }

    /// Submits a cooperative answer for the current question
    ///
    /// First-writer-wins: once `shared_answer` is set, later submissions
    /// are rejected untouched until the host advances. The lock is only
    /// an is-it-already-set check against the latest snapshot; two
    /// submissions racing before either patch lands can both "win" and
    /// the store keeps whichever patch applies last. Accepted data loss
    /// for this domain.
    pub fn submit_answer(&self, answer: &str) -> Result<SessionPatch, ActionError> {
        if self.status != Status::Active {
            return Err(ActionError::WrongPhase(self.status));
        }
        if self.game_data.kind() != GameKind::QuestionSequenced {
            return Err(ActionError::WrongGameKind);
        }
        if self.shared_answer.is_some() {
            return Err(ActionError::AnswerTaken);
        }
        let correct = self
            .game_data
            .check_answer(self.current_question_index, answer)
            .ok_or(ActionError::NoCurrentQuestion)?;

        Ok(SessionPatch {
            shared_answer: Some(Some(answer.to_owned())),
            answer_feedback: Some(Some(correct)),
            ..SessionPatch::default()
        })
    }

    /// Records local cooperative-board progress as a board patch
    ///
    /// The progress delta is merged into the latest known board state
    /// (new keys overwrite matching keys, unrelated keys untouched) and
    /// the complete merged value is emitted for the `boardState` key,
    /// matching the store's wholesale-replace semantics for patched
    /// top-level keys.
    pub fn record_board_progress(
        &self,
        progress: &board::Progress,
    ) -> Result<SessionPatch, ActionError> {
        if self.status != Status::Active {
            return Err(ActionError::WrongPhase(self.status));
        }
        if self.game_data.kind() != GameKind::Cooperative {
            return Err(ActionError::WrongGameKind);
        }
        let board = self
            .board_state
            .clone()
            .or_else(|| self.game_data.initial_board_state())
            .ok_or(ActionError::WrongGameKind)?;

        Ok(SessionPatch {
            board_state: Some(board.merged(progress)),
            ..SessionPatch::default()
        })
    }

    /// Awards a point to a player (host only)
    ///
    /// Emits a field patch scoped to the one player's score so that
    /// concurrent joins and awards never clobber each other's entries.
    pub fn award_point(&self, role: Role, player: Id) -> Result<FieldPatch, ActionError> {
        if !role.is_host() {
            return Err(ActionError::NotHost);
        }
        let entry = self.players.get(&player).ok_or(ActionError::UnknownPlayer)?;
        Ok(FieldPatch {
            path: format!("players.{player}.score"),
            value: Value::from(entry.score + 1),
        })
    }
}
