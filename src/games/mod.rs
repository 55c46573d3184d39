//! Game content adapter
//!
//! This module maps a session's static `gameData` plus its mutable
//! synchronization fields (`currentQuestionIndex`, `sharedAnswer`,
//! `boardState`) into the concrete per-game-type view-model, and routes
//! local progress back into document patches. Each game family lives in
//! its own module with an independently testable contract:
//! question-sequenced games in [`quiz`], cooperative boards in
//! [`board`], independent games in [`solo`].

pub mod board;
pub mod quiz;
pub mod solo;

use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::{
    participant::Role,
    session::{Session, Status},
};

/// The synchronization family a game belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameKind {
    /// One question at a time, advanced by the host, shared answer lock
    QuestionSequenced,
    /// One shared puzzle state affected by all participants
    Cooperative,
    /// Private per-participant play, no synchronization at all
    Independent,
}

/// The static content of the selected game, fixed at session creation
///
/// Exactly one `GameData` exists per session. The variant determines
/// which synchronization contract applies and which view-model the
/// adapter derives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, derive_more::From)]
#[serde(rename_all = "camelCase")]
pub enum GameData {
    /// A question-sequenced trivia quiz
    Quiz(#[garde(dive)] quiz::QuizContent),
    /// A cooperative crossword
    Crossword(#[garde(dive)] board::CrosswordContent),
    /// A cooperative word search
    WordSearch(#[garde(dive)] board::WordSearchContent),
    /// A cooperative letter-unscramble puzzle
    Unscramble(#[garde(dive)] board::UnscrambleContent),
    /// An independent matching game
    Matching(#[garde(dive)] solo::MatchingContent),
    /// An independent memory game
    Memory(#[garde(dive)] solo::MemoryContent),
    /// An independent sorting game
    Sorting(#[garde(dive)] solo::SortingContent),
}

impl GameData {
    /// The synchronization family of this game
    pub fn kind(&self) -> GameKind {
        match self {
            GameData::Quiz(_) => GameKind::QuestionSequenced,
            GameData::Crossword(_) | GameData::WordSearch(_) | GameData::Unscramble(_) => {
                GameKind::Cooperative
            }
            GameData::Matching(_) | GameData::Memory(_) | GameData::Sorting(_) => {
                GameKind::Independent
            }
        }
    }

    /// Number of questions, for question-sequenced games only
    pub fn question_count(&self) -> Option<usize> {
        match self {
            GameData::Quiz(content) => Some(content.count()),
            _ => None,
        }
    }

    /// Checks an answer against the question at `index`
    ///
    /// Returns `None` for non-quiz games and for out-of-range indexes.
    pub fn check_answer(&self, index: usize, answer: &str) -> Option<bool> {
        match self {
            GameData::Quiz(content) => content.check(index, answer),
            _ => None,
        }
    }

    /// The deterministic initial board state, for cooperative games only
    ///
    /// Derived purely from content so every subscriber computes the
    /// same value; independent and question-sequenced games have no
    /// board state at all.
    pub fn initial_board_state(&self) -> Option<board::BoardState> {
        match self {
            GameData::Crossword(content) => Some(content.initial_state()),
            GameData::WordSearch(content) => Some(content.initial_state()),
            GameData::Unscramble(content) => Some(content.initial_state()),
            _ => None,
        }
    }
}

/// The screen a client should render, derived from a session snapshot
#[derive(Debug, Clone, PartialEq, Serialize, derive_more::From)]
pub enum ViewModel {
    /// Lobby: the session has not started yet
    Waiting,
    /// An active question-sequenced game
    Question(quiz::QuestionView),
    /// An active cooperative board
    Board(board::BoardView),
    /// An independent game, played privately
    Solo(solo::SoloView),
    /// The session has ended (or content ran out)
    Finished,
}

/// Derives the view-model for one participant from a session snapshot
///
/// Pure function of `(viewer role, snapshot)`: no I/O, no local state.
/// Malformed or missing content degrades to the `Finished` view rather
/// than failing the render.
pub fn view_model(session: &Session, viewer: Role) -> ViewModel {
    match session.status {
        Status::Waiting => ViewModel::Waiting,
        Status::Finished => ViewModel::Finished,
        Status::Active => match &session.game_data {
            GameData::Quiz(content) => content
                .view(
                    session.current_question_index,
                    session.shared_answer.as_deref(),
                    session.answer_feedback,
                    viewer,
                )
                .map_or(ViewModel::Finished, ViewModel::Question),
            GameData::Crossword(content) => {
                board_view(session, |state| content.view(state), || content.initial_state())
            }
            GameData::WordSearch(content) => {
                board_view(session, |state| content.view(state), || content.initial_state())
            }
            GameData::Unscramble(content) => {
                board_view(session, |state| content.view(state), || content.initial_state())
            }
            GameData::Matching(content) => ViewModel::Solo(solo::SoloView::Matching(content.clone())),
            GameData::Memory(content) => ViewModel::Solo(solo::SoloView::Memory(content.clone())),
            GameData::Sorting(content) => ViewModel::Solo(solo::SoloView::Sorting(content.clone())),
        },
    }
}

/// Renders a cooperative board from the snapshot's state, falling back
/// to the deterministic initial state when the snapshot carries none
fn board_view(
    session: &Session,
    view: impl Fn(&board::BoardState) -> board::BoardView,
    initial: impl Fn() -> board::BoardState,
) -> ViewModel {
    let state = session.board_state.clone().unwrap_or_else(initial);
    ViewModel::Board(view(&state))
}
