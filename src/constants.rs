//! Configuration constants for the session core
//!
//! This module contains the limits and constraints used throughout the
//! library to bound externally-supplied content and keep session
//! documents small enough for snapshot delivery.

/// Session-level configuration constants
pub mod session {
    /// Maximum number of players allowed in a single session
    pub const MAX_PLAYER_COUNT: usize = 64;
}

/// Join flow configuration constants
pub mod join {
    /// Maximum length of a player display name in characters
    pub const MAX_NAME_LENGTH: usize = 30;
}

/// Question-sequenced game configuration constants
pub mod quiz {
    /// Maximum number of questions in a single quiz
    pub const MAX_QUESTIONS_COUNT: usize = 100;
    /// Maximum length of a question text in characters
    pub const MAX_QUESTION_LENGTH: usize = 200;
    /// Maximum number of answer options per question
    pub const MAX_OPTION_COUNT: usize = 8;
    /// Maximum length of a single answer option in characters
    pub const MAX_OPTION_LENGTH: usize = 200;
}

/// Cooperative board game configuration constants
pub mod board {
    /// Maximum number of rows or columns in a puzzle grid
    pub const MAX_GRID_DIMENSION: usize = 32;
    /// Maximum number of words in a word search or crossword
    pub const MAX_WORDS_COUNT: usize = 64;
    /// Maximum length of a single puzzle word in characters
    pub const MAX_WORD_LENGTH: usize = 32;
}

/// Independent (per-participant) game configuration constants
pub mod solo {
    /// Maximum number of items/cards/pairs in an independent game
    pub const MAX_ITEMS_COUNT: usize = 64;
    /// Maximum length of a single item label in characters
    pub const MAX_ITEM_LENGTH: usize = 100;
}
