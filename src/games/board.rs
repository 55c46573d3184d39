//! Cooperative board game content (crossword, word search, unscramble)
//!
//! All participants observe and affect one shared puzzle state. The
//! shared state lives under the session document's `boardState` key;
//! local progress events are merged into the latest known state and the
//! complete merged value is written back, relying on the store's
//! wholesale replacement of patched top-level keys.
//!
//! Initial arrangements are deterministic (identity order by original
//! content index) so that every subscriber derives byte-identical
//! starting state from the same content. Random shuffles are reserved
//! for independent single-player games where nothing synchronizes.

use std::collections::BTreeMap;

use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Orientation of a crossword entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Left to right
    Across,
    /// Top to bottom
    Down,
}

/// One word placement in a crossword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CrosswordEntry {
    /// The solution word
    #[garde(length(chars, min = 1, max = crate::constants::board::MAX_WORD_LENGTH))]
    pub word: String,
    /// Row of the first letter
    #[garde(range(max = crate::constants::board::MAX_GRID_DIMENSION))]
    pub row: usize,
    /// Column of the first letter
    #[garde(range(max = crate::constants::board::MAX_GRID_DIMENSION))]
    pub col: usize,
    /// Orientation of the word
    #[garde(skip)]
    pub direction: Direction,
    /// The clue shown for this word
    #[garde(length(chars, min = 1))]
    pub clue: String,
}

/// Static content of a cooperative crossword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CrosswordContent {
    /// Number of grid rows
    #[garde(range(min = 1, max = crate::constants::board::MAX_GRID_DIMENSION))]
    pub rows: usize,
    /// Number of grid columns
    #[garde(range(min = 1, max = crate::constants::board::MAX_GRID_DIMENSION))]
    pub cols: usize,
    /// The word placements
    #[garde(length(min = 1, max = crate::constants::board::MAX_WORDS_COUNT), dive)]
    pub entries: Vec<CrosswordEntry>,
}

/// Static content of a cooperative word search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct WordSearchContent {
    /// The letter grid, one string per row
    #[garde(length(min = 1, max = crate::constants::board::MAX_GRID_DIMENSION))]
    pub grid: Vec<String>,
    /// The words hidden in the grid
    #[garde(
        length(min = 1, max = crate::constants::board::MAX_WORDS_COUNT),
        inner(length(chars, min = 1, max = crate::constants::board::MAX_WORD_LENGTH))
    )]
    pub words: Vec<String>,
}

/// Static content of a cooperative letter-unscramble puzzle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct UnscrambleContent {
    /// The target word to assemble
    #[garde(length(chars, min = 2, max = crate::constants::board::MAX_WORD_LENGTH))]
    pub word: String,
}

impl UnscrambleContent {
    /// The individual letters of the target word, in content order
    pub fn letters(&self) -> Vec<char> {
        self.word.chars().collect_vec()
    }
}

/// Key addressing one crossword cell in the shared state
///
/// Stringly keyed so the cell map stays a plain JSON object on the wire.
fn cell_key(row: usize, col: usize) -> String {
    format!("{row}:{col}")
}

/// Shared cooperative puzzle progress
///
/// Lives under the session's `boardState` key. The variant must match
/// the session's game type; that is a weak invariant enforced only by
/// client logic, so [`BoardState::merged`] ignores mismatched progress
/// instead of corrupting state. `BTreeMap` keeps serialization order
/// deterministic across clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BoardState {
    /// Crossword grid contents: filled cells keyed by `row:col`
    Crossword {
        /// The letters placed so far
        cells: BTreeMap<String, char>,
    },
    /// Word search progress: the words discovered so far
    WordSearch {
        /// Discovered words in discovery order
        found: Vec<String>,
    },
    /// Unscramble progress: current letter arrangement
    Unscramble {
        /// Positions into the content's letter list, in display order
        arrangement: Vec<usize>,
    },
}

/// A local progress event on a cooperative board
///
/// Each event reduces to a partial update of the board state: new
/// keys/values overwrite matching keys, unrelated keys stay untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Progress {
    /// A crossword cell was filled with a letter
    FillCell {
        /// Row of the cell
        row: usize,
        /// Column of the cell
        col: usize,
        /// The letter placed
        letter: char,
    },
    /// A crossword cell was cleared
    ClearCell {
        /// Row of the cell
        row: usize,
        /// Column of the cell
        col: usize,
    },
    /// A hidden word was discovered in the word search
    FindWord {
        /// The discovered word
        word: String,
    },
    /// A letter tile was moved to a new position in the arrangement
    MoveLetter {
        /// Current position of the tile
        from: usize,
        /// Target position of the tile
        to: usize,
    },
}

impl BoardState {
    /// Returns a copy of this state with the progress event merged in
    ///
    /// Merge semantics per event: cell fills overwrite the one matching
    /// cell key, word finds append once (the first finder holds the
    /// discovery), letter moves reorder the arrangement in place.
    /// Progress of a different puzzle kind leaves the state unchanged.
    pub fn merged(&self, progress: &Progress) -> BoardState {
        let mut next = self.clone();
        match (&mut next, progress) {
            (BoardState::Crossword { cells }, Progress::FillCell { row, col, letter }) => {
                cells.insert(cell_key(*row, *col), *letter);
            }
            (BoardState::Crossword { cells }, Progress::ClearCell { row, col }) => {
                cells.remove(&cell_key(*row, *col));
            }
            (BoardState::WordSearch { found }, Progress::FindWord { word }) => {
                if !found.iter().any(|f| f == word) {
                    found.push(word.clone());
                }
            }
            (BoardState::Unscramble { arrangement }, Progress::MoveLetter { from, to }) => {
                if *from < arrangement.len() && *to < arrangement.len() {
                    let tile = arrangement.remove(*from);
                    arrangement.insert(*to, tile);
                }
            }
            // Mismatched kind: drop the event rather than corrupt state.
            _ => {}
        }
        next
    }
}

impl CrosswordContent {
    /// The deterministic initial state: an empty grid
    pub fn initial_state(&self) -> BoardState {
        BoardState::Crossword {
            cells: BTreeMap::new(),
        }
    }
}

impl WordSearchContent {
    /// The deterministic initial state: nothing found yet
    pub fn initial_state(&self) -> BoardState {
        BoardState::WordSearch { found: Vec::new() }
    }
}

impl UnscrambleContent {
    /// The deterministic initial state: identity order by content index
    ///
    /// Every subscriber derives the same starting arrangement from the
    /// same content; a random shuffle here would desynchronize clients.
    pub fn initial_state(&self) -> BoardState {
        BoardState::Unscramble {
            arrangement: (0..self.letters().len()).collect_vec(),
        }
    }
}

/// One crossword clue as the viewer should render it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClueView {
    /// Row of the first letter
    pub row: usize,
    /// Column of the first letter
    pub col: usize,
    /// Orientation of the word
    pub direction: Direction,
    /// The clue text
    pub clue: String,
    /// Length of the solution word in letters
    pub length: usize,
}

/// View-model of a cooperative board: static content merged with the
/// shared progress from the latest snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BoardView {
    /// Crossword grid with clues and the cells filled so far
    Crossword {
        /// Number of grid rows
        rows: usize,
        /// Number of grid columns
        cols: usize,
        /// The clues to display
        clues: Vec<ClueView>,
        /// The letters placed so far, keyed by `row:col`
        cells: BTreeMap<String, char>,
    },
    /// Word search grid with the words found so far
    WordSearch {
        /// The letter grid, one string per row
        grid: Vec<String>,
        /// All words to find
        words: Vec<String>,
        /// The words already discovered
        found: Vec<String>,
    },
    /// Unscramble tiles in their current shared arrangement
    Unscramble {
        /// The letters in display order
        letters: Vec<char>,
    },
}

impl CrosswordContent {
    /// Derives the crossword view from this content and shared state
    ///
    /// State of a mismatched kind degrades to the empty grid rather
    /// than failing the render.
    pub fn view(&self, state: &BoardState) -> BoardView {
        let cells = match state {
            BoardState::Crossword { cells } => cells.clone(),
            _ => BTreeMap::new(),
        };
        BoardView::Crossword {
            rows: self.rows,
            cols: self.cols,
            clues: self
                .entries
                .iter()
                .map(|entry| ClueView {
                    row: entry.row,
                    col: entry.col,
                    direction: entry.direction,
                    clue: entry.clue.clone(),
                    length: entry.word.chars().count(),
                })
                .collect_vec(),
            cells,
        }
    }
}

impl WordSearchContent {
    /// Derives the word search view from this content and shared state
    pub fn view(&self, state: &BoardState) -> BoardView {
        let found = match state {
            BoardState::WordSearch { found } => found.clone(),
            _ => Vec::new(),
        };
        BoardView::WordSearch {
            grid: self.grid.clone(),
            words: self.words.clone(),
            found,
        }
    }
}

impl UnscrambleContent {
    /// Derives the unscramble view from this content and shared state
    ///
    /// Arrangement positions outside the letter list are skipped, so a
    /// stale or malformed state still renders something sensible.
    pub fn view(&self, state: &BoardState) -> BoardView {
        let letters = self.letters();
        let arranged = match state {
            BoardState::Unscramble { arrangement } => arrangement
                .iter()
                .filter_map(|&i| letters.get(i).copied())
                .collect_vec(),
            _ => letters,
        };
        BoardView::Unscramble { letters: arranged }
    }
}
