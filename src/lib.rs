//! # Classplay Session Library
//!
//! This library provides the synchronization core for a multiplayer
//! classroom quiz/game application. Players join a shared session by a
//! short code, a host drives progression, and all participants render
//! consistent game state purely from eventually-delivered snapshots of a
//! single shared session document.
//!
//! There is no server-side arbitration: every connected client reads and
//! patches the same document through a narrow [`store::DocumentStore`]
//! seam, and the legality of state transitions is enforced only by the
//! pure, role-gated actions in [`session`]. The per-game-type view
//! derivation and progress-to-patch reduction live in [`games`].

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::struct_field_names)]

pub mod client;
pub mod constants;
pub mod games;
pub mod join;
pub mod participant;
pub mod session;
pub mod session_code;
pub mod store;

pub use client::SessionClient;
pub use participant::{Id, Role};
pub use session::{Session, SessionPatch, Status};
pub use session_code::SessionCode;

/// Name of the store collection holding live session documents.
///
/// Every session lives as a single document in this collection, keyed by
/// the string form of its [`SessionCode`].
pub const SESSIONS_COLLECTION: &str = "sessions";
