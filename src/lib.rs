//! Normalized kanban board state with confirmed-write remote sync.
//!
//! The store ([`store::BoardStore`]) keeps columns, cards and members
//! in byId/allIds form; the operations in [`ops`] are the only way to
//! change it and each one keeps the referential invariants intact.
//! [`session::BoardSession`] wraps every operation with a remote
//! round-trip: the server confirms first (and assigns ids), then the
//! confirmed payload is applied locally.

pub mod api;
pub mod client;
pub mod config;
pub mod ops;
pub mod session;
pub mod store;
pub mod types;

pub use api::{ApiError, BoardApi, CardPatch, CheckItemPatch, ChecklistPatch, ColumnPatch};
pub use client::HttpBoardApi;
pub use config::RemoteConfig;
pub use session::{BoardSession, SessionError};
pub use store::{BoardStore, Collection, StoreError};
pub use types::{
    Attachment, BoardSnapshot, Card, CardUpdate, CheckItem, CheckItemState, Checklist, Column,
    Comment, Member,
};
