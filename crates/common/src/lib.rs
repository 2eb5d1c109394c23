//! Common types and traits shared across Vitalis crates.
//!
//! This crate provides the foundational abstractions the routing core and the
//! capability crates use to communicate: the dispatch error taxonomy, the
//! `Tool` and `ConversationSink` traits, and the shared domain/intent enums.

pub mod dispatch;
pub mod error;
pub mod tool;
pub mod turn;

pub use dispatch::{
    parse_params, DispatchError, DispatchErrorKind, DispatchResult, Domain, Intent,
};
pub use error::{Result, VitalisError};
pub use tool::Tool;
pub use turn::{ConversationSink, ConversationTurn, HistoryEntry, TurnRole};
