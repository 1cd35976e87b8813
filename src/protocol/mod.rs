//! Protocol types for the relay transport
//!
//! This module contains the canonical client/server event catalog.

mod events;

pub use events::{ClientEvent, Mutation, ServerEvent, WsMessage};
