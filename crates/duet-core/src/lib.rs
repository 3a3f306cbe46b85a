//! duet-core: everything the board needs that is not HTTP.
//!
//! - [`role`]: the two sender roles.
//! - [`message`]: content normalization, validation and the stored row type.
//! - [`access`]: access configuration (credential table or shared token) and
//!   the gate decision made for every request.
//! - [`store`]: the [`store::MessageStore`] contract with SQLite and
//!   PostgreSQL implementations.

pub mod access;
pub mod error;
pub mod message;
pub mod role;
pub mod store;

pub use access::{AccessConfig, Account, GateInput, Verdict};
pub use error::{AccessConfigError, ContentError, RoleParseError, StoreError};
pub use message::{Message, MessageContent, MAX_CONTENT_CHARS};
pub use role::Role;
pub use store::{ListOrder, MessageStore};
