//! Connection configuration for dbchat.
//!
//! Validates connection settings, opens database handles and caches them
//! process-wide so sessions can share them.

pub mod cache;
pub mod configurator;
pub mod descriptor;

use std::sync::Arc;

use crate::db::DatabaseClient;

pub use cache::{HandleCache, DEFAULT_TTL};
pub use configurator::{ConnectionConfigurator, Connector, SqlxConnector};
pub use descriptor::{
    encode_credential, ConnectionDescriptor, ConnectionForm, RemoteDetails,
    INCOMPLETE_REMOTE_MESSAGE,
};

/// A database handle shared between sessions.
pub type SharedClient = Arc<dyn DatabaseClient>;
