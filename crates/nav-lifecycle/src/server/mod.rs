//! Collaborators of the navigation watcher (internal)
//!
//! This module holds the frame tree manager, the network tracker, the session and
//! the connection loop that feeds them protocol events.
//!
//! **Note**: These types are public so callers can drive them from their own
//! transport and so integration tests can reach them. They mirror only as much of
//! the browser protocol as navigation tracking needs.

pub mod connection;
pub mod events;
pub mod frame_manager;
pub mod network_manager;
pub mod session;
