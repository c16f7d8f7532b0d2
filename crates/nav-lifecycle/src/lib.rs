//! nav-lifecycle: navigation completion tracking for browser automation
//!
//! A browser reports page-load progress as a stream of independent, out-of-order
//! events: lifecycle milestones per frame, frames attaching and detaching, requests
//! starting. This crate fuses that stream, across a frame and all of its descendant
//! frames, into one outcome delivered exactly once to the caller waiting on a
//! navigation.
//!
//! # Examples
//!
//! ## Waiting for a navigation
//!
//! ```ignore
//! use nav_lifecycle::server::connection::Connection;
//! use nav_lifecycle::{FrameManager, NavigationOptions, WaitUntil};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = FrameManager::new();
//!     let connection = Arc::new(Connection::new(Arc::clone(&manager)));
//!
//!     // Feed protocol events from your transport into `message_tx`
//!     let (message_tx, message_rx) = tokio::sync::mpsc::unbounded_channel();
//!     tokio::spawn({
//!         let connection = Arc::clone(&connection);
//!         async move { connection.run(message_rx).await }
//!     });
//!
//!     let frame = manager.main_frame().expect("main frame reported");
//!     let options = NavigationOptions::new()
//!         .timeout(Duration::from_secs(10))
//!         .wait_until(WaitUntil::NetworkIdle2);
//!
//!     // Start the navigation, then:
//!     let response = manager.wait_for_navigation(&frame, Some(options)).await?;
//!     if let Some(response) = response {
//!         println!("{} {}", response.status(), response.url());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Using a watcher directly
//!
//! ```ignore
//! use nav_lifecycle::{Error, LifecycleWatcher};
//! use std::time::Duration;
//!
//! let watcher = LifecycleWatcher::new(&manager, &frame, ["domcontentloaded"], Duration::from_secs(5))?;
//! match watcher.wait().await {
//!     Ok(()) => println!("navigated"),
//!     Err(Error::TerminatedFrameDetached) => println!("frame went away"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

// Collaborators (exposed for integration tests and custom transports)
pub mod server;

pub mod api;
mod error;
mod lifecycle_watcher;
pub mod protocol;

/// Default timeout in milliseconds for navigation waits.
///
/// Matches the standard default across Playwright and Puppeteer bindings.
pub const DEFAULT_TIMEOUT_MS: f64 = 30000.0;

// Re-export error types
pub use error::{Error, Result};

// Re-export the watcher
pub use lifecycle_watcher::{
    LifecycleWatcher, NavigationOutcome, TerminationReason, check_lifecycle,
};

// Re-export protocol objects and wait conditions
pub use protocol::{DocumentNavigation, Frame, LifecycleEvent, Request, Response, WaitUntil};

// Re-export collaborators
pub use server::frame_manager::FrameManager;
pub use server::network_manager::NetworkManager;
pub use server::session::Session;

// Re-export navigation options
pub use api::NavigationOptions;
