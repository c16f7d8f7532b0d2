// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Options for waiting on a navigation
//
// Mirrors the `waitUntil`/`timeout` pair accepted by navigation methods across
// Playwright and Puppeteer bindings.

use crate::protocol::lifecycle::WaitUntil;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for [`FrameManager::wait_for_navigation`](crate::server::frame_manager::FrameManager::wait_for_navigation)
///
/// Unset fields fall back to a 30 second timeout and waiting for `load`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationOptions {
    /// Maximum navigation time in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,

    /// Milestones that must be reached by the frame and all its children
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait_until: Option<Vec<WaitUntil>>,
}

impl NavigationOptions {
    /// Creates new NavigationOptions with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_secs_f64() * 1000.0);
        self
    }

    /// Adds a milestone to wait for
    pub fn wait_until(mut self, wait_until: WaitUntil) -> Self {
        self.wait_until.get_or_insert_with(Vec::new).push(wait_until);
        self
    }

    /// Returns the timeout to apply, falling back to the crate default.
    ///
    /// `None` means wait without a ceiling: a timeout of 0 disables it, and so does
    /// one too large (or not finite) to be represented as a `Duration`.
    pub fn effective_timeout(&self) -> Option<Duration> {
        let millis = self.timeout.unwrap_or(crate::DEFAULT_TIMEOUT_MS);
        if millis.is_nan() || millis <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(millis / 1000.0).ok()
    }

    /// Returns the milestones to wait for, falling back to `load`.
    pub fn effective_wait_until(&self) -> Vec<WaitUntil> {
        match &self.wait_until {
            Some(wait_until) if !wait_until.is_empty() => wait_until.clone(),
            _ => vec![WaitUntil::Load],
        }
    }
}
