// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Lifecycle milestones and navigation wait conditions
//
// Browsers report page-load progress per frame as named lifecycle events
// (`Page.lifecycleEvent` in CDP). Callers ask for those milestones using the
// lower-case `waitUntil` aliases below.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A canonical lifecycle milestone as reported by the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// `DOMContentLoaded` fired for the frame's document
    #[serde(rename = "DOMContentLoaded")]
    DomContentLoaded,
    /// The `load` event fired for the frame's document
    #[serde(rename = "load")]
    Load,
    /// No network connections for at least 500ms
    #[serde(rename = "networkIdle")]
    NetworkIdle,
    /// No more than 2 network connections for at least 500ms
    #[serde(rename = "networkAlmostIdle")]
    NetworkAlmostIdle,
}

impl LifecycleEvent {
    /// Returns the protocol name of the milestone.
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::DomContentLoaded => "DOMContentLoaded",
            LifecycleEvent::Load => "load",
            LifecycleEvent::NetworkIdle => "networkIdle",
            LifecycleEvent::NetworkAlmostIdle => "networkAlmostIdle",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When to consider navigation succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaitUntil {
    /// Consider navigation finished when the `load` event is fired
    #[serde(rename = "load")]
    Load,
    /// Consider navigation finished when the `DOMContentLoaded` event is fired
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    /// Consider navigation finished when there are no network connections for at least 500ms
    #[serde(rename = "networkidle0")]
    NetworkIdle0,
    /// Consider navigation finished when there are no more than 2 network connections
    /// for at least 500ms
    #[serde(rename = "networkidle2")]
    NetworkIdle2,
}

impl WaitUntil {
    /// Returns the caller-facing alias.
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "domcontentloaded",
            WaitUntil::NetworkIdle0 => "networkidle0",
            WaitUntil::NetworkIdle2 => "networkidle2",
        }
    }

    /// Translates the alias into the milestone the browser reports.
    pub fn milestone(&self) -> LifecycleEvent {
        match self {
            WaitUntil::Load => LifecycleEvent::Load,
            WaitUntil::DomContentLoaded => LifecycleEvent::DomContentLoaded,
            WaitUntil::NetworkIdle0 => LifecycleEvent::NetworkIdle,
            WaitUntil::NetworkIdle2 => LifecycleEvent::NetworkAlmostIdle,
        }
    }
}

impl FromStr for WaitUntil {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "load" => Ok(WaitUntil::Load),
            "domcontentloaded" => Ok(WaitUntil::DomContentLoaded),
            "networkidle0" => Ok(WaitUntil::NetworkIdle0),
            "networkidle2" => Ok(WaitUntil::NetworkIdle2),
            other => Err(Error::InvalidWaitCondition(other.to_string())),
        }
    }
}

impl fmt::Display for WaitUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Translates caller aliases into the set of milestones to wait for.
///
/// Fails on the first unknown alias, and on an empty list.
pub fn expected_lifecycle<I, S>(wait_until: I) -> Result<Vec<LifecycleEvent>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut expected = Vec::new();
    for alias in wait_until {
        let milestone = alias.as_ref().parse::<WaitUntil>()?.milestone();
        if !expected.contains(&milestone) {
            expected.push(milestone);
        }
    }
    if expected.is_empty() {
        return Err(Error::InvalidWaitCondition(
            "at least one value is required".to_string(),
        ));
    }
    Ok(expected)
}

/// Which kinds of navigation count as success.
///
/// Set on the [`FrameManager`](crate::server::frame_manager::FrameManager) and read by every
/// watcher at the moment it decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentNavigation {
    /// Only navigations that replace the document
    New,
    /// Only same-document navigations (history API, fragment changes)
    Same,
    /// Either kind
    #[default]
    All,
}

impl DocumentNavigation {
    pub fn accepts_new_document(&self) -> bool {
        matches!(self, DocumentNavigation::New | DocumentNavigation::All)
    }

    pub fn accepts_same_document(&self) -> bool {
        matches!(self, DocumentNavigation::Same | DocumentNavigation::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_translation_table() {
        let expected =
            expected_lifecycle(["domcontentloaded", "networkidle0", "networkidle2", "load"])
                .unwrap();
        assert_eq!(
            expected,
            vec![
                LifecycleEvent::DomContentLoaded,
                LifecycleEvent::NetworkIdle,
                LifecycleEvent::NetworkAlmostIdle,
                LifecycleEvent::Load,
            ]
        );
    }

    #[test]
    fn test_unknown_alias_is_rejected() {
        let err = expected_lifecycle(["load", "bogus"]).unwrap_err();
        match err {
            Error::InvalidWaitCondition(value) => assert_eq!(value, "bogus"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_aliases_are_case_sensitive() {
        assert!("DOMContentLoaded".parse::<WaitUntil>().is_err());
        assert!("Load".parse::<WaitUntil>().is_err());
    }

    #[test]
    fn test_empty_alias_list_is_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            expected_lifecycle(empty),
            Err(Error::InvalidWaitCondition(_))
        ));
    }

    #[test]
    fn test_duplicate_aliases_collapse() {
        let expected = expected_lifecycle(["load", "load"]).unwrap();
        assert_eq!(expected, vec![LifecycleEvent::Load]);
    }

    #[test]
    fn test_wait_until_serialization() {
        assert_eq!(
            serde_json::to_string(&WaitUntil::NetworkIdle2).unwrap(),
            "\"networkidle2\""
        );
        assert_eq!(
            serde_json::to_string(&LifecycleEvent::DomContentLoaded).unwrap(),
            "\"DOMContentLoaded\""
        );
    }

    #[test]
    fn test_document_navigation_interest() {
        assert!(DocumentNavigation::All.accepts_new_document());
        assert!(DocumentNavigation::All.accepts_same_document());
        assert!(DocumentNavigation::New.accepts_new_document());
        assert!(!DocumentNavigation::New.accepts_same_document());
        assert!(!DocumentNavigation::Same.accepts_new_document());
        assert!(DocumentNavigation::Same.accepts_same_document());
    }
}
