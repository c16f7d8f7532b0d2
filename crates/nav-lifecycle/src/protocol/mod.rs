// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Protocol Objects - Rust representations of the browser objects navigation reads
//
// Architecture:
// - Objects are created and mutated by the managers in `server` as protocol events arrive
// - Everything outside `server` only reads them

pub mod frame;
pub mod lifecycle;
pub mod request;
pub mod response;

pub use frame::Frame;
pub use lifecycle::{DocumentNavigation, LifecycleEvent, WaitUntil, expected_lifecycle};
pub use request::Request;
pub use response::Response;
