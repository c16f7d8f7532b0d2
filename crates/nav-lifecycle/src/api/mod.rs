// Public API types module
//
// High-level option types used by the navigation APIs. These types provide builder
// patterns and ergonomic interfaces over the lower-level watcher.

pub mod navigation_options;

pub use navigation_options::NavigationOptions;
