// Declare modules at the root level
pub mod catalog;
pub mod domain;
pub mod error;
pub mod keys;
pub mod ladder;
pub mod reconcile;
pub mod store;
pub mod time;
pub mod update;
pub mod validators;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::catalog;
    pub use super::domain;
    pub use super::error;
    pub use super::keys;
    pub use super::ladder;
    pub use super::reconcile;
    pub use super::store;
    pub use super::time;
    pub use super::update;
    pub use super::validators;
}

// Also re-export at root for convenience
pub use catalog::*;
pub use domain::*;
pub use keys::*;
pub use reconcile::*;
pub use store::*;
pub use time::*;
pub use update::*;
pub use validators::*;
