//! Mock session navigator for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::traits::SessionNavigator;

/// Records login redirects instead of performing them.
#[derive(Debug, Clone, Default)]
pub struct MockNavigator {
    redirects: Arc<AtomicUsize>,
}

impl MockNavigator {
    /// Create a new mock navigator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `go_to_login` was invoked.
    pub fn login_redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl SessionNavigator for MockNavigator {
    fn go_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}
