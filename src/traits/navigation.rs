//! Session navigation trait abstraction.
//!
//! When the backend rejects the stored credential, the client abandons the
//! session and routes the user back to the login entry point. What
//! "routing" means depends on the embedding application (a view switch, a
//! URL change, a prompt), so it is injected as a capability.

/// Trait for redirecting an expired session to the login entry point.
pub trait SessionNavigator: Send + Sync {
    /// Route the user back to the login entry point.
    ///
    /// Called after stored credentials have been cleared; must not block.
    fn go_to_login(&self);
}

/// Any `Fn()` closure can serve as a navigator.
impl<F> SessionNavigator for F
where
    F: Fn() + Send + Sync,
{
    fn go_to_login(&self) {
        self()
    }
}
