//! Extension trait for Depot to easily access sessions

use salvo_core::Depot;

use crate::session::Session;

pub(crate) const SESSION_KEY: &str = "salvo.session.store";

/// Extension trait for Salvo's Depot to provide easy session access
pub trait SessionDepotExt {
    /// Get a reference to the request's session
    fn session(&self) -> Option<&Session>;

    /// Get the request's session for fetching and mutation
    fn session_mut(&mut self) -> Option<&mut Session>;
}

impl SessionDepotExt for Depot {
    fn session(&self) -> Option<&Session> {
        self.get::<Session>(SESSION_KEY).ok()
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        self.get_mut::<Session>(SESSION_KEY).ok()
    }
}
