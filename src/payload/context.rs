//! Ambient context collaborators.
//!
//! The builder never reaches for host globals: page location, navigator and
//! screen data come from a `ContextProvider`, and the current user lives in
//! a `Session` owned by the coordinator.

use super::schema::{Context, Dimensions, RequestInfo, UserIdentity};
use parking_lot::RwLock;

/// Host state captured at build time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSnapshot {
    pub url: String,
    pub user_agent: String,
    pub language: String,
    pub viewport: Dimensions,
    pub screen: Dimensions,
}

impl PageSnapshot {
    /// Context block for an event (no performance data)
    pub fn to_context(&self) -> Context {
        Context {
            url: self.url.clone(),
            user_agent: self.user_agent.clone(),
            language: self.language.clone(),
            viewport: self.viewport,
            screen: self.screen,
            performance: None,
        }
    }

    /// Request block for an event
    pub fn to_request(&self) -> RequestInfo {
        RequestInfo {
            url: self.url.clone(),
        }
    }
}

/// Read-only, synchronous source of host context
pub trait ContextProvider: Send + Sync {
    fn snapshot(&self) -> PageSnapshot;
}

/// Provider that always returns the same snapshot
///
/// Used by the CLI and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticContextProvider {
    snapshot: PageSnapshot,
}

impl StaticContextProvider {
    pub fn new(snapshot: PageSnapshot) -> Self {
        Self { snapshot }
    }
}

impl ContextProvider for StaticContextProvider {
    fn snapshot(&self) -> PageSnapshot {
        self.snapshot.clone()
    }
}

/// Process-wide current user, read by every build
#[derive(Debug, Default)]
pub struct Session {
    user: RwLock<Option<UserIdentity>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user(&self, user: UserIdentity) {
        *self.user.write() = Some(user);
    }

    pub fn clear_user(&self) {
        *self.user.write() = None;
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.user.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_set_and_clear() {
        let session = Session::new();
        assert_eq!(session.current_user(), None);

        session.set_user(UserIdentity {
            id: Some("u1".to_string()),
            email: Some("u1@example.com".to_string()),
            name: None,
        });
        assert_eq!(session.current_user().unwrap().id.as_deref(), Some("u1"));

        session.clear_user();
        assert_eq!(session.current_user(), None);
    }

    #[test]
    fn test_snapshot_to_context_has_no_performance() {
        let snapshot = PageSnapshot {
            url: "https://app.example.com/a".to_string(),
            viewport: Dimensions {
                width: 800,
                height: 600,
            },
            ..Default::default()
        };
        let context = snapshot.to_context();
        assert_eq!(context.url, "https://app.example.com/a");
        assert_eq!(context.viewport.width, 800);
        assert!(context.performance.is_none());
        assert_eq!(snapshot.to_request().url, "https://app.example.com/a");
    }
}
