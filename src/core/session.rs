use crate::core::observable::Observable;
use crate::domain::model::Session;
use tokio::sync::watch;

/// Current session identity, `None` while signed out.
///
/// Credential checks belong to the authentication provider; the gate only
/// carries the resulting identity to whoever subscribes.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    current: Observable<Option<Session>>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, session: Session) {
        tracing::info!("Session started for {}", session.user_id);
        self.current.set(Some(session));
    }

    pub fn sign_out(&self) {
        if let Some(session) = self.current.get() {
            tracing::info!("Session ended for {}", session.user_id);
        }
        self.current.set(None);
    }

    pub fn current(&self) -> Option<Session> {
        self.current.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.get().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_and_out() {
        let gate = SessionGate::new();
        assert!(!gate.is_authenticated());

        gate.sign_in(Session::new("user-1"));
        assert_eq!(gate.current(), Some(Session::new("user-1")));

        gate.sign_out();
        assert!(gate.current().is_none());
    }
}
