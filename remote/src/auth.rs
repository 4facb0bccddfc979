//! Session token lifecycle (§4.3 "authenticate... refresh the session
//! token once per long interval (≈7 days) or on demand", §4.8 item 3).

use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// The bearer token currently attached to outgoing requests, plus when
/// it was last (re)issued.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    issued_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set(&mut self, token: String, issued_at: DateTime<Utc>) {
        self.token = Some(token);
        self.issued_at = Some(issued_at);
    }

    /// Whether the session token is absent or older than
    /// `refresh_interval_days` and should be refreshed before the next
    /// request (§4.8 item 3: the token refresher task runs on this
    /// interval; this also lets an ad-hoc caller force an on-demand
    /// refresh by checking right before a call).
    pub fn needs_refresh(&self, refresh_interval_days: u64, now: DateTime<Utc>) -> bool {
        match self.issued_at {
            None => true,
            Some(issued_at) => now - issued_at >= ChronoDuration::days(refresh_interval_days as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_needs_no_refresh() {
        let mut session = Session::default();
        let now = Utc::now();
        session.set("tok".into(), now);
        assert!(!session.needs_refresh(7, now));
    }

    #[test]
    fn stale_session_needs_refresh() {
        let mut session = Session::default();
        let issued_at = Utc::now() - ChronoDuration::days(8);
        session.set("tok".into(), issued_at);
        assert!(session.needs_refresh(7, Utc::now()));
    }

    #[test]
    fn unset_session_needs_refresh() {
        assert!(Session::default().needs_refresh(7, Utc::now()));
    }
}
