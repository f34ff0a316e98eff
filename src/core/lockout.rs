//! Failed-login lockout
//!
//! Pure transitions over `LoginState`. Callers store the returned state.

use crate::config::LockoutPolicy;
use crate::types::LoginState;
use chrono::{DateTime, Utc};

/// Whether the account is locked at `now`
pub fn is_locked(state: &LoginState, now: DateTime<Utc>) -> bool {
    state.locked_until.is_some_and(|until| until > now)
}

/// State after a failed login at `now`
///
/// An expired lock starts a fresh count. Reaching `max_attempts` locks the
/// account for `lock_duration`.
pub fn register_failure(state: &LoginState, policy: &LockoutPolicy, now: DateTime<Utc>) -> LoginState {
    let mut next = match state.locked_until {
        Some(until) if until <= now => LoginState::default(),
        _ => *state,
    };

    next.attempts = next.attempts.saturating_add(1);
    if next.attempts >= policy.max_attempts {
        next.locked_until = Some(now + policy.lock_duration);
    }
    next
}

/// State after a successful login
pub fn register_success() -> LoginState {
    LoginState::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap()
    }

    fn fail_times(times: u32, at: DateTime<Utc>) -> LoginState {
        let policy = LockoutPolicy::default();
        (0..times).fold(LoginState::default(), |state, _| {
            register_failure(&state, &policy, at)
        })
    }

    #[test]
    fn test_four_failures_do_not_lock() {
        let state = fail_times(4, now());

        assert_eq!(state.attempts, 4);
        assert!(!is_locked(&state, now()));
    }

    #[test]
    fn test_fifth_failure_locks_for_two_hours() {
        let state = fail_times(5, now());

        assert_eq!(state.locked_until, Some(now() + Duration::hours(2)));
        assert!(is_locked(&state, now() + Duration::minutes(119)));
        assert!(!is_locked(&state, now() + Duration::hours(2)));
    }

    #[test]
    fn test_failure_after_expired_lock_starts_fresh_count() {
        let locked = fail_times(5, now());

        let state = register_failure(&locked, &LockoutPolicy::default(), now() + Duration::hours(3));

        assert_eq!(state.attempts, 1);
        assert_eq!(state.locked_until, None);
    }

    #[test]
    fn test_success_resets_state() {
        let state = register_success();

        assert_eq!(state, LoginState::default());
        assert!(!is_locked(&state, now()));
    }
}
