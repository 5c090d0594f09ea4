//! Session reward arithmetic. All-or-nothing: a completed stay earns
//! `round(duration)` XP, anything shorter earns nothing.

use crate::models::user_model::Identity;

pub fn elapsed_minutes(joined_at_ms: i64, now_ms: i64) -> f64 {
    (now_ms - joined_at_ms) as f64 / 60_000.0
}

/// XP earned for a finished session. Zero for guests and for stays shorter
/// than the room duration minus the grace window. Never fractional, never
/// negative.
pub fn session_award(
    identity: &Identity,
    elapsed_minutes: f64,
    duration_minutes: f64,
    grace_minutes: f64,
) -> i64 {
    if matches!(identity, Identity::Guest) {
        return 0;
    }
    if elapsed_minutes < duration_minutes - grace_minutes {
        return 0;
    }
    duration_minutes.round() as i64
}

pub fn level_for_xp(xp: i64, xp_per_level: i64) -> i64 {
    xp / xp_per_level + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRACE: f64 = 1.0;

    fn registered() -> Identity {
        Identity::Registered {
            email: "ada@example.com".to_string(),
            password: "hash".to_string(),
        }
    }

    #[test]
    fn full_stay_earns_rounded_duration() {
        // 25-minute room, left at 24m30s: inside the grace window.
        let award = session_award(&registered(), 24.5, 25.0, GRACE);
        assert_eq!(award, 25);
    }

    #[test]
    fn guest_earns_nothing_even_for_full_stay() {
        assert_eq!(session_award(&Identity::Guest, 24.5, 25.0, GRACE), 0);
        assert_eq!(session_award(&Identity::Guest, 30.0, 25.0, GRACE), 0);
    }

    #[test]
    fn short_stay_earns_nothing() {
        // 10 minutes out of 25: no partial credit.
        assert_eq!(session_award(&registered(), 10.0, 25.0, GRACE), 0);
    }

    #[test]
    fn threshold_is_duration_minus_grace() {
        assert_eq!(session_award(&registered(), 24.0, 25.0, GRACE), 25);
        assert_eq!(session_award(&registered(), 23.999, 25.0, GRACE), 0);
    }

    #[test]
    fn award_is_rounded_never_fractional() {
        assert_eq!(session_award(&registered(), 22.0, 22.5, GRACE), 23);
    }

    #[test]
    fn overstay_earns_the_same_amount() {
        assert_eq!(session_award(&registered(), 90.0, 25.0, GRACE), 25);
    }

    #[test]
    fn elapsed_minutes_from_millis() {
        assert_eq!(elapsed_minutes(0, 1_470_000), 24.5);
        assert_eq!(elapsed_minutes(60_000, 60_000), 0.0);
    }

    #[test]
    fn levels_start_at_one() {
        assert_eq!(level_for_xp(0, 100), 1);
        assert_eq!(level_for_xp(99, 100), 1);
        assert_eq!(level_for_xp(100, 100), 2);
        assert_eq!(level_for_xp(250, 100), 3);
    }
}
