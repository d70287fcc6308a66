//! Deposit period / exit period
//!
//! The phase is never stored. It is re-derived from the optional exit start
//! time on every call, so reaching the exit time needs no transition call.

use odra::prelude::*;

/// Global phase of the ledger
#[odra::odra_type]
#[derive(Copy, Default)]
pub enum Phase {
    /// No exit scheduled, deposits open
    #[default]
    Accepting = 0,
    /// Exit scheduled but not reached, deposits still open
    ExitScheduled = 1,
    /// Exit reached: no deposits, claim manager may withdraw and claim
    Exited = 2,
}

impl Phase {
    /// Exit is active once `now >= exit_start`.
    pub fn at(exit_start: Option<u64>, now: u64) -> Self {
        match exit_start {
            None => Phase::Accepting,
            Some(exit) if now < exit => Phase::ExitScheduled,
            Some(_) => Phase::Exited,
        }
    }

    pub fn accepts_deposits(self) -> bool {
        self != Phase::Exited
    }

    pub fn exit_active(self) -> bool {
        self == Phase::Exited
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscheduled_is_accepting() {
        assert_eq!(Phase::at(None, 0), Phase::Accepting);
        assert_eq!(Phase::at(None, u64::MAX), Phase::Accepting);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        assert_eq!(Phase::at(Some(100), 99), Phase::ExitScheduled);
        assert_eq!(Phase::at(Some(100), 100), Phase::Exited);
        assert_eq!(Phase::at(Some(100), 101), Phase::Exited);
    }

    #[test]
    fn test_gates() {
        assert!(Phase::ExitScheduled.accepts_deposits());
        assert!(!Phase::ExitScheduled.exit_active());
        assert!(!Phase::Exited.accepts_deposits());
        assert!(Phase::Exited.exit_active());
        assert_eq!(Phase::Exited.as_u8(), 2);
    }
}
