//! Vote state machine.
//!
//! Each (voter, rating) pair is in one of three states. Voting the current
//! direction again cancels the vote; voting the opposite direction flips it.
//!
//! | From      | Action | To        | upvotes | downvotes | net |
//! |-----------|--------|-----------|---------|-----------|-----|
//! | NoVote    | +1     | UpVoted   | +1      |           | +1  |
//! | NoVote    | -1     | DownVoted |         | +1        | -1  |
//! | UpVoted   | +1     | NoVote    | -1      |           | -1  |
//! | DownVoted | -1     | NoVote    |         | -1        | +1  |
//! | UpVoted   | -1     | DownVoted | -1      | +1        | -2  |
//! | DownVoted | +1     | UpVoted   | +1      | -1        | +2  |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Direction of a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum VoteDirection {
    /// Approval (+1).
    Up,
    /// Disapproval (-1).
    Down,
}

impl VoteDirection {
    /// Signed value of the direction.
    #[must_use]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    /// The other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Parse a signed wire value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDirection`] for anything but 1 and -1.
    pub const fn from_sign(value: i64) -> Result<Self, CoreError> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(CoreError::InvalidDirection(other)),
        }
    }
}

impl TryFrom<i8> for VoteDirection {
    type Error = CoreError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        Self::from_sign(i64::from(value))
    }
}

impl From<VoteDirection> for i8 {
    fn from(direction: VoteDirection) -> Self {
        direction.sign() as i8
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Vote state of one (voter, rating) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteState {
    /// No vote recorded.
    #[default]
    NoVote,
    /// Upvote recorded.
    UpVoted,
    /// Downvote recorded.
    DownVoted,
}

impl From<Option<VoteDirection>> for VoteState {
    fn from(direction: Option<VoteDirection>) -> Self {
        match direction {
            None => Self::NoVote,
            Some(VoteDirection::Up) => Self::UpVoted,
            Some(VoteDirection::Down) => Self::DownVoted,
        }
    }
}

impl VoteState {
    /// Direction of the recorded vote, if any.
    #[must_use]
    pub const fn direction(self) -> Option<VoteDirection> {
        match self {
            Self::NoVote => None,
            Self::UpVoted => Some(VoteDirection::Up),
            Self::DownVoted => Some(VoteDirection::Down),
        }
    }

    /// Resolve a vote action against this state.
    #[must_use]
    pub fn resolve(self, action: VoteDirection) -> VoteOutcome {
        let (transition, next) = match self.direction() {
            None => (VoteTransition::Cast(action), VoteState::from(Some(action))),
            Some(current) if current == action => (VoteTransition::Cancel(action), VoteState::NoVote),
            Some(current) => (
                VoteTransition::Flip {
                    from: current,
                    to: action,
                },
                VoteState::from(Some(action)),
            ),
        };

        let (upvote_delta, downvote_delta) = match transition {
            VoteTransition::Cast(VoteDirection::Up) => (1, 0),
            VoteTransition::Cast(VoteDirection::Down) => (0, 1),
            VoteTransition::Cancel(VoteDirection::Up) => (-1, 0),
            VoteTransition::Cancel(VoteDirection::Down) => (0, -1),
            VoteTransition::Flip { to: VoteDirection::Up, .. } => (1, -1),
            VoteTransition::Flip { to: VoteDirection::Down, .. } => (-1, 1),
        };

        VoteOutcome {
            previous: self,
            next,
            transition,
            upvote_delta,
            downvote_delta,
            net_delta: upvote_delta - downvote_delta,
        }
    }
}

/// Kind of transition a vote action produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteTransition {
    /// First vote on the rating.
    Cast(VoteDirection),
    /// Same direction again, the vote is withdrawn.
    Cancel(VoteDirection),
    /// Opposite direction, the vote is replaced.
    Flip {
        /// Previous direction.
        from: VoteDirection,
        /// New direction.
        to: VoteDirection,
    },
}

/// Result of resolving a vote action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOutcome {
    /// State before the action.
    pub previous: VoteState,
    /// State after the action.
    pub next: VoteState,
    /// Transition taken.
    pub transition: VoteTransition,
    /// Change to the upvote counter.
    pub upvote_delta: i32,
    /// Change to the downvote counter.
    pub downvote_delta: i32,
    /// Signed change in net approval, consumed by trust updates.
    pub net_delta: i32,
}

/// Upvote and downvote counters of a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VoteCounters {
    /// Upvotes received.
    pub upvotes: u32,
    /// Downvotes received.
    pub downvotes: u32,
}

impl VoteCounters {
    /// Create counters with explicit values.
    #[must_use]
    pub const fn new(upvotes: u32, downvotes: u32) -> Self {
        Self { upvotes, downvotes }
    }

    /// Upvotes minus downvotes, floored at zero.
    #[must_use]
    pub const fn net_approval(&self) -> u32 {
        self.upvotes.saturating_sub(self.downvotes)
    }

    /// Apply a resolved outcome.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CounterUnderflow`] if a counter would go below zero,
    /// which means the stored vote and the counters disagree.
    pub fn apply(&self, outcome: &VoteOutcome) -> Result<Self, CoreError> {
        Ok(Self {
            upvotes: shift(self.upvotes, outcome.upvote_delta, "upvote")?,
            downvotes: shift(self.downvotes, outcome.downvote_delta, "downvote")?,
        })
    }
}

fn shift(value: u32, delta: i32, counter: &'static str) -> Result<u32, CoreError> {
    value
        .checked_add_signed(delta)
        .ok_or(CoreError::CounterUnderflow { counter })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    use VoteDirection::{Down, Up};
    use VoteState::{DownVoted, NoVote, UpVoted};

    #[test_case(NoVote, Up, UpVoted, 1, 0, 1 ; "cast up")]
    #[test_case(NoVote, Down, DownVoted, 0, 1, -1 ; "cast down")]
    #[test_case(UpVoted, Up, NoVote, -1, 0, -1 ; "cancel up")]
    #[test_case(DownVoted, Down, NoVote, 0, -1, 1 ; "cancel down")]
    #[test_case(UpVoted, Down, DownVoted, -1, 1, -2 ; "flip to down")]
    #[test_case(DownVoted, Up, UpVoted, 1, -1, 2 ; "flip to up")]
    fn transition_table(from: VoteState, action: VoteDirection, to: VoteState, up: i32, down: i32, net: i32) {
        let outcome = from.resolve(action);
        assert_eq!(outcome.previous, from);
        assert_eq!(outcome.next, to);
        assert_eq!(outcome.upvote_delta, up);
        assert_eq!(outcome.downvote_delta, down);
        assert_eq!(outcome.net_delta, net);
    }

    #[test]
    fn direction_parsing() {
        assert_eq!(VoteDirection::try_from(1i8), Ok(Up));
        assert_eq!(VoteDirection::try_from(-1i8), Ok(Down));
        assert_eq!(VoteDirection::try_from(0i8), Err(CoreError::InvalidDirection(0)));
        assert_eq!(VoteDirection::from_sign(2), Err(CoreError::InvalidDirection(2)));
    }

    #[test]
    fn underflow_is_reported() {
        let outcome = UpVoted.resolve(Up);
        let err = VoteCounters::default().apply(&outcome).unwrap_err();
        assert_eq!(err, CoreError::CounterUnderflow { counter: "upvote" });
    }

    #[test]
    fn net_approval_is_floored() {
        assert_eq!(VoteCounters::new(2, 5).net_approval(), 0);
        assert_eq!(VoteCounters::new(5, 2).net_approval(), 3);
    }

    #[test]
    fn direction_serializes_as_sign() {
        assert_eq!(serde_json::to_string(&Down).expect("serialize"), "-1");
        assert!(serde_json::from_str::<VoteDirection>("3").is_err());
    }

    fn any_state() -> impl Strategy<Value = VoteState> {
        prop_oneof![Just(NoVote), Just(UpVoted), Just(DownVoted)]
    }

    fn any_direction() -> impl Strategy<Value = VoteDirection> {
        prop_oneof![Just(Up), Just(Down)]
    }

    proptest! {
        #[test]
        fn cast_then_cancel_is_identity(dir in any_direction(), up in 0u32..1000, down in 0u32..1000) {
            let counters = VoteCounters::new(up, down);
            let first = NoVote.resolve(dir);
            let mid = counters.apply(&first).expect("cast");
            let second = first.next.resolve(dir);
            let end = mid.apply(&second).expect("cancel");
            prop_assert_eq!(second.next, NoVote);
            prop_assert_eq!(end, counters);
            prop_assert_eq!(first.net_delta + second.net_delta, 0);
        }

        #[test]
        fn flips_move_both_counters(dir in any_direction(), up in 1u32..1000, down in 1u32..1000) {
            let from = VoteState::from(Some(dir));
            let outcome = from.resolve(dir.opposite());
            let before = VoteCounters::new(up, down);
            let after = before.apply(&outcome).expect("flip");
            prop_assert_eq!(outcome.net_delta.abs(), 2);
            prop_assert_eq!(
                i64::from(after.upvotes) + i64::from(after.downvotes),
                i64::from(up) + i64::from(down)
            );
        }

        #[test]
        fn net_delta_matches_counter_deltas(state in any_state(), dir in any_direction()) {
            let outcome = state.resolve(dir);
            prop_assert_eq!(outcome.net_delta, outcome.upvote_delta - outcome.downvote_delta);
            prop_assert!(outcome.net_delta.abs() <= 2);
        }
    }
}
