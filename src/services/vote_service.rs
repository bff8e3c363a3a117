use crate::models::VoteDirection;

/// Outcome of applying a vote request to a voter's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub new_state: Option<VoteDirection>,
    pub delta: i32,
}

/// Toggle-vote state machine. `None` is the no-vote state.
///
/// Repeating the current direction removes the vote, the opposite direction
/// flips it, and a first vote records it.
pub fn transition(current: Option<VoteDirection>, requested: VoteDirection) -> VoteTransition {
    use VoteDirection::{Down, Up};

    let (new_state, delta) = match (current, requested) {
        (None, Up) => (Some(Up), 1),
        (None, Down) => (Some(Down), -1),
        (Some(Up), Up) => (None, -1),
        (Some(Up), Down) => (Some(Down), -2),
        (Some(Down), Down) => (None, 1),
        (Some(Down), Up) => (Some(Up), 2),
    };

    VoteTransition { new_state, delta }
}
