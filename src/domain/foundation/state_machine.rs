//! State machine trait for status enums.
//!
//! Provides a consistent interface for validating and performing state transitions
//! across lifecycle statuses (room status, connection phase).

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// Implementors define valid state transitions and get validated
/// transition methods for free.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for RoomStatus {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Active, Accepted) | (Accepted, Completed))
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Active => vec![Accepted, Completed, Cancelled, Expired],
///             Accepted => vec![Completed],
///             _ => vec![],
///         }
///     }
/// }
///
/// let next = RoomStatus::Active.transition_to(RoomStatus::Accepted)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}
