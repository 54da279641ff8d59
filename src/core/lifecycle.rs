//! Procurement record lifecycle.
//!
//! Defines the [`Stage`] state machine and the reservation basis each stage
//! implies. A record reserves its estimate until it is contracted with a known
//! value; a cancelled record reserves nothing.

use crate::{
    errors::{Error, Result},
    money::Money,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Stage of a procurement record.
///
/// `Planning -> InBidding -> Contracted -> Completed`, with forward skips
/// allowed, and any non-terminal stage may move to `Cancelled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Demand registered, nothing started yet
    Planning,
    /// Bidding process running
    InBidding,
    /// Contract signed
    Contracted,
    /// Contract executed
    Completed,
    /// Demand dropped; reserves nothing
    Cancelled,
}

impl Stage {
    /// All stages in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Planning,
        Self::InBidding,
        Self::Contracted,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Name stored in the `stage` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::InBidding => "in_bidding",
            Self::Contracted => "contracted",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal stages accept no further changes.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the record counts against the budget in this stage.
    #[must_use]
    pub const fn reserves_capacity(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether a contracted value, when present, replaces the estimate.
    #[must_use]
    pub const fn uses_contracted_value(self) -> bool {
        matches!(self, Self::Contracted | Self::Completed)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Planning => 0,
            Self::InBidding => 1,
            Self::Contracted => 2,
            Self::Completed => 3,
            Self::Cancelled => 4,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    ///
    /// Staying in the same non-terminal stage is allowed (value edits).
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled => true,
            _ => next.rank() >= self.rank(),
        }
    }

    /// Returns `Ok(())` when the transition is allowed, `InvalidTransition` otherwise.
    pub fn ensure_transition(self, next: Self) -> Result<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|stage| {
                stage.as_str() == normalized || stage.as_str().replace('_', "") == normalized
            })
            .ok_or_else(|| Error::InvalidInput {
                message: format!("unknown stage '{s}'"),
            })
    }
}

/// Amount a record reserves given its stage and values.
///
/// While `InBidding` (or `Planning`) the estimate is reserved even if a
/// contracted value was already filled in.
#[must_use]
pub const fn contribution(stage: Stage, estimated: Money, contracted: Option<Money>) -> Money {
    if !stage.reserves_capacity() {
        return Money::ZERO;
    }
    match contracted {
        Some(value) if stage.uses_contracted_value() => value,
        _ => estimated,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_stage_round_trips_through_column_names() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
        assert_eq!("InBidding".parse::<Stage>().unwrap(), Stage::InBidding);
        assert_eq!("in-bidding".parse::<Stage>().unwrap(), Stage::InBidding);
        assert!("signed".parse::<Stage>().is_err());
    }

    #[test]
    fn test_forward_transitions_and_skips() {
        assert!(Stage::Planning.can_transition_to(Stage::InBidding));
        assert!(Stage::Planning.can_transition_to(Stage::Contracted));
        assert!(Stage::InBidding.can_transition_to(Stage::Completed));
        assert!(Stage::Contracted.can_transition_to(Stage::Contracted));
        assert!(Stage::Contracted.can_transition_to(Stage::Cancelled));
    }

    #[test]
    fn test_backward_and_terminal_transitions_rejected() {
        assert!(!Stage::Contracted.can_transition_to(Stage::Planning));
        assert!(!Stage::InBidding.can_transition_to(Stage::Planning));
        assert!(!Stage::Cancelled.can_transition_to(Stage::Planning));
        assert!(!Stage::Cancelled.can_transition_to(Stage::Cancelled));
        assert!(!Stage::Completed.can_transition_to(Stage::Cancelled));

        let err = Stage::Completed.ensure_transition(Stage::Cancelled).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: Stage::Completed,
                to: Stage::Cancelled
            }
        ));
    }

    #[test]
    fn test_contribution_by_stage() {
        let estimate = Money::from_units(60_000);
        let contracted = Some(Money::from_units(55_000));

        assert_eq!(contribution(Stage::Planning, estimate, None), estimate);
        assert_eq!(
            contribution(Stage::Contracted, estimate, contracted),
            Money::from_units(55_000)
        );
        assert_eq!(
            contribution(Stage::Completed, estimate, contracted),
            Money::from_units(55_000)
        );
        assert_eq!(contribution(Stage::Contracted, estimate, None), estimate);
        assert_eq!(contribution(Stage::Cancelled, estimate, contracted), Money::ZERO);
    }

    #[test]
    fn test_in_bidding_keeps_estimate_even_with_contracted_value() {
        let estimate = Money::from_units(60_000);
        assert_eq!(
            contribution(Stage::InBidding, estimate, Some(Money::from_units(10))),
            estimate
        );
    }
}
