//! cu-calc: leg outcome distributions and expected-value decision support.
//!
//! The leg enumerator drives `cu_core::move_on_board` over every remaining draw sequence and
//! folds the leg-end rankings into a [`LegDistribution`]. When too many dice are left for exact
//! enumeration, [`distribution`] falls back to sampling and says so in
//! [`LegDistribution::precision`]. The optimizer turns distributions into ranked actions.

pub mod enumerate;
pub mod key;
pub mod optimizer;
pub mod outcome;
pub mod race;
pub mod sample;

use log::warn;
use thiserror::Error;

use cu_core::{ApplyError, CalcConfig, RaceState, Rules};

pub use enumerate::exact_distribution;
pub use key::LegKey;
pub use optimizer::{analyze, best_actions, Analysis, Candidate, RankedAction};
pub use outcome::{LegDistribution, Precision, TileLandings};
pub use race::{sample_race, RaceOutlook};
pub use sample::sampled_distribution;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    /// Too many dice left for exact enumeration. Recoverable: sample instead.
    #[error("exact enumeration needs {remaining} dice but the ceiling is {ceiling}")]
    EnumerationBudgetExceeded { remaining: usize, ceiling: usize },
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

/// Leg outcome distribution: exact when within `calc.max_exact_dice`, sampled otherwise.
pub fn distribution(
    state: &RaceState,
    rules: &Rules,
    calc: &CalcConfig,
) -> Result<LegDistribution, CalcError> {
    match exact_distribution(state, rules, calc) {
        Err(CalcError::EnumerationBudgetExceeded { remaining, ceiling }) => {
            warn!(
                "{} dice left (ceiling {}); sampling {} legs instead",
                remaining, ceiling, calc.samples
            );
            sampled_distribution(state, rules, calc.samples, calc.seed)
        }
        other => other,
    }
}


#[cfg(test)]
mod optimizer_tests;
