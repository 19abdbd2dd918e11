//! Active learning of regular languages with Angluin's L* algorithm.
//!
//! A learner poses membership and equivalence queries to an [`active::Oracle`] and keeps the
//! answers in an [`active::ObservationTable`]. Once the oracle accepts a hypothesis, the
//! learned automaton can be exported with the tools of `lstar_core`, for example as a
//! regular expression or as a homogeneous network.
#![deny(rustdoc::broken_intra_doc_links)]

/// Deals with active learning: oracles, the observation table and the L* driver.
pub mod active;

mod error;
pub use error::LearnError;

/// Re-exports the types that are needed to set up and run a learner.
pub mod prelude {
    pub use super::{
        active::{
            AutomatonOracle, CachingOracle, LStar, LStarConfig, ObservationTable, Oracle,
            OracleError, Phase, PredicateOracle, Statistics, Verdict,
        },
        LearnError,
    };
}
