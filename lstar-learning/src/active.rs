mod lstar;
pub use lstar::{LStar, Phase};

mod oracle;
pub use oracle::{AutomatonOracle, CachingOracle, Oracle, OracleError, PredicateOracle, Verdict};

mod config;
pub use config::{LStarConfig, ITERATION_THRESHOLD};

mod statistics;
pub use statistics::Statistics;

mod hypothesis;

mod observationtable;
pub use observationtable::{Inconsistency, ObservationTable, Signature};
