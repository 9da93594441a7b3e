//! Shared test utilities for tally-db unit tests.

pub(crate) mod helpers {
    use tally_core::draft::{ArgumentInput, DecisionData};

    use crate::TallyDb;

    /// Fresh in-memory database with migrations applied.
    pub async fn test_db() -> TallyDb {
        TallyDb::open_local(":memory:").await.unwrap()
    }

    pub fn data(title: &str) -> DecisionData {
        DecisionData::new(title, None)
    }

    /// One argument per weight, texts `"argument 0"`, `"argument 1"`, ...
    pub fn args(weights: &[i64]) -> Vec<ArgumentInput> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| ArgumentInput::new(format!("argument {i}"), *w).unwrap())
            .collect()
    }
}
