//! Repository methods, added to [`crate::TallyDb`] as inherent `impl` blocks.

pub mod decision;
