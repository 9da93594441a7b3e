pub mod decision;
pub mod score;
pub mod shared;
