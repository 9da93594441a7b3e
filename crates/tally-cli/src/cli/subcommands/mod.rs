mod decision;

pub use decision::DecisionCommands;
