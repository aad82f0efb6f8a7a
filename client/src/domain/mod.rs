pub mod budget_math;
pub mod ledger;
