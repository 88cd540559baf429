//! The scoring ledger.

pub mod ledger;
