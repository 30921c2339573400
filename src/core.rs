pub mod common;
pub mod filter;
pub mod node;
pub mod pod;
pub mod predicate;
pub mod scheduling;
pub mod snapshot;
