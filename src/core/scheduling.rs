pub mod equivalence;
pub mod hinting_simulator;
pub mod hints;
