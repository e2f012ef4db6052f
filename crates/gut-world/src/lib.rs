//! Tissue patch simulation engine.
//!
//! This module implements the square grid of gut tissue, the stochastic
//! transition rules that rewrite it, and a seeded run loop.

pub mod grid;
pub mod sampling;
pub mod engine;
pub mod simulation;

pub use grid::{GridSnapshot, TissueGrid};
pub use engine::TransitionEngine;
pub use sampling::sample_cumulative;
pub use simulation::{Simulation, SimulationResult};
