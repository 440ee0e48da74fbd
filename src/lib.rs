//! Distributed traffic-light simulation.
//!
//! A central admission controller cycles conflict-free groups of streets
//! through green phases while independent street agents accumulate and
//! release queued vehicles. All coordination is message passing over
//! channels; no state is shared between tasks.

pub mod communication;
pub mod config;
pub mod control_system;
pub mod errors;
pub mod simulation_engine;
