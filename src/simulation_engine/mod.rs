// simulation_engine/mod.rs
pub mod arrivals;
pub mod runner;
pub mod street_agent;
pub mod summary;
