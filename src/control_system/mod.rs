// control_system/mod.rs
pub mod admission_controller;
pub mod grouping;
