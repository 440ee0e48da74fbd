// communication/mod.rs
pub mod channels;
pub mod messages;
