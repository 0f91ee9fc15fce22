// Automatically generated mod.rs
pub mod autonat;
