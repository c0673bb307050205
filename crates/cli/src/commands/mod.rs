pub mod account;
pub mod config;
pub mod doctor;
pub mod social;
mod wiring;
