pub mod cell;
pub mod command;
pub mod components;
pub mod config;
pub mod errors;
pub mod scheduler;
pub mod simulation;
pub mod stats;
pub mod strategy;

#[cfg(test)]
mod tests;
