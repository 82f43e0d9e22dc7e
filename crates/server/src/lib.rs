//! Fixed-rate host for the region engine.
//!
//! Owns the agents ([`roster`]), drives the tracker lanes on tokio
//! ([`lanes`]) and feeds it with simulated movement ([`simulation`]) over a
//! grid of demo regions ([`zones`]).

pub mod config;
pub mod lanes;
pub mod roster;
pub mod simulation;
pub mod zones;
