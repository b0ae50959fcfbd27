//! Domain types and ports

pub mod communication;
