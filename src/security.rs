//! Driven port implementations for credentials: password hashing and signed session tokens.

pub mod password_driven_ports;
pub mod token_driven_ports;
