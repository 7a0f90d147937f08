#![allow(non_snake_case)]

pub mod error;
pub mod utils;
pub mod nd_utils;
pub mod grid;
pub mod dynamics;
pub mod rabi;
pub mod fidelity;
pub mod objective;
pub mod config;

pub use error::{ PulseError, PulseResult };
pub use objective::Objective;
