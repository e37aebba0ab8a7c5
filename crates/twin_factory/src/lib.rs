//! # Twin Factory
//!
//! Digital twin insertion and the in-process simulator.
//!
//! Responsibilities:
//! - Load the twin's model definition
//! - Insert it into the world and wait for it to appear
//! - Couple it to the training rig with a ball joint
//! - Provide `MockWorld`, a deterministic `Simulator` for tests and dry runs

mod descriptor;
mod error;
mod factory;
mod mock_world;

pub use descriptor::{element_names, load_descriptor, parse_model_name};
pub use error::{Result, TwinError};
pub use factory::{DigitalTwinFactory, TwinAttachment};
pub use mock_world::{MockWorld, MockWorldConfig};
