//! Simulator trait - physics engine capability boundary
//!
//! The control loop only ever talks to the simulation through this trait, so a
//! deterministic in-process world can stand in for the real engine.

use std::path::PathBuf;
use std::sync::Arc;

use crate::{ContractError, MotorCommand, SensorMessage};

/// Model handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelHandle(pub u32);

/// Link handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHandle {
    /// Owning model
    pub model: ModelHandle,
    /// Link index inside the model
    pub index: u32,
}

/// Joint handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle(pub u32);

/// Subscription handle
pub type SubscriptionId = u64;

/// Link name paired with its handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub handle: LinkHandle,
    /// Scoped link name, e.g. `quad::cg`
    pub name: String,
}

/// Joint kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointKind {
    Ball,
    Revolute,
    Fixed,
}

impl JointKind {
    /// Engine joint type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ball => "ball",
            Self::Revolute => "revolute",
            Self::Fixed => "fixed",
        }
    }
}

/// Joint creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointSpec {
    pub name: String,
    pub kind: JointKind,
    pub parent: LinkHandle,
    pub child: LinkHandle,
}

/// Auxiliary model definition handed to the simulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Model name declared by the definition
    pub name: String,
    /// Source file
    pub source: PathBuf,
    /// Raw definition document
    pub document: String,
}

/// Sensor data callback type
///
/// Invoked from simulator threads. Uses `Arc` so one callback can be shared
/// across several topic subscriptions.
pub type SensorCallback = Arc<dyn Fn(SensorMessage) + Send + Sync>;

/// Simulator capability trait
///
/// Methods take `&self`: implementations are shared between the bootstrap
/// thread, the control loop and their own sensor threads.
pub trait Simulator: Send + Sync {
    /// Advance the simulation by `ticks` fixed steps
    ///
    /// Sensor messages produced by the step may be delivered after this
    /// returns, from other threads.
    fn step(&self, ticks: u32) -> Result<(), ContractError>;

    /// Reset simulation time, entity poses and physics state to the initial
    /// configuration
    fn reset(&self);

    /// Current simulation time (seconds)
    fn sim_time(&self) -> f64;

    /// Pause or resume the free-running clock
    fn set_paused(&self, paused: bool);

    /// Whether the free-running clock is paused
    fn is_paused(&self) -> bool;

    /// Number of models currently in the world
    fn model_count(&self) -> usize;

    /// Request insertion of a model
    ///
    /// Insertion may complete asynchronously; callers poll `model_count`.
    fn insert_model(&self, descriptor: &ModelDescriptor) -> Result<(), ContractError>;

    /// Look up a model by name
    fn model_by_name(&self, name: &str) -> Option<ModelHandle>;

    /// All links of a model
    fn links(&self, model: ModelHandle) -> Vec<LinkInfo>;

    /// Find the first link whose name ends with `suffix`
    fn find_link(&self, model: ModelHandle, suffix: &str) -> Option<LinkHandle> {
        self.links(model)
            .into_iter()
            .find(|link| link.name.ends_with(suffix))
            .map(|link| link.handle)
    }

    /// Create and initialize a joint
    fn create_joint(&self, spec: &JointSpec) -> Result<JointHandle, ContractError>;

    /// Subscribe a callback to a sensor topic
    fn subscribe(
        &self,
        topic: &str,
        callback: SensorCallback,
    ) -> Result<SubscriptionId, ContractError>;

    /// Drop a subscription; unknown ids are ignored
    fn unsubscribe(&self, id: SubscriptionId);

    /// Publish a motor command to the actuators
    fn publish_motor_command(
        &self,
        topic: &str,
        command: &MotorCommand,
    ) -> Result<(), ContractError>;
}
