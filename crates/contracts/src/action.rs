//! Action - agent request
//!
//! One action per control-loop iteration.

use serde::{Deserialize, Serialize};

/// World control command carried by every action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldControl {
    /// Apply actuator commands and advance exactly one tick
    #[default]
    Step,
    /// Restore the initial world state and settle the sensors
    Reset,
}

/// Decoded agent action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// World control command
    pub command: WorldControl,

    /// Per-actuator commands, index `i` drives actuator `i`.
    ///
    /// Ignored when `command` is `Reset`.
    pub actuator_commands: Vec<f32>,
}

impl Action {
    /// Create a step action
    pub fn step(actuator_commands: Vec<f32>) -> Self {
        Self {
            command: WorldControl::Step,
            actuator_commands,
        }
    }

    /// Create a reset action
    pub fn reset() -> Self {
        Self {
            command: WorldControl::Reset,
            actuator_commands: Vec::new(),
        }
    }

    /// Check the actuator command count against the configured actuator count
    pub fn matches_actuators(&self, actuator_count: usize) -> bool {
        match self.command {
            WorldControl::Reset => true,
            WorldControl::Step => self.actuator_commands.len() == actuator_count,
        }
    }
}

/// Motor command forwarded to the simulated actuators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorCommand {
    /// One entry per actuator
    pub motor: Vec<f32>,
}

impl From<&Action> for MotorCommand {
    fn from(action: &Action) -> Self {
        Self {
            motor: action.actuator_commands.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_action_is_step() {
        let action = Action::default();
        assert_eq!(action.command, WorldControl::Step);
        assert!(action.actuator_commands.is_empty());
    }

    #[test]
    fn test_matches_actuators() {
        assert!(Action::step(vec![0.1, 0.2, 0.3, 0.4]).matches_actuators(4));
        assert!(!Action::step(vec![0.1, 0.2]).matches_actuators(4));
        // Reset ignores actuator commands
        assert!(Action::reset().matches_actuators(4));
    }
}
