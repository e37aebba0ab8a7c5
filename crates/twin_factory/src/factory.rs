//! DigitalTwinFactory - insert the twin and couple it to the training rig

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use contracts::{
    JointHandle, JointKind, JointSpec, LinkHandle, ModelDescriptor, ModelHandle, RigConfig,
    Simulator,
};
use tracing::{debug, info, instrument};

use crate::descriptor::load_descriptor;
use crate::error::{Result, TwinError};

/// Handles of an attached twin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwinAttachment {
    /// Model name
    pub name: String,
    /// Inserted model
    pub model: ModelHandle,
    /// Twin link coupled to the rig
    pub attach_link: LinkHandle,
    /// Rig link the twin pivots on
    pub pivot_link: LinkHandle,
    /// Created joint
    pub joint: JointHandle,
}

/// Digital twin factory
///
/// Inserts the twin model and attaches it to the training rig with a ball
/// joint.
pub struct DigitalTwinFactory {
    simulator: Arc<dyn Simulator>,
    rig: RigConfig,
}

impl DigitalTwinFactory {
    /// Create a new factory
    pub fn new(simulator: Arc<dyn Simulator>, rig: RigConfig) -> Self {
        Self { simulator, rig }
    }

    /// Load the model file, then insert and attach it
    pub fn load_and_attach(&self, path: &Path) -> Result<TwinAttachment> {
        let descriptor = load_descriptor(path)?;
        self.insert_and_attach(&descriptor)
    }

    /// Insert a model and attach it to the training rig
    ///
    /// # Errors
    /// - `InsertFailed` if the simulator refuses the model
    /// - `ModelNotAppeared` if the model count does not grow in time
    /// - `ModelNotFound` / `LinkNotFound` for missing scene entities
    /// - `JointFailed` if the joint cannot be created
    #[instrument(
        name = "twin_insert_and_attach",
        skip(self, descriptor),
        fields(model = %descriptor.name)
    )]
    pub fn insert_and_attach(&self, descriptor: &ModelDescriptor) -> Result<TwinAttachment> {
        let before = self.simulator.model_count();
        self.simulator
            .insert_model(descriptor)
            .map_err(TwinError::InsertFailed)?;
        self.wait_for_model_count(&descriptor.name, before)?;

        let model = self.find_model(&descriptor.name)?;
        let attach_link = self.find_link(model, &descriptor.name, &self.rig.attach_link)?;

        let rig = self.find_model(&self.rig.rig_model)?;
        let pivot_link = self.find_link(rig, &self.rig.rig_model, &self.rig.pivot_link)?;

        let joint = self
            .simulator
            .create_joint(&JointSpec {
                name: self.rig.joint_name.clone(),
                kind: JointKind::Ball,
                parent: pivot_link,
                child: attach_link,
            })
            .map_err(|source| TwinError::JointFailed {
                joint: self.rig.joint_name.clone(),
                source,
            })?;

        info!(
            model = %descriptor.name,
            rig = %self.rig.rig_model,
            joint = %self.rig.joint_name,
            "Digital twin attached to training rig"
        );

        Ok(TwinAttachment {
            name: descriptor.name.clone(),
            model,
            attach_link,
            pivot_link,
            joint,
        })
    }

    /// Poll until the world holds more models than `before`
    fn wait_for_model_count(&self, name: &str, before: usize) -> Result<()> {
        let started = Instant::now();
        let timeout = self.rig.insert_timeout();
        let poll = self.rig.insert_poll_interval();

        loop {
            let count = self.simulator.model_count();
            if count > before {
                debug!(
                    model = %name,
                    count,
                    waited_ms = started.elapsed().as_millis() as u64,
                    "Model appeared"
                );
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(TwinError::ModelNotAppeared {
                    name: name.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            thread::sleep(poll);
        }
    }

    fn find_model(&self, name: &str) -> Result<ModelHandle> {
        self.simulator
            .model_by_name(name)
            .ok_or_else(|| TwinError::ModelNotFound {
                name: name.to_string(),
            })
    }

    fn find_link(&self, model: ModelHandle, model_name: &str, suffix: &str) -> Result<LinkHandle> {
        self.simulator
            .find_link(model, suffix)
            .ok_or_else(|| TwinError::LinkNotFound {
                model: model_name.to_string(),
                link: suffix.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_world::{MockWorld, MockWorldConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    fn quad(name: &str, link: &str) -> ModelDescriptor {
        ModelDescriptor {
            name: name.to_string(),
            source: PathBuf::from("quad.sdf"),
            document: format!(
                "<sdf><model name=\"{name}\"><link name=\"base\"/><link name=\"{link}\"/></model></sdf>"
            ),
        }
    }

    fn fast_rig() -> RigConfig {
        RigConfig {
            insert_timeout_ms: 200,
            insert_poll_ms: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_attach() {
        let world = Arc::new(MockWorld::new(MockWorldConfig {
            insertion_delay: Duration::from_millis(20),
            ..Default::default()
        }));
        let factory = DigitalTwinFactory::new(world.clone(), fast_rig());

        let attachment = factory.insert_and_attach(&quad("quad", "cg")).unwrap();
        assert_eq!(attachment.name, "quad");

        let joints = world.joints();
        assert_eq!(joints.len(), 1);
        assert_eq!(joints[0].name, "ball_joint");
        assert_eq!(joints[0].kind, JointKind::Ball);
        assert_eq!(joints[0].parent, attachment.pivot_link);
        assert_eq!(joints[0].child, attachment.attach_link);
    }

    #[test]
    fn test_model_never_appears() {
        let world = Arc::new(MockWorld::new(MockWorldConfig {
            drop_insertions: true,
            ..Default::default()
        }));
        let factory = DigitalTwinFactory::new(world, fast_rig());

        let err = factory.insert_and_attach(&quad("quad", "cg")).unwrap_err();
        assert!(matches!(err, TwinError::ModelNotAppeared { .. }));
    }

    #[test]
    fn test_missing_attach_link() {
        let world = Arc::new(MockWorld::new(MockWorldConfig::default()));
        let factory = DigitalTwinFactory::new(world, fast_rig());

        let err = factory
            .insert_and_attach(&quad("quad", "fuselage"))
            .unwrap_err();
        match err {
            TwinError::LinkNotFound { model, link } => {
                assert_eq!(model, "quad");
                assert_eq!(link, "cg");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_training_rig() {
        let world = Arc::new(MockWorld::new(MockWorldConfig {
            with_training_rig: false,
            ..Default::default()
        }));
        let factory = DigitalTwinFactory::new(world, fast_rig());

        let err = factory.insert_and_attach(&quad("quad", "cg")).unwrap_err();
        assert!(
            matches!(&err, TwinError::ModelNotFound { name } if name == "attitude_control_training_rig"),
            "{err}"
        );
    }

    #[test]
    fn test_load_and_attach_missing_file() {
        let world = Arc::new(MockWorld::new(MockWorldConfig::default()));
        let factory = DigitalTwinFactory::new(world.clone(), fast_rig());

        let err = factory
            .load_and_attach(Path::new("/nonexistent/quad.sdf"))
            .unwrap_err();
        assert!(matches!(err, TwinError::ModelFileMissing { .. }));
        assert_eq!(world.model_count(), 1);
    }
}
