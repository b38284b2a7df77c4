use std::ops::{Index, IndexMut};
use nalgebra::DVector;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Serialize, Deserialize};
use crate::robot_modules::robot_model_module::RobotModelModule;
use crate::utils::utils_errors::KinoptError;

/// The `RobotJointStateModule` spawns and validates joint states for a given robot model.
/// A `RobotJointState` can only be constructed through this module, so any state handed to
/// the kinematics or optimization layers is guaranteed to have the right dimensionality.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotJointStateModule {
    num_dofs: usize,
    dof_limits: Vec<(f64, f64)>
}
impl RobotJointStateModule {
    pub fn new(robot_model_module: &RobotModelModule) -> Self {
        Self {
            num_dofs: robot_model_module.num_dofs(),
            dof_limits: robot_model_module.dof_limits()
        }
    }
    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }
    pub fn dof_limits(&self) -> &Vec<(f64, f64)> {
        &self.dof_limits
    }
    /// Wraps the given vector as a joint state.  Fails if the dimensionality does not match
    /// the robot's degrees of freedom.
    pub fn spawn_robot_joint_state(&self, joint_state: DVector<f64>) -> Result<RobotJointState, KinoptError> {
        KinoptError::new_check_for_dimension_mismatch_error(joint_state.len(), self.num_dofs, "spawn_robot_joint_state", file!(), line!())?;
        return Ok(RobotJointState { joint_state });
    }
    /// Samples a joint state uniformly within the joint limits.  A seeded generator keeps
    /// restart sequences reproducible.
    pub fn sample_joint_state(&self, rng: &mut ChaCha20Rng) -> RobotJointState {
        let mut out = DVector::zeros(self.num_dofs);
        for (i, (lower, upper)) in self.dof_limits.iter().enumerate() {
            let between = Uniform::from(*lower..*upper);
            out[i] = between.sample(rng);
        }
        return RobotJointState { joint_state: out };
    }
    pub fn new_sampling_rng(seed: u64) -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(seed)
    }
    /// Whether every entry of the given state lies within the corresponding joint limits.
    pub fn is_within_limits(&self, joint_state: &RobotJointState) -> bool {
        for (i, (lower, upper)) in self.dof_limits.iter().enumerate() {
            if joint_state[i] < *lower || joint_state[i] > *upper { return false; }
        }
        return true;
    }
}

/// A dimension-validated point in the robot's configuration space.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotJointState {
    joint_state: DVector<f64>
}
impl RobotJointState {
    pub fn joint_state(&self) -> &DVector<f64> {
        &self.joint_state
    }
    pub fn len(&self) -> usize {
        self.joint_state.len()
    }
    pub fn is_empty(&self) -> bool {
        self.joint_state.is_empty()
    }
}
impl Index<usize> for RobotJointState {
    type Output = f64;
    fn index(&self, index: usize) -> &Self::Output {
        &self.joint_state[index]
    }
}
impl IndexMut<usize> for RobotJointState {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.joint_state[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_dimension_is_an_error() {
        let m = RobotModelModule::new_ur5();
        let module = RobotJointStateModule::new(&m);
        assert!(module.spawn_robot_joint_state(DVector::zeros(5)).is_err());
        assert!(module.spawn_robot_joint_state(DVector::zeros(6)).is_ok());
    }

    #[test]
    fn sampled_states_respect_limits() {
        let m = RobotModelModule::new_ur5();
        let module = RobotJointStateModule::new(&m);
        let mut rng = RobotJointStateModule::new_sampling_rng(7);
        for _ in 0..25 {
            let s = module.sample_joint_state(&mut rng);
            assert!(module.is_within_limits(&s));
        }
    }
}
