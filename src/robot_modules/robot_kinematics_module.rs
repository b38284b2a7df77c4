use nalgebra::DMatrix;
use serde::{Serialize, Deserialize};
use crate::robot_modules::robot_joint_state_module::{RobotJointState, RobotJointStateModule};
use crate::robot_modules::robot_model_module::{JointAxisPrimitiveType, RobotModelModule};
use crate::utils::utils_console::{console_print, PrintColor, PrintMode};
use crate::utils::utils_errors::KinoptError;
use crate::utils::utils_se3::Se3Pose;

/// The `RobotKinematicsModule` performs operations related to a robot's kinematics.
/// The main subroutine afforded by this module is forward kinematics which takes as input a
/// robot joint state and outputs the SE(3) poses of all links on the robot.  It also
/// computes the geometric Jacobian of any link with respect to the joint state.
///
/// # Example
/// ```
/// use nalgebra::DVector;
/// use kinopt::robot_modules::robot_model_module::RobotModelModule;
/// use kinopt::robot_modules::robot_kinematics_module::RobotKinematicsModule;
///
/// let robot_kinematics_module = RobotKinematicsModule::new(RobotModelModule::new_ur5());
/// let joint_state = robot_kinematics_module.robot_joint_state_module().spawn_robot_joint_state(DVector::zeros(6)).expect("error");
/// let fk_res = robot_kinematics_module.compute_fk(&joint_state).expect("error");
/// let ee_pose = fk_res.get_link_pose_by_name("ee_link", robot_kinematics_module.robot_model_module()).expect("error");
/// assert!((ee_pose.translation()[2] - 1.001059).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotKinematicsModule {
    robot_model_module: RobotModelModule,
    robot_joint_state_module: RobotJointStateModule,
    starter_result: RobotFKResult
}
impl RobotKinematicsModule {
    pub fn new(robot_model_module: RobotModelModule) -> Self {
        let robot_joint_state_module = RobotJointStateModule::new(&robot_model_module);

        let mut starter_result = RobotFKResult { link_entries: vec![] };
        for (i, link) in robot_model_module.links().iter().enumerate() {
            starter_result.link_entries.push( RobotFKResultLinkEntry {
                link_idx: i,
                link_name: link.link_name().to_string(),
                pose: None
            } )
        }

        Self {
            robot_model_module,
            robot_joint_state_module,
            starter_result
        }
    }
    /// Computes the SE(3) pose of every link at the given joint state.
    pub fn compute_fk(&self, joint_state: &RobotJointState) -> Result<RobotFKResult, KinoptError> {
        KinoptError::new_check_for_dimension_mismatch_error(joint_state.len(), self.robot_joint_state_module.num_dofs(), "compute_fk", file!(), line!())?;
        let mut output = self.starter_result.clone();

        let links = self.robot_model_module.links();
        for link_idx in 0..links.len() {
            self.compute_fk_on_single_link(joint_state, link_idx, &mut output)?;
        }

        return Ok(output);
    }
    /// Computes the 6 x num_dofs geometric Jacobian of the given link.  The first three
    /// rows are translational and the last three rows are rotational, matching the
    /// ordering of the tangent-space vectors returned by `Se3Pose`.
    pub fn compute_jacobian(&self, joint_state: &RobotJointState, end_link_idx: usize) -> Result<DMatrix<f64>, KinoptError> {
        let links = self.robot_model_module.links();
        KinoptError::new_check_for_idx_out_of_bound_error(end_link_idx, links.len(), file!(), line!())?;

        let fk_res = self.compute_fk(joint_state)?;
        let num_dofs = self.robot_joint_state_module.num_dofs();
        let mut jacobian = DMatrix::zeros(6, num_dofs);

        let end_pose = fk_res.get_link_pose(end_link_idx)?;
        let end_point = end_pose.translation().clone();

        for link_idx in 1..=end_link_idx {
            let link = self.robot_model_module.get_link_by_idx(link_idx)?;
            let joint_idx = match link.preceding_joint_idx() {
                None => { continue; }
                Some(j) => { j }
            };
            let dof_idx = match self.robot_model_module.map_joint_idx_to_dof_idx(joint_idx) {
                None => { continue; }
                Some(d) => { d }
            };
            let joint = &self.robot_model_module.joints()[joint_idx];
            let joint_axis = joint.joint_axis().as_ref().expect("actuated joint must have an axis");

            let link_pose = fk_res.get_link_pose(link_idx)?;
            let rotated_axis = link_pose.rotation() * joint_axis.axis();

            match joint_axis.axis_primitive_type() {
                JointAxisPrimitiveType::Rotation => {
                    let connector_vec = end_point - link_pose.translation();
                    let cross_vec = rotated_axis.cross(&connector_vec);
                    jacobian[(0, dof_idx)] = cross_vec.x; jacobian[(1, dof_idx)] = cross_vec.y; jacobian[(2, dof_idx)] = cross_vec.z;
                    jacobian[(3, dof_idx)] = rotated_axis.x; jacobian[(4, dof_idx)] = rotated_axis.y; jacobian[(5, dof_idx)] = rotated_axis.z;
                }
                JointAxisPrimitiveType::Translation => {
                    jacobian[(0, dof_idx)] = rotated_axis.x; jacobian[(1, dof_idx)] = rotated_axis.y; jacobian[(2, dof_idx)] = rotated_axis.z;
                }
            }
        }

        return Ok(jacobian);
    }
    fn compute_fk_on_single_link(&self, joint_state: &RobotJointState, link_idx: usize, output: &mut RobotFKResult) -> Result<(), KinoptError> {
        let link = self.robot_model_module.get_link_by_idx(link_idx)?;

        let preceding_joint_option = link.preceding_joint_idx();
        if preceding_joint_option.is_none() {
            output.link_entries[link_idx].pose = Some(self.robot_model_module.base_offset_pose().clone());
            return Ok(());
        }

        let preceding_joint_idx = preceding_joint_option.unwrap();
        let preceding_joint = &self.robot_model_module.joints()[preceding_joint_idx];

        // Serial chain, so the preceding link is always the one added right before this one.
        let preceding_link_idx = link_idx - 1;
        let mut out_pose = match &output.link_entries[preceding_link_idx].pose {
            None => { return Ok(()); }
            Some(p) => { p.clone() }
        };

        out_pose = out_pose.multiply(preceding_joint.origin_offset_pose());

        if let Some(joint_axis) = preceding_joint.joint_axis() {
            let dof_idx = self.robot_model_module.map_joint_idx_to_dof_idx(preceding_joint_idx).expect("actuated joint must map to a dof");
            let joint_value = joint_state[dof_idx];

            let axis_pose = match joint_axis.axis_primitive_type() {
                JointAxisPrimitiveType::Rotation => {
                    let axis = joint_axis.axis_as_unit();
                    Se3Pose::new_from_axis_angle(&axis, joint_value, 0., 0., 0.)
                }
                JointAxisPrimitiveType::Translation => {
                    let axis = joint_value * joint_axis.axis();
                    Se3Pose::new_from_euler_angles(0., 0., 0., axis[0], axis[1], axis[2])
                }
            };

            out_pose = out_pose.multiply(&axis_pose);
        }

        output.link_entries[link_idx].pose = Some(out_pose);

        Ok(())
    }
    pub fn robot_name(&self) -> &str {
        self.robot_model_module.robot_name()
    }
    pub fn robot_model_module(&self) -> &RobotModelModule {
        &self.robot_model_module
    }
    pub fn robot_joint_state_module(&self) -> &RobotJointStateModule {
        &self.robot_joint_state_module
    }
}

/// The output of a forward kinematics computation.  The primary field in this object is
/// `link_entries`, one `RobotFKResultLinkEntry` per link in the model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotFKResult {
    link_entries: Vec<RobotFKResultLinkEntry>
}
impl RobotFKResult {
    /// Returns a reference to the result's link entries.
    pub fn link_entries(&self) -> &Vec<RobotFKResultLinkEntry> {
        &self.link_entries
    }
    pub fn get_link_pose(&self, link_idx: usize) -> Result<&Se3Pose, KinoptError> {
        KinoptError::new_check_for_idx_out_of_bound_error(link_idx, self.link_entries.len(), file!(), line!())?;
        return match &self.link_entries[link_idx].pose {
            None => { Err(KinoptError::new_generic_error_str(&format!("link {} has no pose in fk result", link_idx), file!(), line!())) }
            Some(p) => { Ok(p) }
        }
    }
    pub fn get_link_pose_by_name(&self, link_name: &str, robot_model_module: &RobotModelModule) -> Result<&Se3Pose, KinoptError> {
        let link_idx = robot_model_module.get_link_idx_by_name(link_name)?;
        return self.get_link_pose(link_idx);
    }
    /// Prints a summary of the forward kinematics result.
    pub fn print_summary(&self) {
        for e in self.link_entries() {
            console_print(&format!("Link {} {} ---> ", e.link_idx, e.link_name), PrintMode::Println, PrintColor::Blue, true);
            console_print(&format!("   > Pose: {:?}", e.pose), PrintMode::Println, PrintColor::None, false);
            if let Some(pose) = &e.pose {
                let (euler_angles, translation) = pose.to_euler_angles_and_translation();
                console_print(&format!("   > Pose Euler Angles: {:?}", euler_angles), PrintMode::Println, PrintColor::None, false);
                console_print(&format!("   > Pose Translation: {:?}", translation), PrintMode::Println, PrintColor::None, false);
            }
        }
    }
}

/// A `RobotFKResultLinkEntry` specifies information about one particular link in the
/// forward kinematics process: the link index, the link's name, and the pose of the link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotFKResultLinkEntry {
    link_idx: usize,
    link_name: String,
    pose: Option<Se3Pose>
}
impl RobotFKResultLinkEntry {
    pub fn link_idx(&self) -> usize {
        self.link_idx
    }
    pub fn link_name(&self) -> &str {
        &self.link_name
    }
    pub fn pose(&self) -> &Option<Se3Pose> {
        &self.pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    fn planar_3r() -> RobotKinematicsModule {
        RobotKinematicsModule::new(RobotModelModule::new_planar_3r())
    }

    #[test]
    fn planar_fk_at_zero() {
        let k = planar_3r();
        let state = k.robot_joint_state_module().spawn_robot_joint_state(DVector::zeros(3)).expect("error");
        let fk_res = k.compute_fk(&state).expect("error");
        let tip = fk_res.get_link_pose_by_name("tip", k.robot_model_module()).expect("error");
        assert!((tip.translation() - nalgebra::Vector3::new(3.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn planar_fk_elbow_up() {
        // q = [pi/2, -pi/2, 0]: first link points along +y, the rest along +x.
        let k = planar_3r();
        let pi = std::f64::consts::PI;
        let state = k.robot_joint_state_module().spawn_robot_joint_state(DVector::from_vec(vec![pi / 2.0, -pi / 2.0, 0.0])).expect("error");
        let fk_res = k.compute_fk(&state).expect("error");
        let tip = fk_res.get_link_pose_by_name("tip", k.robot_model_module()).expect("error");
        assert!((tip.translation() - nalgebra::Vector3::new(2.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn ur5_fk_at_zero_matches_reference() {
        let k = RobotKinematicsModule::new(RobotModelModule::new_ur5());
        let state = k.robot_joint_state_module().spawn_robot_joint_state(DVector::zeros(6)).expect("error");
        let fk_res = k.compute_fk(&state).expect("error");
        let wrist_3 = fk_res.get_link_pose_by_name("wrist_3_link", k.robot_model_module()).expect("error");
        assert!((wrist_3.translation() - nalgebra::Vector3::new(0.0, 0.10915, 1.001059)).norm() < 1e-9);
        let ee = fk_res.get_link_pose_by_name("ee_link", k.robot_model_module()).expect("error");
        assert!((ee.translation() - nalgebra::Vector3::new(0.0, 0.19145, 1.001059)).norm() < 1e-9);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let k = RobotKinematicsModule::new(RobotModelModule::new_ur5());
        let q = DVector::from_vec(vec![0.1, -0.4, 0.7, 0.2, -0.6, 0.3]);
        let state = k.robot_joint_state_module().spawn_robot_joint_state(q.clone()).expect("error");
        let ee_idx = k.robot_model_module().get_link_idx_by_name("ee_link").expect("error");
        let jacobian = k.compute_jacobian(&state, ee_idx).expect("error");

        let h = 1e-7;
        let fk_0 = k.compute_fk(&state).expect("error");
        let p_0 = fk_0.get_link_pose(ee_idx).expect("error").translation().clone();
        for i in 0..q.len() {
            let mut q_h = q.clone();
            q_h[i] += h;
            let state_h = k.robot_joint_state_module().spawn_robot_joint_state(q_h).expect("error");
            let fk_h = k.compute_fk(&state_h).expect("error");
            let p_h = fk_h.get_link_pose(ee_idx).expect("error").translation().clone();
            let dp = (p_h - p_0) / h;
            for row in 0..3 {
                assert!((jacobian[(row, i)] - dp[row]).abs() < 1e-5,
                        "jacobian mismatch at ({}, {}): {} vs {}", row, i, jacobian[(row, i)], dp[row]);
            }
        }
    }
}
