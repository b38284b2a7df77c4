use nalgebra::{Unit, Vector3};
use serde::{Serialize, Deserialize};
use crate::utils::utils_errors::KinoptError;
use crate::utils::utils_se3::Se3Pose;

/// The kinematic description of a serial-chain manipulator: an ordered list of links
/// connected by joints.  Link 0 is the chain base; link `i` (for `i > 0`) is the child of
/// joint `i - 1`.  Models are built inline via `add_fixed_joint_and_link` /
/// `add_actuated_joint_and_link`, or through a named preset.
///
/// # Example
/// ```
/// use kinopt::robot_modules::robot_model_module::RobotModelModule;
///
/// let robot_model_module = RobotModelModule::new_ur5();
/// assert_eq!(robot_model_module.num_dofs(), 6);
/// assert!(robot_model_module.get_link_idx_by_name("ee_link").is_ok());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RobotModelModule {
    robot_name: String,
    links: Vec<Link>,
    joints: Vec<Joint>,
    base_offset_pose: Se3Pose
}
impl RobotModelModule {
    pub fn new_empty(robot_name: &str, base_link_name: &str) -> Self {
        Self {
            robot_name: robot_name.to_string(),
            links: vec![ Link { link_name: base_link_name.to_string(), preceding_joint_idx: None } ],
            joints: vec![],
            base_offset_pose: Se3Pose::new_identity()
        }
    }
    /// A 6-DOF UR5-style arm.  Offsets follow the standard UR5 description; the terminal
    /// `ee_link` frame carries the fixed 90 degree yaw offset of the real robot.
    pub fn new_ur5() -> Self {
        let mut out_self = Self::new_empty("ur5", "base_link");
        let pi = std::f64::consts::PI;
        out_self.add_actuated_joint_and_link("shoulder_pan_joint", Se3Pose::new_from_euler_angles(0., 0., 0., 0., 0., 0.089159), JointAxis::new_rotation(Vector3::z()), (-2.0 * pi, 2.0 * pi), "shoulder_link");
        out_self.add_actuated_joint_and_link("shoulder_lift_joint", Se3Pose::new_from_euler_angles(0., 0., 0., 0., 0.13585, 0.), JointAxis::new_rotation(Vector3::y()), (-2.0 * pi, 2.0 * pi), "upper_arm_link");
        out_self.add_actuated_joint_and_link("elbow_joint", Se3Pose::new_from_euler_angles(0., 0., 0., 0., -0.1197, 0.425), JointAxis::new_rotation(Vector3::y()), (-pi, pi), "forearm_link");
        out_self.add_actuated_joint_and_link("wrist_1_joint", Se3Pose::new_from_euler_angles(0., 0., 0., 0., 0., 0.39225), JointAxis::new_rotation(Vector3::y()), (-2.0 * pi, 2.0 * pi), "wrist_1_link");
        out_self.add_actuated_joint_and_link("wrist_2_joint", Se3Pose::new_from_euler_angles(0., 0., 0., 0., 0.093, 0.), JointAxis::new_rotation(Vector3::z()), (-2.0 * pi, 2.0 * pi), "wrist_2_link");
        out_self.add_actuated_joint_and_link("wrist_3_joint", Se3Pose::new_from_euler_angles(0., 0., 0., 0., 0., 0.09465), JointAxis::new_rotation(Vector3::y()), (-2.0 * pi, 2.0 * pi), "wrist_3_link");
        out_self.add_fixed_joint_and_link("ee_fixed_joint", Se3Pose::new_from_euler_angles(0., 0., pi / 2.0, 0., 0.0823, 0.), "ee_link");
        out_self
    }
    /// A planar 3-DOF chain of unit-length links rotating about z.  Small enough to verify
    /// forward kinematics by hand.
    pub fn new_planar_3r() -> Self {
        let mut out_self = Self::new_empty("planar_3r", "base_link");
        let pi = std::f64::consts::PI;
        out_self.add_actuated_joint_and_link("joint_1", Se3Pose::new_identity(), JointAxis::new_rotation(Vector3::z()), (-pi, pi), "link_1");
        out_self.add_actuated_joint_and_link("joint_2", Se3Pose::new_from_euler_angles(0., 0., 0., 1.0, 0., 0.), JointAxis::new_rotation(Vector3::z()), (-pi, pi), "link_2");
        out_self.add_actuated_joint_and_link("joint_3", Se3Pose::new_from_euler_angles(0., 0., 0., 1.0, 0., 0.), JointAxis::new_rotation(Vector3::z()), (-pi, pi), "link_3");
        out_self.add_fixed_joint_and_link("tip_joint", Se3Pose::new_from_euler_angles(0., 0., 0., 1.0, 0., 0.), "tip");
        out_self
    }
    pub fn add_actuated_joint_and_link(&mut self, joint_name: &str, origin_offset_pose: Se3Pose, joint_axis: JointAxis, limits: (f64, f64), child_link_name: &str) {
        self.joints.push(Joint {
            joint_name: joint_name.to_string(),
            origin_offset_pose,
            joint_axis: Some(joint_axis),
            limits
        });
        self.links.push(Link {
            link_name: child_link_name.to_string(),
            preceding_joint_idx: Some(self.joints.len() - 1)
        });
    }
    pub fn add_fixed_joint_and_link(&mut self, joint_name: &str, origin_offset_pose: Se3Pose, child_link_name: &str) {
        self.joints.push(Joint {
            joint_name: joint_name.to_string(),
            origin_offset_pose,
            joint_axis: None,
            limits: (0.0, 0.0)
        });
        self.links.push(Link {
            link_name: child_link_name.to_string(),
            preceding_joint_idx: Some(self.joints.len() - 1)
        });
    }
    pub fn set_base_offset_pose(&mut self, base_offset_pose: Se3Pose) {
        self.base_offset_pose = base_offset_pose;
    }
    ////////////////////////////////////////////////////////////////////////////////////////////////
    pub fn robot_name(&self) -> &str {
        &self.robot_name
    }
    pub fn links(&self) -> &Vec<Link> {
        &self.links
    }
    pub fn joints(&self) -> &Vec<Joint> {
        &self.joints
    }
    pub fn base_offset_pose(&self) -> &Se3Pose {
        &self.base_offset_pose
    }
    pub fn get_link_by_idx(&self, link_idx: usize) -> Result<&Link, KinoptError> {
        KinoptError::new_check_for_idx_out_of_bound_error(link_idx, self.links.len(), file!(), line!())?;
        return Ok(&self.links[link_idx]);
    }
    pub fn get_link_idx_by_name(&self, link_name: &str) -> Result<usize, KinoptError> {
        for (i, link) in self.links.iter().enumerate() {
            if link.link_name() == link_name { return Ok(i); }
        }
        return Err(KinoptError::new_name_not_found_error(link_name, &format!("links of robot {}", self.robot_name), file!(), line!()));
    }
    /// The number of degrees of freedom, i.e., the number of actuated joints.  Fixed joints
    /// do not contribute.
    pub fn num_dofs(&self) -> usize {
        self.joints.iter().filter(|j| j.joint_axis.is_some()).count()
    }
    /// Maps a joint index to its index in a DOF-ordered joint state vector.  `None` for
    /// fixed joints.
    pub fn map_joint_idx_to_dof_idx(&self, joint_idx: usize) -> Option<usize> {
        if joint_idx >= self.joints.len() { return None; }
        if self.joints[joint_idx].joint_axis.is_none() { return None; }
        let dof_idx = self.joints[..joint_idx].iter().filter(|j| j.joint_axis.is_some()).count();
        return Some(dof_idx);
    }
    /// Lower and upper limits of each actuated joint, in DOF order.
    pub fn dof_limits(&self) -> Vec<(f64, f64)> {
        self.joints.iter().filter(|j| j.joint_axis.is_some()).map(|j| j.limits).collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Link {
    link_name: String,
    preceding_joint_idx: Option<usize>
}
impl Link {
    pub fn link_name(&self) -> &str {
        &self.link_name
    }
    pub fn preceding_joint_idx(&self) -> Option<usize> {
        self.preceding_joint_idx
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Joint {
    joint_name: String,
    origin_offset_pose: Se3Pose,
    joint_axis: Option<JointAxis>,
    limits: (f64, f64)
}
impl Joint {
    pub fn joint_name(&self) -> &str {
        &self.joint_name
    }
    pub fn origin_offset_pose(&self) -> &Se3Pose {
        &self.origin_offset_pose
    }
    pub fn joint_axis(&self) -> &Option<JointAxis> {
        &self.joint_axis
    }
    pub fn limits(&self) -> (f64, f64) {
        self.limits
    }
}

/// A single-DOF motion axis.  The axis vector is expressed in the joint's local frame
/// (after the joint's origin offset is applied).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JointAxis {
    axis: Vector3<f64>,
    axis_primitive_type: JointAxisPrimitiveType
}
impl JointAxis {
    pub fn new_rotation(axis: Vector3<f64>) -> Self {
        Self { axis, axis_primitive_type: JointAxisPrimitiveType::Rotation }
    }
    pub fn new_translation(axis: Vector3<f64>) -> Self {
        Self { axis, axis_primitive_type: JointAxisPrimitiveType::Translation }
    }
    pub fn axis(&self) -> &Vector3<f64> {
        &self.axis
    }
    pub fn axis_as_unit(&self) -> Unit<Vector3<f64>> {
        Unit::new_normalize(self.axis)
    }
    pub fn axis_primitive_type(&self) -> &JointAxisPrimitiveType {
        &self.axis_primitive_type
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum JointAxisPrimitiveType {
    Rotation,
    Translation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ur5_model_shape() {
        let m = RobotModelModule::new_ur5();
        assert_eq!(m.num_dofs(), 6);
        assert_eq!(m.links().len(), 8);
        assert_eq!(m.joints().len(), 7);
        assert_eq!(m.map_joint_idx_to_dof_idx(5), Some(5));
        assert_eq!(m.map_joint_idx_to_dof_idx(6), None);
    }

    #[test]
    fn unknown_link_name_is_an_error() {
        let m = RobotModelModule::new_ur5();
        assert!(m.get_link_idx_by_name("not_a_link").is_err());
    }

    #[test]
    fn serde_round_trip() {
        let m = RobotModelModule::new_planar_3r();
        let json = serde_json::to_string(&m).expect("serialize failed");
        let m2: RobotModelModule = serde_json::from_str(&json).expect("deserialize failed");
        assert_eq!(m2.robot_name(), "planar_3r");
        assert_eq!(m2.num_dofs(), m.num_dofs());
    }
}
