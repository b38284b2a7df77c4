use nalgebra::DVector;
use crate::robot_modules::robot_kinematics_module::RobotKinematicsModule;
use crate::utils::utils_errors::KinoptError;
use crate::utils::utils_se3::Se3Pose;

pub const FD_PERTURBATION: f64 = 0.000001;

/// A scalar-valued function of a configuration vector, the objective interface consumed by
/// every solver backend in the crate.
///
/// `derivative` dispatches on `DerivativeMode`: `Analytical` uses the function's exact
/// gradient, `FiniteDifference` estimates it numerically from `call`.  When no mode is
/// given, the analytical gradient is used if the function implements one and central
/// finite differencing is the fallback.
pub trait ObjectiveFunction: ObjectiveFunctionClone {
    fn call(&self, x: &DVector<f64>) -> Result<f64, KinoptError>;

    fn derivative(&self, x: &DVector<f64>, mode: Option<DerivativeMode>) -> Result<DVector<f64>, KinoptError> {
        return match mode {
            None => {
                match self.derivative_analytical(x)? {
                    None => { self.derivative_finite_difference(x) }
                    Some(gradient) => { Ok(gradient) }
                }
            }
            Some(DerivativeMode::Analytical) => {
                match self.derivative_analytical(x)? {
                    None => { Err(KinoptError::new_generic_error_str("analytical derivative requested but not implemented for this objective", file!(), line!())) }
                    Some(gradient) => { Ok(gradient) }
                }
            }
            Some(DerivativeMode::FiniteDifference) => { self.derivative_finite_difference(x) }
        }
    }
    /// The exact gradient of the objective, or `None` when the objective does not provide
    /// one.
    fn derivative_analytical(&self, _x: &DVector<f64>) -> Result<Option<DVector<f64>>, KinoptError> {
        Ok(None)
    }
    fn derivative_finite_difference(&self, x: &DVector<f64>) -> Result<DVector<f64>, KinoptError> {
        let h = FD_PERTURBATION;
        let mut out = DVector::zeros(x.len());
        for i in 0..x.len() {
            let mut x_forward = x.clone();
            let mut x_backward = x.clone();
            x_forward[i] += h;
            x_backward[i] -= h;
            let f_forward = self.call(&x_forward)?;
            let f_backward = self.call(&x_backward)?;
            out[i] = (f_forward - f_backward) / (2.0 * h);
        }
        return Ok(out);
    }
}

pub trait ObjectiveFunctionClone {
    fn clone_box(&self) -> Box<dyn ObjectiveFunction>;
}
impl<T> ObjectiveFunctionClone for T where T: 'static + ObjectiveFunction + Clone {
    fn clone_box(&self) -> Box<dyn ObjectiveFunction> {
        Box::new(self.clone())
    }
}
impl Clone for Box<dyn ObjectiveFunction> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[derive(Clone, Debug)]
pub enum DerivativeMode {
    Analytical,
    FiniteDifference
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// The pose-matching objective at the heart of inverse kinematics.  Maps a configuration
/// to the squared norm of the tangent-space displacement between a designated link's
/// current pose and a fixed goal pose.
///
/// The tangent-space displacement is the decoupled 6-vector (world-frame translation
/// difference, rotation logarithm), which is zero exactly when the poses coincide and
/// admits an exact gradient through the geometric Jacobian.
#[derive(Clone)]
pub struct PoseGoalObjective {
    robot_kinematics_module: RobotKinematicsModule,
    goal_link_idx: usize,
    goal_pose: Se3Pose
}
impl PoseGoalObjective {
    /// Fails if `goal_link_name` does not name a link in the model.
    pub fn new(robot_kinematics_module: RobotKinematicsModule, goal_link_name: &str, goal_pose: Se3Pose) -> Result<Self, KinoptError> {
        let goal_link_idx = robot_kinematics_module.robot_model_module().get_link_idx_by_name(goal_link_name)?;
        Ok(Self {
            robot_kinematics_module,
            goal_link_idx,
            goal_pose
        })
    }
    pub fn goal_link_idx(&self) -> usize {
        self.goal_link_idx
    }
    pub fn goal_pose(&self) -> &Se3Pose {
        &self.goal_pose
    }
    /// The plain (non-squared) pose error at the given configuration: the Euclidean norm
    /// of the tangent-space displacement.  Nonnegative for all configurations, zero if and
    /// only if the link's pose equals the goal pose.
    pub fn pose_error(&self, x: &DVector<f64>) -> Result<f64, KinoptError> {
        return Ok(self.tangent_space_error(x)?.norm());
    }
    fn tangent_space_error(&self, x: &DVector<f64>) -> Result<nalgebra::Vector6<f64>, KinoptError> {
        let joint_state = self.robot_kinematics_module.robot_joint_state_module().spawn_robot_joint_state(x.clone())?;
        let fk_res = self.robot_kinematics_module.compute_fk(&joint_state)?;
        let current_pose = fk_res.get_link_pose(self.goal_link_idx)?;
        return Ok(current_pose.displacement_separate_ln(&self.goal_pose));
    }
}
impl ObjectiveFunction for PoseGoalObjective {
    fn call(&self, x: &DVector<f64>) -> Result<f64, KinoptError> {
        return Ok(self.tangent_space_error(x)?.norm_squared());
    }
    fn derivative_analytical(&self, x: &DVector<f64>) -> Result<Option<DVector<f64>>, KinoptError> {
        let joint_state = self.robot_kinematics_module.robot_joint_state_module().spawn_robot_joint_state(x.clone())?;
        let fk_res = self.robot_kinematics_module.compute_fk(&joint_state)?;
        let current_pose = fk_res.get_link_pose(self.goal_link_idx)?;
        let (delta_p, w) = current_pose.displacement_separate_rotation_and_translation(&self.goal_pose);

        let jacobian = self.robot_kinematics_module.compute_jacobian(&joint_state, self.goal_link_idx)?;
        let jacobian_translational = jacobian.rows(0, 3);
        let jacobian_rotational = jacobian.rows(3, 3);

        // d/dq ||p_goal - p(q)||^2 = -2 Jv^T (p_goal - p(q)).  For the rotation term, the
        // gradient of ||log(R(q)^T R_goal)||^2 with respect to a spatial angular velocity
        // is exactly -2 R(q) log(R(q)^T R_goal), since the left Jacobian of SO(3) acts as
        // the identity along its own axis.
        let w_world = current_pose.rotation() * w;
        let gradient = -2.0 * (jacobian_translational.transpose() * delta_p + jacobian_rotational.transpose() * w_world);

        return Ok(Some(gradient));
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// A weighted sum of objectives.  Additional terms (regularization, secondary goals) are
/// composed through this rather than baked into any single objective.
#[derive(Clone)]
pub struct WeightedSumObjective {
    functions: Vec<Box<dyn ObjectiveFunction>>,
    weights: Vec<f64>
}
impl WeightedSumObjective {
    pub fn new() -> Self {
        Self { functions: vec![], weights: vec![] }
    }
    pub fn add_function<F: ObjectiveFunction + Clone + 'static>(&mut self, f: F, weight: Option<f64>) {
        let weight = match weight {
            None => { 1.0 }
            Some(w) => { w }
        };
        self.functions.push(Box::new(f));
        self.weights.push(weight);
    }
    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }
}
impl Default for WeightedSumObjective {
    fn default() -> Self {
        Self::new()
    }
}
impl ObjectiveFunction for WeightedSumObjective {
    fn call(&self, x: &DVector<f64>) -> Result<f64, KinoptError> {
        let mut out = 0.0;
        for (f, w) in self.functions.iter().zip(self.weights.iter()) {
            out += *w * f.call(x)?;
        }
        return Ok(out);
    }
    fn derivative_analytical(&self, x: &DVector<f64>) -> Result<Option<DVector<f64>>, KinoptError> {
        let mut out = DVector::zeros(x.len());
        for (f, w) in self.functions.iter().zip(self.weights.iter()) {
            match f.derivative_analytical(x)? {
                // If any term is missing an exact gradient, the sum falls back as a whole.
                None => { return Ok(None); }
                Some(gradient) => { out += *w * gradient; }
            }
        }
        return Ok(Some(out));
    }
}

/// max(0, f(x)) over an inner objective.  Used to express a less-than-zero inequality
/// as a penalty that vanishes on the feasible side.
#[derive(Clone)]
pub struct MaxZeroCompositionObjective {
    inner: Box<dyn ObjectiveFunction>
}
impl MaxZeroCompositionObjective {
    pub fn new<F: ObjectiveFunction + Clone + 'static>(f: F) -> Self {
        Self { inner: Box::new(f) }
    }
}
impl ObjectiveFunction for MaxZeroCompositionObjective {
    fn call(&self, x: &DVector<f64>) -> Result<f64, KinoptError> {
        return Ok(self.inner.call(x)?.max(0.0));
    }
    fn derivative_analytical(&self, x: &DVector<f64>) -> Result<Option<DVector<f64>>, KinoptError> {
        return if self.inner.call(x)? > 0.0 {
            self.inner.derivative_analytical(x)
        } else {
            Ok(Some(DVector::zeros(x.len())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot_modules::robot_model_module::RobotModelModule;

    fn ur5_pose_goal() -> PoseGoalObjective {
        let k = RobotKinematicsModule::new(RobotModelModule::new_ur5());
        let goal = Se3Pose::new_from_euler_angles(std::f64::consts::FRAC_PI_4, 0., 0., -0.5, 0.1, 0.2);
        PoseGoalObjective::new(k, "ee_link", goal).expect("error")
    }

    #[test]
    fn unknown_goal_link_fails_fast() {
        let k = RobotKinematicsModule::new(RobotModelModule::new_ur5());
        let res = PoseGoalObjective::new(k, "nonexistent_link", Se3Pose::new_identity());
        assert!(res.is_err());
    }

    #[test]
    fn wrong_input_dimension_fails_fast() {
        let f = ur5_pose_goal();
        assert!(f.call(&DVector::zeros(4)).is_err());
    }

    #[test]
    fn error_is_nonnegative() {
        let f = ur5_pose_goal();
        let mut rng = crate::robot_modules::robot_joint_state_module::RobotJointStateModule::new_sampling_rng(3);
        let k = RobotKinematicsModule::new(RobotModelModule::new_ur5());
        for _ in 0..20 {
            let q = k.robot_joint_state_module().sample_joint_state(&mut rng);
            let e = f.pose_error(q.joint_state()).expect("error");
            assert!(e >= 0.0);
        }
    }

    #[test]
    fn error_is_zero_at_exact_goal() {
        // Construct the goal from the FK pose of a known configuration, so that
        // configuration is an exact minimizer.
        let k = RobotKinematicsModule::new(RobotModelModule::new_ur5());
        let q = DVector::from_vec(vec![0.3, -1.1, 0.9, 0.4, -0.2, 0.6]);
        let state = k.robot_joint_state_module().spawn_robot_joint_state(q.clone()).expect("error");
        let fk_res = k.compute_fk(&state).expect("error");
        let ee_idx = k.robot_model_module().get_link_idx_by_name("ee_link").expect("error");
        let goal = fk_res.get_link_pose(ee_idx).expect("error").clone();

        let f = PoseGoalObjective::new(k, "ee_link", goal).expect("error");
        assert!(f.pose_error(&q).expect("error") < 1e-6);
    }

    #[test]
    fn analytical_gradient_matches_finite_differences() {
        let f = ur5_pose_goal();
        let q = DVector::from_vec(vec![0.12, -2.2, -1.45, 1.82, -0.95, 0.17]);
        let analytical = f.derivative(&q, Some(DerivativeMode::Analytical)).expect("error");
        let finite_difference = f.derivative(&q, Some(DerivativeMode::FiniteDifference)).expect("error");
        assert!((analytical - finite_difference).norm() < 1e-4);
    }

    #[test]
    fn boxed_objective_computes_finite_difference_gradients() {
        // The finite-difference default body must stay usable through a trait object,
        // which is how every solver backend holds its objective.
        let f: Box<dyn ObjectiveFunction> = Box::new(ur5_pose_goal());
        let q = DVector::from_vec(vec![0.12, -2.2, -1.45, 1.82, -0.95, 0.17]);
        let gradient = f.derivative(&q, Some(DerivativeMode::FiniteDifference)).expect("error");
        assert_eq!(gradient.len(), 6);
        assert!(gradient.norm() > 0.0);
    }

    #[test]
    fn weighted_sum_scales_terms() {
        let f = ur5_pose_goal();
        let q = DVector::from_vec(vec![0.1, -0.5, 0.3, 0.2, -0.1, 0.4]);
        let single = f.call(&q).expect("error");

        let mut sum = WeightedSumObjective::new();
        sum.add_function(f.clone(), Some(2.0));
        sum.add_function(f, None);
        assert!((sum.call(&q).expect("error") - 3.0 * single).abs() < 1e-12);
    }
}
