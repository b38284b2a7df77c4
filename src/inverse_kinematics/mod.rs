use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::nonlinear_optimization::{NonlinearOptimizer, NonlinearOptimizerType, OptimizerParameters, SolveStatus};
use crate::objective_function::{PoseGoalObjective, WeightedSumObjective};
use crate::robot_modules::robot_joint_state_module::RobotJointState;
use crate::robot_modules::robot_kinematics_module::RobotKinematicsModule;
use crate::utils::utils_console::{console_print, console_print_new_line, PrintColor, PrintMode};
use crate::utils::utils_errors::KinoptError;
use crate::utils::utils_se3::Se3Pose;
use crate::visualization::ConfigurationObserver;

/// A single end-effector pose target.  The link is resolved by name against the robot
/// model when the solver builds its objective, so a typo fails up front rather than
/// mid-solve.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IkGoal {
    goal_link_name: String,
    goal_pose: Se3Pose,
    weight: f64
}
impl IkGoal {
    pub fn new(goal_link_name: &str, goal_pose: Se3Pose) -> Self {
        Self {
            goal_link_name: goal_link_name.to_string(),
            goal_pose,
            weight: 1.0
        }
    }
    pub fn new_with_weight(goal_link_name: &str, goal_pose: Se3Pose, weight: f64) -> Self {
        Self {
            goal_link_name: goal_link_name.to_string(),
            goal_pose,
            weight
        }
    }
    pub fn goal_link_name(&self) -> &str {
        &self.goal_link_name
    }
    pub fn goal_pose(&self) -> &Se3Pose {
        &self.goal_pose
    }
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Per-axis acceptance thresholds on the residual at the returned configuration.
/// Rotation error is in radians, translation error in meters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IkAllowableError {
    rotation_error: f64,
    translation_error: f64
}
impl IkAllowableError {
    pub fn new(rotation_error: f64, translation_error: f64) -> Self {
        Self { rotation_error, translation_error }
    }
    pub fn rotation_error(&self) -> f64 {
        self.rotation_error
    }
    pub fn translation_error(&self) -> f64 {
        self.translation_error
    }
}
impl Default for IkAllowableError {
    fn default() -> Self {
        Self { rotation_error: 0.001, translation_error: 0.001 }
    }
}

/// The residual at a solution, reported per goal and split into its rotation and
/// translation components.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IkErrorReport {
    goal_link_name: String,
    rotation_error: f64,
    translation_error: f64
}
impl IkErrorReport {
    pub fn goal_link_name(&self) -> &str {
        &self.goal_link_name
    }
    pub fn rotation_error(&self) -> f64 {
        self.rotation_error
    }
    pub fn translation_error(&self) -> f64 {
        self.translation_error
    }
    pub fn is_within(&self, allowable_error: &IkAllowableError) -> bool {
        self.rotation_error <= allowable_error.rotation_error && self.translation_error <= allowable_error.translation_error
    }
    pub fn print_summary(&self) {
        console_print(&format!("  goal link {:?} ---> ", self.goal_link_name), PrintMode::Print, PrintColor::Blue, true);
        console_print(&format!("rotation error: {:.6} rad, translation error: {:.6} m", self.rotation_error, self.translation_error), PrintMode::Println, PrintColor::None, false);
    }
}

#[derive(Clone, Debug)]
pub struct IkSolution {
    joint_state: RobotJointState,
    solve_status: SolveStatus,
    cost: f64,
    error_reports: Vec<IkErrorReport>,
    num_restarts: usize,
    solve_time: Duration
}
impl IkSolution {
    pub fn joint_state(&self) -> &RobotJointState {
        &self.joint_state
    }
    pub fn solve_status(&self) -> &SolveStatus {
        &self.solve_status
    }
    pub fn cost(&self) -> f64 {
        self.cost
    }
    pub fn error_reports(&self) -> &Vec<IkErrorReport> {
        &self.error_reports
    }
    pub fn num_restarts(&self) -> usize {
        self.num_restarts
    }
    pub fn solve_time(&self) -> Duration {
        self.solve_time
    }
    pub fn is_within_allowable_error(&self, allowable_error: &IkAllowableError) -> bool {
        self.error_reports.iter().all(|r| r.is_within(allowable_error))
    }
    pub fn print_summary(&self) {
        console_print(&format!("IK solve status ---> {:?} ", self.solve_status), PrintMode::Println, PrintColor::Blue, true);
        console_print(&format!("  joint state: {:?}", self.joint_state.joint_state().as_slice()), PrintMode::Println, PrintColor::None, false);
        console_print(&format!("  cost: {:.8}, restarts: {}, solve time: {:?}", self.cost, self.num_restarts, self.solve_time), PrintMode::Println, PrintColor::None, false);
        for r in &self.error_reports {
            r.print_summary();
        }
        console_print_new_line();
    }
}

/// Inverse kinematics over a pose-error objective.  The backend is selected up front:
/// `Bfgs` runs derivative-free of the robot Jacobian (finite differences), `OpEn` uses
/// the exact analytical gradient and honors joint limit bounds.
#[derive(Clone)]
pub struct IkSolver {
    robot_kinematics_module: RobotKinematicsModule,
    goals: Vec<IkGoal>,
    optimizer_type: NonlinearOptimizerType,
    parameters: OptimizerParameters,
    allowable_error: IkAllowableError
}
impl IkSolver {
    pub fn new(robot_kinematics_module: RobotKinematicsModule, optimizer_type: NonlinearOptimizerType) -> Self {
        Self {
            robot_kinematics_module,
            goals: vec![],
            optimizer_type,
            parameters: OptimizerParameters::default(),
            allowable_error: IkAllowableError::default()
        }
    }
    pub fn add_goal(&mut self, goal: IkGoal) {
        self.goals.push(goal);
    }
    pub fn set_parameters(&mut self, parameters: OptimizerParameters) {
        self.parameters = parameters;
    }
    pub fn set_allowable_error(&mut self, allowable_error: IkAllowableError) {
        self.allowable_error = allowable_error;
    }
    pub fn allowable_error(&self) -> &IkAllowableError {
        &self.allowable_error
    }
    pub fn robot_kinematics_module(&self) -> &RobotKinematicsModule {
        &self.robot_kinematics_module
    }

    /// A single solve from the given initial configuration.
    pub fn solve(&self, init_condition: &RobotJointState, observer: &mut dyn ConfigurationObserver) -> Result<IkSolution, KinoptError> {
        let num_dofs = self.robot_kinematics_module.robot_model_module().num_dofs();
        KinoptError::new_check_for_dimension_mismatch_error(init_condition.len(), num_dofs, "IkSolver::solve", file!(), line!())?;
        if self.goals.is_empty() {
            return Err(KinoptError::new_generic_error_str("IkSolver::solve was called with no goals.", file!(), line!()));
        }

        let objective = self.build_objective()?;
        let mut optimizer = NonlinearOptimizer::new(objective, num_dofs, self.optimizer_type.clone());
        optimizer.set_bounds(self.robot_kinematics_module.robot_model_module().dof_limits());

        let result = optimizer.optimize(init_condition.joint_state(), &self.parameters, observer)?;

        let joint_state = self.robot_kinematics_module.robot_joint_state_module().spawn_robot_joint_state(result.x_min().clone())?;
        let error_reports = self.compute_error_reports(&joint_state)?;

        return Ok(IkSolution {
            joint_state,
            solve_status: result.solve_status().clone(),
            cost: result.cost(),
            error_reports,
            num_restarts: 0,
            solve_time: result.solve_time()
        });
    }

    /// Solve, and on a degraded or out-of-tolerance result restart from random
    /// configurations up to `max_restarts` times, keeping the best solution seen.
    /// The restart samples are drawn from a seeded generator so reruns reproduce.
    pub fn solve_with_restarts(&self, init_condition: &RobotJointState, max_restarts: usize, seed: u64, observer: &mut dyn ConfigurationObserver) -> Result<IkSolution, KinoptError> {
        let mut rng = crate::robot_modules::robot_joint_state_module::RobotJointStateModule::new_sampling_rng(seed);

        let mut best_solution = self.solve(init_condition, observer)?;
        if *best_solution.solve_status() == SolveStatus::Converged && best_solution.is_within_allowable_error(&self.allowable_error) {
            return Ok(best_solution);
        }

        for restart_idx in 0..max_restarts {
            console_print(&format!("IK attempt {} did not reach the allowable error (cost {:.8}).  Restarting from a random configuration.", restart_idx + 1, best_solution.cost()), PrintMode::Println, PrintColor::Yellow, true);

            let restart_condition = self.robot_kinematics_module.robot_joint_state_module().sample_joint_state(&mut rng);
            let mut solution = self.solve(&restart_condition, observer)?;
            solution.num_restarts = restart_idx + 1;

            if solution.cost() < best_solution.cost() {
                best_solution = solution;
                best_solution.num_restarts = restart_idx + 1;
            }

            if *best_solution.solve_status() == SolveStatus::Converged && best_solution.is_within_allowable_error(&self.allowable_error) {
                return Ok(best_solution);
            }
        }

        return Ok(best_solution);
    }

    fn build_objective(&self) -> Result<WeightedSumObjective, KinoptError> {
        let mut objective = WeightedSumObjective::new();
        for goal in &self.goals {
            let f = PoseGoalObjective::new(self.robot_kinematics_module.clone(), goal.goal_link_name(), goal.goal_pose().clone())?;
            objective.add_function(f, Some(goal.weight()));
        }
        return Ok(objective);
    }

    fn compute_error_reports(&self, joint_state: &RobotJointState) -> Result<Vec<IkErrorReport>, KinoptError> {
        let fk_result = self.robot_kinematics_module.compute_fk(joint_state)?;
        let mut out = vec![];
        for goal in &self.goals {
            let pose = fk_result.get_link_pose_by_name(goal.goal_link_name(), self.robot_kinematics_module.robot_model_module())?;
            let (dt, dr) = pose.displacement_separate_rotation_and_translation(goal.goal_pose());
            out.push(IkErrorReport {
                goal_link_name: goal.goal_link_name().to_string(),
                rotation_error: dr.norm(),
                translation_error: dt.norm()
            });
        }
        return Ok(out);
    }
}
