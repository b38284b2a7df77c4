use std::time::Duration;
use nalgebra::DVector;
use kinopt::inverse_kinematics::{IkAllowableError, IkGoal, IkSolver};
use kinopt::nonlinear_optimization::{NonlinearOptimizerType, OptimizerParameters};
use kinopt::robot_modules::robot_kinematics_module::RobotKinematicsModule;
use kinopt::robot_modules::robot_model_module::RobotModelModule;
use kinopt::utils::utils_console::{console_print, console_print_new_line, PrintColor, PrintMode};
use kinopt::utils::utils_se3::Se3Pose;
use kinopt::visualization::ConsoleTraceObserver;

/// Solves a single static reach on a UR5: rotate the end effector 45 degrees about x and
/// place it at (-0.5, 0.1, 0.2), starting from a configuration well away from the answer.
/// The same problem is run through both backends so their results can be compared side
/// by side.
fn main() {
    let robot_kinematics_module = RobotKinematicsModule::new(RobotModelModule::new_ur5());
    let goal_pose = Se3Pose::new_from_euler_angles(std::f64::consts::FRAC_PI_4, 0., 0., -0.5, 0.1, 0.2);
    let start = DVector::from_column_slice(&[0.12, -2.2, -1.45, 1.82, -0.95, 0.17]);

    for optimizer_type in [NonlinearOptimizerType::Bfgs, NonlinearOptimizerType::OpEn] {
        console_print(&format!("==== solving with the {:?} backend ====", optimizer_type), PrintMode::Println, PrintColor::Cyan, true);

        let mut solver = IkSolver::new(robot_kinematics_module.clone(), optimizer_type);
        solver.add_goal(IkGoal::new("ee_link", goal_pose.clone()));
        solver.set_allowable_error(IkAllowableError::new(0.001, 0.001));

        let mut parameters = OptimizerParameters::default();
        parameters.set_max_iterations(500);
        parameters.set_max_time(Duration::from_secs(5));
        parameters.set_gradient_tolerance(1e-6);
        solver.set_parameters(parameters);

        let init = solver.robot_kinematics_module().robot_joint_state_module().spawn_robot_joint_state(start.clone()).expect("could not spawn the start configuration");

        let ee_idx = solver.robot_kinematics_module().robot_model_module().get_link_idx_by_name("ee_link").expect("ee_link is missing from the model");
        let mut observer = ConsoleTraceObserver::new()
            .with_display_link(solver.robot_kinematics_module().clone(), ee_idx)
            .with_pacing_delay(Duration::from_millis(2));
        let solution = solver.solve_with_restarts(&init, 10, 1, &mut observer).expect("the IK solve failed");

        solution.print_summary();

        let fk_result = solver.robot_kinematics_module().compute_fk(solution.joint_state()).expect("could not compute FK at the solution");
        fk_result.print_summary();
        console_print_new_line();
    }
}
