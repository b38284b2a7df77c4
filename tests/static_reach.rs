use std::time::Duration;
use nalgebra::DVector;
use kinopt::inverse_kinematics::{IkAllowableError, IkGoal, IkSolver};
use kinopt::nonlinear_optimization::{NonlinearOptimizerType, OptimizerParameters, SolveStatus};
use kinopt::robot_modules::robot_joint_state_module::RobotJointState;
use kinopt::robot_modules::robot_kinematics_module::RobotKinematicsModule;
use kinopt::robot_modules::robot_model_module::RobotModelModule;
use kinopt::utils::utils_se3::Se3Pose;
use kinopt::visualization::{NullObserver, RecordingObserver};

fn scenario_goal() -> Se3Pose {
    Se3Pose::new_from_euler_angles(std::f64::consts::FRAC_PI_4, 0., 0., -0.5, 0.1, 0.2)
}

fn scenario_start(solver: &IkSolver) -> RobotJointState {
    solver.robot_kinematics_module().robot_joint_state_module()
        .spawn_robot_joint_state(DVector::from_column_slice(&[0.12, -2.2, -1.45, 1.82, -0.95, 0.17]))
        .expect("error")
}

fn scenario_solver(optimizer_type: NonlinearOptimizerType) -> IkSolver {
    let k = RobotKinematicsModule::new(RobotModelModule::new_ur5());
    let mut solver = IkSolver::new(k, optimizer_type);
    solver.add_goal(IkGoal::new("ee_link", scenario_goal()));
    solver.set_allowable_error(IkAllowableError::new(1e-4, 1e-4));

    let mut parameters = OptimizerParameters::default();
    parameters.set_max_iterations(500);
    parameters.set_max_time(Duration::from_secs(20));
    parameters.set_gradient_tolerance(1e-7);
    solver.set_parameters(parameters);

    solver
}

fn solution_ee_pose(solver: &IkSolver, joint_state: &RobotJointState) -> Se3Pose {
    let fk_result = solver.robot_kinematics_module().compute_fk(joint_state).expect("error");
    fk_result.get_link_pose_by_name("ee_link", solver.robot_kinematics_module().robot_model_module()).expect("error").clone()
}

#[test]
fn open_backend_reaches_the_static_goal() {
    let solver = scenario_solver(NonlinearOptimizerType::OpEn);
    let init = scenario_start(&solver);

    let solution = solver.solve_with_restarts(&init, 10, 1, &mut NullObserver).expect("error");

    assert!(solution.is_within_allowable_error(&IkAllowableError::new(1e-4, 1e-4)), "reports were {:?}", solution.error_reports());
}

#[test]
fn bfgs_backend_reaches_the_static_goal() {
    let solver = scenario_solver(NonlinearOptimizerType::Bfgs);
    let init = scenario_start(&solver);

    let solution = solver.solve_with_restarts(&init, 10, 1, &mut NullObserver).expect("error");

    assert!(solution.is_within_allowable_error(&IkAllowableError::new(1e-4, 1e-4)), "reports were {:?}", solution.error_reports());
}

#[test]
fn both_backends_land_on_the_same_pose() {
    let open_solver = scenario_solver(NonlinearOptimizerType::OpEn);
    let bfgs_solver = scenario_solver(NonlinearOptimizerType::Bfgs);

    let open_solution = open_solver.solve_with_restarts(&scenario_start(&open_solver), 10, 1, &mut NullObserver).expect("error");
    let bfgs_solution = bfgs_solver.solve_with_restarts(&scenario_start(&bfgs_solver), 10, 1, &mut NullObserver).expect("error");

    // Joint configurations may sit in different basins, but the end-effector poses they
    // realize must agree.
    let open_pose = solution_ee_pose(&open_solver, open_solution.joint_state());
    let bfgs_pose = solution_ee_pose(&bfgs_solver, bfgs_solution.joint_state());

    let (dt, dr) = open_pose.displacement_separate_rotation_and_translation(&bfgs_pose);
    assert!(dt.norm() < 1e-3, "translation gap was {}", dt.norm());
    assert!(dr.norm() < 1e-3, "rotation gap was {}", dr.norm());
}

#[test]
fn solved_pose_matches_the_requested_translation() {
    let solver = scenario_solver(NonlinearOptimizerType::OpEn);
    let solution = solver.solve_with_restarts(&scenario_start(&solver), 10, 1, &mut NullObserver).expect("error");

    let pose = solution_ee_pose(&solver, solution.joint_state());
    let translation = pose.translation();
    assert!((translation[0] - -0.5).abs() < 1e-3);
    assert!((translation[1] - 0.1).abs() < 1e-3);
    assert!((translation[2] - 0.2).abs() < 1e-3);
}

#[test]
fn translating_the_goal_translates_the_solved_frame() {
    let solver = scenario_solver(NonlinearOptimizerType::OpEn);
    let base_solution = solver.solve_with_restarts(&scenario_start(&solver), 10, 1, &mut NullObserver).expect("error");
    let base_pose = solution_ee_pose(&solver, base_solution.joint_state());

    let shift = nalgebra::Vector3::new(0.05, 0.05, -0.05);
    let shifted_goal = Se3Pose::new(scenario_goal().rotation().clone(), scenario_goal().translation() + shift);
    let k = RobotKinematicsModule::new(RobotModelModule::new_ur5());
    let mut shifted_solver = IkSolver::new(k, NonlinearOptimizerType::OpEn);
    shifted_solver.add_goal(IkGoal::new("ee_link", shifted_goal));
    shifted_solver.set_allowable_error(IkAllowableError::new(1e-4, 1e-4));

    let shifted_solution = shifted_solver.solve_with_restarts(&scenario_start(&shifted_solver), 10, 1, &mut NullObserver).expect("error");
    let shifted_pose = solution_ee_pose(&shifted_solver, shifted_solution.joint_state());

    let realized_shift = shifted_pose.translation() - base_pose.translation();
    assert!((realized_shift - shift).norm() < 1e-3, "realized shift was {:?}", realized_shift);
}

#[test]
fn starting_at_an_exact_solution_stays_there() {
    let k = RobotKinematicsModule::new(RobotModelModule::new_ur5());
    let q_star = DVector::from_column_slice(&[0.1, -1.9, -1.3, 1.6, -0.8, 0.3]);
    let state = k.robot_joint_state_module().spawn_robot_joint_state(q_star.clone()).expect("error");
    let fk_result = k.compute_fk(&state).expect("error");
    let goal = fk_result.get_link_pose_by_name("ee_link", k.robot_model_module()).expect("error").clone();

    let mut solver = IkSolver::new(k, NonlinearOptimizerType::OpEn);
    solver.add_goal(IkGoal::new("ee_link", goal));

    let solution = solver.solve(&state, &mut NullObserver).expect("error");

    assert_eq!(*solution.solve_status(), SolveStatus::Converged);
    assert!((solution.joint_state().joint_state() - &q_star).norm() < 1e-3);
    // The default solver tolerance leaves a residual of order 1e-6 rad even when the
    // start is an exact minimizer, so the acceptance threshold matches the scenario
    // tolerances used throughout this file.
    assert!(solution.is_within_allowable_error(&IkAllowableError::new(1e-4, 1e-4)), "reports were {:?}", solution.error_reports());
}

#[test]
fn observers_see_the_whole_candidate_stream() {
    let solver = scenario_solver(NonlinearOptimizerType::Bfgs);
    let init = scenario_start(&solver);

    let mut observer = RecordingObserver::new();
    let solution = solver.solve(&init, &mut observer).expect("error");

    assert!(observer.len() > 10);
    for (q, cost) in observer.records() {
        assert_eq!(q.len(), 6);
        assert!(*cost >= 0.0);
    }
    // The stream includes the accepted iterates, so the returned cost must show up in it.
    let returned = observer.records().iter().any(|(_, c)| (*c - solution.cost()).abs() < 1e-12);
    assert!(returned);
}
