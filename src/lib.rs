
//! Kinopt is a small toolbox for optimization-based inverse kinematics on serial chain
//! robots.  A robot model drives forward kinematics and geometric Jacobians, a pose-error
//! objective measures the gap between an end-effector pose and a target, and one of two
//! nonlinear optimization backends (quasi-Newton with finite differences, or PANOC/ALM
//! with exact gradients) drives that error down.  Every candidate configuration the
//! solvers evaluate can be streamed to an observer for tracing or visualization.

pub mod inverse_kinematics;
pub mod nonlinear_optimization;
pub mod objective_function;
pub mod robot_modules;
pub mod utils;
pub mod visualization;
