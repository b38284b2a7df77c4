use std::time::Duration;
use nalgebra::DVector;
use crate::robot_modules::robot_kinematics_module::RobotKinematicsModule;
use crate::utils::utils_console::{console_print, PrintColor, PrintMode};

/// A side-effecting consumer of intermediate configurations.  Solver backends invoke
/// `observe` once per candidate evaluation; implementations must isolate their own
/// failures (the signature is infallible, so nothing an observer does can abort an
/// optimization in progress).
pub trait ConfigurationObserver {
    fn observe(&mut self, q: &DVector<f64>, cost: f64);
}

/// An observer that does nothing.  Used for headless solves.
pub struct NullObserver;
impl ConfigurationObserver for NullObserver {
    fn observe(&mut self, _q: &DVector<f64>, _cost: f64) { }
}

/// Prints an iteration trace to the console, optionally recomputing and displaying the
/// pose of a designated link at each candidate, and optionally pacing updates with a fixed
/// delay so the progression is perceptible as an animation.
pub struct ConsoleTraceObserver {
    display_link: Option<(RobotKinematicsModule, usize)>,
    pacing_delay: Option<Duration>,
    num_observed: usize
}
impl ConsoleTraceObserver {
    pub fn new() -> Self {
        Self {
            display_link: None,
            pacing_delay: None,
            num_observed: 0
        }
    }
    /// Also display the pose of the given link at every observed configuration.
    pub fn with_display_link(mut self, robot_kinematics_module: RobotKinematicsModule, link_idx: usize) -> Self {
        self.display_link = Some((robot_kinematics_module, link_idx));
        self
    }
    pub fn with_pacing_delay(mut self, pacing_delay: Duration) -> Self {
        self.pacing_delay = Some(pacing_delay);
        self
    }
    pub fn num_observed(&self) -> usize {
        self.num_observed
    }
}
impl Default for ConsoleTraceObserver {
    fn default() -> Self {
        Self::new()
    }
}
impl ConfigurationObserver for ConsoleTraceObserver {
    fn observe(&mut self, q: &DVector<f64>, cost: f64) {
        self.num_observed += 1;
        console_print(&format!("candidate {:>5} | cost {:>13.6e}", self.num_observed, cost), PrintMode::Println, PrintColor::Cyan, false);

        if let Some((robot_kinematics_module, link_idx)) = &self.display_link {
            // FK failures here stay here.  A bad display never aborts the solve.
            let pose_display = robot_kinematics_module.robot_joint_state_module().spawn_robot_joint_state(q.clone())
                .and_then(|state| robot_kinematics_module.compute_fk(&state).map(|fk_res| fk_res.get_link_pose(*link_idx).ok().cloned()));
            if let Ok(Some(pose)) = pose_display {
                let (euler_angles, translation) = pose.to_euler_angles_and_translation();
                console_print(&format!("   > frame rpy: {:?}  xyz: {:?}", euler_angles, translation), PrintMode::Println, PrintColor::None, false);
            }
        }

        if let Some(pacing_delay) = self.pacing_delay {
            std::thread::sleep(pacing_delay);
        }
    }
}

/// Records every observed configuration and cost.  Mostly useful in tests and for
/// post-hoc trajectory playback.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    records: Vec<(DVector<f64>, f64)>
}
impl RecordingObserver {
    pub fn new() -> Self {
        Self { records: vec![] }
    }
    pub fn records(&self) -> &Vec<(DVector<f64>, f64)> {
        &self.records
    }
    pub fn len(&self) -> usize {
        self.records.len()
    }
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
impl ConfigurationObserver for RecordingObserver {
    fn observe(&mut self, q: &DVector<f64>, cost: f64) {
        self.records.push((q.clone(), cost));
    }
}
