use std::sync::Mutex;
use std::time::Duration;
use nalgebra::{DMatrix, DVector};
use optimization_engine::{constraints, Optimizer, Problem, SolverError};
use optimization_engine::alm::{AlmCache, AlmFactory, AlmOptimizer, AlmProblem, NO_JACOBIAN_MAPPING, NO_MAPPING, NO_SET};
use optimization_engine::core::ExitStatus;
use optimization_engine::panoc::{PANOCCache, PANOCOptimizer};
use crate::objective_function::{DerivativeMode, MaxZeroCompositionObjective, ObjectiveFunction, WeightedSumObjective};
use crate::utils::utils_console::{console_print, PrintColor, PrintMode};
use crate::utils::utils_errors::KinoptError;
use crate::visualization::ConfigurationObserver;

/// A nonlinear optimizer over one of the crate's two backends:
/// - `Bfgs`: quasi-Newton minimization with a strong-Wolfe line search, by default fed
///   with finite-difference gradients.
/// - `OpEn`: the PANOC/ALM solver from the `optimization_engine` crate, by default fed
///   with exact analytical gradients, supporting bounds and constraints.
///
/// Both backends report every candidate evaluation to a `ConfigurationObserver` and
/// return an `OptimizationResult` whose `SolveStatus` makes a non-converged solve
/// explicit rather than silently handing back the last iterate.
#[derive(Clone)]
pub enum NonlinearOptimizer {
    Bfgs(BfgsNonlinearOptimizer),
    OpEn(OpEnNonlinearOptimizer)
}
impl NonlinearOptimizer {
    pub fn new<F: ObjectiveFunction + Clone + 'static>(cost: F, problem_size: usize, t: NonlinearOptimizerType) -> Self {
        return match t {
            NonlinearOptimizerType::Bfgs => { Self::Bfgs(BfgsNonlinearOptimizer::new(cost, problem_size)) }
            NonlinearOptimizerType::OpEn => { Self::OpEn(OpEnNonlinearOptimizer::new(cost, problem_size)) }
        }
    }
    pub fn add_equality_constraint<F: ObjectiveFunction + Clone + 'static>(&mut self, f: F) {
        match self {
            NonlinearOptimizer::Bfgs(_) => {}
            NonlinearOptimizer::OpEn(n) => { n.add_equality_constraint(f); }
        }
    }
    pub fn add_less_than_zero_inequality_constraint<F: ObjectiveFunction + Clone + 'static>(&mut self, f: F) {
        match self {
            NonlinearOptimizer::Bfgs(_) => {}
            NonlinearOptimizer::OpEn(n) => { n.add_less_than_zero_inequality_constraint(f); }
        }
    }
    pub fn set_bounds(&mut self, bounds: Vec<(f64, f64)>) {
        match self {
            NonlinearOptimizer::Bfgs(_) => {}
            NonlinearOptimizer::OpEn(n) => { n.set_bounds(bounds); }
        }
    }
    pub fn optimize(&mut self, init_condition: &DVector<f64>, parameters: &OptimizerParameters, observer: &mut dyn ConfigurationObserver) -> Result<OptimizationResult, KinoptError> {
        return match self {
            NonlinearOptimizer::Bfgs(n) => { n.optimize(init_condition, parameters, observer) }
            NonlinearOptimizer::OpEn(n) => { n.optimize(init_condition, parameters, observer) }
        }
    }
}

#[derive(Clone, Debug)]
pub enum NonlinearOptimizerType {
    Bfgs,
    OpEn
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// BFGS with a strong-Wolfe line search.  The inverse Hessian approximation starts at the
/// identity and is rescaled after the first update.
#[derive(Clone)]
pub struct BfgsNonlinearOptimizer {
    cost_function: Box<dyn ObjectiveFunction>,
    problem_size: usize,
    derivative_mode: DerivativeMode
}
impl BfgsNonlinearOptimizer {
    pub fn new<F: ObjectiveFunction + Clone + 'static>(cost: F, problem_size: usize) -> Self {
        Self {
            cost_function: Box::new(cost),
            problem_size,
            derivative_mode: DerivativeMode::FiniteDifference
        }
    }
    pub fn set_derivative_mode(&mut self, derivative_mode: DerivativeMode) {
        self.derivative_mode = derivative_mode;
    }
    pub fn optimize(&mut self, init_condition: &DVector<f64>, parameters: &OptimizerParameters, observer: &mut dyn ConfigurationObserver) -> Result<OptimizationResult, KinoptError> {
        KinoptError::new_check_for_dimension_mismatch_error(init_condition.len(), self.problem_size, "BfgsNonlinearOptimizer::optimize", file!(), line!())?;

        let start = instant::Instant::now();
        let max_iterations = parameters.max_iterations.unwrap_or(300);

        let cost_function = &self.cost_function;
        let derivative_mode = self.derivative_mode.clone();
        let mut evaluate = |x: &DVector<f64>| -> Result<(f64, DVector<f64>), KinoptError> {
            let f = cost_function.call(x)?;
            let g = cost_function.derivative(x, Some(derivative_mode.clone()))?;
            observer.observe(x, f);
            Ok((f, g))
        };

        let n = self.problem_size;
        let mut x = init_condition.clone();
        let (mut f_k, mut g_k) = evaluate(&x)?;
        let mut h_inv = DMatrix::<f64>::identity(n, n);
        let mut first_update_done = false;

        let mut num_iterations = 0;
        let mut solve_status = SolveStatus::Degraded;

        while num_iterations < max_iterations {
            if !g_k.norm().is_finite() {
                console_print("BFGS gradient became non-finite.  Returning last iterate as a degraded result.", PrintMode::Println, PrintColor::Yellow, true);
                break;
            }
            if g_k.norm() < parameters.gradient_tolerance {
                solve_status = SolveStatus::Converged;
                break;
            }
            if let Some(max_time) = &parameters.max_time {
                if start.elapsed() > *max_time {
                    console_print("BFGS hit its time cap before converging.  Returning last iterate as a degraded result.", PrintMode::Println, PrintColor::Yellow, true);
                    break;
                }
            }

            let mut p = -(&h_inv * &g_k);
            if g_k.dot(&p) >= 0.0 {
                // The approximation stopped producing descent directions; restart it.
                h_inv = DMatrix::identity(n, n);
                p = -g_k.clone();
            }

            let line_search_result = wolfe_line_search(&mut evaluate, &x, &p, f_k, &g_k)?;
            let (alpha, f_next, g_next) = match line_search_result {
                None => {
                    console_print("BFGS line search failed to find an acceptable step.  Returning last iterate as a degraded result.", PrintMode::Println, PrintColor::Yellow, true);
                    break;
                }
                Some(res) => { res }
            };

            let s = alpha * &p;
            let y = &g_next - &g_k;
            let sy = s.dot(&y);

            x += &s;
            f_k = f_next;
            g_k = g_next;
            num_iterations += 1;

            // The curvature condition s^T y > 0 holds under an exact Wolfe line search;
            // skip the update rather than corrupt the approximation when it does not.
            if sy > 1e-10 {
                if !first_update_done {
                    let yy = y.dot(&y);
                    if yy > 0.0 { h_inv *= sy / yy; }
                    first_update_done = true;
                }
                let rho = 1.0 / sy;
                let i_mat = DMatrix::<f64>::identity(n, n);
                let left = &i_mat - rho * (&s * y.transpose());
                let right = &i_mat - rho * (&y * s.transpose());
                h_inv = left * h_inv * right + rho * (&s * s.transpose());
            }
        }

        if num_iterations >= max_iterations && solve_status == SolveStatus::Degraded {
            console_print(&format!("BFGS reached its iteration cap ({}) before converging.  Returning last iterate as a degraded result.", max_iterations), PrintMode::Println, PrintColor::Yellow, true);
        }

        return Ok(OptimizationResult {
            x_min: x,
            solve_status,
            cost: f_k,
            num_inner_iterations: num_iterations,
            num_outer_iterations: 0,
            solve_time: start.elapsed()
        });
    }
}

const WOLFE_C1: f64 = 1e-4;
const WOLFE_C2: f64 = 0.9;

/// Strong-Wolfe line search (bracket then zoom).  Returns `None` if no acceptable step
/// was found within the attempt budget.
fn wolfe_line_search<F>(evaluate: &mut F, x: &DVector<f64>, p: &DVector<f64>, f_0: f64, g_0: &DVector<f64>) -> Result<Option<(f64, f64, DVector<f64>)>, KinoptError>
    where F: FnMut(&DVector<f64>) -> Result<(f64, DVector<f64>), KinoptError> {
    let dphi_0 = g_0.dot(p);
    if dphi_0 >= 0.0 { return Ok(None); }

    let mut alpha_prev = 0.0;
    let mut f_prev = f_0;
    let mut alpha = 1.0;

    for i in 0..20 {
        let x_alpha = x + alpha * p;
        let (f_alpha, g_alpha) = evaluate(&x_alpha)?;
        let dphi_alpha = g_alpha.dot(p);

        if f_alpha > f_0 + WOLFE_C1 * alpha * dphi_0 || (i > 0 && f_alpha >= f_prev) {
            return wolfe_zoom(evaluate, x, p, f_0, dphi_0, alpha_prev, alpha, f_prev);
        }
        if dphi_alpha.abs() <= -WOLFE_C2 * dphi_0 {
            return Ok(Some((alpha, f_alpha, g_alpha)));
        }
        if dphi_alpha >= 0.0 {
            return wolfe_zoom(evaluate, x, p, f_0, dphi_0, alpha, alpha_prev, f_alpha);
        }

        alpha_prev = alpha;
        f_prev = f_alpha;
        alpha *= 2.0;
    }

    Ok(None)
}

fn wolfe_zoom<F>(evaluate: &mut F, x: &DVector<f64>, p: &DVector<f64>, f_0: f64, dphi_0: f64, mut alpha_lo: f64, mut alpha_hi: f64, mut f_lo: f64) -> Result<Option<(f64, f64, DVector<f64>)>, KinoptError>
    where F: FnMut(&DVector<f64>) -> Result<(f64, DVector<f64>), KinoptError> {
    for _ in 0..50 {
        let alpha = 0.5 * (alpha_lo + alpha_hi);
        let x_alpha = x + alpha * p;
        let (f_alpha, g_alpha) = evaluate(&x_alpha)?;
        let dphi_alpha = g_alpha.dot(p);

        if f_alpha > f_0 + WOLFE_C1 * alpha * dphi_0 || f_alpha >= f_lo {
            alpha_hi = alpha;
        } else {
            if dphi_alpha.abs() <= -WOLFE_C2 * dphi_0 {
                return Ok(Some((alpha, f_alpha, g_alpha)));
            }
            if dphi_alpha * (alpha_hi - alpha_lo) >= 0.0 {
                alpha_hi = alpha_lo;
            }
            alpha_lo = alpha;
            f_lo = f_alpha;
        }

        if (alpha_hi - alpha_lo).abs() < 1e-12 {
            // Interval collapsed; accept the point if it at least made progress.
            return if f_alpha <= f_0 + WOLFE_C1 * alpha * dphi_0 {
                Ok(Some((alpha, f_alpha, g_alpha)))
            } else {
                Ok(None)
            }
        }
    }

    Ok(None)
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// The PANOC/ALM solver from `optimization_engine`.  Unconstrained problems (modulo
/// bounds) go through PANOC directly; problems with constraint functions go through the
/// augmented Lagrangian wrapper.
#[derive(Clone)]
pub struct OpEnNonlinearOptimizer {
    cost_function: Box<dyn ObjectiveFunction>,
    constraint_function: Option<WeightedSumObjective>,
    problem_size: usize,
    bounds: (Vec<f64>, Vec<f64>),
    derivative_mode: DerivativeMode
}
impl OpEnNonlinearOptimizer {
    pub fn new<F: ObjectiveFunction + Clone + 'static>(cost: F, problem_size: usize) -> Self {
        let mut lower_bounds = vec![];
        let mut upper_bounds = vec![];
        for _ in 0..problem_size { lower_bounds.push(-f64::INFINITY); upper_bounds.push(f64::INFINITY); }
        Self {
            cost_function: Box::new(cost),
            constraint_function: None,
            problem_size,
            bounds: (lower_bounds, upper_bounds),
            derivative_mode: DerivativeMode::Analytical
        }
    }
    pub fn set_derivative_mode(&mut self, derivative_mode: DerivativeMode) {
        self.derivative_mode = derivative_mode;
    }
    pub fn add_equality_constraint<F: ObjectiveFunction + Clone + 'static>(&mut self, f: F) {
        if self.constraint_function.is_none() {
            self.constraint_function = Some(WeightedSumObjective::new());
        }

        self.constraint_function.as_mut().unwrap().add_function(f, None);
    }
    pub fn add_less_than_zero_inequality_constraint<F: ObjectiveFunction + Clone + 'static>(&mut self, f: F) {
        if self.constraint_function.is_none() {
            self.constraint_function = Some(WeightedSumObjective::new());
        }

        let wrapped_f = MaxZeroCompositionObjective::new(f);

        self.constraint_function.as_mut().unwrap().add_function(wrapped_f, None);
    }
    pub fn set_bounds(&mut self, bounds: Vec<(f64, f64)>) {
        assert_eq!(self.problem_size, bounds.len());
        let mut lower_bounds = vec![];
        let mut upper_bounds = vec![];
        for b in bounds {
            lower_bounds.push(b.0);
            upper_bounds.push(b.1);
        }
        self.bounds = (lower_bounds, upper_bounds);
    }
    pub fn optimize(&mut self, init_condition: &DVector<f64>, parameters: &OptimizerParameters, observer: &mut dyn ConfigurationObserver) -> Result<OptimizationResult, KinoptError> {
        KinoptError::new_check_for_dimension_mismatch_error(init_condition.len(), self.problem_size, "OpEnNonlinearOptimizer::optimize", file!(), line!())?;
        return match self.constraint_function {
            None => { self.optimize_panoc(init_condition, parameters, observer) }
            Some(_) => { self.optimize_alm(init_condition, parameters, observer) }
        }
    }
    fn optimize_panoc(&mut self, init_condition: &DVector<f64>, parameters: &OptimizerParameters, observer: &mut dyn ConfigurationObserver) -> Result<OptimizationResult, KinoptError> {
        let start = instant::Instant::now();
        let mut panoc_cache = PANOCCache::new(self.problem_size, 1e-5, 3);

        let observer_mutex = Mutex::new(observer);

        let df = |u: &[f64], grad: &mut [f64]| -> Result<(), SolverError> {
            let input = DVector::from_column_slice(u);
            let res = self.cost_function.derivative(&input, Some(self.derivative_mode.clone())).expect("error");
            for (i, v) in res.iter().enumerate() {
                grad[i] = *v;
            }
            Ok(())
        };
        let f = |u: &[f64], cost: &mut f64| -> Result<(), SolverError> {
            let input = DVector::from_column_slice(u);
            let val = self.cost_function.call(&input).expect("error");
            *cost = val;
            let mut observer = observer_mutex.lock().unwrap();
            observer.observe(&input, val);
            Ok(())
        };

        let bounds = constraints::Rectangle::new(Some(&self.bounds.0), Some(&self.bounds.1));

        let problem = Problem::new(&bounds, df, f);

        let mut panoc = PANOCOptimizer::new(problem, &mut panoc_cache);
        if let Some(a) = &parameters.max_time { panoc = panoc.with_max_duration(a.clone()); }
        if let Some(a) = &parameters.max_iterations { panoc = panoc.with_max_iter(a.clone()); }

        let mut u = init_condition.iter().cloned().collect::<Vec<f64>>();
        let solve_result = panoc.solve(&mut u);

        return match solve_result {
            Ok(status) => {
                Ok(OptimizationResult {
                    x_min: DVector::from_vec(u),
                    solve_status: map_exit_status(status.exit_status()),
                    cost: status.cost_value(),
                    num_inner_iterations: status.iterations(),
                    num_outer_iterations: 0,
                    solve_time: status.solve_time()
                })
            }
            Err(e) => { Ok(self.degraded_result_from_solver_error(e, u, start.elapsed())) }
        }
    }
    fn optimize_alm(&mut self, init_condition: &DVector<f64>, parameters: &OptimizerParameters, observer: &mut dyn ConfigurationObserver) -> Result<OptimizationResult, KinoptError> {
        let start = instant::Instant::now();
        let panoc_cache = PANOCCache::new(self.problem_size, 1e-5, 3);
        let mut alm_cache = AlmCache::new(panoc_cache, 0, 1);

        let observer_mutex = Mutex::new(observer);

        let bounds = constraints::Rectangle::new(Some(&self.bounds.0), Some(&self.bounds.1));

        let df = |u: &[f64], grad: &mut [f64]| -> Result<(), SolverError> {
            let input = DVector::from_column_slice(u);
            let res = self.cost_function.derivative(&input, Some(self.derivative_mode.clone())).expect("error");
            for (i, v) in res.iter().enumerate() {
                grad[i] = *v;
            }
            Ok(())
        };
        let f = |u: &[f64], cost: &mut f64| -> Result<(), SolverError> {
            let input = DVector::from_column_slice(u);
            let val = self.cost_function.call(&input).expect("error");
            *cost = val;
            let mut observer = observer_mutex.lock().unwrap();
            observer.observe(&input, val);
            Ok(())
        };
        let f2 = |u: &[f64], f2u: &mut [f64]| -> Result<(), SolverError> {
            if let Some(constraint_function) = &self.constraint_function {
                let input = DVector::from_column_slice(u);
                let val = constraint_function.call(&input).expect("error");
                f2u[0] = val;
            }
            Ok(())
        };
        let f2_jacobian_product = |u: &[f64], d: &[f64], res: &mut [f64]| -> Result<(), SolverError> {
            if let Some(constraint_function) = &self.constraint_function {
                let input = DVector::from_column_slice(u);
                let gradient = constraint_function.derivative(&input, None).expect("error");
                for (i, v) in gradient.iter().enumerate() {
                    res[i] = *v * d[0];
                }
            }
            Ok(())
        };

        let factory = AlmFactory::new(
            f,
            df,
            NO_MAPPING,
            NO_JACOBIAN_MAPPING,
            Some(f2),
            Some(f2_jacobian_product),
            NO_SET,
            1,
        );

        let alm_problem = AlmProblem::new(
            bounds,
            NO_SET,
            NO_SET,
            |u: &[f64], xi: &[f64], cost: &mut f64| -> Result<(), SolverError> {
                factory.psi(u, xi, cost)
            },
            |u: &[f64], xi: &[f64], grad: &mut [f64]| -> Result<(), SolverError> {
                factory.d_psi(u, xi, grad)
            },
            NO_MAPPING,
            Some(f2),
            0,
            1
        );

        let mut alm_optimizer = AlmOptimizer::new(&mut alm_cache, alm_problem);
        if let Some(a) = &parameters.max_time { alm_optimizer = alm_optimizer.with_max_duration(a.clone()); }
        if let Some(a) = &parameters.max_iterations { alm_optimizer = alm_optimizer.with_max_inner_iterations(a.clone()); }
        if let Some(a) = &parameters.max_outer_iterations { alm_optimizer = alm_optimizer.with_max_outer_iterations(a.clone()); }

        let mut u = init_condition.iter().cloned().collect::<Vec<f64>>();
        let solve_result = alm_optimizer.solve(&mut u);

        return match solve_result {
            Ok(r) => {
                Ok(OptimizationResult {
                    x_min: DVector::from_vec(u),
                    solve_status: map_exit_status(r.exit_status()),
                    cost: r.cost(),
                    num_inner_iterations: r.num_inner_iterations(),
                    num_outer_iterations: r.num_outer_iterations(),
                    solve_time: r.solve_time()
                })
            }
            Err(e) => { Ok(self.degraded_result_from_solver_error(e, u, start.elapsed())) }
        }
    }
    /// The solver raised instead of returning a status.  Degrade to the last iterate it
    /// left in the working vector, which carries no optimality guarantee, and say so.
    fn degraded_result_from_solver_error(&self, e: SolverError, u: Vec<f64>, solve_time: Duration) -> OptimizationResult {
        console_print(&format!("OpEn solver failed with {:?}.  Falling back to its last internal iterate; this value carries no feasibility or optimality guarantee.", e), PrintMode::Println, PrintColor::Yellow, true);
        let x_min = DVector::from_vec(u);
        let cost = self.cost_function.call(&x_min).unwrap_or(f64::NAN);
        OptimizationResult {
            x_min,
            solve_status: SolveStatus::Degraded,
            cost,
            num_inner_iterations: 0,
            num_outer_iterations: 0,
            solve_time
        }
    }
}

fn map_exit_status(exit_status: ExitStatus) -> SolveStatus {
    match exit_status {
        ExitStatus::Converged => { SolveStatus::Converged }
        ExitStatus::NotConvergedIterations | ExitStatus::NotConvergedOutOfTime => {
            console_print("OpEn solver stopped on its iteration/time cap before converging.  Returning last iterate as a degraded result.", PrintMode::Println, PrintColor::Yellow, true);
            SolveStatus::Degraded
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////

/// Whether a solve actually converged, or stopped early and handed back its last iterate.
/// Callers that care about solution quality must branch on this rather than trusting
/// `x_min` unconditionally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    Converged,
    Degraded
}

#[derive(Clone, Debug)]
pub struct OptimizationResult {
    x_min: DVector<f64>,
    solve_status: SolveStatus,
    cost: f64,
    num_inner_iterations: usize,
    num_outer_iterations: usize,
    solve_time: Duration
}
impl OptimizationResult {
    pub fn x_min(&self) -> &DVector<f64> {
        &self.x_min
    }
    pub fn solve_status(&self) -> &SolveStatus {
        &self.solve_status
    }
    pub fn cost(&self) -> f64 {
        self.cost
    }
    pub fn num_inner_iterations(&self) -> usize {
        self.num_inner_iterations
    }
    pub fn num_outer_iterations(&self) -> usize {
        self.num_outer_iterations
    }
    pub fn solve_time(&self) -> Duration {
        self.solve_time
    }
}

#[derive(Clone, Debug)]
pub struct OptimizerParameters {
    max_time: Option<Duration>,
    max_iterations: Option<usize>,
    max_outer_iterations: Option<usize>,
    gradient_tolerance: f64
}
impl OptimizerParameters {
    pub fn new_empty() -> Self {
        Self::default()
    }
    pub fn set_max_time(&mut self, max_time: Duration) {
        self.max_time = Some(max_time);
    }
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = Some(max_iterations);
    }
    pub fn set_max_outer_iterations(&mut self, max_outer_iterations: usize) {
        self.max_outer_iterations = Some(max_outer_iterations)
    }
    pub fn set_gradient_tolerance(&mut self, gradient_tolerance: f64) {
        self.gradient_tolerance = gradient_tolerance;
    }
}
impl Default for OptimizerParameters {
    fn default() -> Self {
        Self {
            max_time: None,
            max_iterations: None,
            max_outer_iterations: None,
            gradient_tolerance: 1e-8
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualization::{NullObserver, RecordingObserver};

    /// f(x) = sum (x_i - target_i)^2, an easy convex bowl.
    #[derive(Clone)]
    struct QuadraticBowl {
        target: DVector<f64>
    }
    impl ObjectiveFunction for QuadraticBowl {
        fn call(&self, x: &DVector<f64>) -> Result<f64, KinoptError> {
            Ok((x - &self.target).norm_squared())
        }
        fn derivative_analytical(&self, x: &DVector<f64>) -> Result<Option<DVector<f64>>, KinoptError> {
            Ok(Some(2.0 * (x - &self.target)))
        }
    }

    /// The Rosenbrock function in two dimensions, no analytical gradient supplied.
    #[derive(Clone)]
    struct Rosenbrock;
    impl ObjectiveFunction for Rosenbrock {
        fn call(&self, x: &DVector<f64>) -> Result<f64, KinoptError> {
            let a = 1.0;
            let b = 100.0;
            Ok((a - x[0]).powi(2) + b * (x[1] - x[0].powi(2)).powi(2))
        }
    }

    #[test]
    fn bfgs_minimizes_quadratic() {
        let target = DVector::from_vec(vec![1.0, -2.0, 0.5]);
        let mut n = NonlinearOptimizer::new(QuadraticBowl { target: target.clone() }, 3, NonlinearOptimizerType::Bfgs);
        let res = n.optimize(&DVector::zeros(3), &OptimizerParameters::default(), &mut NullObserver).expect("error");
        assert_eq!(*res.solve_status(), SolveStatus::Converged);
        assert!((res.x_min() - target).norm() < 1e-4);
    }

    #[test]
    fn bfgs_minimizes_rosenbrock_with_finite_differences() {
        let mut n = NonlinearOptimizer::new(Rosenbrock, 2, NonlinearOptimizerType::Bfgs);
        let mut parameters = OptimizerParameters::default();
        parameters.set_max_iterations(500);
        parameters.set_gradient_tolerance(1e-6);
        let res = n.optimize(&DVector::from_vec(vec![-1.2, 1.0]), &parameters, &mut NullObserver).expect("error");
        assert!((res.x_min()[0] - 1.0).abs() < 1e-2);
        assert!((res.x_min()[1] - 1.0).abs() < 1e-2);
    }

    #[test]
    fn open_minimizes_quadratic_with_analytical_gradient() {
        let target = DVector::from_vec(vec![0.3, 0.7]);
        let mut n = NonlinearOptimizer::new(QuadraticBowl { target: target.clone() }, 2, NonlinearOptimizerType::OpEn);
        let res = n.optimize(&DVector::zeros(2), &OptimizerParameters::default(), &mut NullObserver).expect("error");
        assert_eq!(*res.solve_status(), SolveStatus::Converged);
        assert!((res.x_min() - target).norm() < 1e-3);
    }

    #[test]
    fn open_respects_bounds() {
        let target = DVector::from_vec(vec![2.0, 2.0]);
        let mut n = NonlinearOptimizer::new(QuadraticBowl { target }, 2, NonlinearOptimizerType::OpEn);
        n.set_bounds(vec![(-1.0, 1.0), (-1.0, 1.0)]);
        let res = n.optimize(&DVector::zeros(2), &OptimizerParameters::default(), &mut NullObserver).expect("error");
        assert!(res.x_min()[0] <= 1.0 + 1e-6);
        assert!(res.x_min()[1] <= 1.0 + 1e-6);
    }

    #[test]
    fn observer_sees_candidates() {
        let target = DVector::from_vec(vec![1.0, 1.0]);
        let mut n = NonlinearOptimizer::new(QuadraticBowl { target }, 2, NonlinearOptimizerType::Bfgs);
        let mut observer = RecordingObserver::new();
        n.optimize(&DVector::zeros(2), &OptimizerParameters::default(), &mut observer).expect("error");
        assert!(!observer.is_empty());
        for (q, _) in observer.records() {
            assert_eq!(q.len(), 2);
        }
    }

    #[test]
    fn starved_iteration_budget_reports_degraded() {
        let mut n = NonlinearOptimizer::new(Rosenbrock, 2, NonlinearOptimizerType::Bfgs);
        let mut parameters = OptimizerParameters::default();
        parameters.set_max_iterations(1);
        let res = n.optimize(&DVector::from_vec(vec![-1.2, 1.0]), &parameters, &mut NullObserver).expect("error");
        assert_eq!(*res.solve_status(), SolveStatus::Degraded);
    }

    #[test]
    fn wrong_dimension_initial_condition_is_an_error() {
        let target = DVector::from_vec(vec![0.0, 0.0]);
        let mut n = NonlinearOptimizer::new(QuadraticBowl { target }, 2, NonlinearOptimizerType::Bfgs);
        assert!(n.optimize(&DVector::zeros(5), &OptimizerParameters::default(), &mut NullObserver).is_err());
    }
}
