use nalgebra::{Matrix3, Unit, UnitQuaternion, Vector3, Vector6};
use serde::{Serialize, Deserialize};

/// A representation for an SE(3) transform as a unit quaternion paired with a translation
/// vector.  All kinematics and error computations in the crate go through this type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Se3Pose {
    rotation: UnitQuaternion<f64>,
    translation: Vector3<f64>
}
impl Se3Pose {
    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self { rotation, translation }
    }
    pub fn new_identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }
    pub fn new_from_euler_angles(rx: f64, ry: f64, rz: f64, x: f64, y: f64, z: f64) -> Self {
        let r = UnitQuaternion::from_euler_angles(rx, ry, rz);
        let t = Vector3::new(x, y, z);
        return Self::new(r, t);
    }
    pub fn new_from_axis_angle(axis: &Unit<Vector3<f64>>, angle: f64, x: f64, y: f64, z: f64) -> Self {
        let r = UnitQuaternion::from_axis_angle(axis, angle);
        let t = Vector3::new(x, y, z);
        return Self::new(r, t);
    }
    ////////////////////////////////////////////////////////////////////////////////////////////////
    /// Returns a reference to the rotation component of the pose.
    pub fn rotation(&self) -> &UnitQuaternion<f64> { &self.rotation }
    /// Returns a reference to the translation component of the pose.
    pub fn translation(&self) -> &Vector3<f64> {
        &self.translation
    }
    ////////////////////////////////////////////////////////////////////////////////////////////////
    pub fn multiply(&self, other: &Se3Pose) -> Se3Pose {
        let out_rot = self.rotation * other.rotation;
        let out_translation = self.rotation * other.translation + self.translation;
        return Se3Pose::new(out_rot, out_translation);
    }
    pub fn multiply_by_point(&self, point: &Vector3<f64>) -> Vector3<f64> {
        return self.rotation * point + self.translation;
    }
    /// The inverse transform such that T * T^-1 = I.
    pub fn inverse(&self) -> Se3Pose {
        let new_quat = self.rotation.inverse();
        let new_translation = new_quat * -self.translation;
        return Se3Pose::new(new_quat, new_translation);
    }
    /// The displacement transform such that T_self * T_disp = T_other.
    pub fn displacement(&self, other: &Se3Pose) -> Se3Pose {
        return self.inverse().multiply(other);
    }
    /// The displacement between two poses split into a world-frame translation difference
    /// and the logarithm of the relative rotation.
    pub fn displacement_separate_rotation_and_translation(&self, other: &Se3Pose) -> (Vector3<f64>, Vector3<f64>) {
        let disp_translation = other.translation - self.translation;
        let disp_rotation_ln = (self.rotation.inverse() * other.rotation).scaled_axis();
        return (disp_translation, disp_rotation_ln);
    }
    /// The decoupled tangent-space displacement between two poses as a 6-vector
    /// (3 translational components followed by 3 rotational components).  Zero exactly
    /// when the two poses coincide.
    pub fn displacement_separate_ln(&self, other: &Se3Pose) -> Vector6<f64> {
        let (t, w) = self.displacement_separate_rotation_and_translation(other);
        return Vector6::new(t[0], t[1], t[2], w[0], w[1], w[2]);
    }
    /// The SE(3) logarithm of the pose as a 6-vector (3 translational components followed
    /// by 3 rotational components).  Inverse of `Se3Pose::exp`.
    pub fn ln(&self) -> Vector6<f64> {
        let w = self.rotation.scaled_axis();
        let v_inv = se3_v_matrix_inverse(&w);
        let v = v_inv * self.translation;
        return Vector6::new(v[0], v[1], v[2], w[0], w[1], w[2]);
    }
    /// Exponentiates a 6-vector in the tangent space at the identity back onto SE(3).
    pub fn exp(ln_vec: &Vector6<f64>) -> Se3Pose {
        let v = Vector3::new(ln_vec[0], ln_vec[1], ln_vec[2]);
        let w = Vector3::new(ln_vec[3], ln_vec[4], ln_vec[5]);
        let rotation = UnitQuaternion::from_scaled_axis(w);
        let translation = se3_v_matrix(&w) * v;
        return Se3Pose::new(rotation, translation);
    }
    /// Provides an approximate distance between two poses.  This is not an official
    /// distance metric, but should still work in some optimization procedures.
    pub fn approximate_distance(&self, other: &Se3Pose) -> f64 {
        let angle_between = self.rotation.angle_to(&other.rotation);
        let translation_between = (self.translation - other.translation).norm();
        return angle_between + translation_between;
    }
    /// Returns a euler angle and vector representation of the SE(3) pose.
    pub fn to_euler_angles_and_translation(&self) -> (Vector3<f64>, Vector3<f64>) {
        let euler_angles = self.rotation.euler_angles();
        return (Vector3::new(euler_angles.0, euler_angles.1, euler_angles.2), self.translation.clone());
    }
    /// Returns an axis angle and translation representation of the SE(3) pose.
    pub fn to_axis_angle_and_translation(&self) -> (Vector3<f64>, f64, Vector3<f64>) {
        let (axis, angle) = match self.rotation.axis_angle() {
            None => { (Vector3::new(0., 0., 0.), 0.0) }
            Some(axis_angle) => { (Vector3::new(axis_angle.0[0], axis_angle.0[1], axis_angle.0[2]), axis_angle.1) }
        };
        return (axis, angle, self.translation.clone());
    }
}

/// The skew-symmetric (hat) matrix of a 3-vector.
pub fn skew_symmetric_matrix(w: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -w[2], w[1],
                 w[2], 0.0, -w[0],
                 -w[1], w[0], 0.0)
}

/// The V matrix from the closed-form SE(3) exponential, such that the translation of
/// exp([v, w]) is V(w) * v.
fn se3_v_matrix(w: &Vector3<f64>) -> Matrix3<f64> {
    let theta = w.norm();
    let w_hat = skew_symmetric_matrix(w);
    if theta < 1e-8 {
        return Matrix3::identity() + 0.5 * w_hat + (1.0 / 6.0) * (w_hat * w_hat);
    }
    let a = (1.0 - theta.cos()) / (theta * theta);
    let b = (theta - theta.sin()) / (theta * theta * theta);
    return Matrix3::identity() + a * w_hat + b * (w_hat * w_hat);
}

/// The inverse of the V matrix, used by the SE(3) logarithm.
fn se3_v_matrix_inverse(w: &Vector3<f64>) -> Matrix3<f64> {
    let theta = w.norm();
    let w_hat = skew_symmetric_matrix(w);
    if theta < 1e-8 {
        return Matrix3::identity() - 0.5 * w_hat + (1.0 / 12.0) * (w_hat * w_hat);
    }
    let half_theta = 0.5 * theta;
    let c = (1.0 - (half_theta * half_theta.cos() / half_theta.sin())) / (theta * theta);
    return Matrix3::identity() - 0.5 * w_hat + c * (w_hat * w_hat);
}
