/// A common error type returned by functions throughout the crate.
#[derive(Clone, Debug)]
pub enum KinoptError {
    GenericError(String),
    IdxOutOfBoundError(String),
    NameNotFoundError(String),
    DimensionMismatchError(String)
}
impl KinoptError {
    pub fn new_generic_error_str(s: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: {} -- File: {}, Line: {}", s, file, line);
        return Self::GenericError(s);
    }
    pub fn new_idx_out_of_bound_error(given_idx: usize, length_of_array: usize, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Index {:?} is too large for the array of length {:?} -- File: {}, Line: {}", given_idx, length_of_array, file, line);
        return Self::IdxOutOfBoundError(s);
    }
    pub fn new_name_not_found_error(name: &str, context: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Name {:?} was not found in {} -- File: {}, Line: {}", name, context, file, line);
        return Self::NameNotFoundError(s);
    }
    pub fn new_dimension_mismatch_error(given_dim: usize, expected_dim: usize, context: &str, file: &str, line: u32) -> Self {
        let s = format!("ERROR: Dimension {:?} does not match the expected dimension {:?} in {} -- File: {}, Line: {}", given_dim, expected_dim, context, file, line);
        return Self::DimensionMismatchError(s);
    }
    pub fn new_check_for_idx_out_of_bound_error(given_idx: usize, length_of_array: usize, file: &str, line: u32) -> Result<(), KinoptError> {
        return if given_idx >= length_of_array {
            Err(Self::new_idx_out_of_bound_error(given_idx, length_of_array, file, line))
        } else {
            Ok(())
        }
    }
    pub fn new_check_for_dimension_mismatch_error(given_dim: usize, expected_dim: usize, context: &str, file: &str, line: u32) -> Result<(), KinoptError> {
        return if given_dim != expected_dim {
            Err(Self::new_dimension_mismatch_error(given_dim, expected_dim, context, file, line))
        } else {
            Ok(())
        }
    }
}
