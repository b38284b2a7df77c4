pub mod utils_console;
pub mod utils_errors;
pub mod utils_se3;
