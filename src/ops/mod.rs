pub mod autograd_log_sigmoid;

pub use autograd_log_sigmoid::{log_sigmoid, var_log_sigmoid};
