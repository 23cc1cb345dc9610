pub mod constants;
pub mod eclipse;
pub mod gravity;
pub mod integration;
mod linalg;
pub mod nbody;
pub mod newton;
pub mod syzygy_errors;
