// Test utilities shared by the unit test modules
pub mod utils;
