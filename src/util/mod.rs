//! Test support utilities

pub mod testing;
