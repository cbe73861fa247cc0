pub mod detail;
pub mod listing;
pub mod report;
pub mod scorer;
pub mod scout;
pub mod sources;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
