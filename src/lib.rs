// Library exports for the headless upload core and its test harness.

pub mod config;
pub mod media_storage;
pub mod upload;

// Test support (only available with test-utils feature)
#[cfg(feature = "test-utils")]
pub mod test_support;
