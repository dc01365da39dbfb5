//! Process exit codes for the `phonemap` binary.

pub const SUCCESS: i32 = 0;
pub const FAILED: i32 = 1; // scan cycle failed, or a lookup found nothing
pub const CONFIG_ERROR: i32 = 2; // bad configuration or setup failure
