//! Service and admin surface for phonemap: the `phonemap` command line, the
//! lookup/status HTTP API and logging setup.

pub mod cli;
pub mod exit_codes;
pub mod http;
pub mod logging;
