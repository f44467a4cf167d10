//! CLI subcommand implementations.

pub mod available;
pub mod enter;
pub mod exit;
pub mod fines;
pub mod init;
pub mod payments;
pub mod policy;
pub mod stats;
pub mod util;
pub mod vehicles;
