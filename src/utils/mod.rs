//! Utility modules

pub mod format;
pub mod logging;
pub mod paths;
pub mod time;
