//! Library side of the `mml` command: document loading, parameter
//! overrides and change files, and logging setup.

pub mod commands;
pub mod logging;
