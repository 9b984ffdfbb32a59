//! Command implementations that sit outside the desk workflow.

pub mod init;
