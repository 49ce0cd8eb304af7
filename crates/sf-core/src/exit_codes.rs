//! Process exit codes for the sf-core binary.

/// Exit codes for sf-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Input stream ended normally
    Clean = 0,

    /// Configuration could not be resolved or is invalid
    ConfigError = 10,

    /// Reading input or writing output failed
    IoError = 13,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
