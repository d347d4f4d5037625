/// Error code registry
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 3000-3999: Local filesystem errors
/// - 4000-4999: Execution errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;
    pub const CONFIG_PARSE_ERROR: u16 = 1007;

    // Local filesystem errors (3000-3999)
    pub const FS_IO_ERROR: u16 = 3001;

    // Execution errors (4000-4999)
    pub const EXEC_COMMAND_NOT_FOUND: u16 = 4001;
    pub const EXEC_SUBPROCESS_FAILED: u16 = 4003;
    pub const EXEC_SPAWN_FAILED: u16 = 4007;
    pub const EXEC_INVALID_COMMAND_LINE: u16 = 4011;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1005 => "Invalid value in configuration",
        1007 => "Failed to parse configuration",

        3001 => "Local filesystem I/O error",

        4001 => "Command not found",
        4003 => "Command exited with a non-zero exit code",
        4007 => "Failed to spawn process",
        4011 => "Command line could not be parsed",

        _ => "Unknown error",
    }
}
