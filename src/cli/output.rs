//! CLI output: error mapping and exit status.

use crate::error::LoadError;
use std::error::Error;

/// Exit status of a run that completed without error
pub const EXIT_SUCCESS: i32 = 0;

/// Exit status of a failed run or a startup failure
pub const EXIT_FAILURE: i32 = 1;

/// Render an error with its cause chain, one cause per line.
pub fn map_error(e: &LoadError) -> String {
    let mut message = format!("Error: {}", e);
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }
    message
}

pub fn exit_code(success: bool) -> i32 {
    if success {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}
