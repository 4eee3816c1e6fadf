//! Integration tests for the graph schema loader

mod cli_binary;
mod interrupt;
mod loader_lifecycle;
mod script_execution;
mod test_utils;
