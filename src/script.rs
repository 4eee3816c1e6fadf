//! Schema script language
//!
//! Scripts describe schema elements as builder chains on a bound variable
//! (conventionally `schema`). The parser turns text into statements; the runner
//! evaluates them through a [`crate::client::SchemaHandle`].

pub mod parser;
pub mod runner;

pub use parser::{parse, Arg, Call, Statement};
pub use runner::{ExecutionReport, ScriptRunner};
