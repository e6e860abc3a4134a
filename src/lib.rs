pub mod build;
pub mod cli;
pub mod command;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod ui;
pub mod workflow;

pub use error::{GitFlowError, Result};
