//! CLI layer for gopher-client.
//!
//! Provides the `gopher` command-line interface using clap, with commands
//! for submitting and inspecting jobs, the immediate endpoints, and the
//! sentiment agent.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
#[cfg(feature = "agent")]
pub use parser::{AgentCommands, AgentOptions};
pub use parser::{
    Cli, Commands, JobCommands, LinkedinCommands, RedditCommands, TiktokCommands, TwitterCommands,
    WebCommands,
};
