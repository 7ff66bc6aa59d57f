mod command;
mod process;
mod runner;

pub use command::{CaptureMode, ToolCommand};
pub use process::{ToolExit, ToolProcess};
pub use runner::{RunnerError, SystemRunner, ToolRunner};
