/// How a tool's output streams feed the line stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// stdout and stderr both feed the line stream; stderr is also
    /// retained verbatim for the exit report.
    Combined,

    /// Only stdout feeds the line stream; stderr is retained for the
    /// exit report.
    Split,
}

/// An external tool invocation, described before anything is spawned.
///
/// The program is a bare name (`ffmpeg`, `yt-dlp`); the runner resolves
/// it to a path at start time.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub capture: CaptureMode,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, capture: CaptureMode) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            capture,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_argument_order() {
        let command = ToolCommand::new("ffmpeg", CaptureMode::Combined)
            .arg("-i")
            .arg("input.mkv")
            .args(["-threads", "0"]);

        assert_eq!(command.program, "ffmpeg");
        assert_eq!(command.args, vec!["-i", "input.mkv", "-threads", "0"]);
    }
}
