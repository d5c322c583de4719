//! Chat commands: exact-match bodies that control the label job.


use crate::gateway::job::JobController;

/// Reply to `life-check`.
pub const LIVENESS_REPLY: &str = "Bot is alive and running.";

/// Known chat commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    LifeCheck,
    StartJob,
    StopJob,
}

impl Command {
    /// Parse a command from a message body. Matching is exact and
    /// case-sensitive; anything else is `None` and gets no reply.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "life-check" => Some(Self::LifeCheck),
            "start-cron-job" => Some(Self::StartJob),
            "stop-cron-job" => Some(Self::StopJob),
            _ => None,
        }
    }
}

/// Handle a command and return the response text.
pub async fn handle(cmd: Command, jobs: &JobController) -> String {
    match cmd {
        Command::LifeCheck => LIVENESS_REPLY.to_string(),
        Command::StartJob => jobs.start().await.message().to_string(),
        Command::StopJob => jobs.stop().await.message().to_string(),
    }
}
