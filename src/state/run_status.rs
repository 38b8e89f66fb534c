/// Run status definitions for the control surface
///
/// A control layer moves through these states as it starts and finishes a crawl.
use serde::Serialize;
use std::fmt;

/// Represents the lifecycle of the most recent crawl started by a control layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum RunStatus {
    /// No crawl has been started yet
    #[default]
    Idle,

    /// A crawl is in progress
    Running,

    /// The last crawl finished (quota met or content exhausted)
    Completed,
}

impl RunStatus {
    /// Returns true while a crawl is in flight
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns the label shown to status pollers
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Completed => "Completed",
        }
    }

    /// Checks if a transition from this state to another is valid
    ///
    /// # Valid Transitions
    ///
    /// - Idle → Running
    /// - Running → Completed
    /// - Completed → Running (a new crawl is launched)
    pub fn can_transition_to(&self, target: RunStatus) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Completed, Self::Running)
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
