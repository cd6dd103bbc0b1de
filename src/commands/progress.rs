//! Chain state and progress report rendering.
//!
//! A [`ChainState`] holds one [`StepRecord`] per sub-command. Every step walks
//! the same state machine:
//!
//! ```text
//! Waiting ──► Running ──► Success
//!                    ├──► Warning
//!                    ├──► Error
//!                    └──► Skipped
//! ```
//!
//! Terminal statuses are never left, and no step reaches a terminal status
//! without passing through `Running`.

use thiserror::Error;

/// Title of the progress report.
pub const PROGRESS_TITLE: &str = "Progress";

/// Status of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStatus {
    Waiting,
    Running,
    Success,
    Warning,
    Error,
    /// Empty line in the chain, nothing was executed
    Skipped,
}

impl StepStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepStatus::Success | StepStatus::Warning | StepStatus::Error | StepStatus::Skipped
        )
    }

    /// Icon displayed in front of the step line.
    pub fn icon(self) -> &'static str {
        match self {
            StepStatus::Waiting => "⏹️",
            StepStatus::Running => "▶️",
            StepStatus::Success => "✅",
            StepStatus::Warning => "⚠️",
            StepStatus::Error => "🔴",
            StepStatus::Skipped => "⏭️",
        }
    }
}

/// Rejected status change.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("step {index} cannot go from {from:?} to {to:?}")]
pub struct TransitionError {
    pub index: usize,
    pub from: StepStatus,
    pub to: StepStatus,
}

/// Execution record of one sub-command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    /// Sub-command text exactly as typed
    pub raw_text: String,
    pub status: StepStatus,
    /// Outcome message, `None` until the step resolves
    pub detail: Option<String>,
}

/// Progress of one chain of sub-commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainState {
    steps: Vec<StepRecord>,
}

impl ChainState {
    /// Creates a chain with every step waiting.
    pub fn new(commands: &[String]) -> Self {
        let steps = commands
            .iter()
            .map(|raw_text| StepRecord {
                raw_text: raw_text.clone(),
                status: StepStatus::Waiting,
                detail: None,
            })
            .collect();

        ChainState { steps }
    }

    #[cfg(test)]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_multi_step(&self) -> bool {
        self.steps.len() > 1
    }

    /// Moves step `index` from `Waiting` to `Running`.
    pub fn start(&mut self, index: usize) -> Result<(), TransitionError> {
        self.transition(index, StepStatus::Running, None)
    }

    /// Moves step `index` from `Running` to the terminal `status`.
    pub fn finish(
        &mut self,
        index: usize,
        status: StepStatus,
        detail: String,
    ) -> Result<(), TransitionError> {
        self.transition(index, status, Some(detail))
    }

    /// Returns whether every step reached a terminal status.
    #[cfg(test)]
    pub fn is_resolved(&self) -> bool {
        self.steps.iter().all(|step| step.status.is_terminal())
    }

    fn transition(
        &mut self,
        index: usize,
        to: StepStatus,
        detail: Option<String>,
    ) -> Result<(), TransitionError> {
        let Some(step) = self.steps.get_mut(index) else {
            return Err(TransitionError {
                index,
                from: StepStatus::Waiting,
                to,
            });
        };

        let allowed = match (step.status, to) {
            (StepStatus::Waiting, StepStatus::Running) => true,
            (StepStatus::Running, to) => to.is_terminal(),
            _ => false,
        };
        if !allowed {
            return Err(TransitionError {
                index,
                from: step.status,
                to,
            });
        }

        step.status = to;
        if detail.is_some() {
            step.detail = detail;
        }
        Ok(())
    }

    /// Renders the progress report as Markdown.
    ///
    /// One line per step: status icon, the command text, and its detail.
    pub fn render(&self) -> String {
        let lines = self
            .steps
            .iter()
            .map(|step| {
                format!(
                    "{} `{}` -> {}",
                    step.status.icon(),
                    step.raw_text,
                    step.detail.as_deref().unwrap_or("…")
                )
            })
            .collect::<Vec<String>>()
            .join("\n");

        format!("**{}**\n\n{}", PROGRESS_TITLE, lines)
    }
}
