//! Pipeline step types
//!
//! The job runner executes five fixed steps and reports progress as a
//! 1-based step counter (`0` before the first step starts).

use serde::{Deserialize, Serialize};

use crate::domain::job::JobStatus;

/// One of the five steps the job runner executes, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    MailCheck,
    LoadReference,
    ExtractText,
    AiAnalysis,
    CreateTicket,
}

impl PipelineStep {
    pub const COUNT: u8 = 5;

    pub const ALL: [PipelineStep; 5] = [
        Self::MailCheck,
        Self::LoadReference,
        Self::ExtractText,
        Self::AiAnalysis,
        Self::CreateTicket,
    ];

    /// 1-based position as reported in `current_step`
    pub fn number(self) -> u8 {
        match self {
            Self::MailCheck => 1,
            Self::LoadReference => 2,
            Self::ExtractText => 3,
            Self::AiAnalysis => 4,
            Self::CreateTicket => 5,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::MailCheck => "Gmail Check",
            Self::LoadReference => "Load Reference",
            Self::ExtractText => "Extract Text",
            Self::AiAnalysis => "AI Analysis",
            Self::CreateTicket => "Create JIRA",
        }
    }
}

/// Display state of a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Pending,
    Running,
    Completed,
    Error,
}

impl StepState {
    /// Derives a step's state from the job status and step counter
    ///
    /// On `error` the step the counter points at is the one that failed.
    pub fn derive(status: JobStatus, current_step: u8, step: PipelineStep) -> Self {
        let number = step.number();

        if status == JobStatus::Error {
            return match number.cmp(&current_step) {
                std::cmp::Ordering::Less => Self::Completed,
                std::cmp::Ordering::Equal => Self::Error,
                std::cmp::Ordering::Greater => Self::Pending,
            };
        }

        if number < current_step {
            Self::Completed
        } else if number == current_step && status == JobStatus::Running {
            Self::Running
        } else if status == JobStatus::Completed {
            Self::Completed
        } else {
            Self::Pending
        }
    }
}

/// States of all five steps, in pipeline order
pub fn step_states(status: JobStatus, current_step: u8) -> [(PipelineStep, StepState); 5] {
    PipelineStep::ALL.map(|step| (step, StepState::derive(status, current_step, step)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(status: JobStatus, current_step: u8) -> Vec<StepState> {
        step_states(status, current_step)
            .into_iter()
            .map(|(_, state)| state)
            .collect()
    }

    #[test]
    fn test_step_numbers_round_trip() {
        for step in PipelineStep::ALL {
            assert_eq!(PipelineStep::from_number(step.number()), Some(step));
        }
        assert_eq!(PipelineStep::from_number(0), None);
        assert_eq!(PipelineStep::from_number(6), None);
    }

    #[test]
    fn test_idle_is_all_pending() {
        assert!(states(JobStatus::Idle, 0).iter().all(|s| *s == StepState::Pending));
    }

    #[test]
    fn test_running_marks_current_step() {
        use StepState::*;
        assert_eq!(
            states(JobStatus::Running, 3),
            vec![Completed, Completed, Running, Pending, Pending]
        );
    }

    #[test]
    fn test_error_marks_failed_step() {
        use StepState::*;
        assert_eq!(
            states(JobStatus::Error, 4),
            vec![Completed, Completed, Completed, Error, Pending]
        );
    }

    #[test]
    fn test_completed_marks_everything_done() {
        // Runs that finish early (no new mail) still report completed for all steps.
        assert!(
            states(JobStatus::Completed, 1)
                .iter()
                .all(|s| *s == StepState::Completed)
        );
    }
}
