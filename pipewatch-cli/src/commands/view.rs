//! Terminal rendering of job snapshots

use colored::*;
use pipewatch_core::domain::job::{JobState, JobStatus};
use pipewatch_core::domain::log::{LogEntry, LogLevel};
use pipewatch_core::domain::pipeline::{PipelineStep, StepState, step_states};
use pipewatch_core::domain::result::{AnalysisResult, ChangePoint, ComplianceAnalysis};
use pipewatch_sync::SyncEvent;

use crate::config::Config;

/// Tracks what a follow loop has already printed
#[derive(Debug, Default)]
pub struct Progress {
    printed_logs: usize,
    last_step: Option<u8>,
}

impl Progress {
    /// Print the step banner and log lines that are new in `state`
    pub fn update(&mut self, state: &JobState) {
        if state.is_running() && self.last_step != Some(state.current_step) {
            if let Some(step) = state.active_step() {
                println!(
                    "{} Step {}/{}: {}",
                    "▸".cyan(),
                    step.number(),
                    PipelineStep::COUNT,
                    step.title().bold()
                );
            }
            self.last_step = Some(state.current_step);
        }

        print_logs(self.unseen(&state.logs));
    }

    /// Lines not printed yet; a shorter log means the run started over
    fn unseen<'a>(&mut self, logs: &'a [LogEntry]) -> &'a [LogEntry] {
        if logs.len() < self.printed_logs {
            self.printed_logs = 0;
        }
        let fresh = &logs[self.printed_logs..];
        self.printed_logs = logs.len();
        fresh
    }
}

/// Print the full job view: status, steps, outcome and ticket
pub fn print_state(state: &JobState, config: &Config) {
    println!(
        "{} {}  {}",
        "Status:".bold(),
        colorize_status(state.status),
        format!("{}/{} steps", state.current_step, PipelineStep::COUNT).dimmed()
    );
    println!("{}", status_banner(state.status).dimmed());
    println!();

    for (step, step_state) in step_states(state.status, state.current_step) {
        println!(
            "  {} {}. {}",
            step_marker(step_state),
            step.number(),
            step.title()
        );
    }

    if !state.logs.is_empty() {
        println!();
        println!("{}", format!("Logs: {} line(s)", state.logs.len()).dimmed());
    }

    if let Some(error) = &state.error {
        println!("\n{}", "Error:".bold());
        println!("{}", error.red());
    }

    if state.status.is_terminal() {
        print_result(state.result.as_ref());
        print_ticket(state.jira_ticket.as_deref(), config);
    }
}

pub fn print_logs(logs: &[LogEntry]) {
    for entry in logs {
        print_log_entry(entry);
    }
}

/// Print a notification raised by the controller
pub fn print_event(event: &SyncEvent) {
    match event {
        SyncEvent::NoNewItems { message } => println!("{} {}", "ℹ".yellow(), message.yellow()),
        SyncEvent::PollingSuspended {
            consecutive_failures,
            last_error,
        } => println!(
            "{} {}",
            "⚠".red(),
            format!(
                "Stopped polling after {} failed attempts: {}",
                consecutive_failures, last_error
            )
            .red()
        ),
    }
}

fn print_result(result: Option<&AnalysisResult>) {
    println!("\n{}", "AI Analysis:".bold());

    match result {
        None => println!("  {}", "No analysis data was generated.".dimmed()),
        Some(AnalysisResult::NoNewItems { message }) => println!("  {}", message.yellow()),
        Some(AnalysisResult::Analysis { analysis, .. }) => print_analysis(analysis),
        Some(AnalysisResult::Unstructured(value)) => {
            if let Ok(pretty) = serde_json::to_string_pretty(value) {
                println!("{}", pretty);
            } else {
                println!("{:?}", value);
            }
        }
    }
}

fn print_analysis(analysis: &ComplianceAnalysis) {
    if let Some(title) = analysis
        .summary_for_jira
        .as_ref()
        .and_then(|summary| summary.title.as_deref())
    {
        println!("  {}", title.cyan());
    }

    if let Some(change) = &analysis.effective_date_changes {
        println!(
            "  Effective date: {} → {}",
            change.old_date.as_deref().unwrap_or("?"),
            change.new_date.as_deref().unwrap_or("?")
        );
    }

    print_points("New Requirements", &analysis.added_points, "+".green());
    print_points("Removed", &analysis.removed_points, "-".red());

    if !analysis.updated_sections.is_empty() {
        println!(
            "\n  {}",
            format!("Updated Sections ({})", analysis.updated_sections.len()).bold()
        );
        for section in &analysis.updated_sections {
            println!(
                "    {} {}",
                "~".yellow(),
                section.section_title.as_deref().unwrap_or("Untitled section")
            );
            if let Some(summary) = &section.change_summary {
                println!("      {}", summary.dimmed());
            }
        }
    }
}

fn print_points(heading: &str, points: &[ChangePoint], marker: ColoredString) {
    if points.is_empty() {
        return;
    }

    println!("\n  {}", format!("{} ({})", heading, points.len()).bold());
    for point in points {
        println!("    {} {}", marker, point.text());
    }
}

fn print_ticket(ticket: Option<&str>, config: &Config) {
    println!("\n{}", "JIRA Ticket:".bold());

    match ticket {
        Some(ticket) => {
            println!("  {}", ticket.cyan());
            if let Some(link) = config.ticket_link(ticket) {
                println!("  {}", link.dimmed());
            }
        }
        None => println!("  {}", "No ticket was created.".dimmed()),
    }
}

/// Print a log entry
fn print_log_entry(log: &LogEntry) {
    let level_str = log.level.as_str().to_uppercase();
    let level_colored = match log.level {
        LogLevel::Info => level_str.cyan(),
        LogLevel::Success => level_str.green(),
        LogLevel::Warning => level_str.yellow(),
        LogLevel::Error => level_str.red(),
        LogLevel::Other(_) => level_str.normal(),
    };

    println!("{} [{}] {}", log.time.dimmed(), level_colored, log.message);
}

fn status_banner(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Idle => "Ready to process. Run `pipewatch run` to start.",
        JobStatus::Running => "Pipeline running... Processing documents.",
        JobStatus::Completed => "Completed! Check the JIRA ticket and AI analysis below.",
        JobStatus::Error => "Error occurred. Check logs for details.",
    }
}

fn step_marker(state: StepState) -> ColoredString {
    match state {
        StepState::Pending => "·".dimmed(),
        StepState::Running => "▸".cyan(),
        StepState::Completed => "✓".green(),
        StepState::Error => "✗".red(),
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> ColoredString {
    let status_str = status.as_str().to_uppercase();
    match status {
        JobStatus::Idle => status_str.dimmed(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Error => status_str.red(),
    }
}
