use std::sync::OnceLock;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use strata_synthesis::ProgressEvent;

use crate::ui;

/// Terminal progress display. Every method is a no-op when progress is
/// disabled (quiet mode, stderr not a terminal).
pub struct Progress {
    bar: Option<ProgressBar>,
}

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(MultiProgress::new)
}

fn bar_template() -> &'static str {
    match ui::prefs().term_width {
        Some(cols) if cols >= 110 => "{bar:40.cyan/blue} {pos}/{len} {elapsed_precise} {msg}",
        Some(cols) if cols >= 80 => "{wide_bar:.cyan/blue} {pos}/{len} {msg}",
        _ => "{wide_bar:.cyan/blue} {percent}% {msg}",
    }
}

impl Progress {
    #[must_use]
    pub fn spinner(message: &str) -> Self {
        if !ui::prefs().progress {
            return Self { bar: None };
        }

        let bar = multi_progress().add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    /// A bar whose length is set by the first progress event.
    #[must_use]
    pub fn bar(message: &str) -> Self {
        if !ui::prefs().progress {
            return Self { bar: None };
        }

        let bar = multi_progress().add(ProgressBar::new(0));
        bar.set_style(
            ProgressStyle::with_template(bar_template())
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message(message.to_string());
        Self { bar: Some(bar) }
    }

    /// Reflect one pipeline event. Heartbeats only tick the display.
    pub fn apply(&self, event: &ProgressEvent) {
        let Some(bar) = &self.bar else {
            return;
        };
        match event {
            ProgressEvent::Progress {
                phase,
                current,
                total,
                label,
            } => {
                bar.set_length(*total as u64);
                bar.set_position(*current as u64);
                bar.set_message(format!("{phase}: {label}"));
            }
            ProgressEvent::Heartbeat { .. } => bar.tick(),
            ProgressEvent::Complete { report } => bar.finish_with_message(format!(
                "{}: {} candidates, {} syntheses, {} errors",
                outcome_label(report.outcome),
                report.candidates_created,
                report.syntheses_developed,
                report.errors
            )),
            ProgressEvent::Error { kind, message } => {
                bar.abandon_with_message(format!("{kind}: {message}"));
            }
        }
    }

    pub fn finish_ok(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message.to_string());
        }
    }

    pub fn finish_err(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(message.to_string());
        }
    }
}

const fn outcome_label(outcome: strata_core::enums::RunOutcome) -> &'static str {
    match outcome {
        strata_core::enums::RunOutcome::Complete => "complete",
        strata_core::enums::RunOutcome::Partial => "partial",
    }
}
