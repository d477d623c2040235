use strata_synthesis::{CancelToken, ProgressEvent, SynthesisOptions, SynthesisPipeline};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SynthesisRunArgs;
use crate::context::AppContext;
use crate::output::output;
use crate::progress::Progress;

const EVENT_BUFFER: usize = 64;

/// Run both synthesis phases for one digest.
///
/// Ctrl-C cancels the run at its next checkpoint; rows already written
/// stay and the report comes back `partial`.
pub async fn run(
    args: &SynthesisRunArgs,
    ctx: &mut AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let options = run_options(args, SynthesisOptions::from(&ctx.config.synthesis));
    let digest_id = match (&args.digest, args.date) {
        (Some(id), _) => id.clone(),
        (None, Some(date)) => ctx.service.get_or_create_digest(date).await?.id,
        (None, None) => anyhow::bail!("either --digest or --date is required"),
    };

    let models = ctx.models()?;
    let pipeline = SynthesisPipeline::new(&ctx.service, &models, &ctx.config);

    let cancel = CancelToken::new();
    let interrupt = spawn_interrupt_watcher(cancel.clone());
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

    let (result, ()) = tokio::join!(
        pipeline.run_with_progress(&digest_id, &options, events_tx, cancel),
        render_events(events_rx, args.stream),
    );
    interrupt.abort();

    let report = result?;
    if args.stream {
        // The terminal `complete` event already carried the report.
        return Ok(());
    }
    output(&report, flags.format)
}

fn run_options(args: &SynthesisRunArgs, defaults: SynthesisOptions) -> SynthesisOptions {
    SynthesisOptions {
        max_items_to_process: args.max_items.unwrap_or(defaults.max_items_to_process),
        max_candidates_per_item: args
            .max_candidates
            .unwrap_or(defaults.max_candidates_per_item),
        min_similarity: args.min_similarity.unwrap_or(defaults.min_similarity),
        max_age_days: args.max_age_days.unwrap_or(defaults.max_age_days),
        ..defaults
    }
}

fn spawn_interrupt_watcher(cancel: CancelToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping at the next checkpoint");
            cancel.cancel();
        }
    })
}

/// Drain the event stream until its terminal event.
async fn render_events(mut events: mpsc::Receiver<ProgressEvent>, stream: bool) {
    let bar = (!stream).then(|| Progress::bar("synthesis"));

    while let Some(event) = events.recv().await {
        if stream {
            match event_line(&event) {
                Ok(line) => println!("{line}"),
                Err(error) => tracing::warn!(%error, "progress event not serializable"),
            }
        }
        if let Some(bar) = &bar {
            bar.apply(&event);
        }
        if is_terminal(&event) {
            break;
        }
    }
}

fn event_line(event: &ProgressEvent) -> serde_json::Result<String> {
    serde_json::to_string(event)
}

const fn is_terminal(event: &ProgressEvent) -> bool {
    matches!(
        event,
        ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use strata_core::enums::PipelinePhase;
    use strata_core::errors::ErrorKind;
    use strata_synthesis::{ProgressEvent, SynthesisOptions};
    use tokio::sync::mpsc;

    use super::{event_line, is_terminal, render_events, run_options};
    use crate::cli::subcommands::SynthesisRunArgs;

    fn args() -> SynthesisRunArgs {
        SynthesisRunArgs {
            digest: Some("dig-1".to_string()),
            date: None,
            max_items: None,
            max_candidates: None,
            min_similarity: None,
            max_age_days: None,
            stream: false,
        }
    }

    #[test]
    fn options_default_to_config() {
        let defaults = SynthesisOptions::default();
        assert_eq!(run_options(&args(), defaults), defaults);
    }

    #[test]
    fn flags_override_config() {
        let mut args = args();
        args.max_items = Some(2);
        args.min_similarity = Some(0.8);
        args.max_age_days = Some(30);

        let options = run_options(&args, SynthesisOptions::default());
        assert_eq!(options.max_items_to_process, 2);
        assert_eq!(options.max_age_days, 30);
        assert!((options.min_similarity - 0.8).abs() < f64::EPSILON);
        assert_eq!(
            options.max_candidates_per_item,
            SynthesisOptions::default().max_candidates_per_item
        );
    }

    #[test]
    fn stream_lines_are_tagged_json() {
        let event = ProgressEvent::Progress {
            phase: PipelinePhase::Scoring,
            current: 1,
            total: 4,
            label: "Rail".to_string(),
        };
        let line = event_line(&event).expect("serialize");
        assert!(!line.contains('\n'));
        let json: serde_json::Value = serde_json::from_str(&line).expect("parse");
        assert_eq!(json["event"], "progress");
        assert_eq!(json["phase"], "scoring");
    }

    #[test]
    fn only_complete_and_error_are_terminal() {
        assert!(!is_terminal(&ProgressEvent::Heartbeat { elapsed_ms: 10 }));
        assert!(is_terminal(&ProgressEvent::Error {
            kind: ErrorKind::NotFound,
            message: "digest not found".to_string(),
        }));
    }

    #[tokio::test]
    async fn rendering_stops_at_terminal_event_while_sender_lives() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(ProgressEvent::Heartbeat { elapsed_ms: 5 })
            .await
            .expect("send");
        tx.send(ProgressEvent::Error {
            kind: ErrorKind::Validation,
            message: "bad options".to_string(),
        })
        .await
        .expect("send");

        render_events(rx, false).await;
        assert!(tx.is_closed());
    }
}
