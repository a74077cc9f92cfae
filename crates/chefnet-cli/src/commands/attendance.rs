use chefnet_core::{AttendanceRecorder, ChefNetApi, Context, KeyValueStore, SyncReport};

use crate::cli::AttendanceCommands;
use crate::commands::common::{format_queue_lines, print_json};
use crate::error::CliError;

pub async fn run_attendance<S: KeyValueStore, A: ChefNetApi>(
    ctx: &Context<S, A>,
    command: AttendanceCommands,
) -> Result<(), CliError> {
    let recorder = AttendanceRecorder::new(ctx.clone());

    match command {
        AttendanceCommands::Record {
            student_id,
            course_id,
        } => {
            let outcome = recorder.record_attendance(&student_id, &course_id).await?;
            println!("{outcome}");
        }
        AttendanceCommands::Sync => {
            let report = recorder.sync_pending().await;
            println!("{}", format_sync_report(&report));
        }
        AttendanceCommands::Queue { json } => {
            let records = recorder.queued().await;
            if json {
                return print_json(&records);
            }
            if records.is_empty() {
                println!("No attendance is waiting to sync.");
            }
            for line in format_queue_lines(&records) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// Replay attendance queued by earlier runs before a command executes.
/// Prints a summary only when something reached the backend or was rejected.
pub async fn sync_on_startup<S: KeyValueStore, A: ChefNetApi>(ctx: &Context<S, A>) -> SyncReport {
    let recorder = AttendanceRecorder::new(ctx.clone());
    if recorder.queued().await.is_empty() {
        return SyncReport::default();
    }

    let report = recorder.sync_pending().await;
    if report.synced > 0 || report.dropped > 0 {
        eprintln!("{}", format_sync_report(&report));
    }
    report
}

pub fn format_sync_report(report: &SyncReport) -> String {
    if report.attempted == 0 {
        return "Nothing to sync".to_string();
    }
    format!(
        "Synced {} of {} ({} still queued, {} rejected)",
        report.synced, report.attempted, report.failed, report.dropped
    )
}
