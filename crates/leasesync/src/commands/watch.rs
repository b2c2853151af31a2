//! Stream lease events from stdin until EOF or Ctrl-C.
//!
//! Each notification is printed as it is produced: one compact JSON
//! object per line for `-o json`/`json-compact`, otherwise a short text
//! line.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use leasesync_core::{LeaseEngine, LeaseEvent, LeaseNotification, LeaseSink, PassOutcome};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

fn render_notification(
    format: &OutputFormat,
    notification: &LeaseNotification,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(notification),
        _ => Ok(format!(
            "{} {} {} {}s",
            notification.kind,
            notification.record.hwaddr,
            notification.record.ipaddr,
            notification.record.lease_time
        )),
    }
}

fn report(
    outcome: &PassOutcome,
    event: &LeaseEvent,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    for notification in &outcome.notifications {
        output::print_output(&render_notification(&global.output, notification)?, global.quiet);
    }
    if outcome.is_quiet() && args.show_quiet {
        let line = format!(
            "- {} {} (no change)",
            event.record.hwaddr, event.record.ipaddr
        );
        output::print_output(&line, global.quiet);
    }
    Ok(())
}

pub async fn handle(
    args: &WatchArgs,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let table = util::open_table(settings)?;
    let mut engine = LeaseEngine::with_table(settings.engine.clone(), table);

    info!(store = %settings.store_path.display(), "watching stdin for lease events");
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    pump(
        BufReader::new(tokio::io::stdin()),
        interrupted,
        &mut engine,
        args,
        global,
    )
    .await?;

    util::print_summary(&engine.stats(), global.quiet);
    Ok(())
}

/// Feed lines from `reader` into `engine` until EOF or `shutdown` resolves.
///
/// `shutdown` is created once and polled by reference, so a signal that
/// fires while an event is being handled is still seen on the next turn.
async fn pump<R, F, S>(
    reader: R,
    shutdown: F,
    engine: &mut LeaseEngine<S>,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = ()>,
    S: LeaseSink,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            () = &mut shutdown => {
                debug!("interrupted");
                break;
            }
        };
        let Some(line) = line else {
            debug!("end of input");
            break;
        };
        line_no += 1;

        let event = match LeaseEvent::parse_line(&line, line_no) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "skipping malformed event");
                continue;
            }
        };
        let outcome = engine.handle(event.clone());
        report(&outcome, &event, args, global)?;
    }
    Ok(())
}
