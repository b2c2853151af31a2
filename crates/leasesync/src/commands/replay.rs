//! Replay a JSON-lines event file through the engine.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use leasesync_core::{LeaseEngine, LeaseEvent, LeaseTable};

use crate::cli::{GlobalOpts, ReplayArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

fn open_input(path: &Path) -> Result<Box<dyn BufRead>, CliError> {
    if path == Path::new("-") {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    Ok(Box::new(BufReader::new(File::open(path)?)))
}

pub fn handle(args: &ReplayArgs, settings: &Settings, global: &GlobalOpts) -> Result<(), CliError> {
    let table = util::open_table(settings)?;
    let mut engine = LeaseEngine::with_table(settings.engine.clone(), table);
    let mut emitted = Vec::new();

    let reader = open_input(&args.input)?;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let event = match LeaseEvent::parse_line(&line, idx + 1) {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) if args.skip_invalid => {
                warn!(error = %e, "skipping malformed event");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let outcome = engine.handle(event);
        if args.notifications {
            emitted.extend(outcome.notifications);
        }
    }

    let stats = engine.stats();
    info!(
        input = %args.input.display(),
        events = stats.events,
        notifications = stats.notifications,
        failures = stats.failures,
        "replay finished"
    );
    util::print_summary(&stats, global.quiet);

    let out = if args.notifications {
        util::render_notifications(&global.output, &emitted)?
    } else {
        util::render_rows(&global.output, &engine.sink().table().rows())?
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
