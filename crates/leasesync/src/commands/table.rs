//! Lease table command handlers.

use leasesync_core::{LeaseRow, LeaseTable, MacAddress};

use crate::cli::{GlobalOpts, TableArgs, TableCommand};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(r: &LeaseRow) -> String {
    [
        format!("MAC:          {}", r.hwaddr),
        format!("IP:           {}", r.inet_addr),
        format!("Hostname:     {}", r.hostname),
        format!("Vendor Class: {}", r.vendor_class),
        format!("Fingerprint:  {}", r.fingerprint),
        format!("Lease:        {}", util::format_lease_time(r.lease_time)),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: TableArgs, settings: &Settings, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TableCommand::List => {
            let table = util::open_table(settings)?;
            let out = util::render_rows(&global.output, &table.rows())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TableCommand::Get { hwaddr } => {
            let mac: MacAddress = hwaddr.parse()?;
            let table = util::open_table(settings)?;
            let row = table
                .find_hwaddr(&mac.to_key())
                .ok_or(CliError::NotFound { hwaddr })?;
            let out = output::render_single(&global.output, row, detail, |r| r.hwaddr.clone())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TableCommand::Clear => {
            util::require_confirmation("table clear", global.yes)?;
            let mut table = util::open_table(settings)?;
            let removed = table
                .clear()
                .map_err(|e| CliError::store(&settings.store_path, e))?;
            if !global.quiet {
                eprintln!("Removed {removed} rows from {}", table.path().display());
            }
            Ok(())
        }
    }
}
