//! `gatectl mode`: report whether the gateway accepts edits.

use serde::Serialize;

use gatectl_core::{GatewayMode, Session, WriteMode};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModeReport {
    url: String,
    mode: String,
    editable: bool,
    write_mode: WriteMode,
}

fn detail(report: &ModeReport, color: bool) -> String {
    let state = if report.editable {
        "editable"
    } else {
        "read-only (xDS managed)"
    };
    format!(
        "Gateway:    {}\nMode:       {} ({})\nWrite mode: {}",
        report.url,
        output::status(&report.mode, report.editable, color),
        state,
        report.write_mode,
    )
}

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let mode = session.probe_mode().await?;
    let report = ModeReport {
        url: session.config().url.to_string(),
        mode: mode.to_string(),
        editable: mode == GatewayMode::Local,
        write_mode: session.config().write_mode,
    };

    let color = matches!(global.output, OutputFormat::Table) && output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| r.mode.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_detail_names_read_only_mode() {
        let report = ModeReport {
            url: "http://localhost:15000/".into(),
            mode: GatewayMode::Xds.to_string(),
            editable: false,
            write_mode: WriteMode::Document,
        };
        let text = detail(&report, false);
        assert!(text.contains("xds (read-only (xDS managed))"));
        assert!(text.contains("Write mode: document"));
    }
}
