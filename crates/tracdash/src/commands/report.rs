//! Report command handlers.

use std::path::Path;

use serde::Serialize;
use tabled::Tabled;
use tabled::builder::Builder;
use tabled::settings::Style;

use tracdash_core::{
    ColumnVisibility, Formatter, ReportFile, ReportFormat, ReportOutcome, Session, TRIP_COLUMNS,
    TripReportParams, TripRow,
};

use crate::cli::{GlobalOpts, OutputFormat, ReportArgs, ReportCommand, TripsArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct ColumnEntry {
    field: &'static str,
    label: String,
    shown_by_default: bool,
}

#[derive(Tabled)]
struct ColumnRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Default")]
    default: String,
}

/// `report columns`: needs no server, labels come from the built-in
/// English messages.
pub fn columns(global: &GlobalOpts) -> Result<(), CliError> {
    let fmt = Formatter::default();
    let entries: Vec<ColumnEntry> = TRIP_COLUMNS
        .iter()
        .map(|c| ColumnEntry {
            field: c.field,
            label: c.label(&fmt),
            shown_by_default: !c.hidden_by_default,
        })
        .collect();
    let out = output::render_list(
        &global.output,
        &entries,
        |e| ColumnRow {
            field: e.field,
            label: e.label.clone(),
            default: if e.shown_by_default { "shown" } else { "hidden" }.into(),
        },
        |e| e.field.to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle(session: &Session, args: ReportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ReportCommand::Trips(trips) => run_trips(session, trips, global).await,
        ReportCommand::Columns => columns(global),
    }
}

fn visibility(args: &TripsArgs) -> Result<ColumnVisibility, CliError> {
    if args.all_columns {
        return Ok(ColumnVisibility::all());
    }
    let Some(ref names) = args.columns else {
        return Ok(ColumnVisibility::default());
    };
    if let Some(unknown) = names
        .iter()
        .find(|n| !TRIP_COLUMNS.iter().any(|c| c.field == n.as_str()))
    {
        return Err(CliError::Validation {
            field: "columns".into(),
            reason: format!("unknown column '{unknown}' (see: tracdash report columns)"),
        });
    }
    let fields: Vec<&str> = names.iter().map(String::as_str).collect();
    Ok(ColumnVisibility::only(&fields))
}

async fn run_trips(session: &Session, args: TripsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let from = util::parse_time("from", &args.from)?;
    let to = util::parse_time("to", &args.to)?;
    let visible = visibility(&args)?;
    let device = util::load_device(session, &args.device).await?;

    let params = TripReportParams {
        device_id: device.id.0,
        from,
        to,
        mail: args.mail,
        format: if args.export {
            ReportFormat::Excel
        } else {
            ReportFormat::Json
        },
    };

    let bar = util::spinner("Running trip report", global);
    let outcome = session.trip_report(&params).await;
    bar.finish_and_clear();

    match outcome? {
        ReportOutcome::Rows(rows) => {
            let out = match global.output {
                OutputFormat::Table => trips_table(&rows, &visible, session.formatter()),
                OutputFormat::Plain => rows
                    .iter()
                    .enumerate()
                    .map(|(i, r)| r.stable_id(i))
                    .collect::<Vec<_>>()
                    .join("\n"),
                ref format => output::render_single(format, rows.as_slice(), |_| String::new(), |_| String::new()),
            };
            output::print_output(&out, global.quiet);
        }
        ReportOutcome::Download(file) => {
            let path = save(&file, args.out.as_deref())?;
            output::print_output(&path, global.quiet);
        }
        ReportOutcome::Nothing => {
            if !global.quiet {
                eprintln!("{}", session.formatter().t("sharedNoData"));
            }
        }
    }
    Ok(())
}

/// Visible columns as a table; an empty report prints a notice.
fn trips_table(rows: &[TripRow], visible: &ColumnVisibility, fmt: &Formatter) -> String {
    if rows.is_empty() {
        return fmt.t("sharedNoData");
    }
    let mut builder = Builder::default();
    builder.push_record(visible.visible_columns().map(|c| c.label(fmt)));
    for row in rows {
        builder.push_record(visible.visible_columns().map(|c| c.render(row, fmt)));
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Write an exported report. `out` may name a directory or a file.
fn save(file: &ReportFile, out: Option<&Path>) -> Result<String, CliError> {
    let path = match out {
        Some(p) if p.is_dir() => file.save_in(p)?,
        Some(p) => {
            file.save_as(p)?;
            p.to_path_buf()
        }
        None => file.save_in(Path::new("."))?,
    };
    Ok(path.display().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    fn args(columns: Option<Vec<&str>>, all: bool) -> TripsArgs {
        TripsArgs {
            device: "1".into(),
            from: "2024-01-01".into(),
            to: "2024-01-02".into(),
            export: false,
            mail: false,
            out: None,
            columns: columns.map(|c| c.into_iter().map(str::to_owned).collect()),
            all_columns: all,
        }
    }

    #[test]
    fn unknown_column_is_rejected() {
        assert!(matches!(
            visibility(&args(Some(vec!["distance", "bogus"]), false)),
            Err(CliError::Validation { .. })
        ));
        let only = visibility(&args(Some(vec!["distance"]), false)).unwrap();
        assert_eq!(only.visible_columns().count(), 1);
        assert_eq!(
            visibility(&args(None, true)).unwrap().visible_columns().count(),
            TRIP_COLUMNS.len()
        );
    }

    #[test]
    fn table_shows_formatted_cells() {
        let fmt = Formatter::default().with_offset(FixedOffset::east_opt(0).unwrap());
        let row = TripRow::new(
            json!({ "startTime": "2024-01-01T08:00:00Z", "distance": 1000 })
                .as_object()
                .unwrap()
                .clone(),
        );
        let table = trips_table(&[row], &ColumnVisibility::only(&["startTime", "distance"]), &fmt);
        assert!(table.contains("2024-01-01 08:00"));
        assert!(table.contains("1.00 km"));
    }

    #[test]
    fn export_saved_under_suggested_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = ReportFile {
            filename: "trips.xlsx".into(),
            content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
                .into(),
            body: vec![1_u8, 2, 3].into(),
        };
        let path = save(&file, Some(dir.path())).unwrap();
        assert!(path.ends_with("trips.xlsx"));
        assert_eq!(std::fs::read(dir.path().join("trips.xlsx")).unwrap(), vec![1, 2, 3]);
    }
}
