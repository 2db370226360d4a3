//! Position details handler.

use tabled::Tabled;

use tracdash_core::{PositionId, Session};

use crate::cli::{GlobalOpts, PositionArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    label: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(session: &Session, args: PositionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let position = session.position_details(PositionId(args.id)).await?;
    let described = session
        .dictionary()
        .describe(&position, session.formatter());

    let out = output::render_single(
        &global.output,
        &position,
        |_| {
            let rows: Vec<AttributeRow> = described
                .iter()
                .map(|(label, value)| AttributeRow {
                    label: label.clone(),
                    value: value.clone(),
                })
                .collect();
            output::render_table(&rows)
        },
        |p| p.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
