use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::commands::CommandResult;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    command: &'static str,
    latency_ms: u64,
    data: &'a Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: &'a Vec<String>,
}

pub fn render(result: &CommandResult, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let envelope = Envelope {
        command: result.command,
        latency_ms: result.latency_ms,
        data: &result.data,
        warnings: &result.warnings,
    };

    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(&envelope)?
            } else {
                serde_json::to_string(&envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => render_table(&envelope)?,
    }

    Ok(())
}

fn render_table(envelope: &Envelope<'_>) -> Result<(), CliError> {
    println!("command     : {}", envelope.command);
    println!("latency_ms  : {}", envelope.latency_ms);

    if !envelope.warnings.is_empty() {
        println!("warnings:");
        for warning in envelope.warnings {
            println!("  - {warning}");
        }
    }

    println!("data:");
    let pretty_data = serde_json::to_string_pretty(envelope.data)?;
    for line in pretty_data.lines() {
        println!("  {line}");
    }

    Ok(())
}
