use std::fs::File;
use std::io::{self, BufRead, BufReader};

use tickstore_core::{IngestTuple, TickStore};

use crate::cli::IngestArgs;
use crate::error::CliError;

use super::CommandResult;

pub fn run(args: &IngestArgs, store: &TickStore) -> Result<CommandResult, CliError> {
    let tuples = if args.file.as_os_str() == "-" {
        parse_lines(io::stdin().lock())?
    } else {
        parse_lines(BufReader::new(File::open(&args.file)?))?
    };

    let report = store.ingest_batch(&args.source, &tuples);
    let rejected = report.rejected;
    let mut result = CommandResult::ok("ingest", serde_json::to_value(&report)?)
        .with_rejected(rejected);
    if tuples.is_empty() {
        result = result.with_warning("input contained no observations");
    }
    Ok(result)
}

/// Parse every non-blank line before anything is ingested, so a malformed
/// file is rejected as a whole.
fn parse_lines(reader: impl BufRead) -> Result<Vec<IngestTuple>, CliError> {
    let mut tuples = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let tuple = serde_json::from_str(&line).map_err(|error| CliError::Input {
            line: index + 1,
            message: error.to_string(),
        })?;
        tuples.push(tuple);
    }
    Ok(tuples)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tickstore_core::Tier;

    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        let input = "\n{\"symbol\":\"AAPL\",\"tier\":\"live\",\"timestamp\":\"2026-02-20T15:30:00Z\",\"payload\":{\"price\":150.0}}\n\n";
        let tuples = parse_lines(Cursor::new(input)).expect("parse");

        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].tier, Tier::Live);
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let input = "{\"symbol\":\"AAPL\",\"tier\":\"live\",\"timestamp\":\"2026-02-20T15:30:00Z\",\"payload\":{}}\n{\"symbol\":\"AAPL\",\"tier\":\"hourly\"}\n";
        let error = parse_lines(Cursor::new(input)).expect_err("must fail");

        assert!(matches!(error, CliError::Input { line: 2, .. }));
        assert_eq!(error.exit_code(), 2);
    }
}
