//! Writing run results to disk.

use roster::PipelineOutput;
use roster_output::{ExportError, ExportFormat, Exporter};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where each part of a run is written.
#[derive(Debug, Clone)]
pub(crate) struct OutputPaths {
    /// Returns table.
    pub(crate) returns: PathBuf,
    /// Resolution errors, as CSV.
    pub(crate) errors: Option<PathBuf>,
    /// Skipped symbols, as CSV.
    pub(crate) skipped: Option<PathBuf>,
}

/// Write the returns table in `format` and the side files as CSV.
pub(crate) fn write_outputs(
    output: &PipelineOutput,
    paths: &OutputPaths,
    format: ExportFormat,
) -> Result<(), ExportError> {
    output.returns.export_to_file(&paths.returns, format)?;
    info!(
        path = %paths.returns.display(),
        columns = output.returns.width(),
        rows = output.returns.height(),
        "Wrote returns table"
    );

    if let Some(path) = &paths.errors {
        write_side_file(output.resolution.errors.as_slice(), path, "resolution errors")?;
    }
    if let Some(path) = &paths.skipped {
        write_side_file(output.skipped.as_slice(), path, "skipped symbols")?;
    }

    Ok(())
}

fn write_side_file<T: Exporter + ?Sized>(
    records: &T,
    path: &Path,
    what: &str,
) -> Result<(), ExportError> {
    records.export_to_file(path, ExportFormat::Csv)?;
    info!(path = %path.display(), "Wrote {what}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster::data::{DailyChange, MembershipRecord};
    use roster::{DateWindow, MembershipTable, NoProgress, Pipeline, PipelineConfig};
    use roster_data::{InMemorySource, parse_date};

    #[tokio::test]
    async fn test_write_outputs() {
        let jan = parse_date("2021-01-31").unwrap();
        let table = MembershipTable::new(vec![
            MembershipRecord::new(jan, "Barclays"),
            MembershipRecord::new(jan, "Sky"),
        ]);
        let source = InMemorySource::new()
            .with_instrument("Barclays", "BARC.L")
            .with_history(
                "BARC.L",
                vec![DailyChange::new(parse_date("2021-01-05").unwrap(), 1.25)],
            );
        let window = DateWindow::parse("2021-01-01", "2021-01-31").unwrap();
        let output = Pipeline::new(&source, PipelineConfig::default())
            .run(&table, window, &NoProgress)
            .await;

        let dir = std::env::temp_dir();
        let paths = OutputPaths {
            returns: dir.join("roster_bin_test_returns.csv"),
            errors: Some(dir.join("roster_bin_test_errors.csv")),
            skipped: None,
        };
        write_outputs(&output, &paths, ExportFormat::Csv).unwrap();

        let returns = std::fs::read_to_string(&paths.returns).unwrap();
        assert!(returns.starts_with("Date,BARC.L\n2021-01-05,1.25"));

        let errors_path = paths.errors.as_ref().unwrap();
        let errors = std::fs::read_to_string(errors_path).unwrap();
        assert!(errors.starts_with("company,reason\nSky,"));

        std::fs::remove_file(&paths.returns).ok();
        std::fs::remove_file(errors_path).ok();
    }
}
