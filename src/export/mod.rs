mod fs_utils;
mod json_csv;

use crate::core::summary::MonthSummary;
use crate::errors::AppResult;
use crate::ui::messages::{success, warning};
use clap::ValueEnum;
use std::path::Path;

pub(crate) fn notify_export_success(label: &str, path: &Path) {
    success(format!("{label} export completed: {}", path.display()));
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

pub struct ExportLogic;

impl ExportLogic {
    /// Write the summary rows of one month. An existing file is only
    /// replaced with `force` or after confirmation.
    pub fn export(
        summary: &MonthSummary,
        format: ExportFormat,
        file: &str,
        force: bool,
    ) -> AppResult<()> {
        let path = Path::new(file);
        fs_utils::ensure_writable(path, force)?;

        if summary.entered_days == 0 {
            warning(format!(
                "No entered days in {}; exporting an empty month.",
                summary.year_month
            ));
        }

        match format {
            ExportFormat::Csv => json_csv::export_csv(&summary.rows, path),
            ExportFormat::Json => json_csv::export_json(summary, path),
        }
    }
}
