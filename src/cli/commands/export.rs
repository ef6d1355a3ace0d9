use crate::cli::commands::resolve_month;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::app::App;
use crate::core::summary::build_month_summary;
use crate::errors::AppResult;
use crate::export::ExportLogic;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Export {
        format,
        file,
        month,
        force,
    } = cmd
    {
        let app = App::open(cfg)?;
        let ym = resolve_month(month.as_ref(), app.clock.as_ref())?;
        let records = app.records.month(ym)?;
        let summary = build_month_summary(ym, &records, None);
        ExportLogic::export(&summary, *format, file, *force)?;
    }
    Ok(())
}
