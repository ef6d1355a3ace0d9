use crate::cli::commands::resolve_month;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::app::App;
use crate::core::summary::{build_month_summary, print_month_summary};
use crate::errors::AppResult;
use crate::ui::messages::header;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Month { month } = cmd {
        let app = App::open(cfg)?;
        let ym = resolve_month(month.as_ref(), app.clock.as_ref())?;

        let records = app.records.month(ym)?;
        let mut cache = app.entry_cache();
        cache.load_from_storage(ym);

        let summary = build_month_summary(ym, &records, Some(&cache));
        header(format!("MONTH {ym}"));
        print_month_summary(&summary);
    }
    Ok(())
}
