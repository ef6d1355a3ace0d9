use crate::config::Config;
use crate::core::app::App;
use crate::core::sync::SyncLogic;
use crate::errors::AppResult;

pub async fn handle(cfg: &Config) -> AppResult<()> {
    let app = App::open(cfg)?;
    SyncLogic::daemon(&app).await
}
