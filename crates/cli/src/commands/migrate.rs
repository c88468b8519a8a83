use crate::commands::{self, CommandFailure, CommandResult};
use pvquote_db::migrations;

pub fn run() -> CommandResult {
    match apply() {
        Ok(message) => CommandResult::success("migrate", message),
        Err(failure) => failure.into_result("migrate"),
    }
}

fn apply() -> Result<String, CommandFailure> {
    let config = commands::load_config()?;
    let runtime = commands::blocking_runtime()?;

    runtime.block_on(async {
        let pool = commands::connect_pool(&config).await?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| CommandFailure::new("migration", error.to_string(), 5))?;
        let applied = migrations::applied_count(&pool)
            .await
            .map_err(|error| CommandFailure::new("migration", error.to_string(), 5))?;
        pool.close().await;

        Ok(format!("schema is up to date ({applied} migration(s) applied)"))
    })
}
