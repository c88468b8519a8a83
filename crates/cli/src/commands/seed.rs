use crate::commands::{self, CommandFailure, CommandResult};
use pvquote_db::{migrations, DemoSeedDataset};

pub fn run() -> CommandResult {
    match apply() {
        Ok(message) => CommandResult::success("seed", message),
        Err(failure) => failure.into_result("seed"),
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

        let summary = DemoSeedDataset::load(&pool)
            .await
            .map_err(|error| CommandFailure::new("seed_execution", error.to_string(), 5))?;

        let verified = DemoSeedDataset::verify(&pool)
            .await
            .map_err(|error| CommandFailure::new("seed_verification", error.to_string(), 6))?;
        pool.close().await;

        if !verified {
            return Err(CommandFailure::new(
                "seed_verification",
                "seeded price rows do not match the price sheet",
                6,
            ));
        }

        Ok(match summary.demo_quote_number {
            Some(number) => format!(
                "seeded {} price sheet entries and demo quote {number}",
                summary.prices_seeded
            ),
            None => format!(
                "seeded {} price sheet entries; existing quotes left untouched",
                summary.prices_seeded
            ),
        })
    })
}
