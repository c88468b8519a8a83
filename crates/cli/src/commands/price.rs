//! Offline pricing check: reads a request from a JSON file and prints the
//! full breakdown, either against the database overrides or the compiled-in
//! defaults.

use std::fs;
use std::path::Path;

use crate::commands::{self, CommandFailure, CommandResult};
use pvquote_core::{calculate_pricing, PriceCatalog, PricingRequest};
use pvquote_db::{migrations, SqlPriceConfigRepository};

pub fn run(file: &Path, defaults: bool) -> CommandResult {
    let raw = match fs::read_to_string(file) {
        Ok(raw) => raw,
        Err(error) => {
            return CommandResult::failure(
                "price",
                "read_request",
                format!("could not read `{}`: {error}", file.display()),
                2,
            );
        }
    };

    let request: PricingRequest = match serde_json::from_str(&raw) {
        Ok(request) => request,
        Err(error) => {
            return CommandResult::failure(
                "price",
                "parse_request",
                format!("`{}` is not a valid pricing request: {error}", file.display()),
                2,
            );
        }
    };

    let input = match request.try_into_input() {
        Ok(input) => input,
        Err(error) => {
            return CommandResult::failure("price", "invalid_input", error.to_string(), 2);
        }
    };

    let catalog = if defaults {
        PriceCatalog::with_defaults()
    } else {
        match load_database_catalog() {
            Ok(catalog) => catalog,
            Err(failure) => return failure.into_result("price"),
        }
    };

    let breakdown = calculate_pricing(&input, &catalog);
    match serde_json::to_string_pretty(&breakdown) {
        Ok(output) => CommandResult::success("price", output),
        Err(error) => CommandResult::failure("price", "serialization", error.to_string(), 3),
    }
}

fn load_database_catalog() -> Result<PriceCatalog, CommandFailure> {
    let config = commands::load_config()?;
    let runtime = commands::blocking_runtime()?;

    runtime.block_on(async {
        let pool = commands::connect_pool(&config).await?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| CommandFailure::new("migration", error.to_string(), 5))?;

        let overrides = SqlPriceConfigRepository::new(pool.clone())
            .load_overrides()
            .await
            .map_err(|error| CommandFailure::new("catalog_load", error.to_string(), 5))?;
        pool.close().await;
        Ok(PriceCatalog::new(overrides))
    })
}
