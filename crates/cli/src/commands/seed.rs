use crate::commands::CommandResult;
use ceiba_core::config::{AppConfig, LoadOptions};
use ceiba_db::{connect_with_settings, migrations, SeedDataset, SeedResult};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let loaded = SeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = SeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedResult, (&'static str, String, u8)> =
            if !verification.all_present {
                Err(("seed_verification", verification_message(&verification.checks), 6u8))
            } else {
                Ok(loaded)
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(loaded) => {
            let message = format!(
                "demo dataset loaded: {} customers, {} suppliers, {} items, {} submitted invoices",
                loaded.customers, loaded.suppliers, loaded.items, loaded.submitted_invoices
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed_checks = checks
        .iter()
        .filter_map(|(check, passed)| (!passed).then_some(*check))
        .collect::<Vec<_>>();

    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = [
            ("customer-tiendas-la-ceiba", true),
            ("stock-laptop", false),
            ("submitted-invoices", false),
        ];

        assert_eq!(
            verification_message(&checks),
            "Seed verification failed for checks: stock-laptop, submitted-invoices"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        let checks = [("customer-maria-lopez", true), ("default-tax-template", true)];

        assert_eq!(verification_message(&checks), "Some seed data failed to load");
    }
}
