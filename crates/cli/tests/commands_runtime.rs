use std::env;
use std::io::Write;
use std::sync::{Mutex, OnceLock};

use pvquote_cli::commands::{migrate, price, seed};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("PVQUOTE_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_reports_config_failures_with_exit_code_two() {
    with_env(&[("PVQUOTE_DATABASE_MAX_CONNECTIONS", "not-a-number")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_against_a_file_database() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("pvquote-seed.db").display());

    with_env(&[("PVQUOTE_DATABASE_URL", &url)], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed invocation success");
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["status"], "ok");
        let first_message = first_payload["message"].as_str().unwrap_or("");
        assert!(first_message.contains("demo quote PV-"), "first run seeds the demo quote");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed invocation success");
        let second_payload = parse_payload(&second.output);
        assert_eq!(second_payload["status"], "ok");
        let second_message = second_payload["message"].as_str().unwrap_or("");
        assert!(
            second_message.contains("existing quotes left untouched"),
            "second run must not duplicate the demo quote"
        );
    });
}

#[test]
fn price_computes_a_breakdown_from_a_request_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"{{
            "building_type": "mfh",
            "grid_type": "1p",
            "distance_meter_to_hak": "12",
            "desired_power_kw": "6",
            "storage_kwh": 4
        }}"#
    )
    .expect("write request");

    with_env(&[], || {
        let result = price::run(file.path(), true);
        assert_eq!(result.exit_code, 0, "expected successful price run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "price");
        assert_eq!(payload["status"], "ok");

        let breakdown: Value = serde_json::from_str(payload["message"].as_str().unwrap_or(""))
            .expect("message should carry the breakdown JSON");
        assert_eq!(breakdown["package"], "pro");
        assert_eq!(breakdown["net_total"], "3060.00");
        assert_eq!(breakdown["vat_amount"], "581.40");
        assert_eq!(breakdown["gross_total"], "3641.40");
    });
}

#[test]
fn price_rejects_malformed_requests() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, r#"{{ "desired_power_kw": "sechs" }}"#).expect("write request");

    with_env(&[], || {
        let result = price::run(file.path(), true);
        assert_eq!(result.exit_code, 2, "expected input validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PVQUOTE_DATABASE_URL",
        "PVQUOTE_DATABASE_MAX_CONNECTIONS",
        "PVQUOTE_DATABASE_TIMEOUT_SECS",
        "PVQUOTE_SERVER_BIND_ADDRESS",
        "PVQUOTE_SERVER_PORT",
        "PVQUOTE_CATALOG_CACHE_TTL_SECS",
        "PVQUOTE_INTEGRATION_API_TOKEN",
        "PVQUOTE_LOG_LEVEL",
        "PVQUOTE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
