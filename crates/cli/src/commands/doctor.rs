//! Doctor command - validate configuration and show status

use anyhow::Result;
use birdfeed_adapters::cache::{RedisCache, SqliteCache};
use birdfeed_adapters::store::SqliteDocumentStore;
use birdfeed_domain::{Collection, Filter};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::commands::wiring::{build_store, load_jwt_secret};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    store: CheckResult,
    cache: CheckResult,
    auth: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        store: CheckResult::error("Not checked"),
        cache: CheckResult::error("Not checked"),
        auth: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.store = check_store(config).await;
        report.cache = check_cache(config).await;
        report.auth = check_auth(config);
    }

    let checks = [&report.config, &report.store, &report.cache, &report.auth];
    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_store(config: &AppConfig) -> CheckResult {
    if config.store.backend == "sqlite" {
        let reachable = async {
            let store = SqliteDocumentStore::new(&config.store.sqlite_path).await?;
            store.ping().await
        };
        if let Err(e) = reachable.await {
            return CheckResult::error(format!(
                "SQLite store at {} unreachable: {}",
                config.store.sqlite_path.display(),
                e
            ));
        }
    }

    let store = match build_store(config).await {
        Ok(store) => store,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    match store.count(Collection::Users, &Filter::new()).await {
        Ok(users) => {
            let result = if config.store.backend == "memory" {
                CheckResult::warn("Backend: memory, data does not persist")
            } else {
                CheckResult::ok(format!("Backend: {}, {} users", config.store.backend, users))
            };
            result.with_details(serde_json::json!({
                "backend": config.store.backend,
                "sqlite_path": config.store.sqlite_path,
                "users": users,
            }))
        }
        Err(e) => CheckResult::error(format!("Store query failed: {}", e)),
    }
}

async fn check_cache(config: &AppConfig) -> CheckResult {
    match config.cache.backend.as_str() {
        "memory" => CheckResult::warn("Backend: memory, entries do not outlive the process"),
        "none" => CheckResult::warn("Backend: none, every listing reads the store"),
        "sqlite" => match SqliteCache::open(&config.cache.sqlite_path).await {
            Ok(cache) => match cache.len().await {
                Ok(entries) => CheckResult::ok(format!("Backend: sqlite, {} entries", entries))
                    .with_details(serde_json::json!({
                        "sqlite_path": config.cache.sqlite_path,
                        "entries": entries,
                    })),
                Err(e) => CheckResult::error(format!("Cache query failed: {}", e)),
            },
            Err(e) => CheckResult::error(format!("Failed to open SQLite cache: {}", e)),
        },
        "redis" => {
            let round_trip = async {
                let cache = RedisCache::connect(&config.cache.redis_url).await?;
                cache.ping().await
            };
            match tokio::time::timeout(config.cache.timeout() * 4, round_trip).await {
                Ok(Ok(())) => CheckResult::ok("Backend: redis, PING ok"),
                // Service still runs uncached, so this is not fatal
                Ok(Err(e)) => CheckResult::warn(format!("Backend: redis unreachable: {}", e)),
                Err(_) => CheckResult::warn("Backend: redis, connect timed out"),
            }
        }
        other => CheckResult::error(format!("Unknown cache backend: {}", other)),
    }
}

fn check_auth(config: &AppConfig) -> CheckResult {
    let env_var = &config.auth.jwt_secret_env;
    match load_jwt_secret(env_var) {
        Ok(_) => CheckResult::ok(format!(
            "JWT secret: {} (set), token TTL: {} min",
            env_var, config.auth.token_ttl_minutes
        )),
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("birdfeed Doctor Report");
    println!("======================");
    println!();

    print_check("Config", &report.config);
    print_check("Store", &report.store);
    print_check("Cache", &report.cache);
    print_check("Auth", &report.auth);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
