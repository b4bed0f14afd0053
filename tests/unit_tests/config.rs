use crate::test_output_dir;
use parfem::comm::SerialCommunicator;
use parfem::config::{Config, LogLevel, SolverConfig};
use parfem::context::ProcessContext;

#[test]
fn empty_configuration_uses_defaults() {
    let config = Config::from_json_str("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.log.level, LogLevel::All);
    assert_eq!(config.solver, SolverConfig::default());
}

#[test]
fn partial_configuration_is_merged_with_defaults() {
    let json = r#"{ "log": { "level": "warn" }, "solver": { "tolerance": 1e-10 } }"#;
    let config = Config::from_json_str(json).unwrap();
    assert_eq!(config.log.level, LogLevel::Warn);
    assert_eq!(config.log.file, None);
    assert_eq!(config.solver.tolerance, 1e-10);
    assert_eq!(config.solver.max_iterations, SolverConfig::default().max_iterations);
}

#[test]
fn invalid_configuration_is_rejected() {
    assert!(Config::from_json_str(r#"{ "log": { "level": "verbose" } }"#).is_err());
    assert!(Config::from_json_str("not json").is_err());
    assert!(Config::from_file(test_output_dir("config").join("missing.json")).is_err());
}

#[test]
fn log_levels_are_ordered_by_severity() {
    assert!(LogLevel::All < LogLevel::Info);
    assert!(LogLevel::Info < LogLevel::Warn);
    assert!(LogLevel::Warn < LogLevel::Error);
    assert_eq!(LogLevel::Warn.label(), "WARN");
}

#[test]
fn log_file_is_created_per_rank() {
    let dir = test_output_dir("config");
    let config_path = dir.join("run.json");
    let log_base = dir.join("run");
    let json = serde_json::json!({ "log": { "level": "info", "file": log_base } });
    std::fs::write(&config_path, json.to_string()).unwrap();

    let config = Config::from_file(&config_path).unwrap();
    let ctx = ProcessContext::with_log_config(Box::new(SerialCommunicator), &config.log).unwrap();
    ctx.info("assembling");
    ctx.debug("dropped below the configured level");
    drop(ctx);

    let log = std::fs::read_to_string(dir.join("run_0.log")).unwrap();
    assert!(log.contains("assembling"));
    assert!(!log.contains("dropped below"));
}
