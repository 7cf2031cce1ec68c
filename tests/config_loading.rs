// tests/config_loading.rs

mod common;
use crate::common::builders::LauncherConfigBuilder;
use crate::common::{demos_dir, init_tracing};

use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use backend_launcher::config::{
    config_root_dir, load_and_validate, parse_and_validate, parse_duration, LauncherConfig,
    Preset,
};
use backend_launcher::errors::LauncherError;

type TestResult = Result<(), Box<dyn Error>>;

fn assert_config_error(result: Result<LauncherConfig, LauncherError>, needle: &str) {
    match result {
        Err(LauncherError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "error '{msg}' should mention '{needle}'")
        }
        other => panic!("expected ConfigError mentioning '{needle}', got {other:?}"),
    }
}

#[test]
fn demo_config_loads_with_all_sections() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(demos_dir().join("Launcher.toml"))?;

    assert_eq!(cfg.backend.command, "bash");
    assert_eq!(cfg.backend.args, vec!["--verbose".to_string()]);
    assert_eq!(cfg.backend.env.get("PORT").map(String::as_str), Some("3000"));
    assert_eq!(cfg.readiness.port, 3000);
    assert_eq!(cfg.readiness.startup_timeout, Duration::from_secs(60));
    assert_eq!(cfg.readiness.initial_delay, Duration::from_millis(500));
    assert_eq!(cfg.grace_period, Duration::from_secs(5));
    assert_eq!(cfg.frontend_url, "http://localhost:3000/app");

    Ok(())
}

#[test]
fn minimal_config_gets_defaults() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(demos_dir().join("minimal.toml"))?;

    assert_eq!(cfg.readiness.host, "localhost");
    assert_eq!(cfg.readiness.startup_timeout, Duration::from_secs(60));
    assert_eq!(cfg.readiness.probe_timeout, Duration::from_secs(1));
    assert_eq!(cfg.readiness.backoff_base, Duration::from_millis(100));
    assert_eq!(cfg.readiness.backoff_cap, Duration::from_secs(1));
    assert_eq!(cfg.grace_period, Duration::from_secs(5));
    assert_eq!(cfg.frontend_url, "http://localhost:8000");

    Ok(())
}

#[test]
fn config_from_tempfile_round_trips_through_loader() -> TestResult {
    init_tracing();

    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(
        file,
        r#"
[backend]
command = "node"
script = "backend/server.js"

[readiness]
port = 5173
startup_timeout = "30s"
"#
    )?;

    let cfg = load_and_validate(file.path())?;
    assert_eq!(cfg.backend.command, "node");
    assert_eq!(cfg.readiness.port, 5173);
    assert_eq!(cfg.readiness.startup_timeout, Duration::from_secs(30));

    Ok(())
}

#[test]
fn relative_script_resolves_against_script_root() {
    let cfg = LauncherConfigBuilder::new("bash", 3000)
        .script("start-server.sh")
        .arg("--port=3000")
        .build();

    let dev = cfg.launch_spec(Path::new("/home/me/project"));
    assert_eq!(dev.command, "bash");
    assert_eq!(
        dev.args,
        vec![
            "/home/me/project/start-server.sh".to_string(),
            "--port=3000".to_string()
        ]
    );

    let packaged = cfg.launch_spec(Path::new("/opt/app/resources"));
    assert_eq!(packaged.args[0], "/opt/app/resources/start-server.sh");
}

#[test]
fn absolute_script_is_left_alone() {
    let cfg = LauncherConfigBuilder::new("bash", 3000)
        .script("/usr/local/bin/start.sh")
        .build();

    let spec = cfg.launch_spec(Path::new("/somewhere/else"));
    assert_eq!(spec.args, vec!["/usr/local/bin/start.sh".to_string()]);
}

#[test]
fn supervisor_settings_carry_policy() {
    let cfg = LauncherConfigBuilder::new("python3", 8000)
        .host("127.0.0.1")
        .startup_timeout("45s")
        .backoff("50ms", "400ms")
        .grace_period("2s")
        .build();

    let settings = cfg.supervisor_settings(Path::new("."));
    assert_eq!(settings.target.host, "127.0.0.1");
    assert_eq!(settings.target.port, 8000);
    assert_eq!(settings.readiness.startup_timeout, Duration::from_secs(45));
    assert_eq!(settings.readiness.backoff.delay(0), Duration::from_millis(50));
    assert_eq!(settings.readiness.backoff.delay(10), Duration::from_millis(400));
    assert_eq!(settings.grace_period, Duration::from_secs(2));
}

#[test]
fn invalid_configs_are_rejected() {
    init_tracing();

    assert_config_error(
        LauncherConfig::try_from(LauncherConfigBuilder::new("  ", 3000).raw()),
        "command",
    );
    assert_config_error(
        LauncherConfig::try_from(LauncherConfigBuilder::new("bash", 0).raw()),
        "port",
    );
    assert_config_error(
        LauncherConfig::try_from(LauncherConfigBuilder::new("bash", 3000).script("").raw()),
        "script",
    );
    assert_config_error(
        LauncherConfig::try_from(
            LauncherConfigBuilder::new("bash", 3000)
                .startup_timeout("0s")
                .raw(),
        ),
        "startup_timeout",
    );
    assert_config_error(
        LauncherConfig::try_from(
            LauncherConfigBuilder::new("bash", 3000)
                .backoff("2s", "1s")
                .raw(),
        ),
        "backoff_base",
    );
    assert_config_error(
        LauncherConfig::try_from(
            LauncherConfigBuilder::new("bash", 3000)
                .grace_period("soon")
                .raw(),
        ),
        "grace_period",
    );
    assert_config_error(
        LauncherConfig::try_from(LauncherConfigBuilder::new("bash", 3000).env("A=B", "x").raw()),
        "env",
    );
    assert_config_error(
        LauncherConfig::try_from(LauncherConfigBuilder::new("bash", 3000).host("").raw()),
        "host",
    );
}

#[test]
fn initial_delay_may_be_zero() -> TestResult {
    let cfg = LauncherConfig::try_from(
        LauncherConfigBuilder::new("bash", 3000)
            .initial_delay("0ms")
            .raw(),
    )?;
    assert!(cfg.readiness.initial_delay.is_zero());
    Ok(())
}

#[test]
fn malformed_toml_is_toml_error() {
    let result = parse_and_validate("[backend\ncommand = ");
    assert!(matches!(result, Err(LauncherError::TomlError(_))));

    // `[readiness].port` is required.
    let result = parse_and_validate("[backend]\ncommand = \"bash\"\n[readiness]\n");
    assert!(matches!(result, Err(LauncherError::TomlError(_))));
}

#[test]
fn missing_file_is_io_error() {
    let result = load_and_validate("/nonexistent/dir/Launcher.toml");
    assert!(matches!(result, Err(LauncherError::IoError(_))));
}

#[test]
fn durations_need_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert!(parse_duration("30").is_err());
    assert!(parse_duration("").is_err());
    assert!(parse_duration("5 parsecs").is_err());
}

#[test]
fn config_root_dir_uses_parent_or_cwd() {
    assert_eq!(
        config_root_dir(Path::new("desktop/Launcher.toml")),
        Path::new("desktop")
    );
    let bare = config_root_dir(Path::new("Launcher.toml"));
    assert!(!bare.as_os_str().is_empty());
}

#[test]
fn every_preset_is_a_valid_config() -> TestResult {
    for preset in Preset::all() {
        let toml = preset.to_toml();
        let cfg = parse_and_validate(&toml)
            .map_err(|e| format!("preset {preset:?} failed to validate: {e}"))?;
        assert!(cfg.backend.script.is_some(), "{preset:?}");
    }

    let cfg = parse_and_validate(&Preset::NodeReact.to_toml())?;
    assert_eq!(cfg.backend.command, "node");
    assert_eq!(cfg.readiness.port, 5173);
    assert_eq!(cfg.readiness.startup_timeout, Duration::from_secs(30));

    let cfg = parse_and_validate(&Preset::ShellScript.to_toml())?;
    assert_eq!(cfg.readiness.port, 8000);
    assert_eq!(cfg.readiness.startup_timeout, Duration::from_secs(45));

    Ok(())
}
