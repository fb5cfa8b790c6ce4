//! Tests for `minikube config get/set/unset/view`.

use minikube::bootstrap::{Bootstrap, RuntimeConfig};
use minikube::cli::config::{self, ConfigCommand};
use minikube::cli::root_flag_definitions;
use minikube::config::{ENV_PREFIX, EnvBinder};
use minikube::error::BootstrapError;
use minikube::flags::FlagSet;
use minikube::logging;
use minikube::paths::MiniPaths;
use tempfile::TempDir;

fn runtime(temp: &TempDir, vars: &[(&str, &str)]) -> RuntimeConfig {
    let paths = MiniPaths::new(temp.path().join(".minikube"));
    let mut flags = FlagSet::new(root_flag_definitions());
    flags.extend(logging::flag_definitions(&paths.logs_dir()));
    let mut boot = Bootstrap::new(paths)
        .with_env(EnvBinder::from_vars(ENV_PREFIX, vars.iter().copied()))
        .without_logging();
    boot.run(flags, false).unwrap().clone()
}

fn run(cmd: ConfigCommand, rt: &RuntimeConfig) -> String {
    let mut out = Vec::new();
    config::run(&cmd, rt, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn set_then_view_lists_file_contents() {
    let temp = TempDir::new().unwrap();
    let rt = runtime(&temp, &[]);

    config::set(&rt, "wantupdatenotification", "false").unwrap();
    config::set(&rt, "v", "4").unwrap();

    let view = run(ConfigCommand::View, &rt);
    assert_eq!(view, "- WantUpdateNotification: false\n- v: 4\n");

    let raw = std::fs::read_to_string(rt.paths.config_file()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["WantUpdateNotification"], serde_json::json!(false));
    assert_eq!(json["v"], serde_json::json!(4));
}

#[test]
fn set_replaces_differently_cased_key() {
    let temp = TempDir::new().unwrap();
    let rt = runtime(&temp, &[]);
    std::fs::write(rt.paths.config_file(), r#"{"reminderwaitperiodinhours": 1}"#).unwrap();

    config::set(&rt, "ReminderWaitPeriodInHours", "48").unwrap();
    let view = run(ConfigCommand::View, &rt);
    assert_eq!(view, "- ReminderWaitPeriodInHours: 48\n");
}

#[test]
fn set_rejects_wrong_type() {
    let temp = TempDir::new().unwrap();
    let rt = runtime(&temp, &[]);

    let err = config::set(&rt, "ReminderWaitPeriodInHours", "soon").unwrap_err();
    assert!(matches!(err, BootstrapError::InvalidValue { expected: "int", .. }));
    assert!(!rt.paths.config_file().exists());
}

#[test]
fn set_rejects_unknown_property() {
    let temp = TempDir::new().unwrap();
    let rt = runtime(&temp, &[]);
    let err = config::set(&rt, "no-such-thing", "1").unwrap_err();
    assert!(matches!(err, BootstrapError::UnknownKey(_)));
}

#[test]
fn unset_removes_key_and_tolerates_absent() {
    let temp = TempDir::new().unwrap();
    let rt = runtime(&temp, &[]);
    config::set(&rt, "WantReportError", "true").unwrap();
    config::set(&rt, "alsologtostderr", "true").unwrap();

    config::unset(&rt, "wantreporterror").unwrap();
    config::unset(&rt, "wantreporterror").unwrap();

    assert_eq!(run(ConfigCommand::View, &rt), "- alsologtostderr: true\n");
}

#[test]
fn get_reports_resolved_value() {
    let temp = TempDir::new().unwrap();
    let rt = runtime(&temp, &[("MINIKUBE_REMINDERWAITPERIODINHOURS", "6")]);

    let got = run(
        ConfigCommand::Get {
            key: "ReminderWaitPeriodInHours".into(),
        },
        &rt,
    );
    assert_eq!(got, "6\n");

    let got = run(
        ConfigCommand::Get {
            key: "WantKubectlDownloadMsg".into(),
        },
        &rt,
    );
    assert_eq!(got, "true\n");
}

#[test]
fn view_on_missing_file_prints_nothing() {
    let temp = TempDir::new().unwrap();
    let rt = runtime(&temp, &[]);
    assert_eq!(run(ConfigCommand::View, &rt), "");
}
