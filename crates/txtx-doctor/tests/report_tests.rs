use std::thread;

use txtx_doctor::report::{exit_code, render, render_quickfix, to_json_value, Format};
use txtx_doctor::{validate_source, DoctorConfig, ManifestSnapshot};
use txtx_test_utils::{test_addons, RunbookBuilder};

const RUNBOOK: &str = r#"
addon "evm" {
    chain_id = flow.chain_id
}

flow "mainnet" {
    chain_id = 1
}

flow "testnet" {
    chain_id = 5
    gas = 1
}

action "deploy" "evm::deploy_contract" {
    gas = flow.gas
    key = env.deployer_key
}

output "hash" {
    value = action.deploy.receipt
}
"#;

fn manifest() -> ManifestSnapshot {
    ManifestSnapshot::new()
        .with_environment("testnet", [("deployer_key", "0xabc")])
        .with_current_environment("testnet")
}

#[test]
fn test_json_report_schema() {
    let manifest = manifest();
    let config = DoctorConfig::new().with_file_path("deploy.tx");
    let result = validate_source(RUNBOOK, "deploy.tx", &test_addons(), Some(&manifest), &config);
    let value = to_json_value(&result);

    assert_eq!(value["success"], false);
    let errors = value["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    for error in errors {
        for field in [
            "level",
            "category",
            "code",
            "message",
            "file",
            "line",
            "column",
            "context",
            "related_locations",
            "documentation",
        ] {
            assert!(error.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(error["level"], "error");
        assert_eq!(error["file"], "deploy.tx");
    }

    let flow_error = errors.iter().find(|e| e["category"] == "flow_consistency").unwrap();
    assert_eq!(flow_error["message"], "Flow 'mainnet' missing input 'gas'");
    assert_eq!(flow_error["line"], 6);
    assert_eq!(flow_error["related_locations"][0]["line"], 16);

    let field_error = errors.iter().find(|e| e["code"] == "invalid_output_field").unwrap();
    assert_eq!(field_error["line"], 21);
}

#[test]
fn test_report_formats_agree_on_failure() {
    let manifest = manifest();
    let config = DoctorConfig::new().with_file_path("deploy.tx");
    let result = validate_source(RUNBOOK, "deploy.tx", &test_addons(), Some(&manifest), &config);

    assert_eq!(exit_code(&result), 1);
    let pretty = render(&result, Format::Pretty).unwrap();
    assert!(pretty.starts_with("Found 2 issue(s):"));
    let quickfix = render_quickfix(&result);
    assert_eq!(quickfix.lines().filter(|line| line.contains(": error: ")).count(), 2);
    assert!(quickfix.lines().all(|line| line.starts_with("deploy.tx:")));
}

#[test]
fn test_clean_runbook_exit_code() {
    let result = RunbookBuilder::new()
        .action("send", "evm::send_eth")
        .input("amount", "1")
        .output("hash", "action.send.tx_hash")
        .validate();

    assert_eq!(exit_code(&result), 0);
    assert_eq!(render(&result, Format::Pretty).unwrap(), "✓ No issues found!\n");
}

#[test]
fn test_validation_is_deterministic() {
    let addons = test_addons();
    let manifest = manifest();
    let config = DoctorConfig::new().with_file_path("deploy.tx");
    let first = validate_source(RUNBOOK, "deploy.tx", &addons, Some(&manifest), &config);
    let second = validate_source(RUNBOOK, "deploy.tx", &addons, Some(&manifest), &config);

    assert_eq!(to_json_value(&first), to_json_value(&second));
}

#[test]
fn test_concurrent_validation_yields_identical_results() {
    let addons = test_addons();
    let manifest = manifest();
    let config = DoctorConfig::new().with_file_path("deploy.tx");
    let expected = validate_source(RUNBOOK, "deploy.tx", &addons, Some(&manifest), &config);

    let results = thread::scope(|scope| {
        let handles = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    validate_source(RUNBOOK, "deploy.tx", &addons, Some(&manifest), &config)
                })
            })
            .collect::<Vec<_>>();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect::<Vec<_>>()
    });

    for result in results {
        assert_eq!(result, expected);
    }
}
