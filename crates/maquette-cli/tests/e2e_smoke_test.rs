//! End-to-end smoke tests for the CLI entry point.

use maquette_cli::Args;

fn args(input: &str, output: &str) -> Args {
    Args {
        input: input.to_owned(),
        output: output.to_owned(),
        config: None,
        restricted: false,
        log_level: "off".to_owned(),
    }
}

#[test]
fn parses_a_workspace_and_writes_the_dump() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("workspace.dsl");
    let output = dir.path().join("out.txt");
    std::fs::write(
        &input,
        r#"
workspace "Shop" {
    model {
        customer = person "Customer"
        shop = softwareSystem "Web Shop"
        customer -> shop "Places orders"
    }
}
"#,
    )
    .unwrap();

    let args = args(&input.to_string_lossy(), &output.to_string_lossy());
    maquette_cli::run(&args).expect("CLI run should succeed");

    let dump = std::fs::read_to_string(&output).expect("Output file should exist");
    assert!(dump.contains("workspace \"Shop\""));
    assert!(dump.contains("Customer -> Web Shop: Places orders"));
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("missing.dsl");
    let output = dir.path().join("out.txt");

    let args = args(&input.to_string_lossy(), &output.to_string_lossy());
    assert!(maquette_cli::run(&args).is_err());
}

#[test]
fn restricted_flag_rejects_local_includes() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("workspace.dsl");
    let output = dir.path().join("out.txt");
    std::fs::write(
        &input,
        "workspace {\n    model {\n        !include people.dsl\n    }\n}\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("people.dsl"), "person \"Customer\"\n").unwrap();

    let mut restricted = args(&input.to_string_lossy(), &output.to_string_lossy());
    restricted.restricted = true;
    assert!(maquette_cli::run(&restricted).is_err());

    let unrestricted = args(&input.to_string_lossy(), &output.to_string_lossy());
    maquette_cli::run(&unrestricted).expect("Unrestricted run should succeed");
    let dump = std::fs::read_to_string(&output).unwrap();
    assert!(dump.contains("Person \"Customer\""));
}
