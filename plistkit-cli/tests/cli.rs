//! End-to-end tests of the `plistkit` binary.

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn plistkit() -> Command {
    let mut cmd = Command::cargo_bin("plistkit").expect("plistkit binary");
    cmd.env_remove("PLISTKIT_DEVELOPER_DIR")
        .env_remove("PLISTKIT_HERMETIC");
    cmd
}

const BASE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleExecutable</key>
	<string>${EXECUTABLE_NAME}</string>
	<key>CFBundleName</key>
	<string>${PRODUCT_NAME}</string>
	<key>NSHumanReadableCopyright</key>
	<string>${COMPANY}</string>
</dict>
</plist>
"#;

fn create_temp_dir() -> TempDir {
    let td = tempfile::tempdir().expect("tempdir");
    fs::write(td.path().join("Base.plist"), BASE).unwrap();
    fs::write(
        td.path().join("Overlay.json"),
        r#"{"CFBundleName": "Overridden", "LSRequiresIPhoneOS": true}"#,
    )
    .unwrap();
    td
}

fn load(path: &Path) -> plist::Dictionary {
    plist::Value::from_file(path)
        .expect("readable plist")
        .into_dictionary()
        .expect("dictionary root")
}

#[test]
fn test_merge_uses_helper_argument_shape() {
    let temp = create_temp_dir();

    plistkit()
        .current_dir(temp.path())
        .args(["merge", "-f=xml1", "-o=gen/merged.plist", "Base.plist", "Overlay.json"])
        .assert()
        .success();

    let merged = load(&temp.path().join("gen/merged.plist"));
    let keys: Vec<_> = merged.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "CFBundleExecutable",
            "CFBundleName",
            "NSHumanReadableCopyright",
            "LSRequiresIPhoneOS"
        ]
    );
    assert_eq!(
        merged.get("CFBundleName").and_then(|v| v.as_string()),
        Some("Overridden")
    );
}

#[test]
fn test_merge_without_templates_is_usage_error() {
    let temp = create_temp_dir();

    plistkit()
        .current_dir(temp.path())
        .args(["merge", "-f=xml1", "-o=out.plist"])
        .assert()
        .code(2);
}

#[test]
fn test_substitute_last_value_wins() {
    let temp = create_temp_dir();

    plistkit()
        .current_dir(temp.path())
        .args([
            "substitute",
            "-f=binary1",
            "-o=Info.plist",
            "-t=Base.plist",
            "-s=EXECUTABLE_NAME=App",
            "-s=PRODUCT_NAME=First",
            "-s=PRODUCT_NAME=Second",
            "-s=COMPANY=",
        ])
        .assert()
        .success();

    let bytes = fs::read(temp.path().join("Info.plist")).unwrap();
    assert!(bytes.starts_with(b"bplist00"));
    let doc = load(&temp.path().join("Info.plist"));
    assert_eq!(doc.get("CFBundleName").and_then(|v| v.as_string()), Some("Second"));
    assert_eq!(
        doc.get("NSHumanReadableCopyright").and_then(|v| v.as_string()),
        Some("")
    );
}

#[test]
fn test_substitute_unresolved_token_exits_2() {
    let temp = create_temp_dir();

    plistkit()
        .current_dir(temp.path())
        .args([
            "substitute",
            "-f=xml1",
            "-o=Info.plist",
            "-t=Base.plist",
            "-s=EXECUTABLE_NAME=App",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("PRODUCT_NAME"));

    assert!(!temp.path().join("Info.plist").exists());
}

#[test]
fn test_substitute_reads_config_substitutions() {
    let temp = create_temp_dir();
    fs::write(
        temp.path().join("plistkit.toml"),
        r#"
[substitutions]
COMPANY = "Example Corp"
PRODUCT_NAME = "FromConfig"
"#,
    )
    .unwrap();

    plistkit()
        .current_dir(temp.path())
        .args([
            "substitute",
            "-f=xml1",
            "-o=Info.plist",
            "-t=Base.plist",
            "-s=EXECUTABLE_NAME=App",
            "-s=PRODUCT_NAME=FromCli",
        ])
        .assert()
        .success();

    let doc = load(&temp.path().join("Info.plist"));
    assert_eq!(
        doc.get("NSHumanReadableCopyright").and_then(|v| v.as_string()),
        Some("Example Corp")
    );
    assert_eq!(doc.get("CFBundleName").and_then(|v| v.as_string()), Some("FromCli"));
}

#[test]
fn test_convert_native_to_json() {
    let temp = create_temp_dir();

    plistkit()
        .current_dir(temp.path())
        .args(["convert", "--native", "--format", "json", "-o", "Base.json", "Base.plist"])
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("Base.json")).unwrap())
            .unwrap();
    assert_eq!(json["CFBundleExecutable"], "${EXECUTABLE_NAME}");
}

#[test]
fn test_convert_native_from_config_default() {
    let temp = create_temp_dir();
    fs::write(
        temp.path().join("plistkit.toml"),
        "[defaults]\nformat = \"binary1\"\nconverter = \"native\"\n",
    )
    .unwrap();

    plistkit()
        .current_dir(temp.path())
        .args(["convert", "-o", "Base.bin", "Base.plist"])
        .assert()
        .success();

    let bytes = fs::read(temp.path().join("Base.bin")).unwrap();
    assert!(bytes.starts_with(b"bplist00"));
}

#[test]
fn test_convert_malformed_input_exits_2() {
    let temp = create_temp_dir();
    fs::write(temp.path().join("Broken.plist"), "<plist><dict><key>").unwrap();

    plistkit()
        .current_dir(temp.path())
        .args(["convert", "--native", "--format", "xml1", "-o", "out.plist", "Broken.plist"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Broken.plist"));
}

#[test]
fn test_hermetic_without_developer_dir_fails() {
    let temp = create_temp_dir();

    plistkit()
        .current_dir(temp.path())
        .args(["--hermetic", "convert", "--native", "-o", "x.plist", "Base.plist"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("developer_dir"));
}

#[test]
fn test_hermetic_env_accepts_boolish_values() {
    let temp = create_temp_dir();

    for value in ["1", "yes", "on"] {
        plistkit()
            .current_dir(temp.path())
            .env("PLISTKIT_HERMETIC", value)
            .args(["convert", "--native", "-o", "x.plist", "Base.plist"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("developer_dir"));
    }

    plistkit()
        .current_dir(temp.path())
        .env("PLISTKIT_HERMETIC", "0")
        .args(["convert", "--native", "-o", "x.plist", "Base.plist"])
        .assert()
        .success();
}

#[test]
fn test_info_plist_generates_chain() {
    let temp = create_temp_dir();
    fs::write(temp.path().join("plistkit.toml"), "[substitutions]\nCOMPANY = \"Example\"\n")
        .unwrap();

    plistkit()
        .current_dir(temp.path())
        .args([
            "info-plist",
            "--name",
            "app_info",
            "--executable-name",
            "App",
            "--deployment-target",
            "15.0",
            "--xcode-version",
            "15.2",
            "--format",
            "xml1",
            "--gen-dir",
            "gen",
            "Base.plist",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("app_info.plist"));

    assert!(temp.path().join("gen/app_info_merged.plist").exists());
    let doc = load(&temp.path().join("gen/app_info.plist"));
    assert_eq!(doc.get("CFBundleExecutable").and_then(|v| v.as_string()), Some("App"));
    assert_eq!(doc.get("CFBundleName").and_then(|v| v.as_string()), Some("App"));
    assert_eq!(
        doc.get("NSHumanReadableCopyright").and_then(|v| v.as_string()),
        Some("Example")
    );
}

#[test]
fn test_info_plist_writes_report_on_failure() {
    let temp = create_temp_dir();

    plistkit()
        .current_dir(temp.path())
        .args([
            "info-plist",
            "--name",
            "app_info",
            "--executable-name",
            "App",
            "--deployment-target",
            "15.0",
            "--gen-dir",
            "gen",
            "--report",
            "run.json",
            "Base.plist",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("COMPANY"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("run.json")).unwrap())
            .unwrap();
    assert_eq!(report["schema"], "plistkit.run.v1");
    assert_eq!(report["rules"][0]["rule"], "app_info_merge");
    assert_eq!(report["rules"][0]["status"], "succeeded");
    assert_eq!(report["rules"][1]["status"], "failed");
    assert!(!temp.path().join("gen/app_info.plist").exists());
}

#[test]
fn test_rules_prints_ordered_graph() {
    let temp = create_temp_dir();

    let output = plistkit()
        .current_dir(temp.path())
        .args([
            "rules",
            "--name",
            "app_info",
            "--executable-name",
            "App",
            "--deployment-target",
            "15.0",
            "--gen-dir",
            "out/gen",
            "--relative-to",
            "out",
            "Base.plist",
            "Overlay.json",
        ])
        .output()
        .expect("run plistkit");
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(doc["schema"], "plistkit.rules.v1");
    let rules = doc["rules"].as_array().expect("rules array");
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0]["name"], "app_info_merge");
    assert_eq!(rules[0]["kind"], "merge_plist");
    assert_eq!(rules[0]["sources"][0], "../Base.plist");
    assert_eq!(rules[0]["outputs"][0], "gen/app_info_merged.plist");
    assert_eq!(rules[0]["args"][2], "-o=gen/app_info_merged.plist");
    assert_eq!(rules[0]["args"][3], "../Base.plist");
    assert_eq!(rules[1]["name"], "app_info_substitute");
    assert_eq!(rules[1]["sources"][0], "gen/app_info_merged.plist");
    assert_eq!(rules[1]["outputs"][0], "gen/app_info.plist");
    let substitute_args: Vec<&str> = rules[1]["args"]
        .as_array()
        .expect("args array")
        .iter()
        .filter_map(|a| a.as_str())
        .collect();
    assert!(substitute_args.contains(&"-o=gen/app_info.plist"));
    assert!(substitute_args.contains(&"-t=gen/app_info_merged.plist"));
    assert!(!temp.path().join("out").exists());
}

#[cfg(unix)]
mod compile_ib {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::os::unix::fs::PermissionsExt;

    /// Stand-in compiler: copies `--input` to `--output`, failing when the
    /// input mentions "broken".
    const FAKE_IBTOOL: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    --input) input="$2"; shift 2 ;;
    --output) output="$2"; shift 2 ;;
    *) shift ;;
  esac
done
if grep -q broken "$input"; then
  echo "$input: compilation failed" >&2
  exit 1
fi
cp "$input" "$output"
"#;

    fn install_fake_ibtool(dir: &Path) {
        let tool = dir.join("fake-ibtool");
        fs::write(&tool, FAKE_IBTOOL).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        fs::write(
            dir.join("plistkit.toml"),
            format!("[toolchain]\nib_compiler = {:?}\n", tool.to_str().unwrap()),
        )
        .unwrap();
    }

    #[test]
    fn test_compile_ib_continues_past_failures() {
        let temp = create_temp_dir();
        install_fake_ibtool(temp.path());
        fs::write(temp.path().join("One.xib"), "one").unwrap();
        fs::write(temp.path().join("Two.xib"), "broken").unwrap();
        fs::write(temp.path().join("Three.xib"), "three").unwrap();

        plistkit()
            .current_dir(temp.path())
            .args([
                "compile-ib",
                "--output-dir",
                "nibs",
                "--report",
                "report.json",
                "One.xib",
                "Two.xib",
                "Three.xib",
                "--",
                "--target-device",
                "iphone",
            ])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("1 of 3 sources failed"));

        assert_eq!(fs::read_to_string(temp.path().join("nibs/One.nib")).unwrap(), "one");
        assert_eq!(fs::read_to_string(temp.path().join("nibs/Three.nib")).unwrap(), "three");
        assert!(!temp.path().join("nibs/Two.nib").exists());

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(temp.path().join("report.json")).unwrap())
                .unwrap();
        assert_eq!(report["schema"], "plistkit.batch.v1");
        assert_eq!(report["summary"]["succeeded"], 2);
        assert_eq!(report["summary"]["failed"], 1);
        assert_eq!(report["results"][1]["status"], "failed");
    }

    #[test]
    fn test_compile_ib_all_succeed() {
        let temp = create_temp_dir();
        install_fake_ibtool(temp.path());
        fs::write(temp.path().join("Main.storyboard"), "main").unwrap();

        plistkit()
            .current_dir(temp.path())
            .args([
                "compile-ib",
                "--output-dir",
                "out",
                "--output-extension",
                ".storyboardc",
                "Main.storyboard",
            ])
            .assert()
            .success();

        assert!(temp.path().join("out/Main.storyboardc").exists());
    }
}
