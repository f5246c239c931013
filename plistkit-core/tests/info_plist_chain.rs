//! Info.plist generation and conversion, end to end on a scratch directory.

use camino::{Utf8Path, Utf8PathBuf};
use plistkit_core::adapters::FsWritePort;
use plistkit_core::convert::{Converter, NativeConverter};
use plistkit_core::executor::LocalExecutor;
use plistkit_core::info_plist::{InfoPlistSpec, Platform, ToolchainInfo};
use plistkit_core::invocation::{Invocation, ToolOutput};
use plistkit_core::ports::ToolRunner;
use plistkit_core::settings::Toolchain;
use plistkit_core::{PipelineError, PlistFormat, SubstitutionSet};
use plistkit_plist::{PlistError, Value};
use plistkit_types::report::InvocationStatus;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

struct Unused;

impl ToolRunner for Unused {
    fn run(&self, invocation: &Invocation) -> anyhow::Result<ToolOutput> {
        panic!("unexpected tool call: {invocation}");
    }
}

fn scratch() -> (TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    (temp, root)
}

const BASE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>CFBundleExecutable</key>
	<string>${EXECUTABLE_NAME}</string>
	<key>CFBundleIdentifier</key>
	<string>org.example.${PRODUCT_NAME:rfc1034identifier}</string>
	<key>CFBundleName</key>
	<string>${PRODUCT_NAME}</string>
	<key>DTXcode</key>
	<string>${XCODE_VERSION}</string>
	<key>MinimumOSVersion</key>
	<string>${IOS_DEPLOYMENT_TARGET}</string>
</dict>
</plist>
"#;

const OVERLAY: &str = r#"{
  "CFBundleShortVersionString": "${VERSION}",
  "UIRequiredDeviceCapabilities": ["arm64"]
}"#;

fn spec(root: &Utf8Path) -> InfoPlistSpec {
    let base = root.join("templates/Info.plist");
    let overlay = root.join("templates/Overlay.json");
    fs::create_dir_all(root.join("templates")).unwrap();
    fs::write(&base, BASE).unwrap();
    fs::write(&overlay, OVERLAY).unwrap();

    InfoPlistSpec {
        name: "app_info".to_string(),
        templates: vec![base, overlay],
        executable_name: "App".to_string(),
        product_name: Some("My App".to_string()),
        platform: Platform::Ios,
        deployment_target: "15.0".to_string(),
        toolchain: ToolchainInfo {
            build_machine_os_build: "23C71".to_string(),
            xcode_build: "15C500b".to_string(),
            xcode_version: "0152".to_string(),
        },
        extra_substitutions: SubstitutionSet::parse_all(["VERSION=2.1"]).unwrap(),
        format: PlistFormat::Binary,
        gen_dir: root.join("gen"),
    }
}

fn string_at<'a>(doc: &'a Value, key: &str) -> &'a str {
    doc.as_dictionary()
        .and_then(|d| d.get(key))
        .and_then(Value::as_string)
        .unwrap_or_else(|| panic!("missing string {key}"))
}

#[test]
fn generate_writes_substituted_binary_plist() {
    let (_temp, root) = scratch();
    let spec = spec(&root);

    let outcome = spec.generate(&FsWritePort).expect("generate");
    assert_eq!(outcome.output, root.join("gen/app_info.plist"));
    assert!(fs::read(&outcome.output).unwrap().starts_with(b"bplist00"));

    let doc = plistkit_plist::load(&outcome.output).unwrap();
    assert_eq!(string_at(&doc, "CFBundleExecutable"), "App");
    assert_eq!(string_at(&doc, "CFBundleIdentifier"), "org.example.My-App");
    assert_eq!(string_at(&doc, "CFBundleName"), "My App");
    assert_eq!(string_at(&doc, "DTXcode"), "0152");
    assert_eq!(string_at(&doc, "MinimumOSVersion"), "15.0");
    assert_eq!(string_at(&doc, "CFBundleShortVersionString"), "2.1");

    let keys: Vec<_> = doc.as_dictionary().unwrap().keys().cloned().collect();
    assert_eq!(keys.last().map(String::as_str), Some("UIRequiredDeviceCapabilities"));
}

#[test]
fn graph_execution_matches_direct_generation() {
    let (_temp, root) = scratch();
    let spec = spec(&root);

    let direct = spec.generate(&FsWritePort).unwrap();
    let direct_bytes = fs::read(&direct.output).unwrap();

    let graph = spec.into_graph(&Toolchain::default()).unwrap();
    let report = graph
        .execute(&LocalExecutor::new(&Unused, &FsWritePort))
        .into_result()
        .expect("graph run");

    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(fs::read(&direct.output).unwrap(), direct_bytes);
}

#[test]
fn generation_is_idempotent() {
    let (_temp, root) = scratch();
    let spec = spec(&root);

    let first = spec.generate(&FsWritePort).unwrap();
    let second = spec.generate(&FsWritePort).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_substitution_fails_the_substitute_rule() {
    let (_temp, root) = scratch();
    let mut spec = spec(&root);
    spec.extra_substitutions = SubstitutionSet::new();

    let run = spec
        .into_graph(&Toolchain::default())
        .unwrap()
        .execute(&LocalExecutor::new(&Unused, &FsWritePort));

    let statuses: Vec<_> = run.report.rules.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![InvocationStatus::Succeeded, InvocationStatus::Failed]
    );
    assert!(matches!(
        run.error,
        Some(PipelineError::Plist(PlistError::UnresolvedToken { ref key })) if key == "VERSION"
    ));
    assert!(spec.merged_path().exists());
    assert!(!spec.output_path().exists());
}

#[test]
fn native_conversion_round_trips_through_binary() {
    let (_temp, root) = scratch();
    let source = root.join("Info.plist");
    fs::write(&source, BASE).unwrap();

    let converter = NativeConverter::new(&FsWritePort);
    let binary = root.join("out/Info.bin.plist");
    let back = root.join("out/Info.xml.plist");
    converter.convert(&source, &binary, PlistFormat::Binary).unwrap();
    converter.convert(&binary, &back, PlistFormat::Xml).unwrap();

    assert_eq!(
        plistkit_plist::load(&source).unwrap(),
        plistkit_plist::load(&back).unwrap()
    );
}

#[test]
fn native_conversion_to_json_rejects_dates() {
    let (_temp, root) = scratch();
    let source = root.join("Dated.plist");
    fs::write(
        &source,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>Built</key>
	<date>2024-01-02T03:04:05Z</date>
</dict>
</plist>
"#,
    )
    .unwrap();
    let output = root.join("Dated.json");

    let err = NativeConverter::new(&FsWritePort)
        .convert(&source, &output, PlistFormat::Json)
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Plist(PlistError::UnsupportedJsonValue { .. })
    ));
    assert!(!output.exists());
}
