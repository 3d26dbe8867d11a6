mod common;

use common::{ClassBuilder, temp_dir, write_file, write_jar};
use serde_json::Value;
use std::path::Path;
use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_class-refs");

fn run_json(args: &[&str]) -> anyhow::Result<Value> {
    let out = Command::new(BIN).args(args).env_remove("RUST_LOG").output()?;
    if !out.status.success() {
        return Err(anyhow::anyhow!(
            "command failed: status={:?}, stderr={}",
            out.status.code(),
            String::from_utf8_lossy(&out.stderr)
        ));
    }
    Ok(serde_json::from_slice(&out.stdout)?)
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn service_class() -> Vec<u8> {
    let mut b = ClassBuilder::new("com/example/Service", Some("com/example/Base"));
    let nullable = b.annotations(false, &["Ljavax/annotation/Nullable;"]);
    b.field("items", "Ljava/util/List;", vec![nullable]);
    b.build()
}

#[test]
fn jar_command_writes_report_and_prints_summary() -> anyhow::Result<()> {
    let dir = temp_dir("cli_jar");
    let jar = dir.join("app.jar");
    let service = service_class();
    write_jar(
        &jar,
        &[
            ("com/example/", &b""[..]),
            ("com/example/Service.class", service.as_slice()),
            ("META-INF/MANIFEST.MF", &b"Manifest-Version: 1.0\n"[..]),
        ],
    )?;
    write_file(
        &dir.join("res/layout/main.xml"),
        br#"<root><com.example.CustomView/><Button/></root>"#,
    )?;
    write_file(&dir.join("res/values/strings.xml"), b"<resources/>")?;

    let output = dir.join("reports/refs.txt");
    let summary = run_json(&[
        "--threads",
        "2",
        "jar",
        arg(&jar),
        "-o",
        arg(&output),
        "--res",
        arg(&dir.join("res")),
    ])?;

    assert_eq!(summary["class_units"], 1);
    assert_eq!(summary["layout_files"], 1);
    assert_eq!(summary["references"], 3);
    assert_eq!(summary["output"], arg(&output));
    assert_eq!(
        std::fs::read_to_string(&output)?,
        "com.example.Base\ncom.example.CustomView\njavax.annotation.Nullable"
    );

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn classes_command_walks_directories() -> anyhow::Result<()> {
    let dir = temp_dir("cli_classes");
    write_file(&dir.join("classes/com/example/Service.class"), &service_class())?;
    write_file(&dir.join("classes/com/example/notes.txt"), b"not a class")?;

    let mut caster = ClassBuilder::with_constructor("com/example/Caster");
    let [hi, lo] = caster.class("com/example/Target").to_be_bytes();
    let code = caster.code(&[0x2b, 0xc0, hi, lo, 0xb0], &[]);
    caster.method("cast", "(Ljava/lang/Object;)Ljava/lang/Object;", vec![code]);
    let loose = dir.join("Caster.class");
    write_file(&loose, &caster.build())?;

    let output = dir.join("refs.txt");
    let summary = run_json(&[
        "-q",
        "classes",
        arg(&dir.join("classes")),
        arg(&loose),
        "-o",
        arg(&output),
    ])?;

    assert_eq!(summary["class_units"], 2);
    assert_eq!(
        std::fs::read_to_string(&output)?,
        "com.example.Base\ncom.example.Target\njavax.annotation.Nullable"
    );

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn failed_run_exits_non_zero_and_keeps_previous_report() -> anyhow::Result<()> {
    let dir = temp_dir("cli_failure");
    let jar = dir.join("app.jar");
    let service = service_class();
    write_jar(
        &jar,
        &[
            ("com/example/Service.class", service.as_slice()),
            ("com/example/Broken.class", &b"\xCA\xFE\xBA\xBE\x00"[..]),
        ],
    )?;
    let output = dir.join("refs.txt");
    std::fs::write(&output, "previous")?;

    let out = Command::new(BIN)
        .args(["jar", arg(&jar), "-o", arg(&output)])
        .output()?;

    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("com/example/Broken.class"), "{stderr}");
    assert_eq!(std::fs::read_to_string(&output)?, "previous");

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}

#[test]
fn missing_output_argument_is_a_usage_error() -> anyhow::Result<()> {
    let out = Command::new(BIN).args(["jar", "app.jar"]).output()?;
    assert_eq!(out.status.code(), Some(2));
    Ok(())
}
