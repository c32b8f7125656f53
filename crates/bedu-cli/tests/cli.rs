//! Integration tests for the `bedu` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const INVOICE: &str = "\
DISTRIBUIDORA DEL CARIBE SRL
RNC 1-01-12345-6
REF CODIGO CANT DESCRIPCION PRECIO ITBIS IMPORTE

1001 A200 4 Widget Assembly 175.00 31.50 700.00
1002 B-7 10 Cable 2 m 0.875 0.1575 8.75
1003 C9 x Broken row 1.00 0.18 1.00
TOTAL 708.75
";

/// Command isolated from the user's configuration directory.
fn cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bedu").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .current_dir(home);
    cmd
}

fn write_invoice(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn files_with_extension(dir: &Path, ext: &str) -> Vec<std::path::PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(ext))
        .collect()
}

#[test]
fn process_text_invoice_to_csv() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);
    let output = tmp.path().join("out.csv");

    cmd(tmp.path())
        .args(["process", input.to_str().unwrap(), "-o", output.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 records"))
        .stdout(predicate::str::contains("out.csv"));

    let csv = fs::read_to_string(&output).unwrap();
    assert_eq!(
        csv,
        "CODIGO,DESCRIPCION,PRECIO,CANTIDAD,IMPORTE,ITBIS\n\
         A200,Widget Assembly,250,4,1000,180\n\
         B-7,Cable 2 m,1.25,10,12.5,2.25\n"
    );
}

#[test]
fn process_reports_rejected_lines() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);
    let output = tmp.path().join("out.json");

    cmd(tmp.path())
        .args([
            "process",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--show-skipped",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("line 7"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["CODIGO"], "A200");
}

#[test]
fn process_with_custom_divisor() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);
    let output = tmp.path().join("out.csv");

    cmd(tmp.path())
        .args([
            "process",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--divisor",
            "0.5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("divisor 0.5"));

    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.contains("A200,Widget Assembly,350,4,1400,252"));
}

#[test]
fn process_rejects_zero_divisor() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);

    cmd(tmp.path())
        .args(["process", input.to_str().unwrap(), "--divisor=0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("divisor must be greater than zero"));

    assert!(files_with_extension(tmp.path(), "xlsx").is_empty());
}

#[test]
fn process_rejects_divisor_out_of_bounds() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);

    cmd(tmp.path())
        .args(["process", input.to_str().unwrap(), "--divisor", "25"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pricing.divisor"));
}

#[test]
fn process_noise_only_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "notes.txt", "Gracias por su compra\n\nTOTAL 0\n");

    cmd(tmp.path())
        .args(["process", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No processable invoice lines"));

    assert!(files_with_extension(tmp.path(), "xlsx").is_empty());
}

#[test]
fn process_missing_input_fails() {
    let tmp = TempDir::new().unwrap();

    cmd(tmp.path())
        .args(["process", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_unsupported_extension_fails() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "invoice.docx", INVOICE);

    cmd(tmp.path())
        .args(["process", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn process_preview_prints_table() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);
    let output = tmp.path().join("out.csv");

    cmd(tmp.path())
        .args([
            "process",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--preview",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("CODIGO"))
        .stdout(predicate::str::contains("A200"))
        .stdout(predicate::str::contains("Widget Assembly"));
}

#[test]
fn process_default_output_name_is_unique_xlsx() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);

    cmd(tmp.path())
        .args(["process", input.to_str().unwrap()])
        .assert()
        .success();

    let outputs = files_with_extension(tmp.path(), "xlsx");
    assert_eq!(outputs.len(), 1);
    let name = outputs[0].file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("cotizacion_procesada_"), "{name}");
    assert!(fs::read(&outputs[0]).unwrap().starts_with(b"PK"));
}

#[test]
fn config_init_then_use_explicit_file() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("bedu.json");
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);
    let output = tmp.path().join("out.csv");

    cmd(tmp.path())
        .args(["config", "init", "--output", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    cmd(tmp.path())
        .args(["config", "init", "--output", config.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    cmd(tmp.path())
        .args(["-c", config.to_str().unwrap(), "config", "set", "pricing.divisor", "0.5"])
        .assert()
        .success();

    cmd(tmp.path())
        .args(["-c", config.to_str().unwrap(), "config", "get", "pricing.divisor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.5"));

    cmd(tmp.path())
        .args([
            "-c",
            config.to_str().unwrap(),
            "process",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let csv = fs::read_to_string(&output).unwrap();
    assert!(csv.contains("A200,Widget Assembly,350,4,1400,252"));
}

#[test]
fn config_set_rejects_invalid_values() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("bedu.json");

    cmd(tmp.path())
        .args(["-c", config.to_str().unwrap(), "config", "set", "pricing.divisor", "0"])
        .assert()
        .failure();

    cmd(tmp.path())
        .args(["-c", config.to_str().unwrap(), "config", "set", "pricing.nope", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));

    assert!(!config.exists());
}

#[test]
fn config_path_reports_missing_file() {
    let tmp = TempDir::new().unwrap();

    cmd(tmp.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not created"))
        .stdout(predicate::str::contains("bedu config init"));
}

#[test]
fn batch_processes_directory_with_summary() {
    let tmp = TempDir::new().unwrap();
    let inputs = tmp.path().join("in");
    let outputs = tmp.path().join("out");
    fs::create_dir(&inputs).unwrap();
    write_invoice(&inputs, "first.txt", INVOICE);
    write_invoice(&inputs, "second.txt", "nothing to see here\n");
    let pattern = format!("{}/*.txt", inputs.display());

    cmd(tmp.path())
        .args([
            "batch",
            &pattern,
            "--output-dir",
            outputs.to_str().unwrap(),
            "--format",
            "csv",
            "--summary",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"))
        .stdout(predicate::str::contains("1 exported"));

    let csvs = files_with_extension(&outputs, "csv");
    assert!(
        csvs.iter().any(|p| p
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("first_cotizacion_procesada"))),
        "{csvs:?}"
    );

    let summary = fs::read_to_string(outputs.join("summary.csv")).unwrap();
    let mut lines = summary.lines();
    assert_eq!(
        lines.next(),
        Some("filename,status,records,rejected_lines,output,processing_time_ms,error")
    );
    assert!(summary.contains(",exported,2,2,"));
    assert!(summary.contains(",empty,0,0,"));
}

#[test]
fn batch_without_matches_fails() {
    let tmp = TempDir::new().unwrap();
    let pattern = format!("{}/*.pdf", tmp.path().display());

    cmd(tmp.path())
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

/// Single-page PDF whose page has no text at all.
fn blank_pdf() -> Vec<u8> {
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT\nET\n".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Config file with timestamped output names turned off.
fn config_without_stamps(home: &Path) -> std::path::PathBuf {
    let config = home.join("bedu.json");
    cmd(home)
        .args(["config", "init", "--output", config.to_str().unwrap()])
        .assert()
        .success();
    cmd(home)
        .args(["-c", config.to_str().unwrap(), "config", "set", "output.unique_names", "false"])
        .assert()
        .success();
    config
}

fn file_names(dir: &Path, ext: &str) -> Vec<String> {
    let mut names: Vec<String> = files_with_extension(dir, ext)
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
        .collect();
    names.sort();
    names
}

#[test]
fn process_pdf_without_text_layer_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("scan.pdf");
    fs::write(&input, blank_pdf()).unwrap();

    cmd(tmp.path())
        .args(["process", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No processable invoice lines"))
        .stdout(predicate::str::contains("scanned document"));

    assert!(files_with_extension(tmp.path(), "xlsx").is_empty());
}

#[test]
fn process_creates_output_dir() {
    let tmp = TempDir::new().unwrap();
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);
    let output_dir = tmp.path().join("reports").join("octubre");

    cmd(tmp.path())
        .args([
            "process",
            input.to_str().unwrap(),
            "--output-dir",
            output_dir.to_str().unwrap(),
            "-f",
            "csv",
        ])
        .assert()
        .success();

    assert_eq!(files_with_extension(&output_dir, "csv").len(), 1);
}

#[test]
fn process_twice_keeps_both_outputs() {
    let tmp = TempDir::new().unwrap();
    let config = config_without_stamps(tmp.path());
    let input = write_invoice(tmp.path(), "invoice.txt", INVOICE);

    for _ in 0..2 {
        cmd(tmp.path())
            .args(["-c", config.to_str().unwrap(), "process", input.to_str().unwrap(), "-f", "csv"])
            .assert()
            .success();
    }

    assert_eq!(
        file_names(tmp.path(), "csv"),
        vec!["cotizacion_procesada.csv", "cotizacion_procesada_2.csv"]
    );
}

#[test]
fn batch_keeps_outputs_of_inputs_with_same_name() {
    let tmp = TempDir::new().unwrap();
    let config = config_without_stamps(tmp.path());
    let outputs = tmp.path().join("out");
    for dir in ["a", "b"] {
        let dir = tmp.path().join("in").join(dir);
        fs::create_dir_all(&dir).unwrap();
        write_invoice(&dir, "factura.txt", INVOICE);
    }
    let pattern = format!("{}/in/*/factura.txt", tmp.path().display());

    cmd(tmp.path())
        .args([
            "-c",
            config.to_str().unwrap(),
            "batch",
            &pattern,
            "-o",
            outputs.to_str().unwrap(),
            "-f",
            "csv",
            "--summary",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 exported"));

    assert_eq!(
        file_names(&outputs, "csv"),
        vec![
            "a_factura_cotizacion_procesada.csv",
            "b_factura_cotizacion_procesada.csv",
            "summary.csv",
        ]
    );

    let summary = fs::read_to_string(outputs.join("summary.csv")).unwrap();
    assert!(summary.contains("a_factura_cotizacion_procesada.csv"));
    assert!(summary.contains("b_factura_cotizacion_procesada.csv"));
}
