//! Integration tests for the stockmap CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get a stockmap command
fn stockmap() -> Command {
    let mut cmd = Command::cargo_bin("stockmap").unwrap();
    cmd.env_remove("STOCKMAP_PROJECT")
        .env_remove("STOCKMAP_DB")
        .env_remove("STOCKMAP_RESTOCK_DAYS")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper to create a test project in a temp directory
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    stockmap().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

fn write_file(tmp: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = tmp.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

const STOCK_SHEET: &str = "\
Relatório de contagem;;;
Código;Produto;Quantidade;Observação
H1;HERBICIDA ROUNDUP;50;falta 6
H2;HERBICIDA ZAP;30;
S1;SEMENTE SOJA;10;sobra 2
F1;FUNGICIDA FOX;20;2 avariados
;TOTAL;110;
";

const PARTIAL_SHEET: &str = "\
Código;Produto;Quantidade;Obs
H1;HERBICIDA ROUNDUP;50;
;OLEO MINERAL ASSIST;12;
";

const SALES_REPORT: &str = "\
GRUPO DE PRODUTO;PRODUTO;QTDD - VENDIDA;QTDD ESTOQUE
LUBRIFICANTES;501 - OLEO MOTOR 15W40;3;9
EPI;610 - LUVA NITRILICA;4;20
";

/// Project with the stock sheet loaded as a full upload
fn setup_loaded_project() -> TempDir {
    let tmp = setup_test_project();
    write_file(&tmp, "estoque.csv", STOCK_SHEET);
    stockmap()
        .current_dir(tmp.path())
        .args(["upload", "estoque.csv", "--full"])
        .assert()
        .success();
    tmp
}

fn upload_json(tmp: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = stockmap()
        .current_dir(tmp.path())
        .arg("upload")
        .args(args)
        .args(["-f", "json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "upload failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Init
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();

    stockmap()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized stockmap project"));

    assert!(tmp.path().join(".stockmap").is_dir());
    assert!(tmp.path().join(".stockmap/config.yaml").is_file());
    assert!(tmp.path().join(".stockmap/stock.db").is_file());
}

#[test]
fn test_init_twice_reports_existing_project() {
    let tmp = setup_test_project();

    stockmap()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_outside_project_fail() {
    let tmp = TempDir::new().unwrap();

    stockmap()
        .current_dir(tmp.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a stockmap project"));
}

// ============================================================================
// Upload
// ============================================================================

#[test]
fn test_full_upload_counts() {
    let tmp = setup_test_project();
    write_file(&tmp, "estoque.csv", STOCK_SHEET);

    let result = upload_json(&tmp, &["estoque.csv", "--full"]);
    assert_eq!(result["layout"], "stock");
    assert_eq!(result["new_count"], 4);
    assert_eq!(result["updated_count"], 0);
    assert_eq!(result["divergent_count"], 3);
    assert_eq!(result["skipped"], 1);
    assert_eq!(result["batch"]["kind"], "full");
    assert_eq!(result["batch"]["source_file_name"], "estoque.csv");
}

#[test]
fn test_full_upload_human_output() {
    let tmp = setup_test_project();
    write_file(&tmp, "estoque.csv", STOCK_SHEET);

    stockmap()
        .current_dir(tmp.path())
        .args(["upload", "estoque.csv", "--full"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed full upload of estoque.csv"))
        .stdout(predicate::str::contains("Divergent:"));
}

#[test]
fn test_partial_upload_updates_and_inserts() {
    let tmp = setup_loaded_project();
    write_file(&tmp, "parcial.csv", PARTIAL_SHEET);

    let result = upload_json(&tmp, &["parcial.csv"]);
    assert_eq!(result["batch"]["kind"], "partial");
    assert_eq!(result["updated_count"], 1);
    assert_eq!(result["new_count"], 1);
    assert_eq!(result["divergent_count"], 0);

    // H1 was recounted without a note, the others keep their state
    stockmap()
        .current_dir(tmp.path())
        .args(["list", "--status", "short", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("H1").not());

    stockmap()
        .current_dir(tmp.path())
        .args(["list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AUTO_OLEOMINERALASSIST"))
        .stdout(predicate::str::contains("S1\tSEMENTE SOJA\tSeeds\t10\t12\t+2\tover"));
}

#[test]
fn test_full_upload_replaces_records() {
    let tmp = setup_loaded_project();
    write_file(&tmp, "parcial.csv", PARTIAL_SHEET);

    stockmap()
        .current_dir(tmp.path())
        .args(["upload", "parcial.csv", "--full"])
        .assert()
        .success();

    stockmap()
        .current_dir(tmp.path())
        .args(["list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("H1"))
        .stdout(predicate::str::contains("S1").not());
}

#[test]
fn test_dry_run_saves_nothing() {
    let tmp = setup_loaded_project();
    write_file(&tmp, "parcial.csv", PARTIAL_SHEET);

    let result = upload_json(&tmp, &["parcial.csv", "--dry-run"]);
    assert_eq!(result["dry_run"], true);
    assert_eq!(result["new_count"], 1);

    stockmap()
        .current_dir(tmp.path())
        .args(["list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AUTO_OLEOMINERALASSIST").not());

    stockmap()
        .current_dir(tmp.path())
        .args(["history", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("parcial.csv").not());
}

#[test]
fn test_upload_unrecognized_layout_fails() {
    let tmp = setup_test_project();
    write_file(&tmp, "planilha.csv", "Nome;Valor\nabc;1\n");

    stockmap()
        .current_dir(tmp.path())
        .args(["upload", "planilha.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized spreadsheet layout"));

    stockmap()
        .current_dir(tmp.path())
        .args(["history", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("planilha.csv").not());
}

#[test]
fn test_upload_incomplete_stock_header_names_missing_column() {
    let tmp = setup_test_project();
    write_file(&tmp, "contagem.csv", "Produto;Valor\nHERBICIDA X;abc\n");

    stockmap()
        .current_dir(tmp.path())
        .args(["upload", "contagem.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no quantity column"))
        .stderr(predicate::str::contains("Produto, Valor"));
}

#[test]
fn test_upload_unsupported_file_type_fails() {
    let tmp = setup_test_project();
    write_file(&tmp, "estoque.pdf", "not a sheet");

    stockmap()
        .current_dir(tmp.path())
        .args(["upload", "estoque.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file type"));
}

#[test]
fn test_full_and_partial_conflict() {
    let tmp = setup_test_project();
    write_file(&tmp, "estoque.csv", STOCK_SHEET);

    stockmap()
        .current_dir(tmp.path())
        .args(["upload", "estoque.csv", "--full", "--partial"])
        .assert()
        .failure();
}

// ============================================================================
// Preview
// ============================================================================

#[test]
fn test_preview_works_outside_project() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp, "estoque.csv", STOCK_SHEET);

    stockmap()
        .current_dir(tmp.path())
        .args(["preview", "estoque.csv", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("H1\tHERBICIDA ROUNDUP\tHerbicides\t50\t44\t-6\tshort"))
        .stdout(predicate::str::contains("F1\tFUNGICIDA FOX\tFungicides\t20\t20\t0\tdamaged"));
}

#[test]
fn test_preview_divergent_only() {
    let tmp = TempDir::new().unwrap();
    write_file(&tmp, "estoque.csv", STOCK_SHEET);

    let output = stockmap()
        .current_dir(tmp.path())
        .args(["preview", "estoque.csv", "--divergent", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let codes: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["H1", "S1", "F1"]);
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_divergences_lists_non_ok_records() {
    let tmp = setup_loaded_project();

    stockmap()
        .current_dir(tmp.path())
        .args(["divergences", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("H1"))
        .stdout(predicate::str::contains("S1"))
        .stdout(predicate::str::contains("F1"))
        .stdout(predicate::str::contains("H2").not());
}

#[test]
fn test_damaged_lists_only_damaged() {
    let tmp = setup_loaded_project();

    stockmap()
        .current_dir(tmp.path())
        .args(["damaged", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("F1"))
        .stdout(predicate::str::contains("H1").not());
}

#[test]
fn test_list_filters() {
    let tmp = setup_loaded_project();

    stockmap()
        .current_dir(tmp.path())
        .args(["list", "--category", "herbicides", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("H1"))
        .stdout(predicate::str::contains("H2"))
        .stdout(predicate::str::contains("S1").not());

    stockmap()
        .current_dir(tmp.path())
        .args(["list", "--search", "soja", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("S1"))
        .stdout(predicate::str::contains("H1").not());
}

#[test]
fn test_list_json_output() {
    let tmp = setup_loaded_project();

    let output = stockmap()
        .current_dir(tmp.path())
        .args(["list", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 4);
}

#[test]
fn test_list_empty_project() {
    let tmp = setup_test_project();

    stockmap()
        .current_dir(tmp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stock records found"));
}

// ============================================================================
// Map
// ============================================================================

#[test]
fn test_map_shows_tiles() {
    let tmp = setup_loaded_project();

    stockmap()
        .current_dir(tmp.path())
        .arg("map")
        .assert()
        .success()
        .stdout(predicate::str::contains("HERBICIDES"))
        .stdout(predicate::str::contains("ROUNDUP"))
        .stdout(predicate::str::contains("44 (F 6)"))
        .stdout(predicate::str::contains("12 (S 2)"))
        .stdout(predicate::str::contains("20 · AV:2"));
}

#[test]
fn test_map_json_blocks() {
    let tmp = setup_loaded_project();

    let output = stockmap()
        .current_dir(tmp.path())
        .args(["map", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let map: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(map["summary"]["total"], 4);
    assert_eq!(map["summary"]["short"], 1);
    // herbicides hold 80 units, the heaviest block
    assert_eq!(map["blocks"][0]["category"], "herbicides");
    assert_eq!(map["blocks"][0]["total_system_quantity"], 80);
}

// ============================================================================
// Restock
// ============================================================================

#[test]
fn test_sales_report_queues_restock_once() {
    let tmp = setup_test_project();
    write_file(&tmp, "vendas.csv", SALES_REPORT);

    let result = upload_json(&tmp, &["vendas.csv"]);
    assert_eq!(result["layout"], "sales");
    assert_eq!(result["restock_count"], 2);

    stockmap()
        .current_dir(tmp.path())
        .args(["restock", "list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OLEO MOTOR 15W40"))
        .stdout(predicate::str::contains("LUVA NITRILICA"))
        .stdout(predicate::str::contains("pending"));

    // still unresolved, nothing new to queue
    let result = upload_json(&tmp, &["vendas.csv"]);
    assert_eq!(result["restock_count"], 0);
}

#[test]
fn test_restock_resolve() {
    let tmp = setup_test_project();
    write_file(&tmp, "vendas.csv", SALES_REPORT);
    upload_json(&tmp, &["vendas.csv"]);

    stockmap()
        .current_dir(tmp.path())
        .args(["restock", "resolve", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("resolved"));

    stockmap()
        .current_dir(tmp.path())
        .args(["restock", "list", "-f", "tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OLEO MOTOR 15W40").not())
        .stdout(predicate::str::contains("LUVA NITRILICA"));

    stockmap()
        .current_dir(tmp.path())
        .args(["restock", "resolve", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already resolved"));

    // resolved items are queued again by the next sales report
    let result = upload_json(&tmp, &["vendas.csv"]);
    assert_eq!(result["restock_count"], 1);
}

#[test]
fn test_full_upload_never_queues_restock() {
    let tmp = setup_test_project();
    write_file(&tmp, "vendas.csv", SALES_REPORT);

    let result = upload_json(&tmp, &["vendas.csv", "--full"]);
    assert_eq!(result["restock_count"], 0);
}

// ============================================================================
// History, status, reset
// ============================================================================

#[test]
fn test_history_lists_uploads() {
    let tmp = setup_loaded_project();
    write_file(&tmp, "parcial.csv", PARTIAL_SHEET);
    upload_json(&tmp, &["parcial.csv"]);

    let output = stockmap()
        .current_dir(tmp.path())
        .args(["history", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let batches: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let batches = batches.as_array().unwrap();
    assert_eq!(batches.len(), 2);
    // most recent first
    assert_eq!(batches[0]["source_file_name"], "parcial.csv");
    assert_eq!(batches[1]["kind"], "full");
}

#[test]
fn test_status_counters() {
    let tmp = setup_loaded_project();

    stockmap()
        .current_dir(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Stock Status"))
        .stdout(predicate::str::contains("estoque.csv"));

    let output = stockmap()
        .current_dir(tmp.path())
        .args(["status", "-f", "json"])
        .output()
        .unwrap();
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["stats"]["total"], 4);
    assert_eq!(status["stats"]["damaged"], 1);
    assert_eq!(status["stats"]["uploads"], 1);
}

#[test]
fn test_reset_with_yes() {
    let tmp = setup_loaded_project();

    stockmap()
        .current_dir(tmp.path())
        .args(["reset", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 record(s) removed"));

    let output = stockmap()
        .current_dir(tmp.path())
        .args(["status", "-f", "json"])
        .output()
        .unwrap();
    let status: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["stats"]["total"], 0);
    assert_eq!(status["stats"]["uploads"], 0);
}

// ============================================================================
// Config and completions
// ============================================================================

#[test]
fn test_project_config_sets_default_format() {
    let tmp = setup_loaded_project();
    fs::write(
        tmp.path().join(".stockmap/config.yaml"),
        "default_format: tsv\n",
    )
    .unwrap();

    stockmap()
        .current_dir(tmp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("code\tproduct"));
}

#[test]
fn test_config_show_reads_project_file() {
    let tmp = setup_test_project();
    fs::write(
        tmp.path().join(".stockmap/config.yaml"),
        "restock_expiry_days: 3\n",
    )
    .unwrap();

    stockmap()
        .current_dir(tmp.path())
        .args(["config", "show", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"restock_expiry_days\": 3"));
}

#[test]
fn test_completions_bash() {
    stockmap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stockmap"));
}
