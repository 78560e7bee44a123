//! Integration tests for the creq CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use rust_xlsxwriter::Workbook;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const REFERENCE_FILE: &str = "pedidos/Mapeamento de Racks - Cabos.xlsx";

/// Helper to get a creq command isolated from the user's environment
fn creq(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("creq").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env("CREQ_AUTHOR", "Test Author")
        .env_remove("CREQ_REFERENCE_PATH")
        .env_remove("CREQ_HOSTED")
        .env_remove("CREQ_GIT_TOKEN")
        .env_remove("CREQ_LOG");
    cmd
}

fn write_reference(path: &Path) {
    let headers = [
        "RACK",
        "CÓD Yazaki",
        "Codigo Cabo",
        "Secção",
        "Cor",
        "Cliente",
        "Locação",
        "Projeto",
        "Cod OES",
    ];
    let rows = [
        ["R-01", "7000123", "CB-10", "0.5", "AZ", "Renault", "A1", "P1", ""],
        ["R-01", "7000124", "CB-11", "0.75", "VM", "Renault", "A2", "", "OES-9"],
        ["R-02", "7000200", "CB-20", "1.0", "PT", "Ford", "B1", "", ""],
    ];

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Project").unwrap();
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string((r + 1) as u32, col as u16, *value).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

/// Helper to create a project with a reference spreadsheet in place
fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    creq(&tmp).arg("init").assert().success();
    write_reference(&tmp.path().join(REFERENCE_FILE));
    tmp
}

/// Record an order at Renault R-01 A1 and return its number
fn create_test_order(tmp: &TempDir) -> String {
    let output = creq(tmp)
        .args([
            "order", "new", "--client", "Renault", "--rack", "R-01", "--location", "A1",
            "--requester", "Bruno", "--qty", "3", "-f", "id",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    creq(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("order"))
        .stdout(predicate::str::contains("backup"))
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    creq(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("creq"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    creq(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("creq"));
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let tmp = TempDir::new().unwrap();
    creq(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized creq project"));

    assert!(tmp.path().join(".creq/config.yaml").is_file());
    assert!(tmp.path().join("pedidos/backup").is_dir());
}

#[test]
fn test_init_twice_reports_existing() {
    let tmp = setup_test_project();
    creq(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_init_git_skips_existing_repository() {
    let tmp = TempDir::new().unwrap();
    creq(&tmp)
        .args(["init", "--git"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized git repository"));
    assert!(tmp.path().join(".git").is_dir());
    assert!(tmp.path().join(".gitignore").is_file());

    creq(&tmp)
        .args(["init", "--git", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Git repository already exists"));
}

#[test]
fn test_commands_require_project() {
    let tmp = TempDir::new().unwrap();
    creq(&tmp)
        .args(["order", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a creq project"));
}

// ============================================================================
// Reference Tests
// ============================================================================

#[test]
fn test_ref_clients_sorted() {
    let tmp = setup_test_project();
    creq(&tmp)
        .args(["ref", "clients"])
        .assert()
        .success()
        .stdout("Ford\nRenault\n");
}

#[test]
fn test_ref_racks_case_insensitive() {
    let tmp = setup_test_project();
    creq(&tmp)
        .args(["ref", "racks", "--client", "renault"])
        .assert()
        .success()
        .stdout("R-01\n");
}

#[test]
fn test_ref_locations() {
    let tmp = setup_test_project();
    creq(&tmp)
        .args(["ref", "locations", "--client", "Renault", "--rack", "R-01"])
        .assert()
        .success()
        .stdout("A1\nA2\n");
}

#[test]
fn test_ref_list_csv() {
    let tmp = setup_test_project();
    creq(&tmp)
        .args(["ref", "list", "--client", "Ford", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("id,cliente,rack,locacao"))
        .stdout(predicate::str::contains("3,Ford,R-02,B1,7000200,CB-20"));
}

#[test]
fn test_ref_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    creq(&tmp).arg("init").assert().success();
    creq(&tmp)
        .args(["ref", "clients"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reference"));
}

// ============================================================================
// Order Tests
// ============================================================================

#[test]
fn test_order_numbers_are_sequential() {
    let tmp = setup_test_project();
    assert_eq!(create_test_order(&tmp), "REQ-001");

    creq(&tmp)
        .args([
            "order", "new", "-c", "Renault", "-r", "R-01", "-l", "A2", "--item", "1:4",
            "--item", "2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created order REQ-002 (2 item(s))"));

    assert!(tmp.path().join("pedidos/pedidos.xlsx").is_file());
}

#[test]
fn test_order_new_rejects_unknown_rack() {
    let tmp = setup_test_project();
    creq(&tmp)
        .args([
            "order", "new", "-c", "Renault", "-r", "R-99", "-l", "A1", "--requester", "Bruno",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in the reference spreadsheet"));
    assert!(!tmp.path().join("pedidos/pedidos.xlsx").exists());
}

#[test]
fn test_order_new_rejects_item_from_other_rack() {
    let tmp = setup_test_project();
    creq(&tmp)
        .args([
            "order", "new", "-c", "Renault", "-r", "R-01", "-l", "A1", "--item", "3",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("belongs to rack"));
}

#[test]
fn test_order_new_rejects_zero_quantity() {
    let tmp = setup_test_project();
    creq(&tmp)
        .args([
            "order", "new", "-c", "Renault", "-r", "R-01", "-l", "A1", "--qty", "0",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("quantity 0"));
}

#[test]
fn test_order_list_and_filters() {
    let tmp = setup_test_project();
    create_test_order(&tmp);
    creq(&tmp)
        .args(["order", "new", "-c", "Ford", "-r", "R-02", "-l", "B1"])
        .assert()
        .success();

    creq(&tmp)
        .args(["order", "list", "-f", "id"])
        .assert()
        .success()
        .stdout("REQ-001\nREQ-002\n");

    creq(&tmp)
        .args(["order", "list", "--client", "for", "-f", "id"])
        .assert()
        .success()
        .stdout("REQ-002\n");

    creq(&tmp)
        .args(["order", "list", "--status", "pendente", "-f", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Numero_Pedido,Data,Cliente"))
        .stdout(predicate::str::contains("REQ-002,"));
}

#[test]
fn test_order_show_json() {
    let tmp = setup_test_project();
    create_test_order(&tmp);

    creq(&tmp)
        .args(["order", "show", "REQ-001", "-f", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Numero_Pedido\": \"REQ-001\""))
        .stdout(predicate::str::contains("\"Solicitante\": \"Bruno\""))
        .stdout(predicate::str::contains("\"quantidade\": 3"))
        .stdout(predicate::str::contains("\"status\": \"Pendente\""));
}

#[test]
fn test_order_show_unknown_fails() {
    let tmp = setup_test_project();
    create_test_order(&tmp);
    creq(&tmp)
        .args(["order", "show", "REQ-999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("order not found: REQ-999"));
}

#[test]
fn test_order_status_update() {
    let tmp = setup_test_project();
    create_test_order(&tmp);

    creq(&tmp)
        .args(["order", "status", "REQ-001", "em processamento", "--by", "Carla"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Em Processamento"));

    creq(&tmp)
        .args(["order", "show", "REQ-001", "-f", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: Em Processamento"))
        .stdout(predicate::str::contains("Responsavel_Atualizacao: Carla"));
}

#[test]
fn test_order_status_rejects_unknown_label() {
    let tmp = setup_test_project();
    create_test_order(&tmp);
    creq(&tmp)
        .args(["order", "status", "REQ-001", "Shipped", "--by", "Carla"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status"));
}

#[test]
fn test_order_export_writes_slip() {
    let tmp = setup_test_project();
    create_test_order(&tmp);
    let out = tmp.path().join("slip.md");

    creq(&tmp)
        .args(["order", "export", "REQ-001", "--output"])
        .arg(&out)
        .assert()
        .success();

    let slip = fs::read_to_string(&out).unwrap();
    assert!(slip.starts_with("# Pedido de Requisição REQ-001"));
    assert!(slip.contains("CB-10"));
    assert!(slip.contains("Solicitante: ____"));
}

// ============================================================================
// Backup Tests
// ============================================================================

#[test]
fn test_backup_list_after_second_write() {
    let tmp = setup_test_project();
    create_test_order(&tmp);

    creq(&tmp)
        .args(["backup", "list", "-q", "-f", "id"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    create_test_order(&tmp);
    creq(&tmp)
        .args(["backup", "list", "-f", "id"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("pedidos_backup_"));
}

#[test]
fn test_backup_restore_requires_confirmation() {
    let tmp = setup_test_project();
    create_test_order(&tmp);
    create_test_order(&tmp);

    creq(&tmp)
        .args(["backup", "restore", "pedidos_backup_20000101_000000.xlsx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn test_backup_restore_rolls_back_store() {
    let tmp = setup_test_project();
    create_test_order(&tmp);
    create_test_order(&tmp);

    let output = creq(&tmp)
        .args(["backup", "list", "-f", "id"])
        .output()
        .unwrap();
    let name = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap()
        .to_string();

    creq(&tmp)
        .args(["backup", "restore", &name, "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored"));

    creq(&tmp)
        .args(["order", "list", "-f", "id"])
        .assert()
        .success()
        .stdout("REQ-001\n");
}

// ============================================================================
// Sync and Config Tests
// ============================================================================

#[test]
fn test_sync_without_remote() {
    let tmp = setup_test_project();
    creq(&tmp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("No remote configured"));
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_order_new_mirrors_to_remote() {
    let tmp = setup_test_project();
    let remote = tmp.path().join("remote.git");
    fs::create_dir_all(&remote).unwrap();
    git(&remote, &["init", "--bare", "--quiet"]);
    git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);

    fs::write(
        tmp.path().join(".creq/config.yaml"),
        format!(
            "author: Test Author\nemail: test@example.com\nremote_url: {}\n",
            remote.display()
        ),
    )
    .unwrap();

    creq(&tmp)
        .args(["order", "new", "-c", "Renault", "-r", "R-01", "-l", "A1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mirrored to remote"));

    let files = git(&remote, &["ls-tree", "-r", "--name-only", "main"]);
    assert!(files.contains("pedidos/pedidos.xlsx"));
    assert!(files.contains("pedidos/Mapeamento de Racks - Cabos.xlsx"));
    let log = git(&remote, &["log", "-1", "--format=%an %s", "main"]);
    assert!(log.starts_with("Test Author Automatic order sync"));

    // Mirror scratch directory is cleaned up
    assert!(!tmp.path().join(".creq/mirror").exists());

    creq(&tmp)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("Syncing 2 file(s)"))
        .stdout(predicate::str::contains("already up to date"));
}

#[test]
fn test_hosted_sync_commits_as_bot_without_leaking_token() {
    let tmp = setup_test_project();
    create_test_order(&tmp);
    let remote = tmp.path().join("remote.git");
    fs::create_dir_all(&remote).unwrap();
    git(&remote, &["init", "--bare", "--quiet"]);
    git(&remote, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    fs::write(
        tmp.path().join(".creq/config.yaml"),
        format!("remote_url: {}\n", remote.display()),
    )
    .unwrap();

    creq(&tmp)
        .env("CREQ_HOSTED", "true")
        .env("CREQ_GIT_TOKEN", "tok-hosted-123")
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("as creq-bot"))
        .stdout(predicate::str::contains("Mirror pushed"))
        .stdout(predicate::str::contains("tok-hosted-123").not())
        .stderr(predicate::str::contains("tok-hosted-123").not());

    let log = git(&remote, &["log", "-1", "--format=%an <%ae>", "main"]);
    assert_eq!(log.trim(), "creq-bot <creq-bot@users.noreply.github.com>");
}

#[test]
fn test_config_show_yaml_hides_token() {
    let tmp = setup_test_project();
    creq(&tmp)
        .env("CREQ_GIT_TOKEN", "super-secret")
        .args(["config", "show", "-f", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("author: Test Author"))
        .stdout(predicate::str::contains("super-secret").not());
}

#[test]
fn test_config_path() {
    let tmp = setup_test_project();
    creq(&tmp)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".creq/config.yaml"));
}
