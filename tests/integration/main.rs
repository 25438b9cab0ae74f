//! Integration tests for Prebake

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn prebake() -> Command {
        cargo_bin_cmd!("prebake")
    }

    /// Write a config pointing every path at a temp directory
    fn temp_config(temp: &TempDir) -> std::path::PathBuf {
        let path = temp.path().join("config.toml");
        let contents = format!(
            r#"
[cache]
root = "{cache}"

[remote]
tool = "definitely-not-an-installed-tool"
bucket = "test/bucket"
timeout_secs = 5

[install]
dir = "{install}"

[hook]
pattern = "lib*"
source_root = "{src}"
"#,
            cache = temp.path().join("cache").display(),
            install = temp.path().join("install").display(),
            src = temp.path().join("src").display(),
        );
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        prebake()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Prebuilt artifact cache resolver for multi-component builds",
            ));
    }

    #[test]
    fn version_displays() {
        prebake()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("prebake"));
    }

    #[test]
    fn config_path() {
        prebake()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        prebake()
            .args(["config", "show"])
            .args(["--config"])
            .arg(temp.path().join("missing.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("[remote]"));
    }

    #[test]
    fn config_init_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        prebake()
            .args(["config", "init"])
            .args(["--config"])
            .arg(&path)
            .assert()
            .success();
        assert!(path.exists());
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();
        let config = temp_config(&temp);
        prebake()
            .args(["cache", "list"])
            .args(["--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached artifacts"));
    }

    #[test]
    fn status_runs() {
        let temp = TempDir::new().unwrap();
        let config = temp_config(&temp);
        prebake()
            .args(["status"])
            .args(["--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("Prebake System Status"));
    }

    #[test]
    fn resolve_non_matching_name_passes_through() {
        let temp = TempDir::new().unwrap();
        let config = temp_config(&temp);
        prebake()
            .args(["resolve", "external-tool"])
            .args(["--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("passed through"));
    }

    #[test]
    fn resolve_without_revision_falls_back() {
        // Component dir outside any git checkout: version derivation fails,
        // which must be a fallback, not an error exit
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src/libfoo")).unwrap();
        let config = temp_config(&temp);
        prebake()
            .args(["resolve", "libfoo"])
            .args(["--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("building from source"));
    }

    #[test]
    fn resolve_force_source_skips_resolver() {
        let temp = TempDir::new().unwrap();
        let config = temp_config(&temp);
        prebake()
            .args(["resolve", "libfoo", "--force-source"])
            .args(["--config"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("forced from source"));
    }

    #[test]
    fn resolve_require_prebuilt_fails_hard() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src/libfoo")).unwrap();
        let config = temp_config(&temp);
        prebake()
            .args(["resolve", "libfoo", "--require-prebuilt"])
            .args(["--config"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("requires a prebuilt artifact"));
    }

    #[test]
    fn resolve_rejects_malformed_version() {
        let temp = TempDir::new().unwrap();
        let config = temp_config(&temp);
        prebake()
            .args(["resolve", "libfoo", "--version", "not-a-version"])
            .args(["--config"])
            .arg(&config)
            .assert()
            .failure();
    }
}
