use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const HUE_BANDS: [&str; 12] = [
    "Red",
    "Orange",
    "Yellow",
    "Chartreuse",
    "Green",
    "Spring Green",
    "Cyan",
    "Azure",
    "Blue",
    "Violet",
    "Magenta",
    "Rose",
];

#[allow(deprecated)]
fn huename(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("huename").expect("binary");
    cmd.current_dir(workdir)
        .env("HUENAME_CLASSIFIER_MODE", "stub")
        .env_remove("HUENAME_STRIDE")
        .env_remove("HUENAME_MAX_IN_FLIGHT")
        .env_remove("HUENAME_API_BASE")
        .env_remove("HUENAME_TIMEOUT_SECS")
        .env_remove("HUENAME_CACHE_FILE");
    cmd
}

#[test]
fn palette_prints_one_line_per_named_color() {
    let temp = tempdir().expect("tempdir");
    let output = huename(temp.path())
        .args(["palette", "--no-cache"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), HUE_BANDS.len(), "{stdout}");
    assert_eq!(lines[0], "#ff0000  Red  hsl(0, 100%, 50%)");
    assert_eq!(lines[1], "#ff4000  Orange  hsl(15, 100%, 50%)");
    for (line, name) in lines.iter().zip(HUE_BANDS) {
        assert_eq!(line.split("  ").nth(1), Some(name));
    }
}

#[test]
fn json_lines_carry_enriched_colors() {
    let temp = tempdir().expect("tempdir");
    let output = huename(temp.path())
        .args(["palette", "--no-cache", "--json", "--space", "hsl", "--lightness", "20"])
        .output()
        .expect("run");
    assert!(output.status.success());

    let rows: Vec<Value> = String::from_utf8(output.stdout)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(rows.len(), HUE_BANDS.len());
    assert_eq!(rows[0]["name"], "Dark Red");
    assert_eq!(rows[0]["hsl"]["s"], 50.0);
    assert_eq!(rows[0]["text"], "white");
    assert!(rows
        .iter()
        .all(|row| row["hex"].as_str().is_some_and(|hex| hex.len() == 7)));
}

#[test]
fn unreachable_gamut_reports_no_colors() {
    let temp = tempdir().expect("tempdir");
    huename(temp.path())
        .args([
            "palette",
            "--no-cache",
            "--space",
            "oklch",
            "--saturation",
            "0.37",
            "--lightness",
            "0.05",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains(
            "No colors for this saturation and lightness.",
        ));
}

#[test]
fn resolved_names_are_persisted_and_reused() {
    let temp = tempdir().expect("tempdir");
    let cache_file = temp.path().join("cache").join("labels.json");

    let first = huename(temp.path())
        .args(["palette", "--cache-file"])
        .arg(&cache_file)
        .output()
        .expect("run");
    assert!(first.status.success());

    let raw = fs::read_to_string(&cache_file).expect("cache written");
    let envelope: Value = serde_json::from_str(&raw).expect("cache json");
    assert_eq!(envelope["api_base"], "stub");
    assert!(envelope["created_ms"].as_u64().is_some());
    assert_eq!(envelope["entries"]["0,100,50"], "Red");

    let second = huename(temp.path())
        .args(["palette", "--cache-file"])
        .arg(&cache_file)
        .output()
        .expect("run");
    assert!(second.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn default_cache_lives_under_working_directory() {
    let temp = tempdir().expect("tempdir");
    huename(temp.path()).arg("palette").assert().success();
    assert!(temp.path().join(".huename").join("labels.json").is_file());
}

#[test]
fn no_cache_writes_nothing() {
    let temp = tempdir().expect("tempdir");
    huename(temp.path())
        .args(["palette", "--no-cache"])
        .assert()
        .success();
    assert!(!temp.path().join(".huename").exists());
}

#[test]
fn share_link_round_trips_into_palette() {
    let temp = tempdir().expect("tempdir");
    huename(temp.path())
        .args(["share", "--space", "oklch", "--origin", "https://hues.example/"])
        .assert()
        .success()
        .stdout(predicate::eq(
            "https://hues.example/?colorspace=oklch&saturation=0.15&lightness=0.76\n",
        ));

    huename(temp.path())
        .args([
            "palette",
            "--no-cache",
            "--from-url",
            "https://hues.example/?colorspace=hsl&saturation=100&lightness=50",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#ff0000  Red"));
}

#[test]
fn out_of_range_selection_fails() {
    let temp = tempdir().expect("tempdir");
    huename(temp.path())
        .args(["palette", "--no-cache", "--saturation", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("saturation"));
}

#[test]
fn naming_failure_exits_non_zero() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let temp = tempdir().expect("tempdir");
    huename(temp.path())
        .env("HUENAME_CLASSIFIER_MODE", "http")
        .args(["palette", "--timeout-secs", "2", "--api-base"])
        .arg(format!("http://{addr}"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Color naming failed"));
    assert!(!temp.path().join(".huename").exists());
}

#[test]
fn config_file_selects_stub_mode_and_stride() {
    let temp = tempdir().expect("tempdir");
    let config = temp.path().join("huename.toml");
    fs::write(
        &config,
        "[engine]\nstride = 20\nmax_in_flight = 2\n\n[api]\nmode = \"stub\"\n",
    )
    .expect("write config");

    let output = huename(temp.path())
        .env_remove("HUENAME_CLASSIFIER_MODE")
        .args(["palette", "--no-cache", "--config"])
        .arg(&config)
        .output()
        .expect("run");
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout).expect("utf8").lines().count(),
        HUE_BANDS.len()
    );
}

#[test]
fn malformed_config_is_reported() {
    let temp = tempdir().expect("tempdir");
    let config = temp.path().join("huename.toml");
    fs::write(&config, "[engine]\nstrde = 20\n").expect("write config");

    huename(temp.path())
        .args(["palette", "--no-cache", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}
