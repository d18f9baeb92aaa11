//! Run command integration tests.

use predicates::prelude::*;

use super::common::{TestEnv, element};

/// Second task's export path sits under a directory nobody creates, so its
/// save fails while everything around it stays healthy.
const FAILING_BATCH: &str = r##"{
  "settings": { "document": "promo.json", "export_dir": "exports" },
  "tasks": [
    { "name": "好1", "targets": { "背景": { "visible": true } } },
    { "name": "坏/的", "targets": { "背景": { "visible": false } } },
    { "name": "好2", "targets": { "背景": { "visible": true } } }
  ]
}"##;

#[test]
fn run_applies_targets_before_each_export() {
  let env = TestEnv::promo();

  env
    .layersync_cmd()
    .arg("run")
    .arg("promo_batch.json")
    .assert()
    .success()
    .stdout(predicate::str::contains("Batch complete"));

  let render = env.read_json("exports/9.9.png");
  assert_eq!(render["format"], "png");
  let price = element(&render, &["标题组", "价格"]);
  assert_eq!(price["text"]["contents"], "九块九");
  assert_eq!(price["text"]["size"], 48.0);
  assert_eq!(price["text"]["color"], "#e60012");
  assert_eq!(element(&render, &["角标"])["visible"], true);
}

#[test]
fn run_applies_to_shadow_copy_siblings() {
  let env = TestEnv::promo();

  env.layersync_cmd().arg("run").arg("promo_batch.json").assert().success();

  let render = env.read_json("exports/9.9.png");
  let copy = element(&render, &["标题组", "价格 拷贝"]);
  assert_eq!(copy["text"]["contents"], "九块九");
  assert_eq!(copy["text"]["size"], 48.0);
}

#[test]
fn run_restores_dropped_text_properties_between_tasks() {
  let env = TestEnv::promo();

  env.layersync_cmd().arg("run").arg("promo_batch.json").assert().success();

  // 19.9 keeps contents but drops size and color, so those sit back on the
  // baseline by the time it exports.
  let render = env.read_json("exports/19.9.png");
  let price = element(&render, &["标题组", "价格"]);
  assert_eq!(price["text"]["contents"], "十九块九");
  assert_eq!(price["text"]["size"], 35.0);
  assert_eq!(price["text"]["color"], "#1a1a1a");
  assert_eq!(element(&render, &["角标"])["visible"], false);
}

#[test]
fn run_restores_position_when_a_move_is_dropped() {
  let env = TestEnv::from_fixtures(&["promo.json"]);
  env.write_file(
    "moves.json",
    r##"{
      "settings": { "document": "promo.json", "export_dir": "exports" },
      "tasks": [
        { "name": "a", "targets": { "背景": { "visible": true, "move": [100, 200] } } },
        { "name": "b", "targets": { "背景": { "visible": true } } }
      ]
    }"##,
  );

  env.layersync_cmd().arg("run").arg("moves.json").assert().success();

  let moved = env.read_json("exports/a.png");
  assert_eq!(element(&moved, &["背景"])["x"], 100.0);
  assert_eq!(element(&moved, &["背景"])["y"], 200.0);

  let reset = env.read_json("exports/b.png");
  assert_eq!(element(&reset, &["背景"])["x"], 0.0);
  assert_eq!(element(&reset, &["背景"])["y"], 0.0);
}

#[test]
fn run_skips_paths_already_in_the_target_state() {
  let env = TestEnv::from_fixtures(&["promo.json"]);
  env.write_file(
    "twice.json",
    r##"{
      "settings": { "document": "promo.json", "export_dir": "exports" },
      "tasks": [
        { "name": "a", "targets": { "角标": { "visible": true } } },
        { "name": "b", "targets": { "角标": { "visible": true } } }
      ]
    }"##,
  );

  env
    .layersync_cmd()
    .arg("run")
    .arg("twice.json")
    .assert()
    .success()
    .stdout(predicate::str::contains("Paths applied: 1"))
    .stdout(predicate::str::contains("Paths skipped: 1"));
}

#[test]
fn run_prints_the_batch_summary() {
  let env = TestEnv::promo();

  env
    .layersync_cmd()
    .arg("run")
    .arg("promo_batch.json")
    .assert()
    .success()
    .stdout(predicate::str::contains("Exported: 2"))
    .stdout(predicate::str::contains("Paths applied: 4"))
    .stdout(predicate::str::contains("Baselines restored: 2"));
}

#[test]
fn format_and_suffix_flags_override_the_batch_file() {
  let env = TestEnv::promo();

  env
    .layersync_cmd()
    .arg("run")
    .arg("promo_batch.json")
    .arg("--format")
    .arg("jpg")
    .arg("--suffix")
    .arg("_v2")
    .assert()
    .success();

  let render = env.read_json("exports/9.9_v2.jpg");
  assert_eq!(render["format"], "jpeg");
  assert!(env.path("exports/19.9_v2.jpg").is_file());
  assert!(!env.path("exports/9.9.png").exists());
}

#[test]
fn export_dir_flag_overrides_the_batch_file() {
  let env = TestEnv::promo();

  env
    .layersync_cmd()
    .arg("run")
    .arg("promo_batch.json")
    .arg("--export-dir")
    .arg("out")
    .assert()
    .success();

  assert!(env.path("out/9.9.png").is_file());
  assert!(!env.path("exports").exists());
}

#[test]
fn a_failed_export_aborts_the_batch() {
  let env = TestEnv::from_fixtures(&["promo.json"]);
  env.write_file("failing.json", FAILING_BATCH);

  env
    .layersync_cmd()
    .arg("run")
    .arg("failing.json")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Batch run failed"));

  assert!(env.path("exports/好1.png").is_file());
  assert!(!env.path("exports/好2.png").exists());
}

#[test]
fn keep_going_continues_past_a_failed_export() {
  let env = TestEnv::from_fixtures(&["promo.json"]);
  env.write_file("failing.json", FAILING_BATCH);

  env
    .layersync_cmd()
    .arg("run")
    .arg("failing.json")
    .arg("--keep-going")
    .assert()
    .failure()
    .stdout(predicate::str::contains("Batch complete"))
    .stderr(predicate::str::contains("1 of 3 exports failed"));

  assert!(env.path("exports/好1.png").is_file());
  assert!(env.path("exports/好2.png").is_file());
}
