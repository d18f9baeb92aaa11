//! Plan command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn plan_reports_elements_and_properties_per_path() {
  let env = TestEnv::promo();

  env
    .layersync_cmd()
    .arg("plan")
    .arg("promo_batch.json")
    .assert()
    .success()
    .stdout(predicate::str::contains("Tasks: 2"))
    .stdout(predicate::str::contains("标题组/价格 (2 elements, 3 properties)"))
    .stdout(predicate::str::contains("角标 (1 element, 1 property)"))
    .stdout(predicate::str::contains("4 resolved, 0 missing"));
}

#[test]
fn plan_shows_export_destinations() {
  let env = TestEnv::promo();

  env
    .layersync_cmd()
    .arg("plan")
    .arg("promo_batch.json")
    .assert()
    .success()
    .stdout(predicate::str::contains("9.9.png"))
    .stdout(predicate::str::contains("19.9.png"));
}

#[test]
fn plan_marks_unresolvable_paths() {
  let env = TestEnv::from_fixtures(&["promo.json"]);
  env.write_file(
    "bad.json",
    r##"{
      "settings": { "document": "promo.json" },
      "tasks": [ { "name": "x", "targets": {
        "标题组/不存在": { "visible": false },
        "背景": { "visible": true }
      } } ]
    }"##,
  );

  env
    .layersync_cmd()
    .arg("plan")
    .arg("bad.json")
    .assert()
    .success()
    .stdout(predicate::str::contains("! 标题组/不存在"))
    .stdout(predicate::str::contains("no group or layer named '不存在'"))
    .stdout(predicate::str::contains("1 resolved, 1 missing"));
}

#[test]
fn plan_never_touches_the_document() {
  let env = TestEnv::promo();
  let before = std::fs::read_to_string(env.path("promo.json")).unwrap();

  env.layersync_cmd().arg("plan").arg("promo_batch.json").assert().success();

  assert_eq!(std::fs::read_to_string(env.path("promo.json")).unwrap(), before);
  assert!(!env.path("exports").exists());
}
