//! Info command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn info_prints_the_tree_with_totals() {
  let env = TestEnv::promo();

  env
    .layersync_cmd()
    .arg("info")
    .arg("promo.json")
    .assert()
    .success()
    .stdout(predicate::str::contains("Document: 秋季促销"))
    .stdout(predicate::str::contains("标题组/"))
    .stdout(predicate::str::contains("角标/ (hidden)"))
    .stdout(predicate::str::contains("Totals: 2 groups, 4 layers (2 text)"));
}

#[test]
fn info_shows_text_layer_details() {
  let env = TestEnv::promo();

  env
    .layersync_cmd()
    .arg("info")
    .arg("promo.json")
    .assert()
    .success()
    .stdout(predicate::str::contains("价格 [text \"0\" 35pt]"));
}
