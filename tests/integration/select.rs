use anyhow::Result;
use predicates::prelude::*;

use crate::common::TestProject;

const PAGE: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><div id="nav"><a href="/">home</a></div><div id="content"><p>one</p><p>two</p></div></body></html>"#;

#[test]
fn test_select_prints_one_node_per_line() -> Result<()> {
    let project = TestProject::new()?;
    project.write("page.html", PAGE)?;

    project
        .cmd()
        .args(["select", "page.html", "//div[@id='content']/p"])
        .assert()
        .success()
        .stdout("<p>one</p>\n<p>two</p>\n");
    Ok(())
}

#[test]
fn test_select_json_format() -> Result<()> {
    let project = TestProject::new()?;
    project.write("page.html", PAGE)?;

    let output = project
        .cmd()
        .args(["select", "page.html", "/html/body/div[1]/a | //p[last()]", "--format", "json"])
        .output()?;
    assert!(output.status.success());

    let nodes: Vec<String> = serde_json::from_slice(&output.stdout)?;
    assert_eq!(nodes, vec![r#"<a href="/">home</a>"#, "<p>two</p>"]);
    Ok(())
}

#[test]
fn test_select_without_matches_warns() -> Result<()> {
    let project = TestProject::new()?;
    project.write("page.html", PAGE)?;

    project
        .cmd()
        .args(["select", "page.html", "/html/head"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("no nodes matched /html/head"));
    Ok(())
}

#[test]
fn test_select_invalid_selector() -> Result<()> {
    let project = TestProject::new()?;
    project.write("page.html", PAGE)?;

    project
        .cmd()
        .args(["select", "page.html", "/html/[1]"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid selector '/html/[1]' at position 6"));
    Ok(())
}
