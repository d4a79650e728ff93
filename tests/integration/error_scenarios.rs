use anyhow::Result;
use predicates::prelude::*;

use crate::common::{NS_DECL, TestProject};

#[test]
fn test_missing_template_argument() -> Result<()> {
    let project = TestProject::new()?;

    project
        .cmd()
        .arg("expand")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No template given"));
    Ok(())
}

#[test]
fn test_missing_template_file() -> Result<()> {
    let project = TestProject::new()?;

    project
        .cmd()
        .args(["expand", "nope.html"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load template nope.html"))
        .stderr(predicate::str::contains("suggestion"));
    Ok(())
}

#[test]
fn test_parse_error_reports_line() -> Result<()> {
    let project = TestProject::new()?;
    project.write("bad.xml", "<a>\n  <b>\n</a>\n")?;

    project
        .cmd()
        .args(["expand", "bad.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.xml:3:"));
    Ok(())
}

#[test]
fn test_unknown_directive_suggestion() -> Result<()> {
    let project = TestProject::new()?;
    project.write("page.xml", &format!(r#"<p {NS_DECL}><t:txt var="x"/></p>"#))?;

    project
        .cmd()
        .args(["expand", "page.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown directive <txt>"))
        .stderr(predicate::str::contains("Did you mean <text>"));
    Ok(())
}

#[test]
fn test_cyclic_include() -> Result<()> {
    let project = TestProject::new()?;
    project.write("a.xml", &format!(r#"<a {NS_DECL}><t:include src="b.xml"/></a>"#))?;
    project.write("b.xml", &format!(r#"<b {NS_DECL}><t:include src="a.xml"/></b>"#))?;

    project
        .cmd()
        .args(["expand", "a.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cyclic include: a.xml -> b.xml -> a.xml"));
    Ok(())
}

#[test]
fn test_missing_include_names_source() -> Result<()> {
    let project = TestProject::new()?;
    project.write("page.xml", &format!(r#"<p {NS_DECL}><t:include src="gone.xml"/></p>"#))?;

    project
        .cmd()
        .args(["expand", "page.xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot include 'gone.xml' from page.xml"));
    Ok(())
}

#[test]
fn test_invalid_config() -> Result<()> {
    let project = TestProject::new()?;
    project.write("xmlskin.toml", "template = 3\n")?;

    project
        .cmd()
        .arg("expand")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_bad_var_syntax_is_a_usage_error() -> Result<()> {
    let project = TestProject::new()?;

    project
        .cmd()
        .args(["expand", "x.xml", "--var", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected NAME=VALUE"));
    Ok(())
}
