use anyhow::Result;
use predicates::prelude::*;

use crate::common::{NS_DECL, TestProject};

fn skin() -> String {
    format!(
        r#"<html xmlns="http://www.w3.org/1999/xhtml" {NS_DECL}>
  <head><title><t:text var="title"/></title></head>
  <body>
    <t:when var="isindex"><p class="welcome">Welcome!</p></t:when>
    <t:include srcvar="content" elements="//div[@id='content']/*"/>
    <t:dynamic var="sidebar"/>
    <t:include src="parts/footer.html"/>
  </body>
</html>"#
    )
}

fn setup_site(project: &TestProject) -> Result<()> {
    project.write("templates/skin.html", &skin())?;
    project.write(
        "templates/parts/footer.html",
        &format!(r#"<footer {NS_DECL}><p>Release <t:text var="release"/></p></footer>"#),
    )?;
    project.write(
        "content/about.html",
        r#"<html><body><div id="nav">skip</div><div id="content"><h1>About</h1><p>Text</p></div></body></html>"#,
    )?;
    Ok(())
}

#[test]
fn test_expand_with_vars_to_stdout() -> Result<()> {
    let project = TestProject::new()?;
    setup_site(&project)?;

    project
        .cmd()
        .args(["expand", "templates/skin.html"])
        .args(["--var", "title=About us", "--var", "content=content/about.html"])
        .args(["--var", "release=2.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>About us</title>"))
        .stdout(predicate::str::contains("<h1>About</h1><p>Text</p>"))
        .stdout(predicate::str::contains("<p>Release 2.1</p>"))
        .stdout(predicate::str::contains("skip").not())
        .stdout(predicate::str::contains("xemplate").not())
        .stdout(predicate::str::contains("<html xmlns=\"http://www.w3.org/1999/xhtml\">"));
    Ok(())
}

#[test]
fn test_expand_with_config_file() -> Result<()> {
    let project = TestProject::new()?;
    setup_site(&project)?;
    project.write(
        "xmlskin.toml",
        r#"
template = "templates/skin.html"
output = "output/index.html"

[bindings]
title = "Home"
isindex = true
release = "1.0"
content = "content/about.html"

[bindings.sidebar]
markup = "<ul id='side'><li>one</li></ul>"
"#,
    )?;

    project
        .cmd()
        .arg("expand")
        .assert()
        .success()
        .stdout(predicate::str::contains("Expanded"));

    let output = project.read("output/index.html")?;
    assert!(output.contains("<title>Home</title>"), "{output}");
    assert!(output.contains(r#"<p class="welcome">Welcome!</p>"#), "{output}");
    assert!(output.contains(r#"<ul id="side"><li>one</li></ul>"#), "{output}");
    assert!(output.contains("<p>Release 1.0</p>"), "{output}");
    Ok(())
}

#[test]
fn test_var_overrides_config_binding() -> Result<()> {
    let project = TestProject::new()?;
    setup_site(&project)?;
    project.write(
        "site.toml",
        r#"
template = "templates/skin.html"

[bindings]
title = "From config"
isindex = false
content = "content/about.html"
"#,
    )?;

    project
        .cmd()
        .args(["expand", "--config", "site.toml", "--var", "title=From flag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<title>From flag</title>"))
        .stdout(predicate::str::contains("Welcome!").not());
    Ok(())
}

#[test]
fn test_expand_pretty_output_to_file() -> Result<()> {
    let project = TestProject::new()?;
    project.write(
        "list.xml",
        &format!(r#"<ul {NS_DECL}><t:when var="a"><li>a</li></t:when><li><b>b</b></li></ul>"#),
    )?;

    project
        .cmd()
        .args(["expand", "list.xml", "--pretty", "--var", "a=yes", "-o", "out/list.xml"])
        .assert()
        .success();

    assert_eq!(project.read("out/list.xml")?, "<ul>\n  <li>a</li>\n  <li>\n    <b>b</b>\n  </li>\n</ul>\n");
    Ok(())
}

#[test]
fn test_expand_without_directives_is_identity() -> Result<()> {
    let project = TestProject::new()?;
    let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<doc a="1"><!-- keep --><x>&lt;y&gt;</x></doc>"#;
    project.write("plain.xml", text)?;

    project
        .cmd()
        .args(["expand", "plain.xml"])
        .assert()
        .success()
        .stdout(format!("{text}\n"));
    Ok(())
}
