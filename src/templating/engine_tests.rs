//! Tests for template expansion.

use anyhow::Result;

use crate::core::TemplateError;
use crate::templating::{Bindings, SourceId, Value};
use crate::test_utils::{TemplateFixture, init_test_logging, ns};
use crate::tree::{Document, Node};

fn expand_one(markup: &str, bindings: &Bindings) -> Result<String> {
    init_test_logging(None);
    let fixture = TemplateFixture::new().source("page.xml", markup);
    Ok(fixture.expand("page.xml", bindings)?)
}

fn expand_err(markup: &str, bindings: &Bindings) -> TemplateError {
    let fixture = TemplateFixture::new().source("page.xml", markup);
    match fixture.expand("page.xml", bindings) {
        Ok(output) => panic!("expected an error, got {output}"),
        Err(error) => error,
    }
}

fn fragment(markup: &str) -> Vec<Node> {
    Document::parse_fragment(markup, &SourceId::from("binding")).unwrap()
}

#[test]
fn test_template_without_directives_is_copied() -> Result<()> {
    let markup = r#"<?xml version="1.0"?>
<!DOCTYPE page>
<page lang="en"><!--note--><p class="a">x &amp; y</p><![CDATA[<raw>]]><?pi data?></page>"#;
    assert_eq!(expand_one(markup, &Bindings::new())?, markup);
    Ok(())
}

#[test]
fn test_template_namespace_attributes_are_stripped() -> Result<()> {
    let markup = format!(
        r#"<page xmlns:t="{ns}" xmlns:x="urn:x" xmlns="http://www.w3.org/1999/xhtml" id="p" t:note="drop"><x:a other="{ns}"/></page>"#,
        ns = crate::templating::TEMPLATE_NAMESPACE
    );
    assert_eq!(
        expand_one(&markup, &Bindings::new())?,
        r#"<page xmlns="http://www.w3.org/1999/xhtml" id="p"><x:a/></page>"#
    );
    Ok(())
}

#[test]
fn test_when_truthiness() -> Result<()> {
    let markup = ns("r", r#"<t:when var="flag"><a/></t:when>"#);

    assert_eq!(expand_one(&markup, &Bindings::new().with("flag", true))?, "<r><a/></r>");
    assert_eq!(expand_one(&markup, &Bindings::new().with("flag", "no"))?, "<r><a/></r>");
    assert_eq!(expand_one(&markup, &Bindings::new().with("flag", ""))?, "<r><a/></r>");
    assert_eq!(expand_one(&markup, &Bindings::new().with("flag", 0))?, "<r><a/></r>");
    assert_eq!(expand_one(&markup, &Bindings::new().with("flag", false))?, "<r/>");
    assert_eq!(expand_one(&markup, &Bindings::new())?, "<r/>");
    Ok(())
}

#[test]
fn test_when_with_value() -> Result<()> {
    let markup = ns("r", r#"<t:when var="lang" value="en"><en/></t:when>"#);
    assert_eq!(expand_one(&markup, &Bindings::new().with("lang", "en"))?, "<r><en/></r>");
    assert_eq!(expand_one(&markup, &Bindings::new().with("lang", "de"))?, "<r/>");
    assert_eq!(expand_one(&markup, &Bindings::new())?, "<r/>");

    // scalars compare by their string form
    let markup = ns("r", r#"<t:when var="count" value="3"><three/></t:when>"#);
    assert_eq!(expand_one(&markup, &Bindings::new().with("count", 3))?, "<r><three/></r>");
    Ok(())
}

#[test]
fn test_when_with_indirect_value() -> Result<()> {
    let markup = ns("r", r#"<t:when var="page" valuevar="current" value="home"><on/></t:when>"#);
    let bindings = Bindings::new().with("page", "about").with("current", "about");
    assert_eq!(expand_one(&markup, &bindings)?, "<r><on/></r>");

    // unbound valuevar falls back to the literal
    let bindings = Bindings::new().with("page", "home");
    assert_eq!(expand_one(&markup, &bindings)?, "<r><on/></r>");
    Ok(())
}

#[test]
fn test_nested_when_and_text() -> Result<()> {
    let markup = ns(
        "r",
        r#"<t:when var="a"><b><t:when var="c"><t:text var="msg"/></t:when></b></t:when>"#,
    );
    let bindings = Bindings::new().with("a", true).with("c", true).with("msg", "hi");
    assert_eq!(expand_one(&markup, &bindings)?, "<r><b>hi</b></r>");

    let bindings = Bindings::new().with("a", true).with("c", false);
    assert_eq!(expand_one(&markup, &bindings)?, "<r><b/></r>");
    Ok(())
}

#[test]
fn test_text_is_escaped_and_empty_when_unbound() -> Result<()> {
    let markup = ns("r", r#"<t:text var="x"/>"#);
    assert_eq!(expand_one(&markup, &Bindings::new().with("x", "a<b & c"))?, "<r>a&lt;b &amp; c</r>");
    assert_eq!(expand_one(&markup, &Bindings::new())?, "<r></r>");
    assert_eq!(expand_one(&markup, &Bindings::new().with("x", 2.5))?, "<r>2.5</r>");
    Ok(())
}

#[test]
fn test_attr_sets_and_overwrites() -> Result<()> {
    let markup = ns("r", r#"<a class="old" id="k"><t:attr name="class" value="new"/>x</a>"#);
    assert_eq!(expand_one(&markup, &Bindings::new())?, r#"<r><a class="new" id="k">x</a></r>"#);

    let markup = ns("r", r#"<a><t:attr namevar="n" valuevar="v"/></a>"#);
    let bindings = Bindings::new().with("n", "href").with("v", "/home?a=1&b=2");
    assert_eq!(expand_one(&markup, &bindings)?, r#"<r><a href="/home?a=1&amp;b=2"/></r>"#);
    Ok(())
}

#[test]
fn test_attr_inside_when_targets_enclosing_output_element() -> Result<()> {
    let markup = ns(
        "r",
        r#"<li><t:when var="active"><t:attr name="class" value="active"/></t:when>Home</li>"#,
    );
    assert_eq!(
        expand_one(&markup, &Bindings::new().with("active", true))?,
        r#"<r><li class="active">Home</li></r>"#
    );
    assert_eq!(expand_one(&markup, &Bindings::new())?, "<r><li>Home</li></r>");
    Ok(())
}

#[test]
fn test_attr_without_value_removes_attribute() -> Result<()> {
    let markup = ns("r", r#"<a class="old" id="k"><t:attr name="class" valuevar="missing"/></a>"#);
    assert_eq!(expand_one(&markup, &Bindings::new())?, r#"<r><a id="k"/></r>"#);
    Ok(())
}

#[test]
fn test_attr_errors() {
    let markup = ns("r", r#"<a><t:attr namevar="n" value="v"/></a>"#);
    assert!(matches!(
        expand_err(&markup, &Bindings::new()),
        TemplateError::MissingIndirectVariable { directive: "attr", attribute: "name", ref variable, .. }
            if variable == "n"
    ));

    let markup = ns("r", r#"<a><t:attr value="v"/></a>"#);
    assert!(matches!(
        expand_err(&markup, &Bindings::new()),
        TemplateError::MissingAttribute { directive: "attr", attribute: "name", .. }
    ));

    let markup = format!(
        r#"<t:attr xmlns:t="{}" name="a" value="b"/>"#,
        crate::templating::TEMPLATE_NAMESPACE
    );
    assert!(matches!(
        expand_err(&markup, &Bindings::new()),
        TemplateError::AttrOutsideElement { .. }
    ));
}

#[test]
fn test_dynamic_injects_nodes() -> Result<()> {
    let markup = ns("r", r#"<t:dynamic var="body"/>"#);

    let bindings = Bindings::new().with("body", fragment("<p>one</p>text<p>two</p>"));
    assert_eq!(expand_one(&markup, &bindings)?, "<r><p>one</p>text<p>two</p></r>");

    let single = fragment("<b>bold</b>").remove(0);
    assert_eq!(expand_one(&markup, &Bindings::new().with("body", single))?, "<r><b>bold</b></r>");

    assert_eq!(expand_one(&markup, &Bindings::new().with("body", "a<b"))?, "<r>a&lt;b</r>");
    assert_eq!(expand_one(&markup, &Bindings::new())?, "<r/>");
    Ok(())
}

#[test]
fn test_dynamic_nodes_are_not_expanded() -> Result<()> {
    let markup = ns("r", r#"<t:dynamic var="body"/>"#);
    let inner = ns("div", r#"<t:text var="x"/>"#);
    let bindings = Bindings::new().with("body", fragment(&inner)).with("x", "ignored");
    let output = expand_one(&markup, &bindings)?;
    assert!(output.contains("<t:text"), "bound markup is injected verbatim: {output}");
    Ok(())
}

#[test]
fn test_include_default_selector() -> Result<()> {
    let fixture = TemplateFixture::new()
        .source("page.xml", &ns("page", r#"<t:include src="footer.xml"/>"#))
        .source("footer.xml", "<footer><p>a</p><p>b</p></footer>");
    assert_eq!(fixture.expand("page.xml", &Bindings::new())?, "<page><p>a</p><p>b</p></page>");
    Ok(())
}

#[test]
fn test_include_elements_selector() -> Result<()> {
    let fixture = TemplateFixture::new()
        .source(
            "page.xml",
            &ns(
                "page",
                r#"<t:include src="lib.xml" elements="//item[@kind='b']"/><t:include src="lib.xml" elementsvar="sel"/>"#,
            ),
        )
        .source("lib.xml", r#"<lib><item kind="a">A</item><item kind="b">B</item></lib>"#);
    let bindings = Bindings::new().with("sel", "/lib/item[1]");
    assert_eq!(
        fixture.expand("page.xml", &bindings)?,
        r#"<page><item kind="b">B</item><item kind="a">A</item></page>"#
    );
    Ok(())
}

#[test]
fn test_included_templates_are_expanded_with_same_bindings() -> Result<()> {
    let fixture = TemplateFixture::new()
        .source("page.xml", &ns("page", r#"<t:include src="part.xml"/>"#))
        .source(
            "part.xml",
            &ns("part", r#"<h1><t:text var="title"/></h1><t:when var="x"><x/></t:when>"#),
        );
    let bindings = Bindings::new().with("title", "Hello");
    assert_eq!(fixture.expand("page.xml", &bindings)?, "<page><h1>Hello</h1></page>");
    Ok(())
}

#[test]
fn test_include_is_loaded_once_per_expansion() -> Result<()> {
    let fixture = TemplateFixture::new()
        .source(
            "page.xml",
            &ns(
                "page",
                r#"<t:include src="lib.xml" elements="/lib/a"/><t:include src="./lib.xml" elements="/lib/b"/><t:include src="lib.xml"/>"#,
            ),
        )
        .source("lib.xml", "<lib><a/><b/></lib>");

    let template = fixture.template("page.xml")?;
    let output = template.expand(&Bindings::new())?;
    assert_eq!(output.to_xml_string(), "<page><a/><b/><a/><b/></page>");
    assert_eq!(fixture.loader().load_count("lib.xml"), 1);

    // nothing is cached across calls
    template.expand(&Bindings::new())?;
    assert_eq!(fixture.loader().load_count("lib.xml"), 2);
    assert_eq!(fixture.loader().load_count("page.xml"), 1);
    Ok(())
}

#[test]
fn test_relative_includes_resolve_against_including_template() -> Result<()> {
    let fixture = TemplateFixture::new()
        .source("site/page.xml", &ns("page", r#"<t:include src="parts/nav.xml"/>"#))
        .source("site/parts/nav.xml", &ns("nav", r#"<t:include src="../common/link.xml"/>"#))
        .source("site/common/link.xml", "<x><a href='/'>home</a></x>");
    assert_eq!(
        fixture.expand("site/page.xml", &Bindings::new())?,
        r#"<page><a href="/">home</a></page>"#
    );
    Ok(())
}

#[test]
fn test_indirect_src_is_used_verbatim() -> Result<()> {
    let fixture = TemplateFixture::new()
        .source("site/page.xml", &ns("page", r#"<t:include srcvar="content" src="fallback.xml"/>"#))
        .source("content/a.xml", "<c><p>from binding</p></c>")
        .source("site/fallback.xml", "<c><p>fallback</p></c>");

    let bindings = Bindings::new().with("content", "content/a.xml");
    assert_eq!(fixture.expand("site/page.xml", &bindings)?, "<page><p>from binding</p></page>");
    assert_eq!(fixture.expand("site/page.xml", &Bindings::new())?, "<page><p>fallback</p></page>");
    Ok(())
}

#[test]
fn test_include_errors() {
    let fixture = TemplateFixture::new()
        .source("page.xml", &ns("page", r#"<t:include src="missing.xml"/>"#))
        .source("nosrc.xml", &ns("page", "<t:include/>"))
        .source("broken.xml", &ns("page", r#"<t:include src="bad.xml"/>"#))
        .source("bad.xml", "<bad><unclosed></bad>");

    match fixture.expand("page.xml", &Bindings::new()).unwrap_err() {
        TemplateError::UnresolvableInclude {
            src,
            from,
            cause,
        } => {
            assert_eq!(src, "missing.xml");
            assert_eq!(from, SourceId::from("page.xml"));
            assert!(matches!(*cause, TemplateError::Io { .. }));
        }
        other => panic!("expected UnresolvableInclude, got {other:?}"),
    }

    assert!(matches!(
        fixture.expand("nosrc.xml", &Bindings::new()).unwrap_err(),
        TemplateError::MissingAttribute { directive: "include", attribute: "src", .. }
    ));

    let error = fixture.expand("broken.xml", &Bindings::new()).unwrap_err();
    assert!(matches!(error.root_cause(), TemplateError::Parse { .. }));
}

#[test]
fn test_include_with_unbound_srcvar_and_no_src() {
    let markup = ns("page", r#"<t:include srcvar="where"/>"#);
    assert!(matches!(
        expand_err(&markup, &Bindings::new()),
        TemplateError::MissingIndirectVariable { directive: "include", ref variable, .. } if variable == "where"
    ));
}

#[test]
fn test_cyclic_includes_are_rejected() {
    let fixture = TemplateFixture::new()
        .source("self.xml", &ns("s", r#"<t:include src="self.xml"/>"#))
        .source("a.xml", &ns("a", r#"<t:include src="b.xml"/>"#))
        .source("b.xml", &ns("b", r#"<t:include src="a.xml"/>"#));

    match fixture.expand("self.xml", &Bindings::new()).unwrap_err() {
        TemplateError::CyclicInclude {
            chain,
        } => assert_eq!(chain, vec![SourceId::from("self.xml"), SourceId::from("self.xml")]),
        other => panic!("expected CyclicInclude, got {other:?}"),
    }

    match fixture.expand("a.xml", &Bindings::new()).unwrap_err() {
        TemplateError::CyclicInclude {
            chain,
        } => assert_eq!(
            chain,
            vec![SourceId::from("a.xml"), SourceId::from("b.xml"), SourceId::from("a.xml")]
        ),
        other => panic!("expected CyclicInclude, got {other:?}"),
    }
}

#[test]
fn test_unknown_directive_fails() {
    let markup = ns("r", r#"<t:loop var="items"/>"#);
    match expand_err(&markup, &Bindings::new()) {
        TemplateError::UnknownDirective {
            name,
            source_id,
            ..
        } => {
            assert_eq!(name, "loop");
            assert_eq!(source_id, SourceId::from("page.xml"));
        }
        other => panic!("expected UnknownDirective, got {other:?}"),
    }
}

#[test]
fn test_unknown_directive_in_skipped_branch_is_ignored() -> Result<()> {
    let markup = ns("r", r#"<t:when var="off"><t:loop/></t:when>"#);
    assert_eq!(expand_one(&markup, &Bindings::new().with("off", false))?, "<r/>");
    Ok(())
}

#[test]
fn test_expansion_is_repeatable_and_leaves_template_untouched() -> Result<()> {
    let markup = ns("r", r#"<a><t:attr name="k" valuevar="v"/><t:text var="v"/></a>"#);
    let fixture = TemplateFixture::new().source("page.xml", &markup);
    let template = fixture.template("page.xml")?;
    let before = template.document().to_xml_string();

    let first = template.expand(&Bindings::new().with("v", "1"))?;
    let again = template.expand(&Bindings::new().with("v", "1"))?;
    let other = template.expand(&Bindings::new().with("v", "2"))?;

    assert_eq!(first, again);
    assert_eq!(first.to_xml_string(), r#"<r><a k="1">1</a></r>"#);
    assert_eq!(other.to_xml_string(), r#"<r><a k="2">2</a></r>"#);
    assert_eq!(template.document().to_xml_string(), before);
    Ok(())
}

#[test]
fn test_bindings_from_iterator() -> Result<()> {
    let markup = ns("r", r#"<t:text var="a"/><t:text var="b"/>"#);
    let bindings: Bindings =
        vec![("a", Value::from("x")), ("b", Value::Integer(7))].into_iter().collect();
    assert_eq!(expand_one(&markup, &bindings)?, "<r>x7</r>");
    Ok(())
}

#[test]
fn test_template_and_bindings_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<crate::templating::Template>();
    assert_send_sync::<Bindings>();
}
