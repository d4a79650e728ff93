use std::thread;

use anyhow::Result;
use xmlskin::templating::Bindings;
use xmlskin::test_utils::{TemplateFixture, init_test_logging, ns};

fn site() -> TemplateFixture {
    TemplateFixture::new()
        .source(
            "skin.xml",
            &ns(
                "page",
                r#"<h1><t:text var="title"/></h1><t:include src="parts/nav.xml"/><t:include src="parts/nav.xml" elements="//a[last()]"/>"#,
            ),
        )
        .source("parts/nav.xml", r#"<nav><a href="/">home</a><a href="/about">about</a></nav>"#)
}

#[test]
fn test_one_template_expands_on_several_threads() -> Result<()> {
    init_test_logging(None);
    let fixture = site();
    let template = fixture.template("skin.xml")?;
    let expected = r#"<page><h1>Home</h1><a href="/">home</a><a href="/about">about</a><a href="/about">about</a></page>"#;

    let expand = || {
        template
            .expand(&Bindings::new().with("title", "Home"))
            .map(|document| document.to_xml_string())
    };
    let (first, second) = thread::scope(|scope| {
        let first = scope.spawn(expand);
        let second = scope.spawn(expand);
        (first.join().unwrap(), second.join().unwrap())
    });

    let outputs = vec![first?, second?];
    assert_eq!(outputs, vec![expected.to_string(), expected.to_string()]);
    Ok(())
}

#[test]
fn test_include_loaded_once_per_expansion() -> Result<()> {
    init_test_logging(None);
    let fixture = site();

    fixture.expand("skin.xml", &Bindings::new().with("title", "A"))?;
    fixture.expand("skin.xml", &Bindings::new().with("title", "B"))?;

    // each expansion loads the skin once and the nav once, despite two includes
    assert_eq!(fixture.loader().load_count("skin.xml"), 2);
    assert_eq!(fixture.loader().load_count("parts/nav.xml"), 2);
    Ok(())
}
