use std::cell::{Cell, RefCell};
use std::rc::Rc;

use formset_core::NodeId;
use formset_testing::ComposeTestRule;
use formset_ui::Text;
use serde_json::json;

use crate::{
    AddRow, AutorisatieForm, FormSetConfig, FormSetProps, ManagementForm, RowData,
    DEFAULT_ADD_ROW_CLASS,
};

fn row(value: serde_json::Value) -> RowData {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn management_form_renders_four_hidden_inputs_in_order() {
    let mut rule = ComposeTestRule::new();
    rule.set_content(|| {
        formset_ui::Fragment(|| {
            ManagementForm("auth", 1, 3, 0, 10);
        });
    })
    .expect("render");

    assert_eq!(
        rule.markup().expect("markup"),
        concat!(
            r#"<input type="hidden" name="auth-TOTAL_FORMS" value="3">"#,
            r#"<input type="hidden" name="auth-INITIAL_FORMS" value="1">"#,
            r#"<input type="hidden" name="auth-MIN_NUM_FORMS" value="0">"#,
            r#"<input type="hidden" name="auth-MAX_NUM_FORMS" value="10">"#,
        )
    );
}

#[test]
fn add_row_uses_default_class_and_prevents_navigation() {
    thread_local! {
        static LINK: Cell<Option<NodeId>> = const { Cell::new(None) };
    }
    let activations = Rc::new(Cell::new(0));
    let seen = Rc::clone(&activations);

    let mut rule = ComposeTestRule::new();
    rule.set_content(move || {
        let seen = Rc::clone(&seen);
        AddRow(None, "Meer", move |event| {
            assert!(event.default_prevented());
            seen.set(seen.get() + 1);
            LINK.with(|slot| slot.set(Some(event.target())));
        });
    })
    .expect("render");

    assert_eq!(
        rule.markup().expect("markup"),
        r##"<div class="add-row"><a href="#">Meer</a></div>"##
    );
    let tree = rule.rendered().expect("render").expect("tree");
    let link = tree.find_by_tag("a")[0].id();
    let outcome = rule.click(link).expect("click");

    assert!(outcome.default_prevented);
    assert_eq!(activations.get(), 1);
    assert_eq!(LINK.with(|slot| slot.get()), Some(link));
    assert_eq!(
        rule.find_by_class(DEFAULT_ADD_ROW_CLASS)
            .expect("query")
            .len(),
        1
    );
}

#[test]
fn autorisatie_form_namespaces_fields_by_prefix_and_index() {
    let data = row(json!({ "id": 7, "component": "zrc", "scopes": ["a", "b"], "note": null }));
    let mut rule = ComposeTestRule::new();
    rule.set_content(move || {
        AutorisatieForm("auth", 4, Some(&data));
    })
    .expect("render");

    let tree = rule.rendered().expect("render").expect("tree");
    assert_eq!(tree.attribute("data-index"), Some("4"));
    assert_eq!(tree.input_value("auth-4-id"), Some("7"));
    assert_eq!(tree.input_value("auth-4-component"), Some("zrc"));
    assert_eq!(tree.input_value("auth-4-scopes"), Some(r#"["a","b"]"#));
    assert_eq!(tree.input_value("auth-4-note"), Some(""));
}

#[test]
fn blank_autorisatie_form_is_an_empty_container() {
    let mut rule = ComposeTestRule::new();
    rule.set_content(|| {
        AutorisatieForm("auth", 0, None);
    })
    .expect("render");
    assert_eq!(
        rule.markup().expect("markup"),
        r#"<div class="autorisatie-form" data-index="0"></div>"#
    );
}

#[test]
fn custom_row_renderer_receives_prefix_index_and_data() {
    let calls: Rc<RefCell<Vec<(String, usize, bool)>>> = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&calls);
    let renderer: crate::RowRenderer = Rc::new(move |prefix: &str, index: usize, data: Option<&RowData>| {
        log.borrow_mut()
            .push((prefix.to_string(), index, data.is_some()));
        Text(&format!("row {index}"));
    });
    let props = FormSetProps::new(
        FormSetConfig::new("x", 1, 2, 0, 5),
        vec![row(json!({ "id": 1 }))],
    );

    let mut rule = ComposeTestRule::new();
    rule.set_content(move || {
        crate::AutorisatieFormSetWith(&props, Rc::clone(&renderer));
    })
    .expect("render");

    assert_eq!(
        calls.borrow().as_slice(),
        &[("x".to_string(), 0, true), ("x".to_string(), 1, false)]
    );
    let tree = rule.rendered().expect("render").expect("tree");
    assert!(tree.text_content().contains("row 0row 1"));
}
