use markup_field_engine::{
    Alignment, ConfigLayer, EngineKind, FieldRegistry, HostCapabilities, KeyEvent,
    NotificationLog, Page, Postback, codes,
};
use rstest::rstest;

const STORY: &str = r#"<form id="form" action="/stories" method="post"><div id="story" type="area" style="padding-left: 10px; width: 400px">Intro <b>bold</b> and <a href="/x">link</a></div></form>"#;

fn ctrl(key: char) -> KeyEvent {
    KeyEvent::new(key.to_ascii_uppercase() as u32).with_ctrl()
}

/// Edits the story field the same way whatever the host supports.
fn edit_story(capabilities: HostCapabilities) -> (Page, FieldRegistry) {
    let mut page = Page::with_capabilities(STORY, capabilities);
    let mut registry = FieldRegistry::new(ConfigLayer::default(), Box::new(NotificationLog::new()));
    let container = page.element("story").unwrap();
    registry
        .create(&mut page, container, &ConfigLayer::default(), None)
        .unwrap();

    registry.focus(&mut page, "story").unwrap();
    registry.advance_time(&mut page, 200);

    registry.type_text(&mut page, "story", " end").unwrap();
    registry.select(&mut page, "story", 0, 5).unwrap();
    registry.key_down(&mut page, "story", &ctrl('b')).unwrap();
    registry
        .key_down(&mut page, "story", &KeyEvent::new(codes::TAB))
        .unwrap();
    registry.key_down(&mut page, "story", &ctrl('e')).unwrap();
    registry.advance_time(&mut page, 100);

    (page, registry)
}

mod engine_independence_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case::isolated_document(HostCapabilities::design_mode(), EngineKind::IsolatedDocument)]
    #[case::content_editable(HostCapabilities::content_editable(), EngineKind::ContentEditable)]
    #[case::legacy_selection(HostCapabilities::legacy(), EngineKind::LegacySelection)]
    fn same_edits_post_the_same_values(
        #[case] capabilities: HostCapabilities,
        #[case] expected_kind: EngineKind,
    ) {
        // Given the same field on a host with one of the editing substrates
        // When the same edits are made
        let (page, registry) = edit_story(capabilities);

        // Then the field posts the same values
        assert_eq!(
            registry.field("story").unwrap().engine().kind(),
            expected_kind
        );
        assert_eq!(
            registry.postback(&page, "story").unwrap(),
            Postback {
                html: r#"<b>Intro</b> <b>bold</b> and <a href="/x">link</a> end"#.to_string(),
                indent: 30,
                align: Alignment::Center,
            }
        );
    }

    #[rstest]
    #[case::isolated_document(HostCapabilities::design_mode())]
    #[case::content_editable(HostCapabilities::content_editable())]
    #[case::legacy_selection(HostCapabilities::legacy())]
    fn submitted_form_values_match(#[case] capabilities: HostCapabilities) {
        let (mut page, mut registry) = edit_story(capabilities);

        let submission = registry.submit_form(&mut page, "form").unwrap();

        assert_eq!(
            submission.values,
            vec![
                (
                    "story".to_string(),
                    r#"<b>Intro</b> <b>bold</b> and <a href="/x">link</a> end"#.to_string()
                ),
                ("story_indent".to_string(), "30".to_string()),
                ("story_align".to_string(), "center".to_string()),
            ]
        );
    }

    #[test]
    fn isolated_fields_edit_a_copy_of_the_container() {
        let (page, registry) = edit_story(HostCapabilities::design_mode());
        let container = page.element("story").unwrap();

        // The container is hidden and untouched; the frame took its box
        assert_eq!(
            page.dom.style_property(container, "display").as_deref(),
            Some("none")
        );
        assert_eq!(
            page.dom.inner_html(container),
            r#"Intro <b>bold</b> and <a href="/x">link</a>"#
        );
        let frame = page.element("story_frame").unwrap();
        assert_eq!(
            page.dom.style_property(frame, "width").as_deref(),
            Some("360px")
        );
        assert_eq!(
            registry.value(&page, "story").unwrap(),
            registry.postback(&page, "story").unwrap().html
        );
    }
}
