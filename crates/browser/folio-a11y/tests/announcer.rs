//! Live-region announcements

use std::time::{Duration, Instant};

use folio_a11y::announcer::global;
use folio_a11y::{Announcer, AnnouncerConfig, Politeness};
use folio_dom::{Document, NodeId};

fn messages(doc: &Document, region: NodeId) -> Vec<String> {
    doc.tree
        .children(region)
        .map(|m| doc.tree.text_content(m))
        .collect()
}

#[test]
fn test_panel_opened_is_announced_then_removed() {
    let mut doc = Document::default();
    let body = doc.body();
    let search = doc.tree.create_element("input");
    doc.tree.append_child(body, search).unwrap();
    doc.focus(search);

    let mut announcer = Announcer::install(&mut doc, AnnouncerConfig::default()).unwrap();
    let start = Instant::now();
    announcer.announce_at(&mut doc, "Panel opened", Politeness::Polite, start);

    let region = announcer.region(Politeness::Polite);
    assert_eq!(doc.tree.get_attribute(region, "aria-live"), Some("polite"));
    assert_eq!(messages(&doc, region), vec!["Panel opened"]);
    assert_eq!(doc.active_element(), Some(search));

    assert_eq!(announcer.sweep(&mut doc, start + Duration::from_millis(500)), 0);
    assert_eq!(messages(&doc, region).len(), 1);

    assert_eq!(announcer.sweep(&mut doc, start + Duration::from_millis(1000)), 1);
    assert!(messages(&doc, region).is_empty());
    assert_eq!(doc.active_element(), Some(search));
    assert_eq!(announcer.pending(), 0);
}

#[test]
fn test_identical_messages_can_repeat() {
    let mut doc = Document::default();
    let mut announcer = Announcer::install(&mut doc, AnnouncerConfig::default()).unwrap();
    let start = Instant::now();
    let region = announcer.region(Politeness::Polite);

    announcer.announce_at(&mut doc, "Settings reset", Politeness::Polite, start);
    announcer.sweep(&mut doc, start + Duration::from_secs(1));
    announcer.announce_at(&mut doc, "Settings reset", Politeness::Polite, start + Duration::from_secs(2));
    announcer.announce_at(&mut doc, "Settings reset", Politeness::Polite, start + Duration::from_secs(2));

    assert_eq!(messages(&doc, region), vec!["Settings reset", "Settings reset"]);
}

#[test]
fn test_assertive_region() {
    let mut doc = Document::default();
    let mut announcer = Announcer::install(&mut doc, AnnouncerConfig::default()).unwrap();
    announcer.announce(&mut doc, "Could not save note", Politeness::Assertive);

    let region = announcer.region(Politeness::Assertive);
    assert_eq!(doc.tree.get_attribute(region, "aria-live"), Some("assertive"));
    assert_eq!(doc.tree.get_attribute(region, "role"), Some("alert"));
    assert_eq!(messages(&doc, region), vec!["Could not save note"]);
    assert!(messages(&doc, announcer.region(Politeness::Polite)).is_empty());
}

#[test]
fn test_removed_message_is_skipped_by_sweep() {
    let mut doc = Document::default();
    let mut announcer = Announcer::install(&mut doc, AnnouncerConfig::default()).unwrap();
    let start = Instant::now();
    announcer.announce_at(&mut doc, "Navigated to Notes", Politeness::Polite, start);

    let region = announcer.region(Politeness::Polite);
    doc.tree.destroy(region).unwrap();
    assert_eq!(announcer.sweep(&mut doc, start + Duration::from_secs(2)), 0);
}

#[test]
fn test_custom_delay() {
    let mut doc = Document::default();
    let config = AnnouncerConfig { clear_after_ms: 250, ..Default::default() };
    let mut announcer = Announcer::install(&mut doc, config).unwrap();
    let start = Instant::now();
    announcer.announce_at(&mut doc, "Saved", Politeness::Polite, start);

    assert_eq!(announcer.next_sweep_in(start), Some(Duration::from_millis(250)));
    assert_eq!(announcer.sweep(&mut doc, start + Duration::from_millis(250)), 1);
}

#[test]
fn test_global_announcer_lifecycle() {
    global::reset();
    let mut doc = Document::default();
    assert!(!global::is_initialized());

    global::init(&mut doc, AnnouncerConfig::default()).unwrap();
    assert!(global::is_initialized());

    let start = Instant::now();
    global::announce_at(&mut doc, "Panel opened", Politeness::Polite, start);
    let region = doc.get_element_by_id("folio-announcer-polite").unwrap();
    assert_eq!(messages(&doc, region), vec!["Panel opened"]);

    assert_eq!(global::sweep(&mut doc, start + Duration::from_secs(1)), 1);
    assert!(messages(&doc, region).is_empty());

    global::reset();
    assert!(!global::is_initialized());
    assert_eq!(global::sweep(&mut doc, start + Duration::from_secs(5)), 0);
}

#[test]
fn test_global_announce_installs_lazily() {
    global::reset();
    let mut doc = Document::default();
    global::announce(&mut doc, "Navigated to Library", Politeness::Polite);

    assert!(global::is_initialized());
    let region = doc.get_element_by_id("folio-announcer-polite").unwrap();
    assert_eq!(messages(&doc, region), vec!["Navigated to Library"]);
    global::reset();
}

#[test]
fn test_sweep_leaves_other_documents_alone() {
    global::reset();
    let mut library = Document::default();
    global::init(&mut library, AnnouncerConfig::default()).unwrap();
    let start = Instant::now();
    global::announce_at(&mut library, "Panel opened", Politeness::Polite, start);

    let mut reader = Document::new("folio://reader");
    let body = reader.body();
    for i in 0..12 {
        let b = reader.tree.create_element("button");
        let label = reader.tree.create_text(&format!("Chapter {i}"));
        reader.tree.append_child(b, label).unwrap();
        reader.tree.append_child(body, b).unwrap();
    }
    let nodes_before = reader.tree.len();

    assert_eq!(global::sweep(&mut reader, start + Duration::from_secs(2)), 0);
    assert_eq!(reader.tree.len(), nodes_before);

    // The message is still removed from its own document
    let region = library.get_element_by_id("folio-announcer-polite").unwrap();
    assert_eq!(global::sweep(&mut library, start + Duration::from_secs(2)), 1);
    assert!(messages(&library, region).is_empty());
    global::reset();
}

#[test]
fn test_moving_to_another_document_drops_stale_removals() {
    let mut first = Document::default();
    let mut announcer = Announcer::install(&mut first, AnnouncerConfig::default()).unwrap();
    let start = Instant::now();
    announcer.announce_at(&mut first, "Navigated to Notes", Politeness::Polite, start);

    let mut second = Document::new("folio://second");
    let body = second.body();
    for _ in 0..8 {
        let p = second.tree.create_element("p");
        second.tree.append_child(body, p).unwrap();
    }
    announcer.announce_at(&mut second, "Navigated to Reader", Politeness::Polite, start);
    assert_eq!(announcer.pending(), 1);

    let nodes_before = second.tree.len();
    assert_eq!(announcer.sweep(&mut second, start + Duration::from_secs(1)), 1);
    assert_eq!(second.tree.len(), nodes_before - 2);
    assert!(messages(&second, announcer.region(Politeness::Polite)).is_empty());
}
