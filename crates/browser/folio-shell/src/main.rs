//! Folio Shell - replays a keyboard script against the demo library page
//!
//! Usage: `folio-shell [--config PATH] [KEYS]`, where KEYS is a comma
//! separated list of chords such as `Tab,Tab,Shift+Tab,Escape`.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use folio_a11y::announcer::global;
use folio_a11y::{
    activate_trap, apply_to_document, audit_document, press_key, A11yConfig, IssueSeverity,
    MemoryStorage, Politeness, PreferencesPatch, PreferencesStore,
};
use folio_dom::{Document, KeyboardEvent, NodeId};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_SCRIPT: &str = "Tab,Tab,Tab,Shift+Tab,Escape";

/// Simulated time between two key presses
const KEY_INTERVAL: Duration = Duration::from_millis(400);

struct Args {
    config: Option<PathBuf>,
    script: String,
}

fn parse_args() -> Result<Args> {
    let mut config = None;
    let mut script = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config needs a path")?;
                config = Some(PathBuf::from(path));
            }
            other if other.starts_with('-') && other != "-" => bail!("unknown option {other}"),
            other => script = Some(other.to_string()),
        }
    }
    Ok(Args {
        config,
        script: script.unwrap_or_else(|| DEFAULT_SCRIPT.to_string()),
    })
}

struct DemoPage {
    doc: Document,
    settings_button: NodeId,
    panel: NodeId,
}

fn element(doc: &mut Document, parent: NodeId, tag: &str, text: &str) -> Result<NodeId> {
    let el = doc.tree.create_element(tag);
    if !text.is_empty() {
        let content = doc.tree.create_text(text);
        doc.tree.append_child(el, content)?;
    }
    doc.tree.append_child(parent, el)?;
    Ok(el)
}

fn build_page() -> Result<DemoPage> {
    let mut doc = Document::new("folio://library");
    let html = doc.document_element();
    doc.tree.set_attribute(html, "lang", "en")?;
    let head = doc.head();
    element(&mut doc, head, "title", "Folio Library")?;

    let body = doc.body();
    let header = element(&mut doc, body, "header", "")?;
    element(&mut doc, header, "h1", "Library")?;
    let notes = element(&mut doc, header, "a", "Notes")?;
    doc.tree.set_attribute(notes, "href", "/notes")?;
    let settings_button = element(&mut doc, header, "button", "Settings")?;

    let panel = element(&mut doc, body, "div", "")?;
    doc.tree.set_attribute(panel, "role", "dialog")?;
    doc.tree.set_attribute(panel, "aria-label", "Accessibility settings")?;
    element(&mut doc, panel, "h2", "Accessibility")?;
    let label = element(&mut doc, panel, "label", "Font size")?;
    doc.tree.set_attribute(label, "for", "font-size")?;
    let select = element(&mut doc, panel, "select", "")?;
    doc.tree.set_attribute(select, "id", "font-size")?;
    element(&mut doc, panel, "button", "Reset")?;
    element(&mut doc, panel, "button", "Close")?;

    Ok(DemoPage { doc, settings_button, panel })
}

fn describe(doc: &Document, node: Option<NodeId>) -> String {
    let Some(node) = node else {
        return "nothing".to_string();
    };
    let tag = doc.tree.tag_name(node).unwrap_or("?");
    let text = doc.tree.text_content(node);
    let label = doc.tree.get_attribute(node, "id").unwrap_or(text.trim());
    if label.is_empty() {
        format!("<{tag}> {node}")
    } else {
        format!("<{tag}> \"{label}\"")
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => A11yConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => A11yConfig::default(),
    };

    info!("Starting Folio shell...");
    let DemoPage { mut doc, settings_button, panel } = build_page()?;
    global::init(&mut doc, config.announcer.clone())?;

    let mut preferences = PreferencesStore::open(MemoryStorage::new());
    preferences.update(PreferencesPatch {
        keyboard_navigation: Some(true),
        ..Default::default()
    })?;
    apply_to_document(&mut doc, preferences.get())?;

    let mut now = Instant::now();
    doc.focus(settings_button);
    let trap = activate_trap(&mut doc, panel, config.trap)?;
    global::announce_at(&mut doc, "Settings opened", Politeness::Polite, now);
    info!(focus = %describe(&doc, doc.active_element()), "settings panel opened");

    for chord in args.script.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        now += KEY_INTERVAL;
        let removed = global::sweep(&mut doc, now);
        let was_active = trap.is_active();

        let event = press_key(&mut doc, KeyboardEvent::parse(chord));
        info!(
            key = %event,
            prevented = event.is_default_prevented(),
            focus = %describe(&doc, doc.active_element()),
            removed_announcements = removed,
            "key pressed"
        );

        if was_active && !trap.is_active() {
            global::announce_at(&mut doc, "Settings closed", Politeness::Polite, now);
            info!(reason = ?trap.trap().release_reason(), "settings panel closed");
        }
    }

    if trap.is_active() {
        trap.deactivate(&mut doc);
        global::announce_at(&mut doc, "Settings closed", Politeness::Polite, now);
        info!("settings panel closed at end of script");
    }
    info!(focus = %describe(&doc, doc.active_element()), "script finished");

    let report = audit_document(&doc);
    for issue in &report.issues {
        warn!(severity = ?issue.severity(), wcag = issue.wcag_criterion(), "{issue}");
    }
    info!(
        score = report.score(),
        errors = report.count(IssueSeverity::Error),
        warnings = report.count(IssueSeverity::Warning),
        "accessibility audit"
    );

    Ok(())
}
