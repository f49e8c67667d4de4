//! Screen Reader Announcer
//!
//! Pushes short status messages to assistive technology through two
//! visually hidden live regions, one polite and one assertive. Each
//! message is its own child element and is removed after a short delay,
//! so announcing the same text twice is heard twice.
//!
//! Concurrent announcements are neither queued nor deduplicated; a burst
//! may overlap or be partly dropped by the screen reader.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use folio_dom::{Document, NodeId, TimerQueue};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::A11yError;

/// Live region politeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Politeness {
    /// Routine status: route changes, panels opening and closing
    #[default]
    Polite,
    /// Interruptive messages such as errors
    Assertive,
}

impl Politeness {
    pub fn aria_live(self) -> &'static str {
        match self {
            Self::Polite => "polite",
            Self::Assertive => "assertive",
        }
    }

    pub fn role(self) -> &'static str {
        match self {
            Self::Polite => "status",
            Self::Assertive => "alert",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "polite" => Some(Self::Polite),
            "assertive" => Some(Self::Assertive),
            _ => None,
        }
    }
}

/// Announcer configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnnouncerConfig {
    /// How long a message stays in its region
    pub clear_after_ms: u64,
    pub polite_id: String,
    pub assertive_id: String,
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            clear_after_ms: 1000,
            polite_id: "folio-announcer-polite".to_string(),
            assertive_id: "folio-announcer-assertive".to_string(),
        }
    }
}

impl AnnouncerConfig {
    pub fn clear_after(&self) -> Duration {
        Duration::from_millis(self.clear_after_ms)
    }

    fn region_id(&self, politeness: Politeness) -> &str {
        match politeness {
            Politeness::Polite => &self.polite_id,
            Politeness::Assertive => &self.assertive_id,
        }
    }
}

/// Live-region announcer bound to a document
#[derive(Debug)]
pub struct Announcer {
    config: AnnouncerConfig,
    polite: NodeId,
    assertive: NodeId,
    removals: TimerQueue<NodeId>,
}

impl Announcer {
    /// Find or create both live regions in `doc`
    ///
    /// Installing twice into the same document reuses the existing regions.
    pub fn install(doc: &mut Document, config: AnnouncerConfig) -> Result<Self, A11yError> {
        let polite = ensure_region(doc, &config, Politeness::Polite)?;
        let assertive = ensure_region(doc, &config, Politeness::Assertive)?;
        debug!(polite = %polite, assertive = %assertive, "announcer installed");
        Ok(Self {
            config,
            polite,
            assertive,
            removals: TimerQueue::new(),
        })
    }

    pub fn config(&self) -> &AnnouncerConfig {
        &self.config
    }

    /// Live region element for a politeness level
    pub fn region(&self, politeness: Politeness) -> NodeId {
        match politeness {
            Politeness::Polite => self.polite,
            Politeness::Assertive => self.assertive,
        }
    }

    /// Announce `text`; fire-and-forget
    pub fn announce(&mut self, doc: &mut Document, text: &str, politeness: Politeness) {
        self.announce_at(doc, text, politeness, Instant::now());
    }

    /// Announce with an explicit clock reading
    pub fn announce_at(
        &mut self,
        doc: &mut Document,
        text: &str,
        politeness: Politeness,
        now: Instant,
    ) {
        if text.trim().is_empty() {
            return;
        }

        match self.insert_message(doc, text, politeness) {
            Ok(message) => {
                self.removals.schedule(self.config.clear_after(), now, message);
                trace!(%text, ?politeness, node = %message, "announced");
            }
            Err(err) => warn!(%err, %text, "announcement dropped"),
        }
    }

    fn insert_message(
        &mut self,
        doc: &mut Document,
        text: &str,
        politeness: Politeness,
    ) -> Result<NodeId, A11yError> {
        let region = self.region(politeness);
        let region = if region_is_live(doc, &self.config, region, politeness) {
            region
        } else {
            let other = match politeness {
                Politeness::Polite => Politeness::Assertive,
                Politeness::Assertive => Politeness::Polite,
            };
            // Neither region lives in `doc`: pending removals point into
            // another document
            if !region_is_live(doc, &self.config, self.region(other), other) {
                self.removals.clear();
            }
            let fresh = ensure_region(doc, &self.config, politeness)?;
            match politeness {
                Politeness::Polite => self.polite = fresh,
                Politeness::Assertive => self.assertive = fresh,
            }
            fresh
        };

        let message = doc.tree.create_element("div");
        let content = doc.tree.create_text(text);
        doc.tree.append_child(message, content)?;
        doc.tree.append_child(region, message)?;
        Ok(message)
    }

    /// Remove messages whose display time is over; returns how many were
    /// removed
    ///
    /// Only children of this announcer's live regions in `doc` are removed.
    /// Sweeping a document that holds neither region leaves the queue
    /// untouched.
    pub fn sweep(&mut self, doc: &mut Document, now: Instant) -> usize {
        let regions: Vec<NodeId> = [Politeness::Polite, Politeness::Assertive]
            .into_iter()
            .filter(|&p| region_is_live(doc, &self.config, self.region(p), p))
            .map(|p| self.region(p))
            .collect();
        if regions.is_empty() {
            return 0;
        }

        self.removals
            .take_due(now)
            .into_iter()
            .filter(|&(_, message)| {
                doc.tree.parent(message).is_some_and(|p| regions.contains(&p))
                    && doc.tree.destroy(message).is_ok()
            })
            .count()
    }

    /// Messages still waiting for removal
    pub fn pending(&self) -> usize {
        self.removals.len()
    }

    /// Time until the next removal is due
    pub fn next_sweep_in(&self, now: Instant) -> Option<Duration> {
        self.removals.time_until_next(now)
    }

    pub fn announce_route_change(&mut self, doc: &mut Document, title: &str) {
        self.announce(doc, &format!("Navigated to {title}"), Politeness::Polite);
    }

    pub fn announce_panel(&mut self, doc: &mut Document, name: &str, opened: bool) {
        let state = if opened { "opened" } else { "closed" };
        self.announce(doc, &format!("{name} {state}"), Politeness::Polite);
    }
}

fn region_is_live(doc: &Document, config: &AnnouncerConfig, region: NodeId, politeness: Politeness) -> bool {
    doc.tree.is_connected(region)
        && doc.tree.get_attribute(region, "id") == Some(config.region_id(politeness))
}

fn ensure_region(
    doc: &mut Document,
    config: &AnnouncerConfig,
    politeness: Politeness,
) -> Result<NodeId, A11yError> {
    let id = config.region_id(politeness);
    if let Some(existing) = doc.get_element_by_id(id) {
        return Ok(existing);
    }

    let region = doc.tree.create_element("div");
    for (name, value) in [
        ("id", id),
        ("aria-live", politeness.aria_live()),
        ("role", politeness.role()),
        ("aria-atomic", "true"),
        ("class", "sr-only"),
    ] {
        doc.tree.set_attribute(region, name, value)?;
    }
    let body = doc.body();
    doc.tree.append_child(body, region)?;
    Ok(region)
}

/// Process-wide announcer
///
/// Initialised once at application start and never torn down in
/// production; `reset` exists for test harnesses. Calling `announce`
/// before `init` installs an announcer with the default configuration.
pub mod global {
    use super::*;

    thread_local! {
        static ANNOUNCER: RefCell<Option<Announcer>> = const { RefCell::new(None) };
    }

    /// Install the process-wide announcer into `doc`, replacing any other
    pub fn init(doc: &mut Document, config: AnnouncerConfig) -> Result<(), A11yError> {
        let announcer = Announcer::install(doc, config)?;
        ANNOUNCER.with(|slot| *slot.borrow_mut() = Some(announcer));
        Ok(())
    }

    pub fn is_initialized() -> bool {
        ANNOUNCER.with(|slot| slot.borrow().is_some())
    }

    pub fn announce(doc: &mut Document, text: &str, politeness: Politeness) {
        announce_at(doc, text, politeness, Instant::now());
    }

    pub fn announce_at(doc: &mut Document, text: &str, politeness: Politeness, now: Instant) {
        ANNOUNCER.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_none() {
                match Announcer::install(doc, AnnouncerConfig::default()) {
                    Ok(announcer) => *slot = Some(announcer),
                    Err(err) => {
                        warn!(%err, "announcer unavailable");
                        return;
                    }
                }
            }
            if let Some(announcer) = slot.as_mut() {
                announcer.announce_at(doc, text, politeness, now);
            }
        });
    }

    pub fn sweep(doc: &mut Document, now: Instant) -> usize {
        ANNOUNCER.with(|slot| slot.borrow_mut().as_mut().map_or(0, |a| a.sweep(doc, now)))
    }

    /// Drop the process-wide announcer; its regions stay in their document
    pub fn reset() {
        ANNOUNCER.with(|slot| *slot.borrow_mut() = None);
    }
}
