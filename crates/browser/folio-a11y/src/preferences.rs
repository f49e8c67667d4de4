//! Accessibility Preferences
//!
//! User-level display and interaction settings shared by the whole app.
//! The store is the single writer: components read snapshots and
//! subscribe to changes instead of polling.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_dom::Document;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::A11yError;

/// Base font size preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

impl FontSize {
    /// Multiplier applied to the root font size
    pub fn factor(self) -> f64 {
        match self {
            Self::Small => 0.875,
            Self::Medium => 1.0,
            Self::Large => 1.25,
            Self::ExtraLarge => 1.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::ExtraLarge => "extra-large",
        }
    }
}

/// Contrast mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContrastMode {
    #[default]
    Normal,
    High,
    Inverted,
}

impl ContrastMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::High => "high",
            Self::Inverted => "inverted",
        }
    }
}

/// Line spacing preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineSpacing {
    #[default]
    Normal,
    Relaxed,
    Loose,
}

impl LineSpacing {
    pub fn line_height(self) -> f64 {
        match self {
            Self::Normal => 1.5,
            Self::Relaxed => 1.8,
            Self::Loose => 2.1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Relaxed => "relaxed",
            Self::Loose => "loose",
        }
    }
}

/// Snapshot of the user's accessibility settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessibilityPreferences {
    pub font_size: FontSize,
    pub contrast: ContrastMode,
    pub reduced_motion: bool,
    pub keyboard_navigation: bool,
    pub grayscale: bool,
    pub line_spacing: LineSpacing,
}

impl AccessibilityPreferences {
    pub fn font_scale(&self) -> f64 {
        self.font_size.factor()
    }

    pub fn line_height(&self) -> f64 {
        self.line_spacing.line_height()
    }

    /// Duration an animation should run for under these settings
    pub fn animation_duration(&self, requested: Duration) -> Duration {
        if self.reduced_motion { Duration::ZERO } else { requested }
    }

    /// Merge a partial update into a copy of this snapshot
    pub fn merged(&self, patch: &PreferencesPatch) -> Self {
        Self {
            font_size: patch.font_size.unwrap_or(self.font_size),
            contrast: patch.contrast.unwrap_or(self.contrast),
            reduced_motion: patch.reduced_motion.unwrap_or(self.reduced_motion),
            keyboard_navigation: patch.keyboard_navigation.unwrap_or(self.keyboard_navigation),
            grayscale: patch.grayscale.unwrap_or(self.grayscale),
            line_spacing: patch.line_spacing.unwrap_or(self.line_spacing),
        }
    }
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesPatch {
    pub font_size: Option<FontSize>,
    pub contrast: Option<ContrastMode>,
    pub reduced_motion: Option<bool>,
    pub keyboard_navigation: Option<bool>,
    pub grayscale: Option<bool>,
    pub line_spacing: Option<LineSpacing>,
}

/// Where the serialized preferences blob lives
pub trait PreferencesStorage {
    /// The stored blob, or `None` if nothing was saved yet
    fn load(&self) -> Result<Option<String>, A11yError>;

    fn save(&mut self, blob: &str) -> Result<(), A11yError>;
}

/// In-memory storage
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Option<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: &str) -> Self {
        Self { blob: Some(blob.to_string()) }
    }

    pub fn blob(&self) -> Option<&str> {
        self.blob.as_deref()
    }
}

impl PreferencesStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, A11yError> {
        Ok(self.blob.clone())
    }

    fn save(&mut self, blob: &str) -> Result<(), A11yError> {
        self.blob = Some(blob.to_string());
        Ok(())
    }
}

/// JSON file on disk
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/<key>.json`
    pub fn in_dir(dir: &Path, key: &str) -> Self {
        Self::new(dir.join(format!("{key}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferencesStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, A11yError> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, blob: &str) -> Result<(), A11yError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, blob)?;
        Ok(())
    }
}

/// Subscription handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&AccessibilityPreferences)>;

/// Shared preferences store
pub struct PreferencesStore<S: PreferencesStorage> {
    current: AccessibilityPreferences,
    storage: S,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    /// The last save failed; the snapshot is not on disk yet
    unsaved: bool,
}

impl<S: PreferencesStorage> PreferencesStore<S> {
    /// Open the store, loading the persisted snapshot
    ///
    /// A missing, unreadable or corrupt blob yields the defaults.
    pub fn open(storage: S) -> Self {
        let current = match storage.load() {
            Ok(Some(blob)) => serde_json::from_str(&blob).unwrap_or_else(|err| {
                warn!(%err, "stored accessibility preferences are corrupt; using defaults");
                AccessibilityPreferences::default()
            }),
            Ok(None) => {
                debug!("no stored accessibility preferences");
                AccessibilityPreferences::default()
            }
            Err(err) => {
                warn!(%err, "could not read accessibility preferences; using defaults");
                AccessibilityPreferences::default()
            }
        };

        Self {
            current,
            storage,
            subscribers: Vec::new(),
            next_subscription: 1,
            unsaved: false,
        }
    }

    /// Current snapshot
    pub fn get(&self) -> &AccessibilityPreferences {
        &self.current
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Merge `patch`, notify subscribers and persist
    ///
    /// The in-memory snapshot and subscribers are always updated; a
    /// persistence failure is returned afterwards. After a failed save the
    /// next update or reset persists even if nothing changed.
    pub fn update(&mut self, patch: PreferencesPatch) -> Result<(), A11yError> {
        let next = self.current.merged(&patch);
        self.replace(next)
    }

    /// Restore defaults, notify subscribers and persist
    pub fn reset(&mut self) -> Result<(), A11yError> {
        self.replace(AccessibilityPreferences::default())
    }

    fn replace(&mut self, next: AccessibilityPreferences) -> Result<(), A11yError> {
        if next != self.current {
            self.current = next;
            debug!(preferences = ?self.current, "accessibility preferences changed");

            for (_, subscriber) in &mut self.subscribers {
                subscriber(&self.current);
            }
        } else if !self.unsaved {
            return Ok(());
        }

        let saved = serde_json::to_string(&self.current)
            .map_err(A11yError::from)
            .and_then(|blob| self.storage.save(&blob));
        self.unsaved = saved.is_err();
        if let Err(err) = &saved {
            warn!(%err, "accessibility preferences not persisted");
        }
        saved
    }

    /// Whether the current snapshot failed to persist
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Register a change observer
    pub fn subscribe(&mut self, subscriber: impl FnMut(&AccessibilityPreferences) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }
}

impl<S: PreferencesStorage + fmt::Debug> fmt::Debug for PreferencesStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferencesStore")
            .field("current", &self.current)
            .field("storage", &self.storage)
            .field("subscribers", &self.subscribers.len())
            .field("unsaved", &self.unsaved)
            .finish()
    }
}

/// Mirror a snapshot onto the document element as attributes and classes
pub fn apply_to_document(doc: &mut Document, prefs: &AccessibilityPreferences) -> Result<(), A11yError> {
    let html = doc.document_element();
    let tree = doc.tree_mut();

    tree.set_attribute(html, "data-font-size", prefs.font_size.as_str())?;
    tree.set_attribute(html, "data-line-spacing", prefs.line_spacing.as_str())?;
    tree.set_attribute(html, "data-contrast", prefs.contrast.as_str())?;

    for (class, enabled) in [
        ("high-contrast", prefs.contrast != ContrastMode::Normal),
        ("reduce-motion", prefs.reduced_motion),
        ("grayscale", prefs.grayscale),
        ("keyboard-nav", prefs.keyboard_navigation),
    ] {
        if enabled {
            tree.add_class(html, class)?;
        } else {
            tree.remove_class(html, class)?;
        }
    }
    Ok(())
}
