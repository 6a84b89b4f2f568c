//! Visibility Tracking - at-most-once sightings of page elements
//!
//! A tracker watches a set of targets for one concern. The first qualifying
//! intersection marks the target seen, emits one `Sighting` on the channel
//! and unobserves the target. Later entries for the same target are ignored.

use std::collections::{BTreeMap, HashSet};

use tokio::sync::mpsc::UnboundedSender;

/// Grow-only set of entity identifiers that have already fired.
#[derive(Debug, Clone, Default)]
pub struct SeenSet {
    seen: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `id` was not seen before.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concern {
    CaseCard,
    CaseSection,
    Reveal,
}

impl Concern {
    /// Minimum intersection ratio for a sighting.
    pub fn threshold(self) -> f64 {
        match self {
            Self::CaseCard => 0.55,
            Self::CaseSection => 0.35,
            Self::Reveal => 0.15,
        }
    }

    pub fn qualifies(self, entry: &IntersectionEntry) -> bool {
        entry.is_intersecting && entry.ratio >= self.threshold()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEntry {
    pub target: String,
    pub is_intersecting: bool,
    pub ratio: f64,
}

impl IntersectionEntry {
    pub fn new(target: &str, is_intersecting: bool, ratio: f64) -> Self {
        Self {
            target: target.to_string(),
            is_intersecting,
            ratio,
        }
    }

    pub fn measure(target: &str, rect: Rect, viewport: Viewport) -> Self {
        let ratio = rect.intersection_ratio(&viewport.visible_rect());
        Self::new(target, ratio > 0.0, ratio)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    pub concern: Concern,
    pub key: String,
    pub label: Option<String>,
}

pub struct VisibilityTracker {
    concern: Concern,
    observed: BTreeMap<String, Option<String>>,
    seen: SeenSet,
    sink: UnboundedSender<Sighting>,
}

impl VisibilityTracker {
    pub fn new(concern: Concern, sink: UnboundedSender<Sighting>) -> Self {
        Self {
            concern,
            observed: BTreeMap::new(),
            seen: SeenSet::new(),
            sink,
        }
    }

    /// Start watching `key`. Empty or already-seen keys are not observed.
    pub fn observe(&mut self, key: &str, label: Option<String>) -> bool {
        if key.is_empty() || self.seen.contains(key) {
            return false;
        }
        self.observed.insert(key.to_string(), label);
        true
    }

    pub fn is_observing(&self, key: &str) -> bool {
        self.observed.contains_key(key)
    }

    /// Process one observer callback worth of entries. Returns how many fired.
    pub fn handle(&mut self, entries: &[IntersectionEntry]) -> usize {
        let mut fired = 0;
        for entry in entries {
            if !self.observed.contains_key(&entry.target) || !self.concern.qualifies(entry) {
                continue;
            }
            let label = self.observed.remove(&entry.target).flatten();
            if !self.seen.insert(&entry.target) {
                continue;
            }
            let sighting = Sighting {
                concern: self.concern,
                key: entry.target.clone(),
                label,
            };
            if self.sink.send(sighting).is_err() {
                tracing::debug!(key = %entry.target, "sighting receiver closed");
            }
            fired += 1;
        }
        fired
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Share of this rect's area that lies inside `other`.
    pub fn intersection_ratio(&self, other: &Rect) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        let w = (self.left + self.width).min(other.left + other.width) - self.left.max(other.left);
        let h = (self.top + self.height).min(other.top + other.height) - self.top.max(other.top);
        if w <= 0.0 || h <= 0.0 {
            return 0.0;
        }
        (w * h / area).min(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn visible_rect(&self) -> Rect {
        Rect::new(0.0, self.scroll_y, self.width, self.height)
    }
}

/// Coalesces bursts of scroll events into one update per animation frame.
#[derive(Debug, Clone, Default)]
pub struct FrameThrottle {
    pending: bool,
}

impl FrameThrottle {
    /// Returns true when the caller should schedule a frame.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn complete(&mut self) {
        self.pending = false;
    }
}

/// Floating booking button shown once the visitor scrolls past the fold.
#[derive(Debug, Clone)]
pub struct StickyCta {
    threshold: f64,
    visible: bool,
    throttle: FrameThrottle,
}

impl StickyCta {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            threshold: Self::threshold_for(viewport_height),
            visible: false,
            throttle: FrameThrottle::default(),
        }
    }

    pub fn threshold_for(viewport_height: f64) -> f64 {
        (viewport_height * 0.6).round().max(280.0)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn on_scroll(&mut self) -> bool {
        self.throttle.request()
    }

    /// Animation-frame callback. Returns the new visibility.
    pub fn on_frame(&mut self, scroll_y: f64) -> bool {
        self.throttle.complete();
        self.update(scroll_y)
    }

    pub fn on_resize(&mut self, viewport_height: f64, scroll_y: f64) -> bool {
        self.threshold = Self::threshold_for(viewport_height);
        self.update(scroll_y)
    }

    pub fn update(&mut self, scroll_y: f64) -> bool {
        self.visible = scroll_y > self.threshold;
        self.visible
    }
}
