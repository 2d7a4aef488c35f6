//! Screen state representation
//!
//! Tracks which UI surface is visible and what each surface derived from
//! the current screenshot.

use serde::{Deserialize, Serialize};

use crate::vision::Screenshot;

/// Which surface answers statistics queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenState {
    /// The statistics overlay covers the game view
    OverlayOpen,
    /// Only the permanent HUD is visible
    OverlayClosed,
}

impl ScreenState {
    /// True if the overlay answers queries
    pub fn is_overlay_open(&self) -> bool {
        matches!(self, ScreenState::OverlayOpen)
    }
}

/// State of the reader across updates
#[derive(Debug, Clone)]
pub struct ScreenTracker {
    /// Current state
    pub state: ScreenState,
    /// State before the last transition
    pub previous_state: ScreenState,
    /// Number of updates since the last transition
    pub updates_in_state: u32,
}

impl Default for ScreenTracker {
    fn default() -> Self {
        Self {
            state: ScreenState::OverlayClosed,
            previous_state: ScreenState::OverlayClosed,
            updates_in_state: 0,
        }
    }
}

impl ScreenTracker {
    /// Tracker starting with the overlay closed
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state seen in the latest screenshot
    pub fn update_state(&mut self, new_state: ScreenState) {
        if new_state != self.state {
            self.previous_state = self.state;
            self.state = new_state;
            self.updates_in_state = 0;
            self.on_state_transition(self.previous_state, new_state);
        } else {
            self.updates_in_state += 1;
        }
    }

    fn on_state_transition(&self, from: ScreenState, to: ScreenState) {
        match (from, to) {
            (_, ScreenState::OverlayOpen) => log::info!("Statistics overlay opened"),
            (_, ScreenState::OverlayClosed) => log::info!("Statistics overlay closed"),
        }
    }
}

/// Values a surface derived from one screenshot
///
/// Everything is dropped on [`SurfaceState::reset`], so nothing outlives
/// the update cycle it was computed in.
#[derive(Debug, Clone, Default)]
pub struct SurfaceState {
    open: bool,
    screenshot: Option<Screenshot>,
    selected_island: Option<String>,
}

impl SurfaceState {
    /// Forget everything derived from the previous screenshot
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Keep `screenshot` if the surface is visible in it
    pub fn capture(&mut self, screenshot: &Screenshot, open: bool) {
        self.open = open;
        self.screenshot = open.then(|| screenshot.clone());
    }

    /// True if the surface is visible in the current screenshot
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current screenshot, kept only while the surface is visible
    pub fn screenshot(&self) -> Option<&Screenshot> {
        self.screenshot.as_ref()
    }

    /// Island name read during this update, if any
    pub fn selected_island(&self) -> Option<&str> {
        self.selected_island.as_deref()
    }

    /// Remember the island name until the next reset
    pub fn cache_selected_island(&mut self, island: String) -> &str {
        self.selected_island.insert(island)
    }
}
