use blockytry_input::{TickInput, keys};
use blockytry_kernel::TickHook;

/// Shell-level switches flipped by key presses, evaluated once per tick.
#[derive(Debug, Clone)]
pub struct ShellToggles {
    pub hud: bool,
    pub debug_hud: bool,
    pub vsync: bool,
    /// Set when `vsync` changed and the surface needs reconfiguring.
    pub vsync_changed: bool,
}

impl ShellToggles {
    pub fn new(vsync: bool) -> Self {
        Self {
            hud: true,
            debug_hud: false,
            vsync,
            vsync_changed: false,
        }
    }

    /// Clear and return the pending vsync change.
    pub fn take_vsync_change(&mut self) -> Option<bool> {
        std::mem::take(&mut self.vsync_changed).then_some(self.vsync)
    }
}

impl TickHook for ShellToggles {
    fn on_tick(&mut self, input: &TickInput<'_>) {
        if input.is_down(keys::F1) > 0 {
            self.hud = !self.hud;
            tracing::debug!(hud = self.hud, "toggled HUD");
        }
        if input.is_down(keys::F3) > 0 {
            self.debug_hud = !self.debug_hud;
            tracing::debug!(debug_hud = self.debug_hud, "toggled debug HUD");
        }
        if input.is_down(keys::V) > 0 && input.ledger.is_pressed(keys::LEFT_CONTROL) {
            self.vsync = !self.vsync;
            self.vsync_changed = true;
            tracing::info!(vsync = self.vsync, "toggled vsync");
        }
    }
}
