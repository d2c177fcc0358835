/// Cursor movement accumulated over one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseDelta {
    /// Rightward movement in window units.
    pub x: f32,
    /// Upward movement in window units (window y grows downward).
    pub y: f32,
}

impl MouseDelta {
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// Turns absolute cursor samples into per-frame movement.
///
/// The first sample only seeds the last known position. Reset once per frame
/// after the simulation has consumed the delta.
#[derive(Debug, Clone, Default)]
pub struct MouseAxes {
    last: Option<(f64, f64)>,
    delta: MouseDelta,
}

impl MouseAxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed an absolute cursor position.
    pub fn update(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.last {
            self.delta.x += (x - last_x) as f32;
            self.delta.y += (last_y - y) as f32;
        }
        self.last = Some((x, y));
    }

    /// Movement accumulated since the last reset.
    pub fn delta(&self) -> MouseDelta {
        self.delta
    }

    /// Clear the accumulated movement. The last position is kept.
    pub fn reset(&mut self) {
        self.delta = MouseDelta::default();
    }

    /// Forget the last position, e.g. after the cursor was recaptured.
    pub fn reseed(&mut self) {
        self.last = None;
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_produces_no_movement() {
        let mut axes = MouseAxes::new();
        axes.update(400.0, 300.0);
        assert!(axes.delta().is_zero());
    }

    #[test]
    fn samples_accumulate_within_a_frame() {
        let mut axes = MouseAxes::new();
        axes.update(0.0, 0.0);
        axes.update(3.0, 2.0);
        axes.update(5.0, 1.0);
        let d = axes.delta();
        assert_eq!(d.x, 5.0);
        // Moving the cursor down the window reads as negative.
        assert_eq!(d.y, -1.0);
    }

    #[test]
    fn reset_keeps_last_position() {
        let mut axes = MouseAxes::new();
        axes.update(10.0, 10.0);
        axes.update(12.0, 10.0);
        axes.reset();
        assert!(axes.delta().is_zero());
        axes.update(13.0, 10.0);
        assert_eq!(axes.delta().x, 1.0);
    }

    #[test]
    fn reseed_skips_the_jump() {
        let mut axes = MouseAxes::new();
        axes.update(10.0, 10.0);
        axes.reseed();
        axes.update(500.0, 500.0);
        assert!(axes.delta().is_zero());
    }
}
