use blockytry_common::Scancode;
use serde::{Deserialize, Serialize};

/// Common scancodes in evdev numbering. Letters and modifiers share set-1
/// values; extended keys arrive through [`Scancode::from_raw`].
pub mod keys {
    use blockytry_common::Scancode;

    pub const ESCAPE: Scancode = Scancode(1);
    pub const W: Scancode = Scancode(17);
    pub const T: Scancode = Scancode(20);
    pub const LEFT_CONTROL: Scancode = Scancode(29);
    pub const A: Scancode = Scancode(30);
    pub const S: Scancode = Scancode(31);
    pub const D: Scancode = Scancode(32);
    pub const LEFT_SHIFT: Scancode = Scancode(42);
    pub const V: Scancode = Scancode(47);
    pub const F1: Scancode = Scancode(59);
    pub const F3: Scancode = Scancode(61);
    pub const PAGE_UP: Scancode = Scancode(104);
    pub const PAGE_DOWN: Scancode = Scancode(109);
}

/// Which physical keys drive the eyepoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub forward: Scancode,
    pub back: Scancode,
    pub strafe_left: Scancode,
    pub strafe_right: Scancode,
    pub rise: Scancode,
    pub sink: Scancode,
    pub sneak: Scancode,
    pub sprint: Scancode,
    pub lock_toggle: Scancode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: keys::W,
            back: keys::S,
            strafe_left: keys::A,
            strafe_right: keys::D,
            rise: keys::PAGE_UP,
            sink: keys::PAGE_DOWN,
            sneak: keys::LEFT_SHIFT,
            sprint: keys::LEFT_CONTROL,
            lock_toggle: keys::T,
        }
    }
}
