//! Configurable keyboard bindings for the viewer.
//!
//! Keys are stored by name so bindings survive a round trip through the
//! config file; winit key codes are mapped onto them at the input edge.

use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

/// A bindable physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Space,
    Enter,
    Escape,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    Backspace,
    A,
    D,
    F,
    N,
    O,
    P,
    R,
    S,
    W,
}

impl Key {
    /// Map a winit physical key code; `None` for keys that cannot be bound.
    pub fn from_key_code(code: KeyCode) -> Option<Key> {
        let key = match code {
            KeyCode::ArrowLeft => Key::ArrowLeft,
            KeyCode::ArrowRight => Key::ArrowRight,
            KeyCode::ArrowUp => Key::ArrowUp,
            KeyCode::ArrowDown => Key::ArrowDown,
            KeyCode::Space => Key::Space,
            KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
            KeyCode::Escape => Key::Escape,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::Delete => Key::Delete,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::KeyA => Key::A,
            KeyCode::KeyD => Key::D,
            KeyCode::KeyF => Key::F,
            KeyCode::KeyN => Key::N,
            KeyCode::KeyO => Key::O,
            KeyCode::KeyP => Key::P,
            KeyCode::KeyR => Key::R,
            KeyCode::KeyS => Key::S,
            KeyCode::KeyW => Key::W,
            _ => return None,
        };
        Some(key)
    }
}

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    RotateLeft,
    RotateRight,
    RotateUp,
    RotateDown,
    ToggleAutoRotate,
    ResetCamera,
    OpenFilePicker,
    NextPanorama,
    PreviousPanorama,
    DeleteActive,
}

impl KeyAction {
    pub fn name(&self) -> &'static str {
        match self {
            KeyAction::RotateLeft => "Rotate left",
            KeyAction::RotateRight => "Rotate right",
            KeyAction::RotateUp => "Rotate up",
            KeyAction::RotateDown => "Rotate down",
            KeyAction::ToggleAutoRotate => "Toggle auto-rotate",
            KeyAction::ResetCamera => "Reset camera",
            KeyAction::OpenFilePicker => "Open files",
            KeyAction::NextPanorama => "Next panorama",
            KeyAction::PreviousPanorama => "Previous panorama",
            KeyAction::DeleteActive => "Delete panorama",
        }
    }
}

/// Key bindings, several keys per action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub rotate_left: Vec<Key>,
    pub rotate_right: Vec<Key>,
    pub rotate_up: Vec<Key>,
    pub rotate_down: Vec<Key>,
    pub toggle_auto_rotate: Vec<Key>,
    pub reset_camera: Vec<Key>,
    pub open_file_picker: Vec<Key>,
    pub next_panorama: Vec<Key>,
    pub previous_panorama: Vec<Key>,
    pub delete_active: Vec<Key>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            rotate_left: vec![Key::ArrowLeft],
            rotate_right: vec![Key::ArrowRight],
            rotate_up: vec![Key::ArrowUp],
            rotate_down: vec![Key::ArrowDown],
            toggle_auto_rotate: vec![Key::Space],
            reset_camera: vec![Key::Home, Key::R],
            open_file_picker: vec![Key::O],
            next_panorama: vec![Key::PageDown],
            previous_panorama: vec![Key::PageUp],
            delete_active: vec![Key::Delete],
        }
    }
}

impl KeyBindings {
    fn table(&self) -> [(KeyAction, &[Key]); 10] {
        [
            (KeyAction::RotateLeft, self.rotate_left.as_slice()),
            (KeyAction::RotateRight, self.rotate_right.as_slice()),
            (KeyAction::RotateUp, self.rotate_up.as_slice()),
            (KeyAction::RotateDown, self.rotate_down.as_slice()),
            (KeyAction::ToggleAutoRotate, self.toggle_auto_rotate.as_slice()),
            (KeyAction::ResetCamera, self.reset_camera.as_slice()),
            (KeyAction::OpenFilePicker, self.open_file_picker.as_slice()),
            (KeyAction::NextPanorama, self.next_panorama.as_slice()),
            (KeyAction::PreviousPanorama, self.previous_panorama.as_slice()),
            (KeyAction::DeleteActive, self.delete_active.as_slice()),
        ]
    }

    /// The action bound to `key`; the first binding in table order wins.
    pub fn action_for(&self, key: Key) -> Option<KeyAction> {
        self.table()
            .into_iter()
            .find(|(_, keys)| keys.contains(&key))
            .map(|(action, _)| action)
    }

    /// Keys bound to more than one action, with the actions involved.
    pub fn conflicts(&self) -> Vec<(Key, KeyAction, KeyAction)> {
        let table = self.table();
        let mut conflicts = Vec::new();
        for (i, (first, keys)) in table.iter().enumerate() {
            for key in keys.iter() {
                for (second, other) in table.iter().skip(i + 1) {
                    if other.contains(key) {
                        conflicts.push((*key, *first, *second));
                    }
                }
            }
        }
        conflicts
    }
}
