//! Keyboard input encoding
//!
//! Key events become byte sequences through a binding table supplied by the
//! embedder, consulted under a state mask derived from the active modes. A
//! binding can carry literal bytes or a command (erase, scrolling); events
//! without a matching binding fall back to the event text encoded through
//! the session codec. Alt and Meta are prefixed onto the result unless the
//! binding claims them for itself.

use bitflags::bitflags;

use crate::emulation::Emulation;
use crate::host::{ScrollRequest, TerminalHost};
use crate::modes::Mode;
use crate::screen::Screen;

bitflags! {
    /// Mode-derived state a binding may be conditioned on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyboardState: u8 {
        const NEWLINE            = 1 << 0;
        const ANSI               = 1 << 1;
        const CURSOR_KEYS        = 1 << 2;
        const ALTERNATE_SCREEN   = 1 << 3;
        const APPLICATION_KEYPAD = 1 << 4;
    }
}

bitflags! {
    /// Commands a binding may request instead of sending bytes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BindingCommand: u8 {
        const ERASE            = 1 << 0;
        const SCROLL_PAGE_UP   = 1 << 1;
        const SCROLL_PAGE_DOWN = 1 << 2;
        const SCROLL_LINE_UP   = 1 << 3;
        const SCROLL_LINE_DOWN = 1 << 4;
        const SCROLL_TO_TOP    = 1 << 5;
        const SCROLL_TO_BOTTOM = 1 << 6;
    }
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::empty()
    }
}

impl Default for BindingCommand {
    fn default() -> Self {
        Self::empty()
    }
}

/// Key identity at the granularity translation tables distinguish.
///
/// Keypad origin is not a separate set of variants; tables condition on it
/// through [`Modifiers::keypad`], so a keypad Enter arrives as `Enter` with
/// the keypad modifier held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character-producing key, identified by its unmodified character.
    Char(char),
    /// Function key row, `Function(1)` through `Function(35)`.
    Function(u8),
    // editing block
    Backspace,
    Insert,
    Delete,
    // cursor block
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    // the rest of the keys tables bind
    Enter,
    Escape,
    Tab,
    Backtab,
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
    /// The key came from the numeric keypad.
    pub keypad: bool,
}

/// One key press as delivered by the embedder.
#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    /// The text the key would insert, already translated by the toolkit.
    pub text: String,
}

/// Resolved entry from a binding table.
#[derive(Debug, Clone, Default)]
pub struct KeyBinding {
    /// Literal bytes to send.
    pub text: Vec<u8>,
    /// Command to run instead of (or before) sending bytes.
    pub command: BindingCommand,
    /// The binding consumes Alt itself; no ESC prefix is added.
    pub wants_alt: bool,
    /// The binding consumes Meta itself; no `0x18 @ s` prefix is added.
    pub wants_meta: bool,
    /// The binding matches under any modifiers; no prefixes are added.
    pub wants_any_modifier: bool,
}

/// Lookup interface over an externally managed binding table.
pub trait KeyBindings {
    fn find_entry(&self, key: Key, modifiers: Modifiers, state: KeyboardState)
        -> Option<KeyBinding>;
}

/// Shown through the output stream when no binding table is installed.
const NO_BINDINGS_MESSAGE: &str = "No keyboard translator available.  \
The information needed to convert key presses into characters to send \
to the terminal is missing.";

impl<S: Screen> Emulation<S> {
    /// Convenience wrapper: paste or synthesize plain text as one key event.
    pub fn send_text(&mut self, text: &str, host: &mut dyn TerminalHost) {
        if text.is_empty() {
            return;
        }
        self.send_key_event(
            &KeyEvent {
                key: Key::Char(text.chars().next().unwrap_or('\0')),
                modifiers: Modifiers::default(),
                text: text.to_string(),
            },
            host,
        );
    }

    /// Encode one key event and send the result to the child.
    pub fn send_key_event(&mut self, event: &KeyEvent, host: &mut dyn TerminalHost) {
        let modifiers = event.modifiers;

        let mut states = KeyboardState::empty();
        if self.get_mode(Mode::NewLine) {
            states |= KeyboardState::NEWLINE;
        }
        if self.get_mode(Mode::Ansi) {
            states |= KeyboardState::ANSI;
        }
        if self.get_mode(Mode::AppCuKeys) {
            states |= KeyboardState::CURSOR_KEYS;
        }
        if self.get_mode(Mode::AppScreen) {
            states |= KeyboardState::ALTERNATE_SCREEN;
        }
        if self.get_mode(Mode::AppKeyPad) && modifiers.keypad {
            states |= KeyboardState::APPLICATION_KEYPAD;
        }

        if !self.read_only && modifiers.ctrl {
            // Flow-control keys are reported on the side; processing of the
            // key itself continues below.
            match event.key {
                Key::Char(c) if c.eq_ignore_ascii_case(&'s') => {
                    host.flow_control_key_pressed(true);
                }
                Key::Char(c) if c.eq_ignore_ascii_case(&'q') || c.eq_ignore_ascii_case(&'c') => {
                    host.flow_control_key_pressed(false);
                }
                _ => {}
            }
        }

        if self.key_bindings.is_none() {
            if !self.read_only {
                let message: Vec<u32> = NO_BINDINGS_MESSAGE.chars().map(|c| c as u32).collect();
                self.reset(host);
                self.receive_chars(&message, host);
            }
            return;
        }

        let entry = self
            .key_bindings
            .as_deref()
            .and_then(|bindings| bindings.find_entry(event.key, modifiers, states));
        let (wants_alt, wants_meta, wants_any) = entry
            .as_ref()
            .map(|e| (e.wants_alt, e.wants_meta, e.wants_any_modifier))
            .unwrap_or((false, false, false));

        let mut body: Vec<u8> = Vec::new();
        match &entry {
            Some(e) if !e.command.is_empty() => {
                if e.command.contains(BindingCommand::ERASE) {
                    body.push(self.erase_char());
                }
                if e.command.contains(BindingCommand::SCROLL_PAGE_UP) {
                    host.scroll_view(ScrollRequest::PageUp);
                } else if e.command.contains(BindingCommand::SCROLL_PAGE_DOWN) {
                    host.scroll_view(ScrollRequest::PageDown);
                } else if e.command.contains(BindingCommand::SCROLL_LINE_UP) {
                    host.scroll_view(ScrollRequest::LineUp);
                } else if e.command.contains(BindingCommand::SCROLL_LINE_DOWN) {
                    host.scroll_view(ScrollRequest::LineDown);
                } else if e.command.contains(BindingCommand::SCROLL_TO_TOP) {
                    host.scroll_view(ScrollRequest::ToTop);
                } else if e.command.contains(BindingCommand::SCROLL_TO_BOTTOM) {
                    host.scroll_view(ScrollRequest::ToBottom);
                }
            }
            Some(e) if !e.text.is_empty() => body.extend_from_slice(&e.text),
            _ => body.extend_from_slice(&self.codec.encode(&event.text)),
        }

        // Alt+X sends ESC X and Meta+X sends `0x18 @ s` X unless the binding
        // claimed the modifier.
        let mut to_send: Vec<u8> = Vec::new();
        if modifiers.meta && !(wants_meta || wants_any) && !event.text.is_empty() {
            to_send.extend_from_slice(b"\x18@s");
        }
        if modifiers.alt && !(wants_alt || wants_any) && !event.text.is_empty() {
            to_send.push(0x1B);
        }
        to_send.extend_from_slice(&body);

        if !self.read_only {
            host.send_data(&to_send);
        }
    }

    /// The byte Erase commands append: the backspace binding's first byte,
    /// or BS when none is defined.
    pub fn erase_char(&self) -> u8 {
        if let Some(bindings) = self.key_bindings.as_deref() {
            if let Some(entry) =
                bindings.find_entry(Key::Backspace, Modifiers::default(), KeyboardState::empty())
            {
                if let Some(&first) = entry.text.first() {
                    return first;
                }
            }
        }
        0x08
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osc::NullTimer;
    use crate::testing::{RecordingHost, TestScreen};

    /// Table with a couple of fixed entries, enough to drive the encoder.
    struct TableStub;

    impl KeyBindings for TableStub {
        fn find_entry(
            &self,
            key: Key,
            _modifiers: Modifiers,
            state: KeyboardState,
        ) -> Option<KeyBinding> {
            match key {
                Key::Up => Some(KeyBinding {
                    text: if state.contains(KeyboardState::CURSOR_KEYS) {
                        b"\x1bOA".to_vec()
                    } else {
                        b"\x1b[A".to_vec()
                    },
                    ..KeyBinding::default()
                }),
                Key::Backspace => Some(KeyBinding {
                    text: vec![0x7F],
                    ..KeyBinding::default()
                }),
                Key::PageUp => Some(KeyBinding {
                    command: BindingCommand::SCROLL_PAGE_UP,
                    ..KeyBinding::default()
                }),
                _ => None,
            }
        }
    }

    fn emulation_with_table() -> Emulation<TestScreen> {
        let mut emu = Emulation::new(
            [TestScreen::new(24, 80), TestScreen::new(24, 80)],
            Box::new(NullTimer),
        );
        emu.set_key_bindings(Box::new(TableStub));
        emu
    }

    fn key(key: Key, text: &str) -> KeyEvent {
        KeyEvent {
            key,
            modifiers: Modifiers::default(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_cursor_key_follows_application_mode() {
        let mut emu = emulation_with_table();
        let mut host = RecordingHost::new();
        emu.send_key_event(&key(Key::Up, ""), &mut host);
        assert_eq!(host.sent, b"\x1b[A");

        host.sent.clear();
        emu.set_mode(Mode::AppCuKeys, &mut host);
        emu.send_key_event(&key(Key::Up, ""), &mut host);
        assert_eq!(host.sent, b"\x1bOA");
    }

    #[test]
    fn test_plain_text_goes_through_codec() {
        let mut emu = emulation_with_table();
        let mut host = RecordingHost::new();
        emu.send_key_event(&key(Key::Char('x'), "x"), &mut host);
        assert_eq!(host.sent, b"x");
    }

    #[test]
    fn test_alt_prefixes_escape() {
        let mut emu = emulation_with_table();
        let mut host = RecordingHost::new();
        let mut event = key(Key::Char('b'), "b");
        event.modifiers.alt = true;
        emu.send_key_event(&event, &mut host);
        assert_eq!(host.sent, b"\x1bb");
    }

    #[test]
    fn test_meta_prefix() {
        let mut emu = emulation_with_table();
        let mut host = RecordingHost::new();
        let mut event = key(Key::Char('b'), "b");
        event.modifiers.meta = true;
        emu.send_key_event(&event, &mut host);
        assert_eq!(host.sent, b"\x18@sb");
    }

    #[test]
    fn test_scroll_command_emits_event_not_bytes() {
        let mut emu = emulation_with_table();
        let mut host = RecordingHost::new();
        emu.send_key_event(&key(Key::PageUp, ""), &mut host);
        assert!(host.sent.is_empty());
        assert!(host.events.iter().any(|e| e == "scroll_view(PageUp)"));
    }

    #[test]
    fn test_flow_control_side_channel() {
        let mut emu = emulation_with_table();
        let mut host = RecordingHost::new();
        let mut event = key(Key::Char('s'), "\x13");
        event.modifiers.ctrl = true;
        emu.send_key_event(&event, &mut host);
        assert!(host.events.iter().any(|e| e == "flow_control(true)"));
        // the key itself is still processed
        assert_eq!(host.sent, b"\x13");
    }

    #[test]
    fn test_read_only_drops_output() {
        let mut emu = emulation_with_table();
        let mut host = RecordingHost::new();
        emu.set_read_only(true);
        emu.send_key_event(&key(Key::Char('x'), "x"), &mut host);
        assert!(host.sent.is_empty());
    }

    #[test]
    fn test_erase_char_uses_backspace_binding() {
        let emu = emulation_with_table();
        assert_eq!(emu.erase_char(), 0x7F);
    }

    #[test]
    fn test_missing_table_displays_error_and_resets() {
        let mut emu = Emulation::new(
            [TestScreen::new(24, 80), TestScreen::new(24, 80)],
            Box::new(NullTimer),
        );
        let mut host = RecordingHost::new();
        emu.send_key_event(&key(Key::Char('x'), "x"), &mut host);
        assert!(host.sent.is_empty());
        assert!(!emu.current_screen().displayed.is_empty());
        assert!(host.events.iter().any(|e| e == "reset_cursor_style"));
    }
}
