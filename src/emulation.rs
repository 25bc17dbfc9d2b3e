//! The emulation core
//!
//! [`Emulation`] owns the two screens (primary and alternate), the mode and
//! charset state, the scanner, and the outbound encoders. It is driven by
//! three callers on one thread: code points arriving from the child process,
//! key/mouse/focus events from the embedder, and the session-attribute flush
//! timer. It never blocks and never fails outward; every malformed input is
//! recovered locally.

use std::collections::BTreeMap;

use crate::charset::CharsetState;
use crate::codec::{Codec, Utf8Decoder};
use crate::host::TerminalHost;
use crate::keyboard::KeyBindings;
use crate::modes::{Mode, ModeSet};
use crate::osc::SingleShotTimer;
use crate::screen::Screen;
use crate::tokenizer::Tokenizer;

/// VT102/xterm terminal emulation over an abstract screen pair.
pub struct Emulation<S: Screen> {
    pub(crate) screens: [S; 2],
    pub(crate) current: usize,
    pub(crate) modes: ModeSet,
    pub(crate) charsets: [CharsetState; 2],
    pub(crate) tokenizer: Tokenizer,
    pub(crate) codec: Codec,
    pub(crate) utf8_decoder: Utf8Decoder,
    pub(crate) key_bindings: Option<Box<dyn KeyBindings>>,
    pub(crate) pending_attributes: BTreeMap<i32, String>,
    pub(crate) attribute_timer: Box<dyn SingleShotTimer>,
    pub(crate) report_focus_events: bool,
    pub(crate) read_only: bool,
}

impl<S: Screen> Emulation<S> {
    /// Create an emulation over `[primary, alternate]` screens. The timer is
    /// armed whenever session-attribute updates are pending; when it fires
    /// the embedder calls [`flush_session_attributes`].
    ///
    /// [`flush_session_attributes`]: Emulation::flush_session_attributes
    pub fn new(screens: [S; 2], attribute_timer: Box<dyn SingleShotTimer>) -> Self {
        let mut emulation = Self {
            screens,
            current: 0,
            modes: ModeSet::new(),
            charsets: [CharsetState::new(), CharsetState::new()],
            tokenizer: Tokenizer::new(),
            codec: Codec::default(),
            utf8_decoder: Utf8Decoder::new(),
            key_bindings: None,
            pending_attributes: BTreeMap::new(),
            attribute_timer,
            report_focus_events: false,
            read_only: false,
        };
        emulation.modes.put(Mode::Ansi, true);
        emulation.modes.save(Mode::Ansi);
        emulation
    }

    pub fn current_screen(&self) -> &S {
        &self.screens[self.current]
    }

    pub fn current_screen_mut(&mut self) -> &mut S {
        &mut self.screens[self.current]
    }

    /// Index of the active screen: 0 primary, 1 alternate.
    pub fn current_screen_index(&self) -> usize {
        self.current
    }

    /// Access one of the two screens directly; 0 primary, 1 alternate.
    pub fn screen(&self, index: usize) -> &S {
        &self.screens[index & 1]
    }

    pub(crate) fn set_screen(&mut self, n: usize) {
        self.current = n & 1;
    }

    pub fn set_codec(&mut self, codec: Codec) {
        self.codec = codec;
        self.utf8_decoder.reset();
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Install the key-binding table consulted by `send_key_event`.
    pub fn set_key_bindings(&mut self, bindings: Box<dyn KeyBindings>) {
        self.key_bindings = Some(bindings);
    }

    /// A read-only session drops outbound bytes instead of sending them.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Restore the power-on state. The codec selection survives; so do
    /// `Allow132Columns` and `Mouse1007`, matching xterm's reset.
    pub fn reset(&mut self, host: &mut dyn TerminalHost) {
        self.tokenizer.reset();
        self.utf8_decoder.reset();
        self.reset_modes(host);
        self.charsets[0].reset();
        self.screens[0].reset();
        self.charsets[1].reset();
        self.screens[1].reset();
        host.reset_cursor_style_request();
    }

    // --- Modes ----------------------------------------------------------

    pub fn get_mode(&self, mode: Mode) -> bool {
        self.modes.get(mode)
    }

    pub(crate) fn set_mode(&mut self, mode: Mode, host: &mut dyn TerminalHost) {
        self.modes.put(mode, true);
        match mode {
            Mode::Columns132 => {
                if self.modes.get(Mode::Allow132Columns) {
                    self.clear_screen_and_set_columns(132);
                } else {
                    self.modes.put(mode, false);
                }
            }
            Mode::Mouse1000 | Mode::Mouse1001 | Mode::Mouse1002 | Mode::Mouse1003 => {
                // The four tracking modes are mutually exclusive.
                self.modes.put(Mode::Mouse1000, false);
                self.modes.put(Mode::Mouse1001, false);
                self.modes.put(Mode::Mouse1002, false);
                self.modes.put(Mode::Mouse1003, false);
                self.modes.put(mode, true);
                host.program_requests_mouse_tracking(true);
            }
            Mode::Mouse1007 => {
                host.enable_alternate_scrolling(true);
            }
            Mode::Mouse1005 | Mode::Mouse1006 | Mode::Mouse1015 => {
                // So are the three coordinate encodings.
                self.modes.put(Mode::Mouse1005, false);
                self.modes.put(Mode::Mouse1006, false);
                self.modes.put(Mode::Mouse1015, false);
                self.modes.put(mode, true);
            }
            Mode::BracketedPaste => {
                host.program_bracketed_paste_mode_changed(true);
            }
            Mode::AppScreen => {
                self.screens[1].set_default_rendition();
                self.screens[1].clear_selection();
                self.set_screen(1);
            }
            _ => {}
        }
        if mode.is_screen_mode() {
            self.screens[0].set_mode(mode);
            self.screens[1].set_mode(mode);
        }
    }

    pub(crate) fn reset_mode(&mut self, mode: Mode, host: &mut dyn TerminalHost) {
        self.modes.put(mode, false);
        match mode {
            Mode::Columns132 => {
                if self.modes.get(Mode::Allow132Columns) {
                    self.clear_screen_and_set_columns(80);
                }
            }
            Mode::Mouse1000 | Mode::Mouse1001 | Mode::Mouse1002 | Mode::Mouse1003 => {
                // Disabling any of the four disables tracking altogether,
                // the same as xterm.
                self.modes.put(Mode::Mouse1000, false);
                self.modes.put(Mode::Mouse1001, false);
                self.modes.put(Mode::Mouse1002, false);
                self.modes.put(Mode::Mouse1003, false);
                host.program_requests_mouse_tracking(false);
            }
            Mode::Mouse1007 => {
                host.enable_alternate_scrolling(false);
            }
            Mode::BracketedPaste => {
                host.program_bracketed_paste_mode_changed(false);
            }
            Mode::AppScreen => {
                self.screens[0].clear_selection();
                self.set_screen(0);
            }
            _ => {}
        }
        if mode.is_screen_mode() {
            self.screens[0].reset_mode(mode);
            self.screens[1].reset_mode(mode);
        }
    }

    pub(crate) fn save_mode(&mut self, mode: Mode) {
        self.modes.save(mode);
    }

    pub(crate) fn restore_mode(&mut self, mode: Mode, host: &mut dyn TerminalHost) {
        if self.modes.saved(mode) {
            self.set_mode(mode, host);
        } else {
            self.reset_mode(mode, host);
        }
    }

    /// Return the non-screen modes to their defaults. `Allow132Columns` and
    /// `Mouse1007` keep their values, matching xterm's `VTReset`.
    pub(crate) fn reset_modes(&mut self, host: &mut dyn TerminalHost) {
        const RESET_AND_SAVE: [Mode; 12] = [
            Mode::Columns132,
            Mode::Mouse1000,
            Mode::Mouse1001,
            Mode::Mouse1002,
            Mode::Mouse1003,
            Mode::Mouse1005,
            Mode::Mouse1006,
            Mode::Mouse1015,
            Mode::BracketedPaste,
            Mode::AppScreen,
            Mode::AppCuKeys,
            Mode::AppKeyPad,
        ];
        for mode in RESET_AND_SAVE {
            self.reset_mode(mode, host);
            self.modes.save(mode);
        }
        self.reset_mode(Mode::NewLine, host);
        self.set_mode(Mode::Ansi, host);
    }

    // --- Charsets -------------------------------------------------------

    pub(crate) fn apply_charset(&self, c: u32) -> u32 {
        self.charsets[self.current].apply(c)
    }

    /// Designate slot `n`; applies on both screens.
    pub(crate) fn set_charset(&mut self, n: usize, cs: u8) {
        self.charsets[0].designate(n, cs);
        self.charsets[1].designate(n, cs);
    }

    /// Activate slot `n` on the current screen.
    pub(crate) fn use_charset(&mut self, n: usize) {
        self.charsets[self.current].use_slot(n);
    }

    /// Designate and activate in one step, current screen only.
    pub(crate) fn set_and_use_charset(&mut self, n: usize, cs: u8) {
        self.charsets[self.current].designate(n, cs);
        self.charsets[self.current].use_slot(n);
    }

    pub(crate) fn save_cursor(&mut self) {
        self.charsets[self.current].save();
        self.current_screen_mut().save_cursor();
    }

    pub(crate) fn restore_cursor(&mut self) {
        self.charsets[self.current].restore();
        self.current_screen_mut().restore_cursor();
    }

    // --- Geometry -------------------------------------------------------

    /// Resize both screens; out-of-range extents are ignored.
    pub fn set_image_size(&mut self, lines: i32, columns: i32) {
        if lines < 1 || columns < 1 {
            return;
        }
        self.screens[0].set_image_size(lines, columns);
        self.screens[1].set_image_size(lines, columns);
    }

    pub(crate) fn set_margins(&mut self, top: i32, bottom: i32) {
        self.screens[0].set_margins(top, bottom);
        self.screens[1].set_margins(top, bottom);
    }

    pub(crate) fn set_default_margins(&mut self) {
        self.screens[0].set_default_margins();
        self.screens[1].set_default_margins();
    }

    pub(crate) fn clear_screen_and_set_columns(&mut self, columns: i32) {
        let lines = self.current_screen().lines();
        self.set_image_size(lines, columns);
        self.current_screen_mut().clear_entire_screen();
        self.set_default_margins();
        self.current_screen_mut().set_cursor_yx(0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osc::NullTimer;
    use crate::testing::{RecordingHost, TestScreen};

    fn emulation() -> Emulation<TestScreen> {
        Emulation::new([TestScreen::new(24, 80), TestScreen::new(24, 80)], Box::new(NullTimer))
    }

    #[test]
    fn test_starts_in_ansi_mode() {
        let emu = emulation();
        assert!(emu.get_mode(Mode::Ansi));
        assert!(!emu.get_mode(Mode::AppScreen));
        assert_eq!(emu.current_screen_index(), 0);
    }

    #[test]
    fn test_mouse_tracking_modes_are_exclusive() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1000, &mut host);
        emu.set_mode(Mode::Mouse1002, &mut host);
        assert!(!emu.get_mode(Mode::Mouse1000));
        assert!(emu.get_mode(Mode::Mouse1002));
        emu.set_mode(Mode::Mouse1003, &mut host);
        assert!(!emu.get_mode(Mode::Mouse1002));
        assert!(emu.get_mode(Mode::Mouse1003));
        emu.reset_mode(Mode::Mouse1000, &mut host);
        assert!(!emu.get_mode(Mode::Mouse1003));
    }

    #[test]
    fn test_mouse_encoding_modes_are_exclusive() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1005, &mut host);
        emu.set_mode(Mode::Mouse1006, &mut host);
        assert!(!emu.get_mode(Mode::Mouse1005));
        assert!(emu.get_mode(Mode::Mouse1006));
        emu.set_mode(Mode::Mouse1015, &mut host);
        assert!(!emu.get_mode(Mode::Mouse1006));
        assert!(emu.get_mode(Mode::Mouse1015));
    }

    #[test]
    fn test_132_columns_requires_allowance() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Columns132, &mut host);
        assert!(!emu.get_mode(Mode::Columns132));
        assert_eq!(emu.current_screen().columns(), 80);

        emu.set_mode(Mode::Allow132Columns, &mut host);
        emu.set_mode(Mode::Columns132, &mut host);
        assert!(emu.get_mode(Mode::Columns132));
        assert_eq!(emu.current_screen().columns(), 132);
        emu.reset_mode(Mode::Columns132, &mut host);
        assert_eq!(emu.current_screen().columns(), 80);
    }

    #[test]
    fn test_reset_preserves_allowance_and_alternate_scrolling() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Allow132Columns, &mut host);
        emu.set_mode(Mode::Mouse1007, &mut host);
        emu.set_mode(Mode::AppCuKeys, &mut host);
        emu.reset(&mut host);
        assert!(emu.get_mode(Mode::Allow132Columns));
        assert!(emu.get_mode(Mode::Mouse1007));
        assert!(!emu.get_mode(Mode::AppCuKeys));
        assert!(emu.get_mode(Mode::Ansi));
    }

    #[test]
    fn test_save_restore_mode_round_trip() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::AppCuKeys, &mut host);
        emu.save_mode(Mode::AppCuKeys);
        emu.reset_mode(Mode::AppCuKeys, &mut host);
        emu.set_mode(Mode::AppCuKeys, &mut host);
        emu.reset_mode(Mode::AppCuKeys, &mut host);
        emu.restore_mode(Mode::AppCuKeys, &mut host);
        assert!(emu.get_mode(Mode::AppCuKeys));
    }

    #[test]
    fn test_app_screen_switch_clears_selection() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::AppScreen, &mut host);
        assert_eq!(emu.current_screen_index(), 1);
        assert!(emu.screens[1].calls.iter().any(|c| c == "clear_selection"));
        assert!(emu.screens[1].calls.iter().any(|c| c == "set_default_rendition"));
        emu.reset_mode(Mode::AppScreen, &mut host);
        assert_eq!(emu.current_screen_index(), 0);
        assert!(emu.screens[0].calls.iter().any(|c| c == "clear_selection"));
    }
}
