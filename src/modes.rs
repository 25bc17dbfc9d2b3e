//! Terminal modes
//!
//! Boolean switches controlled by `h`/`l` (and saved/restored by `s`/`r`)
//! sequences. A few of them scope to the screen rather than the emulation;
//! those are forwarded to both screens so that saved-mode restoration stays
//! symmetric across a screen switch.

use serde::{Deserialize, Serialize};

/// Every boolean mode the emulation tracks.
///
/// The first group lives on the screens (plus the emulation's own copy);
/// everything after `NewLine` is emulation-scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// DECOM: cursor addressing relative to the margins.
    Origin,
    /// DECAWM: wrap at right margin.
    Wrap,
    /// IRM: insert instead of replace.
    Insert,
    /// DECSCNM: reverse video.
    Screen,
    /// DECTCEM: cursor visible.
    Cursor,
    /// LNM: linefeed implies carriage return.
    NewLine,

    /// DECANM: ANSI (as opposed to VT52) operation.
    Ansi,
    /// Alternate screen buffer active.
    AppScreen,
    /// DECCKM: application cursor keys.
    AppCuKeys,
    /// DECKPAM: application keypad.
    AppKeyPad,
    /// X11 press/release mouse reporting.
    Mouse1000,
    /// Highlight mouse tracking (recognized, never acted upon).
    Mouse1001,
    /// Press/release/drag mouse reporting.
    Mouse1002,
    /// All-motion mouse reporting.
    Mouse1003,
    /// UTF-8 extended mouse coordinates.
    Mouse1005,
    /// SGR extended mouse coordinates.
    Mouse1006,
    /// Alternate scrolling: wheel sends cursor keys on the alternate screen.
    Mouse1007,
    /// URXVT decimal extended mouse coordinates.
    Mouse1015,
    /// DECCOLM: 132-column display.
    Columns132,
    /// Permit DECCOLM to take effect.
    Allow132Columns,
    /// Wrap pasted text in `ESC [ 200~` / `ESC [ 201~`.
    BracketedPaste,
}

pub const MODE_COUNT: usize = 21;

impl Mode {
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Modes that are additionally kept on both screens.
    pub fn is_screen_mode(self) -> bool {
        matches!(
            self,
            Mode::Origin | Mode::Wrap | Mode::Insert | Mode::Screen | Mode::Cursor | Mode::NewLine
        )
    }
}

/// Current and saved values for every mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModeSet {
    current: [bool; MODE_COUNT],
    saved: [bool; MODE_COUNT],
}

impl ModeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: Mode) -> bool {
        self.current[mode.index()]
    }

    /// Raw write without side effects; mode side effects live on the
    /// emulation, which owns the screens and the host channel.
    pub fn put(&mut self, mode: Mode, value: bool) {
        self.current[mode.index()] = value;
    }

    pub fn save(&mut self, mode: Mode) {
        self.saved[mode.index()] = self.current[mode.index()];
    }

    pub fn saved(&self, mode: Mode) -> bool {
        self.saved[mode.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_all_clear() {
        let modes = ModeSet::new();
        assert!(!modes.get(Mode::Ansi));
        assert!(!modes.get(Mode::Mouse1000));
        assert!(!modes.get(Mode::BracketedPaste));
    }

    #[test]
    fn test_put_get() {
        let mut modes = ModeSet::new();
        modes.put(Mode::AppCuKeys, true);
        assert!(modes.get(Mode::AppCuKeys));
        modes.put(Mode::AppCuKeys, false);
        assert!(!modes.get(Mode::AppCuKeys));
    }

    #[test]
    fn test_save_keeps_snapshot() {
        let mut modes = ModeSet::new();
        modes.put(Mode::BracketedPaste, true);
        modes.save(Mode::BracketedPaste);
        modes.put(Mode::BracketedPaste, false);
        assert!(modes.saved(Mode::BracketedPaste));
        assert!(!modes.get(Mode::BracketedPaste));
    }

    #[test]
    fn test_screen_mode_partition() {
        assert!(Mode::Origin.is_screen_mode());
        assert!(Mode::NewLine.is_screen_mode());
        assert!(!Mode::Ansi.is_screen_mode());
        assert!(!Mode::AppScreen.is_screen_mode());
        assert!(!Mode::Mouse1000.is_screen_mode());
    }
}
