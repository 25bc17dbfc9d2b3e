//! VT100 character set translation
//!
//! The VT100 assigns 32 graphical glyphs (line drawing, math symbols) to the
//! code range normally occupied by lowercase letters. The translation sits
//! behind the tokenizer and only applies to tokens representing plain
//! characters, so the glyph codes never interfere with sequence scanning.
//!
//! Each screen carries its own [`CharsetState`]; designations made with
//! `ESC ( ... ESC +` apply to both, while shifts (`SI`/`SO`, `ESC n`/`ESC o`)
//! act on the current screen only.

use serde::{Deserialize, Serialize};

/// Glyphs for the DEC Special Graphics set, indexed by `code - 0x5F`.
pub const VT100_GRAPHICS: [u16; 32] = [
    // 0/8     1/9    2/10    3/11    4/12    5/13    6/14    7/15
    0x0020, 0x25C6, 0x2592, 0x2409, 0x240C, 0x240D, 0x240A, 0x00B0, //
    0x00B1, 0x2424, 0x240B, 0x2518, 0x2510, 0x250C, 0x2514, 0x253C, //
    0xF800, 0xF801, 0x2500, 0xF803, 0xF804, 0x251C, 0x2524, 0x2534, //
    0x252C, 0x2502, 0x2264, 0x2265, 0x03C0, 0x2260, 0x00A3, 0x00B7,
];

/// G0..G3 designations and the active shift state for one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharsetState {
    /// Designator byte per slot: `B` US-ASCII, `0` DEC graphics, `A` UK.
    slots: [u8; 4],
    /// Index of the active slot.
    cur: usize,
    /// Active slot designates the DEC graphics set.
    graphic: bool,
    /// Active slot designates the UK set.
    pound: bool,
    saved_graphic: bool,
    saved_pound: bool,
}

impl Default for CharsetState {
    fn default() -> Self {
        Self {
            slots: [b'B'; 4],
            cur: 0,
            graphic: false,
            pound: false,
            saved_graphic: false,
            saved_pound: false,
        }
    }
}

impl CharsetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Designate slot `n` to charset `cs` and refresh the active flags.
    pub fn designate(&mut self, n: usize, cs: u8) {
        self.slots[n & 3] = cs;
        self.refresh();
    }

    /// Activate slot `n`.
    pub fn use_slot(&mut self, n: usize) {
        self.cur = n & 3;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.graphic = self.slots[self.cur] == b'0';
        self.pound = self.slots[self.cur] == b'A';
    }

    /// Snapshot the active flags for a later `restore`.
    pub fn save(&mut self) {
        self.saved_graphic = self.graphic;
        self.saved_pound = self.pound;
    }

    pub fn restore(&mut self) {
        self.graphic = self.saved_graphic;
        self.pound = self.saved_pound;
    }

    /// Translate a plain character through the active charset.
    pub fn apply(&self, c: u32) -> u32 {
        if self.graphic && (0x5F..=0x7E).contains(&c) {
            return u32::from(VT100_GRAPHICS[(c - 0x5F) as usize]);
        }
        if self.pound && c == u32::from(b'#') {
            return 0xA3;
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_passes_through() {
        let cs = CharsetState::new();
        assert_eq!(cs.apply(u32::from(b'a')), u32::from(b'a'));
        assert_eq!(cs.apply(u32::from(b'#')), u32::from(b'#'));
    }

    #[test]
    fn test_graphics_translation() {
        let mut cs = CharsetState::new();
        cs.designate(0, b'0');
        assert_eq!(cs.apply(u32::from(b'a')), 0x2592);
        assert_eq!(cs.apply(u32::from(b'q')), 0x2500);
        assert_eq!(cs.apply(u32::from(b'x')), 0x2502);
        assert_eq!(cs.apply(u32::from(b'`')), 0x25C6);
        // Outside the mapped range nothing changes.
        assert_eq!(cs.apply(u32::from(b'A')), u32::from(b'A'));
    }

    #[test]
    fn test_uk_pound() {
        let mut cs = CharsetState::new();
        cs.designate(0, b'A');
        assert_eq!(cs.apply(u32::from(b'#')), 0xA3);
        assert_eq!(cs.apply(u32::from(b'q')), u32::from(b'q'));
    }

    #[test]
    fn test_inactive_slot_has_no_effect() {
        let mut cs = CharsetState::new();
        cs.designate(1, b'0');
        assert_eq!(cs.apply(u32::from(b'q')), u32::from(b'q'));
        cs.use_slot(1);
        assert_eq!(cs.apply(u32::from(b'q')), 0x2500);
        cs.use_slot(0);
        assert_eq!(cs.apply(u32::from(b'q')), u32::from(b'q'));
    }

    #[test]
    fn test_save_restore() {
        let mut cs = CharsetState::new();
        cs.designate(0, b'0');
        cs.save();
        cs.designate(0, b'B');
        assert_eq!(cs.apply(u32::from(b'q')), u32::from(b'q'));
        cs.restore();
        assert_eq!(cs.apply(u32::from(b'q')), 0x2500);
    }
}
