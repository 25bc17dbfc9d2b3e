//! The screen contract
//!
//! The emulation core does not store cells, lines or scrollback itself; it
//! drives an abstract [`Screen`] supplied by the embedder. Everything the
//! dispatcher may do to the display goes through this trait, so a test double
//! can record the exact operation stream.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::modes::Mode;

bitflags! {
    /// Character rendition attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Rendition: u16 {
        const BOLD      = 1 << 0;
        const BLINK     = 1 << 1;
        const UNDERLINE = 1 << 2;
        const REVERSE   = 1 << 3;
        const ITALIC    = 1 << 4;
        const FAINT     = 1 << 5;
        const STRIKEOUT = 1 << 6;
        const CONCEAL   = 1 << 7;
        const OVERLINE  = 1 << 8;
    }
}

impl Default for Rendition {
    fn default() -> Self {
        Self::empty()
    }
}

/// Color space selector carried by SGR 38/48 dispatches.
///
/// The numeric values travel inside tokens as plain integers; `from_i32`
/// recovers the variant on the dispatch side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ColorSpace {
    Undefined = 0,
    Default = 1,
    System = 2,
    Indexed = 3,
    Rgb = 4,
}

impl ColorSpace {
    pub fn from_i32(value: i32) -> Self {
        match value {
            1 => ColorSpace::Default,
            2 => ColorSpace::System,
            3 => ColorSpace::Indexed,
            4 => ColorSpace::Rgb,
            _ => ColorSpace::Undefined,
        }
    }
}

/// Per-line display properties set by the `ESC #` sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineProperty {
    DoubleWidth,
    DoubleHeightTop,
    DoubleHeightBottom,
}

/// A cell as seen by the checksum reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenCell {
    /// Code point stored in the cell.
    pub character: u32,
    /// Rendition attributes of the cell.
    pub rendition: Rendition,
}

/// Operations the emulation may invoke on a screen.
///
/// Counts of zero are treated as one by motion and editing operations, and
/// cursor coordinates reported by the getters are 0-based; `set_cursor_*`
/// take the 1-based values straight from the wire.
pub trait Screen {
    // Cursor motion
    fn cursor_up(&mut self, n: i32);
    fn cursor_down(&mut self, n: i32);
    fn cursor_left(&mut self, n: i32);
    fn cursor_right(&mut self, n: i32);
    fn cursor_next_line(&mut self, n: i32);
    fn cursor_previous_line(&mut self, n: i32);
    fn set_cursor_x(&mut self, x: i32);
    fn set_cursor_y(&mut self, y: i32);
    fn set_cursor_yx(&mut self, y: i32, x: i32);
    fn index(&mut self);
    fn reverse_index(&mut self);
    fn next_line(&mut self);
    fn to_start_of_line(&mut self);

    // Character insertion and editing
    fn display_character(&mut self, c: u32);
    fn backspace(&mut self);
    fn tab(&mut self, n: i32);
    fn backtab(&mut self, n: i32);
    fn new_line(&mut self);
    fn insert_chars(&mut self, n: i32);
    fn insert_lines(&mut self, n: i32);
    fn delete_chars(&mut self, n: i32);
    fn delete_lines(&mut self, n: i32);
    fn erase_chars(&mut self, n: i32);
    fn repeat_chars(&mut self, n: i32);

    // Clearing
    fn clear_to_end_of_line(&mut self);
    fn clear_to_begin_of_line(&mut self);
    fn clear_entire_line(&mut self);
    fn clear_to_end_of_screen(&mut self);
    fn clear_to_begin_of_screen(&mut self);
    fn clear_entire_screen(&mut self);
    fn clear_history(&mut self);

    // Scrolling, margins and tabs
    fn scroll_up(&mut self, n: i32);
    fn scroll_down(&mut self, n: i32);
    fn set_margins(&mut self, top: i32, bottom: i32);
    fn set_default_margins(&mut self);
    fn change_tab_stop(&mut self, set: bool);
    fn clear_tab_stops(&mut self);

    // Rendition
    fn set_rendition(&mut self, bits: Rendition);
    fn reset_rendition(&mut self, bits: Rendition);
    fn set_default_rendition(&mut self);
    fn set_fore_color(&mut self, space: ColorSpace, value: i32);
    fn set_back_color(&mut self, space: ColorSpace, value: i32);

    // Line properties
    fn set_line_property(&mut self, property: LineProperty, enable: bool);

    // State
    fn save_cursor(&mut self);
    fn restore_cursor(&mut self);
    fn set_mode(&mut self, mode: Mode);
    fn reset_mode(&mut self, mode: Mode);
    fn save_mode(&mut self, mode: Mode);
    fn restore_mode(&mut self, mode: Mode);
    fn get_mode(&self, mode: Mode) -> bool;
    fn set_image_size(&mut self, lines: i32, columns: i32);
    fn help_align(&mut self);
    fn reset(&mut self);
    fn clear_selection(&mut self);

    // Geometry and content readout
    fn lines(&self) -> i32;
    fn columns(&self) -> i32;
    fn cursor_x(&self) -> i32;
    fn cursor_y(&self) -> i32;
    fn top_margin(&self) -> i32;
    fn cell_at(&self, line: i32, column: i32) -> ScreenCell;

    // Hyperlink extraction (OSC 8 framing)
    fn toggle_url_input(&mut self);
    fn set_url(&mut self, url: &str);
    fn url_input_reading(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_space_round_trip() {
        for space in [
            ColorSpace::Undefined,
            ColorSpace::Default,
            ColorSpace::System,
            ColorSpace::Indexed,
            ColorSpace::Rgb,
        ] {
            assert_eq!(ColorSpace::from_i32(space as i32), space);
        }
    }

    #[test]
    fn test_color_space_unknown_is_undefined() {
        assert_eq!(ColorSpace::from_i32(99), ColorSpace::Undefined);
        assert_eq!(ColorSpace::from_i32(-1), ColorSpace::Undefined);
    }

    #[test]
    fn test_rendition_flags_distinct() {
        let all = Rendition::all();
        assert_eq!(all.bits().count_ones(), 9);
    }
}
