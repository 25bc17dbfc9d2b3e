//! The host contract
//!
//! Everything flowing out of the emulation that is not a screen mutation goes
//! through [`TerminalHost`]: the byte sink towards the child process and the
//! discrete notifications a surrounding program may care about. All methods
//! except `send_data` default to no-ops so embedders only wire what they use.

/// Cursor shapes requested by DECSCUSR and profile-change attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Block,
    Underline,
    IBeam,
}

impl CursorShape {
    /// Map the numeric shape id used on the wire.
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(CursorShape::Block),
            1 => Some(CursorShape::Underline),
            2 => Some(CursorShape::IBeam),
            _ => None,
        }
    }
}

/// Scrolling actions a key binding may request from the viewing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRequest {
    PageUp,
    PageDown,
    LineUp,
    LineDown,
    ToTop,
    ToBottom,
}

/// Receiver for bytes and events produced by the emulation.
pub trait TerminalHost {
    /// Bytes to deliver to the child process.
    fn send_data(&mut self, data: &[u8]);

    /// BEL was received.
    fn bell(&mut self) {}

    /// The program asked to resize the terminal (`CSI 8 ; lines ; columns t`).
    fn image_resize_request(&mut self, _columns: i32, _lines: i32) {}

    /// The program selected a cursor style.
    fn set_cursor_style_request(&mut self, _shape: CursorShape, _blinking: bool) {}

    /// The program asked to restore the configured cursor style.
    fn reset_cursor_style_request(&mut self) {}

    /// Mouse tracking was enabled or disabled.
    fn program_requests_mouse_tracking(&mut self, _enabled: bool) {}

    /// Bracketed paste mode changed.
    fn program_bracketed_paste_mode_changed(&mut self, _enabled: bool) {}

    /// Alternate-scrolling mode (1007) changed.
    fn enable_alternate_scrolling(&mut self, _enabled: bool) {}

    /// A coalesced session attribute update (window title and friends).
    fn session_attribute_changed(&mut self, _id: i32, _value: &str) {}

    /// The program queried a session attribute (`OSC Pa ; ?`). The terminator
    /// code point is passed so the reply can be framed symmetrically.
    fn session_attribute_request(&mut self, _id: i32, _terminator: u32) {}

    /// Ctrl+S / Ctrl+Q / Ctrl+C flow-control keys; `true` suspends output.
    fn flow_control_key_pressed(&mut self, _suspend: bool) {}

    /// A key binding asked to scroll the viewing window.
    fn scroll_view(&mut self, _request: ScrollRequest) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_shape_from_i32() {
        assert_eq!(CursorShape::from_i32(0), Some(CursorShape::Block));
        assert_eq!(CursorShape::from_i32(1), Some(CursorShape::Underline));
        assert_eq!(CursorShape::from_i32(2), Some(CursorShape::IBeam));
        assert_eq!(CursorShape::from_i32(7), None);
    }
}
