//! Mouse and focus reporting
//!
//! Encodes pointer events for the child according to the active tracking and
//! coordinate-encoding modes. When several encodings are enabled the most
//! capable one wins: SGR (1006), then URXVT decimal (1015), then UTF-8
//! (1005), then classic X10 three-byte.

use crate::emulation::Emulation;
use crate::host::TerminalHost;
use crate::modes::Mode;
use crate::screen::Screen;

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press,
    /// Drag or plain motion, depending on the buttons held.
    Motion,
    Release,
}

impl<S: Screen> Emulation<S> {
    /// Report a pointer event at 1-based cell coordinates. `cb` is the
    /// button (0-2) or wheel direction (4-5).
    pub fn send_mouse_event(
        &mut self,
        mut cb: i32,
        cx: i32,
        cy: i32,
        kind: MouseEventKind,
        host: &mut dyn TerminalHost,
    ) {
        if cx < 1 || cy < 1 {
            return;
        }

        // Only press and release are reported in 1000
        if kind == MouseEventKind::Motion && self.get_mode(Mode::Mouse1000) {
            return;
        }

        if cb == 3 && self.get_mode(Mode::Mouse1002) {
            return;
        }

        // Outside 1006 a release is encoded in the button code itself. The
        // encodings are mutually exclusive, so checking 1006 alone is enough.
        if kind == MouseEventKind::Release && !self.get_mode(Mode::Mouse1006) {
            cb = 3;
        }

        // Wheel buttons sit at 0x5C + button on the wire
        if cb >= 4 {
            cb += 0x3C;
        }

        if (self.get_mode(Mode::Mouse1002) || self.get_mode(Mode::Mouse1003))
            && kind == MouseEventKind::Motion
        {
            cb += 0x20;
        }

        let command: Vec<u8> = if self.get_mode(Mode::Mouse1006) {
            let tail = if kind == MouseEventKind::Release { 'm' } else { 'M' };
            format!("\x1b[<{};{};{}{}", cb, cx, cy, tail).into_bytes()
        } else if self.get_mode(Mode::Mouse1015) {
            format!("\x1b[{};{};{}M", cb + 0x20, cx, cy).into_bytes()
        } else if self.get_mode(Mode::Mouse1005) {
            if cx <= 2015 && cy <= 2015 {
                // Coordinates + 32 go out as UTF-8 regardless of the locale
                let mut bytes = Vec::with_capacity(10);
                bytes.extend_from_slice(b"\x1b[M");
                bytes.push((cb + 0x20) as u8);
                let mut buf = [0u8; 4];
                for coord in [cx, cy] {
                    if let Some(c) = char::from_u32((coord + 0x20) as u32) {
                        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    }
                }
                bytes
            } else {
                Vec::new()
            }
        } else if cx <= 223 && cy <= 223 {
            vec![
                0x1B,
                b'[',
                b'M',
                (cb + 0x20) as u8,
                (cx + 0x20) as u8,
                (cy + 0x20) as u8,
            ]
        } else {
            Vec::new()
        };

        if !command.is_empty() {
            host.send_data(&command);
        }
    }

    /// Report focus gain/loss when the program asked for it (mode 1004).
    pub fn focus_changed(&mut self, focused: bool, host: &mut dyn TerminalHost) {
        if self.report_focus_events {
            host.send_data(if focused { b"\x1b[I" } else { b"\x1b[O" });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osc::NullTimer;
    use crate::testing::{RecordingHost, TestScreen};

    fn emulation() -> Emulation<TestScreen> {
        Emulation::new(
            [TestScreen::new(24, 80), TestScreen::new(24, 80)],
            Box::new(NullTimer),
        )
    }

    #[test]
    fn test_sgr_press_and_release() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1000, &mut host);
        emu.set_mode(Mode::Mouse1006, &mut host);
        emu.send_mouse_event(0, 10, 5, MouseEventKind::Press, &mut host);
        assert_eq!(host.sent, b"\x1b[<0;10;5M");
        host.sent.clear();
        emu.send_mouse_event(0, 10, 5, MouseEventKind::Release, &mut host);
        assert_eq!(host.sent, b"\x1b[<0;10;5m");
    }

    #[test]
    fn test_x10_default_encoding() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1000, &mut host);
        emu.send_mouse_event(0, 1, 1, MouseEventKind::Press, &mut host);
        assert_eq!(host.sent, vec![0x1B, b'[', b'M', 0x20, 0x21, 0x21]);
        host.sent.clear();
        // release becomes button 3 outside SGR
        emu.send_mouse_event(0, 1, 1, MouseEventKind::Release, &mut host);
        assert_eq!(host.sent, vec![0x1B, b'[', b'M', 0x23, 0x21, 0x21]);
    }

    #[test]
    fn test_x10_coordinates_out_of_range_dropped() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1000, &mut host);
        emu.send_mouse_event(0, 300, 5, MouseEventKind::Press, &mut host);
        assert!(host.sent.is_empty());
    }

    #[test]
    fn test_urxvt_encoding() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1000, &mut host);
        emu.set_mode(Mode::Mouse1015, &mut host);
        emu.send_mouse_event(0, 300, 5, MouseEventKind::Press, &mut host);
        assert_eq!(host.sent, b"\x1b[32;300;5M");
    }

    #[test]
    fn test_utf8_encoding_widens_coordinates() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1000, &mut host);
        emu.set_mode(Mode::Mouse1005, &mut host);
        emu.send_mouse_event(0, 200, 5, MouseEventKind::Press, &mut host);
        // column 200 + 32 = 232 encodes as two UTF-8 bytes
        let mut expected = b"\x1b[M\x20".to_vec();
        expected.extend_from_slice("è".as_bytes());
        expected.push(5 + 0x20);
        assert_eq!(host.sent, expected);
    }

    #[test]
    fn test_motion_dropped_in_press_release_mode() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1000, &mut host);
        emu.send_mouse_event(0, 5, 5, MouseEventKind::Motion, &mut host);
        assert!(host.sent.is_empty());
    }

    #[test]
    fn test_motion_marked_in_drag_mode() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1002, &mut host);
        emu.set_mode(Mode::Mouse1006, &mut host);
        emu.send_mouse_event(0, 5, 5, MouseEventKind::Motion, &mut host);
        assert_eq!(host.sent, b"\x1b[<32;5;5M");
    }

    #[test]
    fn test_wheel_button_offset() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1000, &mut host);
        emu.set_mode(Mode::Mouse1006, &mut host);
        emu.send_mouse_event(4, 2, 3, MouseEventKind::Press, &mut host);
        assert_eq!(host.sent, b"\x1b[<64;2;3M");
    }

    #[test]
    fn test_origin_must_be_positive() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.set_mode(Mode::Mouse1000, &mut host);
        emu.send_mouse_event(0, 0, 5, MouseEventKind::Press, &mut host);
        assert!(host.sent.is_empty());
    }

    #[test]
    fn test_focus_reporting_gated() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.focus_changed(true, &mut host);
        assert!(host.sent.is_empty());
        emu.report_focus_events = true;
        emu.focus_changed(true, &mut host);
        assert_eq!(host.sent, b"\x1b[I");
        host.sent.clear();
        emu.focus_changed(false, &mut host);
        assert_eq!(host.sent, b"\x1b[O");
    }
}
