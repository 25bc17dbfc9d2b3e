//! Device reports
//!
//! Replies to the status, attribute, position and checksum queries a program
//! can send. Every reply is a short 7-bit byte string pushed through the
//! host's outbound sink.

use crate::emulation::Emulation;
use crate::host::TerminalHost;
use crate::modes::Mode;
use crate::screen::Screen;
#[cfg(feature = "decrqcra")]
use crate::screen::Rendition;
use crate::tokenizer::MAXARGS;

impl<S: Screen> Emulation<S> {
    /// DA1. The ANSI answer claims VT100 with advanced video option.
    pub(crate) fn report_terminal_type(&mut self, host: &mut dyn TerminalHost) {
        if self.get_mode(Mode::Ansi) {
            host.send_data(b"\x1b[?1;2c");
        } else {
            host.send_data(b"\x1b/Z");
        }
    }

    /// DA2.
    pub(crate) fn report_secondary_attributes(&mut self, host: &mut dyn TerminalHost) {
        if self.get_mode(Mode::Ansi) {
            host.send_data(b"\x1b[>0;115;0c");
        } else {
            // VT52 never learned about DA2; answer like DA1 anyway for
            // compatibility with what older versions shipped.
            host.send_data(b"\x1b/Z");
        }
    }

    /// DA3 (DECRPTUI). The payload is hex for ASCII `~KDE`.
    pub(crate) fn report_tertiary_attributes(&mut self, host: &mut dyn TerminalHost) {
        host.send_data(b"\x1bP!|7E4B4445\x1b\\");
    }

    /// DECREPTPARM. Fixed 8N1-at-9600 fiction; `sol` echoes the request kind.
    pub(crate) fn report_terminal_params(&mut self, sol: i32, host: &mut dyn TerminalHost) {
        let reply = format!("\x1b[{};1;1;112;112;1;0x", sol);
        host.send_data(reply.as_bytes());
    }

    /// DSR: always ready.
    pub(crate) fn report_status(&mut self, host: &mut dyn TerminalHost) {
        host.send_data(b"\x1b[0n");
    }

    /// ENQ answer-back. Nothing is configured, so nothing is sent.
    pub(crate) fn report_answer_back(&mut self, host: &mut dyn TerminalHost) {
        const ANSWER_BACK: &[u8] = b"";
        host.send_data(ANSWER_BACK);
    }

    /// CPR: 1-based cursor position, relative to the top margin under
    /// origin mode.
    pub(crate) fn report_cursor_position(&mut self, host: &mut dyn TerminalHost) {
        let screen = self.current_screen();
        let mut y = screen.cursor_y() + 1;
        let x = screen.cursor_x() + 1;
        if screen.get_mode(Mode::Origin) {
            y -= screen.top_margin();
        }
        let reply = format!("\x1b[{};{}R", y, x);
        host.send_data(reply.as_bytes());
    }

    /// Reply to `CSI 18 t` with the character-cell size of the screen.
    pub(crate) fn report_size(&mut self, host: &mut dyn TerminalHost) {
        let screen = self.current_screen();
        let reply = format!("\x1b[8;{};{}t", screen.lines(), screen.columns());
        host.send_data(reply.as_bytes());
    }

    /// DECRQCRA. The reply frame always goes out; the sum itself is only
    /// computed when the `decrqcra` feature is enabled.
    pub(crate) fn process_checksum_request(
        &mut self,
        argc: usize,
        argv: &[i32; MAXARGS],
        host: &mut dyn TerminalHost,
    ) {
        #[cfg(feature = "decrqcra")]
        let checksum = match self.region_checksum(argc, argv) {
            Some(sum) => sum,
            None => return,
        };
        #[cfg(not(feature = "decrqcra"))]
        let checksum: i32 = {
            let _ = argc;
            0
        };

        let reply = format!(
            "\x1bP{}!~{:04X}\x1b\\",
            argv[0],
            checksum.wrapping_neg() & 0xFFFF
        );
        host.send_data(reply.as_bytes());
    }

    /// Sum the requested rectangle. `None` means the request was ill-formed
    /// and no reply at all should be produced.
    #[cfg(feature = "decrqcra")]
    fn region_checksum(&self, argc: usize, argv: &[i32; MAXARGS]) -> Option<i32> {
        let mut argc = argc;
        // "If Pp is 0 or omitted, subsequent parameters are ignored and a
        // checksum for all page memory will be reported." (DEC STD-070)
        if argv[1] == 0 {
            argc = 1;
        }

        let screen = self.current_screen();
        let mut top = if argc >= 2 { argv[2] } else { 1 };
        let mut left = if argc >= 3 { argv[3] } else { 1 };
        let mut bottom = if argc >= 4 { argv[4] } else { screen.lines() };
        let mut right = if argc >= 5 { argv[5] } else { screen.columns() };

        if top > bottom || left > right {
            return None;
        }

        if screen.get_mode(Mode::Origin) {
            top += screen.top_margin();
            bottom += screen.top_margin();
        }

        top = top.clamp(1, screen.lines());
        bottom = bottom.clamp(1, screen.lines());
        left = left.clamp(1, screen.columns());
        right = right.clamp(1, screen.columns());

        let mut checksum: i32 = 0;
        for y in (top - 1)..=(bottom - 1) {
            for x in (left - 1)..=(right - 1) {
                let cell = screen.cell_at(y, x);
                if cell.rendition.contains(Rendition::CONCEAL) {
                    checksum += 0x20; // don't reveal secrets
                } else {
                    checksum += cell.character as i32;
                }
                if cell.rendition.contains(Rendition::BOLD) {
                    checksum += 0x80;
                }
                if cell.rendition.contains(Rendition::BLINK) {
                    checksum += 0x40;
                }
                if cell.rendition.contains(Rendition::REVERSE) {
                    checksum += 0x20;
                }
                if cell.rendition.contains(Rendition::UNDERLINE) {
                    checksum += 0x10;
                }
            }
        }
        Some(checksum)
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
    fn test_primary_attributes_by_mode() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.report_terminal_type(&mut host);
        assert_eq!(host.sent, b"\x1b[?1;2c");
        host.sent.clear();
        emu.modes.put(Mode::Ansi, false);
        emu.report_terminal_type(&mut host);
        assert_eq!(host.sent, b"\x1b/Z");
    }

    #[test]
    fn test_secondary_and_tertiary_attributes() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.report_secondary_attributes(&mut host);
        assert_eq!(host.sent, b"\x1b[>0;115;0c");
        host.sent.clear();
        emu.report_tertiary_attributes(&mut host);
        assert_eq!(host.sent, b"\x1bP!|7E4B4445\x1b\\");
    }

    #[test]
    fn test_status_report() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.report_status(&mut host);
        assert_eq!(host.sent, b"\x1b[0n");
    }

    #[test]
    fn test_terminal_params() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.report_terminal_params(2, &mut host);
        assert_eq!(host.sent, b"\x1b[2;1;1;112;112;1;0x");
    }

    #[test]
    fn test_cursor_position_report() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.current_screen_mut().set_cursor_yx(5, 10);
        emu.report_cursor_position(&mut host);
        assert_eq!(host.sent, b"\x1b[5;10R");
    }

    #[test]
    fn test_cursor_position_under_origin_mode() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.current_screen_mut().set_margins(3, 20);
        emu.current_screen_mut().set_mode(Mode::Origin);
        emu.current_screen_mut().set_cursor_yx(5, 10);
        emu.report_cursor_position(&mut host);
        // top margin (2 lines above) is subtracted from the reported row
        assert_eq!(host.sent, b"\x1b[3;10R");
    }

    #[test]
    fn test_size_report() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.report_size(&mut host);
        assert_eq!(host.sent, b"\x1b[8;24;80t");
    }

    #[cfg(feature = "decrqcra")]
    #[test]
    fn test_checksum_of_empty_region() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        // Pid 1, page 1, region rows 1..=1 cols 1..=2 of a blank screen
        let mut argv = [0i32; MAXARGS];
        argv[0] = 1;
        argv[1] = 1;
        argv[2] = 1;
        argv[3] = 1;
        argv[4] = 1;
        argv[5] = 2;
        emu.process_checksum_request(5, &argv, &mut host);
        // two blank cells: -(2 * 0x20) & 0xffff
        assert_eq!(host.sent, b"\x1bP1!~FFC0\x1b\\");
    }

    #[cfg(feature = "decrqcra")]
    #[test]
    fn test_checksum_inverted_region_sends_nothing() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        let mut argv = [0i32; MAXARGS];
        argv[0] = 1;
        argv[1] = 1;
        argv[2] = 5;
        argv[3] = 1;
        argv[4] = 2; // bottom above top
        argv[5] = 2;
        emu.process_checksum_request(5, &argv, &mut host);
        assert!(host.sent.is_empty());
    }

    #[cfg(not(feature = "decrqcra"))]
    #[test]
    fn test_checksum_reply_without_feature_is_zero() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        let mut argv = [0i32; MAXARGS];
        argv[0] = 7;
        emu.process_checksum_request(0, &argv, &mut host);
        assert_eq!(host.sent, b"\x1bP7!~0000\x1b\\");
    }
}
