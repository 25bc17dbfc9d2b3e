//! Token interpretation
//!
//! Assigns meaning to scanned tokens: operations on the current screen, mode
//! transitions, outbound reports, or emulation-level state changes. The
//! match is exhaustive over the token variants; anything that falls through
//! a per-variant table is a decoding error, logged and dropped.

use crate::emulation::Emulation;
use crate::host::{CursorShape, TerminalHost};
use crate::modes::Mode;
use crate::screen::{ColorSpace, LineProperty, Rendition, Screen};
use crate::token::Token;

impl<S: Screen> Emulation<S> {
    /// Apply one token. `p` and `q` carry the token's numeric companions:
    /// the code point for `Chr`, cursor coordinates for `CsiPn`/`Vt52`, the
    /// color payload for folded SGR tokens, resize extents for `CSI 8 t`.
    pub(crate) fn process_token(
        &mut self,
        host: &mut dyn TerminalHost,
        token: Token,
        p: i32,
        q: i32,
    ) {
        match token {
            Token::Chr => self.current_screen_mut().display_character(p as u32),

            Token::Ctl(c) => match c {
                0x05 => self.report_answer_back(host), // ENQ
                0x07 => host.bell(),                   // BEL
                0x08 => self.current_screen_mut().backspace(), // BS
                0x09 => self.current_screen_mut().tab(1), // HT
                0x0A | 0x0B | 0x0C => self.current_screen_mut().new_line(), // LF, VT, FF
                0x0D => self.current_screen_mut().to_start_of_line(), // CR
                0x0E => self.use_charset(1),           // SO
                0x0F => self.use_charset(0),           // SI
                // CAN and SUB abort a sequence and leave a mark
                0x18 | 0x1A => self.current_screen_mut().display_character(0x2592),
                // NUL, SOH..EOT, ACK, DLE..DC4, NAK..ETB, EM, FS..US: ignored
                _ => {}
            },

            Token::Esc(f) => match f {
                b'D' => self.current_screen_mut().index(),
                b'E' => self.current_screen_mut().next_line(),
                b'H' => self.current_screen_mut().change_tab_stop(true),
                b'M' => self.current_screen_mut().reverse_index(),
                b'Z' => self.report_terminal_type(host),
                b'c' => self.reset(host),
                b'n' => self.use_charset(2),
                b'o' => self.use_charset(3),
                b'7' => self.save_cursor(),
                b'8' => self.restore_cursor(),
                b'=' => self.set_mode(Mode::AppKeyPad, host),
                b'>' => self.reset_mode(Mode::AppKeyPad, host),
                b'<' => self.set_mode(Mode::Ansi, host),
                _ => self.report_decoding_error(),
            },

            Token::EscCs(intermediate, f) => match (intermediate, f) {
                (b'(', b'0' | b'A' | b'B') => self.set_charset(0, f),
                (b')', b'0' | b'A' | b'B') => self.set_charset(1, f),
                (b'*', b'0' | b'A' | b'B') => self.set_charset(2, f),
                (b'+', b'0' | b'A' | b'B') => self.set_charset(3, f),
                (b'%', b'G') => self.set_codec(crate::codec::Codec::Utf8),
                (b'%', b'@') => self.set_codec(crate::codec::Codec::Locale),
                _ => self.report_decoding_error(),
            },

            Token::EscDe(f) => match f {
                b'3' => {
                    // double height, top half
                    let screen = self.current_screen_mut();
                    screen.set_line_property(LineProperty::DoubleWidth, true);
                    screen.set_line_property(LineProperty::DoubleHeightTop, true);
                    screen.set_line_property(LineProperty::DoubleHeightBottom, false);
                }
                b'4' => {
                    // double height, bottom half
                    let screen = self.current_screen_mut();
                    screen.set_line_property(LineProperty::DoubleWidth, true);
                    screen.set_line_property(LineProperty::DoubleHeightTop, false);
                    screen.set_line_property(LineProperty::DoubleHeightBottom, true);
                }
                b'5' => {
                    // single width, single height
                    let screen = self.current_screen_mut();
                    screen.set_line_property(LineProperty::DoubleWidth, false);
                    screen.set_line_property(LineProperty::DoubleHeightTop, false);
                    screen.set_line_property(LineProperty::DoubleHeightBottom, false);
                }
                b'6' => {
                    // double width, single height
                    let screen = self.current_screen_mut();
                    screen.set_line_property(LineProperty::DoubleWidth, true);
                    screen.set_line_property(LineProperty::DoubleHeightTop, false);
                    screen.set_line_property(LineProperty::DoubleHeightBottom, false);
                }
                b'8' => self.current_screen_mut().help_align(),
                _ => self.report_decoding_error(),
            },

            Token::CsiPs(f, n) => match (f, n) {
                // window operations; `CSI 8 ; lines ; columns t` resizes
                (b't', 8) => {
                    self.set_image_size(p, q);
                    host.image_resize_request(q, p);
                }
                (b't', 18) => self.report_size(host),
                (b't', 22) | (b't', 23) => {} // icon/title stack: ignored
                (b't', 28) => {}              // legacy tab-color extension: ignored

                (b'K', 0) => self.current_screen_mut().clear_to_end_of_line(),
                (b'K', 1) => self.current_screen_mut().clear_to_begin_of_line(),
                (b'K', 2) => self.current_screen_mut().clear_entire_line(),
                (b'J', 0) => self.current_screen_mut().clear_to_end_of_screen(),
                (b'J', 1) => self.current_screen_mut().clear_to_begin_of_screen(),
                (b'J', 2) => self.current_screen_mut().clear_entire_screen(),
                (b'J', 3) => self.current_screen_mut().clear_history(),

                (b'g', 0) => self.current_screen_mut().change_tab_stop(false),
                (b'g', 3) => self.current_screen_mut().clear_tab_stops(),

                (b'h', 4) => self.current_screen_mut().set_mode(Mode::Insert),
                (b'h', 20) => self.set_mode(Mode::NewLine, host),
                (b'i', 0) => {} // attached printer: ignored
                (b'l', 4) => self.current_screen_mut().reset_mode(Mode::Insert),
                (b'l', 20) => self.reset_mode(Mode::NewLine, host),

                (b's', 0) => self.save_cursor(),
                (b'u', 0) => self.restore_cursor(),

                (b'm', 0) => self.current_screen_mut().set_default_rendition(),
                (b'm', 1) => self.current_screen_mut().set_rendition(Rendition::BOLD),
                (b'm', 2) => self.current_screen_mut().set_rendition(Rendition::FAINT),
                (b'm', 3) => self.current_screen_mut().set_rendition(Rendition::ITALIC),
                (b'm', 4) => self.current_screen_mut().set_rendition(Rendition::UNDERLINE),
                (b'm', 5) => self.current_screen_mut().set_rendition(Rendition::BLINK),
                (b'm', 7) => self.current_screen_mut().set_rendition(Rendition::REVERSE),
                (b'm', 8) => self.current_screen_mut().set_rendition(Rendition::CONCEAL),
                (b'm', 9) => self.current_screen_mut().set_rendition(Rendition::STRIKEOUT),
                (b'm', 53) => self.current_screen_mut().set_rendition(Rendition::OVERLINE),
                (b'm', 10) | (b'm', 11) | (b'm', 12) => {} // font mapping: ignored
                (b'm', 21) => self.current_screen_mut().reset_rendition(Rendition::BOLD),
                (b'm', 22) => {
                    let screen = self.current_screen_mut();
                    screen.reset_rendition(Rendition::BOLD);
                    screen.reset_rendition(Rendition::FAINT);
                }
                (b'm', 23) => self.current_screen_mut().reset_rendition(Rendition::ITALIC),
                (b'm', 24) => self.current_screen_mut().reset_rendition(Rendition::UNDERLINE),
                (b'm', 25) => self.current_screen_mut().reset_rendition(Rendition::BLINK),
                (b'm', 27) => self.current_screen_mut().reset_rendition(Rendition::REVERSE),
                (b'm', 28) => self.current_screen_mut().reset_rendition(Rendition::CONCEAL),
                (b'm', 29) => self.current_screen_mut().reset_rendition(Rendition::STRIKEOUT),
                (b'm', 55) => self.current_screen_mut().reset_rendition(Rendition::OVERLINE),

                (b'm', 30..=37) => self
                    .current_screen_mut()
                    .set_fore_color(ColorSpace::System, i32::from(n) - 30),
                (b'm', 38) => self
                    .current_screen_mut()
                    .set_fore_color(ColorSpace::from_i32(p), q),
                (b'm', 39) => self
                    .current_screen_mut()
                    .set_fore_color(ColorSpace::Default, 0),
                (b'm', 40..=47) => self
                    .current_screen_mut()
                    .set_back_color(ColorSpace::System, i32::from(n) - 40),
                (b'm', 48) => self
                    .current_screen_mut()
                    .set_back_color(ColorSpace::from_i32(p), q),
                (b'm', 49) => self
                    .current_screen_mut()
                    .set_back_color(ColorSpace::Default, 1),
                (b'm', 90..=97) => self
                    .current_screen_mut()
                    .set_fore_color(ColorSpace::System, i32::from(n) - 90 + 8),
                (b'm', 100..=107) => self
                    .current_screen_mut()
                    .set_back_color(ColorSpace::System, i32::from(n) - 100 + 8),

                (b'n', 5) => self.report_status(host),
                (b'n', 6) => self.report_cursor_position(host),
                (b'q', 0..=4) => {} // keyboard LEDs: ignored
                (b'x', 0) => self.report_terminal_params(2, host),
                (b'x', 1) => self.report_terminal_params(3, host),
                _ => self.report_decoding_error(),
            },

            Token::CsiPn(f) => match f {
                b'@' => self.current_screen_mut().insert_chars(p),
                b'A' => self.current_screen_mut().cursor_up(p),
                b'B' => self.current_screen_mut().cursor_down(p),
                b'C' => self.current_screen_mut().cursor_right(p),
                b'D' => self.current_screen_mut().cursor_left(p),
                b'E' => self.current_screen_mut().cursor_next_line(p),
                b'F' => self.current_screen_mut().cursor_previous_line(p),
                b'G' => self.current_screen_mut().set_cursor_x(p),
                b'H' => self.current_screen_mut().set_cursor_yx(p, q),
                b'I' => self.current_screen_mut().tab(p),
                b'L' => self.current_screen_mut().insert_lines(p),
                b'M' => self.current_screen_mut().delete_lines(p),
                b'P' => self.current_screen_mut().delete_chars(p),
                b'S' => self.current_screen_mut().scroll_up(p),
                b'T' => self.current_screen_mut().scroll_down(p),
                b'X' => self.current_screen_mut().erase_chars(p),
                b'Z' => self.current_screen_mut().backtab(p),
                b'b' => self.current_screen_mut().repeat_chars(p),
                b'c' => self.report_terminal_type(host),
                b'd' => self.current_screen_mut().set_cursor_y(p),
                b'f' => self.current_screen_mut().set_cursor_yx(p, q),
                b'r' => self.set_margins(p, q),
                b'y' => {} // confidence test: ignored
                _ => self.report_decoding_error(),
            },

            Token::CsiPr(f, n) => match (f, n) {
                (b'h', 1) => self.set_mode(Mode::AppCuKeys, host),
                (b'l', 1) => self.reset_mode(Mode::AppCuKeys, host),
                (b's', 1) => self.save_mode(Mode::AppCuKeys),
                (b'r', 1) => self.restore_mode(Mode::AppCuKeys, host),

                (b'l', 2) => self.reset_mode(Mode::Ansi, host),

                (b'h', 3) => self.set_mode(Mode::Columns132, host),
                (b'l', 3) => self.reset_mode(Mode::Columns132, host),

                (b'h' | b'l', 4) => {} // soft scrolling: ignored

                (b'h', 5) => self.current_screen_mut().set_mode(Mode::Screen),
                (b'l', 5) => self.current_screen_mut().reset_mode(Mode::Screen),

                (b'h', 6) => self.current_screen_mut().set_mode(Mode::Origin),
                (b'l', 6) => self.current_screen_mut().reset_mode(Mode::Origin),
                (b's', 6) => self.current_screen_mut().save_mode(Mode::Origin),
                (b'r', 6) => self.current_screen_mut().restore_mode(Mode::Origin),

                (b'h', 7) => self.current_screen_mut().set_mode(Mode::Wrap),
                (b'l', 7) => self.current_screen_mut().reset_mode(Mode::Wrap),
                (b's', 7) => self.current_screen_mut().save_mode(Mode::Wrap),
                (b'r', 7) => self.current_screen_mut().restore_mode(Mode::Wrap),

                (b'h' | b'l' | b's' | b'r', 8) => {}  // auto-repeat: ignored
                (b'h' | b'l' | b's' | b'r', 9) => {}  // interlace: ignored
                (b'h' | b'l' | b's' | b'r', 12) => {} // cursor blink: ignored

                (b'h', 25) => self.set_mode(Mode::Cursor, host),
                (b'l', 25) => self.reset_mode(Mode::Cursor, host),
                (b's', 25) => self.save_mode(Mode::Cursor),
                (b'r', 25) => self.restore_mode(Mode::Cursor, host),

                (b'h', 40) => self.set_mode(Mode::Allow132Columns, host),
                (b'l', 40) => self.reset_mode(Mode::Allow132Columns, host),

                (b'h' | b'l' | b's' | b'r', 41) => {} // obsolete more(1) fix: ignored

                (b'h', 47) => self.set_mode(Mode::AppScreen, host),
                (b'l', 47) => self.reset_mode(Mode::AppScreen, host),
                (b's', 47) => self.save_mode(Mode::AppScreen),
                (b'r', 47) => self.restore_mode(Mode::AppScreen, host),

                (b'h' | b'l' | b's' | b'r', 67) => {} // DECBKM: ignored

                (b'h', 1000) => self.set_mode(Mode::Mouse1000, host),
                (b'l', 1000) => self.reset_mode(Mode::Mouse1000, host),
                (b's', 1000) => self.save_mode(Mode::Mouse1000),
                (b'r', 1000) => self.restore_mode(Mode::Mouse1000, host),

                // Highlight tracking is recognized but only reset is acted
                // upon; enabling it would require cooperation we never give.
                (b'h', 1001) => {}
                (b'l', 1001) => self.reset_mode(Mode::Mouse1001, host),
                (b's' | b'r', 1001) => {}

                (b'h', 1002) => self.set_mode(Mode::Mouse1002, host),
                (b'l', 1002) => self.reset_mode(Mode::Mouse1002, host),
                (b's', 1002) => self.save_mode(Mode::Mouse1002),
                (b'r', 1002) => self.restore_mode(Mode::Mouse1002, host),

                (b'h', 1003) => self.set_mode(Mode::Mouse1003, host),
                (b'l', 1003) => self.reset_mode(Mode::Mouse1003, host),
                (b's', 1003) => self.save_mode(Mode::Mouse1003),
                (b'r', 1003) => self.restore_mode(Mode::Mouse1003, host),

                (b'h', 1004) => self.report_focus_events = true,
                (b'l', 1004) => self.report_focus_events = false,

                (b'h', 1005) => self.set_mode(Mode::Mouse1005, host),
                (b'l', 1005) => self.reset_mode(Mode::Mouse1005, host),
                (b's', 1005) => self.save_mode(Mode::Mouse1005),
                (b'r', 1005) => self.restore_mode(Mode::Mouse1005, host),

                (b'h', 1006) => self.set_mode(Mode::Mouse1006, host),
                (b'l', 1006) => self.reset_mode(Mode::Mouse1006, host),
                (b's', 1006) => self.save_mode(Mode::Mouse1006),
                (b'r', 1006) => self.restore_mode(Mode::Mouse1006, host),

                (b'h', 1007) => self.set_mode(Mode::Mouse1007, host),
                (b'l', 1007) => self.reset_mode(Mode::Mouse1007, host),
                (b's', 1007) => self.save_mode(Mode::Mouse1007),
                (b'r', 1007) => self.restore_mode(Mode::Mouse1007, host),

                (b'h', 1015) => self.set_mode(Mode::Mouse1015, host),
                (b'l', 1015) => self.reset_mode(Mode::Mouse1015, host),
                (b's', 1015) => self.save_mode(Mode::Mouse1015),
                (b'r', 1015) => self.restore_mode(Mode::Mouse1015, host),

                (b'h', 1034) => {} // 8-bit input: ignored

                (b'h', 1047) => self.set_mode(Mode::AppScreen, host),
                (b'l', 1047) => {
                    self.screens[1].clear_entire_screen();
                    self.reset_mode(Mode::AppScreen, host);
                }
                (b's', 1047) => self.save_mode(Mode::AppScreen),
                (b'r', 1047) => self.restore_mode(Mode::AppScreen, host),

                (b'h', 1048) => self.save_cursor(),
                (b'l', 1048) => self.restore_cursor(),
                (b's', 1048) => self.save_cursor(),
                (b'r', 1048) => self.restore_cursor(),

                (b'h', 1049) => {
                    self.save_cursor();
                    self.screens[1].clear_entire_screen();
                    self.set_mode(Mode::AppScreen, host);
                }
                (b'l', 1049) => {
                    self.reset_mode(Mode::AppScreen, host);
                    self.restore_cursor();
                }

                (b'h', 2004) => self.set_mode(Mode::BracketedPaste, host),
                (b'l', 2004) => self.reset_mode(Mode::BracketedPaste, host),
                (b's', 2004) => self.save_mode(Mode::BracketedPaste),
                (b'r', 2004) => self.restore_mode(Mode::BracketedPaste, host),

                _ => self.report_decoding_error(),
            },

            // `CSI ! p` is DECSTR; everything else in this shape is unknown
            Token::CsiPe(f) => match f {
                b'p' => {}
                _ => self.report_decoding_error(),
            },

            // `CSI SP q` without a parameter behaves like `CSI 1 SP q`
            Token::CsiSp(f) => match f {
                b'q' => host.set_cursor_style_request(CursorShape::Block, true),
                _ => self.report_decoding_error(),
            },

            // DECSCUSR; 0 restores the configured default, matching VTE
            Token::CsiPsp(f, n) => match (f, n) {
                (b'q', 0) => host.reset_cursor_style_request(),
                (b'q', 1) => host.set_cursor_style_request(CursorShape::Block, true),
                (b'q', 2) => host.set_cursor_style_request(CursorShape::Block, false),
                (b'q', 3) => host.set_cursor_style_request(CursorShape::Underline, true),
                (b'q', 4) => host.set_cursor_style_request(CursorShape::Underline, false),
                (b'q', 5) => host.set_cursor_style_request(CursorShape::IBeam, true),
                (b'q', 6) => host.set_cursor_style_request(CursorShape::IBeam, false),
                _ => self.report_decoding_error(),
            },

            Token::CsiPq(f) => match f {
                b'c' => self.report_tertiary_attributes(host),
                _ => self.report_decoding_error(),
            },

            Token::CsiPg(f) => match f {
                b'c' => self.report_secondary_attributes(host),
                _ => self.report_decoding_error(),
            },

            Token::Vt52(f) => match f {
                b'A' => self.current_screen_mut().cursor_up(1),
                b'B' => self.current_screen_mut().cursor_down(1),
                b'C' => self.current_screen_mut().cursor_right(1),
                b'D' => self.current_screen_mut().cursor_left(1),
                b'F' => self.set_and_use_charset(0, b'0'),
                b'G' => self.set_and_use_charset(0, b'B'),
                b'H' => self.current_screen_mut().set_cursor_yx(1, 1),
                b'I' => self.current_screen_mut().reverse_index(),
                b'J' => self.current_screen_mut().clear_to_end_of_screen(),
                b'K' => self.current_screen_mut().clear_to_end_of_line(),
                b'Y' => self.current_screen_mut().set_cursor_yx(p - 31, q - 31),
                b'Z' => self.report_terminal_type(host),
                b'<' => self.set_mode(Mode::Ansi, host),
                b'=' => self.set_mode(Mode::AppKeyPad, host),
                b'>' => self.reset_mode(Mode::AppKeyPad, host),
                _ => self.report_decoding_error(),
            },
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
    fn test_sgr_dispatches_rendition() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.process_token(&mut host, Token::CsiPs(b'm', 1), 0, 0);
        assert!(emu.current_screen().rendition.contains(Rendition::BOLD));
        emu.process_token(&mut host, Token::CsiPs(b'm', 22), 0, 0);
        assert!(!emu.current_screen().rendition.contains(Rendition::BOLD));
    }

    #[test]
    fn test_sgr_color_payloads() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.process_token(
            &mut host,
            Token::CsiPs(b'm', 38),
            ColorSpace::Rgb as i32,
            0x102030,
        );
        assert_eq!(
            emu.current_screen().fore_color,
            Some((ColorSpace::Rgb, 0x102030))
        );
        emu.process_token(&mut host, Token::CsiPs(b'm', 44), 0, 0);
        assert_eq!(
            emu.current_screen().back_color,
            Some((ColorSpace::System, 4))
        );
    }

    #[test]
    fn test_unknown_token_is_swallowed() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.process_token(&mut host, Token::Esc(b'q'), 0, 0);
        emu.process_token(&mut host, Token::CsiPs(b'Q', 77), 0, 0);
        assert!(host.sent.is_empty());
    }

    #[test]
    fn test_vt52_cursor_addressing_bias() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.process_token(&mut host, Token::Vt52(b'Y'), 37, 42);
        // row/column arrive with a 31 offset on the wire
        assert_eq!(emu.current_screen().cursor_y(), 37 - 31 - 1);
        assert_eq!(emu.current_screen().cursor_x(), 42 - 31 - 1);
    }

    #[test]
    fn test_alternate_screen_1049_choreography() {
        let mut emu = emulation();
        let mut host = RecordingHost::new();
        emu.process_token(&mut host, Token::CsiPr(b'h', 1049), 0, 0);
        assert_eq!(emu.current_screen_index(), 1);
        assert!(emu.screen(1).calls.iter().any(|c| c == "clear_entire_screen"));
        assert!(emu.screen(0).calls.iter().any(|c| c == "save_cursor"));
        emu.process_token(&mut host, Token::CsiPr(b'l', 1049), 0, 0);
        assert_eq!(emu.current_screen_index(), 0);
        assert!(emu.screen(0).calls.iter().any(|c| c == "restore_cursor"));
    }
}
