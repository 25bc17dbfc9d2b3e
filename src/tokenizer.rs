//! Escape-code scanner
//!
//! Separates the incoming code-point stream into tokens which the dispatcher
//! maps onto screen or emulation operations. Instead of an explicit state
//! machine the scanner keeps the partial token in a bounded buffer and
//! combines its shape with the current character to reach a decision, so the
//! whole recognition is a priority-ordered chain of predicates over
//! `(buffer, current char)`.
//!
//! Numeric parameters are accumulated on the side in `argv`/`argc`, clamped
//! to [`MAX_ARGUMENT`] and [`MAXARGS`]; an overlong token overwrites its last
//! buffer slot rather than growing, and will normally end in a decoding
//! error, which is logged and swallowed.

use crate::emulation::Emulation;
use crate::host::TerminalHost;
use crate::modes::Mode;
use crate::screen::{ColorSpace, Screen};
use crate::token::Token;

/// Upper bound on buffered code points for one token.
pub const MAX_TOKEN_LENGTH: usize = 20 * 1024;
/// Upper bound on accumulated numeric parameters.
pub const MAXARGS: usize = 15;
/// Upper bound on a single numeric parameter value.
pub const MAX_ARGUMENT: i32 = 40960;

const ESC: u32 = 0x1B;
const DEL: u32 = 0x7F;
const SP: u32 = 0x20;

// Character class flags used while scanning.
const CTL: u8 = 1; // control character
const CHR: u8 = 2; // printable character
const CPN: u8 = 4; // CSI parametric final
const DIG: u8 = 8; // digit
const SCS: u8 = 16; // select-character-set intermediate
const GRP: u8 = 32; // start of a sequence group
const CPS: u8 = 64; // window-operation final
const INT: u8 = 128; // intermediate byte (ECMA-48 5.4: CSI P..P I..I F)

const fn build_char_class() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 32 {
        table[i] |= CTL;
        i += 1;
    }
    while i < 256 {
        table[i] |= CHR;
        i += 1;
    }
    let mut i = 0x20;
    while i < 0x30 {
        table[i] |= INT;
        i += 1;
    }
    let cpn = b"@ABCDEFGHILMPSTXZbcdfry";
    let mut k = 0;
    while k < cpn.len() {
        table[cpn[k] as usize] |= CPN;
        k += 1;
    }
    // window operations end on `t`
    table[b't' as usize] |= CPS;
    let dig = b"0123456789";
    let mut k = 0;
    while k < dig.len() {
        table[dig[k] as usize] |= DIG;
        k += 1;
    }
    let scs = b"()+*%";
    let mut k = 0;
    while k < scs.len() {
        table[scs[k] as usize] |= SCS;
        k += 1;
    }
    let grp = b"()+*#[]%";
    let mut k = 0;
    while k < grp.len() {
        table[grp[k] as usize] |= GRP;
        k += 1;
    }
    table
}

static CHAR_CLASS: [u8; 256] = build_char_class();

fn char_class(cc: u32) -> u8 {
    if cc < 256 {
        CHAR_CLASS[cc as usize]
    } else {
        0
    }
}

/// Buffered token under construction plus decoded numeric arguments.
#[derive(Debug, Clone)]
pub(crate) struct Tokenizer {
    buffer: Vec<u32>,
    pub(crate) argv: [i32; MAXARGS],
    pub(crate) argc: usize,
}

impl Tokenizer {
    pub(crate) fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64),
            argv: [0; MAXARGS],
            argc: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.buffer.clear();
        self.argc = 0;
        self.argv[0] = 0;
        self.argv[1] = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn at(&self, index: usize) -> u32 {
        self.buffer.get(index).copied().unwrap_or(0)
    }

    pub(crate) fn set(&mut self, index: usize, cc: u32) {
        if let Some(slot) = self.buffer.get_mut(index) {
            *slot = cc;
        }
    }

    /// Append a code point; once full, new characters replace the last slot.
    pub(crate) fn push(&mut self, cc: u32) {
        if self.buffer.len() >= MAX_TOKEN_LENGTH {
            *self.buffer.last_mut().unwrap() = cc;
        } else {
            self.buffer.push(cc);
        }
    }

    pub(crate) fn add_digit(&mut self, digit: i32) {
        self.argv[self.argc] = (10 * self.argv[self.argc] + digit).min(MAX_ARGUMENT);
    }

    pub(crate) fn add_argument(&mut self) {
        self.argc = (self.argc + 1).min(MAXARGS - 1);
        self.argv[self.argc] = 0;
    }

    /// An `ESC ]` control string is being accumulated.
    pub(crate) fn osc_in_progress(&self) -> bool {
        self.buffer.len() >= 2 && self.buffer[1] == u32::from(b']')
    }

    /// Human-readable rendering of the scan buffer for error reports.
    pub(crate) fn hexdump(&self) -> String {
        let mut out = String::new();
        for &cc in &self.buffer {
            if cc == u32::from(b'\\') {
                out.push_str("\\\\");
            } else if cc > 32 && cc < 127 {
                out.push(char::from_u32(cc).unwrap_or('\u{FFFD}'));
            } else if cc == ESC {
                out.push_str("ESC");
            } else {
                out.push_str(&format!("\\{:04x}(hex)", cc));
            }
        }
        out
    }
}

impl<S: Screen> Emulation<S> {
    /// Decode raw child-process output through the active codec and scan it.
    pub fn receive_data(&mut self, data: &[u8], host: &mut dyn TerminalHost) {
        let mut chars = Vec::with_capacity(data.len());
        match self.codec {
            crate::codec::Codec::Utf8 => {
                chars.extend(
                    data.iter()
                        .filter_map(|&byte| self.utf8_decoder.feed(byte))
                        .map(u32::from),
                );
            }
            crate::codec::Codec::Locale => {
                chars.extend(data.iter().map(|&b| u32::from(b)));
            }
        }
        self.receive_chars(&chars, host);
    }

    /// Scan a run of code points, dispatching every completed token.
    pub fn receive_chars(&mut self, chars: &[u32], host: &mut dyn TerminalHost) {
        for &cc in chars {
            self.receive_char(cc, host);
        }
    }

    fn receive_char(&mut self, cc: u32, host: &mut dyn TerminalHost) {
        if cc == DEL {
            return; // VT100: ignored on input
        }

        if char_class(cc) & CTL != 0 {
            let osc = self.tokenizer.osc_in_progress();
            // Inside an OSC body controls are swallowed, except BEL and ESC
            // which may terminate the text.
            if osc && cc != ESC && cc != 0x07 {
                return;
            }
            if !osc {
                // Controls are passed transparently through an ongoing escape
                // sequence; only CAN, SUB and a stray ESC abandon it.
                if cc == 0x18 || cc == 0x1A || cc == ESC {
                    self.tokenizer.reset();
                }
                if cc != ESC {
                    self.process_token(host, Token::Ctl(cc as u8), 0, 0);
                    return;
                }
            }
        }

        self.tokenizer.push(cc);
        if self.get_mode(Mode::Ansi) {
            self.scan_ansi(cc, host);
        } else {
            self.scan_vt52(cc, host);
        }
    }

    fn scan_ansi(&mut self, cc: u32, host: &mut dyn TerminalHost) {
        let p = self.tokenizer.len();
        let s0 = self.tokenizer.at(0);
        let s1 = self.tokenizer.at(1);
        let s2 = self.tokenizer.at(2);
        let s3 = self.tokenizer.at(3);
        let prev1 = if p >= 1 { self.tokenizer.at(p - 1) } else { 0 };
        let prev2 = if p >= 2 { self.tokenizer.at(p - 2) } else { 0 };

        if p == 1 && cc == ESC {
            return;
        }
        if p == 1 && cc == ESC + 128 {
            // 8-bit CSI (0x9B): rewrite to the 7-bit form and rescan. Only
            // the locale codec can deliver this code point; a UTF-8 stream
            // never produces a bare 0x9B.
            self.tokenizer.set(0, ESC);
            self.receive_char(u32::from(b'['), host);
            return;
        }
        if p == 2 && char_class(s1) & GRP != 0 {
            return;
        }

        // Operating System Command: `ESC ]` ... BEL | ST | ESC <other>
        if p > 2 && s1 == u32::from(b']') {
            if prev2 == ESC && prev1 == u32::from(b'\\') {
                // Hyperlinks arrive as two OSC 8 frames, the first carrying
                // the URL and the second empty; each terminated frame
                // toggles URL input on the extractor.
                if s2 == u32::from(b'8') {
                    self.current_screen_mut().toggle_url_input();
                }
                self.process_session_attribute_request(p - 1, host);
                self.tokenizer.reset();
                return;
            }
            if prev2 == ESC {
                // `ESC <other>` also ends the string; the trailing character
                // opens the next sequence and is scanned again.
                self.process_session_attribute_request(p - 1, host);
                self.tokenizer.reset();
                self.receive_char(cc, host);
                return;
            }
            if prev1 == 0x07 {
                self.process_session_attribute_request(p, host);
                self.tokenizer.reset();
                return;
            }
        }
        if self.tokenizer.osc_in_progress() {
            return;
        }

        if p == 3 && (s2 == u32::from(b'?') || s2 == u32::from(b'=') || s2 == u32::from(b'>') || s2 == u32::from(b'!') || s2 == SP) {
            return;
        }
        if p == 4 && s3 == SP {
            return;
        }
        if p == 1 && cc >= 32 {
            let mapped = self.apply_charset(cc);
            self.process_token(host, Token::Chr, mapped as i32, 0);
            self.tokenizer.reset();
            return;
        }
        if p >= 2 && s0 == ESC && s1 == u32::from(b'P') {
            return; // DCS: consumed and ignored
        }
        if p == 2 && s0 == ESC {
            self.process_token(host, Token::Esc(s1 as u8), 0, 0);
            self.tokenizer.reset();
            return;
        }
        if p == 3 && char_class(s1) & SCS != 0 {
            self.process_token(host, Token::EscCs(s1 as u8, s2 as u8), 0, 0);
            self.tokenizer.reset();
            return;
        }
        if p == 3 && s1 == u32::from(b'#') {
            self.process_token(host, Token::EscDe(s2 as u8), 0, 0);
            self.tokenizer.reset();
            return;
        }

        let private_prefix = s2 == u32::from(b'?')
            || s2 == u32::from(b'!')
            || s2 == u32::from(b'=')
            || s2 == u32::from(b'>');

        if p >= 3 && !private_prefix && char_class(cc) & CPN != 0 && char_class(prev2) & INT == 0 {
            let (a0, a1) = (self.tokenizer.argv[0], self.tokenizer.argv[1]);
            self.process_token(host, Token::CsiPn(cc as u8), a0, a1);
            self.tokenizer.reset();
            return;
        }
        // window operations: `CSI Ps ; Ps ; Ps t`
        if p >= 3 && !private_prefix && char_class(cc) & CPS != 0 && char_class(prev2) & INT == 0 {
            let (a0, a1, a2) = (
                self.tokenizer.argv[0],
                self.tokenizer.argv[1],
                self.tokenizer.argv[2],
            );
            self.process_token(host, Token::CsiPs(cc as u8, a0 as u16), a1, a2);
            self.tokenizer.reset();
            return;
        }
        if p >= 3 && s2 == u32::from(b'!') {
            self.process_token(host, Token::CsiPe(cc as u8), 0, 0);
            self.tokenizer.reset();
            return;
        }
        if p >= 4 && s2 == SP {
            self.process_token(host, Token::CsiSp(cc as u8), 0, 0);
            self.tokenizer.reset();
            return;
        }
        if p >= 5 && s3 == SP {
            let a0 = self.tokenizer.argv[0];
            self.process_token(host, Token::CsiPsp(cc as u8, a0 as u16), 0, 0);
            self.tokenizer.reset();
            return;
        }
        if p >= 3 && char_class(cc) & DIG != 0 {
            self.tokenizer.add_digit((cc - u32::from(b'0')) as i32);
            return;
        }
        if p >= 3 && cc == u32::from(b';') {
            self.tokenizer.add_argument();
            return;
        }
        if p >= 3 && char_class(cc) & INT != 0 {
            return;
        }
        if p >= 3 && cc == u32::from(b'y') && prev2 == u32::from(b'*') {
            let argc = self.tokenizer.argc;
            let argv = self.tokenizer.argv;
            self.process_checksum_request(argc, &argv, host);
            self.tokenizer.reset();
            return;
        }

        // Parameter lists dispatch one token per accumulated argument, with
        // the SGR direct-color and indexed-color sub-sequences folded into a
        // single token each.
        let argc = self.tokenizer.argc;
        let argv = self.tokenizer.argv;
        let mut i = 0;
        while i <= argc {
            if s2 == u32::from(b'?') {
                self.process_token(host, Token::CsiPr(cc as u8, argv[i] as u16), 0, 0);
            } else if s2 == u32::from(b'=') {
                self.process_token(host, Token::CsiPq(cc as u8), 0, 0);
            } else if s2 == u32::from(b'>') {
                self.process_token(host, Token::CsiPg(cc as u8), 0, 0);
            } else if cc == u32::from(b'm')
                && argc >= i + 4
                && (argv[i] == 38 || argv[i] == 48)
                && argv[i + 1] == 2
            {
                // `38;2;<r>;<g>;<b>` or `48;2;<r>;<g>;<b>`
                let which = argv[i] as u16;
                let rgb = (argv[i + 2] << 16) | (argv[i + 3] << 8) | argv[i + 4];
                self.process_token(host, Token::CsiPs(b'm', which), ColorSpace::Rgb as i32, rgb);
                i += 4;
            } else if cc == u32::from(b'm')
                && argc >= i + 2
                && (argv[i] == 38 || argv[i] == 48)
                && argv[i + 1] == 5
            {
                // `38;5;<index>` or `48;5;<index>`
                let which = argv[i] as u16;
                self.process_token(
                    host,
                    Token::CsiPs(b'm', which),
                    ColorSpace::Indexed as i32,
                    argv[i + 2],
                );
                i += 2;
            } else if p < 2 || char_class(prev2) & INT == 0 {
                self.process_token(host, Token::CsiPs(cc as u8, argv[i] as u16), 0, 0);
            }
            i += 1;
        }
        self.tokenizer.reset();
    }

    fn scan_vt52(&mut self, cc: u32, host: &mut dyn TerminalHost) {
        let p = self.tokenizer.len();
        let s0 = self.tokenizer.at(0);
        let s1 = self.tokenizer.at(1);
        let s2 = self.tokenizer.at(2);
        let s3 = self.tokenizer.at(3);

        if p == 1 && cc == ESC {
            return;
        }
        if p == 1 && char_class(s0) & CHR != 0 {
            self.process_token(host, Token::Chr, s0 as i32, 0);
            self.tokenizer.reset();
            return;
        }
        // `ESC Y <row> <col>` direct cursor addressing takes two extra bytes
        if p == 2 && s1 == u32::from(b'Y') {
            return;
        }
        if p == 3 && s1 == u32::from(b'Y') {
            return;
        }
        if p < 4 {
            self.process_token(host, Token::Vt52(s1 as u8), 0, 0);
            self.tokenizer.reset();
            return;
        }
        self.process_token(host, Token::Vt52(s1 as u8), s2 as i32, s3 as i32);
        self.tokenizer.reset();
    }

    /// Log the offending buffer and carry on; the stream itself survives.
    pub(crate) fn report_decoding_error(&self) {
        let pos = self.tokenizer.len();
        if pos == 0 || (pos == 1 && (self.tokenizer.at(0) & 0xFF) >= 32) {
            return;
        }
        log::debug!("Undecodable sequence: {}", self.tokenizer.hexdump());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_class_table() {
        assert_ne!(char_class(0x07) & CTL, 0);
        assert_ne!(char_class(u32::from(b'A')) & (CHR | CPN), 0);
        assert_ne!(char_class(u32::from(b'5')) & DIG, 0);
        assert_ne!(char_class(u32::from(b'(')) & (SCS | GRP), 0);
        assert_ne!(char_class(u32::from(b'#')) & GRP, 0);
        assert_eq!(char_class(u32::from(b'#')) & SCS, 0);
        assert_ne!(char_class(u32::from(b't')) & CPS, 0);
        assert_ne!(char_class(SP) & INT, 0);
        // code points beyond the table have no class
        assert_eq!(char_class(0x2500), 0);
    }

    #[test]
    fn test_argument_clamping() {
        let mut tok = Tokenizer::new();
        for _ in 0..10 {
            tok.add_digit(9);
        }
        assert_eq!(tok.argv[0], MAX_ARGUMENT);
        for _ in 0..40 {
            tok.add_argument();
        }
        assert_eq!(tok.argc, MAXARGS - 1);
    }

    #[test]
    fn test_buffer_overwrites_last_slot_when_full() {
        let mut tok = Tokenizer::new();
        for i in 0..(MAX_TOKEN_LENGTH + 10) {
            tok.push(i as u32);
        }
        assert_eq!(tok.len(), MAX_TOKEN_LENGTH);
        assert_eq!(tok.at(MAX_TOKEN_LENGTH - 1), (MAX_TOKEN_LENGTH + 9) as u32);
    }

    #[test]
    fn test_hexdump_renders_escapes() {
        let mut tok = Tokenizer::new();
        tok.push(0x1B);
        tok.push(u32::from(b'['));
        tok.push(u32::from(b'\\'));
        tok.push(0x05);
        assert_eq!(tok.hexdump(), "ESC[\\\\\\0005(hex)");
    }
}
