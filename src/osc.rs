//! Session attributes (OSC)
//!
//! `ESC ] Pa ; Pv` strings change window/session attributes: titles, the
//! working directory, hyperlinks, profile tweaks. Plain updates are parked
//! in a pending map and delivered in one batch when a short single-shot
//! timer fires, so a program rewriting its title on every prompt does not
//! flood the embedder. The timer is injected as a trait object; tests drive
//! the flush by hand.

use std::time::Duration;

use crate::emulation::Emulation;
use crate::host::{CursorShape, TerminalHost};
use crate::screen::Screen;

/// Coalescing window for attribute updates.
pub const SESSION_ATTRIBUTE_FLUSH_DELAY: Duration = Duration::from_millis(20);

/// Attribute id whose value carries profile changes such as `CursorShape=N`.
const PROFILE_CHANGE: i32 = 50;

/// Single-shot timer seam. `start` (re)arms the timer; when it fires the
/// embedder calls [`Emulation::flush_session_attributes`].
pub trait SingleShotTimer {
    fn start(&mut self, delay: Duration);
}

/// Timer that never fires; for embedders that flush on their own schedule.
pub struct NullTimer;

impl SingleShotTimer for NullTimer {
    fn start(&mut self, _delay: Duration) {}
}

impl<S: Screen> Emulation<S> {
    /// Handle a terminated OSC string sitting in the token buffer.
    /// `token_size` indexes one past the attribute body, i.e. the position
    /// of the terminator (BEL, or the ESC opening an ST).
    pub(crate) fn process_session_attribute_request(
        &mut self,
        token_size: usize,
        host: &mut dyn TerminalHost,
    ) {
        // ignore the terminating character
        let end = token_size - 1;
        let terminator = self.tokenizer.at(end);

        // skip `ESC ]`, then read the decimal attribute id
        let mut attribute: i32 = 0;
        let mut i = 2;
        while i < end && (0x30..=0x39).contains(&self.tokenizer.at(i)) {
            attribute = attribute
                .saturating_mul(10)
                .saturating_add((self.tokenizer.at(i) - 0x30) as i32);
            i += 1;
        }

        if self.tokenizer.at(i) != u32::from(b';') {
            self.report_decoding_error();
            return;
        }
        i += 1;

        let mut value = String::with_capacity(end.saturating_sub(i));
        for k in i..end {
            value.push(char::from_u32(self.tokenizer.at(k)).unwrap_or('\u{FFFD}'));
        }

        if self.current_screen().url_input_reading() {
            // `OSC 8 ; <id-part> ; <url-part>`: the id part is discarded
            // before the URL reaches the extractor.
            let url = match value.find(';') {
                Some(idx) => value[idx + 1..].to_string(),
                None => value,
            };
            self.current_screen_mut().set_url(&url);
            return;
        }

        if value == "?" {
            // The reply must be framed with the same terminator the request
            // used, so it is passed along.
            host.session_attribute_request(attribute, terminator);
            return;
        }

        if attribute == PROFILE_CHANGE && value.starts_with("CursorShape=") {
            let shape_id = value
                .chars()
                .last()
                .and_then(|c| c.to_digit(10))
                .map(|d| d as i32)
                .unwrap_or(0);
            match CursorShape::from_i32(shape_id) {
                Some(shape) => host.set_cursor_style_request(shape, true),
                None => log::debug!("Unknown cursor shape in profile change: {}", value),
            }
            return;
        }

        self.pending_attributes.insert(attribute, value);
        self.attribute_timer.start(SESSION_ATTRIBUTE_FLUSH_DELAY);
    }

    /// Deliver the pending attribute updates. Called by the embedder when
    /// the injected timer fires.
    pub fn flush_session_attributes(&mut self, host: &mut dyn TerminalHost) {
        for (id, value) in std::mem::take(&mut self.pending_attributes) {
            host.session_attribute_changed(id, &value);
        }
    }
}
