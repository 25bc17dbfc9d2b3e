//! anko — VT100/VT102/xterm terminal emulation core
//!
//! Decodes the escape-code stream produced by a child process and applies
//! its meaning to an abstract screen pair; encodes keyboard, mouse and focus
//! events back into the byte sequences programs expect. The crate contains
//! no cell storage, rendering or PTY plumbing: those live behind the
//! [`Screen`] and [`TerminalHost`] traits supplied by the embedder.
//!
//! The pipeline:
//!
//! - scanning the escape codes into tokens ([`Token`])
//! - VT100 code-page translation of plain characters (charset filter)
//! - interpretation of tokens against the current screen and mode state
//!
//! Everything runs on one thread; the emulation is driven by the embedder's
//! event loop and recovers locally from every malformed input.
//!
//! ```
//! use anko::testing::{RecordingHost, TestScreen};
//! use anko::{Emulation, NullTimer};
//!
//! let mut emulation = Emulation::new(
//!     [TestScreen::new(24, 80), TestScreen::new(24, 80)],
//!     Box::new(NullTimer),
//! );
//! let mut host = RecordingHost::new();
//! emulation.receive_data(b"\x1b[1mhello\x1b[0m", &mut host);
//! assert_eq!(emulation.current_screen().displayed.len(), 5);
//! ```

mod charset;
mod codec;
mod dispatch;
mod emulation;
mod host;
mod keyboard;
mod modes;
mod mouse;
mod osc;
mod reports;
mod screen;
mod token;
mod tokenizer;

pub mod testing;

pub use charset::{CharsetState, VT100_GRAPHICS};
pub use codec::{Codec, Utf8Decoder};
pub use emulation::Emulation;
pub use host::{CursorShape, ScrollRequest, TerminalHost};
pub use keyboard::{
    BindingCommand, Key, KeyBinding, KeyBindings, KeyEvent, KeyboardState, Modifiers,
};
pub use modes::{Mode, ModeSet};
pub use mouse::MouseEventKind;
pub use osc::{NullTimer, SingleShotTimer, SESSION_ATTRIBUTE_FLUSH_DELAY};
pub use screen::{ColorSpace, LineProperty, Rendition, Screen, ScreenCell};
pub use token::Token;
pub use tokenizer::{MAXARGS, MAX_ARGUMENT, MAX_TOKEN_LENGTH};
