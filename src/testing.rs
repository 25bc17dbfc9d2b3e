//! Test doubles
//!
//! A recording [`Screen`] and [`TerminalHost`] used by the crate's own tests
//! and available to embedders for theirs. The screen keeps just enough state
//! (geometry, cursor, modes, cells, renditions) to make the emulation's
//! observable behavior checkable; it is not a rendering-quality screen model.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use crate::host::{CursorShape, ScrollRequest, TerminalHost};
use crate::modes::Mode;
use crate::osc::SingleShotTimer;
use crate::screen::{ColorSpace, LineProperty, Rendition, Screen, ScreenCell};

/// Screen double that records every call and tracks minimal state.
pub struct TestScreen {
    /// Call log, one entry per operation, arguments included where useful.
    pub calls: Vec<String>,
    /// Code points handed to `display_character`, in order.
    pub displayed: Vec<u32>,
    /// URLs handed to the extractor.
    pub urls: Vec<String>,
    /// Current rendition as accumulated through SGR dispatches.
    pub rendition: Rendition,
    /// Last foreground selection.
    pub fore_color: Option<(ColorSpace, i32)>,
    /// Last background selection.
    pub back_color: Option<(ColorSpace, i32)>,
    lines: i32,
    columns: i32,
    cursor_x: i32,
    cursor_y: i32,
    top: i32,
    bottom: i32,
    saved_cursor: (i32, i32),
    modes: HashMap<Mode, bool>,
    saved_modes: HashMap<Mode, bool>,
    cells: HashMap<(i32, i32), ScreenCell>,
    url_reading: bool,
}

impl TestScreen {
    pub fn new(lines: i32, columns: i32) -> Self {
        Self {
            calls: Vec::new(),
            displayed: Vec::new(),
            urls: Vec::new(),
            rendition: Rendition::empty(),
            fore_color: None,
            back_color: None,
            lines,
            columns,
            cursor_x: 0,
            cursor_y: 0,
            top: 0,
            bottom: lines - 1,
            saved_cursor: (0, 0),
            modes: HashMap::new(),
            saved_modes: HashMap::new(),
            cells: HashMap::new(),
            url_reading: false,
        }
    }

    /// Place a cell directly, for checksum and readout tests.
    pub fn put_cell(&mut self, line: i32, column: i32, character: u32, rendition: Rendition) {
        self.cells.insert(
            (line, column),
            ScreenCell {
                character,
                rendition,
            },
        );
    }

    fn record(&mut self, call: impl Into<String>) {
        self.calls.push(call.into());
    }

    fn count(n: i32) -> i32 {
        n.max(1)
    }

    fn clamp_cursor(&mut self) {
        self.cursor_x = self.cursor_x.clamp(0, self.columns - 1);
        self.cursor_y = self.cursor_y.clamp(0, self.lines - 1);
    }
}

impl Screen for TestScreen {
    fn cursor_up(&mut self, n: i32) {
        self.record(format!("cursor_up({})", n));
        self.cursor_y -= Self::count(n);
        self.clamp_cursor();
    }

    fn cursor_down(&mut self, n: i32) {
        self.record(format!("cursor_down({})", n));
        self.cursor_y += Self::count(n);
        self.clamp_cursor();
    }

    fn cursor_left(&mut self, n: i32) {
        self.record(format!("cursor_left({})", n));
        self.cursor_x -= Self::count(n);
        self.clamp_cursor();
    }

    fn cursor_right(&mut self, n: i32) {
        self.record(format!("cursor_right({})", n));
        self.cursor_x += Self::count(n);
        self.clamp_cursor();
    }

    fn cursor_next_line(&mut self, n: i32) {
        self.record(format!("cursor_next_line({})", n));
        self.cursor_y += Self::count(n);
        self.cursor_x = 0;
        self.clamp_cursor();
    }

    fn cursor_previous_line(&mut self, n: i32) {
        self.record(format!("cursor_previous_line({})", n));
        self.cursor_y -= Self::count(n);
        self.cursor_x = 0;
        self.clamp_cursor();
    }

    fn set_cursor_x(&mut self, x: i32) {
        self.record(format!("set_cursor_x({})", x));
        self.cursor_x = Self::count(x) - 1;
        self.clamp_cursor();
    }

    fn set_cursor_y(&mut self, y: i32) {
        self.record(format!("set_cursor_y({})", y));
        self.cursor_y = Self::count(y) - 1;
        self.clamp_cursor();
    }

    fn set_cursor_yx(&mut self, y: i32, x: i32) {
        self.record(format!("set_cursor_yx({},{})", y, x));
        self.cursor_y = Self::count(y) - 1;
        self.cursor_x = Self::count(x) - 1;
        self.clamp_cursor();
    }

    fn index(&mut self) {
        self.record("index");
        self.cursor_y += 1;
        self.clamp_cursor();
    }

    fn reverse_index(&mut self) {
        self.record("reverse_index");
        self.cursor_y -= 1;
        self.clamp_cursor();
    }

    fn next_line(&mut self) {
        self.record("next_line");
        self.cursor_y += 1;
        self.cursor_x = 0;
        self.clamp_cursor();
    }

    fn to_start_of_line(&mut self) {
        self.record("to_start_of_line");
        self.cursor_x = 0;
    }

    fn display_character(&mut self, c: u32) {
        self.record(format!("display_character({})", c));
        self.displayed.push(c);
        self.cells.insert(
            (self.cursor_y, self.cursor_x),
            ScreenCell {
                character: c,
                rendition: self.rendition,
            },
        );
        self.cursor_x += 1;
        self.clamp_cursor();
    }

    fn backspace(&mut self) {
        self.record("backspace");
        self.cursor_x -= 1;
        self.clamp_cursor();
    }

    fn tab(&mut self, n: i32) {
        self.record(format!("tab({})", n));
        for _ in 0..Self::count(n) {
            self.cursor_x = ((self.cursor_x / 8) + 1) * 8;
        }
        self.clamp_cursor();
    }

    fn backtab(&mut self, n: i32) {
        self.record(format!("backtab({})", n));
        for _ in 0..Self::count(n) {
            self.cursor_x = ((self.cursor_x - 1) / 8) * 8;
        }
        self.clamp_cursor();
    }

    fn new_line(&mut self) {
        self.record("new_line");
        self.cursor_y += 1;
        self.clamp_cursor();
    }

    fn insert_chars(&mut self, n: i32) {
        self.record(format!("insert_chars({})", n));
    }

    fn insert_lines(&mut self, n: i32) {
        self.record(format!("insert_lines({})", n));
    }

    fn delete_chars(&mut self, n: i32) {
        self.record(format!("delete_chars({})", n));
    }

    fn delete_lines(&mut self, n: i32) {
        self.record(format!("delete_lines({})", n));
    }

    fn erase_chars(&mut self, n: i32) {
        self.record(format!("erase_chars({})", n));
    }

    fn repeat_chars(&mut self, n: i32) {
        self.record(format!("repeat_chars({})", n));
    }

    fn clear_to_end_of_line(&mut self) {
        self.record("clear_to_end_of_line");
    }

    fn clear_to_begin_of_line(&mut self) {
        self.record("clear_to_begin_of_line");
    }

    fn clear_entire_line(&mut self) {
        self.record("clear_entire_line");
    }

    fn clear_to_end_of_screen(&mut self) {
        self.record("clear_to_end_of_screen");
    }

    fn clear_to_begin_of_screen(&mut self) {
        self.record("clear_to_begin_of_screen");
    }

    fn clear_entire_screen(&mut self) {
        self.record("clear_entire_screen");
        self.cells.clear();
    }

    fn clear_history(&mut self) {
        self.record("clear_history");
    }

    fn scroll_up(&mut self, n: i32) {
        self.record(format!("scroll_up({})", n));
    }

    fn scroll_down(&mut self, n: i32) {
        self.record(format!("scroll_down({})", n));
    }

    fn set_margins(&mut self, top: i32, bottom: i32) {
        self.record(format!("set_margins({},{})", top, bottom));
        self.top = Self::count(top) - 1;
        self.bottom = (if bottom == 0 { self.lines } else { bottom }) - 1;
    }

    fn set_default_margins(&mut self) {
        self.record("set_default_margins");
        self.top = 0;
        self.bottom = self.lines - 1;
    }

    fn change_tab_stop(&mut self, set: bool) {
        self.record(format!("change_tab_stop({})", set));
    }

    fn clear_tab_stops(&mut self) {
        self.record("clear_tab_stops");
    }

    fn set_rendition(&mut self, bits: Rendition) {
        self.record(format!("set_rendition({:?})", bits));
        self.rendition |= bits;
    }

    fn reset_rendition(&mut self, bits: Rendition) {
        self.record(format!("reset_rendition({:?})", bits));
        self.rendition &= !bits;
    }

    fn set_default_rendition(&mut self) {
        self.record("set_default_rendition");
        self.rendition = Rendition::empty();
        self.fore_color = None;
        self.back_color = None;
    }

    fn set_fore_color(&mut self, space: ColorSpace, value: i32) {
        self.record(format!("set_fore_color({:?},{})", space, value));
        self.fore_color = Some((space, value));
    }

    fn set_back_color(&mut self, space: ColorSpace, value: i32) {
        self.record(format!("set_back_color({:?},{})", space, value));
        self.back_color = Some((space, value));
    }

    fn set_line_property(&mut self, property: LineProperty, enable: bool) {
        self.record(format!("set_line_property({:?},{})", property, enable));
    }

    fn save_cursor(&mut self) {
        self.record("save_cursor");
        self.saved_cursor = (self.cursor_y, self.cursor_x);
    }

    fn restore_cursor(&mut self) {
        self.record("restore_cursor");
        self.cursor_y = self.saved_cursor.0;
        self.cursor_x = self.saved_cursor.1;
    }

    fn set_mode(&mut self, mode: Mode) {
        self.record(format!("set_mode({:?})", mode));
        self.modes.insert(mode, true);
    }

    fn reset_mode(&mut self, mode: Mode) {
        self.record(format!("reset_mode({:?})", mode));
        self.modes.insert(mode, false);
    }

    fn save_mode(&mut self, mode: Mode) {
        self.record(format!("save_mode({:?})", mode));
        let value = self.get_mode(mode);
        self.saved_modes.insert(mode, value);
    }

    fn restore_mode(&mut self, mode: Mode) {
        self.record(format!("restore_mode({:?})", mode));
        let value = self.saved_modes.get(&mode).copied().unwrap_or(false);
        self.modes.insert(mode, value);
    }

    fn get_mode(&self, mode: Mode) -> bool {
        self.modes.get(&mode).copied().unwrap_or(false)
    }

    fn set_image_size(&mut self, lines: i32, columns: i32) {
        self.record(format!("set_image_size({},{})", lines, columns));
        self.lines = lines;
        self.columns = columns;
        self.bottom = self.bottom.min(lines - 1);
        self.clamp_cursor();
    }

    fn help_align(&mut self) {
        self.record("help_align");
    }

    fn reset(&mut self) {
        self.record("reset");
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.top = 0;
        self.bottom = self.lines - 1;
        self.rendition = Rendition::empty();
        self.fore_color = None;
        self.back_color = None;
        self.modes.clear();
        self.saved_modes.clear();
        self.cells.clear();
    }

    fn clear_selection(&mut self) {
        self.record("clear_selection");
    }

    fn lines(&self) -> i32 {
        self.lines
    }

    fn columns(&self) -> i32 {
        self.columns
    }

    fn cursor_x(&self) -> i32 {
        self.cursor_x
    }

    fn cursor_y(&self) -> i32 {
        self.cursor_y
    }

    fn top_margin(&self) -> i32 {
        self.top
    }

    fn cell_at(&self, line: i32, column: i32) -> ScreenCell {
        self.cells.get(&(line, column)).copied().unwrap_or(ScreenCell {
            character: 0x20,
            rendition: Rendition::empty(),
        })
    }

    fn toggle_url_input(&mut self) {
        self.record("toggle_url_input");
        self.url_reading = !self.url_reading;
    }

    fn set_url(&mut self, url: &str) {
        self.record(format!("set_url({})", url));
        self.urls.push(url.to_string());
    }

    fn url_input_reading(&self) -> bool {
        self.url_reading
    }
}

/// Host double collecting sent bytes and formatted event lines.
#[derive(Default)]
pub struct RecordingHost {
    pub sent: Vec<u8>,
    pub events: Vec<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TerminalHost for RecordingHost {
    fn send_data(&mut self, data: &[u8]) {
        self.sent.extend_from_slice(data);
    }

    fn bell(&mut self) {
        self.events.push("bell".to_string());
    }

    fn image_resize_request(&mut self, columns: i32, lines: i32) {
        self.events
            .push(format!("image_resize_request({},{})", columns, lines));
    }

    fn set_cursor_style_request(&mut self, shape: CursorShape, blinking: bool) {
        self.events
            .push(format!("cursor_style({:?},{})", shape, blinking));
    }

    fn reset_cursor_style_request(&mut self) {
        self.events.push("reset_cursor_style".to_string());
    }

    fn program_requests_mouse_tracking(&mut self, enabled: bool) {
        self.events.push(format!("mouse_tracking({})", enabled));
    }

    fn program_bracketed_paste_mode_changed(&mut self, enabled: bool) {
        self.events.push(format!("bracketed_paste({})", enabled));
    }

    fn enable_alternate_scrolling(&mut self, enabled: bool) {
        self.events.push(format!("alternate_scrolling({})", enabled));
    }

    fn session_attribute_changed(&mut self, id: i32, value: &str) {
        self.events
            .push(format!("session_attribute_changed({},{})", id, value));
    }

    fn session_attribute_request(&mut self, id: i32, terminator: u32) {
        self.events
            .push(format!("session_attribute_request({},{})", id, terminator));
    }

    fn flow_control_key_pressed(&mut self, suspend: bool) {
        self.events.push(format!("flow_control({})", suspend));
    }

    fn scroll_view(&mut self, request: ScrollRequest) {
        self.events.push(format!("scroll_view({:?})", request));
    }
}

/// Timer double that records its arming times through a shared handle.
#[derive(Clone, Default)]
pub struct SharedTimer {
    pub starts: Rc<RefCell<Vec<Duration>>>,
}

impl SingleShotTimer for SharedTimer {
    fn start(&mut self, delay: Duration) {
        self.starts.borrow_mut().push(delay);
    }
}
