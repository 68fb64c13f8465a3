//! Display sinks, where a finished [`Frame`] is presented.
//!
//! - [`TerminalDisplay`]: development preview, two bitmap rows per terminal
//!   cell using upper-half blocks.
//! - [`FramebufferDisplay`]: the LCD behind a Linux framebuffer device
//!   (fbtft), with optional backlight control through sysfs.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Stdout, Write};
use std::path::{Path, PathBuf};

use embedded_graphics::pixelcolor::{Rgb565, Rgb888};
use embedded_graphics::prelude::RgbColor;
use ratatui::buffer::Buffer;
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::widgets::Widget;
use ratatui::{backend::CrosstermBackend, Terminal};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::frame::Frame;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display I/O: {0}")]
    Io(#[from] io::Error),

    #[error("frame is {got_w}x{got_h} but the panel is {want_w}x{want_h}")]
    SizeMismatch {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },
}

pub trait DisplaySink {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Present a complete bitmap.
    fn draw(&mut self, frame: &Frame) -> Result<(), DisplayError>;
    fn display_off(&mut self) -> Result<(), DisplayError>;
    fn display_on(&mut self) -> Result<(), DisplayError>;
}

// ── Terminal preview ──────────────────────────────────────────────────────────

pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    width: u32,
    height: u32,
    on: bool,
}

impl TerminalDisplay {
    pub fn new(width: u32, height: u32) -> Result<Self, DisplayError> {
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        debug!("terminal display ready, size={:?}", terminal.size());
        Ok(Self {
            terminal,
            width,
            height,
            on: true,
        })
    }
}

impl DisplaySink for TerminalDisplay {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        if !self.on {
            return Ok(());
        }
        self.terminal.draw(|f| {
            let area = f.area();
            f.render_widget(FramePreview { frame }, area);
        })?;
        Ok(())
    }

    fn display_off(&mut self) -> Result<(), DisplayError> {
        self.on = false;
        self.terminal.clear()?;
        Ok(())
    }

    fn display_on(&mut self) -> Result<(), DisplayError> {
        self.on = true;
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        if let Err(e) = execute!(self.terminal.backend_mut(), LeaveAlternateScreen) {
            warn!("could not leave alternate screen: {}", e);
        }
        let _ = self.terminal.show_cursor();
    }
}

/// Renders a bitmap as `▀` cells: foreground = even row, background = odd row.
pub struct FramePreview<'a> {
    pub frame: &'a Frame,
}

impl Widget for FramePreview<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let cols = area.width.min(self.frame.width() as u16);
        let rows = area.height.min(self.frame.height().div_ceil(2) as u16);
        for cy in 0..rows {
            for cx in 0..cols {
                let x = cx as u32;
                let top = self.frame.pixel(x, cy as u32 * 2);
                let bottom = self.frame.pixel(x, cy as u32 * 2 + 1);
                if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                    cell.set_char('▀')
                        .set_fg(to_color(top.unwrap_or(Rgb565::BLACK)))
                        .set_bg(to_color(bottom.unwrap_or(Rgb565::BLACK)));
                }
            }
        }
    }
}

fn to_color(c: Rgb565) -> Color {
    let c = Rgb888::from(c);
    Color::Rgb(c.r(), c.g(), c.b())
}

// ── In-memory ─────────────────────────────────────────────────────────────────

/// Keeps the last presented frame; for headless runs and tests.
#[derive(Debug, Clone)]
pub struct MemoryDisplay {
    width: u32,
    height: u32,
    pub last: Option<Frame>,
    pub draws: usize,
    pub on: bool,
    /// Every `display_off` (false) / `display_on` (true) in order.
    pub power_log: Vec<bool>,
}

impl MemoryDisplay {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            last: None,
            draws: 0,
            on: true,
            power_log: Vec::new(),
        }
    }
}

impl DisplaySink for MemoryDisplay {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.draws += 1;
        self.last = Some(frame.clone());
        Ok(())
    }

    fn display_off(&mut self) -> Result<(), DisplayError> {
        self.on = false;
        self.power_log.push(false);
        Ok(())
    }

    fn display_on(&mut self) -> Result<(), DisplayError> {
        self.on = true;
        self.power_log.push(true);
        Ok(())
    }
}

impl<D: DisplaySink + ?Sized> DisplaySink for Box<D> {
    fn width(&self) -> u32 {
        (**self).width()
    }

    fn height(&self) -> u32 {
        (**self).height()
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        (**self).draw(frame)
    }

    fn display_off(&mut self) -> Result<(), DisplayError> {
        (**self).display_off()
    }

    fn display_on(&mut self) -> Result<(), DisplayError> {
        (**self).display_on()
    }
}

// ── Linux framebuffer ─────────────────────────────────────────────────────────

pub struct FramebufferDisplay {
    device: File,
    backlight: Option<PathBuf>,
    width: u32,
    height: u32,
}

/// `bl_power` values (FB_BLANK_UNBLANK / FB_BLANK_POWERDOWN).
const BL_ON: &str = "0";
const BL_OFF: &str = "4";

impl FramebufferDisplay {
    pub fn open(
        device: &Path,
        backlight: Option<PathBuf>,
        width: u32,
        height: u32,
    ) -> Result<Self, DisplayError> {
        let file = OpenOptions::new().write(true).open(device)?;
        info!("framebuffer {} opened ({}x{})", device.display(), width, height);
        Ok(Self {
            device: file,
            backlight,
            width,
            height,
        })
    }

    fn set_backlight(&self, value: &str) -> Result<(), DisplayError> {
        if let Some(path) = &self.backlight {
            std::fs::write(path, value)?;
        }
        Ok(())
    }
}

impl DisplaySink for FramebufferDisplay {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(DisplayError::SizeMismatch {
                got_w: frame.width(),
                got_h: frame.height(),
                want_w: self.width,
                want_h: self.height,
            });
        }
        self.device.seek(SeekFrom::Start(0))?;
        self.device.write_all(&frame.to_rgb565_le())?;
        self.device.flush()?;
        Ok(())
    }

    fn display_off(&mut self) -> Result<(), DisplayError> {
        self.set_backlight(BL_OFF)
    }

    fn display_on(&mut self) -> Result<(), DisplayError> {
        self.set_backlight(BL_ON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::*;

    #[test]
    fn test_preview_packs_two_rows_per_cell() {
        let mut frame = Frame::new(3, 3);
        frame
            .draw_iter([
                Pixel(Point::new(0, 0), Rgb565::WHITE),
                Pixel(Point::new(1, 1), Rgb565::WHITE),
                Pixel(Point::new(2, 2), Rgb565::WHITE),
            ])
            .unwrap();
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 10));
        FramePreview { frame: &frame }.render(buf.area, &mut buf);

        let white = Color::Rgb(255, 255, 255);
        let black = Color::Rgb(0, 0, 0);
        assert_eq!(buf[(0, 0)].symbol(), "▀");
        assert_eq!((buf[(0, 0)].fg, buf[(0, 0)].bg), (white, black));
        assert_eq!((buf[(1, 0)].fg, buf[(1, 0)].bg), (black, white));
        // last odd row has no partner pixel
        assert_eq!((buf[(2, 1)].fg, buf[(2, 1)].bg), (white, black));
        // outside the bitmap untouched
        assert_eq!(buf[(3, 0)].symbol(), " ");
        assert_eq!(buf[(0, 2)].symbol(), " ");
    }

    #[test]
    fn test_framebuffer_writes_whole_frame_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("fb1");
        std::fs::write(&dev, b"").unwrap();
        let mut fb = FramebufferDisplay::open(&dev, None, 2, 2).unwrap();

        let mut frame = Frame::new(2, 2);
        fb.draw(&frame).unwrap();
        frame
            .draw_iter([Pixel(Point::new(0, 0), Rgb565::WHITE)])
            .unwrap();
        fb.draw(&frame).unwrap();

        let bytes = std::fs::read(&dev).unwrap();
        assert_eq!(bytes, vec![0xFF, 0xFF, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_framebuffer_rejects_wrong_size() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("fb1");
        std::fs::write(&dev, b"").unwrap();
        let mut fb = FramebufferDisplay::open(&dev, None, 160, 128).unwrap();
        let err = fb.draw(&Frame::new(10, 10)).unwrap_err();
        assert!(matches!(err, DisplayError::SizeMismatch { .. }));
    }

    #[test]
    fn test_backlight_power_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("fb1");
        let bl = dir.path().join("bl_power");
        std::fs::write(&dev, b"").unwrap();
        let mut fb = FramebufferDisplay::open(&dev, Some(bl.clone()), 1, 1).unwrap();

        fb.display_off().unwrap();
        assert_eq!(std::fs::read_to_string(&bl).unwrap(), "4");
        fb.display_on().unwrap();
        assert_eq!(std::fs::read_to_string(&bl).unwrap(), "0");
    }
}
