//! Incremental renderer.
//!
//! The renderer owns the persistent bitmap.  Each pass compares every region's
//! inputs with the last pass (see [`crate::dirty`]), repaints only the regions
//! that changed, and then hands the whole bitmap to the display exactly once.
//!
//! Screen layout (160×128):
//! ```text
//!  y=0    Schwarz  Weiss                 > 50%
//!  y=20   result row 0
//!   ...   result row n-1        (10 px per row)
//!  y=95   > search text
//!  y=110  [F1 album][F2 song][F3 artist][F4 radio][F5 plist]
//! ```

use std::time::Instant;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use jukebox_proto::protocol::{Category, ResultItem, NUM_CATEGORIES};
use thiserror::Error;
use tracing::debug;

use crate::dirty::{DirtyTracker, Snapshot};
use crate::display::{DisplayError, DisplaySink};
use crate::frame::Frame;
use crate::theme::{self, text_width, FONT, FONT_SMALL};

pub const PADDING: i32 = 10;
pub const LINE_HEIGHT: u32 = 10;
const RESULTS_TOP: i32 = 20;
const ENTRY_GAP: i32 = 5;
/// Fits the widest status string, "|| 100% R1", in the 6 px font.
const VOLUME_BOX_WIDTH: u32 = 60;
const TAB_WIDTH: u32 = 25;
const TAB_GAP: u32 = 3;
const TAB_HEIGHT: u32 = 15;
const TAB_BOTTOM_MARGIN: u32 = 3;
const DIALOG_PADDING: i32 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("{rows} result rows do not fit a {height} px high display")]
    TooManyRows { rows: usize, height: u32 },
    #[error("the category bar needs {needed} px but the display is {width} px wide")]
    TooNarrow { needed: u32, width: u32 },
}

/// Pixel positions derived from display size and row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub num_rows: usize,
    entry_y: i32,
    tabs_y: i32,
}

impl Layout {
    pub fn new(width: u32, height: u32, num_rows: usize) -> Result<Self, LayoutError> {
        let needed = PADDING as u32 + NUM_CATEGORIES as u32 * (TAB_WIDTH + TAB_GAP);
        if needed > width {
            return Err(LayoutError::TooNarrow { needed, width });
        }
        let entry_y = RESULTS_TOP + (num_rows as u32 * LINE_HEIGHT) as i32 + ENTRY_GAP;
        let tabs_y = height as i32 - (TAB_HEIGHT + TAB_BOTTOM_MARGIN) as i32;
        if num_rows == 0 || entry_y + LINE_HEIGHT as i32 > tabs_y {
            return Err(LayoutError::TooManyRows {
                rows: num_rows,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            num_rows,
            entry_y,
            tabs_y,
        })
    }

    pub fn result_line(&self, line: usize) -> Rectangle {
        let y = RESULTS_TOP + (line as u32 * LINE_HEIGHT) as i32;
        Rectangle::new(Point::new(0, y), Size::new(self.width, LINE_HEIGHT))
    }

    pub fn entry_line(&self) -> Rectangle {
        Rectangle::new(Point::new(0, self.entry_y), Size::new(self.width, LINE_HEIGHT))
    }

    pub fn speaker_bar(&self) -> Rectangle {
        Rectangle::new(
            Point::zero(),
            Size::new(self.width.saturating_sub(VOLUME_BOX_WIDTH), LINE_HEIGHT),
        )
    }

    pub fn volume_box(&self) -> Rectangle {
        Rectangle::new(
            Point::new(self.width.saturating_sub(VOLUME_BOX_WIDTH) as i32, 0),
            Size::new(VOLUME_BOX_WIDTH, LINE_HEIGHT),
        )
    }

    pub fn tab(&self, idx: usize) -> Rectangle {
        let x = PADDING + (idx as u32 * (TAB_WIDTH + TAB_GAP)) as i32;
        Rectangle::new(Point::new(x, self.tabs_y), Size::new(TAB_WIDTH, TAB_HEIGHT))
    }
}

/// Everything a render pass reads.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub speakers: &'a [String],
    pub speaker: usize,
    pub vol_play: &'a str,
    pub items: &'a [ResultItem],
    pub row: usize,
    pub entered: &'a str,
    pub category: Category,
}

/// Regions repainted by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub regions_drawn: usize,
}

pub struct Renderer {
    layout: Layout,
    frame: Frame,
    tracker: DirtyTracker,
}

impl Renderer {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            frame: Frame::new(layout.width, layout.height),
            tracker: DirtyTracker::new(layout.num_rows),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The persisted bitmap as of the last pass.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Repaint dirty regions, then present the bitmap.
    pub fn render<D>(&mut self, view: &View<'_>, display: &mut D) -> Result<RenderStats, DisplayError>
    where
        D: DisplaySink + ?Sized,
    {
        let mut stats = RenderStats::default();

        let start = Instant::now();
        if self.tracker.is_dirty(Snapshot::Speakers {
            names: view.speakers.to_vec(),
            selected: view.speaker,
        }) {
            self.draw_speakers(view.speakers, view.speaker);
            stats.regions_drawn += 1;
            debug!("draw speakers: {:?}", start.elapsed());
        }

        let start = Instant::now();
        if self
            .tracker
            .is_dirty(Snapshot::Volume(view.vol_play.to_string()))
        {
            self.draw_volume(view.vol_play);
            stats.regions_drawn += 1;
            debug!("draw volume: {:?}", start.elapsed());
        }

        let start = Instant::now();
        for line in 0..self.layout.num_rows {
            let label = view.items.get(line).map(|item| item.label.clone());
            let highlighted = label.is_some() && line == view.row;
            if self.tracker.is_dirty(Snapshot::ResultLine {
                line,
                label: label.clone(),
                highlighted,
            }) {
                self.draw_result_line(line, label.as_deref(), highlighted);
                stats.regions_drawn += 1;
            }
        }
        debug!("draw results: {:?}", start.elapsed());

        let start = Instant::now();
        let entry = (!view.category.is_live_stream()).then(|| view.entered.to_string());
        if self.tracker.is_dirty(Snapshot::Entry(entry.clone())) {
            self.draw_entry(entry.as_deref());
            stats.regions_drawn += 1;
            debug!("draw search text: {:?}", start.elapsed());
        }

        let start = Instant::now();
        let active = view.category.index();
        if self.tracker.is_dirty(Snapshot::Categories { active }) {
            self.draw_categories(active);
            stats.regions_drawn += 1;
            debug!("draw categories: {:?}", start.elapsed());
        }

        self.present(display)?;
        Ok(stats)
    }

    /// Hand the persisted bitmap to the display unchanged.
    pub fn present<D>(&self, display: &mut D) -> Result<(), DisplayError>
    where
        D: DisplaySink + ?Sized,
    {
        let start = Instant::now();
        display.draw(&self.frame)?;
        debug!("display: {:?}", start.elapsed());
        Ok(())
    }

    /// Forget what was drawn; the next pass repaints everything.
    pub fn invalidate(&mut self) {
        self.tracker.invalidate();
    }

    /// A copy of the current bitmap with the option dialogue on top.
    /// The persisted bitmap is not touched.
    pub fn dialogue_frame(&self, options: &[String], chosen: usize) -> Frame {
        let mut frame = self.frame.clone();
        draw_dialogue(&mut frame, options, chosen);
        frame
    }

    fn fill(&mut self, area: Rectangle, color: Rgb565) {
        let _ = self.frame.fill_solid(&area, color);
    }

    fn draw_speakers(&mut self, speakers: &[String], selected: usize) {
        let bar = self.layout.speaker_bar();
        self.fill(bar, theme::C_BG);
        let mut target = self.frame.clipped(&bar);
        let mut x = PADDING;
        for (i, name) in speakers.iter().enumerate() {
            let w = text_width(FONT, name);
            let style = if i == selected {
                let highlight = Rectangle::new(
                    Point::new(x - PADDING / 2, 0),
                    Size::new(w + (PADDING / 2) as u32, LINE_HEIGHT),
                );
                let _ = target.fill_solid(&highlight, theme::C_HIGHLIGHT);
                theme::style_selected()
            } else {
                theme::style_default()
            };
            let _ = Text::with_baseline(name, Point::new(x, 0), style, Baseline::Top).draw(&mut target);
            x += (w as i32) + PADDING;
        }
    }

    fn draw_volume(&mut self, vol_play: &str) {
        let area = self.layout.volume_box();
        self.fill(area, theme::C_BG);
        let x = self.layout.width as i32 - text_width(FONT, vol_play) as i32;
        let mut target = self.frame.clipped(&area);
        let _ = Text::with_baseline(vol_play, Point::new(x, 0), theme::style_volume(), Baseline::Top)
            .draw(&mut target);
    }

    fn draw_result_line(&mut self, line: usize, label: Option<&str>, highlighted: bool) {
        let area = self.layout.result_line(line);
        self.fill(area, theme::C_BG);
        let Some(label) = label else {
            return;
        };
        let y = area.top_left.y;
        let style = if highlighted {
            let highlight = Rectangle::new(
                Point::new(PADDING - PADDING / 2, y),
                Size::new(self.layout.width - (PADDING - PADDING / 2) as u32, LINE_HEIGHT),
            );
            self.fill(highlight, theme::C_HIGHLIGHT);
            theme::style_selected()
        } else {
            theme::style_default()
        };
        let _ = Text::with_baseline(label, Point::new(PADDING, y), style, Baseline::Top)
            .draw(&mut self.frame);
    }

    fn draw_entry(&mut self, entered: Option<&str>) {
        let area = self.layout.entry_line();
        self.fill(area, theme::C_BG);
        let Some(entered) = entered else {
            return;
        };
        let text = fit_tail(entered, self.layout.width - PADDING as u32);
        let _ = Text::with_baseline(
            &text,
            Point::new(PADDING, area.top_left.y),
            theme::style_default(),
            Baseline::Top,
        )
        .draw(&mut self.frame);
    }

    fn draw_categories(&mut self, active: usize) {
        for (i, category) in Category::ALL.iter().enumerate() {
            let tab = self.layout.tab(i);
            let is_active = i == active;
            let fill = if is_active {
                theme::C_TAB_ACTIVE
            } else {
                theme::C_TAB_INACTIVE
            };
            self.fill(tab, fill);
            let style: MonoTextStyle<'static, Rgb565> = theme::style_tab(is_active);
            let Point { x, y } = tab.top_left;
            let key = format!("F{}", i + 1);
            let _ = Text::with_baseline(&key, Point::new(x + 9, y + 1), style, Baseline::Top)
                .draw(&mut self.frame);
            let name = category.label();
            let pad = (TAB_WIDTH.saturating_sub(text_width(FONT_SMALL, name)) / 2) as i32;
            let _ = Text::with_baseline(name, Point::new(x + 1 + pad, y + 7), style, Baseline::Top)
                .draw(&mut self.frame);
        }
    }
}

/// `"> " + entered`, keeping the end of the text visible when it is too wide.
fn fit_tail(entered: &str, max_width: u32) -> String {
    let advance = FONT.character_size.width + FONT.character_spacing;
    let max_chars = (max_width / advance).saturating_sub(2) as usize;
    let count = entered.chars().count();
    let tail: String = entered.chars().skip(count.saturating_sub(max_chars)).collect();
    format!("> {}", tail)
}

fn draw_dialogue(frame: &mut Frame, options: &[String], chosen: usize) {
    if options.is_empty() {
        return;
    }
    let h = FONT.character_size.height as i32;
    let n = options.len() as i32;
    let height = n * h + DIALOG_PADDING * n;
    let width = options
        .iter()
        .map(|o| text_width(FONT, o) as i32)
        .max()
        .unwrap_or_default()
        + 2 * DIALOG_PADDING;
    let x = (frame.width() as i32 - width) / 2;
    let mut y = (frame.height() as i32 - height) / 2;

    let style = PrimitiveStyleBuilder::new()
        .fill_color(theme::C_DIALOG_BG)
        .stroke_color(theme::C_DIALOG_BORDER)
        .stroke_width(1)
        .build();
    let _ = Rectangle::new(Point::new(x, y), Size::new(width as u32 + 1, height as u32 + 1))
        .into_styled(style)
        .draw(frame);

    for (i, option) in options.iter().enumerate() {
        let text_style = if i == chosen {
            let highlight = Rectangle::new(
                Point::new(x + 1, y + 1),
                Size::new((width - 1) as u32, (h + DIALOG_PADDING) as u32),
            );
            let _ = frame.fill_solid(&highlight, theme::C_HIGHLIGHT);
            theme::style_selected()
        } else {
            theme::style_default()
        };
        let _ = Text::with_baseline(
            option,
            Point::new(x + DIALOG_PADDING, y + DIALOG_PADDING),
            text_style,
            Baseline::Top,
        )
        .draw(frame);
        y += h + DIALOG_PADDING - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemoryDisplay;
    use jukebox_proto::protocol::Handle;

    fn items(labels: &[&str]) -> Vec<ResultItem> {
        labels
            .iter()
            .map(|l| ResultItem::new(*l, Handle::Uri(format!("test:{}", l))))
            .collect()
    }

    struct Fixture {
        speakers: Vec<String>,
        items: Vec<ResultItem>,
        renderer: Renderer,
        display: MemoryDisplay,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                speakers: vec!["Schwarz".into(), "Weiss".into()],
                items: items(&["Appetite for Destruction", "OK Computer", "The Four Seasons"]),
                renderer: Renderer::new(Layout::new(160, 128, 7).unwrap()),
                display: MemoryDisplay::new(160, 128),
            }
        }

        fn render(&mut self, row: usize, entered: &str, category: Category) -> RenderStats {
            let view = View {
                speakers: &self.speakers,
                speaker: 0,
                vol_play: "> 50%",
                items: &self.items,
                row,
                entered,
                category,
            };
            self.renderer.render(&view, &mut self.display).unwrap()
        }
    }

    #[test]
    fn test_layout_matches_reference_positions() {
        let layout = Layout::new(160, 128, 7).unwrap();
        assert_eq!(layout.result_line(0).top_left.y, 20);
        assert_eq!(layout.result_line(6).top_left.y, 80);
        assert_eq!(layout.entry_line().top_left.y, 95);
        assert_eq!(layout.tab(0).top_left, Point::new(10, 110));
        assert_eq!(layout.tab(4).top_left.x, 10 + 4 * 28);
    }

    #[test]
    fn test_layout_rejects_what_does_not_fit() {
        assert!(matches!(
            Layout::new(160, 128, 9),
            Err(LayoutError::TooManyRows { rows: 9, .. })
        ));
        assert!(matches!(
            Layout::new(100, 128, 7),
            Err(LayoutError::TooNarrow { .. })
        ));
        assert!(Layout::new(160, 128, 0).is_err());
    }

    #[test]
    fn test_first_pass_draws_every_region_once() {
        let mut f = Fixture::new();
        let stats = f.render(0, "", Category::Albums);
        assert_eq!(stats.regions_drawn, 4 + 7);
        assert_eq!(f.display.draws, 1);
    }

    #[test]
    fn test_unchanged_pass_draws_nothing_but_still_presents() {
        let mut f = Fixture::new();
        f.render(0, "", Category::Albums);
        let stats = f.render(0, "", Category::Albums);
        assert_eq!(stats.regions_drawn, 0);
        assert_eq!(f.display.draws, 2);
        assert_eq!(f.display.last.as_ref(), Some(f.renderer.frame()));
    }

    #[test]
    fn test_moving_cursor_repaints_two_lines() {
        let mut f = Fixture::new();
        f.render(0, "", Category::Albums);
        let stats = f.render(1, "", Category::Albums);
        assert_eq!(stats.regions_drawn, 2);

        let layout = *f.renderer.layout();
        let y1 = layout.result_line(1).top_left.y as u32;
        let y0 = layout.result_line(0).top_left.y as u32;
        assert_eq!(f.renderer.frame().pixel(150, y1), Some(theme::C_HIGHLIGHT));
        assert_eq!(f.renderer.frame().pixel(150, y0), Some(theme::C_BG));
    }

    #[test]
    fn test_shrinking_results_clears_stale_lines() {
        let mut f = Fixture::new();
        f.render(0, "", Category::Albums);
        f.items.truncate(1);
        let stats = f.render(0, "x", Category::Albums);
        // lines 1 and 2 cleared, entry redrawn
        assert_eq!(stats.regions_drawn, 3);
        let line2 = f.renderer.layout().result_line(2);
        assert!(f.renderer.frame().is_filled(line2, theme::C_BG));
    }

    #[test]
    fn test_entry_suppressed_for_radio() {
        let mut f = Fixture::new();
        f.render(0, "abc", Category::Albums);
        let entry = f.renderer.layout().entry_line();
        assert!(!f.renderer.frame().is_filled(entry, theme::C_BG));

        f.render(0, "abc", Category::RadioStations);
        assert!(f.renderer.frame().is_filled(entry, theme::C_BG));
    }

    #[test]
    fn test_active_tab_is_highlighted() {
        let mut f = Fixture::new();
        f.render(0, "", Category::Artists);
        let frame = f.renderer.frame();
        let active = f.renderer.layout().tab(2);
        let other = f.renderer.layout().tab(0);
        let corner = |r: Rectangle| frame.pixel(r.top_left.x as u32, r.top_left.y as u32);
        assert_eq!(corner(active), Some(theme::C_TAB_ACTIVE));
        assert_eq!(corner(other), Some(theme::C_TAB_INACTIVE));
    }

    #[test]
    fn test_speaker_bar_never_paints_volume_box() {
        let mut f = Fixture::new();
        f.speakers = (0..8).map(|i| format!("Speaker{}", i)).collect();
        let view = View {
            speakers: &f.speakers,
            speaker: 7,
            vol_play: "",
            items: &f.items,
            row: 0,
            entered: "",
            category: Category::Albums,
        };
        f.renderer.render(&view, &mut f.display).unwrap();
        let vol = f.renderer.layout().volume_box();
        assert!(f.renderer.frame().is_filled(vol, theme::C_BG));
    }

    #[test]
    fn test_widest_status_keeps_transport_symbol() {
        let mut f = Fixture::new();
        for status in ["|| 100% R1", "|| 50% R1", "> 5%"] {
            let view = View {
                speakers: &f.speakers,
                speaker: 0,
                vol_play: status,
                items: &f.items,
                row: 0,
                entered: "",
                category: Category::Albums,
            };
            f.renderer.render(&view, &mut f.display).unwrap();

            // first glyph cell of the right-aligned text
            let x0 = 160 - text_width(FONT, status);
            let frame = f.renderer.frame();
            let inked = (x0..x0 + 6)
                .flat_map(|x| (0..LINE_HEIGHT).map(move |y| (x, y)))
                .any(|(x, y)| frame.pixel(x, y) == Some(theme::C_VOLUME));
            assert!(inked, "{:?} lost its first glyph", status);
            assert!(x0 >= f.renderer.layout().volume_box().top_left.x as u32);
        }
    }

    #[test]
    fn test_dialogue_leaves_persisted_frame_alone() {
        let mut f = Fixture::new();
        f.render(0, "", Category::Albums);
        let before = f.renderer.frame().clone();
        let options = vec!["replace".to_string(), "add to end of queue".to_string()];
        let dialog = f.renderer.dialogue_frame(&options, 1);
        assert_ne!(dialog, before);
        assert_eq!(f.renderer.frame(), &before);
        // centre of the dialogue is painted
        assert_ne!(dialog.pixel(80, 64), before.pixel(80, 64));
    }

    #[test]
    fn test_long_search_text_keeps_the_end() {
        let text = fit_tail("abcdefghijklmnopqrstuvwxyz0123456789", 150);
        assert!(text.starts_with("> "));
        assert!(text.ends_with("0123456789"));
        assert_eq!(text.chars().count(), 150 / 6);
        assert_eq!(fit_tail("ab", 150), "> ab");
    }

    #[test]
    fn test_invalidate_forces_full_repaint() {
        let mut f = Fixture::new();
        f.render(0, "", Category::Albums);
        f.renderer.invalidate();
        assert_eq!(f.render(0, "", Category::Albums).regions_drawn, 11);
    }
}
