//! UiState: the operator-visible selection plus derived "something changed" flags.
//!
//! Every write goes through [`UiState::apply`], which updates the field and sets
//! the derived flags in the same step.  The controller drains the flags once per
//! loop iteration via the `should_*` queries.

/// A single write to the UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetEntered(String),
    PushChar(char),
    PopChar,
    SetRow(usize),
    SetOffset(usize),
    SetSpeaker(usize),
    SetContext(usize),
    /// Server-side state changed (volume, play/pause, ...); refetch the status string.
    RefetchVolume,
    /// Re-present the current bitmap without touching any attribute.
    Redraw,
}

/// Whether a flag query clears the flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagRead {
    #[default]
    Reset,
    Peek,
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    search: bool,
    redraw: bool,
    refetch_volume: bool,
}

#[derive(Debug, Clone)]
pub struct UiState {
    entered: String,
    row: usize,
    offset: usize,
    speaker: usize,
    context: usize,
    num_rows: usize,
    flags: Flags,
}

impl UiState {
    pub fn new(num_rows: usize) -> Self {
        Self {
            entered: String::new(),
            row: 0,
            offset: 0,
            speaker: 0,
            context: 0,
            num_rows: num_rows.max(1),
            flags: Flags::default(),
        }
    }

    pub fn entered(&self) -> &str {
        &self.entered
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn speaker(&self) -> usize {
        self.speaker
    }

    pub fn context(&self) -> usize {
        self.context
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Apply one mutation.  Flags are only ever set here, never cleared.
    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::SetEntered(text) => {
                if text != self.entered {
                    self.entered = text;
                    self.touch_search();
                }
            }
            Mutation::PushChar(c) => {
                self.entered.push(c);
                self.touch_search();
            }
            Mutation::PopChar => {
                if self.entered.pop().is_some() {
                    self.touch_search();
                }
            }
            Mutation::SetRow(row) => {
                let row = row.min(self.num_rows - 1);
                if row != self.row {
                    self.row = row;
                    self.flags.redraw = true;
                }
            }
            Mutation::SetOffset(offset) => {
                if offset != self.offset {
                    self.offset = offset;
                    self.touch_search();
                }
            }
            Mutation::SetSpeaker(speaker) => {
                if speaker != self.speaker {
                    self.speaker = speaker;
                    self.flags.redraw = true;
                }
            }
            Mutation::SetContext(context) => {
                if context != self.context {
                    self.context = context;
                    self.touch_search();
                }
            }
            Mutation::RefetchVolume => {
                self.flags.refetch_volume = true;
                self.flags.redraw = true;
            }
            Mutation::Redraw => self.flags.redraw = true,
        }
    }

    fn touch_search(&mut self) {
        self.flags.search = true;
        self.flags.redraw = true;
    }

    pub fn should_search(&mut self, read: FlagRead) -> bool {
        take(&mut self.flags.search, read)
    }

    pub fn should_redraw(&mut self, read: FlagRead) -> bool {
        take(&mut self.flags.redraw, read)
    }

    pub fn should_refetch_volume(&mut self, read: FlagRead) -> bool {
        take(&mut self.flags.refetch_volume, read)
    }

    /// Move the cursor up; at the top of the page scroll the window instead.
    pub fn row_up(&mut self) {
        if self.row > 0 {
            self.apply(Mutation::SetRow(self.row - 1));
        } else if self.offset > 0 {
            self.apply(Mutation::SetOffset(self.offset - 1));
        }
    }

    /// Move the cursor down over a page of `items_len` results.  Scrolls only
    /// from the last row of a full page.
    pub fn row_down(&mut self, items_len: usize) {
        if self.row >= self.num_rows - 1 {
            if items_len >= self.num_rows {
                self.apply(Mutation::SetOffset(self.offset + 1));
            }
        } else if self.row + 1 < items_len {
            self.apply(Mutation::SetRow(self.row + 1));
        }
    }

    /// Step to the neighbouring speaker, wrapping at both ends.
    pub fn cycle_speaker(&mut self, forward: bool, num_speakers: usize) {
        if num_speakers == 0 {
            return;
        }
        let next = if forward {
            (self.speaker + 1) % num_speakers
        } else {
            (self.speaker + num_speakers - 1) % num_speakers
        };
        self.apply(Mutation::SetSpeaker(next));
    }

    /// Keep the cursor on a real item after a search shrank the page.
    pub fn clamp_row(&mut self, items_len: usize) {
        let last = items_len.saturating_sub(1);
        if self.row > last {
            self.apply(Mutation::SetRow(last));
        }
    }
}

fn take(flag: &mut bool, read: FlagRead) -> bool {
    let value = *flag;
    if read == FlagRead::Reset {
        *flag = false;
    }
    value
}
