//! Dirty-region bookkeeping for the incremental renderer.
//!
//! Each screen region remembers the inputs it was last drawn from.  A region
//! is dirty when its current inputs differ from the stored ones; the stored
//! inputs are replaced on every check.

/// Screen regions with independent redraw tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Speakers,
    Volume,
    ResultLine(usize),
    Entry,
    Categories,
}

const FIXED_SLOTS: usize = 4;

impl Region {
    fn slot(self) -> usize {
        match self {
            Region::Speakers => 0,
            Region::Volume => 1,
            Region::Entry => 2,
            Region::Categories => 3,
            Region::ResultLine(line) => FIXED_SLOTS + line,
        }
    }
}

/// The render-affecting inputs of one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Speakers { names: Vec<String>, selected: usize },
    Volume(String),
    ResultLine {
        line: usize,
        label: Option<String>,
        highlighted: bool,
    },
    /// `None` while the entry line is suppressed.
    Entry(Option<String>),
    Categories { active: usize },
}

impl Snapshot {
    pub fn region(&self) -> Region {
        match self {
            Snapshot::Speakers { .. } => Region::Speakers,
            Snapshot::Volume(_) => Region::Volume,
            Snapshot::ResultLine { line, .. } => Region::ResultLine(*line),
            Snapshot::Entry(_) => Region::Entry,
            Snapshot::Categories { .. } => Region::Categories,
        }
    }
}

/// Fixed-size table of last-rendered snapshots, one slot per region.
#[derive(Debug, Clone)]
pub struct DirtyTracker {
    slots: Vec<Option<Snapshot>>,
}

impl DirtyTracker {
    pub fn new(num_rows: usize) -> Self {
        Self {
            slots: vec![None; FIXED_SLOTS + num_rows],
        }
    }

    /// Compare `snapshot` with what its region was last drawn from, store it,
    /// and report whether it differed.  Unknown regions are always dirty.
    pub fn is_dirty(&mut self, snapshot: Snapshot) -> bool {
        let Some(slot) = self.slots.get_mut(snapshot.region().slot()) else {
            return true;
        };
        if slot.as_ref() == Some(&snapshot) {
            return false;
        }
        *slot = Some(snapshot);
        true
    }

    /// Forget everything; the next pass repaints every region.
    pub fn invalidate(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}
