//! Controller, the single owner of UI state, bitmap and devices.
//!
//! One iteration: wait for a token (bounded by the key timeout), dispatch it,
//! then drain the state flags in a fixed order: search, volume, redraw.  Any
//! error inside an iteration goes to the failure log and the loop carries on.

use std::time::Duration;

use jukebox_proto::config::{Config, LabelsConfig};
use jukebox_proto::protocol::{Category, ResultItem};
use tracing::{debug, error, info};

use crate::backend::MediaBackend;
use crate::display::DisplaySink;
use crate::error::{UiError, UiResult};
use crate::failure_log::FailureLog;
use crate::keys::{KeySource, Token};
use crate::render::{Layout, RenderStats, Renderer, View};
use crate::state::{FlagRead, Mutation, UiState};

/// Knobs the controller reads from [`Config`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub num_rows: usize,
    pub key_timeout: Duration,
    pub idle_sleep_after: Duration,
    pub volume_step: i8,
    pub labels: LabelsConfig,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            num_rows: config.ui.num_rows,
            key_timeout: config.ui.key_timeout(),
            idle_sleep_after: config.ui.idle_sleep_after(),
            volume_step: config.ui.volume_step,
            labels: config.labels.clone(),
        }
    }

    /// Consecutive timeouts before the panel sleeps: `ceil(idle / timeout)`.
    pub fn idle_ticks(&self) -> u32 {
        let timeout = self.key_timeout.as_millis().max(1);
        let ticks = self.idle_sleep_after.as_millis().div_ceil(timeout);
        ticks.clamp(1, u32::MAX as u128) as u32
    }
}

pub struct Controller<K, D, B> {
    keys: K,
    display: D,
    backend: B,
    state: UiState,
    renderer: Renderer,
    settings: Settings,
    failures: FailureLog,
    speakers: Vec<String>,
    items: Vec<ResultItem>,
    vol_play: String,
    idle: u32,
    idle_ticks: u32,
    sleeps: usize,
    stopped: bool,
    last_render: RenderStats,
}

impl<K, D, B> Controller<K, D, B>
where
    K: KeySource,
    D: DisplaySink,
    B: MediaBackend,
{
    /// Fetch the speaker list and lay out the screen.  Fails when there is
    /// nothing to control or the rows do not fit the panel.
    pub fn new(
        keys: K,
        display: D,
        mut backend: B,
        settings: Settings,
        failures: FailureLog,
    ) -> UiResult<Self> {
        let layout = Layout::new(display.width(), display.height(), settings.num_rows)?;
        let speakers = backend.speakers()?;
        if speakers.is_empty() {
            return Err(UiError::NoSpeakers);
        }
        info!("controlling {} speakers: {:?}", speakers.len(), speakers);
        let idle_ticks = settings.idle_ticks();
        Ok(Self {
            keys,
            display,
            backend,
            state: UiState::new(settings.num_rows),
            renderer: Renderer::new(layout),
            settings,
            failures,
            speakers,
            items: Vec::new(),
            vol_play: String::new(),
            idle: 0,
            idle_ticks,
            sleeps: 0,
            stopped: false,
            last_render: RenderStats::default(),
        })
    }

    /// Run until the key source reports `Interrupt`.  Only a failing key
    /// source ends the loop with an error.
    pub fn run(&mut self) -> UiResult<()> {
        self.start();
        while !self.stopped {
            let token = self.keys.next_token(Some(self.settings.key_timeout))?;
            if let Err(e) = self.step(token) {
                self.report(&e);
            }
        }
        info!("controller stopped");
        Ok(())
    }

    /// Initial fetch and full paint.
    pub fn start(&mut self) {
        let speaker = self.state.speaker();
        match self.backend.volume_play_as_string(speaker) {
            Ok(s) => self.vol_play = s,
            Err(e) => self.report(&e.into()),
        }
        if let Err(e) = self.search() {
            self.report(&e);
        }
        if let Err(e) = self.render() {
            self.report(&e);
        }
    }

    /// Handle one token and refresh whatever it changed.
    pub fn step(&mut self, token: Token) -> UiResult<()> {
        if token == Token::Interrupt {
            info!("interrupt");
            self.stopped = true;
            return Ok(());
        }
        if token.is_key() {
            self.idle = 0;
        }
        self.dispatch(token)?;
        self.refresh()
    }

    fn dispatch(&mut self, token: Token) -> UiResult<()> {
        let speaker = self.state.speaker();
        match token {
            Token::Up => self.state.row_up(),
            Token::Down => self.state.row_down(self.items.len()),
            Token::Left | Token::Right => {
                self.state
                    .cycle_speaker(token == Token::Right, self.speakers.len());
                self.state.apply(Mutation::RefetchVolume);
            }
            Token::Backspace => {
                self.state.apply(Mutation::PopChar);
                self.state.apply(Mutation::SetRow(0));
            }
            Token::Char(c) => {
                self.state.apply(Mutation::PushChar(c));
                self.state.apply(Mutation::SetRow(0));
            }
            Token::F(n) if (1..=Category::ALL.len() as u8).contains(&n) => {
                self.state.apply(Mutation::SetContext(n as usize - 1));
            }
            Token::Enter => self.choose()?,
            Token::PlayPause => {
                self.backend.play_pause(speaker)?;
                self.state.apply(Mutation::RefetchVolume);
            }
            Token::VolumeUp | Token::VolumeDown => {
                let step = self.settings.volume_step;
                let delta = if token == Token::VolumeUp { step } else { -step };
                self.backend.change_volume(speaker, delta)?;
                self.state.apply(Mutation::RefetchVolume);
            }
            Token::NextSong => self.backend.next(speaker)?,
            Token::PreviousSong => self.backend.previous(speaker)?,
            Token::Search => {
                self.state.apply(Mutation::SetEntered(String::new()));
                self.state.apply(Mutation::SetOffset(0));
                self.state.apply(Mutation::SetRow(0));
            }
            Token::Config => self.configure()?,
            Token::NoEvent => {
                self.idle += 1;
                self.state.apply(Mutation::RefetchVolume);
                if self.idle >= self.idle_ticks {
                    self.sleep()?;
                }
            }
            other => debug!("ignoring {:?}", other),
        }
        Ok(())
    }

    /// Enter: play a station directly, otherwise ask replace vs. enqueue.
    fn choose(&mut self) -> UiResult<()> {
        let Some(item) = self.items.get(self.state.row()).cloned() else {
            return Ok(());
        };
        let speaker = self.state.speaker();
        if self.category().is_live_stream() {
            info!("play station {:?} on {}", item.label, speaker);
            self.backend.play(speaker, &item.handle)?;
            self.state.apply(Mutation::RefetchVolume);
            return Ok(());
        }
        let options = [
            self.settings.labels.replace.clone(),
            self.settings.labels.enqueue.clone(),
        ];
        let choice = self.dialogue(&options);
        self.renderer.present(&mut self.display)?;
        match choice? {
            Some(0) => {
                info!("play {:?} on {}", item.label, speaker);
                self.backend.play(speaker, &item.handle)?;
            }
            Some(_) => {
                info!("enqueue {:?} on {}", item.label, speaker);
                self.backend.add_to_queue(speaker, &item.handle)?;
            }
            None => debug!("selection cancelled"),
        }
        self.state.apply(Mutation::RefetchVolume);
        Ok(())
    }

    fn configure(&mut self) -> UiResult<()> {
        let options = [
            self.settings.labels.cycle_repeat.clone(),
            self.settings.labels.reindex.clone(),
        ];
        let choice = self.dialogue(&options);
        self.renderer.present(&mut self.display)?;
        match choice? {
            Some(0) => {
                let speaker = self.state.speaker();
                self.backend.cycle_repeat(speaker)?;
                self.state.apply(Mutation::RefetchVolume);
            }
            Some(_) => {
                info!("reindexing music library");
                self.backend.reindex()?;
            }
            None => debug!("config dialogue cancelled"),
        }
        Ok(())
    }

    /// Modal choice over `options`.  Waits without timeout; `Enter` confirms,
    /// any other key except `Up`/`Down` cancels.
    fn dialogue(&mut self, options: &[String]) -> UiResult<Option<usize>> {
        let n = options.len();
        if n == 0 {
            return Ok(None);
        }
        let mut chosen = 0;
        loop {
            let frame = self.renderer.dialogue_frame(options, chosen);
            self.display.draw(&frame)?;
            match self.keys.next_token(None)? {
                Token::Up => chosen = (chosen + n - 1) % n,
                Token::Down => chosen = (chosen + 1) % n,
                Token::Enter => return Ok(Some(chosen)),
                Token::Interrupt => {
                    self.stopped = true;
                    return Ok(None);
                }
                other => {
                    debug!("dialogue cancelled by {:?}", other);
                    return Ok(None);
                }
            }
        }
    }

    /// Panel off until the next key.  The waking key only wakes.
    fn sleep(&mut self) -> UiResult<()> {
        self.idle = 0;
        self.sleeps += 1;
        info!("idle, switching display off");
        self.display.display_off()?;
        let waking = self.keys.next_token(None)?;
        debug!("woken by {:?}", waking);
        if waking == Token::Interrupt {
            self.stopped = true;
        }
        self.display.display_on()?;
        self.renderer.present(&mut self.display)?;
        // the panel may have lost its contents while powered down
        self.renderer.invalidate();
        self.state.apply(Mutation::RefetchVolume);
        Ok(())
    }

    fn refresh(&mut self) -> UiResult<()> {
        if self.state.should_search(FlagRead::Reset) {
            self.search()?;
        }
        if self.state.should_refetch_volume(FlagRead::Reset) {
            self.vol_play = self
                .backend
                .volume_play_as_string(self.state.speaker())?;
        }
        if self.state.should_redraw(FlagRead::Reset) {
            self.render()?;
        }
        Ok(())
    }

    fn search(&mut self) -> UiResult<()> {
        let category = self.category();
        let term = if category.is_live_stream() {
            ""
        } else {
            self.state.entered()
        };
        self.items = self.backend.search(
            category,
            term,
            self.state.offset(),
            self.state.num_rows(),
        )?;
        debug!(
            "search {:?} {:?} @{} -> {} items",
            category,
            term,
            self.state.offset(),
            self.items.len()
        );
        self.state.clamp_row(self.items.len());
        Ok(())
    }

    fn render(&mut self) -> UiResult<()> {
        let category = self.category();
        let view = View {
            speakers: &self.speakers,
            speaker: self.state.speaker(),
            vol_play: &self.vol_play,
            items: &self.items,
            row: self.state.row(),
            entered: self.state.entered(),
            category,
        };
        let stats = self.renderer.render(&view, &mut self.display)?;
        debug!("render pass repainted {} regions", stats.regions_drawn);
        self.last_render = stats;
        Ok(())
    }

    fn report(&self, err: &UiError) {
        error!("{}", err);
        self.failures.record(err);
    }

    fn category(&self) -> Category {
        Category::from_index(self.state.context()).unwrap_or_default()
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn speakers(&self) -> &[String] {
        &self.speakers
    }

    pub fn vol_play(&self) -> &str {
        &self.vol_play
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    pub fn idle_count(&self) -> u32 {
        self.idle
    }

    /// Outcome of the most recent render pass.
    pub fn last_render(&self) -> RenderStats {
        self.last_render
    }

    pub fn sleep_count(&self) -> usize {
        self.sleeps
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}
