//! Key event stream. Normalizes raw terminal input into symbolic tokens.
//!
//! The controller pulls tokens with [`KeySource::next_token`].  A bounded wait
//! that expires yields [`Token::NoEvent`]; `None` blocks until a key arrives.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MediaKeyCode,
};
use ratatui::crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A typed printable character.
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Backspace,
    PlayPause,
    VolumeUp,
    VolumeDown,
    NextSong,
    PreviousSong,
    /// Function key F1..F12.
    F(u8),
    Search,
    Config,
    /// A named key without a binding (kept for debug logging).
    Unknown(String),
    /// The bounded wait expired without a key.
    NoEvent,
    /// Stop the session (Ctrl-C in the terminal, end of a script).
    Interrupt,
}

impl Token {
    /// Everything except the timeout marker counts as operator activity.
    pub fn is_key(&self) -> bool {
        !matches!(self, Token::NoEvent)
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("reading terminal events: {0}")]
    Io(#[from] std::io::Error),
}

pub trait KeySource {
    /// Next token; `timeout = None` waits indefinitely.
    fn next_token(&mut self, timeout: Option<Duration>) -> Result<Token, InputError>;
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn next_token(&mut self, timeout: Option<Duration>) -> Result<Token, InputError> {
        (**self).next_token(timeout)
    }
}

// ── Terminal keyboard ─────────────────────────────────────────────────────────

/// Reads keys from the controlling terminal in raw mode.
pub struct TerminalKeys {
    _raw: RawModeGuard,
}

impl TerminalKeys {
    pub fn new() -> Result<Self, InputError> {
        Ok(Self {
            _raw: RawModeGuard::enable()?,
        })
    }
}

impl KeySource for TerminalKeys {
    fn next_token(&mut self, timeout: Option<Duration>) -> Result<Token, InputError> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(deadline) = deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if !event::poll(remaining)? {
                    return Ok(Token::NoEvent);
                }
            }
            match event::read()? {
                Event::Key(key) => {
                    if let Some(token) = token_from_key(key) {
                        debug!("key {:?} -> {:?}", key.code, token);
                        return Ok(token);
                    }
                }
                other => debug!("ignoring terminal event {:?}", other),
            }
        }
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("could not leave raw mode: {}", e);
        }
    }
}

/// Map one crossterm key event to a token.  Releases map to `None`.
///
/// Media keys only arrive from terminals with the enhanced keyboard protocol,
/// so every transport key also has a function-key fallback.
pub fn token_from_key(key: KeyEvent) -> Option<Token> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let token = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Token::Interrupt,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => Token::Char(c),
        KeyCode::Up => Token::Up,
        KeyCode::Down => Token::Down,
        KeyCode::Left => Token::Left,
        KeyCode::Right => Token::Right,
        KeyCode::Enter => Token::Enter,
        KeyCode::Backspace => Token::Backspace,
        KeyCode::PageUp => Token::VolumeUp,
        KeyCode::PageDown => Token::VolumeDown,
        KeyCode::F(7) => Token::PreviousSong,
        KeyCode::F(8) => Token::NextSong,
        KeyCode::F(9) => Token::PlayPause,
        KeyCode::F(11) => Token::Search,
        KeyCode::F(12) => Token::Config,
        KeyCode::F(n) => Token::F(n),
        KeyCode::Media(media) => match media {
            MediaKeyCode::PlayPause | MediaKeyCode::Play | MediaKeyCode::Pause => {
                Token::PlayPause
            }
            MediaKeyCode::RaiseVolume => Token::VolumeUp,
            MediaKeyCode::LowerVolume => Token::VolumeDown,
            MediaKeyCode::TrackNext => Token::NextSong,
            MediaKeyCode::TrackPrevious => Token::PreviousSong,
            other => Token::Unknown(format!("{:?}", other)),
        },
        other => Token::Unknown(format!("{:?}", other)),
    };
    Some(token)
}

// ── Scripted source ───────────────────────────────────────────────────────────

/// Replays a fixed token sequence, then reports `Interrupt` forever.
/// Used by tests and the `--script` demo mode.
#[derive(Debug, Default)]
pub struct ScriptedKeys {
    tokens: VecDeque<Token>,
    /// Timeouts passed to each `next_token` call, in order.
    pub waits: Vec<Option<Duration>>,
}

impl ScriptedKeys {
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
            waits: Vec::new(),
        }
    }

    /// Parse a whitespace-separated script such as `"DOWN DOWN ENTER a b BACKSPACE"`.
    /// Single characters become `Char`; unknown names become `Unknown`.
    pub fn parse(script: &str) -> Self {
        Self::new(script.split_whitespace().map(parse_token))
    }
}

impl KeySource for ScriptedKeys {
    fn next_token(&mut self, timeout: Option<Duration>) -> Result<Token, InputError> {
        self.waits.push(timeout);
        Ok(self.tokens.pop_front().unwrap_or(Token::Interrupt))
    }
}

fn parse_token(word: &str) -> Token {
    let mut chars = word.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Token::Char(c);
    }
    let name = word.strip_prefix("KEY_").unwrap_or(word).to_ascii_uppercase();
    match name.as_str() {
        "UP" => Token::Up,
        "DOWN" => Token::Down,
        "LEFT" => Token::Left,
        "RIGHT" => Token::Right,
        "ENTER" => Token::Enter,
        "BACKSPACE" => Token::Backspace,
        "PLAYPAUSE" => Token::PlayPause,
        "VOLUMEUP" => Token::VolumeUp,
        "VOLUMEDOWN" => Token::VolumeDown,
        "NEXTSONG" => Token::NextSong,
        "PREVIOUSSONG" => Token::PreviousSong,
        "SEARCH" => Token::Search,
        "CONFIG" => Token::Config,
        "NONE" | "TIMEOUT" => Token::NoEvent,
        "QUIT" => Token::Interrupt,
        f if f.starts_with('F') && f.len() > 1 => match f[1..].parse::<u8>() {
            Ok(n) => Token::F(n),
            Err(_) => Token::Unknown(word.to_string()),
        },
        _ => Token::Unknown(word.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_navigation_and_editing_keys() {
        assert_eq!(token_from_key(press(KeyCode::Up)), Some(Token::Up));
        assert_eq!(token_from_key(press(KeyCode::Enter)), Some(Token::Enter));
        assert_eq!(
            token_from_key(press(KeyCode::Backspace)),
            Some(Token::Backspace)
        );
        assert_eq!(
            token_from_key(press(KeyCode::Char('x'))),
            Some(Token::Char('x'))
        );
        assert_eq!(token_from_key(press(KeyCode::F(3))), Some(Token::F(3)));
    }

    #[test]
    fn test_transport_fallbacks_and_media_keys() {
        assert_eq!(token_from_key(press(KeyCode::F(9))), Some(Token::PlayPause));
        assert_eq!(token_from_key(press(KeyCode::PageUp)), Some(Token::VolumeUp));
        assert_eq!(
            token_from_key(press(KeyCode::Media(MediaKeyCode::TrackNext))),
            Some(Token::NextSong)
        );
        assert_eq!(
            token_from_key(press(KeyCode::Media(MediaKeyCode::LowerVolume))),
            Some(Token::VolumeDown)
        );
    }

    #[test]
    fn test_ctrl_c_interrupts_and_release_is_dropped() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(token_from_key(ctrl_c), Some(Token::Interrupt));

        let release = KeyEvent {
            code: KeyCode::Up,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(token_from_key(release), None);
    }

    #[test]
    fn test_unbound_key_is_unknown() {
        assert!(matches!(
            token_from_key(press(KeyCode::Esc)),
            Some(Token::Unknown(_))
        ));
    }

    #[test]
    fn test_script_parsing() {
        let mut keys = ScriptedKeys::parse("DOWN KEY_ENTER a F2 NONE SEARCH bogus");
        let mut got = Vec::new();
        for _ in 0..8 {
            got.push(keys.next_token(None).unwrap());
        }
        assert_eq!(
            got,
            vec![
                Token::Down,
                Token::Enter,
                Token::Char('a'),
                Token::F(2),
                Token::NoEvent,
                Token::Search,
                Token::Unknown("bogus".into()),
                Token::Interrupt,
            ]
        );
        assert!(!Token::NoEvent.is_key());
        assert!(Token::Interrupt.is_key());
    }
}
