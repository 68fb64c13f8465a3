use std::path::PathBuf;

const APP_DIR: &str = "jukebox";

pub fn data_dir() -> PathBuf {
    // On Linux (the Pi) and macOS use ~/.local/share/jukebox/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_DIR)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_DIR)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }
}

/// Default location of the operator-facing failure log.
/// One line per error swallowed by the main loop.
pub fn failure_log_path() -> PathBuf {
    data_dir().join("failures.log")
}

/// Default location of the tracing log.
pub fn log_path() -> PathBuf {
    data_dir().join("jukebox.log")
}
