// Copyright (c) 2026 rezky_nightky

use std::path::PathBuf;

pub type FxResult<T> = Result<T, FxError>;

#[derive(thiserror::Error, Debug)]
pub enum FxError {
    #[error("failed to apply {0}")]
    Config(String),

    #[error("invalid ramp: {0}")]
    Ramp(String),

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("{effect} render failed: {reason}")]
    Render {
        effect: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FxError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn ramp(msg: impl Into<String>) -> Self {
        Self::Ramp(msg.into())
    }

    pub fn render(effect: &'static str, reason: impl Into<String>) -> Self {
        Self::Render {
            effect,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let e = FxError::config("--density 9 (min 0.1 max 4)");
        assert_eq!(e.to_string(), "failed to apply --density 9 (min 0.1 max 4)");

        let e = FxError::render("shader", "non-finite colour");
        assert_eq!(e.to_string(), "shader render failed: non-finite colour");

        let e = FxError::Decode {
            path: PathBuf::from("robot.png"),
            reason: "truncated".into(),
        };
        assert!(e.to_string().contains("robot.png"));
    }

    #[test]
    fn io_errors_convert() {
        let e: FxError = std::io::Error::other("tty gone").into();
        assert!(e.to_string().contains("tty gone"));
    }
}
