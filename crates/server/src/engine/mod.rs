//! Engine backends and the per-request move pipeline.

pub mod error;
pub mod gtp;

use std::fmt;
use std::str::FromStr;

use go_core::{BoardSize, Color, Temperature};
use rand::Rng;
use tracing::info;

use crate::config::Config;

pub use error::EngineError;
pub use gtp::{GtpReply, GtpSession, SessionOptions, SessionState};

/// GNU Go levels run from 1 (weakest) to 10.
const GNUGO_LEVELS: std::ops::RangeInclusive<i32> = 1..=10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// GNU Go `genmove`, strength sets `--level`
    GnuGo,
    /// KataGo `genmove` at full strength
    KataGo,
    /// KataGo raw policy sampled at a strength-dependent temperature
    KataGoWeak,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::GnuGo => "gnugo",
            Backend::KataGo => "katago",
            Backend::KataGoWeak => "katago-weak",
        }
    }

    /// Whether the side to move is taken from the last replayed stone.
    ///
    /// `genmove <color>` names the side explicitly, so those backends get the
    /// record in its own order. `kata-analyze` has no color argument.
    pub fn infers_turn(self) -> bool {
        matches!(self, Backend::KataGoWeak)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "gnugo" => Ok(Backend::GnuGo),
            "katago" => Ok(Backend::KataGo),
            "katago-weak" => Ok(Backend::KataGoWeak),
            other => Err(format!(
                "Unknown engine backend {other:?} (expected gnugo, katago or katago-weak)"
            )),
        }
    }
}

/// Program and arguments used to start an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn with_args<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut command = self.clone();
        command.args.extend(extra.into_iter().map(Into::into));
        command
    }
}

/// Everything the engine needs for one request, already in GTP form.
#[derive(Debug, Clone)]
pub struct MovePlan {
    pub size: BoardSize,
    pub color: Color,
    pub strength: i32,
    /// `(color, vertex)` for each `play` command, in order
    pub plays: Vec<(Color, String)>,
}

/// Start an engine, replay the position and pick a move for `plan.color`.
///
/// The engine process is terminated before this returns, whatever the outcome.
pub async fn choose_move<R: Rng + Send>(
    config: &Config,
    plan: &MovePlan,
    rng: &mut R,
) -> Result<String, EngineError> {
    let command = match config.backend {
        Backend::GnuGo => {
            let level = plan
                .strength
                .clamp(*GNUGO_LEVELS.start(), *GNUGO_LEVELS.end());
            config.engine.with_args(["--level".to_string(), level.to_string()])
        }
        Backend::KataGo | Backend::KataGoWeak => config.engine.clone(),
    };

    let options = SessionOptions {
        timeout: config.engine_timeout,
        trace: config.engine_trace,
    };
    let mut session = GtpSession::spawn(&command, options).await?;
    let result = play_out(&mut session, config, plan, rng).await;
    session.terminate().await;

    if let Ok(mv) = &result {
        info!(backend = %config.backend, color = %plan.color, mv = %mv, "Engine move");
    }
    result
}

async fn play_out<R: Rng + Send>(
    session: &mut GtpSession,
    config: &Config,
    plan: &MovePlan,
    rng: &mut R,
) -> Result<String, EngineError> {
    session.setup(plan.size).await?;
    session.replay(&plan.plays).await?;

    match config.backend {
        Backend::GnuGo | Backend::KataGo => session.genmove(plan.color).await,
        Backend::KataGoWeak => {
            let policy = session
                .analyze(config.analysis_interval, config.max_candidates)
                .await?;
            let temperature = Temperature::from_strength(plan.strength);
            Ok(policy.sample(temperature, rng))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("gnugo".parse::<Backend>(), Ok(Backend::GnuGo));
        assert_eq!("KataGo".parse::<Backend>(), Ok(Backend::KataGo));
        assert_eq!("katago_weak".parse::<Backend>(), Ok(Backend::KataGoWeak));
        assert!("leela".parse::<Backend>().is_err());
        assert!(Backend::KataGoWeak.infers_turn());
        assert!(!Backend::KataGo.infers_turn());
        assert!(!Backend::GnuGo.infers_turn());
        assert_eq!(Backend::KataGoWeak.to_string(), "katago-weak");
    }

    #[test]
    fn test_with_args_appends() {
        let base = EngineCommand {
            program: "gnugo".into(),
            args: vec!["--mode".into(), "gtp".into()],
        };
        let cmd = base.with_args(["--level", "7"]);
        assert_eq!(cmd.args, vec!["--mode", "gtp", "--level", "7"]);
        assert_eq!(base.args.len(), 2);
    }
}
