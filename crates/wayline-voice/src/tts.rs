use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use wayline_core::config::VoiceConfig;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Tells a speech engine whether the utterance it is playing was cancelled.
#[derive(Debug, Clone)]
pub struct CancelToken {
    current: Arc<AtomicU64>,
    issued: u64,
}

impl CancelToken {
    pub(crate) fn new(current: Arc<AtomicU64>, issued: u64) -> Self {
        Self { current, issued }
    }

    /// A token nobody can cancel.
    pub fn never() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
            issued: 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.issued
    }
}

/// Something that can turn text into audible speech.
pub trait SpeechEngine: Send + Sync {
    /// Speak `text`, blocking until playback finishes or `cancel` fires.
    fn speak(&self, text: &str, cancel: &CancelToken) -> Result<()>;
}

/// Text-to-speech engine using Piper as a subprocess.
pub struct PiperEngine {
    piper_binary: String,
    model_path: String,
    config_path: String,
    player_binary: String,
    sample_rate: u32,
}

impl PiperEngine {
    pub fn new(piper_binary: &str, model_path: &str, config_path: &str) -> Self {
        Self {
            piper_binary: piper_binary.to_string(),
            model_path: model_path.to_string(),
            config_path: config_path.to_string(),
            player_binary: "aplay".to_string(),
            sample_rate: 22050,
        }
    }

    pub fn from_config(config: &VoiceConfig) -> Self {
        Self {
            piper_binary: config.piper_binary.clone(),
            model_path: config.piper_model.clone(),
            config_path: config.piper_config.clone(),
            player_binary: config.player_binary.clone(),
            sample_rate: config.sample_rate,
        }
    }

    fn spawn_pipeline(&self, text: &str) -> Result<(Child, Child)> {
        // piper --model X --config Y --output-raw | aplay -r 22050 -f S16_LE -c 1
        let mut piper = Command::new(&self.piper_binary)
            .args([
                "--model",
                &self.model_path,
                "--config",
                &self.config_path,
                "--output-raw",
            ])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn piper")?;

        if let Some(mut stdin) = piper.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .context("Failed to write to piper stdin")?;
            // stdin is dropped here, closing the pipe
        }

        let piper_stdout = piper.stdout.take().context("No piper stdout")?;
        let rate = self.sample_rate.to_string();

        let player = match Command::new(&self.player_binary)
            .args(["-r", &rate, "-f", "S16_LE", "-c", "1", "-q"])
            .stdin(piper_stdout)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(p) => p,
            Err(e) => {
                let _ = piper.kill();
                let _ = piper.wait();
                return Err(e).context(format!("Failed to spawn {}", self.player_binary));
            }
        };

        Ok((piper, player))
    }
}

impl SpeechEngine for PiperEngine {
    fn speak(&self, text: &str, cancel: &CancelToken) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        tracing::debug!("TTS speaking: {text}");
        let (mut piper, mut player) = self.spawn_pipeline(text)?;

        loop {
            if cancel.is_cancelled() {
                tracing::debug!("TTS interrupted: {text}");
                let _ = piper.kill();
                let _ = player.kill();
                let _ = piper.wait();
                let _ = player.wait();
                return Ok(());
            }
            // piper finishes first; playback is over once the player exits.
            if player.try_wait()?.is_some() {
                let _ = piper.wait();
                return Ok(());
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
