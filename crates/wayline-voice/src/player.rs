use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use wayline_core::{AnnouncementSink, WaylineError, WaylineResult};

use super::tts::{CancelToken, SpeechEngine};

/// Upper bound on how long `stop` waits for the engine to let go of the speaker.
const STOP_TIMEOUT: Duration = Duration::from_millis(500);

enum PlayerCommand {
    Play { generation: u64, prompts: Vec<String> },
    Shutdown,
}

/// What the worker is doing, guarded together with generation bumps.
#[derive(Default)]
struct Speaking {
    generation: Option<u64>,
}

struct Shared {
    generation: Arc<AtomicU64>,
    speaking: Mutex<Speaking>,
    idle: Condvar,
}

/// Announcement sink that plays prompt batches on a dedicated thread.
///
/// `play` only enqueues. `stop` bumps the generation, which discards every
/// queued batch, and waits until the utterance in progress has been cut off.
pub struct TtsPlayer {
    tx: mpsc::Sender<PlayerCommand>,
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl TtsPlayer {
    pub fn spawn(engine: Arc<dyn SpeechEngine>) -> WaylineResult<Self> {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            generation: Arc::new(AtomicU64::new(0)),
            speaking: Mutex::new(Speaking::default()),
            idle: Condvar::new(),
        });

        let worker_shared = shared.clone();
        let handle = std::thread::Builder::new()
            .name("tts-player".into())
            .spawn(move || run_player(engine, rx, worker_shared))
            .map_err(|e| WaylineError::Speech(format!("Failed to spawn player thread: {e}")))?;

        Ok(Self {
            tx,
            shared,
            thread: Mutex::new(Some(handle)),
        })
    }
}

impl AnnouncementSink for TtsPlayer {
    fn play(&self, prompts: Vec<String>) {
        let generation = self.shared.generation.load(Ordering::SeqCst);
        if self
            .tx
            .send(PlayerCommand::Play {
                generation,
                prompts,
            })
            .is_err()
        {
            tracing::warn!("TTS player is gone, dropping announcement");
        }
    }

    fn stop(&self) {
        let guard = self
            .shared
            .speaking
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let cancelled = self.shared.generation.fetch_add(1, Ordering::SeqCst);

        let (guard, timeout) = self
            .shared
            .idle
            .wait_timeout_while(guard, STOP_TIMEOUT, |s| {
                s.generation.is_some_and(|g| g <= cancelled)
            })
            .unwrap_or_else(PoisonError::into_inner);
        drop(guard);

        if timeout.timed_out() {
            tracing::warn!("Speech engine did not stop within {STOP_TIMEOUT:?}");
        }
    }
}

impl Drop for TtsPlayer {
    fn drop(&mut self) {
        self.stop();
        let _ = self.tx.send(PlayerCommand::Shutdown);
        let handle = self
            .thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("TTS player thread panicked");
            }
        }
    }
}

fn run_player(engine: Arc<dyn SpeechEngine>, rx: mpsc::Receiver<PlayerCommand>, shared: Arc<Shared>) {
    tracing::debug!("TTS player running");

    while let Ok(command) = rx.recv() {
        let (generation, prompts) = match command {
            PlayerCommand::Play {
                generation,
                prompts,
            } => (generation, prompts),
            PlayerCommand::Shutdown => break,
        };

        for text in prompts {
            {
                let mut speaking = shared.speaking.lock().unwrap_or_else(PoisonError::into_inner);
                if shared.generation.load(Ordering::SeqCst) != generation {
                    tracing::debug!("Discarding cancelled announcement batch");
                    break;
                }
                speaking.generation = Some(generation);
            }

            let token = CancelToken::new(shared.generation.clone(), generation);
            if let Err(e) = engine.speak(&text, &token) {
                tracing::warn!("TTS failed for {text:?}: {e}");
            }

            let mut speaking = shared.speaking.lock().unwrap_or_else(PoisonError::into_inner);
            speaking.generation = None;
            shared.idle.notify_all();
        }
    }

    tracing::debug!("TTS player exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports every step over a channel; blocks on `hold` until cancelled.
    struct ScriptedEngine {
        events: Mutex<mpsc::Sender<String>>,
        hold: Option<String>,
    }

    impl SpeechEngine for ScriptedEngine {
        fn speak(&self, text: &str, cancel: &CancelToken) -> anyhow::Result<()> {
            let send = |e: String| {
                let _ = self.events.lock().unwrap().send(e);
            };
            send(format!("start:{text}"));
            if self.hold.as_deref() == Some(text) {
                while !cancel.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(1));
                }
                send(format!("cancelled:{text}"));
                return Ok(());
            }
            send(format!("done:{text}"));
            Ok(())
        }
    }

    fn player(hold: Option<&str>) -> (TtsPlayer, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        let engine = ScriptedEngine {
            events: Mutex::new(tx),
            hold: hold.map(str::to_string),
        };
        (TtsPlayer::spawn(Arc::new(engine)).unwrap(), rx)
    }

    fn next(rx: &mpsc::Receiver<String>) -> String {
        rx.recv_timeout(Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn plays_batch_in_order() {
        let (player, rx) = player(None);
        player.play(vec!["In 200 meters".into(), "turn right".into()]);
        assert_eq!(next(&rx), "start:In 200 meters");
        assert_eq!(next(&rx), "done:In 200 meters");
        assert_eq!(next(&rx), "start:turn right");
        assert_eq!(next(&rx), "done:turn right");
    }

    #[test]
    fn stop_interrupts_and_discards_queue() {
        let (player, rx) = player(Some("one"));
        player.play(vec!["one".into(), "two".into()]);
        player.play(vec!["queued".into()]);
        assert_eq!(next(&rx), "start:one");

        player.stop();
        // stop only returns once the engine has released the speaker.
        assert_eq!(rx.try_recv().unwrap(), "cancelled:one");

        player.play(vec!["three".into()]);
        assert_eq!(next(&rx), "start:three");
        assert_eq!(next(&rx), "done:three");
    }

    #[test]
    fn stop_when_idle_is_noop() {
        let (player, rx) = player(None);
        player.stop();
        player.stop();
        player.play(vec!["Continue straight".into()]);
        assert_eq!(next(&rx), "start:Continue straight");
        assert_eq!(next(&rx), "done:Continue straight");
    }
}
