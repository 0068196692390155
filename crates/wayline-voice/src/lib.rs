pub mod player;
pub mod tts;

pub use player::TtsPlayer;
pub use tts::{CancelToken, PiperEngine, SpeechEngine};
