mod cli;
mod platform;
mod script;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use wayline_core::config::AppConfig;
use wayline_core::{lifecycle, Collaborators};
use wayline_service::{NotificationTemplate, ServiceHandle};
use wayline_voice::{PiperEngine, SpeechEngine, TtsPlayer};

use cli::{Cli, Commands};
use platform::{ConsolePresenter, ConsoleSpeech, ScriptedLocationSource, ScriptedRoute};
use script::{fix_time, NavigationScript};

/// `tokio::time::interval` rejects a zero period.
const MIN_INTERVAL_MS: u64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    lifecycle::init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            script,
            interval_ms,
        } => {
            let interval = interval_ms.unwrap_or(config.replay.interval_ms);
            run_script(&config, &script, interval).await?;
        }
        Commands::Validate { script, json } => {
            let summary = NavigationScript::load(&script)?.summary();
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} fixes, {} navigating, {} prompts, {} with route data, {} with notifications blocked",
                    summary.ticks,
                    summary.navigating,
                    summary.prompts,
                    summary.with_route,
                    summary.notifications_blocked
                );
            }
        }
    }

    Ok(())
}

async fn run_script(config: &AppConfig, path: &Path, interval_ms: u64) -> Result<()> {
    let script = NavigationScript::load(path)?;
    lifecycle::log_startup();

    let engine: Arc<dyn SpeechEngine> = if config.voice.enabled {
        Arc::new(PiperEngine::from_config(&config.voice))
    } else {
        Arc::new(ConsoleSpeech)
    };
    let route = Arc::new(ScriptedRoute::default());
    let location = Arc::new(ScriptedLocationSource::default());
    let deps = Collaborators {
        routing: route.clone(),
        navigation: route.clone(),
        location: location.clone(),
        announcer: Arc::new(TtsPlayer::spawn(engine)?),
        presenter: Arc::new(ConsolePresenter),
        permission: route.clone(),
    };

    let mut service =
        ServiceHandle::spawn(deps, NotificationTemplate::from_config(&config.notification))?;
    service.start()?;

    let period_ms = interval_ms.max(MIN_INTERVAL_MS);
    let mut ticker = tokio::time::interval(Duration::from_millis(period_ms));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let started = chrono::Utc::now();
    let mut interrupted = false;
    for (seq, tick) in script.ticks.iter().enumerate() {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted, stopping navigation");
                interrupted = true;
                break;
            }
        }
        route.set_tick(tick);
        location.deliver(&tick.location(fix_time(started, period_ms, seq)));
        // The scripted route must not move on until this fix has been handled.
        service.flush()?;
    }

    if !interrupted {
        // Let the last announcement finish before stop cancels speech.
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {}
        }
    }

    service.stop();
    lifecycle::log_shutdown();
    Ok(())
}
