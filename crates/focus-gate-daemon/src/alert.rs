//! End-of-phase alert: audio first, text as the fallback.

use std::sync::Arc;

use focus_gate_platform::{AudioSink, Platform, PlatformError, TextSink};
use focus_gate_types::ChannelId;
use tracing::{debug, info, warn};

use crate::config::AlertConfig;

/// How an alert reached the group.
#[derive(Debug)]
pub enum AlertOutcome {
    /// The asset played to completion over voice.
    Played,
    /// The text announcement was sent. `playback_error` is set when audio
    /// was attempted and failed.
    TextFallback {
        playback_error: Option<PlatformError>,
    },
    /// Neither path worked; logged only.
    Undelivered,
}

/// Plays or announces the end-of-phase alert.
#[derive(Clone)]
pub struct AlertSignal {
    audio: Arc<dyn AudioSink>,
    text: Arc<dyn TextSink>,
    config: AlertConfig,
}

impl AlertSignal {
    pub fn new(platform: &Platform, config: AlertConfig) -> Self {
        Self {
            audio: Arc::clone(&platform.audio),
            text: Arc::clone(&platform.text),
            config,
        }
    }

    /// Sound the alert for `channel`'s group. Never fails.
    ///
    /// When audio is available this suspends until playback finishes, so
    /// the caller's loop pauses audibly instead of racing ahead.
    pub async fn announce(&self, channel: ChannelId) -> AlertOutcome {
        let playback_error = if self.audio_available().await {
            match self.play_to_end().await {
                Ok(()) => return AlertOutcome::Played,
                Err(e) => {
                    warn!(asset = %self.config.asset, error = %e, "alert playback failed, falling back to text");
                    Some(e)
                }
            }
        } else {
            None
        };

        match self.text.send(channel, &self.config.text).await {
            Ok(()) => AlertOutcome::TextFallback { playback_error },
            Err(e) => {
                warn!(channel = %channel, error = %e, "could not send alert message");
                AlertOutcome::Undelivered
            }
        }
    }

    async fn audio_available(&self) -> bool {
        self.audio.is_connected().await && self.audio.has_asset(&self.config.asset).await
    }

    async fn play_to_end(&self) -> Result<(), PlatformError> {
        if self.audio.is_playing().await {
            self.audio.stop().await?;
        }
        self.audio.play(&self.config.asset).await?;
        info!(asset = %self.config.asset, "playing alert");

        let poll = self.config.poll_interval();
        while self.audio.is_playing().await {
            tokio::time::sleep(poll).await;
        }
        debug!("alert playback finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use focus_gate_platform::mock::MockPlatform;
    use focus_gate_types::GroupId;

    use super::*;

    const TEXT: ChannelId = ChannelId(5);

    fn signal(mock: &MockPlatform) -> AlertSignal {
        AlertSignal::new(&mock.platform(), AlertConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn plays_audio_and_waits_for_it() {
        let mock = MockPlatform::new();
        let handle = mock.handle();
        handle.set_connected(Some(GroupId(1)));
        handle.enable_audio("alarm.mp3", Duration::from_secs(3));

        let started = tokio::time::Instant::now();
        let outcome = signal(&mock).announce(TEXT).await;

        assert!(matches!(outcome, AlertOutcome::Played));
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(handle.plays(), 1);
        assert!(handle.sent_texts().is_empty());
    }

    #[tokio::test]
    async fn without_audio_sends_text_once() {
        let mock = MockPlatform::new();
        let handle = mock.handle();

        let outcome = signal(&mock).announce(TEXT).await;

        assert!(matches!(
            outcome,
            AlertOutcome::TextFallback {
                playback_error: None
            }
        ));
        assert_eq!(handle.sent_texts(), vec!["@here ⏰ **Alarm!**".to_string()]);
    }

    #[tokio::test]
    async fn missing_asset_uses_text() {
        let mock = MockPlatform::new();
        let handle = mock.handle();
        handle.set_connected(Some(GroupId(1)));
        handle.enable_audio("other.mp3", Duration::from_secs(1));

        let outcome = signal(&mock).announce(TEXT).await;

        assert!(matches!(outcome, AlertOutcome::TextFallback { .. }));
        assert_eq!(handle.plays(), 0);
    }

    #[tokio::test]
    async fn playback_failure_falls_back_to_text() {
        let mock = MockPlatform::new();
        let handle = mock.handle();
        handle.set_connected(Some(GroupId(1)));
        handle.enable_audio("alarm.mp3", Duration::from_secs(1));
        handle.fail_playback(true);

        let outcome = signal(&mock).announce(TEXT).await;

        assert!(matches!(
            outcome,
            AlertOutcome::TextFallback {
                playback_error: Some(_)
            }
        ));
        assert_eq!(handle.sent_texts().len(), 1);
    }

    #[tokio::test]
    async fn text_failure_is_swallowed() {
        let mock = MockPlatform::new();
        mock.handle().fail_text(true);

        let outcome = signal(&mock).announce(TEXT).await;

        assert!(matches!(outcome, AlertOutcome::Undelivered));
    }
}
