//! Routes chat messages to session operations and replies once per command.

use std::sync::Arc;

use focus_gate_platform::TextSink;
use focus_gate_types::{ChannelId, ParticipantId, Phase};
use tracing::{debug, warn};

use crate::commands::{parse_command, Command};
use crate::error::FocusError;
use crate::scheduler::LoopExit;
use crate::session::{SessionManager, StartRequest, StopOutcome, VoiceMove};

/// Where a chat message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageContext {
    pub author: ParticipantId,
    pub channel: ChannelId,
}

pub struct Dispatcher {
    manager: Arc<SessionManager>,
    text: Arc<dyn TextSink>,
    prefix: String,
}

impl Dispatcher {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        let text = Arc::clone(&manager.platform.text);
        let prefix = manager.config.commands.prefix.clone();
        Self {
            manager,
            text,
            prefix,
        }
    }

    /// Handle one chat message. Returns the reply sent, or `None` if the
    /// message was not a command.
    pub async fn handle_message(&self, ctx: MessageContext, text: &str) -> Option<String> {
        let parsed = parse_command(&self.prefix, text)?;
        debug!(author = %ctx.author, ?parsed, "handling command");

        let reply = match parsed {
            Ok(command) => self.execute(ctx, command).await,
            Err(e) => Err(e),
        }
        .unwrap_or_else(|e| {
            if matches!(e, FocusError::Platform(_) | FocusError::Other(_)) {
                warn!(error = %e, "command failed");
            }
            e.user_message(&self.prefix)
        });

        if let Err(e) = self.text.send(ctx.channel, &reply).await {
            warn!(channel = %ctx.channel, error = %e, "failed to send reply");
        }
        Some(reply)
    }

    async fn execute(&self, ctx: MessageContext, command: Command) -> Result<String, FocusError> {
        let prefix = &self.prefix;
        match command {
            Command::Start {
                work_minutes,
                break_minutes,
            } => {
                let status = self
                    .manager
                    .start(StartRequest {
                        initiator: ctx.author,
                        channel: ctx.channel,
                        work_minutes,
                        break_minutes,
                    })
                    .await?;
                Ok(format!(
                    "Starting focus session: {} min focus / {} min break. Use `{prefix}stop` to end it or `{prefix}leave` to make me leave the voice channel.",
                    status.durations.work_minutes(),
                    status.durations.break_minutes()
                ))
            }
            Command::Stop => {
                let outcome = self.manager.stop().await?;
                Ok(stop_reply(&outcome).to_string())
            }
            Command::Leave => {
                let outcome = self.manager.leave().await?;
                Ok(match outcome.stopped {
                    Some(stopped) => format!("{} Left the voice channel.", stop_reply(&stopped)),
                    None => "Left the voice channel.".to_string(),
                })
            }
            Command::Join => {
                let (group, moved) = self.manager.join(ctx.author).await?;
                Ok(match moved {
                    VoiceMove::Connected => format!("Joined <#{group}>."),
                    VoiceMove::Moved => format!("Moved to <#{group}>."),
                    VoiceMove::AlreadyThere => format!("Already in <#{group}>."),
                })
            }
            Command::Status => {
                let status = self.manager.status().ok_or(FocusError::NotRunning)?;
                let phase = match status.phase {
                    Phase::Work => "focus",
                    Phase::Break => "break",
                    Phase::Idle => "starting",
                };
                Ok(format!(
                    "Pomodoro {} in <#{}>: {phase} ({} min focus / {} min break).",
                    status.cycle,
                    status.group,
                    status.durations.work_minutes(),
                    status.durations.break_minutes()
                ))
            }
        }
    }
}

fn stop_reply(outcome: &StopOutcome) -> &'static str {
    match outcome {
        StopOutcome::Settled(LoopExit::Cancelled) => {
            "Focus session stopped. Participants have been unmuted."
        }
        StopOutcome::Settled(LoopExit::Failed(_)) => {
            "Focus session stopped after an error. I tried to unmute everyone."
        }
        StopOutcome::TimedOut => {
            "Focus session stopping. Participants will be unmuted shortly."
        }
    }
}
