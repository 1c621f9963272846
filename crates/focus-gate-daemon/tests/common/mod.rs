//! Shared fixture for the session integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use focus_gate_daemon::{Config, Dispatcher, MessageContext, SessionManager, SessionStatus, StartRequest};
use focus_gate_platform::mock::{MockPlatform, MockPlatformHandle};
use focus_gate_types::{ChannelId, GroupId, Participant, ParticipantId};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

pub const ROOM: GroupId = GroupId(100);
pub const LOBBY: GroupId = GroupId(200);
pub const TEXT: ChannelId = ChannelId(7);

pub const ALICE: ParticipantId = ParticipantId(1);
pub const BOB: ParticipantId = ParticipantId(2);
pub const MUSIC_BOT: ParticipantId = ParticipantId(9);
pub const CAROL: ParticipantId = ParticipantId(3);

pub const ALARM_TEXT: &str = "@here ⏰ **Alarm!**";

/// A manager wired to a mock platform with ALICE, BOB and a bot in ROOM.
pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub dispatcher: Dispatcher,
    pub platform: MockPlatformHandle,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let mock = MockPlatform::new();
        let platform = mock.handle();
        platform.enter(ROOM, Participant::member(ALICE.0, "alice"));
        platform.enter(ROOM, Participant::member(BOB.0, "bob"));
        platform.enter(ROOM, Participant::bot(MUSIC_BOT.0, "music"));

        let manager = Arc::new(SessionManager::new(mock.platform(), config));
        let dispatcher = Dispatcher::new(Arc::clone(&manager));
        Self {
            manager,
            dispatcher,
            platform,
        }
    }

    /// Everyone human in ROOM is muted.
    pub fn room_muted(&self) -> bool {
        self.humans_in_room().iter().all(|id| self.platform.is_muted(*id))
    }

    /// Nobody in ROOM is muted.
    pub fn room_unmuted(&self) -> bool {
        self.platform
            .members(ROOM)
            .iter()
            .all(|p| !self.platform.is_muted(p.id))
    }

    fn humans_in_room(&self) -> Vec<ParticipantId> {
        self.platform
            .members(ROOM)
            .into_iter()
            .filter(|p| !p.is_bot)
            .map(|p| p.id)
            .collect()
    }

    pub fn count_sent(&self, needle: &str) -> usize {
        self.platform
            .sent_texts()
            .iter()
            .filter(|t| t.contains(needle))
            .count()
    }
}

pub fn ctx(author: ParticipantId) -> MessageContext {
    MessageContext {
        author,
        channel: TEXT,
    }
}

pub fn request(work_minutes: i64, break_minutes: i64) -> StartRequest {
    StartRequest {
        initiator: ALICE,
        channel: TEXT,
        work_minutes: Some(work_minutes),
        break_minutes: Some(break_minutes),
    }
}

/// Wait for a condition on a status receiver with timeout.
pub async fn wait_for_status(
    rx: &mut watch::Receiver<SessionStatus>,
    timeout: Duration,
    pred: impl Fn(&SessionStatus) -> bool,
) -> Result<SessionStatus, &'static str> {
    tokio::time::timeout(timeout, async {
        loop {
            {
                let status = rx.borrow_and_update().clone();
                if pred(&status) {
                    return Ok(status);
                }
            }
            if rx.changed().await.is_err() {
                return Err("watch closed");
            }
        }
    })
    .await
    .map_err(|_| "timeout")?
}

/// Sleep in virtual time.
pub async fn advance(seconds: f64) {
    tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
}
