//! Interactive console over the mock platform.
//!
//! One voice group holds the operator, the named participants and a bot.
//! Plain lines are chat messages from the operator; lines starting with `:`
//! drive the simulation.

use std::collections::HashMap;
use std::sync::Arc;

use focus_gate_daemon::{Config, Dispatcher, JoinOutcome, MessageContext, SessionManager};
use focus_gate_platform::mock::{MockPlatform, MockPlatformHandle};
use focus_gate_types::{ChannelId, GroupId, Participant, ParticipantId, VoiceStateChange};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

const ROOM: GroupId = GroupId(1);
const CHANNEL: ChannelId = ChannelId(1);
const OPERATOR: ParticipantId = ParticipantId(1);
const BOT: ParticipantId = ParticipantId(999);

/// Simulation controls typed at the console.
#[derive(Debug, PartialEq, Eq)]
enum Control<'a> {
    Enter(&'a str),
    Exit(&'a str),
    Who,
    Help,
    Quit,
}

fn parse_control(line: &str) -> Option<Result<Control<'_>, String>> {
    let rest = line.strip_prefix(':')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    let control = match (name, arg) {
        ("enter", "") | ("exit", "") => Err(format!("usage: :{name} NAME")),
        ("enter", who) => Ok(Control::Enter(who)),
        ("exit", who) => Ok(Control::Exit(who)),
        ("who", _) => Ok(Control::Who),
        ("help", _) => Ok(Control::Help),
        ("quit", _) => Ok(Control::Quit),
        _ => Err(format!("unknown control :{name} (try :help)")),
    };
    Some(control)
}

struct Console {
    platform: MockPlatformHandle,
    manager: Arc<SessionManager>,
    dispatcher: Dispatcher,
    known: HashMap<String, Participant>,
    next_id: u64,
}

impl Console {
    fn new(config: Config, participants: &[String]) -> Self {
        let mock = MockPlatform::new();
        let platform = mock.handle();
        let manager = Arc::new(SessionManager::new(mock.platform(), config));
        let dispatcher = Dispatcher::new(Arc::clone(&manager));

        let mut console = Self {
            platform,
            manager,
            dispatcher,
            known: HashMap::new(),
            next_id: OPERATOR.0 + 1,
        };
        let operator = Participant::member(OPERATOR.0, "you");
        console.platform.enter(ROOM, operator.clone());
        console.known.insert(operator.name.clone(), operator);
        let bot = Participant::bot(BOT.0, "music-bot");
        console.platform.enter(ROOM, bot.clone());
        console.known.insert(bot.name.clone(), bot);
        for name in participants.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let participant = console.participant(name);
            console.platform.enter(ROOM, participant);
        }
        console
    }

    /// The participant with this name, registering a new one if needed.
    fn participant(&mut self, name: &str) -> Participant {
        if let Some(known) = self.known.get(name) {
            return known.clone();
        }
        let participant = Participant::member(self.next_id, name);
        self.next_id += 1;
        self.known.insert(name.to_string(), participant.clone());
        participant
    }

    /// Returns `false` when the console should exit.
    async fn handle_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }
        match parse_control(line) {
            Some(Ok(control)) => return self.control(control).await,
            Some(Err(usage)) => println!("{usage}"),
            None => {
                let ctx = MessageContext {
                    author: OPERATOR,
                    channel: CHANNEL,
                };
                if self.dispatcher.handle_message(ctx, line).await.is_none() {
                    debug!(line, "not a command");
                }
            }
        }
        true
    }

    async fn control(&mut self, control: Control<'_>) -> bool {
        match control {
            Control::Enter(name) => {
                let participant = self.participant(name);
                let before = self
                    .platform
                    .find_by_name(name)
                    .map(|(group, _)| group);
                self.platform.enter(ROOM, participant.clone());
                let change = VoiceStateChange {
                    participant,
                    before,
                    after: Some(ROOM),
                };
                match self.manager.on_voice_state_update(&change).await {
                    JoinOutcome::Applied(report) => {
                        println!("{name} joined and was muted ({} changed)", report.count_affected());
                    }
                    JoinOutcome::Ignored(why) => println!("{name} joined ({why:?})"),
                }
            }
            Control::Exit(name) => match self.known.get(name) {
                Some(participant) => {
                    let id = participant.id;
                    if let Some(left) = self.platform.exit(id) {
                        let change = VoiceStateChange {
                            participant: left,
                            before: Some(ROOM),
                            after: None,
                        };
                        self.manager.on_voice_state_update(&change).await;
                        println!("{name} left");
                    } else {
                        println!("{name} is not in voice");
                    }
                }
                None => println!("nobody called {name}"),
            },
            Control::Who => self.print_roster(),
            Control::Help => print_help(self.manager.config().commands.prefix.as_str()),
            Control::Quit => return false,
        }
        true
    }

    fn print_roster(&self) {
        let members = self.platform.members(ROOM);
        if members.is_empty() {
            println!("voice group is empty");
        }
        for p in members {
            let state = if self.platform.is_muted(p.id) {
                "muted"
            } else {
                "speaking"
            };
            let kind = if p.is_bot { " [bot]" } else { "" };
            println!("  {}{kind}: {state}", p.name);
        }
        if let Some(status) = self.manager.status() {
            println!(
                "  session: pomodoro {} ({}), {} min focus / {} min break",
                status.cycle,
                status.phase,
                status.durations.work_minutes(),
                status.durations.break_minutes()
            );
        }
    }

    /// Stop and unmute on the way out.
    async fn shutdown(&self) {
        if self.manager.status().is_none() {
            return;
        }
        info!("stopping focus session before exit");
        if let Err(e) = self.manager.leave().await {
            warn!(error = %e, "leave on exit failed");
        }
    }
}

fn print_help(prefix: &str) {
    println!("chat commands:");
    println!("  {prefix}pomodoro [WORK[, BREAK]]   start a focus session");
    println!("  {prefix}stop | {prefix}leave | {prefix}join | {prefix}status");
    println!("simulation:");
    println!("  :enter NAME   NAME joins the voice group");
    println!("  :exit NAME    NAME leaves the voice group");
    println!("  :who          show who is muted");
    println!("  :quit");
}

/// Run the console until stdin closes, `:quit`, or Ctrl-C.
pub async fn run(config: Config, participants: &[String]) -> anyhow::Result<()> {
    let prefix = config.commands.prefix.clone();
    let mut console = Console::new(config, participants);

    let mut outbox = console.platform.subscribe_text();
    let printer = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            println!("[#{}] {}", message.channel, message.content);
        }
    });

    print_help(&prefix);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !console.handle_line(&line).await {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    console.shutdown().await;
    drop(console);
    printer.abort();
    Ok(())
}
