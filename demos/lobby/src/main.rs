use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::io::{AsyncBufReadExt, BufReader};
use waystone::prelude::*;
use waystone::session::{EntityRef, NetEvent, NetEvents};

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

const SPAWN: [f32; 3] = [0.0, 1.0, 0.0];

struct DemoPlayer {
    id: PlayerId,
    name: String,
    position: Mutex<[f32; 3]>,
    local: bool,
    master: bool,
}

impl DemoPlayer {
    fn new(id: u64, name: &str, local: bool, master: bool, position: [f32; 3]) -> PlayerRef {
        Arc::new(Self {
            id: PlayerId(id),
            name: name.to_string(),
            position: Mutex::new(position),
            local,
            master,
        })
    }
}

impl Player for DemoPlayer {
    fn id(&self) -> PlayerId {
        self.id
    }
    fn display_name(&self) -> String {
        self.name.clone()
    }
    fn position(&self) -> [f32; 3] {
        *self.position.lock().unwrap_or_else(|e| e.into_inner())
    }
    fn is_local(&self) -> bool {
        self.local
    }
    fn is_master(&self) -> bool {
        self.master
    }
    fn respawn(&self) {
        *self.position.lock().unwrap_or_else(|e| e.into_inner()) = SPAWN;
    }
}

struct Roster(Vec<PlayerRef>);

impl Entities for Roster {
    fn players(&self) -> Vec<PlayerRef> {
        self.0.clone()
    }
    fn entities(&self) -> Vec<EntityRef> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Local session: single player, "loads" when first selected
// ---------------------------------------------------------------------------

struct LocalSession {
    id: String,
    props: PropertyBag,
    events: SessionEvents,
    state: Mutex<State>,
    master: PlayerSlot,
    local: PlayerSlot,
    roster: Roster,
    disposed: DisposeFlag,
}

impl LocalSession {
    fn new(id: String, title: &str) -> Arc<Self> {
        let you = DemoPlayer::new(1, "you", true, true, [4.0, 1.0, -3.5]);
        let session = Arc::new(Self {
            id,
            props: PropertyBag::new(),
            events: SessionEvents::default(),
            state: Mutex::new(State::pending("waiting to load")),
            master: PlayerSlot::new(),
            local: PlayerSlot::new(),
            roster: Roster(vec![Arc::clone(&you)]),
            disposed: DisposeFlag::new(),
        });
        session.set_master_player(Some(Arc::clone(&you)));
        session.set_local_player(Some(you));
        session.set_title(title);
        session.set_short_name(title);
        session
    }

    fn set_state(&self, state: State) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state.clone();
        self.events.state_changed.emit(&state);
    }
}

impl PropertyObject for LocalSession {
    fn property(&self, key: PropertyKey) -> Option<PropertyValue> {
        self.props.property(key)
    }
    fn as_editable(&self) -> Option<&dyn EditablePropertyObject> {
        Some(&self.props)
    }
}

impl Session for LocalSession {
    fn id(&self) -> &str {
        &self.id
    }
    fn state(&self) -> State {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
    fn events(&self) -> &SessionEvents {
        &self.events
    }
    fn master_player(&self) -> Option<PlayerRef> {
        self.master.get()
    }
    fn set_master_player(&self, player: Option<PlayerRef>) {
        self.master.set(player);
    }
    fn local_player(&self) -> Option<PlayerRef> {
        self.local.get()
    }
    fn set_local_player(&self, player: Option<PlayerRef>) {
        self.local.set(player);
    }
    fn entities(&self) -> Option<&dyn Entities> {
        Some(&self.roster)
    }
    fn on_select(&self, _previous: Option<SessionRef>) -> HookFuture<'_> {
        async move {
            if self.state().status == Status::Pending {
                self.set_state(State::pending("loading").with_progress(0.5));
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                self.set_state(State::ready("loaded"));
            }
            tracing::info!(session_id = %self.id, "local session selected");
            Ok(())
        }
        .boxed()
    }
    fn on_deselect(&self, _next: Option<SessionRef>) -> HookFuture<'_> {
        async move {
            tracing::info!(session_id = %self.id, "local session deselected");
            Ok(())
        }
        .boxed()
    }
    fn dispose(&self) -> HookFuture<'_> {
        async move {
            if self.disposed.mark() {
                tracing::info!(session_id = %self.id, "local session disposed");
            }
            Ok(())
        }
        .boxed()
    }
}

struct LocalFactory;

impl SessionFactory for LocalFactory {
    fn name(&self) -> &str {
        "local"
    }

    fn try_make_session(&self, name: &str, options: &Options) -> Option<SessionRef> {
        if name != "local" {
            return None;
        }
        let id = option_str(options, "id").unwrap_or_else(|| generate_session_id("local"));
        let title = option_str(options, "title").unwrap_or_else(|| "Home".to_string());
        Some(LocalSession::new(id, &title))
    }
}

// ---------------------------------------------------------------------------
// Loopback session: "networked", every emitted event comes straight back
// ---------------------------------------------------------------------------

struct LoopbackSession {
    id: String,
    props: PropertyBag,
    events: SessionEvents,
    net_events: NetEvents,
    connected: AtomicBool,
    master: PlayerSlot,
    local: PlayerSlot,
    roster: Roster,
    disposed: DisposeFlag,
}

impl LoopbackSession {
    fn new(id: String) -> Arc<Self> {
        let host = DemoPlayer::new(1, "host", false, true, [10.0, 0.0, 10.0]);
        let you = DemoPlayer::new(2, "you", true, false, SPAWN);
        let session = Arc::new(Self {
            id,
            props: PropertyBag::new(),
            events: SessionEvents::default(),
            net_events: NetEvents::default(),
            connected: AtomicBool::new(false),
            master: PlayerSlot::new(),
            local: PlayerSlot::new(),
            roster: Roster(vec![Arc::clone(&host), Arc::clone(&you)]),
            disposed: DisposeFlag::new(),
        });
        session.set_master_player(Some(host));
        session.set_local_player(Some(you));
        session.set_title("Loopback");
        // Leaving a loopback session tears it down.
        session.set_dispose_on_change(true);
        session
    }
}

impl PropertyObject for LoopbackSession {
    fn property(&self, key: PropertyKey) -> Option<PropertyValue> {
        self.props.property(key)
    }
    fn as_editable(&self) -> Option<&dyn EditablePropertyObject> {
        Some(&self.props)
    }
}

impl Session for LoopbackSession {
    fn id(&self) -> &str {
        &self.id
    }
    fn state(&self) -> State {
        if self.connected.load(Ordering::Acquire) {
            State::ready("connected")
        } else {
            State::pending("offline")
        }
    }
    fn events(&self) -> &SessionEvents {
        &self.events
    }
    fn master_player(&self) -> Option<PlayerRef> {
        self.master.get()
    }
    fn set_master_player(&self, player: Option<PlayerRef>) {
        self.master.set(player);
    }
    fn local_player(&self) -> Option<PlayerRef> {
        self.local.get()
    }
    fn set_local_player(&self, player: Option<PlayerRef>) {
        self.local.set(player);
    }
    fn entities(&self) -> Option<&dyn Entities> {
        Some(&self.roster)
    }
    fn on_select(&self, _previous: Option<SessionRef>) -> HookFuture<'_> {
        async move {
            if !self.connected.swap(true, Ordering::AcqRel) {
                self.net_events.connected.emit(&());
                self.events.state_changed.emit(&self.state());
            }
            Ok(())
        }
        .boxed()
    }
    fn on_deselect(&self, _next: Option<SessionRef>) -> HookFuture<'_> {
        async { Ok(()) }.boxed()
    }
    fn dispose(&self) -> HookFuture<'_> {
        async move {
            if self.disposed.mark() && self.connected.swap(false, Ordering::AcqRel) {
                self.net_events.disconnected.emit(&"disposed".to_string());
                tracing::info!(session_id = %self.id, "loopback session disconnected");
            }
            Ok(())
        }
        .boxed()
    }
    fn as_net(&self) -> Option<&dyn NetSession> {
        Some(self)
    }
}

impl NetSession for LoopbackSession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
    fn server_time(&self) -> SystemTime {
        SystemTime::now()
    }
    fn ping_ms(&self) -> Option<u32> {
        self.is_connected().then_some(0)
    }
    fn emit_event(&self, code: i64, raw: Vec<u8>) -> BoxFuture<'_, Result<bool, SessionError>> {
        async move {
            if !self.is_connected() {
                return Err(SessionError::NotConnected(self.id.clone()));
            }
            let event = NetEvent {
                code,
                raw: raw.into(),
                sender: self.local_player(),
            };
            self.net_events.event_received.emit(&event);
            Ok(true)
        }
        .boxed()
    }
    fn net_events(&self) -> &NetEvents {
        &self.net_events
    }
}

struct LoopbackFactory;

impl SessionFactory for LoopbackFactory {
    fn name(&self) -> &str {
        "loopback"
    }

    fn try_make_session(&self, name: &str, options: &Options) -> Option<SessionRef> {
        if name != "loopback" {
            return None;
        }
        let id = option_str(options, "id").unwrap_or_else(|| generate_session_id("loop"));
        let session = LoopbackSession::new(id);
        session.net_events.event_received.subscribe(|event: &NetEvent| {
            println!(
                "  <- event {} ({} bytes): {}",
                event.code,
                event.raw.len(),
                String::from_utf8_lossy(&event.raw)
            );
        });
        Some(session)
    }
}

fn option_str(options: &Options, key: &str) -> Option<String> {
    options.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

// ---------------------------------------------------------------------------
// Terminal
// ---------------------------------------------------------------------------

struct Stdout;

impl CommandOutput for Stdout {
    fn print_line(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Demo-only commands on top of the standard set. Returns `false` when
/// `line` isn't one of them.
async fn run_demo_command(host: &Host, line: &str) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["new", kind, rest @ ..] => {
            let mut options = Options::new();
            if let Some(id) = rest.first() {
                options.insert("id".into(), serde_json::Value::from(*id));
            }
            match host.create_session(kind, &options) {
                Some(session) => println!("created session '{}'", session.id()),
                None => println!("no factory makes '{kind}' sessions (try: local, loopback)"),
            }
        }
        ["emit", code, text @ ..] => {
            let Ok(code) = code.parse::<i64>() else {
                println!("event code must be a number");
                return true;
            };
            let Some(current) = host.registry().current() else {
                println!("no current session");
                return true;
            };
            let Some(net) = current.as_net() else {
                println!("session '{}' is not networked", current.id());
                return true;
            };
            if let Err(e) = net.emit_event(code, text.join(" ").into_bytes()).await {
                println!("emit failed: {e}");
            }
        }
        ["complete", rest @ ..] => {
            for candidate in host.complete(&rest.join(" ")) {
                println!("  {candidate}");
            }
        }
        ["help"] => {
            for (usage, description) in host.commands().help() {
                println!("  {usage:<40} {description}");
            }
            println!("  {:<40} Create a session (local, loopback)", "new <kind> [id]");
            println!("  {:<40} Send an event on the current session", "emit <code> <text>");
            println!("  {:<40} Show completions", "complete <partial>");
            println!("  {:<40} Exit", "quit");
        }
        _ => return false,
    }
    true
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("info,lobby=debug");

    let host = Host::builder()
        .settings_path("lobby-settings.json")
        .factory(Arc::new(LocalFactory))
        .factory(Arc::new(LoopbackFactory))
        .update_rate(20)
        .build()?;

    // Print every registry event as its JSON record.
    let mut events = host.subscribe();
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event.record().to_json() {
                Ok(json) => println!("  * {json}"),
                Err(e) => tracing::warn!(error = %e, "could not encode event"),
            }
        }
    });

    let home = host
        .create_session("local", &Options::new())
        .ok_or("local factory missing")?;
    host.registry().set_current(Some(home.id())).await?;

    println!("lobby ready, type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == "quit" || line == "exit" {
            break;
        }
        if line.is_empty() || run_demo_command(&host, line).await {
            continue;
        }
        if !host.execute(line, &mut Stdout).await {
            println!("unknown command '{line}', type 'help'");
        }
    }

    host.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn start() -> Host {
        Host::builder()
            .factory(Arc::new(LocalFactory))
            .factory(Arc::new(LoopbackFactory))
            .update_rate(0)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_local_session_loads_on_first_select() {
        let host = start().await;
        let session = host.create_session("local", &Options::new()).unwrap();
        assert_eq!(session.state().status, Status::Pending);

        let ready = when_finished(&session);
        host.registry().set_current(Some(session.id())).await.unwrap();

        assert!(ready.await);
        assert_eq!(session.title().await, "Home");
    }

    #[tokio::test]
    async fn test_loopback_echoes_events_when_connected() {
        let host = start().await;
        let mut options = Options::new();
        options.insert("id".into(), "loop".into());
        let session = host.create_session("loopback", &options).unwrap();
        let net = session.as_net().unwrap();

        assert!(matches!(
            net.emit_event(1, b"hi".to_vec()).await,
            Err(SessionError::NotConnected(_))
        ));

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        net.net_events().event_received.subscribe(move |e: &NetEvent| {
            sink.lock().unwrap().push(e.code);
        });
        host.registry().set_current(Some("loop")).await.unwrap();

        assert!(net.emit_event(7, b"hello".to_vec()).await.unwrap());
        assert_eq!(*received.lock().unwrap(), vec![7]);
        assert_eq!(net.ping_ms(), Some(0));
    }

    #[tokio::test]
    async fn test_leaving_loopback_disposes_it() {
        let host = start().await;
        let home = host.create_session("local", &Options::new()).unwrap();
        let mut options = Options::new();
        options.insert("id".into(), "loop".into());
        host.create_session("loopback", &options).unwrap();

        host.registry().set_current(Some("loop")).await.unwrap();
        host.registry().set_current(Some(home.id())).await.unwrap();

        assert!(!host.registry().has("loop"));
        assert_eq!(host.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_demo_commands_create_and_respawn() {
        let host = start().await;
        assert!(run_demo_command(&host, "new local home").await);
        assert!(run_demo_command(&host, "new nothing").await);
        assert!(!run_demo_command(&host, "sessions").await);
        host.registry().set_current(Some("home")).await.unwrap();

        let mut out: Vec<String> = Vec::new();
        assert!(host.execute("respawn", &mut out).await);
        assert_eq!(out, vec!["Respawned you at (0.0, 1.0, 0.0)."]);
    }
}
