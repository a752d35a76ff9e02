//! Integration tests for the host, the update driver and the terminal
//! commands.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use waystone::prelude::*;
use waystone::session::NetEvents;

// =========================================================================
// Test doubles
// =========================================================================

struct TestPlayer {
    id: u64,
    name: &'static str,
    position: Mutex<[f32; 3]>,
    local: bool,
    master: bool,
}

impl TestPlayer {
    fn new(id: u64, name: &'static str, local: bool, master: bool) -> PlayerRef {
        Arc::new(Self {
            id,
            name,
            position: Mutex::new([3.0, 1.5, -2.0]),
            local,
            master,
        })
    }
}

impl Player for TestPlayer {
    fn id(&self) -> PlayerId {
        PlayerId(self.id)
    }
    fn display_name(&self) -> String {
        self.name.to_string()
    }
    fn position(&self) -> [f32; 3] {
        *self.position.lock().unwrap()
    }
    fn is_local(&self) -> bool {
        self.local
    }
    fn is_master(&self) -> bool {
        self.master
    }
    fn respawn(&self) {
        *self.position.lock().unwrap() = [0.0, 0.0, 0.0];
    }
}

struct Roster(Vec<PlayerRef>);

impl Entities for Roster {
    fn players(&self) -> Vec<PlayerRef> {
        self.0.clone()
    }
    fn entities(&self) -> Vec<waystone::session::EntityRef> {
        Vec::new()
    }
}

struct TestSession {
    id: String,
    props: PropertyBag,
    events: SessionEvents,
    master: PlayerSlot,
    local: PlayerSlot,
    roster: Roster,
    updates: AtomicUsize,
    disposals: AtomicUsize,
    /// `Some(ping)` makes this a networked session.
    net: Option<Option<u32>>,
    net_events: NetEvents,
}

impl TestSession {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            props: PropertyBag::new(),
            events: SessionEvents::default(),
            master: PlayerSlot::new(),
            local: PlayerSlot::new(),
            roster: Roster(Vec::new()),
            updates: AtomicUsize::new(0),
            disposals: AtomicUsize::new(0),
            net: None,
            net_events: NetEvents::default(),
        }
    }

    fn networked(mut self, ping: Option<u32>) -> Self {
        self.net = Some(ping);
        self
    }

    fn with_players(mut self, players: Vec<PlayerRef>) -> Self {
        if let Some(local) = players.iter().find(|p| p.is_local()) {
            self.local.set(Some(Arc::clone(local)));
        }
        self.roster = Roster(players);
        self
    }
}

impl PropertyObject for TestSession {
    fn property(&self, key: PropertyKey) -> Option<PropertyValue> {
        self.props.property(key)
    }
    fn as_editable(&self) -> Option<&dyn EditablePropertyObject> {
        Some(&self.props)
    }
}

impl Session for TestSession {
    fn id(&self) -> &str {
        &self.id
    }
    fn state(&self) -> State {
        State::ready("ok")
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
    fn update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
    fn on_select(&self, _previous: Option<SessionRef>) -> HookFuture<'_> {
        async { Ok(()) }.boxed()
    }
    fn on_deselect(&self, _next: Option<SessionRef>) -> HookFuture<'_> {
        async { Ok(()) }.boxed()
    }
    fn dispose(&self) -> HookFuture<'_> {
        self.disposals.fetch_add(1, Ordering::SeqCst);
        async { Ok(()) }.boxed()
    }
    fn as_net(&self) -> Option<&dyn NetSession> {
        self.net.map(|_| self as &dyn NetSession)
    }
}

impl NetSession for TestSession {
    fn is_connected(&self) -> bool {
        true
    }
    fn server_time(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH
    }
    fn ping_ms(&self) -> Option<u32> {
        self.net.flatten()
    }
    fn emit_event(&self, _code: i64, _raw: Vec<u8>) -> BoxFuture<'_, Result<bool, SessionError>> {
        async { Ok(true) }.boxed()
    }
    fn net_events(&self) -> &NetEvents {
        &self.net_events
    }
}

/// Builds `TestSession`s for kind `"test"`, id taken from `options["id"]`.
struct TestFactory;

impl SessionFactory for TestFactory {
    fn name(&self) -> &str {
        "test"
    }
    fn try_make_session(&self, name: &str, options: &Options) -> Option<SessionRef> {
        if name != "test" {
            return None;
        }
        let id = options
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| generate_session_id("test"));
        Some(Arc::new(TestSession::new(&id)))
    }
}

fn registry() -> SessionRegistry {
    SessionRegistry::new(RegistryConfig::default(), Arc::new(NullBus))
}

async fn run(commands: &CommandSet, registry: &SessionRegistry, input: &str) -> (bool, Vec<String>) {
    let mut out: Vec<String> = Vec::new();
    let handled = commands.execute(registry, input, &mut out).await;
    (handled, out)
}

// =========================================================================
// sessions
// =========================================================================

#[tokio::test]
async fn test_sessions_list_empty_reports_none() {
    let commands = CommandSet::standard("");
    let (handled, out) = run(&commands, &registry(), "sessions").await;

    assert!(handled);
    assert_eq!(out, vec!["No sessions."]);
}

#[tokio::test]
async fn test_sessions_list_shows_status_network_and_current() {
    let registry = registry();
    let hub: SessionRef = Arc::new(TestSession::new("hub"));
    hub.set_short_name("Hub");
    registry.add(hub);
    registry.add(Arc::new(TestSession::new("remote").networked(Some(42))));
    registry.set_current(Some("hub")).await.unwrap();

    let commands = CommandSet::standard("");
    let (handled, out) = run(&commands, &registry, "sessions list").await;

    assert!(handled);
    assert_eq!(
        out,
        vec![
            "Sessions (2):",
            "  1. Hub [ready] (current)",
            "  2. remote [ready] connected 42ms",
        ]
    );
}

#[tokio::test]
async fn test_sessions_change_reports_each_outcome() {
    let registry = registry();
    registry.add(Arc::new(TestSession::new("a")));
    registry.add(Arc::new(TestSession::new("b")));
    let commands = CommandSet::standard("");

    let (_, out) = run(&commands, &registry, "sessions change").await;
    assert_eq!(out, vec!["Missing session id.", "Usage: sessions change <id>"]);

    let (_, out) = run(&commands, &registry, "sessions change ghost").await;
    assert_eq!(out, vec!["Session 'ghost' not found."]);

    let (_, out) = run(&commands, &registry, "sessions change a").await;
    assert_eq!(out, vec!["Switched to session 'a'."]);
    assert!(registry.is_current("a"));

    let (_, out) = run(&commands, &registry, "SESSIONS CHANGE a").await;
    assert_eq!(out, vec!["Already in session 'a'."]);
}

#[tokio::test]
async fn test_sessions_leave_defaults_to_current() {
    let registry = registry();
    let session = Arc::new(TestSession::new("a"));
    registry.add(session.clone());
    registry.set_current(Some("a")).await.unwrap();
    let commands = CommandSet::standard("");

    let (_, out) = run(&commands, &registry, "sessions leave").await;

    assert_eq!(out, vec!["Left session 'a'."]);
    assert_eq!(session.disposals.load(Ordering::SeqCst), 1);
    assert!(registry.is_empty());
    assert!(registry.current_id().is_none());

    let (_, out) = run(&commands, &registry, "sessions leave").await;
    assert_eq!(out, vec!["No current session to leave."]);
}

#[tokio::test]
async fn test_sessions_leave_dispose_on_change_disposes_once() {
    let registry = registry();
    let session = Arc::new(TestSession::new("a"));
    assert!(session.set_dispose_on_change(true));
    registry.add(session.clone());
    registry.set_current(Some("a")).await.unwrap();
    let commands = CommandSet::standard("");

    let (_, out) = run(&commands, &registry, "sessions leave").await;

    assert_eq!(out, vec!["Left session 'a'."]);
    assert_eq!(session.disposals.load(Ordering::SeqCst), 1);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_sessions_leave_other_keeps_current() {
    let registry = registry();
    registry.add(Arc::new(TestSession::new("a")));
    registry.add(Arc::new(TestSession::new("b")));
    registry.set_current(Some("a")).await.unwrap();
    let commands = CommandSet::standard("");

    let (_, out) = run(&commands, &registry, "sessions leave b").await;

    assert_eq!(out, vec!["Left session 'b'."]);
    assert!(registry.is_current("a"));
    assert!(!registry.has("b"));
}

#[tokio::test]
async fn test_sessions_unknown_subcommand_prints_usage() {
    let commands = CommandSet::standard("");
    let (handled, out) = run(&commands, &registry(), "sessions frobnicate").await;

    assert!(handled);
    assert_eq!(
        out,
        vec![
            "Unknown subcommand 'frobnicate'.",
            "sessions [list|change <id>|leave [id]]",
        ]
    );
}

#[tokio::test]
async fn test_execute_unrecognised_input_not_handled() {
    let commands = CommandSet::standard("/");
    let registry = registry();

    for input in ["", "   ", "sessions", "/dance", "/players extra"] {
        let (handled, out) = run(&commands, &registry, input).await;
        assert!(!handled, "{input:?} should not be handled");
        assert!(out.is_empty());
    }
    assert!(run(&commands, &registry, "/sessions").await.0);
}

#[test]
fn test_sessions_complete_subcommands_and_ids() {
    let registry = registry();
    registry.add(Arc::new(TestSession::new("lobby")));
    registry.add(Arc::new(TestSession::new("Local-2")));
    registry.add(Arc::new(TestSession::new("remote")));
    let commands = CommandSet::standard("");

    assert_eq!(commands.complete(&registry, "sess"), vec!["sessions"]);
    assert_eq!(
        commands.complete(&registry, "sessions "),
        vec!["sessions list", "sessions change", "sessions leave"]
    );
    assert_eq!(
        commands.complete(&registry, "sessions ch"),
        vec!["sessions change"]
    );
    assert_eq!(
        commands.complete(&registry, "sessions change lo"),
        vec!["sessions change Local-2", "sessions change lobby"]
    );
    assert_eq!(
        commands.complete(&registry, "sessions leave "),
        vec![
            "sessions leave Local-2",
            "sessions leave lobby",
            "sessions leave remote"
        ]
    );
    assert!(commands.complete(&registry, "sessionsx").is_empty());
    assert_eq!(commands.complete(&registry, "p"), vec!["players"]);
}

// =========================================================================
// players / respawn
// =========================================================================

#[tokio::test]
async fn test_players_without_current_session() {
    let commands = CommandSet::standard("");
    let (handled, out) = run(&commands, &registry(), "players").await;

    assert!(handled);
    assert_eq!(out, vec!["No current session."]);
}

#[tokio::test]
async fn test_players_lists_with_markers() {
    let registry = registry();
    registry.add(Arc::new(TestSession::new("a").with_players(vec![
        TestPlayer::new(1, "ada", true, true),
        TestPlayer::new(2, "bo", false, false),
    ])));
    registry.set_current(Some("a")).await.unwrap();
    let commands = CommandSet::standard("");

    let (_, out) = run(&commands, &registry, "players").await;

    assert_eq!(
        out,
        vec![
            "Players (2):",
            "  1. ada (3.0, 1.5, -2.0) [local master]",
            "  2. bo (3.0, 1.5, -2.0)",
        ]
    );
}

#[tokio::test]
async fn test_players_empty_session() {
    let registry = registry();
    registry.add(Arc::new(TestSession::new("a")));
    registry.set_current(Some("a")).await.unwrap();
    let commands = CommandSet::standard("");

    let (_, out) = run(&commands, &registry, "players").await;

    assert_eq!(out, vec!["No players."]);
}

#[tokio::test]
async fn test_respawn_moves_local_player() {
    let registry = registry();
    let commands = CommandSet::standard("");

    let (_, out) = run(&commands, &registry, "respawn").await;
    assert_eq!(out, vec!["No local player to respawn."]);

    registry.add(Arc::new(
        TestSession::new("a").with_players(vec![TestPlayer::new(1, "ada", true, false)]),
    ));
    registry.set_current(Some("a")).await.unwrap();

    let (_, out) = run(&commands, &registry, "respawn").await;
    assert_eq!(out, vec!["Respawned ada at (0.0, 0.0, 0.0)."]);
}

// =========================================================================
// Update driver
// =========================================================================

#[test]
fn test_update_sessions_touches_every_session() {
    let registry = registry();
    let a = Arc::new(TestSession::new("a"));
    let b = Arc::new(TestSession::new("b"));
    registry.add(a.clone());
    registry.add(b.clone());

    assert_eq!(update_sessions(&registry), 2);
    assert_eq!(a.updates.load(Ordering::Relaxed), 1);
    assert_eq!(b.updates.load(Ordering::Relaxed), 1);
}

#[tokio::test(start_paused = true)]
async fn test_update_driver_runs_at_rate_until_stopped() {
    let registry = registry();
    let session = Arc::new(TestSession::new("a"));
    registry.add(session.clone());

    let driver = UpdateDriver::spawn(registry.clone(), UpdateConfig::with_rate(10)).unwrap();
    tokio::time::sleep(Duration::from_millis(1_050)).await;
    let passes = driver.passes();
    driver.stop().await;

    assert!(passes >= 10, "expected at least 10 passes, got {passes}");
    let updates = session.updates.load(Ordering::Relaxed);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(session.updates.load(Ordering::Relaxed), updates);
}

#[tokio::test]
async fn test_update_driver_disabled_at_zero_rate() {
    assert!(UpdateDriver::spawn(registry(), UpdateConfig::with_rate(0)).is_none());
}

// =========================================================================
// Host
// =========================================================================

#[tokio::test]
async fn test_host_creates_sessions_and_runs_commands() {
    let host = Host::builder()
        .factory(Arc::new(TestFactory))
        .command_prefix("/")
        .update_rate(0)
        .build()
        .unwrap();
    let mut events = host.subscribe();

    let mut options = Options::new();
    options.insert("id".into(), "home".into());
    let session = host.create_session("test", &options).unwrap();
    assert_eq!(session.id(), "home");
    assert!(host.create_session("other", &Options::new()).is_none());

    let mut out: Vec<String> = Vec::new();
    assert!(host.execute("/sessions change home", &mut out).await);
    assert_eq!(out, vec!["Switched to session 'home'."]);

    let names: Vec<&str> = std::iter::from_fn(|| events.try_recv())
        .map(|e| e.name())
        .collect();
    assert_eq!(
        names,
        vec!["session_created", "session_added", "session_current_changed"]
    );
    assert!(host.update_passes().is_none());

    host.shutdown().await.unwrap();
}

#[test]
fn test_host_build_outside_runtime_skips_update_driver() {
    let host = Host::builder().update_rate(30).build().unwrap();

    assert!(host.update_passes().is_none());
}

#[tokio::test]
async fn test_host_shutdown_closes_sessions_and_saves_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let host = Host::builder()
        .factory(Arc::new(TestFactory))
        .settings_path(&path)
        .build()
        .unwrap();
    let session = host.create_session("test", &Options::new()).unwrap();
    assert!(session.id().starts_with("test-"));
    session.set_dispose_on_change(true);
    let registry = host.registry().clone();

    RenderEntity::write(host.settings(), 42.0).unwrap();
    assert_eq!(host.render_entity_distance(), 42.0);
    assert_eq!(host.clear_physical_after(), Duration::from_secs(15));

    host.shutdown().await.unwrap();

    assert!(registry.is_empty());
    assert!(registry.factories().is_empty());
    let reloaded = ConfigStore::load(&path).unwrap();
    assert_eq!(RenderEntity::read(&reloaded), 42.0);
}

#[test]
fn test_help_lists_standard_commands() {
    let commands = CommandSet::standard("/");
    let usages: Vec<String> = commands.help().into_iter().map(|(usage, _)| usage).collect();

    assert_eq!(
        usages,
        vec!["/sessions [list|change <id>|leave [id]]", "/players", "/respawn"]
    );
}
