//! Terminal commands over the session registry.
//!
//! Three commands are provided:
//!
//! | Command | Does |
//! |---|---|
//! | `sessions [list\|change <id>\|leave [id]]` | list, switch, or leave sessions |
//! | `players` | list the players of the current session |
//! | `respawn` | respawn the local player of the current session |
//!
//! A [`CommandSet`] routes an input line to the first command that
//! accepts it. Input that no command recognises is reported as not
//! handled (`false`) so the caller can try something else.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use waystone_registry::SessionRegistry;
use waystone_session::{PlayerRef, SessionError, SessionExt, SessionRef};

/// Where command output goes (a terminal, a chat window, a test buffer).
pub trait CommandOutput: Send {
    fn print_line(&mut self, line: &str);
}

impl CommandOutput for Vec<String> {
    fn print_line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// A terminal command.
pub trait Command: Send + Sync {
    /// Name without prefix, e.g. `"sessions"`.
    fn name(&self) -> &'static str;

    /// One-line description for help output.
    fn description(&self) -> &'static str;

    /// Usage string, prefix included.
    fn usage(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.name())
    }

    /// Completions for a partially typed `input`.
    fn complete(&self, registry: &SessionRegistry, prefix: &str, input: &str) -> Vec<String> {
        let _ = registry;
        let full = format!("{prefix}{}", self.name());
        if full.starts_with(&input.to_lowercase()) {
            vec![full]
        } else {
            Vec::new()
        }
    }

    /// Runs `input`. Returns `false` if the input isn't for this command.
    fn execute<'a>(
        &'a self,
        registry: &'a SessionRegistry,
        prefix: &'a str,
        input: &'a str,
        out: &'a mut dyn CommandOutput,
    ) -> BoxFuture<'a, bool>;
}

/// Splits `input` on whitespace and checks that the first word is
/// `prefix + name` (case-insensitive).
fn words<'a>(input: &'a str, prefix: &str, name: &str) -> Option<Vec<&'a str>> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let head = parts.first()?;
    let expected = format!("{prefix}{name}");
    head.eq_ignore_ascii_case(&expected).then_some(parts)
}

async fn display_name(session: &SessionRef) -> String {
    session
        .short_name()
        .await
        .unwrap_or_else(|| session.id().to_string())
}

fn format_position(player: &PlayerRef) -> String {
    let [x, y, z] = player.position();
    format!("({x:.1}, {y:.1}, {z:.1})")
}

// ===========================================================================
// sessions
// ===========================================================================

/// `sessions [list|change <id>|leave [id]]`. No subcommand means `list`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionsCommand;

const SUBCOMMANDS: [&str; 3] = ["list", "change", "leave"];

impl SessionsCommand {
    async fn list(registry: &SessionRegistry, out: &mut dyn CommandOutput) {
        let mut sessions = registry.sessions();
        if sessions.is_empty() {
            out.print_line("No sessions.");
            return;
        }
        sessions.sort_by(|a, b| a.id().cmp(b.id()));
        let current = registry.current_id();

        out.print_line(&format!("Sessions ({}):", sessions.len()));
        for (i, session) in sessions.iter().enumerate() {
            let name = display_name(session).await;
            let status = session.state().status;
            let marker = if current.as_deref() == Some(session.id()) {
                " (current)"
            } else {
                ""
            };

            let line = match session.as_net() {
                Some(net) => {
                    let connection = if net.is_connected() {
                        "connected"
                    } else {
                        "disconnected"
                    };
                    let ping = match net.ping_ms() {
                        Some(ms) if net.is_connected() => format!(" {ms}ms"),
                        _ => String::new(),
                    };
                    format!("  {}. {name} [{status}] {connection}{ping}{marker}", i + 1)
                }
                None => format!("  {}. {name} [{status}]{marker}", i + 1),
            };
            out.print_line(&line);
        }
    }

    async fn change(
        registry: &SessionRegistry,
        prefix: &str,
        id: Option<&str>,
        out: &mut dyn CommandOutput,
    ) {
        let Some(id) = id else {
            out.print_line("Missing session id.");
            out.print_line(&format!("Usage: {prefix}sessions change <id>"));
            return;
        };
        let Some(session) = registry.try_get(id) else {
            out.print_line(&format!("Session '{id}' not found."));
            return;
        };
        let name = display_name(&session).await;
        if registry.is_current(id) {
            out.print_line(&format!("Already in session '{name}'."));
            return;
        }

        match registry.set_current(Some(id)).await {
            Ok(()) => out.print_line(&format!("Switched to session '{name}'.")),
            Err(e) => out.print_line(&format!("Could not switch session: {e}")),
        }
    }

    async fn leave(registry: &SessionRegistry, id: Option<&str>, out: &mut dyn CommandOutput) {
        let id = match id {
            Some(id) => id.to_string(),
            None => match registry.current_id() {
                Some(id) => id,
                None => {
                    out.print_line("No current session to leave.");
                    return;
                }
            },
        };
        let Some(session) = registry.try_get(&id) else {
            out.print_line(&format!("Session '{id}' not found."));
            return;
        };
        let name = display_name(&session).await;

        let result = async {
            if registry.is_current(&id) {
                registry.set_current(None).await?;
            }
            // Dispose-on-change sessions are gone once deselected.
            if registry.has(&id) {
                registry.dispose(&session).await?;
                registry.remove(&id).await?;
            }
            Ok::<(), SessionError>(())
        }
        .await;

        match result {
            Ok(_) => out.print_line(&format!("Left session '{name}'.")),
            Err(e) => out.print_line(&format!("Could not leave session: {e}")),
        }
    }
}

impl Command for SessionsCommand {
    fn name(&self) -> &'static str {
        "sessions"
    }

    fn description(&self) -> &'static str {
        "List, switch, or leave sessions"
    }

    fn usage(&self, prefix: &str) -> String {
        format!("{prefix}sessions [list|change <id>|leave [id]]")
    }

    fn complete(&self, registry: &SessionRegistry, prefix: &str, input: &str) -> Vec<String> {
        let full = format!("{prefix}sessions");
        let lower = input.to_lowercase();
        if full.starts_with(&lower) {
            return vec![full];
        }
        if !lower.starts_with(&full) {
            return Vec::new();
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        if !parts.first().is_some_and(|head| head.eq_ignore_ascii_case(&full)) {
            return Vec::new();
        }
        let typed_space = input.ends_with(char::is_whitespace);
        match (parts.len(), typed_space) {
            // "sessions " → every subcommand
            (1, _) => SUBCOMMANDS.iter().map(|s| format!("{full} {s}")).collect(),
            // "sessions ch" → matching subcommands
            (2, false) => {
                let partial = parts[1].to_lowercase();
                SUBCOMMANDS
                    .iter()
                    .filter(|s| s.starts_with(&partial))
                    .map(|s| format!("{full} {s}"))
                    .collect()
            }
            // "sessions change " or "sessions change lo" → matching ids
            (2, true) | (3, false) => {
                let sub = parts[1].to_lowercase();
                if sub != "change" && sub != "leave" {
                    return Vec::new();
                }
                let partial = parts.get(2).map(|p| p.to_lowercase()).unwrap_or_default();
                let mut ids: Vec<String> = registry
                    .sessions()
                    .iter()
                    .map(|s| s.id().to_string())
                    .filter(|id| id.to_lowercase().starts_with(&partial))
                    .collect();
                ids.sort();
                ids.into_iter().map(|id| format!("{full} {sub} {id}")).collect()
            }
            _ => Vec::new(),
        }
    }

    fn execute<'a>(
        &'a self,
        registry: &'a SessionRegistry,
        prefix: &'a str,
        input: &'a str,
        out: &'a mut dyn CommandOutput,
    ) -> BoxFuture<'a, bool> {
        async move {
            let Some(parts) = words(input, prefix, self.name()) else {
                return false;
            };
            let sub = parts.get(1).map(|s| s.to_lowercase());
            match sub.as_deref() {
                None | Some("list") => Self::list(registry, out).await,
                Some("change") => Self::change(registry, prefix, parts.get(2).copied(), out).await,
                Some("leave") => Self::leave(registry, parts.get(2).copied(), out).await,
                Some(other) => {
                    out.print_line(&format!("Unknown subcommand '{other}'."));
                    out.print_line(&self.usage(prefix));
                }
            }
            true
        }
        .boxed()
    }
}

// ===========================================================================
// players
// ===========================================================================

/// `players`: lists the current session's players.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayersCommand;

impl Command for PlayersCommand {
    fn name(&self) -> &'static str {
        "players"
    }

    fn description(&self) -> &'static str {
        "List the players in the current session"
    }

    fn execute<'a>(
        &'a self,
        registry: &'a SessionRegistry,
        prefix: &'a str,
        input: &'a str,
        out: &'a mut dyn CommandOutput,
    ) -> BoxFuture<'a, bool> {
        async move {
            match words(input, prefix, self.name()) {
                Some(parts) if parts.len() == 1 => {}
                _ => return false,
            }
            let Some(session) = registry.current() else {
                out.print_line("No current session.");
                return true;
            };
            let players = session
                .entities()
                .map(|e| e.players())
                .unwrap_or_default();
            if players.is_empty() {
                out.print_line("No players.");
                return true;
            }

            out.print_line(&format!("Players ({}):", players.len()));
            for (i, player) in players.iter().enumerate() {
                let mut tags = Vec::new();
                if player.is_local() {
                    tags.push("local");
                }
                if player.is_master() {
                    tags.push("master");
                }
                let tags = if tags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", tags.join(" "))
                };
                out.print_line(&format!(
                    "  {}. {} {}{tags}",
                    i + 1,
                    player.display_name(),
                    format_position(player)
                ));
            }
            true
        }
        .boxed()
    }
}

// ===========================================================================
// respawn
// ===========================================================================

/// `respawn`: respawns the current session's local player.
#[derive(Debug, Default, Clone, Copy)]
pub struct RespawnCommand;

impl Command for RespawnCommand {
    fn name(&self) -> &'static str {
        "respawn"
    }

    fn description(&self) -> &'static str {
        "Respawn your player in the current session"
    }

    fn execute<'a>(
        &'a self,
        registry: &'a SessionRegistry,
        prefix: &'a str,
        input: &'a str,
        out: &'a mut dyn CommandOutput,
    ) -> BoxFuture<'a, bool> {
        async move {
            match words(input, prefix, self.name()) {
                Some(parts) if parts.len() == 1 => {}
                _ => return false,
            }
            let Some(player) = registry.current().and_then(|s| s.local_player()) else {
                out.print_line("No local player to respawn.");
                return true;
            };
            player.respawn();
            out.print_line(&format!(
                "Respawned {} at {}.",
                player.display_name(),
                format_position(&player)
            ));
            true
        }
        .boxed()
    }
}

// ===========================================================================
// Command set
// ===========================================================================

/// An ordered set of commands sharing one prefix (e.g. `"/"`).
pub struct CommandSet {
    prefix: String,
    commands: Vec<Box<dyn Command>>,
}

impl CommandSet {
    /// An empty set.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: Vec::new(),
        }
    }

    /// `sessions`, `players` and `respawn`.
    pub fn standard(prefix: impl Into<String>) -> Self {
        Self::new(prefix)
            .with(SessionsCommand)
            .with(PlayersCommand)
            .with(RespawnCommand)
    }

    pub fn with(mut self, command: impl Command + 'static) -> Self {
        self.commands.push(Box::new(command));
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `(usage, description)` for each command, in order.
    pub fn help(&self) -> Vec<(String, &'static str)> {
        self.commands
            .iter()
            .map(|c| (c.usage(&self.prefix), c.description()))
            .collect()
    }

    /// Runs `input` with the first command that accepts it. Returns
    /// `false` if none did.
    pub async fn execute(
        &self,
        registry: &SessionRegistry,
        input: &str,
        out: &mut dyn CommandOutput,
    ) -> bool {
        let input = input.trim();
        if input.is_empty() {
            return false;
        }
        for command in &self.commands {
            if command.execute(registry, &self.prefix, input, out).await {
                tracing::debug!(command = command.name(), "command executed");
                return true;
            }
        }
        false
    }

    /// Completions from every command for a partially typed `input`.
    pub fn complete(&self, registry: &SessionRegistry, input: &str) -> Vec<String> {
        self.commands
            .iter()
            .flat_map(|c| c.complete(registry, &self.prefix, input))
            .collect()
    }
}

impl std::fmt::Debug for CommandSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.commands.iter().map(|c| c.name()).collect();
        f.debug_struct("CommandSet")
            .field("prefix", &self.prefix)
            .field("commands", &names)
            .finish()
    }
}
