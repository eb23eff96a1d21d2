//! Keeps compiled `.csf` targets in sync with their live-edited sources.
//!
//! Every installed rule owns one filesystem subscription on the source's
//! parent directory and one worker task. The notification callback only
//! performs a non-blocking `try_send` into a channel of capacity one, so a
//! burst of writes while a recompile is running collapses into a single
//! pending re-run.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{AccessKind, AccessMode, ModifyKind, RenameMode},
};
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
};
use tracing::{debug, error, info, warn};

use crate::{
    codec::{read_table_with, table_to_bytes},
    error::Error,
    formats::{CsfOptions, FormatType},
    watch::config::{WatchRule, parse_config},
};

/// Produces the bytes written to a rule's target.
pub trait Compiler: Send + Sync {
    fn compile(&self, source: &Path) -> Result<Vec<u8>, Error>;
}

/// Loads the source in whatever format its extension names and encodes it
/// as a binary string table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsfCompiler {
    pub options: CsfOptions,
}

impl CsfCompiler {
    pub fn new(options: CsfOptions) -> Self {
        Self { options }
    }
}

impl Compiler for CsfCompiler {
    fn compile(&self, source: &Path) -> Result<Vec<u8>, Error> {
        let table = read_table_with(source, &self.options)?;
        table_to_bytes(&table, FormatType::Csf, &self.options)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
pub struct RecompileFailure {
    pub attempts: u32,
    pub error: Error,
}

async fn compile_once(rule: &WatchRule, compiler: &Arc<dyn Compiler>) -> Result<(), Error> {
    let job = rule.clone();
    let compiler = Arc::clone(compiler);
    tokio::task::spawn_blocking(move || {
        let bytes = compiler.compile(&job.source)?;
        std::fs::write(&job.target, bytes)?;
        Ok::<_, Error>(())
    })
    .await
    .unwrap_or_else(|e| Err(Error::Internal(format!("recompile task failed: {e}"))))
}

/// Compiles `rule.source` and replaces `rule.target`, retrying recoverable
/// failures according to `policy`. Returns the number of attempts made.
///
/// Compiling and writing run on the blocking pool. The target is only touched
/// once the whole image has been produced.
pub async fn recompile(
    rule: &WatchRule,
    compiler: &Arc<dyn Compiler>,
    policy: &RetryPolicy,
) -> Result<u32, RecompileFailure> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match compile_once(rule, compiler).await {
            Ok(()) => return Ok(attempt),
            Err(e) if e.is_recoverable() && attempt < max_attempts => {
                warn!(%rule, attempt, error = %e, "recompile failed, retrying");
                tokio::time::sleep(policy.delay).await;
            }
            Err(error) => {
                return Err(RecompileFailure {
                    attempts: attempt,
                    error,
                });
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleState {
    Idle,
    Watching,
    Recomputing,
    /// The last event exhausted its retries. The rule still watches.
    Failed,
}

/// Outcome of handling one change event.
#[derive(Debug)]
pub enum WatchReport {
    Compiled {
        rule: WatchRule,
        attempts: u32,
    },
    Failed {
        rule: WatchRule,
        attempts: u32,
        error: Error,
    },
}

struct ActiveRule {
    rule: WatchRule,
    source: PathBuf,
    trigger: mpsc::Sender<()>,
    state: watch::Receiver<RuleState>,
    _watcher: RecommendedWatcher,
}

/// Owns the installed watch rules.
///
/// Must be created inside a tokio runtime; worker tasks are spawned on it.
pub struct WatchSyncManager {
    compiler: Arc<dyn Compiler>,
    policy: RetryPolicy,
    runtime: Handle,
    reports: mpsc::UnboundedSender<WatchReport>,
    rules: Vec<ActiveRule>,
}

fn is_last_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(
                ModifyKind::Any
                    | ModifyKind::Data(_)
                    | ModifyKind::Metadata(_)
                    | ModifyKind::Name(RenameMode::To | RenameMode::Both)
            )
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

async fn run_worker(
    rule: WatchRule,
    mut events: mpsc::Receiver<()>,
    compiler: Arc<dyn Compiler>,
    policy: RetryPolicy,
    state: watch::Sender<RuleState>,
    reports: mpsc::UnboundedSender<WatchReport>,
) {
    while events.recv().await.is_some() {
        // The rule was removed while this event was pending.
        if state.is_closed() {
            break;
        }
        state.send_replace(RuleState::Recomputing);
        let report = match recompile(&rule, &compiler, &policy).await {
            Ok(attempts) => {
                info!(%rule, attempts, "compiled");
                state.send_replace(RuleState::Watching);
                WatchReport::Compiled {
                    rule: rule.clone(),
                    attempts,
                }
            }
            Err(RecompileFailure { attempts, error }) => {
                error!(%rule, attempts, error = %error, "giving up on this change");
                state.send_replace(RuleState::Failed);
                WatchReport::Failed {
                    rule: rule.clone(),
                    attempts,
                    error,
                }
            }
        };
        let _ = reports.send(report);
    }
    debug!(%rule, "watch worker stopped");
}

impl WatchSyncManager {
    pub fn new(
        compiler: Arc<dyn Compiler>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<WatchReport>), Error> {
        let runtime = Handle::try_current()
            .map_err(|_| Error::Precondition("watch mode requires a tokio runtime".to_string()))?;
        let (reports, receiver) = mpsc::unbounded_channel();
        let manager = Self {
            compiler,
            policy: RetryPolicy::default(),
            runtime,
            reports,
            rules: Vec::new(),
        };
        Ok((manager, receiver))
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces every installed rule with the rules in `text`.
    ///
    /// Old rules are disposed first. If the text is malformed or any rule
    /// cannot be installed, no rule is left installed.
    pub fn reconfigure(&mut self, text: &str) -> Result<usize, Error> {
        self.clear();
        let rules = parse_config(text)?;
        for rule in rules {
            if let Err(e) = self.install(rule) {
                self.clear();
                return Err(e);
            }
        }
        info!(rules = self.rules.len(), "watch rules installed");
        Ok(self.rules.len())
    }

    /// Subscribes to writes of `rule.source` and starts its worker.
    pub fn install(&mut self, rule: WatchRule) -> Result<(), Error> {
        let source = std::path::absolute(&rule.source)?;
        let target = std::path::absolute(&rule.target)?;
        let (Some(parent), Some(file_name)) = (source.parent(), source.file_name()) else {
            return Err(Error::validation_error(format!(
                "Watch source \"{}\" does not name a file.",
                rule.source.display()
            )));
        };

        let (trigger, events) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(RuleState::Idle);

        let file_name = file_name.to_owned();
        let callback_trigger = trigger.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event)
                if is_last_write(&event.kind)
                    && event
                        .paths
                        .iter()
                        .any(|path| path.file_name() == Some(file_name.as_os_str())) =>
            {
                let _ = callback_trigger.try_send(());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "watch notification error"),
        })?;
        watcher.watch(parent, RecursiveMode::NonRecursive)?;
        state_tx.send_replace(RuleState::Watching);

        let resolved = WatchRule::new(source.clone(), target);
        self.runtime.spawn(run_worker(
            resolved,
            events,
            Arc::clone(&self.compiler),
            self.policy,
            state_tx,
            self.reports.clone(),
        ));

        debug!(%rule, "watching");
        self.rules.push(ActiveRule {
            rule,
            source,
            trigger,
            state: state_rx,
            _watcher: watcher,
        });
        Ok(())
    }

    /// Unsubscribes every rule. Recompiles already in progress finish.
    pub fn clear(&mut self) {
        if !self.rules.is_empty() {
            debug!(rules = self.rules.len(), "disposing watch rules");
        }
        self.rules.clear();
    }

    pub fn rules(&self) -> impl Iterator<Item = &WatchRule> {
        self.rules.iter().map(|active| &active.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn matching<'a>(&'a self, source: &Path) -> impl Iterator<Item = &'a ActiveRule> {
        let source = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
        self.rules
            .iter()
            .filter(move |active| active.source == source)
    }

    /// Signals a change of `source` as if the filesystem had reported one.
    /// Returns `false` if no rule watches it.
    pub fn notify_changed(&self, source: &Path) -> bool {
        let mut found = false;
        for active in self.matching(source) {
            found = true;
            // A full channel already holds a pending re-run.
            let _ = active.trigger.try_send(());
        }
        found
    }

    /// Current state of the first rule watching `source`.
    pub fn state(&self, source: &Path) -> Option<RuleState> {
        self.matching(source).next().map(|active| *active.state.borrow())
    }

    /// A receiver that observes state changes of the first rule watching
    /// `source`.
    pub fn subscribe_state(&self, source: &Path) -> Option<watch::Receiver<RuleState>> {
        self.matching(source).next().map(|active| active.state.clone())
    }
}
