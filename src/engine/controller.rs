// ABOUTME: Controller driving the initial pass and the notification event loop
// ABOUTME: Renders, diffs, writes, and actions templates strictly in configured order

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::cache::RenderCache;
use super::error::{EngineError, Result};
use super::result::{ApplyOutcome, BatchReport, EngineState};
use super::scheduler::SplayScheduler;
use crate::action::{ActionRunner, ShellRunner};
use crate::notify::{NotificationSource, NotifyError, Subscription, DEFAULT_CHANNEL};
use crate::output::{FileWriter, OutputWriter};
use crate::template::{CompiledTemplate, TemplateSet};

pub struct Controller {
    templates: Arc<TemplateSet>,
    source: Arc<dyn NotificationSource>,
    writer: Arc<dyn OutputWriter>,
    runner: Arc<dyn ActionRunner>,
    cache: Arc<RenderCache>,
    splay: SplayScheduler,
    channel: String,
    state: EngineState,
}

impl Controller {
    /// Controller with file output, shell actions, the default channel, and no splay
    pub fn new(templates: TemplateSet, source: Arc<dyn NotificationSource>) -> Self {
        Self {
            templates: Arc::new(templates),
            source,
            writer: Arc::new(FileWriter::new()),
            runner: Arc::new(ShellRunner::new()),
            cache: Arc::new(RenderCache::new()),
            splay: SplayScheduler::default(),
            channel: DEFAULT_CHANNEL.to_string(),
            state: EngineState::Initializing,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_splay(mut self, max: Duration) -> Self {
        self.splay = SplayScheduler::new(max);
        self
    }

    pub fn with_writer(mut self, writer: Arc<dyn OutputWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_action_runner(mut self, runner: Arc<dyn ActionRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn cache(&self) -> Arc<RenderCache> {
        Arc::clone(&self.cache)
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Run until the notification source fails. Only returns with an error:
    /// an initial pass failure, a subscribe failure, or a terminal
    /// subscription error.
    #[instrument(skip(self), fields(channel = %self.channel, templates = self.templates.len()))]
    pub async fn run(&mut self) -> Result<()> {
        self.state = EngineState::Initializing;

        if let Err(e) = self.initial_pass().await {
            error!(error = %e, "initial render pass failed");
            self.state = EngineState::Terminated;
            return Err(e);
        }

        let subscription = match self.subscribe().await {
            Ok(subscription) => subscription,
            Err(e) => {
                self.state = EngineState::Terminated;
                return Err(e);
            }
        };

        self.state = EngineState::Steady;
        info!("listening for change notifications");

        let err = self.event_loop(subscription).await;
        self.state = EngineState::Terminated;
        error!(error = %err, "fatal error encountered in subscription");
        Err(err)
    }

    /// Subscribe off the async workers; the Redis handshake blocks until
    /// the server acknowledges the channel.
    async fn subscribe(&self) -> Result<Subscription> {
        let source = Arc::clone(&self.source);
        let channel = self.channel.clone();

        tokio::task::spawn_blocking(move || {
            source
                .subscribe(&channel)
                .map_err(|source| EngineError::BusConnection { channel, source })
        })
        .await?
    }

    async fn event_loop(&self, subscription: Subscription) -> EngineError {
        let Subscription {
            mut notifications,
            mut terminal,
        } = subscription;

        loop {
            tokio::select! {
                // Queued notifications are handled before a terminal error
                biased;

                Some(notification) = notifications.recv() => {
                    debug!(channel = %notification.channel, "notification received");
                    self.process_batch().await;
                }
                result = &mut terminal => {
                    let cause = result.unwrap_or(NotifyError::Closed);
                    return EngineError::Subscription(cause);
                }
            }
        }
    }

    /// Apply every template unconditionally; the first failure aborts the pass
    pub async fn initial_pass(&self) -> Result<()> {
        let start = Instant::now();
        info!("performing initial render of {} templates", self.templates.len());

        for template in self.templates.templates() {
            let outcome = self.apply(template).await?;
            debug!(template = %template.id(), outcome = ?outcome, "initial apply");
        }

        info!("initial render completed in {:?}", start.elapsed());
        Ok(())
    }

    /// Handle one notification: splay once, then process every template in
    /// order. A failing template is logged and skipped; its siblings still run.
    pub async fn process_batch(&self) -> BatchReport {
        let mut report = BatchReport {
            splay: self.splay.wait().await,
            ..BatchReport::default()
        };

        let start = Instant::now();

        for template in self.templates.templates() {
            let outcome = self.apply(template).await;
            if let Err(ref e) = outcome {
                error!(template = %template.id(), error = %e, "failed to apply template");
            }
            report.record(template.id(), outcome);
        }

        if report.is_success() {
            info!(
                applied = report.applied.len(),
                unchanged = report.unchanged.len(),
                "templates reloaded in {:?}",
                start.elapsed()
            );
        } else {
            warn!(
                applied = report.applied.len(),
                unchanged = report.unchanged.len(),
                failed = report.failed.len(),
                "templates reloaded with failures in {:?}",
                start.elapsed()
            );
        }

        report
    }

    /// Render, compare, write, and action a single template. The cache is
    /// only updated once both the write and the action succeeded, so a
    /// failure is retried on the next notification.
    async fn apply(&self, template: &CompiledTemplate) -> Result<ApplyOutcome> {
        let id = template.id();
        debug!(template = %id, "executing template");

        let output = self.render(template).await?;

        if !self.cache.changed(id, &output).await {
            debug!(template = %id, "output unchanged");
            return Ok(ApplyOutcome::Unchanged);
        }

        if let Some(target) = template.target() {
            self.writer
                .write(target, &output)
                .await
                .map_err(|source| EngineError::Write {
                    template: id.to_string(),
                    source,
                })?;
        }

        self.runner
            .run(id, template.action())
            .await
            .map_err(|source| EngineError::Action {
                template: id.to_string(),
                source,
            })?;

        self.cache.commit(id, output).await;
        info!(template = %id, "template applied");
        Ok(ApplyOutcome::Applied)
    }

    /// Store lookups are synchronous, so rendering runs on the blocking pool
    async fn render(&self, template: &CompiledTemplate) -> Result<String> {
        let templates = Arc::clone(&self.templates);
        let template = template.clone();

        tokio::task::spawn_blocking(move || {
            templates
                .render(&template)
                .map_err(|source| EngineError::Render {
                    template: template.id().to_string(),
                    source,
                })
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionError};
    use crate::notify::MemoryBus;
    use crate::output::OutputError;
    use crate::parser::TemplateSpec;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Records every write and action instead of touching the system
    #[derive(Default)]
    struct Recorder {
        writes: Mutex<Vec<(PathBuf, String)>>,
        actions: Mutex<Vec<String>>,
        fail_writes: Mutex<bool>,
    }

    #[async_trait]
    impl OutputWriter for Recorder {
        async fn write(&self, target: &Path, content: &str) -> crate::output::error::Result<()> {
            if *self.fail_writes.lock().unwrap() {
                return Err(OutputError::Write {
                    path: target.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                });
            }
            self.writes
                .lock()
                .unwrap()
                .push((target.to_path_buf(), content.to_string()));
            Ok(())
        }
    }

    #[async_trait]
    impl ActionRunner for Recorder {
        async fn run(&self, template: &str, action: &Action) -> crate::action::error::Result<()> {
            if let Action::Shell(cmd) = action {
                if cmd == "fail" {
                    return Err(ActionError::ExitStatus {
                        command: cmd.clone(),
                        code: Some(1),
                    });
                }
            }
            self.actions.lock().unwrap().push(template.to_string());
            Ok(())
        }
    }

    fn controller(
        store: Arc<MemoryStore>,
        templates: Vec<(&str, &str, &str, &'static str)>,
        recorder: Arc<Recorder>,
    ) -> Controller {
        let sources = templates.into_iter().map(|(source, target, action, body)| {
            let spec = TemplateSpec {
                source: source.to_string(),
                target: target.to_string(),
                action: action.to_string(),
            };
            let action = spec.to_action();
            (spec, body, action)
        });
        let set = TemplateSet::from_sources(sources, store).unwrap();

        Controller::new(set, Arc::new(MemoryBus::new()))
            .with_writer(recorder.clone())
            .with_action_runner(recorder)
    }

    #[tokio::test]
    async fn test_initial_pass_applies_everything() {
        let store = Arc::new(MemoryStore::new().with_value("foo", "x"));
        let recorder = Arc::new(Recorder::default());
        let controller = controller(
            store,
            vec![
                ("a", "a.out", "reload-a", "{{key \"foo\"}}"),
                ("b", "", "", "static"),
            ],
            recorder.clone(),
        );

        controller.initial_pass().await.unwrap();

        assert_eq!(recorder.writes.lock().unwrap().len(), 1);
        assert_eq!(*recorder.actions.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(controller.cache().get("b").await.as_deref(), Some("static"));
    }

    #[tokio::test]
    async fn test_initial_pass_aborts_on_render_error() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let controller = controller(
            store,
            vec![
                ("a", "", "", "{{key \"missing\"}}"),
                ("b", "", "", "static"),
            ],
            recorder.clone(),
        );

        let err = controller.initial_pass().await.unwrap_err();
        assert!(matches!(err, EngineError::Render { ref template, .. } if template == "a"));
        assert!(recorder.actions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_output_is_skipped() {
        let store = Arc::new(MemoryStore::new().with_value("foo", "x"));
        let recorder = Arc::new(Recorder::default());
        let controller = controller(
            store,
            vec![("a", "a.out", "", "{{key \"foo\"}}")],
            recorder.clone(),
        );

        controller.initial_pass().await.unwrap();
        let report = controller.process_batch().await;

        assert_eq!(report.unchanged, vec!["a"]);
        assert!(report.applied.is_empty());
        assert_eq!(recorder.writes.lock().unwrap().len(), 1);
        assert_eq!(recorder.actions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_render_failure_does_not_block_siblings() {
        let store = Arc::new(MemoryStore::new().with_value("foo", "x"));
        let recorder = Arc::new(Recorder::default());
        let controller = controller(
            store.clone(),
            vec![
                ("a", "", "", "{{key \"foo\"}}"),
                ("b", "", "", "{{keyOrDefault \"foo\" \"none\"}}"),
            ],
            recorder.clone(),
        );

        controller.initial_pass().await.unwrap();
        store.remove("foo");

        let report = controller.process_batch().await;
        assert_eq!(report.failed_templates(), vec!["a"]);
        assert_eq!(report.applied, vec!["b"]);
        assert_eq!(controller.cache().get("a").await.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_write_failure_leaves_cache_stale() {
        let store = Arc::new(MemoryStore::new().with_value("foo", "1"));
        let recorder = Arc::new(Recorder::default());
        let controller = controller(
            store.clone(),
            vec![("a", "a.out", "reload", "{{key \"foo\"}}")],
            recorder.clone(),
        );

        controller.initial_pass().await.unwrap();
        store.set("foo", "2");
        *recorder.fail_writes.lock().unwrap() = true;

        let report = controller.process_batch().await;
        assert_eq!(report.failed_templates(), vec!["a"]);
        assert_eq!(controller.cache().get("a").await.as_deref(), Some("1"));
        assert_eq!(recorder.actions.lock().unwrap().len(), 1);

        *recorder.fail_writes.lock().unwrap() = false;
        let report = controller.process_batch().await;
        assert_eq!(report.applied, vec!["a"]);
        assert_eq!(controller.cache().get("a").await.as_deref(), Some("2"));
        assert_eq!(recorder.actions.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_action_failure_is_retried_with_identical_output() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let controller = controller(
            store,
            vec![("a", "a.out", "fail", "static")],
            recorder.clone(),
        );

        assert!(matches!(
            controller.initial_pass().await,
            Err(EngineError::Action { .. })
        ));
        assert!(controller.cache().is_empty().await);

        // Same output, still treated as changed because nothing was committed
        let report = controller.process_batch().await;
        assert_eq!(report.failed_templates(), vec!["a"]);
        assert_eq!(recorder.writes.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_identity_skips_already_applied_output() {
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let controller = controller(
            store,
            vec![
                ("a", "first.out", "", "static"),
                ("a", "second.out", "", "static"),
            ],
            recorder.clone(),
        );

        controller.initial_pass().await.unwrap();

        let writes = recorder.writes.lock().unwrap().clone();
        assert_eq!(writes, vec![(PathBuf::from("first.out"), "static".to_string())]);
        assert_eq!(*recorder.actions.lock().unwrap(), vec!["a"]);
    }

    struct RefusingSource;

    impl NotificationSource for RefusingSource {
        fn subscribe(&self, _channel: &str) -> crate::notify::error::Result<Subscription> {
            Err(NotifyError::Disconnected {
                reason: "connection refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_subscribe_failure_is_bus_connection_error() {
        let store = Arc::new(MemoryStore::new());
        let set = TemplateSet::from_sources(
            vec![(TemplateSpec::parse("a:").unwrap(), "static", Action::None)],
            store,
        )
        .unwrap();

        let mut controller = Controller::new(set, Arc::new(RefusingSource)).with_channel("updates");
        let err = controller.run().await.unwrap_err();

        assert!(matches!(err, EngineError::BusConnection { ref channel, .. } if channel == "updates"));
        assert_eq!(controller.state(), EngineState::Terminated);
        assert_eq!(controller.cache().get("a").await.as_deref(), Some("static"));
    }

    #[tokio::test]
    async fn test_run_terminates_on_subscription_error() {
        let store = Arc::new(MemoryStore::new());
        let bus = Arc::new(MemoryBus::new());
        let set = TemplateSet::from_sources(
            vec![(
                TemplateSpec::parse("a:").unwrap(),
                "static",
                Action::None,
            )],
            store,
        )
        .unwrap();

        let mut controller = Controller::new(set, bus.clone()).with_channel("updates");
        assert_eq!(controller.state(), EngineState::Initializing);

        let handle = tokio::spawn(async move {
            let result = controller.run().await;
            (result, controller.state())
        });

        while bus.subscriber_count("updates") == 0 {
            tokio::task::yield_now().await;
        }
        bus.disconnect("updates", "connection reset by peer");

        let (result, state) = handle.await.unwrap();
        assert!(matches!(result, Err(EngineError::Subscription(_))));
        assert_eq!(state, EngineState::Terminated);
    }
}
