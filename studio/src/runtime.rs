//! Studio runtime
//!
//! Executes the effects the workflow asks for and feeds the results back in.
//! All state changes happen on the task that owns `Studio`; spawned work
//! (HTTP calls, channel connects, the editing timer) only ever reports back
//! through the signal queue.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{AgentApi, ExecutionRequest};
use crate::channel::{ChannelHandle, ChannelKind, CloseMode, ConnectionOwner, PushConnector};
use crate::domain::GalleryError;
use crate::notify::{Notification, NotificationSink};
use crate::workflow::{Effect, Input, Phase, Workflow};

/// How long an exiting process waits for cancel frames to go out
pub const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Everything that can arrive on the runtime's queue
#[derive(Debug)]
pub enum Signal {
    Input(Input),
    /// A channel finished connecting; its handle awaits installation
    ChannelOpened { epoch: u64, handle: ChannelHandle },
}

/// Owns the workflow and everything with a lifetime: channels, timers and
/// in-flight requests
pub struct Studio {
    workflow: Workflow,
    api: Arc<dyn AgentApi>,
    connector: Arc<dyn PushConnector>,
    owner: ConnectionOwner,
    sink: Arc<dyn NotificationSink>,
    tx: mpsc::UnboundedSender<Signal>,
    rx: mpsc::UnboundedReceiver<Signal>,
    timer: Option<JoinHandle<()>>,
    /// Reader tasks of cancelled channels still sending their close frames
    closing: Vec<JoinHandle<()>>,
}

impl Studio {
    pub fn new(
        workflow: Workflow,
        api: Arc<dyn AgentApi>,
        connector: Arc<dyn PushConnector>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        debug!("Studio::new: called");
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            workflow,
            api,
            connector,
            owner: ConnectionOwner::new(),
            sink,
            tx,
            rx,
            timer: None,
            closing: Vec::new(),
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn api(&self) -> Arc<dyn AgentApi> {
        self.api.clone()
    }

    /// Kind of the channel currently streaming, if any
    pub fn live_channel(&self) -> Option<ChannelKind> {
        self.owner.live_kind()
    }

    pub fn add_image(&mut self, path: impl Into<PathBuf>) -> Result<(), GalleryError> {
        self.workflow.add_image(path).map(|_| ())
    }

    pub fn remove_last_image(&mut self) -> bool {
        self.workflow.pop_image().is_some()
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.workflow.set_prompt(prompt);
    }

    /// Start the agent; validation failures are reported to the sink
    pub fn start(&mut self) -> bool {
        debug!("Studio::start: called");
        match self.workflow.begin_planning() {
            Ok(effects) => {
                self.execute(effects);
                true
            }
            Err(e) => {
                info!(error = %e, "start rejected");
                self.sink.notify(&Notification::error(e.to_string()));
                false
            }
        }
    }

    /// Abandon the current attempt and return to idle
    pub fn reset(&mut self) {
        debug!(phase = %self.workflow.phase(), "Studio::reset: called");
        let effects = self.workflow.reset();
        self.execute(effects);
    }

    /// Reset, then wait up to `grace` for cancelled channels to tell the
    /// backend; used before the process exits
    pub async fn shutdown(&mut self, grace: Duration) {
        debug!(?grace, "Studio::shutdown: called");
        self.reset();
        let closing = std::mem::take(&mut self.closing);
        if closing.is_empty() {
            return;
        }
        if tokio::time::timeout(grace, futures::future::join_all(closing)).await.is_err() {
            warn!(?grace, "channels did not finish closing before exit");
        }
    }

    pub fn request_view(&mut self, phase: Phase) -> bool {
        self.workflow.request_view(phase)
    }

    pub fn clear_view(&mut self) {
        self.workflow.clear_view();
    }

    /// Wait for the next signal from spawned work
    pub async fn next_signal(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }

    /// Apply one signal to the workflow and execute the resulting effects
    pub fn dispatch(&mut self, signal: Signal) {
        match signal {
            Signal::ChannelOpened { epoch, handle } => self.on_channel_opened(epoch, handle),
            Signal::Input(input) => {
                if let Some(kind) = input.channel() {
                    if !self.owner.accepts(kind) {
                        debug!(%kind, "Studio::dispatch: dropping input from retired channel");
                        return;
                    }
                }
                let effects = self.workflow.apply(input);
                self.execute(effects);
            }
        }
    }

    /// Process signals until nothing is in flight
    pub async fn run_until_settled(&mut self) {
        debug!("Studio::run_until_settled: called");
        while !self.workflow.is_settled() {
            match self.rx.recv().await {
                Some(signal) => self.dispatch(signal),
                None => break,
            }
        }
        debug!(phase = %self.workflow.phase(), "Studio::run_until_settled: settled");
    }

    fn on_channel_opened(&mut self, epoch: u64, handle: ChannelHandle) {
        let kind = handle.kind();
        debug!(%kind, epoch, "Studio::on_channel_opened: called");
        if epoch != self.workflow.epoch() {
            info!(%kind, epoch, "channel opened after reset, cancelling");
            let reader = handle.close(CloseMode::Cancel);
            self.track_closing(reader);
            return;
        }
        if !self.owner.accepts(kind) {
            debug!(%kind, "channel already retired, closing");
            let _ = handle.close(CloseMode::Retire);
            return;
        }
        if let Err(e) = self.owner.install(handle) {
            let effects = self.workflow.apply(Input::ChannelFailed {
                epoch,
                kind,
                reason: e.to_string(),
            });
            self.execute(effects);
        }
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify(notification) => self.sink.notify(&notification),
                Effect::StartPlanning { epoch, images, prompt } => self.spawn_planning(epoch, images, prompt),
                Effect::OpenChannel { epoch, kind, url } => self.spawn_connect(epoch, kind, url),
                Effect::ScheduleEditing { epoch, delay } => self.schedule_editing(epoch, delay),
                Effect::StartExecution { epoch, request } => {
                    // The planning stream is finished; close it before asking for the next one
                    self.owner.retire(ChannelKind::Planning);
                    self.spawn_execution(epoch, request);
                }
                Effect::CloseChannels => {
                    if let Some(timer) = self.timer.take() {
                        timer.abort();
                    }
                    let reader = self.owner.close_all();
                    self.track_closing(reader);
                }
            }
        }
    }

    fn track_closing(&mut self, reader: Option<JoinHandle<()>>) {
        self.closing.retain(|t| !t.is_finished());
        self.closing.extend(reader);
    }

    fn spawn_planning(&self, epoch: u64, images: Vec<PathBuf>, prompt: String) {
        debug!(epoch, images = images.len(), "Studio::spawn_planning: called");
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let input = match api.start_planning(&images, &prompt).await {
                Ok(session) => Input::PlanningSessionStarted {
                    epoch,
                    session_id: session.session_id,
                    websocket_url: session.websocket_url,
                },
                Err(e) => {
                    warn!(error = %e, "failed to start planning session");
                    Input::StartFailed {
                        epoch,
                        kind: ChannelKind::Planning,
                        reason: e.user_message(),
                    }
                }
            };
            send(&tx, Signal::Input(input));
        });
    }

    fn spawn_execution(&self, epoch: u64, request: ExecutionRequest) {
        debug!(epoch, "Studio::spawn_execution: called");
        let api = self.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let input = match api.start_execution(&request).await {
                Ok(session) => Input::ExecutionSessionStarted {
                    epoch,
                    websocket_url: session.websocket_url,
                },
                Err(e) => {
                    warn!(error = %e, "failed to start execution session");
                    Input::StartFailed {
                        epoch,
                        kind: ChannelKind::Execution,
                        reason: e.user_message(),
                    }
                }
            };
            send(&tx, Signal::Input(input));
        });
    }

    fn spawn_connect(&self, epoch: u64, kind: ChannelKind, url: String) {
        debug!(epoch, %kind, %url, "Studio::spawn_connect: called");
        let connector = self.connector.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let signal = match connector.connect(kind, &url, epoch, tx.clone()).await {
                Ok(handle) => Signal::ChannelOpened { epoch, handle },
                Err(e) => {
                    warn!(%kind, error = %e, "failed to open channel");
                    Signal::Input(Input::ChannelFailed {
                        epoch,
                        kind,
                        reason: e.to_string(),
                    })
                }
            };
            send(&tx, signal);
        });
    }

    fn schedule_editing(&mut self, epoch: u64, delay: Duration) {
        debug!(epoch, ?delay, "Studio::schedule_editing: called");
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        let tx = self.tx.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            send(&tx, Signal::Input(Input::EditingDelayElapsed { epoch }));
        }));
    }
}

fn send(tx: &mpsc::UnboundedSender<Signal>, signal: Signal) {
    if tx.send(signal).is_err() {
        debug!("send: runtime is gone, dropping signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::mock::{MockAgentApi, PLANNING_URL};
    use crate::channel::mock::MockConnector;
    use crate::notify::{NotificationLevel, RecordingSink};
    use crate::workflow::WorkflowSettings;

    fn planning_script() -> Vec<String> {
        [
            r#"{"type":"planning_started"}"#,
            r#"{"type":"visual_plan","data":{"plan":[
                {"tool":"apply_effect","args":{"image_idx":0,"effects_list":["Glitch"]}},
                {"tool":"add_transition","args":{"image1_idx":0,"image2_idx":1,"transition_type":"Fade"}}]}}"#,
            r#"{"type":"music_plan","data":{"tracks":[{"track_name":"Beat","artist_name":"A"}]}}"#,
            r#"{"type":"download_progress","progress":100}"#,
            r#"{"type":"full_plan","data":{"selected_track_filename":"beat.mp3","start_time_seconds":10,
                "end_time_seconds":25,"trimmed_audio_url":"http://localhost:5000/audio/plan-1_trimmed.mp3"}}"#,
            r#"{"type":"planning_complete","data":{}}"#,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn execution_script() -> Vec<String> {
        [
            r#"{"type":"execution_started"}"#,
            r#"{"type":"agent_log","message":"Opening editor"}"#,
            r#"{"type":"uploading_images","progress":50}"#,
            r#"{"type":"agent_step","message":"Applying Glitch"}"#,
            r#"{"type":"execution_complete","data":{"success":true,"num_images":2,"plan_steps":2,"audio_added":true}}"#,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn studio(api: Arc<MockAgentApi>, connector: Arc<MockConnector>, sink: Arc<RecordingSink>) -> Studio {
        let settings = WorkflowSettings {
            editing_delay: Duration::from_millis(10),
            ..WorkflowSettings::default()
        };
        let mut studio = Studio::new(Workflow::new(settings), api, connector, sink);
        studio.add_image("/tmp/one.png").unwrap();
        studio.add_image("/tmp/two.jpg").unwrap();
        studio.set_prompt("trendy, phonk vibe");
        studio
    }

    async fn settle(studio: &mut Studio) {
        tokio::time::timeout(Duration::from_secs(5), studio.run_until_settled())
            .await
            .expect("workflow did not settle");
    }

    /// Dispatch whatever arrives within a short window
    async fn drain(studio: &mut Studio) {
        while let Ok(Some(signal)) = tokio::time::timeout(Duration::from_millis(100), studio.next_signal()).await {
            studio.dispatch(signal);
        }
    }

    #[tokio::test]
    async fn test_full_run_reaches_done() {
        let api = Arc::new(MockAgentApi::new());
        let connector = Arc::new(
            MockConnector::new()
                .with_script(ChannelKind::Planning, planning_script())
                .with_script(ChannelKind::Execution, execution_script()),
        );
        let sink = Arc::new(RecordingSink::new());
        let mut studio = studio(api.clone(), connector.clone(), sink.clone());

        assert!(studio.start());
        settle(&mut studio).await;

        let wf = studio.workflow();
        assert_eq!(wf.phase(), Phase::Done);
        assert_eq!(wf.execution_logs(), ["Opening editor", "Applying Glitch"]);
        let summary = wf.state().done.summary.as_ref().unwrap();
        assert_eq!(summary.effects_count, 1);
        assert_eq!(summary.transitions_count, 1);
        assert_eq!(summary.track_used, "beat.mp3");

        let requests = api.execution_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].planning_session_id.as_deref(), Some("plan-1"));
        assert_eq!(
            requests[0].audio_path.as_deref(),
            Some("http://localhost:5000/audio/plan-1_trimmed.mp3")
        );

        let kinds: Vec<_> = connector.connects().into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![ChannelKind::Planning, ChannelKind::Execution]);
        assert!(
            connector
                .closes()
                .contains(&(ChannelKind::Planning, CloseMode::Retire))
        );
        assert_eq!(studio.live_channel(), Some(ChannelKind::Execution));
        assert!(sink.snapshot().iter().all(|n| n.level != NotificationLevel::Error));
    }

    #[tokio::test]
    async fn test_rejected_planning_settles_idle() {
        let api = Arc::new(MockAgentApi::rejecting_planning("No images provided"));
        let connector = Arc::new(MockConnector::new());
        let sink = Arc::new(RecordingSink::new());
        let mut studio = studio(api.clone(), connector.clone(), sink.clone());

        assert!(studio.start());
        settle(&mut studio).await;

        assert_eq!(studio.workflow().phase(), Phase::Idle);
        assert!(connector.connects().is_empty());
        let last = sink.latest(1);
        assert_eq!(last[0].level, NotificationLevel::Error);
        assert_eq!(last[0].description.as_deref(), Some("No images provided"));
    }

    #[tokio::test]
    async fn test_start_validation_reports_to_sink() {
        let sink = Arc::new(RecordingSink::new());
        let mut studio = Studio::new(
            Workflow::new(WorkflowSettings::default()),
            Arc::new(MockAgentApi::new()),
            Arc::new(MockConnector::new()),
            sink.clone(),
        );
        assert!(!studio.start());
        assert_eq!(sink.latest(1)[0].title, "Please upload at least one image");
        assert_eq!(studio.workflow().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_reset_mid_flight_cancels_late_channel() {
        let api = Arc::new(MockAgentApi::new());
        let connector = Arc::new(MockConnector::new().with_script(ChannelKind::Planning, planning_script()));
        let sink = Arc::new(RecordingSink::new());
        let mut studio = studio(api.clone(), connector.clone(), sink.clone());

        assert!(studio.start());
        // Session created; the connect is now in flight
        let signal = studio.next_signal().await.unwrap();
        assert!(matches!(signal, Signal::Input(Input::PlanningSessionStarted { .. })));
        studio.dispatch(signal);

        studio.reset();
        drain(&mut studio).await;

        let wf = studio.workflow();
        assert_eq!(wf.phase(), Phase::Idle);
        assert!(wf.state().planning.is_empty());
        assert!(wf.identity().is_empty());
        assert_eq!(studio.live_channel(), None);
        assert_eq!(connector.connects(), vec![(ChannelKind::Planning, PLANNING_URL.to_string())]);
        assert_eq!(connector.closes(), vec![(ChannelKind::Planning, CloseMode::Cancel)]);
    }

    #[tokio::test]
    async fn test_reset_after_done_closes_execution() {
        let api = Arc::new(MockAgentApi::new());
        let connector = Arc::new(
            MockConnector::new()
                .with_script(ChannelKind::Planning, planning_script())
                .with_script(ChannelKind::Execution, execution_script()),
        );
        let sink = Arc::new(RecordingSink::new());
        let mut studio = studio(api, connector.clone(), sink);

        studio.start();
        settle(&mut studio).await;
        studio.reset();
        drain(&mut studio).await;

        assert_eq!(studio.workflow().phase(), Phase::Idle);
        assert!(
            connector
                .closes()
                .contains(&(ChannelKind::Execution, CloseMode::Cancel))
        );
        assert!(studio.workflow().images().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_cancel() {
        let api = Arc::new(MockAgentApi::new());
        let connector = Arc::new(MockConnector::new().with_script(ChannelKind::Planning, planning_script()));
        let sink = Arc::new(RecordingSink::new());
        let mut studio = studio(api, connector.clone(), sink);

        assert!(studio.start());
        while studio.live_channel().is_none() {
            let signal = tokio::time::timeout(Duration::from_secs(5), studio.next_signal())
                .await
                .expect("channel never opened")
                .unwrap();
            studio.dispatch(signal);
        }

        // No draining afterwards: the cancel must already be recorded
        studio.shutdown(Duration::from_secs(2)).await;
        assert_eq!(studio.workflow().phase(), Phase::Idle);
        assert_eq!(connector.closes(), vec![(ChannelKind::Planning, CloseMode::Cancel)]);
    }

    #[tokio::test]
    async fn test_shutdown_when_idle_returns() {
        let api = Arc::new(MockAgentApi::new());
        let connector = Arc::new(MockConnector::new());
        let sink = Arc::new(RecordingSink::new());
        let mut studio = studio(api, connector.clone(), sink);

        tokio::time::timeout(Duration::from_secs(1), studio.shutdown(Duration::from_secs(2)))
            .await
            .expect("shutdown blocked with nothing to close");
        assert!(connector.closes().is_empty());
    }
}
