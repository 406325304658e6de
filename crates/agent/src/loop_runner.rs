//! The orchestration loop implementation.
//!
//! One `run_turn` call drives a full turn: reasoning step, guardrail filter,
//! routing, capability/tool execution, looping back until the reply carries
//! no actions. `spawn_turn` runs it as the producer half of the streaming
//! engine: the Session moves into the task and comes back out through the
//! join handle, so exactly one writer exists at any time.

use crate::capability::CapabilityManager;
use crate::context::ContextBuilder;
use crate::executor::ActionExecutor;
use crate::guardrail;
use crate::router::{self, Phase};
use crate::stream::{CancelSignal, TurnEvent, TurnHandle};
use emberclaw_core::error::ReasoningError;
use emberclaw_core::message::Message;
use emberclaw_core::reasoning::{AssistantReply, ReasoningClient};
use emberclaw_core::session::Session;
use emberclaw_core::tool::ToolRegistry;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The core orchestration loop.
pub struct AgentLoop {
    /// The reasoning service handle
    client: Arc<dyn ReasoningClient>,

    /// Tool registry shared by the executor and the capability manager
    tools: Arc<ToolRegistry>,

    /// Context assembly for each reasoning step
    context: ContextBuilder,

    /// Executes ordinary tool actions
    executor: ActionExecutor,

    /// Executes capability actions and mutates the capability context
    capabilities: CapabilityManager,

    /// Maximum reasoning iterations per turn
    max_iterations: u32,
}

impl AgentLoop {
    /// Create a new orchestration loop.
    pub fn new(
        client: Arc<dyn ReasoningClient>,
        tools: Arc<ToolRegistry>,
        context: ContextBuilder,
    ) -> Self {
        Self {
            client,
            executor: ActionExecutor::new(tools.clone()),
            capabilities: CapabilityManager::new(tools.clone()),
            tools,
            context,
            max_iterations: 25,
        }
    }

    /// Set the maximum number of reasoning iterations per turn.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Release the reasoning client. Called once at session teardown.
    pub async fn shutdown(&self) -> Result<(), ReasoningError> {
        self.client.close().await
    }

    /// Start one turn as a background producer.
    ///
    /// The Session moves into the task and is returned through the join
    /// handle; starting a new turn therefore requires joining the previous
    /// one first (single-flight per session).
    pub fn spawn_turn(
        self: Arc<Self>,
        mut session: Session,
        user_text: impl Into<String>,
        cancel: CancelSignal,
    ) -> TurnHandle {
        let user_text = user_text.into();
        let (tx, events) = mpsc::channel(64);

        let handle = tokio::spawn(async move {
            session.transcript.push(Message::user(user_text));

            if let Err(e) = self.run_turn(&mut session, &cancel, &tx).await {
                error!(error = %e, "Turn aborted on reasoning failure");
                let _ = tx.send(TurnEvent::Failed { error: e.to_string() }).await;
            }

            session
        });

        TurnHandle { events, handle }
    }

    /// Drive one full turn against the given session.
    async fn run_turn(
        &self,
        session: &mut Session,
        cancel: &CancelSignal,
        tx: &mpsc::Sender<TurnEvent>,
    ) -> Result<(), ReasoningError> {
        let turn = session
            .transcript
            .iter()
            .filter(|m| matches!(m, Message::User { .. }))
            .count() as u32;

        let definitions = self.tools.definitions();
        let mut iteration = 0;

        loop {
            // Cancellation is observed between node transitions only
            if cancel.is_cancelled() {
                info!(turn, "Cancellation observed, stopping before the next reasoning step");
                break;
            }

            iteration += 1;
            if iteration > self.max_iterations {
                warn!(turn, iterations = iteration, "Max iterations reached, stopping turn");
                break;
            }

            debug!(turn, iteration, "Orchestration loop iteration");

            // ── Think: stream the next assistant reply ─────────────────────
            let messages = self.context.build(session).await;
            let mut chunks = self
                .client
                .invoke_stream(messages, definitions.clone())
                .await?;

            let mut text = String::new();
            let mut actions = Vec::new();
            while let Some(chunk) = chunks.recv().await {
                let chunk = chunk?;
                if let Some(fragment) = chunk.text {
                    text.push_str(&fragment);
                    let _ = tx.send(TurnEvent::Fragment { text: fragment }).await;
                }
                if chunk.done {
                    actions = chunk.actions;
                    break;
                }
            }

            // ── Guardrails, then accept into state ─────────────────────────
            let filtered = guardrail::apply(AssistantReply {
                text,
                actions,
                id: None,
            });
            let message = match filtered.id {
                Some(id) => Message::Assistant {
                    id,
                    text: filtered.text,
                    actions: filtered.actions,
                },
                None => Message::assistant(filtered.text, filtered.actions),
            };
            session.transcript.push(message.clone());
            let _ = tx
                .send(TurnEvent::Completed {
                    message: message.clone(),
                    turn,
                })
                .await;

            // ── Route ──────────────────────────────────────────────────────
            match router::route(message.actions()) {
                Phase::Done => break,

                Phase::CapabilityManage => {
                    let results = self
                        .capabilities
                        .handle(message.actions(), &mut session.capabilities)
                        .await;
                    for result in results {
                        session.transcript.push(result.clone());
                        let _ = tx
                            .send(TurnEvent::Completed { message: result, turn })
                            .await;
                    }
                }

                Phase::ToolExec => {
                    for action in message.actions() {
                        // An in-flight tool runs to completion; we only stop
                        // before starting the next one
                        if cancel.is_cancelled() {
                            info!(turn, "Cancellation observed between tool calls");
                            break;
                        }
                        let result = self.executor.execute(action).await;
                        session.transcript.push(result.clone());
                        let _ = tx
                            .send(TurnEvent::Completed { message: result, turn })
                            .await;
                    }
                }

                // route() never yields Think; it is the state we are already in
                Phase::Think => break,
            }
        }

        let _ = tx.send(TurnEvent::Finished { turn }).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use emberclaw_core::error::ToolError;
    use emberclaw_core::message::ActionRequest;
    use emberclaw_core::reasoning::ChatMessage;
    use emberclaw_core::tool::{Tool, ToolDefinition, ToolOutput};
    use emberclaw_memory::NoopMemory;
    use emberclaw_skills::InMemorySkillRegistry;
    use emberclaw_tools::{ActivateSkillTool, DeactivateSkillTool};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// A reasoning client that replays a fixed script of replies.
    struct ScriptedClient {
        replies: Mutex<VecDeque<AssistantReply>>,
        calls: AtomicU32,
    }

    impl ScriptedClient {
        fn new(replies: Vec<AssistantReply>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReasoningClient for ScriptedClient {
        fn name(&self) -> &str { "scripted" }

        async fn invoke(
            &self,
            _messages: Vec<ChatMessage>,
            _tools: Vec<ToolDefinition>,
        ) -> Result<AssistantReply, ReasoningError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ReasoningError::Network("script exhausted".into()))
        }
    }

    /// Records every invocation so tests can assert what actually ran.
    struct RecordingTool {
        tool_name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str { self.tool_name }
        fn description(&self) -> &str { "Records invocations" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _arguments: serde_json::Map<String, serde_json::Value>,
        ) -> Result<ToolOutput, ToolError> {
            self.log.lock().unwrap().push(self.tool_name.to_string());
            Ok(ToolOutput::plain(format!("{} ok", self.tool_name)))
        }
    }

    /// Simulates the consumer pressing Ctrl-C while a tool is in flight.
    struct SelfCancellingTool {
        cancel: CancelSignal,
    }

    #[async_trait]
    impl Tool for SelfCancellingTool {
        fn name(&self) -> &str { "slow_tool" }
        fn description(&self) -> &str { "Cancels mid-execution" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object", "properties": {}})
        }
        async fn execute(
            &self,
            _arguments: serde_json::Map<String, serde_json::Value>,
        ) -> Result<ToolOutput, ToolError> {
            self.cancel.cancel();
            Ok(ToolOutput::plain("finished despite cancellation"))
        }
    }

    fn reply(text: &str, actions: Vec<ActionRequest>) -> AssistantReply {
        AssistantReply {
            text: text.into(),
            actions,
            id: None,
        }
    }

    fn action(id: &str, tool_name: &str, args: serde_json::Value) -> ActionRequest {
        ActionRequest {
            id: id.into(),
            tool_name: tool_name.into(),
            arguments: args.as_object().cloned().unwrap_or_default(),
        }
    }

    struct Harness {
        agent: Arc<AgentLoop>,
        client: Arc<ScriptedClient>,
        log: Arc<Mutex<Vec<String>>>,
    }

    fn harness(replies: Vec<AssistantReply>) -> Harness {
        harness_with(replies, None)
    }

    fn harness_with(replies: Vec<AssistantReply>, cancel: Option<CancelSignal>) -> Harness {
        let client = ScriptedClient::new(replies);
        let log = Arc::new(Mutex::new(Vec::new()));

        let skills = Arc::new(
            InMemorySkillRegistry::new()
                .with_skill("excel_master", "Spreadsheets", "Use openpyxl for all workbooks."),
        );

        let mut tools = ToolRegistry::new();
        tools.register(Box::new(ActivateSkillTool::new(skills.clone())));
        tools.register(Box::new(DeactivateSkillTool));
        for tool_name in ["shell", "file_read", "file_write"] {
            tools.register(Box::new(RecordingTool {
                tool_name,
                log: log.clone(),
            }));
        }
        if let Some(cancel) = cancel {
            tools.register(Box::new(SelfCancellingTool { cancel }));
        }
        let tools = Arc::new(tools);

        let context = ContextBuilder::new(Arc::new(NoopMemory), skills, 2000);
        let agent = Arc::new(AgentLoop::new(client.clone(), tools, context));

        Harness { agent, client, log }
    }

    /// Drain the event channel, then join the producer for the session.
    async fn collect(mut handle: TurnHandle) -> (Vec<TurnEvent>, Session) {
        let mut events = Vec::new();
        while let Some(event) = handle.events.recv().await {
            events.push(event);
        }
        let session = handle.handle.await.unwrap();
        (events, session)
    }

    #[tokio::test]
    async fn plain_reply_completes_turn() {
        let h = harness(vec![reply("Hello! How can I help?", vec![])]);
        let handle =
            h.agent
                .clone()
                .spawn_turn(Session::new(), "Hi there", CancelSignal::new());
        let (events, session) = collect(handle).await;

        // user + assistant
        assert_eq!(session.transcript.len(), 2);
        assert_eq!(h.client.calls(), 1);

        assert!(matches!(&events[0], TurnEvent::Fragment { text } if text.contains("Hello")));
        assert!(matches!(&events[1], TurnEvent::Completed { message, .. } if message.actions().is_empty()));
        assert!(matches!(events.last(), Some(TurnEvent::Finished { turn: 1 })));
    }

    #[tokio::test]
    async fn capability_activation_defers_co_requested_tool() {
        let h = harness(vec![
            reply(
                "Activating the spreadsheet skill and listing files",
                vec![
                    action("a1", "activate_skill", serde_json::json!({"skill_name": "excel_master"})),
                    action("a2", "shell", serde_json::json!({"command": "ls"})),
                ],
            ),
            reply("Skill ready.", vec![]),
        ]);

        let handle = h.agent.clone().spawn_turn(
            Session::new(),
            "Prepare a spreadsheet",
            CancelSignal::new(),
        );
        let (_, session) = collect(handle).await;

        // Guardrail kept only the capability request
        let assistant = &session.transcript.messages()[1];
        assert_eq!(assistant.actions().len(), 1);
        assert_eq!(assistant.actions()[0].tool_name, "activate_skill");
        assert_eq!(assistant.text(), guardrail::CAPABILITY_DEFERRAL_NOTICE);

        // The shell action never executed
        assert!(h.log.lock().unwrap().is_empty());

        // The capability context gained the skill
        assert!(session.capabilities.is_active("excel_master"));

        // The tool result answers the capability action
        match &session.transcript.messages()[2] {
            Message::ToolResult { action_id, .. } => assert_eq!(action_id, "a1"),
            other => panic!("Expected tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn read_write_conflict_drops_the_write() {
        let h = harness(vec![
            reply(
                "Updating a.txt",
                vec![
                    action("r1", "file_read", serde_json::json!({"path": "a.txt"})),
                    action("w1", "file_write", serde_json::json!({"path": "a.txt", "content": "new"})),
                ],
            ),
            reply("Here is the content.", vec![]),
        ]);

        let handle =
            h.agent
                .clone()
                .spawn_turn(Session::new(), "Replace a.txt", CancelSignal::new());
        let (_, session) = collect(handle).await;

        let assistant = &session.transcript.messages()[1];
        assert_eq!(assistant.text(), guardrail::READ_BEFORE_WRITE_NOTICE);
        assert_eq!(assistant.actions().len(), 1);
        assert_eq!(assistant.actions()[0].tool_name, "file_read");

        // Only the read ran
        assert_eq!(*h.log.lock().unwrap(), vec!["file_read".to_string()]);
    }

    #[tokio::test]
    async fn tool_results_match_action_ids_uniquely() {
        let h = harness(vec![
            reply(
                "Running two commands",
                vec![
                    action("a1", "shell", serde_json::json!({"command": "ls"})),
                    action("a2", "shell", serde_json::json!({"command": "pwd"})),
                ],
            ),
            reply("Both done.", vec![]),
        ]);

        let handle =
            h.agent
                .clone()
                .spawn_turn(Session::new(), "Run things", CancelSignal::new());
        let (_, session) = collect(handle).await;

        let requested: Vec<&str> = session
            .transcript
            .iter()
            .flat_map(|m| m.actions())
            .map(|a| a.id.as_str())
            .collect();
        let answered: Vec<&str> = session
            .transcript
            .iter()
            .filter_map(|m| match m {
                Message::ToolResult { action_id, .. } => Some(action_id.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(requested, vec!["a1", "a2"]);
        assert_eq!(answered, vec!["a1", "a2"]);
        // No duplicate ids within the turn
        let mut unique = requested.clone();
        unique.dedup();
        assert_eq!(unique.len(), requested.len());
    }

    #[tokio::test]
    async fn unknown_tool_failure_continues_the_loop() {
        let h = harness(vec![
            reply(
                "Trying something exotic",
                vec![action("a1", "teleport", serde_json::json!({}))],
            ),
            reply("That tool does not exist, sorry.", vec![]),
        ]);

        let handle =
            h.agent
                .clone()
                .spawn_turn(Session::new(), "Teleport me", CancelSignal::new());
        let (events, session) = collect(handle).await;

        // user, assistant, tool error result, final assistant
        assert_eq!(session.transcript.len(), 4);
        assert!(session.transcript.messages()[2].text().contains("Tool not found"));
        assert!(matches!(events.last(), Some(TurnEvent::Finished { .. })));
        assert_eq!(h.client.calls(), 2);
    }

    #[tokio::test]
    async fn reasoning_failure_is_terminal_but_session_survives() {
        // Empty script: the first invoke fails
        let h = harness(vec![]);

        let handle = h
            .agent
            .clone()
            .spawn_turn(Session::new(), "Hello?", CancelSignal::new());
        let (events, session) = collect(handle).await;

        assert!(events.iter().any(|e| matches!(e, TurnEvent::Failed { error } if error.contains("script exhausted"))));
        // The user message is retained; the session is resumable
        assert_eq!(session.transcript.len(), 1);
    }

    #[tokio::test]
    async fn pre_cancelled_turn_never_reasons() {
        let h = harness(vec![reply("never sent", vec![])]);
        let cancel = CancelSignal::new();
        cancel.cancel();

        let handle = h
            .agent
            .clone()
            .spawn_turn(Session::new(), "Anyone there?", cancel);
        let (events, session) = collect(handle).await;

        assert_eq!(h.client.calls(), 0);
        assert_eq!(session.transcript.len(), 1); // just the user message
        assert!(matches!(events.last(), Some(TurnEvent::Finished { .. })));
    }

    #[tokio::test]
    async fn cancellation_mid_tool_lets_it_finish_then_stops() {
        let cancel = CancelSignal::new();
        let h = harness_with(
            vec![
                reply(
                    "Starting a long job",
                    vec![action("a1", "slow_tool", serde_json::json!({}))],
                ),
                reply("never reached", vec![]),
            ],
            Some(cancel.clone()),
        );

        let handle = h
            .agent
            .clone()
            .spawn_turn(Session::new(), "Do the long thing", cancel);
        let (_, session) = collect(handle).await;

        // The in-flight tool ran to completion
        assert!(session.transcript.messages()[2]
            .text()
            .contains("finished despite cancellation"));
        // But no further reasoning step happened
        assert_eq!(h.client.calls(), 1);
        assert_eq!(session.transcript.len(), 3);
    }

    #[tokio::test]
    async fn iteration_cap_bounds_the_turn() {
        // Every reply requests another shell call; the cap must stop it
        let looping: Vec<AssistantReply> = (0..10)
            .map(|i| {
                reply(
                    "again",
                    vec![action(
                        &format!("a{i}"),
                        "shell",
                        serde_json::json!({"command": "ls"}),
                    )],
                )
            })
            .collect();

        let client = ScriptedClient::new(looping);
        let log = Arc::new(Mutex::new(Vec::new()));
        let skills = Arc::new(InMemorySkillRegistry::new());
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(RecordingTool {
            tool_name: "shell",
            log: log.clone(),
        }));
        let context = ContextBuilder::new(Arc::new(NoopMemory), skills, 2000);
        let agent = Arc::new(
            AgentLoop::new(client.clone(), Arc::new(tools), context).with_max_iterations(2),
        );

        let handle = agent.spawn_turn(Session::new(), "Loop forever", CancelSignal::new());
        let (events, _) = collect(handle).await;

        assert_eq!(client.calls(), 2);
        assert!(matches!(events.last(), Some(TurnEvent::Finished { .. })));
    }

    #[tokio::test]
    async fn second_turn_sees_prior_capability_context() {
        let h = harness(vec![
            reply(
                "activating",
                vec![action("a1", "activate_skill", serde_json::json!({"skill_name": "excel_master"}))],
            ),
            reply("ready", vec![]),
            reply("still here", vec![]),
        ]);

        let handle =
            h.agent
                .clone()
                .spawn_turn(Session::new(), "First turn", CancelSignal::new());
        let (_, session) = collect(handle).await;
        assert!(session.capabilities.is_active("excel_master"));

        // The next turn reuses the same session and keeps the capability
        let handle = h
            .agent
            .clone()
            .spawn_turn(session, "Second turn", CancelSignal::new());
        let (events, session) = collect(handle).await;

        assert!(session.capabilities.is_active("excel_master"));
        assert!(matches!(events.last(), Some(TurnEvent::Finished { turn: 2 })));
    }
}
