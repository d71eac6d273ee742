use async_trait::async_trait;
use serde_json::json;
use spill_agent::config::AgentConfig;
use spill_agent::weather::WEATHER_REPORT;
use spill_agent::{
    AgentError, AgentMetrics, AgentSession, JobContext, SessionBackend, SessionEvent,
    SessionOptions, ToolOutput, UsageSummary, VoiceAgent, Worker,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Start { room: String, tools: Vec<String> },
    GenerateReply,
    ToolOutput { call_id: String, output: ToolOutput },
    Close(UsageSummary),
}

/// Replays scripted events and records every command the session sends.
struct ScriptedBackend {
    events: VecDeque<SessionEvent>,
    commands: Arc<Mutex<Vec<Command>>>,
    fail_start: bool,
}

impl ScriptedBackend {
    fn new(events: Vec<SessionEvent>) -> (Self, Arc<Mutex<Vec<Command>>>) {
        let commands = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: events.into(),
                commands: Arc::clone(&commands),
                fail_start: false,
            },
            commands,
        )
    }

    fn record(&self, command: Command) {
        self.commands.lock().unwrap().push(command);
    }
}

#[async_trait]
impl SessionBackend for ScriptedBackend {
    async fn start(&mut self, room: &str, options: &SessionOptions) -> Result<(), AgentError> {
        if self.fail_start {
            return Err(AgentError::Platform("room unavailable".to_string()));
        }
        self.record(Command::Start {
            room: room.to_string(),
            tools: options.tools.iter().map(|t| t.name.clone()).collect(),
        });
        Ok(())
    }

    async fn generate_reply(&mut self) -> Result<(), AgentError> {
        self.record(Command::GenerateReply);
        Ok(())
    }

    async fn send_tool_output(
        &mut self,
        call_id: &str,
        output: ToolOutput,
    ) -> Result<(), AgentError> {
        self.record(Command::ToolOutput {
            call_id: call_id.to_string(),
            output,
        });
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    async fn close(&mut self, usage: &UsageSummary) -> Result<(), AgentError> {
        self.record(Command::Close(usage.clone()));
        Ok(())
    }
}

fn worker() -> Worker {
    Worker::prewarm(AgentConfig::default(), VoiceAgent::spill()).unwrap()
}

fn ended(reason: &str) -> SessionEvent {
    SessionEvent::Ended {
        reason: Some(reason.to_string()),
    }
}

#[tokio::test]
async fn greets_before_any_user_input() {
    let (backend, commands) = ScriptedBackend::new(vec![ended("room closed")]);

    let report = worker().run_job("job-1", "room-a", backend).await.unwrap();

    let commands = commands.lock().unwrap();
    assert_eq!(
        commands[0],
        Command::Start {
            room: "room-a".into(),
            tools: vec!["lookup_weather".into()],
        }
    );
    assert_eq!(commands[1], Command::GenerateReply);
    assert!(matches!(commands[2], Command::Close(_)));
    assert_eq!(commands.len(), 3);
    assert_eq!(report.end_reason.as_deref(), Some("room closed"));
    assert_eq!(report.user_turns, 0);
}

#[tokio::test]
async fn answers_weather_tool_call() {
    let (backend, commands) = ScriptedBackend::new(vec![
        SessionEvent::UserStartedSpeaking,
        SessionEvent::UserTranscript {
            text: "What's the weather in Paris?".into(),
            is_final: true,
        },
        SessionEvent::ToolCall {
            call_id: "call-1".into(),
            name: "lookup_weather".into(),
            arguments: json!({
                "location": "Paris",
                "latitude": "48.8566",
                "longitude": "2.3522"
            }),
        },
        ended("done"),
    ]);

    let report = worker().run_job("job-2", "room-b", backend).await.unwrap();

    let commands = commands.lock().unwrap();
    assert!(commands.contains(&Command::ToolOutput {
        call_id: "call-1".into(),
        output: ToolOutput::success(json!(WEATHER_REPORT)),
    }));
    assert_eq!(report.tool_calls, 1);
    assert_eq!(report.user_turns, 1);
}

#[tokio::test]
async fn unknown_tool_returns_error_output() {
    let (backend, commands) = ScriptedBackend::new(vec![
        SessionEvent::ToolCall {
            call_id: "call-9".into(),
            name: "book_flight".into(),
            arguments: json!({}),
        },
        ended("done"),
    ]);

    let report = worker().run_job("job-3", "room-c", backend).await.unwrap();
    assert_eq!(report.end_reason.as_deref(), Some("done"));

    let commands = commands.lock().unwrap();
    let output = commands
        .iter()
        .find_map(|c| match c {
            Command::ToolOutput { call_id, output } if call_id == "call-9" => Some(output.clone()),
            _ => None,
        })
        .expect("tool output sent");
    assert!(output.is_error);
    assert!(output.output.as_str().unwrap().contains("book_flight"));
}

#[tokio::test]
async fn malformed_tool_arguments_do_not_end_session() {
    let (backend, commands) = ScriptedBackend::new(vec![
        SessionEvent::ToolCall {
            call_id: "call-2".into(),
            name: "lookup_weather".into(),
            arguments: json!({"location": "Paris"}),
        },
        SessionEvent::AgentStartedSpeaking,
        ended("done"),
    ]);

    let report = worker().run_job("job-4", "room-d", backend).await.unwrap();
    assert_eq!(report.end_reason.as_deref(), Some("done"));

    let commands = commands.lock().unwrap();
    assert!(commands.iter().any(|c| matches!(
        c,
        Command::ToolOutput { output, .. } if output.is_error
    )));
}

#[tokio::test]
async fn usage_is_summed_and_reported_on_close() {
    let (backend, commands) = ScriptedBackend::new(vec![
        SessionEvent::MetricsCollected(AgentMetrics::Llm {
            prompt_tokens: 120,
            prompt_cached_tokens: 20,
            completion_tokens: 30,
            ttft: 0.4,
            duration: 1.2,
        }),
        SessionEvent::MetricsCollected(AgentMetrics::Llm {
            prompt_tokens: 80,
            prompt_cached_tokens: 0,
            completion_tokens: 10,
            ttft: 0.3,
            duration: 0.9,
        }),
        SessionEvent::MetricsCollected(AgentMetrics::Stt {
            audio_duration: 3.5,
        }),
        SessionEvent::MetricsCollected(AgentMetrics::Tts {
            characters_count: 42,
            audio_duration: 2.0,
            ttfb: 0.2,
        }),
        ended("done"),
    ]);

    let report = worker().run_job("job-5", "room-e", backend).await.unwrap();

    assert_eq!(report.usage.llm_prompt_tokens, 200);
    assert_eq!(report.usage.llm_prompt_cached_tokens, 20);
    assert_eq!(report.usage.llm_completion_tokens, 40);
    assert_eq!(report.usage.tts_characters_count, 42);
    assert_eq!(report.usage.stt_audio_duration, 3.5);

    let commands = commands.lock().unwrap();
    assert_eq!(commands.last(), Some(&Command::Close(report.usage.clone())));
}

#[tokio::test]
async fn platform_disconnect_still_closes_session() {
    let (backend, commands) = ScriptedBackend::new(vec![SessionEvent::UserStartedSpeaking]);

    let report = worker().run_job("job-6", "room-f", backend).await.unwrap();

    assert_eq!(report.end_reason.as_deref(), Some("platform disconnected"));
    assert!(matches!(
        commands.lock().unwrap().last(),
        Some(Command::Close(_))
    ));
}

#[tokio::test]
async fn shutdown_callbacks_run_once_with_report() {
    let worker = worker();
    let (backend, _commands) = ScriptedBackend::new(vec![
        SessionEvent::UserTranscript {
            text: "hi".into(),
            is_final: true,
        },
        ended("bye"),
    ]);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut ctx = JobContext::new("job-7", "room-g", Arc::clone(worker.vad()));
    let sink = Arc::clone(&seen);
    ctx.add_shutdown_callback(move |report| {
        sink.lock().unwrap().push(report.clone());
    });

    let session = AgentSession::new(
        backend,
        Arc::clone(worker.agent()),
        worker.session_options(),
    );
    let report = session.run(ctx).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], report);
    assert_eq!(seen[0].job_id, "job-7");
    assert_eq!(seen[0].room, "room-g");
    assert_eq!(seen[0].user_turns, 1);
}

#[tokio::test]
async fn failed_start_still_runs_shutdown_callbacks() {
    let worker = worker();
    let (mut backend, commands) = ScriptedBackend::new(vec![ended("unused")]);
    backend.fail_start = true;

    let called = Arc::new(Mutex::new(false));
    let mut ctx = JobContext::new("job-8", "room-h", Arc::clone(worker.vad()));
    let flag = Arc::clone(&called);
    ctx.add_shutdown_callback(move |report| {
        assert_eq!(report.end_reason, None);
        *flag.lock().unwrap() = true;
    });

    let result = AgentSession::new(
        backend,
        Arc::clone(worker.agent()),
        worker.session_options(),
    )
    .run(ctx)
    .await;

    assert!(matches!(result, Err(AgentError::Platform(_))));
    assert!(*called.lock().unwrap());
    let commands = commands.lock().unwrap();
    assert!(!commands.contains(&Command::GenerateReply));
    assert!(matches!(commands.last(), Some(Command::Close(_))));
}

#[tokio::test]
async fn out_of_order_platform_events_are_tolerated() {
    let (backend, _commands) = ScriptedBackend::new(vec![
        SessionEvent::AgentStoppedSpeaking,
        SessionEvent::AgentStoppedSpeaking,
        SessionEvent::UserTranscript {
            text: "partial".into(),
            is_final: false,
        },
        ended("done"),
    ]);

    let report = worker().run_job("job-9", "room-i", backend).await.unwrap();
    assert_eq!(report.user_turns, 0);
    assert_eq!(report.end_reason.as_deref(), Some("done"));
}
