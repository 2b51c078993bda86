use threadchat::api::StreamParser;
use threadchat::types::{AnnotationKind, StreamEvent, ToolCallKind};

#[test]
fn test_fragmented_frames_are_reassembled() {
    let mut parser = StreamParser::new();

    let chunk1 = b"event: thread.message.delta\ndata: {\"id\":\"msg_1\",\"delta\":{\"content\":[{\"index\":0,\"type\":\"te";
    let events1 = parser.process(chunk1).expect("first chunk parse");
    assert!(events1.is_empty());

    let chunk2 = b"xt\",\"text\":{\"value\":\"Hi\"}}]}}\n\n";
    let events2 = parser.process(chunk2).expect("second chunk parse");
    assert_eq!(events2, vec![StreamEvent::text("Hi")]);
}

#[test]
fn test_multibyte_character_split_across_chunks() {
    let mut parser = StreamParser::new();
    let frame = "event: thread.message.delta\ndata: {\"delta\":{\"content\":[{\"index\":0,\"type\":\"text\",\"text\":{\"value\":\"café\"}}]}}\n\n";
    let bytes = frame.as_bytes();
    let split = frame.find('é').expect("accent present") + 1;

    assert!(parser.process(&bytes[..split]).expect("head").is_empty());
    let events = parser.process(&bytes[split..]).expect("tail");
    assert_eq!(events, vec![StreamEvent::text("café")]);
}

#[test]
fn test_invalid_json_is_skipped() {
    let mut parser = StreamParser::new();

    let chunk = b"event: thread.message.delta\ndata: {invalid json}\n\nevent: thread.run.completed\ndata: {}\n\n";
    let events = parser
        .process(chunk)
        .expect("bad frames must not fail the parser");
    assert_eq!(events, vec![StreamEvent::RunCompleted]);
}

#[test]
fn test_ndjson_envelopes_decode() {
    let mut parser = StreamParser::new();

    let chunk = concat!(
        "{\"event\":\"thread.message.created\",\"data\":{\"id\":\"msg_1\"}}\n",
        "{\"event\":\"thread.message.delta\",\"data\":{\"delta\":{\"content\":[{\"index\":0,\"type\":\"text\",\"text\":{\"value\":\"see sandbox:/mnt/a.csv\",\"annotations\":[{\"type\":\"file_path\",\"text\":\"sandbox:/mnt/a.csv\",\"file_path\":{\"file_id\":\"file-9\"}}]}}]}}}\n",
    );
    let events = parser.process(chunk.as_bytes()).expect("ndjson parse");

    assert_eq!(events.len(), 2);
    assert_eq!(events[0], StreamEvent::TextCreated);
    match &events[1] {
        StreamEvent::TextDelta(delta) => {
            assert_eq!(delta.value.as_deref(), Some("see sandbox:/mnt/a.csv"));
            let annotations = delta.annotations.as_ref().expect("annotations");
            assert_eq!(annotations.len(), 1);
            assert_eq!(annotations[0].text, "sandbox:/mnt/a.csv");
            assert_eq!(
                annotations[0].kind,
                AnnotationKind::FilePath {
                    file_id: "file-9".to_string()
                }
            );
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn test_code_interpreter_step_deltas() {
    let mut parser = StreamParser::new();

    let chunk = concat!(
        "event: thread.run.step.delta\n",
        "data: {\"id\":\"step_1\",\"delta\":{\"step_details\":{\"type\":\"tool_calls\",\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"type\":\"code_interpreter\",\"code_interpreter\":{\"input\":\"\"}}]}}}\n\n",
        "event: thread.run.step.delta\n",
        "data: {\"id\":\"step_1\",\"delta\":{\"step_details\":{\"type\":\"tool_calls\",\"tool_calls\":[{\"index\":0,\"type\":\"code_interpreter\",\"code_interpreter\":{\"input\":\"print(1)\"}}]}}}\n\n",
    );
    let events = parser.process(chunk.as_bytes()).expect("step delta parse");

    assert_eq!(
        events,
        vec![
            StreamEvent::ToolCallCreated {
                kind: ToolCallKind::Code
            },
            StreamEvent::ToolCallDelta {
                kind: ToolCallKind::Code,
                code_input: Some("print(1)".to_string()),
            },
        ]
    );
}

#[test]
fn test_requires_action_carries_function_calls() {
    let mut parser = StreamParser::new();

    let chunk = b"event: thread.run.requires_action\ndata: {\"id\":\"run_1\",\"status\":\"requires_action\",\"required_action\":{\"type\":\"submit_tool_outputs\",\"submit_tool_outputs\":{\"tool_calls\":[{\"id\":\"call_a\",\"type\":\"function\",\"function\":{\"name\":\"get_weather\",\"arguments\":\"{\\\"city\\\":\\\"Oslo\\\"}\"}}]}}}\n\n";
    let events = parser.process(chunk).expect("requires_action parse");

    match &events[..] {
        [StreamEvent::RunRequiresAction { run_id, tool_calls }] => {
            assert_eq!(run_id, "run_1");
            assert_eq!(tool_calls.len(), 1);
            assert_eq!(tool_calls[0].id, "call_a");
            assert_eq!(tool_calls[0].name, "get_weather");
            assert_eq!(tool_calls[0].arguments, "{\"city\":\"Oslo\"}");
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[test]
fn test_failed_run_reports_last_error() {
    let mut parser = StreamParser::new();

    let chunk = b"event: thread.run.failed\ndata: {\"id\":\"run_1\",\"status\":\"failed\",\"last_error\":{\"code\":\"rate_limit_exceeded\",\"message\":\"slow down\"}}\n\n";
    let events = parser.process(chunk).expect("failed parse");
    assert_eq!(
        events,
        vec![StreamEvent::RunFailed {
            reason: "slow down".to_string()
        }]
    );
}

#[test]
fn test_finish_flushes_unterminated_frame() {
    let mut parser = StreamParser::new();

    let events = parser
        .process(b"event: thread.run.completed\ndata: {}")
        .expect("partial frame");
    assert!(events.is_empty());
    assert_eq!(parser.finish(), vec![StreamEvent::RunCompleted]);
}
