//! Test: concrete chains over the built-in catalog

use crate::helpers::*;
use toolpipe::core::NodeStatus;

#[tokio::test]
async fn test_base64_encode_hello() {
    let (engine, _) = test_engine();
    let (model, _) = chain(&engine, "hello", &["base64-encode"]);

    let trace = engine.execute(&model).await;

    assert_eq!(statuses(&trace), vec![NodeStatus::Success]);
    assert_eq!(output_of(&trace, 0), Some("aGVsbG8="));
    assert_eq!(trace.final_output, "aGVsbG8=");
}

#[tokio::test]
async fn test_base64_decode_garbage_keeps_input() {
    let (engine, _) = test_engine();
    let (model, _) = chain(&engine, "not-base64!", &["base64-decode"]);

    let trace = engine.execute(&model).await;

    assert_halted_at(&trace, 0);
    assert!(trace.results[0].error.is_some());
    assert_eq!(trace.final_output, "not-base64!");
}

#[tokio::test]
async fn test_encode_then_json_format_stops_at_formatter() {
    let (engine, recorder) = test_engine();
    let (model, _) = chain(&engine, "hello", &["base64-encode", "recorder", "json-format"]);

    let trace = engine.execute(&model).await;

    assert_eq!(output_of(&trace, 0), Some("aGVsbG8="));
    // the formatter sees exactly what the encoder produced
    assert_eq!(recorder.inputs(), vec!["aGVsbG8="]);
    assert_halted_at(&trace, 2);
    assert_eq!(trace.final_output, "aGVsbG8=");
}

#[tokio::test]
async fn test_disabled_encoder_then_uppercase() {
    let (engine, _) = test_engine();
    let (mut model, ids) = chain(&engine, "hi", &["base64-encode", "uppercase"]);
    model.toggle_node(&ids[0]);

    let trace = engine.execute(&model).await;

    assert_eq!(statuses(&trace), vec![NodeStatus::Skipped, NodeStatus::Success]);
    assert_eq!(output_of(&trace, 0), Some("hi"));
    assert_eq!(output_of(&trace, 1), Some("HI"));
    assert_eq!(trace.final_output, "HI");
}

#[tokio::test(start_paused = true)]
async fn test_async_transform_output_feeds_next_node() {
    let (engine, recorder) = test_engine();
    let (model, _) = chain(&engine, "slow start", &["slow-upper", "recorder", "base64-encode"]);

    let trace = engine.execute(&model).await;

    assert!(trace.is_complete());
    assert_eq!(recorder.inputs(), vec!["SLOW START"]);
    assert_eq!(trace.final_output, "U0xPVyBTVEFSVA==");
}

#[tokio::test]
async fn test_node_options_reach_transform() {
    let (engine, _) = test_engine();
    let (mut model, ids) = chain(&engine, r#"{"a":1}"#, &["json-format"]);

    let mut partial = toolpipe::Options::new();
    partial.insert("indent".to_string(), serde_json::json!(0));
    model.update_node_options(&ids[0], &partial);

    let trace = engine.execute(&model).await;
    assert_eq!(trace.final_output, r#"{"a":1}"#);
}

#[tokio::test]
async fn test_empty_input_is_not_an_error() {
    let (engine, _) = test_engine();
    let (model, _) = chain(&engine, "", &["base64-encode", "uppercase"]);

    let trace = engine.execute(&model).await;

    assert!(trace.is_complete());
    assert_eq!(trace.final_output, "");
}

#[tokio::test]
async fn test_panicking_transform_becomes_node_error() {
    let (engine, recorder) = test_engine();
    let (model, _) = chain(&engine, "boom", &["uppercase", "panicker", "recorder"]);

    let trace = engine.execute(&model).await;

    assert_halted_at(&trace, 1);
    let error = trace.results[1].error.as_deref().unwrap();
    assert!(error.contains("cannot handle"), "unexpected error: {}", error);
    assert_eq!(trace.final_output, "BOOM");
    assert!(recorder.inputs().is_empty());
}

#[tokio::test]
async fn test_restored_unknown_transform_halts_run() {
    let (engine, _) = test_engine();
    let json = r#"{
        "input": "keep me",
        "nodes": [
            { "nodeId": "n1", "transformId": "uppercase", "options": {}, "enabled": true },
            { "nodeId": "n2", "transformId": "rot13", "options": {}, "enabled": true }
        ]
    }"#;
    let model = toolpipe::PipelineModel::from_json(json).unwrap();

    let trace = engine.execute(&model).await;

    assert_halted_at(&trace, 1);
    assert_eq!(trace.results[1].error.as_deref(), Some("unknown transform"));
    assert_eq!(trace.final_output, "KEEP ME");
}
