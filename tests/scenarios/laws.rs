//! Test: properties that hold for every chain

use crate::helpers::*;
use toolpipe::core::{NodeStatus, PipelineModel};

const CHAINS: &[&[&str]] = &[
    &["base64-encode"],
    &["uppercase", "base64-encode", "sha256"],
    &["url-encode", "url-decode", "lowercase"],
    &["json-minify", "json-format"],
    &["base64-decode", "uppercase"],
];

const INPUTS: &[&str] = &["hello", "", r#"{ "k": [1, 2] }"#, "a b&c/d", "aGk="];

#[tokio::test]
async fn test_execution_is_deterministic() {
    let (engine, _) = test_engine();

    for transforms in CHAINS {
        for input in INPUTS {
            let (model, _) = chain(&engine, input, transforms);
            let first = engine.execute(&model).await;
            let second = engine.execute(&model).await;
            assert_eq!(first, second, "chain {:?} on {:?}", transforms, input);
        }
    }
}

#[tokio::test]
async fn test_empty_chain_is_identity() {
    let (engine, _) = test_engine();

    for input in INPUTS {
        let (model, _) = chain(&engine, input, &[]);
        let trace = engine.execute(&model).await;
        assert!(trace.results.is_empty());
        assert_eq!(trace.final_output, *input);
    }
}

#[tokio::test]
async fn test_nothing_runs_after_first_error() {
    let (engine, recorder) = test_engine();

    for position in 0..3 {
        let mut transforms = vec!["uppercase"; 3];
        transforms[position] = "always-fail";
        transforms.push("recorder");

        let (model, _) = chain(&engine, "abc", &transforms);
        let trace = engine.execute(&model).await;

        assert_halted_at(&trace, position);
        let expected = if position == 0 { "abc" } else { "ABC" };
        assert_eq!(trace.final_output, expected);
    }

    assert!(recorder.inputs().is_empty(), "recorder ran after an error");
}

#[tokio::test]
async fn test_disabled_nodes_are_transparent() {
    let (engine, _) = test_engine();

    let (mut with_skips, ids) = chain(
        &engine,
        "Hello World",
        &["lowercase", "sha256", "base64-encode", "uppercase"],
    );
    with_skips.toggle_node(&ids[1]);
    with_skips.toggle_node(&ids[3]);
    let (without, _) = chain(&engine, "Hello World", &["lowercase", "base64-encode"]);

    let skipped = engine.execute(&with_skips).await;
    let plain = engine.execute(&without).await;

    assert_eq!(skipped.final_output, plain.final_output);
    assert_eq!(skipped.count(NodeStatus::Skipped), 2);
    assert_eq!(skipped.count(NodeStatus::Success), 2);

    // a skipped node passes on exactly what it received
    assert_eq!(output_of(&skipped, 1), output_of(&skipped, 0));
}

#[tokio::test]
async fn test_every_node_is_reported_until_halt() {
    let (engine, _) = test_engine();
    let (mut model, ids) = chain(&engine, "x", &["uppercase", "always-fail", "lowercase"]);
    model.toggle_node(&ids[0]);

    let trace = engine.execute(&model).await;

    assert_eq!(statuses(&trace), vec![NodeStatus::Skipped, NodeStatus::Error]);
    for (result, id) in trace.results.iter().zip(&ids) {
        assert_eq!(&result.node_id, id);
    }
    assert!(trace.result_for(&ids[2]).is_none());
}

#[tokio::test]
async fn test_serialized_model_runs_identically() {
    let (engine, _) = test_engine();

    for transforms in CHAINS {
        let (mut model, ids) = chain(&engine, "round trip", transforms);
        model.toggle_node(&ids[0]);

        let restored = PipelineModel::from_serialized(model.serialize()).unwrap();
        assert_eq!(restored, model);

        let json = model.to_json().unwrap();
        assert_eq!(PipelineModel::from_json(&json).unwrap(), model);

        assert_eq!(engine.execute(&restored).await, engine.execute(&model).await);
    }
}
