/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use channel_dispatch::{ClientConfig, HandlerTarget, StructuredTopic, DEFAULT_HANDLER_ACTION};
use integration_test_utils::{RecordedCall, RecordingTarget};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use support::{loopback, make_dispatcher, start_and_wait, ENDPOINT};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn published_messages_reach_derived_target_in_order() {
    integration_test_utils::init_logging();
    let (_bus, connector) = loopback();
    let chat = RecordingTarget::new();
    let config = ClientConfig::new(ENDPOINT)
        .with_handler_namespace("App")
        .with_channel("/chat/room");
    let targets: [(&str, Arc<dyn HandlerTarget>); 1] =
        [("App::Chat::RoomHandler", Arc::new(chat.clone()))];
    let mut dispatcher = make_dispatcher(config, &targets, &connector);
    start_and_wait(&mut dispatcher);

    for n in 0..10 {
        dispatcher
            .publish("/chat/room", json!({ "seq": n }))
            .expect("publish while running");
    }

    assert!(chat.wait_for_calls(10, DELIVERY_TIMEOUT));
    let seqs: Vec<i64> = chat
        .calls()
        .iter()
        .map(|call| call.payload["seq"].as_i64().expect("seq is a number"))
        .collect();
    assert_eq!(seqs, (0..10).collect::<Vec<_>>());
    assert!(chat
        .calls()
        .iter()
        .all(|call| call.action == DEFAULT_HANDLER_ACTION && call.topic == "/chat/room"));

    dispatcher.stop().expect("stop");
}

#[test]
fn structured_channel_uses_explicit_target_and_action() {
    integration_test_utils::init_logging();
    let (_bus, connector) = loopback();
    let audit = RecordingTarget::new();
    let config = ClientConfig::new(ENDPOINT).with_channel(
        StructuredTopic::new("/foofoo")
            .with_handler_target("FooFooHandlerClass")
            .with_handler_action("foofoo_handler_method"),
    );
    let targets: [(&str, Arc<dyn HandlerTarget>); 1] =
        [("FooFooHandlerClass", Arc::new(audit.clone()))];
    let mut dispatcher = make_dispatcher(config, &targets, &connector);
    start_and_wait(&mut dispatcher);

    dispatcher
        .publish("/foofoo", json!("payload"))
        .expect("publish while running");

    assert!(audit.wait_for_calls(1, DELIVERY_TIMEOUT));
    assert_eq!(
        audit.calls(),
        vec![RecordedCall {
            action: "foofoo_handler_method".to_string(),
            topic: "/foofoo".to_string(),
            payload: json!("payload"),
        }]
    );

    dispatcher.stop().expect("stop");
}

#[test]
fn unmatched_channel_falls_back_to_configured_default() {
    integration_test_utils::init_logging();
    let (_bus, connector) = loopback();
    let fallback = RecordingTarget::new();
    let config = ClientConfig::new(ENDPOINT)
        .with_handler_namespace("App")
        .with_channel("/unknown")
        .with_default_handler_target("MyDefaultHandler")
        .with_default_handler_action("my_default_action");
    let targets: [(&str, Arc<dyn HandlerTarget>); 1] =
        [("MyDefaultHandler", Arc::new(fallback.clone()))];
    let mut dispatcher = make_dispatcher(config, &targets, &connector);
    start_and_wait(&mut dispatcher);

    dispatcher
        .publish("/unknown", json!(42))
        .expect("publish while running");

    assert!(fallback.wait_for_calls(1, DELIVERY_TIMEOUT));
    let calls = fallback.calls();
    assert_eq!(calls[0].action, "my_default_action");
    assert_eq!(calls[0].topic, "/unknown");

    dispatcher.stop().expect("stop");
}

#[tokio::test(flavor = "multi_thread")]
async fn messages_from_other_publishers_are_dispatched() {
    integration_test_utils::init_logging();
    let (bus, connector) = loopback();
    let news = RecordingTarget::new();
    let config = ClientConfig::new(ENDPOINT).with_channel("/news");
    let targets: [(&str, Arc<dyn HandlerTarget>); 1] = [("NewsHandler", Arc::new(news.clone()))];
    let mut dispatcher = make_dispatcher(config, &targets, &connector);

    tokio::task::block_in_place(|| start_and_wait(&mut dispatcher));
    assert_eq!(bus.deliver("/news", json!({"headline": "hi"})).await, 1);

    assert_eq!(news.call_count(), 1);
    tokio::task::block_in_place(|| dispatcher.stop()).expect("stop");
    assert_eq!(bus.deliver("/news", json!({"headline": "late"})).await, 0);
    assert_eq!(news.call_count(), 1);
}

#[test]
fn stop_delivers_every_publish_accepted_before_it() {
    integration_test_utils::init_logging();
    let (_bus, connector) = loopback();
    let sink = RecordingTarget::new();
    let config = ClientConfig::new(ENDPOINT).with_channel("/p");
    let targets: [(&str, Arc<dyn HandlerTarget>); 1] = [("PHandler", Arc::new(sink.clone()))];
    let mut dispatcher = make_dispatcher(config, &targets, &connector);

    for round in 0..10 {
        start_and_wait(&mut dispatcher);
        for n in 0..20 {
            dispatcher
                .publish("/p", json!({ "round": round, "seq": n }))
                .expect("publish while running");
        }
        dispatcher.stop().expect("stop");

        assert_eq!(sink.call_count(), (round + 1) * 20, "round {round}");
    }
}

#[test]
fn transport_publish_failure_is_logged_not_returned() {
    integration_test_utils::init_logging();
    let (_bus, connector) = loopback();
    let connector = connector.fail_publish("/x");
    let refused = RecordingTarget::new();
    let accepted = RecordingTarget::new();
    let config = ClientConfig::new(ENDPOINT).with_channels(["/x", "/y"]);
    let targets: [(&str, Arc<dyn HandlerTarget>); 2] = [
        ("XHandler", Arc::new(refused.clone())),
        ("YHandler", Arc::new(accepted.clone())),
    ];
    let mut dispatcher = make_dispatcher(config, &targets, &connector);
    start_and_wait(&mut dispatcher);

    dispatcher
        .publish("/x", json!("lost"))
        .expect("hand-off succeeds even though the transport refuses");
    dispatcher
        .publish("/y", json!("kept"))
        .expect("publish while running");

    assert!(accepted.wait_for_calls(1, DELIVERY_TIMEOUT));
    assert!(dispatcher.is_running());
    dispatcher.stop().expect("stop");

    assert_eq!(refused.call_count(), 0);
    assert_eq!(accepted.calls()[0].payload, json!("kept"));
}
