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

//! Demo runner for `channel-dispatch`.
//!
//! Channels are bound to logging targets and served by the in-process
//! loopback bus, so no real endpoint is contacted. Embedders supply their own
//! `TransportConnector` to reach a server.

mod logging_target;

use crate::logging_target::{reachable_target_names, LoggingTarget};
use channel_dispatch::{ChannelDispatcherBuilder, ClientConfig, DispatchError};
use clap::Parser;
use integration_test_utils::{LoopbackBus, LoopbackConnector};
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const RUNNING_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command()]
struct DispatcherArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
    /// Publish one probe message on every configured channel once running.
    #[arg(long)]
    probe: bool,
}

fn main() -> Result<(), DispatchError> {
    let _ = tracing_subscriber::fmt::try_init();

    info!("Started configurable-dispatcher");

    let args = DispatcherArgs::parse();
    let config = ClientConfig::from_file(&args.config)?;
    let channels: Vec<String> = config
        .channels
        .iter()
        .map(|spec| spec.name().to_string())
        .collect();

    let builder = reachable_target_names(&config)
        .into_iter()
        .fold(ChannelDispatcherBuilder::new(config), |builder, name| {
            let target = Arc::new(LoggingTarget::new(&name));
            builder.register_handler(name, target)
        });
    let connector = LoopbackConnector::new(LoopbackBus::new());
    let mut dispatcher = builder.build(Arc::new(connector));

    dispatcher.start()?;
    if !dispatcher.wait_for_running(RUNNING_TIMEOUT) {
        warn!(state = %dispatcher.state(), "dispatcher did not come up");
        return Err(DispatchError::NotRunning);
    }

    for handler in dispatcher.resolved_handlers() {
        info!(
            topic = handler.topic(),
            target_name = handler.target_name(),
            action = handler.action(),
            "channel bound"
        );
    }

    if args.probe {
        for channel in &channels {
            dispatcher.publish(channel, json!({ "probe": channel }))?;
        }
    }

    thread::park();

    Ok(())
}
