#![allow(dead_code)]

use channel_dispatch::{ChannelDispatcher, ChannelDispatcherBuilder, ClientConfig, HandlerTarget};
use integration_test_utils::{LoopbackBus, LoopbackConnector};
use std::sync::Arc;
use std::time::Duration;

pub(crate) const ENDPOINT: &str = "loopback://dispatch-tests";
pub(crate) const RUNNING_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn loopback() -> (LoopbackBus, LoopbackConnector) {
    let bus = LoopbackBus::new();
    let connector = LoopbackConnector::new(bus.clone());
    (bus, connector)
}

pub(crate) fn make_dispatcher(
    config: ClientConfig,
    targets: &[(&str, Arc<dyn HandlerTarget>)],
    connector: &LoopbackConnector,
) -> ChannelDispatcher {
    targets
        .iter()
        .fold(ChannelDispatcherBuilder::new(config), |builder, (name, target)| {
            builder.register_handler(*name, target.clone())
        })
        .build(Arc::new(connector.clone()))
}

pub(crate) fn start_and_wait(dispatcher: &mut ChannelDispatcher) {
    dispatcher.start().expect("start should succeed");
    assert!(
        dispatcher.wait_for_running(RUNNING_TIMEOUT),
        "dispatcher did not reach the running state"
    );
}
