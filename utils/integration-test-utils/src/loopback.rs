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

//! In-process pub/sub bus standing in for a real transport.

use async_trait::async_trait;
use channel_dispatch::{
    MessageListener, Payload, PubSubClient, TransportConnector, TransportError, TransportState,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::debug;

type Subscriptions = HashMap<String, Vec<(u64, Arc<dyn MessageListener>)>>;

/// Topic-to-listener table shared by every client of one loopback "server".
#[derive(Clone, Default)]
pub struct LoopbackBus {
    subscriptions: Arc<Mutex<Subscriptions>>,
}

impl LoopbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `payload` to every current subscriber of `topic`, in subscription order.
    ///
    /// Returns how many listeners received it.
    pub async fn deliver(&self, topic: &str, payload: Payload) -> usize {
        let listeners: Vec<Arc<dyn MessageListener>> = self
            .subscriptions
            .lock()
            .expect("lock loopback subscriptions")
            .get(topic)
            .map(|entries| entries.iter().map(|(_, listener)| listener.clone()).collect())
            .unwrap_or_default();

        debug!(topic, listeners = listeners.len(), "loopback delivery");
        for listener in &listeners {
            listener.on_receive(topic, payload.clone()).await;
        }
        listeners.len()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.subscriptions
            .lock()
            .expect("lock loopback subscriptions")
            .get(topic)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Topics with at least one live subscriber, sorted.
    pub fn subscribed_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self
            .subscriptions
            .lock()
            .expect("lock loopback subscriptions")
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(topic, _)| topic.clone())
            .collect();
        topics.sort();
        topics
    }

    fn add(&self, client_id: u64, topic: &str, listener: Arc<dyn MessageListener>) {
        self.subscriptions
            .lock()
            .expect("lock loopback subscriptions")
            .entry(topic.to_string())
            .or_default()
            .push((client_id, listener));
    }

    fn remove_client(&self, client_id: u64) {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .expect("lock loopback subscriptions");
        for entries in subscriptions.values_mut() {
            entries.retain(|(owner, _)| *owner != client_id);
        }
        subscriptions.retain(|_, entries| !entries.is_empty());
    }
}

/// Failure injection and call accounting shared between a connector and its clients.
#[derive(Default)]
struct Script {
    refuse_connect: AtomicBool,
    failing_topics: Mutex<HashSet<String>>,
    failing_publish_topics: Mutex<HashSet<String>>,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    subscribe_calls: Mutex<HashMap<String, usize>>,
}

/// Opens [`LoopbackClient`]s on a [`LoopbackBus`].
#[derive(Clone)]
pub struct LoopbackConnector {
    bus: LoopbackBus,
    script: Arc<Script>,
    next_client_id: Arc<AtomicU64>,
    clients: Arc<Mutex<Vec<Weak<LoopbackClient>>>>,
}

impl LoopbackConnector {
    pub fn new(bus: LoopbackBus) -> Self {
        Self {
            bus,
            script: Arc::new(Script::default()),
            next_client_id: Arc::new(AtomicU64::new(1)),
            clients: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn bus(&self) -> &LoopbackBus {
        &self.bus
    }

    /// Makes every following `connect` fail.
    pub fn refuse_connections(self) -> Self {
        self.script.refuse_connect.store(true, Ordering::SeqCst);
        self
    }

    /// Makes every following subscription to `topic` fail.
    pub fn fail_subscribe(self, topic: &str) -> Self {
        self.script
            .failing_topics
            .lock()
            .expect("lock failing topics")
            .insert(topic.to_string());
        self
    }

    /// Makes every following publish to `topic` fail.
    pub fn fail_publish(self, topic: &str) -> Self {
        self.script
            .failing_publish_topics
            .lock()
            .expect("lock failing publish topics")
            .insert(topic.to_string());
        self
    }

    /// Cuts every live client as if the server went away. Not counted as a disconnect.
    pub fn drop_connections(&self) {
        let clients: Vec<Arc<LoopbackClient>> = self
            .clients
            .lock()
            .expect("lock loopback clients")
            .drain(..)
            .filter_map(|client| client.upgrade())
            .collect();
        for client in clients {
            if client.connected.swap(false, Ordering::SeqCst) {
                self.bus.remove_client(client.client_id);
                debug!(client_id = client.client_id, "loopback client dropped");
            }
        }
    }

    pub fn connect_count(&self) -> usize {
        self.script.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.script.disconnects.load(Ordering::SeqCst)
    }

    /// How many times `topic` was subscribed across every client, including failed attempts.
    pub fn subscribe_count(&self, topic: &str) -> usize {
        self.script
            .subscribe_calls
            .lock()
            .expect("lock subscribe calls")
            .get(topic)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl TransportConnector for LoopbackConnector {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn PubSubClient>, TransportError> {
        self.script.connects.fetch_add(1, Ordering::SeqCst);
        if self.script.refuse_connect.load(Ordering::SeqCst) {
            return Err(TransportError::Connect {
                endpoint: endpoint.to_string(),
                reason: "loopback connection refused".to_string(),
            });
        }

        let client_id = self.next_client_id.fetch_add(1, Ordering::SeqCst);
        debug!(endpoint, client_id, "loopback client connected");
        let client = Arc::new(LoopbackClient {
            client_id,
            bus: self.bus.clone(),
            script: self.script.clone(),
            connected: AtomicBool::new(true),
        });
        self.clients
            .lock()
            .expect("lock loopback clients")
            .push(Arc::downgrade(&client));
        Ok(client)
    }
}

/// One connection to a [`LoopbackBus`].
pub struct LoopbackClient {
    client_id: u64,
    bus: LoopbackBus,
    script: Arc<Script>,
    connected: AtomicBool,
}

impl LoopbackClient {
    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }
}

#[async_trait]
impl PubSubClient for LoopbackClient {
    async fn subscribe(
        &self,
        topic: &str,
        listener: Arc<dyn MessageListener>,
    ) -> Result<(), TransportError> {
        self.ensure_connected()?;
        *self
            .script
            .subscribe_calls
            .lock()
            .expect("lock subscribe calls")
            .entry(topic.to_string())
            .or_default() += 1;

        let failing = self
            .script
            .failing_topics
            .lock()
            .expect("lock failing topics")
            .contains(topic);
        if failing {
            return Err(TransportError::Subscribe {
                topic: topic.to_string(),
                reason: "loopback subscription refused".to_string(),
            });
        }

        self.bus.add(self.client_id, topic, listener);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Payload) -> Result<(), TransportError> {
        self.ensure_connected()?;
        let failing = self
            .script
            .failing_publish_topics
            .lock()
            .expect("lock failing publish topics")
            .contains(topic);
        if failing {
            return Err(TransportError::Publish {
                topic: topic.to_string(),
                reason: "loopback publish refused".to_string(),
            });
        }

        self.bus.deliver(topic, payload).await;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if self.connected.swap(false, Ordering::SeqCst) {
            self.bus.remove_client(self.client_id);
            self.script.disconnects.fetch_add(1, Ordering::SeqCst);
            debug!(client_id = self.client_id, "loopback client disconnected");
        }
        Ok(())
    }

    fn state(&self) -> TransportState {
        if self.connected.load(Ordering::SeqCst) {
            TransportState::Connected
        } else {
            TransportState::Disconnected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{LoopbackBus, LoopbackConnector};
    use async_trait::async_trait;
    use channel_dispatch::{
        MessageListener, Payload, TransportConnector, TransportError, TransportState,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<Payload>>,
    }

    #[async_trait]
    impl MessageListener for Collect {
        async fn on_receive(&self, _topic: &str, payload: Payload) {
            self.seen.lock().unwrap().push(payload);
        }
    }

    #[tokio::test]
    async fn disconnect_removes_only_that_clients_subscriptions() {
        let bus = LoopbackBus::new();
        let connector = LoopbackConnector::new(bus.clone());
        let first = connector.connect("mem://").await.unwrap();
        let second = connector.connect("mem://").await.unwrap();
        let listener = Arc::new(Collect::default());

        first.subscribe("/a", listener.clone()).await.unwrap();
        second.subscribe("/a", listener.clone()).await.unwrap();
        assert_eq!(bus.subscriber_count("/a"), 2);

        first.disconnect().await.unwrap();
        assert_eq!(first.state(), TransportState::Disconnected);
        assert_eq!(bus.subscriber_count("/a"), 1);

        second.publish("/a", json!(1)).await.unwrap();
        assert_eq!(*listener.seen.lock().unwrap(), vec![json!(1)]);
        assert_eq!(
            first.publish("/a", json!(2)).await,
            Err(TransportError::NotConnected)
        );
    }

    #[tokio::test]
    async fn dropped_connections_lose_subscriptions_without_disconnecting() {
        let bus = LoopbackBus::new();
        let connector = LoopbackConnector::new(bus.clone());
        let client = connector.connect("mem://").await.unwrap();
        client
            .subscribe("/a", Arc::new(Collect::default()))
            .await
            .unwrap();

        connector.drop_connections();

        assert_eq!(client.state(), TransportState::Disconnected);
        assert!(bus.subscribed_topics().is_empty());
        assert_eq!(connector.disconnect_count(), 0);
    }

    #[tokio::test]
    async fn scripted_failures_are_reported_and_counted() {
        let connector = LoopbackConnector::new(LoopbackBus::new()).fail_subscribe("/bad");
        let client = connector.connect("mem://").await.unwrap();

        assert!(client
            .subscribe("/bad", Arc::new(Collect::default()))
            .await
            .is_err());
        assert_eq!(connector.subscribe_count("/bad"), 1);
        assert!(connector.bus().subscribed_topics().is_empty());

        let refusing = LoopbackConnector::new(LoopbackBus::new()).refuse_connections();
        assert!(refusing.connect("mem://").await.is_err());
        assert_eq!(refusing.connect_count(), 1);
    }
}
