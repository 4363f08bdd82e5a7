//! # Cross-Region Scenarios
//!
//! Three regions in one process, wired through in-process peers.
//!
//! ```text
//!   us-east-1 ──publish──→ relay_outbound ──→ eu-west-1.accept_relay
//!                                        └──→ ap-south-1.accept_relay
//!
//!   eu-west-1 / ap-south-1: dedup, dispatch locally, never relay again
//! ```

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use region_runtime::InProcessPeer;
    use shared_types::{Message, RegionId};
    use xr_03_dispatcher::{DispatcherConfig, SubscribeRequest};
    use xr_04_region_relay::{InboundOutcome, MockPeer, PeerEndpoint, RelayError};
    use xr_05_channel_bus::{ChannelApi, SubscriptionStream};

    use crate::integration::support::{
        assert_quiet, eventually, mesh, mesh_with_peer, next_payload, standalone, REGIONS,
    };

    fn region(name: &str) -> RegionId {
        RegionId::new(name)
    }

    async fn subscribe_everywhere(
        cluster: &region_runtime::RegionCluster,
        channel: &str,
    ) -> HashMap<String, SubscriptionStream> {
        let mut streams = HashMap::new();
        for node in cluster.nodes() {
            let (_, stream) = node
                .bus()
                .subscribe_stream(SubscribeRequest::channel(channel))
                .await
                .unwrap();
            streams.insert(node.region().as_str().to_string(), stream);
        }
        streams
    }

    // =========================================================================
    // NO AMPLIFICATION
    // =========================================================================

    /// A publishes; B and C receive exactly once; B does not forward to C.
    #[tokio::test]
    async fn test_publish_reaches_each_region_once() {
        let cluster = mesh();
        let mut streams = subscribe_everywhere(&cluster, "cars").await;

        let origin = cluster.node(&region("us-east-1")).unwrap();
        origin.bus().publish("cars", "c1").await.unwrap();
        cluster.wait_for_relays().await;

        for name in REGIONS {
            let stream = streams.get_mut(name).unwrap();
            assert_eq!(next_payload(stream).await, "c1", "region {name}");
            assert_quiet(stream).await;
        }

        for name in ["eu-west-1", "ap-south-1"] {
            let stats = cluster.node(&region(name)).unwrap().relay().stats();
            assert_eq!(stats.inbound_accepted, 1, "region {name}");
            assert_eq!(stats.published_out, 0, "region {name} relayed an inbound message");
            assert_eq!(stats.duplicates_dropped, 0, "region {name}");
            assert_eq!(stats.echoes_dropped, 0, "region {name}");
        }

        let origin_stats = origin.relay().stats();
        assert_eq!(origin_stats.published_out, 1);
        assert_eq!(origin_stats.peer_sends_ok, 2);
        assert_eq!(origin_stats.inbound_accepted, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishes_from_every_region() {
        let cluster = Arc::new(mesh());
        let mut streams = subscribe_everywhere(&cluster, "cars").await;

        let mut tasks = Vec::new();
        for node in cluster.nodes() {
            let node = Arc::clone(node);
            tasks.push(tokio::spawn(async move {
                for i in 0..20 {
                    let payload = format!("{}:{i}", node.region());
                    node.bus().publish("cars", &payload).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        cluster.wait_for_relays().await;

        for name in REGIONS {
            let stream = streams.get_mut(name).unwrap();
            let mut payloads = Vec::new();
            for _ in 0..60 {
                payloads.push(next_payload(stream).await);
            }
            assert_quiet(stream).await;

            payloads.sort();
            payloads.dedup();
            assert_eq!(payloads.len(), 60, "region {name} saw duplicates");
        }

        for node in cluster.nodes() {
            let stats = node.relay().stats();
            assert_eq!(stats.published_out, 20);
            assert_eq!(stats.inbound_accepted, 40);
            assert_eq!(stats.duplicates_dropped, 0);
        }
    }

    /// Whichever region publishes, every region's subscriber sees it.
    #[tokio::test]
    async fn test_publish_from_any_region_reaches_every_region() {
        let cluster = mesh();
        let mut streams = subscribe_everywhere(&cluster, "cars").await;

        for origin in REGIONS {
            let node = cluster.node(&region(origin)).unwrap();
            node.bus().publish("cars", &format!("from-{origin}")).await.unwrap();
            cluster.wait_for_relays().await;

            for name in REGIONS {
                let stream = streams.get_mut(name).unwrap();
                assert_eq!(
                    next_payload(stream).await,
                    format!("from-{origin}"),
                    "region {name}"
                );
            }
        }
        for name in REGIONS {
            assert_quiet(streams.get_mut(name).unwrap()).await;
        }
    }

    // =========================================================================
    // DEDUP AND ECHOES
    // =========================================================================

    #[tokio::test]
    async fn test_repeated_inbound_delivers_once() {
        let bus = standalone("eu-west-1", DispatcherConfig::default());
        let (_, mut stream) = bus
            .subscribe_stream(SubscribeRequest::channel("cars"))
            .await
            .unwrap();
        let peer = InProcessPeer::new(&bus);

        let message = Message::new("cars", "c1", region("us-east-1"));
        let first = peer.accept_relay(message.clone()).await.unwrap();
        let second = peer.accept_relay(message.clone()).await.unwrap();

        assert_eq!(first.outcome, InboundOutcome::Accepted { delivered: 1 });
        assert_eq!(second.outcome, InboundOutcome::Duplicate);
        assert_eq!(next_payload(&mut stream).await, "c1");
        assert_quiet(&mut stream).await;
    }

    #[tokio::test]
    async fn test_same_token_from_different_origins_is_distinct() {
        let bus = standalone("eu-west-1", DispatcherConfig::default());
        let (_, mut stream) = bus
            .subscribe_stream(SubscribeRequest::channel("cars"))
            .await
            .unwrap();

        let from_us = Message::new("cars", "us", region("us-east-1"));
        let mut from_ap = Message::new("cars", "ap", region("ap-south-1"));
        from_ap.dedup_token = from_us.dedup_token;

        assert!(bus.accept_relay(&from_us).unwrap().outcome.is_accepted());
        assert!(bus.accept_relay(&from_ap).unwrap().outcome.is_accepted());
        assert_eq!(next_payload(&mut stream).await, "us");
        assert_eq!(next_payload(&mut stream).await, "ap");
    }

    #[tokio::test]
    async fn test_echo_of_own_publish_is_dropped() {
        let cluster = mesh();
        let mut streams = subscribe_everywhere(&cluster, "cars").await;
        let origin = cluster.node(&region("us-east-1")).unwrap();

        let message = origin.bus().publish("cars", "c1").await.unwrap();
        cluster.wait_for_relays().await;

        let ack = origin.bus().accept_relay(&message).unwrap();
        assert_eq!(ack.outcome, InboundOutcome::OwnEcho);

        let stream = streams.get_mut("us-east-1").unwrap();
        assert_eq!(next_payload(stream).await, "c1");
        assert_quiet(stream).await;
    }

    #[tokio::test]
    async fn test_relay_outbound_refuses_foreign_messages() {
        let cluster = mesh();
        let node = cluster.node(&region("us-east-1")).unwrap();
        let foreign = Message::new("cars", "c1", region("eu-west-1"));

        assert!(matches!(
            node.relay().relay_outbound(&foreign).await,
            Err(RelayError::NotLocalOrigin { .. })
        ));
        assert_eq!(node.relay().stats().refused_outbound, 1);
    }

    // =========================================================================
    // PEER FAILURE ISOLATION
    // =========================================================================

    #[tokio::test]
    async fn test_unreachable_peer_does_not_block_others() {
        let dead = Arc::new(MockPeer::unreachable("sa-east-1"));
        let cluster = mesh_with_peer("us-east-1", dead.clone());
        let origin = cluster.node(&region("us-east-1")).unwrap();
        let mut streams = subscribe_everywhere(&cluster, "cars").await;

        assert!(origin.bus().publish("cars", "c1").await.is_ok());
        cluster.wait_for_relays().await;

        for name in ["eu-west-1", "ap-south-1"] {
            let stream = streams.get_mut(name).unwrap();
            assert_eq!(next_payload(stream).await, "c1", "region {name}");
        }
        assert_eq!(dead.attempts(), 3);
        let stats = origin.relay().stats();
        assert_eq!(stats.peer_sends_ok, 2);
        assert_eq!(stats.peer_sends_failed, 1);
    }

    #[tokio::test]
    async fn test_flaky_peer_recovers_within_retries() {
        let flaky = Arc::new(MockPeer::failing_first("sa-east-1", 2));
        let cluster = mesh_with_peer("us-east-1", flaky.clone());
        let origin = cluster.node(&region("us-east-1")).unwrap();

        let message = origin.bus().publish("cars", "c1").await.unwrap();
        cluster.wait_for_relays().await;

        assert!(eventually(|| flaky.received().len() == 1).await);
        assert_eq!(flaky.received()[0].dedup_token, message.dedup_token);
        assert_eq!(flaky.attempts(), 3);
    }

    #[tokio::test]
    async fn test_stopped_region_is_unreachable() {
        let cluster = mesh();
        let target = cluster.node(&region("eu-west-1")).unwrap();
        target.shutdown().await;

        let origin = cluster.node(&region("us-east-1")).unwrap();
        let report = origin
            .relay()
            .relay_outbound(&Message::new("cars", "c1", region("us-east-1")))
            .await
            .unwrap();

        assert_eq!(report.reached, vec![region("ap-south-1")]);
        assert_eq!(report.dropped, vec![region("eu-west-1")]);
        assert!(!report.is_complete());
    }
}
