//! # Invalidation Scenarios
//!
//! Control-plane termination versus client disconnect:
//!
//! | Path | Registry | Termination notice | Stream |
//! |------|----------|--------------------|--------|
//! | `invalidate` | removed | exactly one | `Terminated`, then end |
//! | `unsubscribe` | removed | none | end |

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{Message, RegionId, ATTR_NAME};
    use xr_01_filter_engine::{FilterExpr, Predicate};
    use xr_02_subscription_registry::RecordingSink;
    use xr_03_dispatcher::{DispatcherConfig, SubscribeRequest};
    use xr_05_channel_bus::{BusConfig, ChannelApi, Delivery};

    use crate::integration::support::{
        attrs, eventually, next, next_payload, standalone, standalone_with, QUIET, WAIT,
    };

    fn cars_invalidation() -> FilterExpr {
        FilterExpr::single(Predicate::eq(ATTR_NAME, "cars"))
    }

    #[tokio::test]
    async fn test_invalidated_subscription_leaves_registry() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let sink = Arc::new(RecordingSink::new());
        let id = bus
            .subscribe(
                SubscribeRequest::channel("cars").with_invalidation_filter(cars_invalidation()),
                sink.clone(),
            )
            .await
            .unwrap();

        let terminated = bus.invalidate(&attrs(&[(ATTR_NAME, "cars")])).await;
        assert_eq!(terminated, vec![id.clone()]);
        assert!(eventually(|| sink.terminated_count() == 1).await);

        let registry = bus.dispatcher().registry();
        assert!(!registry.contains(&id));
        let later = Message::new("cars", "after", RegionId::new("us-east-1"));
        assert_eq!(registry.query_matching(&later).count(), 0);

        bus.publish("cars", "after").await.unwrap();
        tokio::time::sleep(QUIET).await;
        assert_eq!(sink.delivered_count(), 0);
        assert_eq!(sink.terminated_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_invalidations_notify_once() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let sink = Arc::new(RecordingSink::new());
        bus.subscribe(
            SubscribeRequest::channel("cars").with_invalidation_filter(cars_invalidation()),
            sink.clone(),
        )
        .await
        .unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let bus = Arc::clone(&bus);
            tasks.push(tokio::spawn(async move {
                bus.invalidate(&attrs(&[(ATTR_NAME, "cars")])).await.len()
            }));
        }
        let mut total = 0;
        for task in tasks {
            total += task.await.unwrap();
        }

        assert_eq!(total, 1);
        assert!(eventually(|| sink.terminated_count() == 1).await);
        tokio::time::sleep(QUIET).await;
        assert_eq!(sink.terminated_count(), 1);
        assert_eq!(bus.dispatcher().stats().subscriptions_invalidated, 1);
    }

    /// One client stops reading with a full stream buffer; the others are
    /// still terminated promptly and the slow one gets its notice last.
    #[tokio::test]
    async fn test_unread_stream_does_not_block_invalidation() {
        let bus = standalone_with(
            "us-east-1",
            DispatcherConfig::default(),
            BusConfig {
                stream_buffer: 1,
                ..BusConfig::default()
            },
        );
        let mut streams = Vec::new();
        for _ in 0..4 {
            let (_, stream) = bus
                .subscribe_stream(
                    SubscribeRequest::channel("cars")
                        .with_invalidation_filter(cars_invalidation()),
                )
                .await
                .unwrap();
            streams.push(stream);
        }

        bus.publish("cars", "c1").await.unwrap();
        assert!(eventually(|| bus.dispatcher().stats().deliveries_succeeded == 4).await);
        let (unread, readers) = streams.split_first_mut().unwrap();
        for stream in readers.iter_mut() {
            assert_eq!(next_payload(stream).await, "c1");
        }

        let terminated = tokio::time::timeout(WAIT, bus.invalidate(&attrs(&[(ATTR_NAME, "cars")])))
            .await
            .unwrap();
        assert_eq!(terminated.len(), 4);
        assert!(bus.dispatcher().registry().is_empty());

        for stream in readers.iter_mut() {
            assert_eq!(next(stream).await, Some(Delivery::Terminated));
            assert_eq!(next(stream).await, None);
        }
        assert_eq!(next_payload(unread).await, "c1");
        assert_eq!(next(unread).await, Some(Delivery::Terminated));
        assert_eq!(next(unread).await, None);
    }

    #[tokio::test]
    async fn test_invalidation_only_hits_matching_filters() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let (cars_id, mut cars) = bus
            .subscribe_stream(
                SubscribeRequest::channel("cars").with_invalidation_filter(cars_invalidation()),
            )
            .await
            .unwrap();
        let (_, mut music) = bus
            .subscribe_stream(
                SubscribeRequest::channel("music").with_invalidation_filter(FilterExpr::single(
                    Predicate::eq(ATTR_NAME, "music"),
                )),
            )
            .await
            .unwrap();
        let (_, mut plain) = bus
            .subscribe_stream(SubscribeRequest::channel("cars"))
            .await
            .unwrap();

        let terminated = bus.invalidate(&attrs(&[(ATTR_NAME, "cars")])).await;
        assert_eq!(terminated, vec![cars_id]);

        assert_eq!(next(&mut cars).await, Some(Delivery::Terminated));
        assert_eq!(next(&mut cars).await, None);

        bus.publish("music", "m1").await.unwrap();
        bus.publish("cars", "c1").await.unwrap();
        assert!(matches!(next(&mut music).await, Some(Delivery::Message(_))));
        assert!(matches!(next(&mut plain).await, Some(Delivery::Message(_))));
    }

    #[tokio::test]
    async fn test_unsubscribe_sends_no_notice() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let sink = Arc::new(RecordingSink::new());
        let id = bus
            .subscribe(
                SubscribeRequest::channel("cars").with_invalidation_filter(cars_invalidation()),
                sink.clone(),
            )
            .await
            .unwrap();

        assert!(bus.unsubscribe(&id).await);
        assert!(!bus.unsubscribe(&id).await);
        assert!(bus
            .invalidate(&attrs(&[(ATTR_NAME, "cars")]))
            .await
            .is_empty());

        bus.publish("cars", "c1").await.unwrap();
        tokio::time::sleep(QUIET).await;
        assert_eq!(sink.delivered_count(), 0);
        assert_eq!(sink.terminated_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_ends_stream() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let (id, mut stream) = bus
            .subscribe_stream(SubscribeRequest::channel("cars"))
            .await
            .unwrap();

        assert!(bus.unsubscribe(&id).await);
        assert_eq!(next(&mut stream).await, None);
    }
}
