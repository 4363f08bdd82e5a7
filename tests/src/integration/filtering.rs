//! # Filtering Scenarios
//!
//! Local fan-out through the channel bus: which subscriptions a publish
//! reaches, and in what order.
//!
//! ```text
//! publish("cars") ──→ Dispatcher ──→ query_matching ──→ worker ──→ sink
//!                                     │
//!                                     └─ channel selector, then filter groups
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{RegionId, ATTR_NAME, ATTR_ORIGIN_REGION};
    use xr_01_filter_engine::{FilterError, FilterExpr, FilterGroup, Predicate};
    use xr_02_subscription_registry::RecordingSink;
    use xr_03_dispatcher::{DispatchError, DispatcherConfig, SubscribeRequest};
    use xr_05_channel_bus::{BusError, ChannelApi};

    use crate::integration::support::{
        assert_quiet, eventually, next_payload, standalone, QUIET,
    };

    // =========================================================================
    // DELIVERY IFF THE FILTER MATCHES
    // =========================================================================

    /// One row per filter shape, published against `cars` and `music`.
    #[tokio::test]
    async fn test_delivery_table() {
        let bus = standalone("us-east-1", DispatcherConfig::default());

        let rows: Vec<(&str, SubscribeRequest, [bool; 2])> = vec![
            ("no filter", SubscribeRequest::any_channel(), [true, true]),
            (
                "zero groups",
                SubscribeRequest::any_channel().with_filter(FilterExpr::deny_all()),
                [false, false],
            ),
            (
                "empty group",
                SubscribeRequest::any_channel()
                    .with_filter(FilterExpr::new(vec![FilterGroup::unconstrained()])),
                [true, true],
            ),
            (
                "name in [cars, robots]",
                SubscribeRequest::any_channel().with_filter(FilterExpr::single(
                    Predicate::is_in(ATTR_NAME, ["cars", "robots"]),
                )),
                [true, false],
            ),
            (
                "exact channel music",
                SubscribeRequest::channel("music"),
                [false, true],
            ),
            (
                "name = cars AND origin = us-east-1",
                SubscribeRequest::any_channel().with_filter(FilterExpr::new(vec![
                    FilterGroup::any_of(vec![Predicate::eq(ATTR_NAME, "cars")]),
                    FilterGroup::any_of(vec![Predicate::eq(ATTR_ORIGIN_REGION, "us-east-1")]),
                ])),
                [true, false],
            ),
            (
                "name = cars AND origin = eu-west-1",
                SubscribeRequest::any_channel().with_filter(FilterExpr::new(vec![
                    FilterGroup::any_of(vec![Predicate::eq(ATTR_NAME, "cars")]),
                    FilterGroup::any_of(vec![Predicate::eq(ATTR_ORIGIN_REGION, "eu-west-1")]),
                ])),
                [false, false],
            ),
            (
                "missing attribute",
                SubscribeRequest::any_channel()
                    .with_filter(FilterExpr::single(Predicate::eq("color", "red"))),
                [false, false],
            ),
        ];

        let mut sinks = Vec::new();
        for (label, request, expected) in rows {
            let sink = Arc::new(RecordingSink::new());
            bus.subscribe(request, sink.clone()).await.unwrap();
            sinks.push((label, sink, expected));
        }

        bus.publish("cars", "cars").await.unwrap();
        bus.publish("music", "music").await.unwrap();
        tokio::time::sleep(QUIET).await;

        for (label, sink, [cars, music]) in sinks {
            let mut expected = Vec::new();
            if cars {
                expected.push("cars".to_string());
            }
            if music {
                expected.push("music".to_string());
            }
            assert_eq!(sink.payloads(), expected, "row: {label}");
        }
    }

    /// Scenario: filter `name in [cars, robots]`; cars delivered, music not.
    #[tokio::test]
    async fn test_cars_and_robots_scenario() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let filter = FilterExpr::from_json(
            r#"{"groups":[{"predicates":[{"field":"name","op":"in","value":["cars","robots"]}]}]}"#,
        )
        .unwrap();
        let (_, mut stream) = bus
            .subscribe_stream(SubscribeRequest::any_channel().with_filter(filter))
            .await
            .unwrap();

        bus.publish("cars", "c1").await.unwrap();
        bus.publish("music", "m1").await.unwrap();
        bus.publish("robots", "r1").await.unwrap();

        assert_eq!(next_payload(&mut stream).await, "c1");
        assert_eq!(next_payload(&mut stream).await, "r1");
        assert_quiet(&mut stream).await;
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    #[tokio::test]
    async fn test_per_subscription_order_matches_publish_order() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let (_, mut first) = bus
            .subscribe_stream(SubscribeRequest::channel("cars"))
            .await
            .unwrap();
        let (_, mut second) = bus
            .subscribe_stream(SubscribeRequest::any_channel())
            .await
            .unwrap();

        for i in 0..200 {
            bus.publish("cars", &format!("p{i}")).await.unwrap();
        }

        for i in 0..200 {
            assert_eq!(next_payload(&mut first).await, format!("p{i}"));
            assert_eq!(next_payload(&mut second).await, format!("p{i}"));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_order_holds_under_concurrent_publishers() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let sink = Arc::new(RecordingSink::new());
        bus.subscribe(SubscribeRequest::any_channel(), sink.clone())
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for publisher in 0..4 {
            let bus = Arc::clone(&bus);
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    bus.publish("cars", &format!("{publisher}:{i}")).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(eventually(|| sink.delivered_count() == 200).await);

        // Each publisher's own messages arrive in the order it sent them.
        let payloads = sink.payloads();
        for publisher in 0..4 {
            let prefix = format!("{publisher}:");
            let seen: Vec<u32> = payloads
                .iter()
                .filter_map(|p| p.strip_prefix(&prefix))
                .map(|i| i.parse().unwrap())
                .collect();
            assert_eq!(seen, (0..50).collect::<Vec<u32>>());
        }
    }

    // =========================================================================
    // SUBSCRIBE-TIME VALIDATION
    // =========================================================================

    #[tokio::test]
    async fn test_malformed_filters_rejected_at_subscribe() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let sink = Arc::new(RecordingSink::new());

        let wrong_shape = FilterExpr::from_json(
            r#"{"groups":[{"predicates":[{"field":"name","op":"eq","value":["cars"]}]}]}"#,
        )
        .unwrap();
        assert!(matches!(
            bus.subscribe(
                SubscribeRequest::any_channel().with_filter(wrong_shape),
                sink.clone()
            )
            .await,
            Err(BusError::Dispatch(DispatchError::Filter(
                FilterError::MalformedFilter(_)
            )))
        ));

        let too_many_groups = FilterExpr::new(
            (0..11)
                .map(|_| FilterGroup::any_of(vec![Predicate::eq(ATTR_NAME, "cars")]))
                .collect(),
        );
        assert!(matches!(
            bus.subscribe(
                SubscribeRequest::any_channel().with_invalidation_filter(too_many_groups),
                sink.clone()
            )
            .await,
            Err(BusError::Dispatch(DispatchError::Filter(_)))
        ));

        assert!(FilterExpr::from_json("{not json").is_err());
        assert_eq!(bus.dispatcher().stats().active_subscriptions, 0);
    }

    #[tokio::test]
    async fn test_messages_keep_origin_and_token() {
        let bus = standalone("us-east-1", DispatcherConfig::default());
        let (_, mut stream) = bus
            .subscribe_stream(SubscribeRequest::channel("cars"))
            .await
            .unwrap();

        let published = bus.publish("cars", "c1").await.unwrap();
        let delivered = stream.recv().await.and_then(|d| d.into_message()).unwrap();

        assert_eq!(delivered, published);
        assert_eq!(delivered.origin_region, RegionId::new("us-east-1"));
    }
}
