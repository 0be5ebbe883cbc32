//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - Contract smoke tests
//! - Config -> naming rules -> dispatcher -> receivers
//! - Concurrent dispatch through a shared dispatcher

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(contracts::component::HTTP, 49);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;

    use contracts::{
        DetectPoint, NodeType, Protocol, RequestType, ServiceMeshMetric, Source, SourceKind,
        WireDetectPoint,
    };
    use dispatcher::{
        build_receivers, EndpointNamingRules, MemoryReceiver, SourceReceiver,
        TelemetryDataDispatcher,
    };
    use observability::DispatchStatsAggregator;

    fn http_server_metric() -> ServiceMeshMetric {
        ServiceMeshMetric {
            start_time: 1_700_000_000_000,
            source_service_name: "frontend".to_string(),
            source_service_instance: "frontend-7d9f".to_string(),
            dest_service_name: "catalog".to_string(),
            dest_service_instance: "catalog-5c2a".to_string(),
            endpoint: "/items/42".to_string(),
            latency: 35,
            status: true,
            response_code: 200,
            protocol: Protocol::Http,
            detect_point: WireDetectPoint::Server,
        }
    }

    /// One server-side HTTP call produces the full event set
    #[test]
    fn test_e2e_server_call_fan_out() {
        let receiver = Arc::new(MemoryReceiver::new("memory"));
        let dispatcher = TelemetryDataDispatcher::builder(receiver.clone()).build();

        let outcome = dispatcher.process(http_server_metric()).unwrap();
        assert_eq!(outcome.time_bucket, 202311142213);

        let sources = receiver.take();
        let kinds: Vec<SourceKind> = sources.iter().map(Source::kind).collect();
        assert_eq!(
            kinds,
            vec![
                SourceKind::ServiceInstanceUpdate,
                SourceKind::ServiceInstanceUpdate,
                SourceKind::All,
                SourceKind::Service,
                SourceKind::ServiceInstance,
                SourceKind::Endpoint,
                SourceKind::ServiceRelation,
                SourceKind::ServiceInstanceRelation,
            ]
        );
        assert_eq!(kinds, outcome.emitted);
        assert!(sources.iter().all(|s| s.time_bucket() == 202311142213));

        let Source::Service(service) = &sources[3] else {
            panic!("expected Service, got {:?}", sources[3].kind());
        };
        assert_eq!(service.name, "catalog");
        assert_eq!(service.node_type, NodeType::Normal);
        assert_eq!(service.service_instance_name, "catalog-5c2a");
        assert_eq!(service.endpoint_name, "/items/42");
        assert_eq!(service.latency, 35);
        assert_eq!(service.request_type, RequestType::Http);

        let Source::ServiceRelation(relation) = &sources[6] else {
            panic!("expected ServiceRelation, got {:?}", sources[6].kind());
        };
        assert_eq!(relation.source_service_name, "frontend");
        assert_eq!(relation.dest_service_name, "catalog");
        assert_eq!(relation.component_id, 49);
        assert_eq!(relation.detect_point, DetectPoint::Server);
        assert_eq!(relation.request_type, RequestType::Http);
    }

    /// Config file -> naming rules + file receiver -> JSON lines on disk
    #[test]
    fn test_e2e_config_driven_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("sources.jsonl");
        let toml = format!(
            r#"
version = "V1"

[[endpoint_naming.services]]
service = "catalog"

[[endpoint_naming.services.rules]]
name = "/items/{{id}}"
pattern = '/items/\d+'

[[receivers]]
name = "jsonl"
receiver_type = "file"
params = {{ path = "{}" }}

[[receivers]]
name = "console"
receiver_type = "log"
"#,
            output.display()
        );

        let config = config_loader::ConfigLoader::load_from_str(
            &toml,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        let rules = EndpointNamingRules::from_config(&config.endpoint_naming).unwrap();
        let receivers = Arc::new(build_receivers(&config.receivers).unwrap());
        assert_eq!(receivers.len(), 2);

        let dispatcher = TelemetryDataDispatcher::builder(receivers.clone())
            .formatter(Arc::new(rules))
            .build();

        let outcome = dispatcher.process(http_server_metric()).unwrap();
        assert!(outcome.endpoint_renamed);

        // Client side observation of the same call: no node events
        let client = ServiceMeshMetric {
            detect_point: WireDetectPoint::Client,
            ..http_server_metric()
        };
        let outcome = dispatcher.process(client).unwrap();
        assert_eq!(outcome.emitted.len(), 4);

        receivers.flush().unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<Source> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 12);

        let endpoints: Vec<&str> = lines
            .iter()
            .filter_map(|s| match s {
                Source::Endpoint(e) => Some(e.name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(endpoints, vec!["/items/{id}"]);

        let client_relation = lines.iter().rev().find_map(|s| match s {
            Source::ServiceRelation(r) => Some(r),
            _ => None,
        });
        assert_eq!(
            client_relation.map(|r| r.detect_point),
            Some(DetectPoint::Client)
        );

        for (name, snapshot) in receivers.metrics() {
            assert_eq!(snapshot.received_count, 12, "receiver {name}");
            assert_eq!(snapshot.failure_count, 0, "receiver {name}");
        }
    }

    /// Every pattern the loader accepts also builds the runtime rules
    #[test]
    fn test_e2e_validated_patterns_build_rules() {
        let toml = r#"
[[endpoint_naming.services]]
service = "catalog"

[[endpoint_naming.services.rules]]
name = "/items/{id}"
pattern = '(?x)/items/\d+ # numeric id'

[[endpoint_naming.services.rules]]
name = "/search"
pattern = '/search\?.*'
"#;
        let config = config_loader::ConfigLoader::load_from_str(
            toml,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        let rules = EndpointNamingRules::from_config(&config.endpoint_naming).unwrap();
        assert_eq!(rules.rule_count(), 2);

        let receiver = Arc::new(MemoryReceiver::new("memory"));
        let dispatcher = TelemetryDataDispatcher::builder(receiver.clone())
            .formatter(Arc::new(rules))
            .build();
        let outcome = dispatcher.process(http_server_metric()).unwrap();
        assert!(outcome.endpoint_renamed);
    }

    /// A shared dispatcher stays consistent under concurrent callers
    #[test]
    fn test_e2e_concurrent_dispatch() {
        const THREADS: usize = 4;
        const PER_THREAD: usize = 50;

        let receiver = Arc::new(MemoryReceiver::new("memory"));
        let dispatcher = TelemetryDataDispatcher::builder(receiver.clone()).build();

        let aggregators: Vec<DispatchStatsAggregator> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|t| {
                    let dispatcher = &dispatcher;
                    scope.spawn(move || {
                        let mut aggregator = DispatchStatsAggregator::new();
                        for i in 0..PER_THREAD {
                            let metric = ServiceMeshMetric {
                                dest_service_instance: format!("catalog-{t}"),
                                latency: i as i32,
                                ..http_server_metric()
                            };
                            let outcome = dispatcher.process(metric).unwrap();
                            aggregator.record_success(
                                i as i32,
                                &outcome.emitted,
                                outcome.endpoint_renamed,
                            );
                        }
                        aggregator
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let total_sources: u64 = aggregators.iter().map(|a| a.total_sources()).sum();
        assert_eq!(total_sources, (THREADS * PER_THREAD * 8) as u64);
        assert_eq!(receiver.len(), THREADS * PER_THREAD * 8);

        let endpoints = receiver
            .snapshot()
            .iter()
            .filter(|s| s.kind() == SourceKind::Endpoint)
            .count();
        assert_eq!(endpoints, THREADS * PER_THREAD);
    }

    /// Unknown protocol falls back to generic RPC everywhere
    #[test]
    fn test_e2e_unrecognized_protocol() {
        let receiver = Arc::new(MemoryReceiver::new("memory"));
        let dispatcher = TelemetryDataDispatcher::builder(receiver.clone()).build();

        let metric = ServiceMeshMetric {
            protocol: Protocol::Unrecognized,
            ..http_server_metric()
        };
        dispatcher.process(metric).unwrap();

        for source in receiver.take() {
            match source {
                Source::ServiceRelation(r) => {
                    assert_eq!(r.request_type, RequestType::Rpc);
                    assert_eq!(r.component_id, 50);
                }
                Source::ServiceInstanceRelation(r) => {
                    assert_eq!(r.request_type, RequestType::Rpc);
                    assert_eq!(r.component_id, 50);
                }
                Source::All(a) => assert_eq!(a.request_type, RequestType::Rpc),
                _ => {}
            }
        }
    }
}
