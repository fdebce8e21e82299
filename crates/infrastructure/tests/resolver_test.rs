use ferrous_lookup_domain::{RecordType, ResponseCode};
use ferrous_lookup_infrastructure::dns::transport::{DnsTransport, TransportError};
use ferrous_lookup_infrastructure::dns::wire::{WireError, WireErrorKind};
use ferrous_lookup_infrastructure::dns::{
    AttemptEventEmitter, AttemptOutcome, Diagnostics, EventFilter, LookupClient, LookupError,
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod helpers;
use helpers::{
    a_record, cname_record, question, settings, timed_out, Reply, ResponseBuilder,
    ScriptedTransport,
};

const S1: &str = "192.0.2.1:53";
const S2: &str = "192.0.2.2:53";
const S3: &str = "192.0.2.3:53";

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

fn client(
    settings: Arc<ferrous_lookup_domain::LookupSettings>,
    udp: &Arc<ScriptedTransport>,
    tcp: &Arc<ScriptedTransport>,
) -> LookupClient {
    LookupClient::with_transports(
        settings,
        Arc::clone(udp) as Arc<dyn DnsTransport>,
        Arc::clone(tcp) as Arc<dyn DnsTransport>,
    )
}

fn answer_a(call: &helpers::Call) -> Reply {
    Reply::Message(
        ResponseBuilder::for_request(&call.request)
            .answer(a_record("example.com", [93, 184, 216, 34], 300))
            .build(),
    )
}

#[tokio::test]
async fn test_retry_exhaustion_tries_every_server_retries_plus_one_times() {
    let udp = Arc::new(ScriptedTransport::udp(timed_out));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let settings = settings(&[S1, S2], |o| o.retries = 2);
    let client = client(settings, &udp, &tcp);

    let err = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap_err();

    let calls = udp.calls();
    assert_eq!(calls.len(), 2 * 3);
    let ids: HashSet<u16> = calls.iter().map(|c| c.request.id).collect();
    assert_eq!(ids.len(), calls.len(), "every attempt uses a fresh id");

    match err {
        LookupError::ConnectionTimeout {
            servers, last_error, ..
        } => {
            assert_eq!(servers, vec![addr(S1), addr(S2)]);
            assert!(matches!(last_error, Some(TransportError::Timeout { .. })));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_servers_tried_in_order_with_retries_before_failover() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        if call.server == addr(S1) {
            timed_out(call)
        } else {
            answer_a(call)
        }
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1, S2], |o| o.retries = 1), &udp, &tcp);

    let response = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(response.name_server(), addr(S2));
    assert_eq!(udp.calls_to(addr(S1)), 2);
    assert_eq!(udp.calls_to(addr(S2)), 1);
    let servers: Vec<SocketAddr> = udp.calls().iter().map(|c| c.server).collect();
    assert_eq!(servers, vec![addr(S1), addr(S1), addr(S2)]);
}

#[tokio::test]
async fn test_truncation_falls_back_to_one_tcp_attempt() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Message(ResponseBuilder::for_request(&call.request).truncated().build())
    }));
    let tcp = Arc::new(ScriptedTransport::tcp(answer_a));
    let client = client(settings(&[S1, S2], |_| {}), &udp, &tcp);

    let response = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(response.answers().len(), 1);
    assert_eq!(udp.call_count(), 1);
    assert_eq!(tcp.call_count(), 1);

    let udp_id = udp.calls()[0].request.id;
    let tcp_call = &tcp.calls()[0];
    assert_ne!(tcp_call.request.id, udp_id);
    assert_eq!(tcp_call.request.question, udp.calls()[0].request.question);
    assert_eq!(tcp_call.server, addr(S1));
}

#[tokio::test]
async fn test_truncation_without_fallback_fails() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Message(ResponseBuilder::for_request(&call.request).truncated().build())
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1], |o| o.use_tcp_fallback = false), &udp, &tcp);

    let err = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Truncated { server, .. } if server == addr(S1)));
}

#[tokio::test]
async fn test_truncation_over_tcp_is_fatal() {
    let udp = Arc::new(ScriptedTransport::unused("UDP"));
    let tcp = Arc::new(ScriptedTransport::tcp(|call| {
        Reply::Message(ResponseBuilder::for_request(&call.request).truncated().build())
    }));
    let client = client(settings(&[S1, S2], |o| o.use_tcp_only = true), &udp, &tcp);

    let err = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::TruncatedOverTcp { .. }));
    assert_eq!(tcp.call_count(), 1);
}

#[tokio::test]
async fn test_example_com_is_served_from_cache_on_second_query() {
    let udp = Arc::new(ScriptedTransport::udp(answer_a));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1], |_| {}), &udp, &tcp);
    let q = question("example.com", RecordType::A);

    assert!(client.query_cache(&q).is_none());

    let first = client.query(&q).await.unwrap();
    assert_eq!(first.answers().len(), 1);
    assert!(!first.has_error());
    assert!(!first.from_cache());

    let second = client.query(&q).await.unwrap();
    assert!(second.from_cache());
    assert_eq!(second.answers()[0].data, first.answers()[0].data);
    assert_eq!(udp.call_count(), 1);

    assert!(client.query_cache(&q).is_some());
}

#[tokio::test]
async fn test_dns_error_thrown_when_configured() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Message(
            ResponseBuilder::for_request(&call.request)
                .rcode(ResponseCode::NXDomain)
                .build(),
        )
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1, S2], |o| o.throw_dns_errors = true), &udp, &tcp);

    let err = client
        .query(&question("missing.example.com", RecordType::A))
        .await
        .unwrap_err();

    let response = err.response().unwrap();
    assert_eq!(response.response_code(), ResponseCode::NXDomain);
    assert_eq!(udp.call_count(), 1);
}

#[tokio::test]
async fn test_dns_error_fails_over_then_returns_last_response() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Message(
            ResponseBuilder::for_request(&call.request)
                .rcode(ResponseCode::Refused)
                .build(),
        )
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1, S2, S3], |_| {}), &udp, &tcp);

    let response = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();

    assert!(response.has_error());
    assert_eq!(response.error_message(), "REFUSED: Query refused");
    assert_eq!(response.name_server(), addr(S3));
    assert_eq!(udp.call_count(), 3);
}

#[tokio::test]
async fn test_servfail_retries_same_server_without_failover() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        if call.index < 2 {
            Reply::Message(
                ResponseBuilder::for_request(&call.request)
                    .rcode(ResponseCode::ServFail)
                    .build(),
            )
        } else {
            answer_a(call)
        }
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(
        settings(&[S1, S2], |o| {
            o.continue_on_dns_error = false;
            o.retries = 2;
        }),
        &udp,
        &tcp,
    );

    let response = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();

    assert!(!response.has_error());
    assert_eq!(udp.calls_to(addr(S1)), 3);
    assert_eq!(udp.calls_to(addr(S2)), 0);
}

#[tokio::test]
async fn test_empty_response_moves_to_next_server() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        if call.server == addr(S1) {
            Reply::Message(ResponseBuilder::for_request(&call.request).build())
        } else {
            answer_a(call)
        }
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1, S2], |_| {}), &udp, &tcp);

    let response = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();
    assert_eq!(response.name_server(), addr(S2));
}

#[tokio::test]
async fn test_empty_response_returned_when_not_continuing() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Message(ResponseBuilder::for_request(&call.request).build())
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(
        settings(&[S1, S2], |o| o.continue_on_empty_response = false),
        &udp,
        &tcp,
    );

    let response = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();
    assert!(response.answers().is_empty());
    assert_eq!(udp.call_count(), 1);
}

#[tokio::test]
async fn test_cname_counts_as_answer_for_address_queries() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Message(
            ResponseBuilder::for_request(&call.request)
                .answer(cname_record("www.example.com", "example.com", 60))
                .build(),
        )
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1, S2], |_| {}), &udp, &tcp);

    client
        .query(&question("www.example.com", RecordType::AAAA))
        .await
        .unwrap();
    assert_eq!(udp.call_count(), 1);
}

#[tokio::test]
async fn test_malformed_udp_response_retries_over_tcp() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Error(TransportError::Malformed {
            server: call.server,
            source: WireError::new(WireErrorKind::InsufficientBytes, 12, 4, &[0; 14]),
        })
    }));
    let tcp = Arc::new(ScriptedTransport::tcp(answer_a));
    let client = client(settings(&[S1, S2], |_| {}), &udp, &tcp);

    client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();
    assert_eq!(udp.call_count(), 1);
    assert_eq!(tcp.call_count(), 1);
}

#[tokio::test]
async fn test_malformed_on_last_server_is_a_parse_error() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Error(TransportError::Malformed {
            server: call.server,
            source: WireError::new(WireErrorKind::RecordFraming, 40, 10, &[0; 48]),
        })
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1, S2], |o| o.use_tcp_fallback = false), &udp, &tcp);

    let err = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap_err();

    match err {
        LookupError::Parse { server, source, .. } => {
            assert_eq!(server, addr(S2));
            assert_eq!(source.kind, WireErrorKind::RecordFraming);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(udp.call_count(), 2);
}

#[tokio::test]
async fn test_retries_never_reuse_a_transaction_id() {
    // With this seed the generator yields the same id twice in a row.
    fastrand::seed(34207);

    let udp = Arc::new(ScriptedTransport::udp(timed_out));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1], |o| o.retries = 3), &udp, &tcp);

    client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap_err();

    let ids: Vec<u16> = udp.calls().iter().map(|c| c.request.id).collect();
    assert_eq!(ids.len(), 4);
    let distinct: HashSet<u16> = ids.iter().copied().collect();
    assert_eq!(distinct.len(), ids.len(), "ids reused: {:?}", ids);
}

#[tokio::test]
async fn test_id_mismatch_over_udp_switches_to_tcp() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Error(TransportError::IdMismatch {
            server: call.server,
            expected: call.request.id,
            received: call.request.id.wrapping_add(1),
        })
    }));
    let tcp = Arc::new(ScriptedTransport::tcp(answer_a));
    let client = client(settings(&[S1, S2], |_| {}), &udp, &tcp);

    let response = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(response.name_server(), addr(S1));
    assert_eq!(udp.call_count(), 1);
    assert_eq!(tcp.call_count(), 1);
    assert_ne!(tcp.calls()[0].request.id, udp.calls()[0].request.id);
}

#[tokio::test]
async fn test_id_mismatch_without_fallback_retries_same_server() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        if call.index == 0 {
            Reply::Error(TransportError::IdMismatch {
                server: call.server,
                expected: call.request.id,
                received: call.request.id.wrapping_add(1),
            })
        } else {
            answer_a(call)
        }
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1, S2], |o| o.use_tcp_fallback = false), &udp, &tcp);

    let response = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(response.name_server(), addr(S1));
    assert_eq!(udp.calls_to(addr(S1)), 2);
    assert_eq!(udp.calls_to(addr(S2)), 0);
}

#[tokio::test]
async fn test_malformed_over_tcp_is_fatal_before_last_server() {
    let udp = Arc::new(ScriptedTransport::unused("UDP"));
    let tcp = Arc::new(ScriptedTransport::tcp(|call| {
        Reply::Error(TransportError::Malformed {
            server: call.server,
            source: WireError::new(WireErrorKind::BadLabelType, 12, 1, &[0; 20]),
        })
    }));
    let client = client(settings(&[S1, S2], |o| o.use_tcp_only = true), &udp, &tcp);

    let err = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap_err();

    match err {
        LookupError::Parse { server, source, .. } => {
            assert_eq!(server, addr(S1));
            assert_eq!(source.kind, WireErrorKind::BadLabelType);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(tcp.call_count(), 1);
    assert_eq!(tcp.calls_to(addr(S2)), 0);
}

#[tokio::test]
async fn test_failure_only_events_skip_the_answering_attempt() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        if call.index == 0 {
            timed_out(call)
        } else {
            answer_a(call)
        }
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let (emitter, mut events) = AttemptEventEmitter::with_filter(EventFilter::FailuresOnly);
    let client = client(settings(&[S1], |_| {}), &udp, &tcp).with_event_emitter(emitter);

    client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();
    drop(client);

    assert_eq!(events.recv().await.unwrap().outcome, AttemptOutcome::Timeout);
    assert!(events.recv().await.is_none());
}

#[tokio::test]
async fn test_cancellation_is_surfaced() {
    let udp = Arc::new(ScriptedTransport::udp(|_| Reply::Hang));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1, S2], |o| o.timeout_ms = 60_000), &udp, &tcp);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = client
        .query_with_cancel(&question("example.com", RecordType::A), &cancel)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(udp.call_count(), 1);
}

#[tokio::test]
async fn test_audit_trail_and_events() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        if call.index == 0 {
            timed_out(call)
        } else {
            answer_a(call)
        }
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let (emitter, mut events) = AttemptEventEmitter::new_enabled();
    let client = client(settings(&[S1], |o| o.enable_audit_trail = true), &udp, &tcp)
        .with_event_emitter(emitter);

    let response = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap();

    let trail = response.audit_trail().unwrap();
    assert!(trail.contains(";; try 1 to 192.0.2.1:53 over UDP"));
    assert!(trail.contains(": timeout"));
    assert!(trail.contains(";; ANSWER SECTION:"));
    assert!(trail.contains(";; SERVER: 192.0.2.1:53"));

    let first = events.recv().await.unwrap();
    let second = events.recv().await.unwrap();
    assert_eq!(first.outcome, AttemptOutcome::Timeout);
    assert_eq!(first.attempt, 1);
    assert_eq!(second.outcome, AttemptOutcome::Success);
    assert_eq!(second.attempt, 2);
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_audit_trail_attached_to_failures() {
    let udp = Arc::new(ScriptedTransport::udp(timed_out));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(
        settings(&[S1], |o| {
            o.enable_audit_trail = true;
            o.retries = 0;
        }),
        &udp,
        &tcp,
    );

    let err = client
        .query(&question("example.com", RecordType::A))
        .await
        .unwrap_err();
    assert!(err.audit_trail().unwrap().contains("timeout"));
}

#[tokio::test]
async fn test_query_server_uses_explicit_list() {
    let udp = Arc::new(ScriptedTransport::udp(answer_a));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1], |o| o.use_cache = false), &udp, &tcp);

    let explicit = vec![Arc::new(ferrous_lookup_domain::NameServer::new(addr(S3)))];
    let response = client
        .query_server(&question("example.com", RecordType::A), &explicit)
        .await
        .unwrap();

    assert_eq!(response.name_server(), addr(S3));
    assert_eq!(udp.calls_to(addr(S1)), 0);
}

#[tokio::test]
async fn test_reverse_query_builds_ptr_question() {
    let udp = Arc::new(ScriptedTransport::udp(|call| {
        Reply::Message(ResponseBuilder::for_request(&call.request).build())
    }));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1], |_| {}), &udp, &tcp);

    client
        .query_reverse("192.0.2.10".parse().unwrap())
        .await
        .unwrap();

    let asked = &udp.calls()[0].request.question;
    assert_eq!(asked.record_type, RecordType::PTR);
    assert_eq!(asked.name.to_string(), "10.2.0.192.in-addr.arpa.");
}

#[tokio::test]
async fn test_diagnostics_count_queries_and_cache_hits() {
    let udp = Arc::new(ScriptedTransport::udp(answer_a));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1], |_| {}), &udp, &tcp);
    let q = question("diag.example.com", RecordType::A);

    let before = Diagnostics::snapshot();
    client.query(&q).await.unwrap();
    client.query(&q).await.unwrap();
    let delta = Diagnostics::snapshot().since(&before);

    assert!(delta.queries_started >= 2);
    assert!(delta.cache_hits >= 1);
    assert!(delta.cache_misses >= 1);
}

#[test]
fn test_blocking_query_outside_runtime() {
    let udp = Arc::new(ScriptedTransport::udp(answer_a));
    let tcp = Arc::new(ScriptedTransport::unused("TCP"));
    let client = client(settings(&[S1], |_| {}), &udp, &tcp);

    let response = client
        .query_name_blocking("example.com", RecordType::A, ferrous_lookup_domain::DnsClass::IN)
        .unwrap();
    assert_eq!(response.answers().len(), 1);
}
