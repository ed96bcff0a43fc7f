// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SNMP v2c metric client for printer supply and tray counters.
//
// One query fetches a whole batch of identifiers from one agent in a single
// GetRequest. Each attempt opens a fresh session and runs under one timeout;
// lost attempts are retried per [`RetryPolicy`]. A successful round trip that carries no values
// at all is still a failure (`NoValidData`).

use std::future::Future;
use std::net::{IpAddr, SocketAddr};

use snmp2::{AsyncSession, Oid, Value};
use tracing::{debug, info, instrument, warn};

use tonerwatch_core::error::{Result, TonerwatchError};
use tonerwatch_core::types::{RawMetric, RawValue};

use crate::retry::{RetryDecision, RetryPolicy, should_retry};

/// Default SNMP agent port.
pub const SNMP_PORT: u16 = 161;

/// First request id used by each session.
const REQUEST_ID_BASE: i32 = 1;

/// Wire layer that fetches raw values for a batch of identifiers.
///
/// Implementations return one [`RawMetric`] per requested identifier, in
/// request order, with `value: None` for anything the agent did not supply.
/// Timeouts and retries are applied by [`MetricQueryClient`], not here.
pub trait MetricTransport: Send + Sync {
    fn fetch(
        &self,
        target: SocketAddr,
        community: &str,
        identifiers: &[String],
    ) -> impl Future<Output = Result<Vec<RawMetric>>> + Send;
}

/// Production transport backed by `snmp2`'s async v2c session.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnmpTransport;

impl MetricTransport for SnmpTransport {
    async fn fetch(
        &self,
        target: SocketAddr,
        community: &str,
        identifiers: &[String],
    ) -> Result<Vec<RawMetric>> {
        let parsed: Vec<Option<Oid<'static>>> = identifiers
            .iter()
            .map(|identifier| match parse_oid(identifier) {
                Ok(oid) => Some(oid),
                Err(e) => {
                    warn!(identifier = %identifier, error = %e, "skipping malformed identifier");
                    None
                }
            })
            .collect();
        let request: Vec<&Oid<'static>> = parsed.iter().flatten().collect();
        if request.is_empty() {
            return Ok(identifiers.iter().map(|id| RawMetric::absent(id.as_str())).collect());
        }

        let mut session = AsyncSession::new_v2c(target, community.as_bytes(), REQUEST_ID_BASE)
            .await
            .map_err(|e| TonerwatchError::Transport(format!("open SNMP session to {target}: {e}")))?;

        let resp = session
            .get_many(&request)
            .await
            .map_err(|e| TonerwatchError::Transport(format!("GET {} identifiers: {e}", request.len())))?;
        let answered: Vec<(Oid<'_>, Option<RawValue>)> = resp
            .varbinds
            .map(|(oid, value)| (oid, decode_value(&value)))
            .collect();
        debug!(requested = request.len(), answered = answered.len(), "SNMP response received");

        Ok(identifiers
            .iter()
            .zip(&parsed)
            .map(|(identifier, oid)| {
                let value = oid.as_ref().and_then(|oid| {
                    answered
                        .iter()
                        .find(|(answered_oid, _)| answered_oid.as_bytes() == oid.as_bytes())
                        .and_then(|(_, value)| value.clone())
                });
                RawMetric::new(identifier.as_str(), value)
            })
            .collect())
    }
}

/// Parse a dotted identifier such as `1.3.6.1.2.1.25.3.5.1.1.1`.
pub fn parse_oid(s: &str) -> std::result::Result<Oid<'static>, String> {
    let parts = s
        .trim()
        .split('.')
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u64>())
        .collect::<std::result::Result<Vec<u64>, _>>()
        .map_err(|e| format!("invalid OID '{s}': {e}"))?;

    if parts.is_empty() {
        return Err(format!("invalid OID '{s}': no components"));
    }

    Oid::from(&parts).map_err(|e| format!("invalid OID '{s}': {e:?}"))
}

/// Map an SNMP value onto the small set of shapes the normalizer understands.
///
/// Exceptions (`noSuchObject`, `noSuchInstance`, `endOfMibView`), `NULL` and
/// structured values decode to `None`.
pub fn decode_value(value: &Value<'_>) -> Option<RawValue> {
    match value {
        Value::Integer(v) => Some(RawValue::Integer(*v)),
        Value::Counter32(v) | Value::Unsigned32(v) | Value::Timeticks(v) => {
            Some(RawValue::Integer(i64::from(*v)))
        }
        Value::Counter64(v) => i64::try_from(*v).ok().map(RawValue::Integer),
        Value::OctetString(bytes) => Some(RawValue::Text(String::from_utf8_lossy(bytes).into_owned())),
        _ => None,
    }
}

/// Batched metric query with timeout, bounded retries and response validation.
#[derive(Debug, Clone)]
pub struct MetricQueryClient<T = SnmpTransport> {
    transport: T,
    policy: RetryPolicy,
    port: u16,
}

impl MetricQueryClient<SnmpTransport> {
    pub fn snmp(policy: RetryPolicy, port: u16) -> Self {
        Self::new(SnmpTransport, policy, port)
    }
}

impl<T: MetricTransport> MetricQueryClient<T> {
    pub fn new(transport: T, policy: RetryPolicy, port: u16) -> Self {
        Self {
            transport,
            policy,
            port,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch `identifiers` from the agent at `ip`.
    ///
    /// Fails with `QueryTimeout` when no attempt completes in time,
    /// `Transport` when the socket keeps failing, and `NoValidData` when the
    /// agent answered but every value was absent.
    #[instrument(skip_all, fields(%ip, count = identifiers.len()))]
    pub async fn query(
        &self,
        ip: IpAddr,
        community: &str,
        identifiers: &[String],
    ) -> Result<Vec<RawMetric>> {
        let target = SocketAddr::new(ip, self.port);
        let timeout = self.policy.attempt_timeout;
        let mut attempt = 0;

        loop {
            debug!(attempt, "sending SNMP GET batch");
            let outcome = match tokio::time::timeout(
                timeout,
                self.transport.fetch(target, community, identifiers),
            )
            .await
            {
                Ok(Ok(metrics)) => validate(metrics),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(TonerwatchError::QueryTimeout {
                    attempts: attempt + 1,
                    timeout,
                }),
            };

            match outcome {
                Ok(metrics) => {
                    info!(attempt, values = metrics.len(), "SNMP query succeeded");
                    return Ok(metrics);
                }
                Err(err) => match should_retry(&err, attempt, &self.policy) {
                    RetryDecision::Retry => attempt += 1,
                    RetryDecision::GiveUp | RetryDecision::Exhausted => {
                        warn!(attempt, error = %err, "SNMP query failed");
                        return Err(err);
                    }
                },
            }
        }
    }
}

/// Reject responses in which no identifier carried a value.
fn validate(metrics: Vec<RawMetric>) -> Result<Vec<RawMetric>> {
    if metrics.iter().any(|m| m.value.is_some()) {
        Ok(metrics)
    } else {
        Err(TonerwatchError::NoValidData)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    /// Answers every fetch with the same canned values.
    struct Canned(Vec<RawMetric>, AtomicU32);

    impl Canned {
        fn new(metrics: Vec<RawMetric>) -> Self {
            Self(metrics, AtomicU32::new(0))
        }
    }

    impl MetricTransport for Canned {
        async fn fetch(&self, _: SocketAddr, _: &str, _: &[String]) -> Result<Vec<RawMetric>> {
            self.1.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.clone())
        }
    }

    /// Never answers.
    struct Silent(AtomicU32);

    impl MetricTransport for Silent {
        async fn fetch(&self, _: SocketAddr, _: &str, _: &[String]) -> Result<Vec<RawMetric>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    /// Fails with a socket error until `failures` attempts have been made.
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl MetricTransport for Flaky {
        async fn fetch(&self, _: SocketAddr, _: &str, ids: &[String]) -> Result<Vec<RawMetric>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(TonerwatchError::Transport("connection reset".into()));
            }
            Ok(ids.iter().map(|id| RawMetric::integer(id.as_str(), 1)).collect())
        }
    }

    fn policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries: retries,
            attempt_timeout: Duration::from_millis(50),
        }
    }

    fn ids() -> Vec<String> {
        vec!["1.3.6.1.2.1.43.11.1.1.9.1.1".into(), "1.3.6.1.2.1.43.8.2.1.12.1.1".into()]
    }

    #[tokio::test]
    async fn returns_metrics_when_any_value_present() {
        let canned = vec![
            RawMetric::integer("1.3.6.1.2.1.43.11.1.1.9.1.1", 80),
            RawMetric::absent("1.3.6.1.2.1.43.8.2.1.12.1.1"),
        ];
        let client = MetricQueryClient::new(Canned::new(canned.clone()), policy(2), SNMP_PORT);
        let metrics = client.query(LOCALHOST, "public", &ids()).await.unwrap();
        assert_eq!(metrics, canned);
    }

    #[tokio::test]
    async fn all_absent_is_no_valid_data_without_retry() {
        let transport = Canned::new(ids().into_iter().map(RawMetric::absent).collect());
        let client = MetricQueryClient::new(transport, policy(2), SNMP_PORT);
        let err = client.query(LOCALHOST, "public", &ids()).await.unwrap_err();
        assert!(matches!(err, TonerwatchError::NoValidData));
        assert_eq!(client.transport.1.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn silence_times_out_after_retry_budget() {
        let client = MetricQueryClient::new(Silent(AtomicU32::new(0)), policy(2), SNMP_PORT);
        let err = client.query(LOCALHOST, "public", &ids()).await.unwrap_err();
        assert!(matches!(err, TonerwatchError::QueryTimeout { attempts: 3, .. }));
        assert_eq!(client.transport.0.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let transport = Flaky {
            failures: 2,
            calls: AtomicU32::new(0),
        };
        let client = MetricQueryClient::new(transport, policy(2), SNMP_PORT);
        let metrics = client.query(LOCALHOST, "public", &ids()).await.unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(client.transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn persistent_transport_failure_surfaces() {
        let transport = Flaky {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        };
        let client = MetricQueryClient::new(transport, policy(1), SNMP_PORT);
        let err = client.query(LOCALHOST, "public", &ids()).await.unwrap_err();
        assert!(matches!(err, TonerwatchError::Transport(_)));
        assert!(err.is_query_failure());
    }

    #[tokio::test]
    async fn snmp_transport_fails_against_silent_port() {
        let socket = std::net::UdpSocket::bind((LOCALHOST, 0)).unwrap();
        let port = socket.local_addr().unwrap().port();
        drop(socket);

        let client = MetricQueryClient::snmp(policy(0), port);
        let err = client.query(LOCALHOST, "public", &ids()).await.unwrap_err();
        assert!(err.is_query_failure());
    }

    /// Skip one BER tag and length, returning the offset of the contents.
    fn ber_contents(buf: &[u8], pos: usize) -> (usize, usize) {
        let first = buf[pos + 1] as usize;
        if first < 0x80 {
            (pos + 2, first)
        } else {
            let n = first & 0x7f;
            let len = buf[pos + 2..pos + 2 + n]
                .iter()
                .fold(0usize, |acc, b| (acc << 8) | *b as usize);
            (pos + 2 + n, len)
        }
    }

    /// Agent that answers every GetRequest with the same PDU retagged as a
    /// Response (all values NULL), counting the datagrams it receives.
    async fn echo_agent() -> (SocketAddr, std::sync::Arc<AtomicU32>) {
        let socket = tokio::net::UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
        let addr = socket.local_addr().unwrap();
        let received = std::sync::Arc::new(AtomicU32::new(0));
        let counter = std::sync::Arc::clone(&received);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                let Ok((n, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut msg = buf[..n].to_vec();
                // message SEQUENCE -> version INTEGER -> community OCTET STRING -> PDU
                let (body, _) = ber_contents(&msg, 0);
                let (version, version_len) = ber_contents(&msg, body);
                let community = version + version_len;
                let (community_body, community_len) = ber_contents(&msg, community);
                let pdu = community_body + community_len;
                assert_eq!(msg[pdu], 0xa0, "expected GetRequest");
                msg[pdu] = 0xa2;
                let _ = socket.send_to(&msg, peer).await;
            }
        });
        (addr, received)
    }

    #[tokio::test]
    async fn snmp_transport_sends_one_request_per_batch() {
        let (agent, received) = echo_agent().await;
        let oids = tonerwatch_core::config::MetricOids::default();
        let identifiers = oids.for_capability(tonerwatch_core::types::DeviceCapability::Color);

        let metrics = tokio::time::timeout(
            Duration::from_secs(5),
            SnmpTransport.fetch(agent, "public", &identifiers),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(metrics.len(), identifiers.len());
        for (metric, id) in metrics.iter().zip(&identifiers) {
            assert_eq!(&metric.identifier, id);
            assert_eq!(metric.value, None);
        }
        assert_eq!(received.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_identifiers_are_absent_and_not_sent() {
        let (agent, received) = echo_agent().await;
        let identifiers = vec!["1.3.six".to_string(), "1.3.6.1.2.1.1.3.0".to_string()];

        let metrics = tokio::time::timeout(
            Duration::from_secs(5),
            SnmpTransport.fetch(agent, "public", &identifiers),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(metrics[0], RawMetric::absent("1.3.six"));
        assert_eq!(metrics[1].identifier, "1.3.6.1.2.1.1.3.0");
        assert_eq!(received.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parse_oid_accepts_dotted_numbers() {
        assert!(parse_oid("1.3.6.1.2.1.43.10.2.1.4.1.1").is_ok());
        assert!(parse_oid(" .1.3.6.1.2.1.1.1.0 ").is_ok());
    }

    #[test]
    fn parse_oid_rejects_garbage() {
        assert!(parse_oid("1.3.six.1").is_err());
        assert!(parse_oid("").is_err());
    }

    #[test]
    fn decode_numeric_and_text_values() {
        assert_eq!(decode_value(&Value::Integer(-3)), Some(RawValue::Integer(-3)));
        assert_eq!(decode_value(&Value::Counter32(12_345)), Some(RawValue::Integer(12_345)));
        assert_eq!(
            decode_value(&Value::OctetString(&b"42"[..])),
            Some(RawValue::Text("42".into()))
        );
        assert_eq!(decode_value(&Value::Null), None);
        assert_eq!(decode_value(&Value::NoSuchObject), None);
        assert_eq!(decode_value(&Value::NoSuchInstance), None);
    }
}
