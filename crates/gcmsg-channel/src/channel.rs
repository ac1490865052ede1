use bytes::Bytes;
use gcmsg_endpoint::{EndpointError, MessageType, RawEndpoint, Result};
use tracing::{debug, trace, warn};

use crate::config::{ChannelConfig, UndersizedReceive};
use crate::envelope::Envelope;
use crate::pool::BufferPool;

/// Receive-side state of a [`Channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No pending message is known.
    Idle,
    /// A poll reported a message that has not been retrieved yet.
    Draining,
}

/// Safe send/receive over a [`RawEndpoint`].
///
/// A channel exclusively owns (or exclusively borrows) its endpoint and its
/// receive buffer pool. It does no threading of its own: drive it from one
/// polling loop, or move it into a dedicated thread/task. It is not meant to
/// be shared between threads without external synchronization.
#[derive(Debug)]
pub struct Channel<E> {
    endpoint: E,
    pool: BufferPool,
    config: ChannelConfig,
    state: ChannelState,
}

impl<E: RawEndpoint> Channel<E> {
    /// Create a channel with default configuration.
    pub fn new(endpoint: E) -> Self {
        Self::with_config(endpoint, ChannelConfig::default())
    }

    /// Create a channel with explicit configuration.
    pub fn with_config(endpoint: E, config: ChannelConfig) -> Self {
        Self {
            endpoint,
            pool: BufferPool::with_config(config.pool),
            config,
            state: ChannelState::Idle,
        }
    }

    /// Send an envelope.
    ///
    /// Failures are returned as-is and never retried: whether a send may be
    /// repeated depends on the message, which only the caller knows.
    pub fn send(&mut self, envelope: &Envelope) -> Result<()> {
        self.send_raw(envelope.msg_type(), envelope.payload())
    }

    /// Send a tag and payload without building an envelope.
    pub fn send_raw(&mut self, msg_type: MessageType, payload: &[u8]) -> Result<()> {
        if let Some(max) = self.config.advisory_max_payload {
            if payload.len() > max {
                warn!(
                    %msg_type,
                    size = payload.len(),
                    max,
                    "payload exceeds advisory maximum"
                );
            }
        }

        trace!(%msg_type, size = payload.len(), "send");
        self.endpoint.raw_send(msg_type, payload)
    }

    /// Retrieve the next queued message without blocking.
    ///
    /// Returns `Ok(None)` when nothing is queued. An undersized receive is
    /// retried at most once (see [`UndersizedReceive`]), and only against an
    /// endpoint that keeps the message queued; a receive that
    /// writes a different byte count than poll announced fails with
    /// [`EndpointError::Corrupt`].
    pub fn try_receive(&mut self) -> Result<Option<Envelope>> {
        let Some(size) = self.endpoint.raw_poll() else {
            self.state = ChannelState::Idle;
            return Ok(None);
        };

        self.state = ChannelState::Draining;
        let result = self.receive_pending(size);
        self.state = match &result {
            Err(EndpointError::BufferTooSmall { .. }) => ChannelState::Draining,
            _ => ChannelState::Idle,
        };
        result
    }

    /// Receive up to `limit` queued messages into `out`.
    ///
    /// Stops early when the queue is empty. Messages received before an
    /// error stay in `out`. Returns how many were appended.
    pub fn drain(&mut self, limit: usize, out: &mut Vec<Envelope>) -> Result<usize> {
        let mut received = 0;
        while received < limit {
            match self.try_receive()? {
                Some(envelope) => {
                    out.push(envelope);
                    received += 1;
                }
                None => break,
            }
        }
        Ok(received)
    }

    fn receive_pending(&mut self, announced: usize) -> Result<Option<Envelope>> {
        let mut expected = announced;
        let mut retried = false;

        loop {
            let mut buffer = self.pool.acquire(expected);
            let mut msg_type = MessageType::default();
            let outcome = self
                .endpoint
                .raw_receive(&mut msg_type, buffer.as_mut_slice());

            let result = match outcome {
                Ok(written) if written != expected => {
                    warn!(expected, written, "receive size mismatch, session may be desynchronized");
                    Err(EndpointError::Corrupt { expected, written })
                }
                Ok(written) => {
                    let payload = Bytes::copy_from_slice(&buffer[..written]);
                    trace!(%msg_type, size = written, "received");
                    Ok(Some(Envelope::new(msg_type, payload)))
                }
                Err(EndpointError::NoMessage) => {
                    debug!(expected, "announced message vanished before receive");
                    Ok(None)
                }
                Err(err @ EndpointError::BufferTooSmall { required, .. })
                    if !retried
                        && self.config.undersized == UndersizedReceive::RetryOnce
                        && self.endpoint.retains_undersized() =>
                {
                    self.pool.release(buffer);
                    retried = true;

                    // A smaller re-poll describes some other message.
                    match self.endpoint.raw_poll() {
                        Some(size) if size >= required => {
                            debug!(previous = expected, size, "receive buffer too small, retrying");
                            expected = size;
                            continue;
                        }
                        _ => return Err(err),
                    }
                }
                Err(err) => Err(err),
            };

            self.pool.release(buffer);
            return result;
        }
    }

    /// Receive-side state after the most recent call.
    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// The receive buffer pool.
    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Borrow the underlying endpoint.
    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Mutably borrow the underlying endpoint.
    pub fn endpoint_mut(&mut self) -> &mut E {
        &mut self.endpoint
    }

    /// Consume the channel and return the endpoint.
    pub fn into_inner(self) -> E {
        self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use gcmsg_endpoint::{GcResult, LoopbackEndpoint, TruncationMode};

    use super::*;
    use crate::pool::PoolConfig;

    /// Endpoint with scripted poll sizes and receive outcomes.
    #[derive(Default)]
    struct ScriptedEndpoint {
        polls: VecDeque<Option<usize>>,
        receives: VecDeque<Result<(u32, Vec<u8>)>>,
        receive_lens: Vec<usize>,
    }

    impl RawEndpoint for ScriptedEndpoint {
        fn raw_send(&mut self, _msg_type: MessageType, _data: &[u8]) -> Result<()> {
            Ok(())
        }

        fn raw_poll(&mut self) -> Option<usize> {
            self.polls.pop_front().flatten()
        }

        fn raw_receive(&mut self, msg_type: &mut MessageType, buffer: &mut [u8]) -> Result<usize> {
            self.receive_lens.push(buffer.len());
            let (tag, bytes) = self
                .receives
                .pop_front()
                .unwrap_or(Err(EndpointError::NoMessage))?;
            if bytes.len() > buffer.len() {
                return Err(EndpointError::BufferTooSmall {
                    capacity: buffer.len(),
                    required: bytes.len(),
                });
            }
            buffer[..bytes.len()].copy_from_slice(&bytes);
            *msg_type = MessageType(tag);
            Ok(bytes.len())
        }
    }

    fn too_small() -> Result<(u32, Vec<u8>)> {
        Err(EndpointError::BufferTooSmall {
            capacity: 0,
            required: 0,
        })
    }

    #[test]
    fn queued_message_then_none() {
        let mut endpoint = LoopbackEndpoint::new();
        endpoint.push_inbound(MessageType(7), vec![0x01, 0x02, 0x03]);
        let mut channel = Channel::new(endpoint);

        let envelope = channel.try_receive().unwrap().expect("message should be queued");
        assert_eq!(envelope, Envelope::new(7u32, vec![0x01u8, 0x02, 0x03]));
        assert_eq!(channel.state(), ChannelState::Idle);

        assert!(channel.try_receive().unwrap().is_none());
    }

    #[test]
    fn empty_queue_is_idempotent() {
        let mut channel = Channel::new(LoopbackEndpoint::new());
        for _ in 0..5 {
            assert!(channel.try_receive().unwrap().is_none());
            assert_eq!(channel.state(), ChannelState::Idle);
        }
        assert_eq!(channel.endpoint().receives(), 0);
    }

    #[test]
    fn send_then_receive_roundtrip() {
        let mut channel = Channel::new(LoopbackEndpoint::new());
        let sent = Envelope::new(42u32, vec![0xAB; 1000]);

        channel.send(&sent).unwrap();
        let received = channel.try_receive().unwrap().unwrap();
        assert_eq!(received, sent);
    }

    #[test]
    fn empty_payload_roundtrip() {
        let mut channel = Channel::new(LoopbackEndpoint::new());
        channel.send(&Envelope::empty(MessageType(3))).unwrap();

        let received = channel.try_receive().unwrap().unwrap();
        assert_eq!(received.msg_type(), MessageType(3));
        assert!(received.is_empty());
    }

    #[test]
    fn retries_once_with_new_poll_size() {
        let endpoint = ScriptedEndpoint {
            polls: VecDeque::from([Some(4), Some(10)]),
            receives: VecDeque::from([too_small(), Ok((9, vec![5u8; 10]))]),
            ..ScriptedEndpoint::default()
        };
        let mut channel = Channel::new(endpoint);

        let envelope = channel.try_receive().unwrap().unwrap();
        assert_eq!(envelope.msg_type(), MessageType(9));
        assert_eq!(envelope.payload().as_ref(), &[5u8; 10]);
        assert_eq!(channel.endpoint().receive_lens, vec![4, 10]);
        assert_eq!(channel.state(), ChannelState::Idle);
    }

    #[test]
    fn persistent_buffer_too_small_is_surfaced_after_one_retry() {
        let endpoint = ScriptedEndpoint {
            polls: VecDeque::from([Some(4), Some(8), Some(16), Some(32)]),
            receives: VecDeque::from([too_small(), too_small(), too_small()]),
            ..ScriptedEndpoint::default()
        };
        let mut channel = Channel::new(endpoint);

        let err = channel.try_receive().unwrap_err();
        assert!(matches!(err, EndpointError::BufferTooSmall { .. }));
        assert_eq!(channel.endpoint().receive_lens, vec![4, 8]);
        assert_eq!(channel.state(), ChannelState::Draining);
    }

    #[test]
    fn surface_policy_does_not_retry() {
        let endpoint = ScriptedEndpoint {
            polls: VecDeque::from([Some(4), Some(10)]),
            receives: VecDeque::from([too_small(), Ok((1, vec![0; 10]))]),
            ..ScriptedEndpoint::default()
        };
        let config = ChannelConfig {
            undersized: UndersizedReceive::Surface,
            ..ChannelConfig::default()
        };
        let mut channel = Channel::with_config(endpoint, config);

        let err = channel.try_receive().unwrap_err();
        assert!(matches!(err, EndpointError::BufferTooSmall { .. }));
        assert_eq!(channel.endpoint().receive_lens, vec![4]);

        let envelope = channel.try_receive().unwrap().unwrap();
        assert_eq!(envelope.len(), 10);
    }

    #[test]
    fn retry_gives_up_when_message_disappears() {
        let endpoint = ScriptedEndpoint {
            polls: VecDeque::from([Some(4), None]),
            receives: VecDeque::from([too_small()]),
            ..ScriptedEndpoint::default()
        };
        let mut channel = Channel::new(endpoint);

        let err = channel.try_receive().unwrap_err();
        assert!(matches!(err, EndpointError::BufferTooSmall { .. }));
        assert_eq!(channel.endpoint().receive_lens, vec![4]);
    }

    #[test]
    fn short_write_is_corrupt() {
        let endpoint = ScriptedEndpoint {
            polls: VecDeque::from([Some(6)]),
            receives: VecDeque::from([Ok((1, vec![1, 2, 3]))]),
            ..ScriptedEndpoint::default()
        };
        let mut channel = Channel::new(endpoint);

        let err = channel.try_receive().unwrap_err();
        assert_eq!(
            err,
            EndpointError::Corrupt {
                expected: 6,
                written: 3
            }
        );
        assert!(err.is_desync());
        assert_eq!(channel.state(), ChannelState::Idle);
        assert_eq!(channel.pool().retained(), 1);
    }

    #[test]
    fn vanished_message_yields_none() {
        let endpoint = ScriptedEndpoint {
            polls: VecDeque::from([Some(6)]),
            receives: VecDeque::from([Err(EndpointError::NoMessage)]),
            ..ScriptedEndpoint::default()
        };
        let mut channel = Channel::new(endpoint);

        assert!(channel.try_receive().unwrap().is_none());
        assert_eq!(channel.state(), ChannelState::Idle);
    }

    #[test]
    fn send_rejection_is_surfaced_without_retry() {
        let mut endpoint = LoopbackEndpoint::new();
        endpoint.reject_sends(Some(GcResult::NotLoggedOn));
        let mut channel = Channel::new(endpoint);

        let err = channel.send(&Envelope::new(1u32, &b"x"[..])).unwrap_err();
        assert_eq!(
            err,
            EndpointError::SendRejected {
                msg_type: MessageType(1),
                reason: GcResult::NotLoggedOn,
            }
        );
        assert_eq!(channel.endpoint().sent(), 0);
        assert_eq!(channel.endpoint().pending(), 0);
    }

    #[test]
    fn advisory_maximum_is_not_enforced() {
        let config = ChannelConfig {
            advisory_max_payload: Some(4),
            ..ChannelConfig::default()
        };
        let mut channel = Channel::with_config(LoopbackEndpoint::new(), config);

        channel.send_raw(MessageType(2), &[0u8; 64]).unwrap();
        assert_eq!(channel.try_receive().unwrap().unwrap().len(), 64);
    }

    #[test]
    fn receive_buffers_are_reused() {
        let mut channel = Channel::new(LoopbackEndpoint::new());
        for i in 0..10u8 {
            channel.send_raw(MessageType(1), &[i; 32]).unwrap();
            let envelope = channel.try_receive().unwrap().unwrap();
            assert_eq!(envelope.payload().as_ref(), &[i; 32]);
        }

        let stats = channel.pool().stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 9);
        assert_eq!(channel.pool().retained(), 1);
    }

    #[test]
    fn oversized_receive_buffer_is_dropped() {
        let config = ChannelConfig {
            pool: PoolConfig {
                high_water_mark: 1024,
                ..PoolConfig::default()
            },
            ..ChannelConfig::default()
        };
        let mut channel = Channel::with_config(LoopbackEndpoint::new(), config);

        channel.send_raw(MessageType(1), &vec![7u8; 4096]).unwrap();
        let envelope = channel.try_receive().unwrap().unwrap();
        assert_eq!(envelope.len(), 4096);
        assert_eq!(channel.pool().retained(), 0);
    }

    #[test]
    fn discarding_endpoint_with_retry_surfaces_error() {
        let mut endpoint = LoopbackEndpoint::new().with_truncation(TruncationMode::Discard);
        endpoint.push_inbound(MessageType(1), vec![1u8; 8]);
        let mut channel = Channel::new(ScriptedPollSize {
            inner: endpoint,
            reported: 4,
        });

        let err = channel.try_receive().unwrap_err();
        assert!(matches!(err, EndpointError::BufferTooSmall { .. }));
        assert_eq!(channel.endpoint().inner.pending(), 0);
        assert!(channel.try_receive().unwrap().is_none());
    }

    /// Reports a stale size on the first poll only.
    struct ScriptedPollSize {
        inner: LoopbackEndpoint,
        reported: usize,
    }

    impl RawEndpoint for ScriptedPollSize {
        fn raw_send(&mut self, msg_type: MessageType, data: &[u8]) -> Result<()> {
            self.inner.raw_send(msg_type, data)
        }

        fn raw_poll(&mut self) -> Option<usize> {
            let actual = self.inner.raw_poll()?;
            Some(std::mem::replace(&mut self.reported, actual).min(actual))
        }

        fn raw_receive(&mut self, msg_type: &mut MessageType, buffer: &mut [u8]) -> Result<usize> {
            self.inner.raw_receive(msg_type, buffer)
        }

        fn retains_undersized(&self) -> bool {
            self.inner.retains_undersized()
        }
    }

    #[test]
    fn discarding_endpoint_never_skips_to_next_message() {
        let mut endpoint = LoopbackEndpoint::sink().with_truncation(TruncationMode::Discard);
        endpoint.push_inbound(MessageType(10), vec![0xAB; 64]);
        endpoint.push_inbound(MessageType(11), &b"next"[..]);
        let mut channel = Channel::new(ScriptedPollSize {
            inner: endpoint,
            reported: 48,
        });

        let err = channel.try_receive().unwrap_err();
        assert_eq!(
            err,
            EndpointError::BufferTooSmall {
                capacity: 48,
                required: 64,
            }
        );
        assert_eq!(channel.endpoint().inner.receives(), 1);
        assert_eq!(channel.endpoint().inner.pending(), 1);

        let envelope = channel.try_receive().unwrap().expect("following message");
        assert_eq!(envelope.msg_type(), MessageType(11));
    }

    #[test]
    fn retry_rejects_smaller_repoll() {
        let mut channel = Channel::new(ScriptedEndpoint {
            polls: VecDeque::from([Some(4), Some(2)]),
            receives: VecDeque::from([Err(EndpointError::BufferTooSmall {
                capacity: 4,
                required: 8,
            })]),
            ..Default::default()
        });

        assert!(matches!(
            channel.try_receive(),
            Err(EndpointError::BufferTooSmall { required: 8, .. })
        ));
        assert_eq!(channel.endpoint().receive_lens, vec![4]);
    }

    #[test]
    fn drain_collects_until_empty() {
        let mut channel = Channel::new(LoopbackEndpoint::new());
        for i in 0..5u32 {
            channel.send_raw(MessageType(i), &i.to_le_bytes()).unwrap();
        }

        let mut out = Vec::new();
        assert_eq!(channel.drain(3, &mut out).unwrap(), 3);
        assert_eq!(channel.drain(10, &mut out).unwrap(), 2);
        assert_eq!(channel.drain(10, &mut out).unwrap(), 0);

        let tags: Vec<u32> = out.iter().map(|e| e.msg_type().get()).collect();
        assert_eq!(tags, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn drain_keeps_messages_received_before_error() {
        let endpoint = ScriptedEndpoint {
            polls: VecDeque::from([Some(1), Some(5)]),
            receives: VecDeque::from([Ok((1, vec![1])), Ok((2, vec![1, 2]))]),
            ..ScriptedEndpoint::default()
        };
        let mut channel = Channel::new(endpoint);

        let mut out = Vec::new();
        let err = channel.drain(10, &mut out).unwrap_err();
        assert!(err.is_desync());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn logged_off_endpoint_reports_nothing_queued() {
        let mut endpoint = LoopbackEndpoint::new();
        endpoint.push_inbound(MessageType(1), vec![1u8]);
        endpoint.set_logged_on(false);
        let mut channel = Channel::new(endpoint);

        assert!(channel.try_receive().unwrap().is_none());
        channel.endpoint_mut().set_logged_on(true);
        assert!(channel.try_receive().unwrap().is_some());
    }

    #[test]
    fn borrowed_endpoint_outlives_channel() {
        let mut endpoint = LoopbackEndpoint::new();
        {
            let mut channel = Channel::new(&mut endpoint);
            channel.send_raw(MessageType(5), b"kept").unwrap();
        }
        assert_eq!(endpoint.pending(), 1);

        let mut channel = Channel::new(&mut endpoint);
        let envelope = channel.try_receive().unwrap().unwrap();
        assert_eq!(envelope.payload().as_ref(), b"kept");
    }
}
