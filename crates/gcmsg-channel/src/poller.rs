use std::time::Duration;

use gcmsg_endpoint::{RawEndpoint, Result};
use tokio::time::{Interval, MissedTickBehavior};

use crate::channel::Channel;
use crate::envelope::Envelope;

/// Drives a [`Channel`] from a tokio task on a fixed polling period.
///
/// Polling cadence and deadlines live here, outside the channel. Every
/// future returned by this type is cancel-safe: a message is only taken
/// off the endpoint inside a synchronous `try_receive` call.
#[derive(Debug)]
pub struct AsyncPoller<E> {
    channel: Channel<E>,
    period: Duration,
    interval: Option<Interval>,
}

impl<E: RawEndpoint> AsyncPoller<E> {
    /// Poll `channel` every `period`.
    pub fn new(channel: Channel<E>, period: Duration) -> Self {
        Self {
            channel,
            period,
            interval: None,
        }
    }

    /// Wait for the next envelope.
    pub async fn next(&mut self) -> Result<Envelope> {
        loop {
            if let Some(envelope) = self.channel.try_receive()? {
                return Ok(envelope);
            }
            self.tick().await;
        }
    }

    /// Wait for the next envelope for at most `deadline`.
    ///
    /// Returns `Ok(None)` when the deadline passes first.
    pub async fn next_within(&mut self, deadline: Duration) -> Result<Option<Envelope>> {
        match tokio::time::timeout(deadline, self.next()).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }

    async fn tick(&mut self) {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }

    pub fn channel(&self) -> &Channel<E> {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut Channel<E> {
        &mut self.channel
    }

    /// Stop polling and return the channel.
    pub fn into_inner(self) -> Channel<E> {
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use gcmsg_endpoint::{LoopbackEndpoint, MessageType};

    use super::*;

    #[tokio::test]
    async fn returns_queued_message_immediately() {
        let mut endpoint = LoopbackEndpoint::new();
        endpoint.push_inbound(MessageType(7), vec![1u8, 2, 3]);
        let mut poller = AsyncPoller::new(Channel::new(endpoint), Duration::from_millis(5));

        let envelope = poller.next().await.unwrap();
        assert_eq!(envelope.payload().as_ref(), &[1, 2, 3]);
    }

    #[tokio::test]
    async fn deadline_without_message_returns_none() {
        let mut poller = AsyncPoller::new(
            Channel::new(LoopbackEndpoint::new()),
            Duration::from_millis(2),
        );

        let result = poller.next_within(Duration::from_millis(20)).await.unwrap();
        assert!(result.is_none());
        assert!(poller.channel().endpoint().polls() >= 2);
    }

    #[tokio::test]
    async fn picks_up_message_queued_between_ticks() {
        let mut poller = AsyncPoller::new(
            Channel::new(LoopbackEndpoint::new()),
            Duration::from_millis(2),
        );
        assert!(poller
            .next_within(Duration::from_millis(5))
            .await
            .unwrap()
            .is_none());

        poller
            .channel_mut()
            .endpoint_mut()
            .push_inbound(MessageType(9), vec![9u8]);
        let envelope = poller
            .next_within(Duration::from_secs(1))
            .await
            .unwrap()
            .expect("message should arrive before deadline");
        assert_eq!(envelope.msg_type(), MessageType(9));

        let channel = poller.into_inner();
        assert_eq!(channel.endpoint().pending(), 0);
    }
}
