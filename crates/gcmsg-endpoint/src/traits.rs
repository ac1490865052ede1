use crate::error::Result;
use crate::types::MessageType;

/// The three primitives of a native message endpoint.
///
/// All methods take `&mut self`: each one mutates native session state and
/// calls must be serialized to preserve FIFO delivery. An endpoint is owned
/// (or exclusively borrowed) by exactly one channel at a time.
pub trait RawEndpoint {
    /// Hand one message to the native session.
    ///
    /// Fails with [`EndpointError::SendRejected`](crate::EndpointError::SendRejected)
    /// when the native call reports a non-OK status. No payload size limit is
    /// enforced here.
    fn raw_send(&mut self, msg_type: MessageType, data: &[u8]) -> Result<()>;

    /// Size in bytes of the next queued inbound message, or `None`.
    ///
    /// Must not block.
    fn raw_poll(&mut self) -> Option<usize>;

    /// Copy the next queued message into `buffer`.
    ///
    /// On success returns the number of bytes written and stores the type tag
    /// in `msg_type`. Fails with
    /// [`EndpointError::BufferTooSmall`](crate::EndpointError::BufferTooSmall)
    /// when `buffer` cannot hold the message.
    fn raw_receive(&mut self, msg_type: &mut MessageType, buffer: &mut [u8]) -> Result<usize>;

    /// Whether a message stays queued after an undersized receive.
    ///
    /// Endpoints that drop the message on
    /// [`EndpointError::BufferTooSmall`](crate::EndpointError::BufferTooSmall)
    /// must return `false`; the next poll then describes a different message.
    fn retains_undersized(&self) -> bool {
        true
    }
}

impl<E: RawEndpoint + ?Sized> RawEndpoint for &mut E {
    fn raw_send(&mut self, msg_type: MessageType, data: &[u8]) -> Result<()> {
        (**self).raw_send(msg_type, data)
    }

    fn raw_poll(&mut self) -> Option<usize> {
        (**self).raw_poll()
    }

    fn raw_receive(&mut self, msg_type: &mut MessageType, buffer: &mut [u8]) -> Result<usize> {
        (**self).raw_receive(msg_type, buffer)
    }

    fn retains_undersized(&self) -> bool {
        (**self).retains_undersized()
    }
}

impl<E: RawEndpoint + ?Sized> RawEndpoint for Box<E> {
    fn raw_send(&mut self, msg_type: MessageType, data: &[u8]) -> Result<()> {
        (**self).raw_send(msg_type, data)
    }

    fn raw_poll(&mut self) -> Option<usize> {
        (**self).raw_poll()
    }

    fn raw_receive(&mut self, msg_type: &mut MessageType, buffer: &mut [u8]) -> Result<usize> {
        (**self).raw_receive(msg_type, buffer)
    }

    fn retains_undersized(&self) -> bool {
        (**self).retains_undersized()
    }
}
