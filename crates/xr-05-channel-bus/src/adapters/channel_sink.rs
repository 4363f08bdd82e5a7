//! # Channel Sink
//!
//! A [`DeliverySink`] whose receiving half is a [`SubscriptionStream`].
//!
//! The stream yields `Delivery::Message` items in delivery order, then
//! `Delivery::Terminated` if the subscription is invalidated, then ends once
//! the subscription has been dropped by the region.
//!
//! A termination notice never waits for buffer space. If the client is not
//! reading, the notice is parked and yielded after the buffered messages,
//! once the region has released the sink.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use async_trait::async_trait;
use shared_types::Message;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tokio_stream::Stream;
use xr_02_subscription_registry::{DeliverySink, SinkError};

use crate::domain::Delivery;

/// Sending half: registered with the dispatcher.
#[derive(Debug)]
pub struct ChannelSink {
    sender: mpsc::Sender<Delivery>,
    parked_termination: Arc<AtomicBool>,
}

impl ChannelSink {
    /// Create a sink and the stream it feeds.
    ///
    /// When the buffer is full, `deliver` waits; the dispatcher queue in
    /// front of it absorbs the backlog.
    #[must_use]
    pub fn pair(buffer: usize) -> (Arc<Self>, SubscriptionStream) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let parked_termination = Arc::new(AtomicBool::new(false));
        (
            Arc::new(Self {
                sender,
                parked_termination: Arc::clone(&parked_termination),
            }),
            SubscriptionStream {
                receiver,
                parked_termination,
            },
        )
    }
}

#[async_trait]
impl DeliverySink for ChannelSink {
    async fn deliver(&self, message: &Message) -> Result<(), SinkError> {
        self.sender
            .send(Delivery::Message(message.clone()))
            .await
            .map_err(|_| SinkError::Closed)
    }

    async fn notify_terminated(&self) -> Result<(), SinkError> {
        match self.sender.try_send(Delivery::Terminated) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.parked_termination.store(true, Ordering::SeqCst);
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(SinkError::Closed),
        }
    }
}

/// Receiving half: held by the client.
///
/// Dropping it makes every further delivery fail with `SinkError::Closed`,
/// which the dispatcher counts toward removing the subscription.
#[derive(Debug)]
pub struct SubscriptionStream {
    receiver: mpsc::Receiver<Delivery>,
    parked_termination: Arc<AtomicBool>,
}

impl SubscriptionStream {
    /// Next delivery, or `None` once the subscription is gone.
    pub async fn recv(&mut self) -> Option<Delivery> {
        match self.receiver.recv().await {
            Some(delivery) => Some(delivery),
            None => self.take_parked(),
        }
    }

    /// Next delivery if one is ready.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        match self.receiver.try_recv() {
            Ok(delivery) => Some(delivery),
            Err(TryRecvError::Disconnected) => self.take_parked(),
            Err(TryRecvError::Empty) => None,
        }
    }

    /// Messages currently buffered, without waiting.
    pub fn drain_ready(&mut self) -> Vec<Delivery> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// The parked termination notice, yielded at most once.
    fn take_parked(&self) -> Option<Delivery> {
        self.parked_termination
            .swap(false, Ordering::SeqCst)
            .then_some(Delivery::Terminated)
    }
}

impl Stream for SubscriptionStream {
    type Item = Delivery;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match ready!(self.receiver.poll_recv(cx)) {
            Some(delivery) => Poll::Ready(Some(delivery)),
            None => Poll::Ready(self.take_parked()),
        }
    }
}
