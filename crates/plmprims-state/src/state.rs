//! The state entity shared by every device state.
//!
//! A state owns its value, its subscribers and the standing templates
//! registered at construction. Requests it sends wait for their
//! acknowledgement in a [`ReplyQueue`], shared with the other states of the
//! same device.

use std::sync::mpsc;

use plmprims_dispatch::{CallbackRegistry, FlagsTemplate, Template};
use plmprims_frame::{Address, Message, MessageType};

use crate::error::{Result, StateError};
use crate::reply::{Reply, ReplyOwner, ReplyQueue};

/// Group of states on single-group devices.
pub const DEFAULT_GROUP: u8 = 0x01;

/// Handler tokens stored in a state's callback registry.
///
/// The owning state interprets the token in [`State::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    /// Standard status report, or the reply to a status request.
    Status,
    /// Acknowledgement of a control command.
    Ack,
    /// Vendor extended status block, decoded by the device flavor.
    ExtendedStatus,
}

/// Outbound side of the modem.
///
/// `send` hands the message over and returns immediately. Replies arrive
/// later through [`State::receive`].
pub trait MessageSink {
    fn send(&self, message: Message) -> Result<()>;
}

impl MessageSink for mpsc::Sender<Message> {
    fn send(&self, message: Message) -> Result<()> {
        mpsc::Sender::send(self, message).map_err(|_| StateError::SinkClosed)
    }
}

/// Subscriber callback: `(address, state name, new value)`.
pub type Subscriber<V> = Box<dyn FnMut(&Address, &str, &V)>;

/// Data and plumbing common to every state variant.
pub struct StateCore<V> {
    address: Address,
    group: u8,
    name: String,
    value: Option<V>,
    subscribers: Vec<Subscriber<V>>,
    callbacks: CallbackRegistry<Handler>,
    replies: ReplyQueue,
    owner: ReplyOwner,
    sink: Box<dyn MessageSink>,
}

impl<V> StateCore<V> {
    pub fn new(address: Address, name: impl Into<String>, sink: Box<dyn MessageSink>) -> Self {
        let replies = ReplyQueue::new();
        let owner = replies.join();
        Self {
            address,
            group: DEFAULT_GROUP,
            name: name.into(),
            value: None,
            subscribers: Vec::new(),
            callbacks: CallbackRegistry::new(),
            replies,
            owner,
            sink,
        }
    }

    pub fn with_group(mut self, group: u8) -> Self {
        self.group = group;
        self
    }

    /// Seed the value without notifying anyone.
    pub fn with_value(mut self, value: V) -> Self {
        self.value = Some(value);
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn group(&self) -> u8 {
        self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Standing templates.
    pub fn callbacks(&self) -> &CallbackRegistry<Handler> {
        &self.callbacks
    }

    pub fn callbacks_mut(&mut self) -> &mut CallbackRegistry<Handler> {
        &mut self.callbacks
    }

    /// Wait for acknowledgements in `replies` from now on.
    ///
    /// Requests pending in the previous queue are dropped.
    pub fn share_replies(&mut self, replies: &ReplyQueue) {
        self.replies = replies.clone();
        self.owner = replies.join();
    }

    pub fn replies(&self) -> &ReplyQueue {
        &self.replies
    }

    pub fn owner(&self) -> ReplyOwner {
        self.owner
    }

    /// Requests of this state still waiting for their reply.
    pub fn pending_replies(&self) -> usize {
        self.replies.pending_for(self.owner)
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&Address, &str, &V) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Store `value` and call every subscriber in registration order.
    pub fn notify(&mut self, value: V) {
        let value = &*self.value.insert(value);
        tracing::debug!(address = %self.address, state = %self.name, "value updated");
        for subscriber in &mut self.subscribers {
            subscriber(&self.address, &self.name, value);
        }
    }

    /// Hand a request to the sink and expect a direct acknowledgement.
    ///
    /// The acknowledgement must come from the message's address and echo its
    /// `cmd1`; any `cmd2` is accepted and decoded with `reply`.
    pub fn send(&mut self, message: Message, reply: Handler) -> Result<()> {
        let template = acknowledgement(&message);
        self.send_expecting(message, template, reply)
    }

    /// Like [`send`](Self::send) for commands whose acknowledgement echoes
    /// both command bytes.
    pub fn send_command(&mut self, message: Message, reply: Handler) -> Result<()> {
        let template = acknowledgement(&message).cmd2(message.cmd2);
        self.send_expecting(message, template, reply)
    }

    fn send_expecting(
        &mut self,
        message: Message,
        template: Template,
        reply: Handler,
    ) -> Result<()> {
        tracing::debug!(state = %self.name, message = %message, ?reply, "sending");
        self.sink.send(message)?;
        self.replies.expect(
            template,
            Reply {
                owner: self.owner,
                handler: reply,
            },
        );
        Ok(())
    }

    /// Resolve the request of this state that `message` answers, if any.
    pub fn claim_reply(&self, message: &Message) -> Option<Handler> {
        self.replies.claim_for(self.owner, message)
    }

    /// Standing handlers matching `message`, each at most once.
    pub fn handlers_for(&mut self, message: &Message) -> Vec<Handler> {
        let mut handlers = Vec::new();
        for handler in self.callbacks.take_matches(message) {
            if !handlers.contains(&handler) {
                handlers.push(handler);
            }
        }
        handlers
    }
}

fn acknowledgement(request: &Message) -> Template {
    Template::standard_received()
        .address(request.address)
        .cmd1(request.cmd1)
        .flags(FlagsTemplate::of_type(MessageType::DirectAck))
}

/// One observable point on a device.
pub trait State {
    type Value;

    fn core(&self) -> &StateCore<Self::Value>;

    fn core_mut(&mut self) -> &mut StateCore<Self::Value>;

    /// Decode `message` for `handler`. `None` means the byte is unmapped.
    fn decode(&self, handler: Handler, message: &Message) -> Option<Self::Value>;

    /// Send a status request; the reply updates the value.
    fn refresh(&mut self) -> Result<()>;

    /// Run `message` through this state's templates.
    ///
    /// Returns the number of notifications. Unmatched frames and unmapped
    /// values are ignored. When the state shares its [`ReplyQueue`], feed
    /// frames through the device so each reply is claimed once.
    fn receive(&mut self, message: &Message) -> usize {
        let reply = self.core().claim_reply(message);
        self.apply(message, reply)
    }

    /// Decode `message`, given the request of this state it answers.
    ///
    /// A reply that decodes is the only notification for the frame. One that
    /// does not decode falls back to the standing templates, as does a frame
    /// answering no request.
    fn apply(&mut self, message: &Message, reply: Option<Handler>) -> usize {
        if let Some(handler) = reply {
            if let Some(value) = self.decode(handler, message) {
                self.core_mut().notify(value);
                return 1;
            }
            tracing::debug!(
                state = %self.core().name(),
                ?handler,
                cmd2 = message.cmd2,
                "reply not decodable, trying standing templates"
            );
        }

        let mut notified = 0;
        for handler in self.core_mut().handlers_for(message) {
            match self.decode(handler, message) {
                Some(value) => {
                    self.core_mut().notify(value);
                    notified += 1;
                }
                None => tracing::debug!(
                    state = %self.core().name(),
                    ?handler,
                    cmd1 = message.cmd1,
                    cmd2 = message.cmd2,
                    "unmapped value ignored"
                ),
            }
        }
        notified
    }

    fn value(&self) -> Option<&Self::Value> {
        self.core().value()
    }

    fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&Address, &str, &Self::Value) + 'static,
    {
        self.core_mut().subscribe(subscriber);
    }

    fn address(&self) -> Address {
        self.core().address()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn group(&self) -> u8 {
        self.core().group()
    }
}

/// A state that accepts control intents.
///
/// `set` only sends the command. The value changes when the device
/// acknowledges it.
pub trait Controllable: State {
    type Intent;

    fn set(&mut self, intent: Self::Intent) -> Result<()>;
}
