//! Requests waiting for their acknowledgement.
//!
//! The states of one device share a single queue, so an acknowledgement
//! resolves exactly one request even when several states asked the device
//! the same question.

use std::cell::RefCell;
use std::rc::Rc;

use plmprims_dispatch::{CallbackRegistry, Template};
use plmprims_frame::Message;

use crate::state::Handler;

/// Identifies the state that made a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyOwner(u32);

/// A resolved request: who asked and how to decode the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    pub owner: ReplyOwner,
    pub handler: Handler,
}

#[derive(Default)]
struct Pending {
    replies: CallbackRegistry<Reply>,
    owners: u32,
}

/// Ordered one-shot correlations for one device.
///
/// Clones share the same queue. The most specific matching template
/// resolves a frame; among equally specific ones the oldest request wins.
#[derive(Clone, Default)]
pub struct ReplyQueue {
    pending: Rc<RefCell<Pending>>,
}

impl ReplyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an owner for a state joining this queue.
    pub fn join(&self) -> ReplyOwner {
        let mut pending = self.pending.borrow_mut();
        pending.owners += 1;
        ReplyOwner(pending.owners)
    }

    /// Wait for one frame matching `template`.
    pub fn expect(&self, template: Template, reply: Reply) {
        self.pending.borrow_mut().replies.register_once(template, reply);
    }

    /// Resolve the request `message` answers, whoever made it.
    pub fn claim(&self, message: &Message) -> Option<Reply> {
        self.pending.borrow_mut().replies.take_best(message, |_| true)
    }

    /// Resolve the request `message` answers among those made by `owner`.
    pub fn claim_for(&self, owner: ReplyOwner, message: &Message) -> Option<Handler> {
        self.pending
            .borrow_mut()
            .replies
            .take_best(message, |reply| reply.owner == owner)
            .map(|reply| reply.handler)
    }

    pub fn pending_for(&self, owner: ReplyOwner) -> usize {
        self.pending
            .borrow()
            .replies
            .handlers()
            .filter(|reply| reply.owner == owner)
            .count()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use plmprims_dispatch::FlagsTemplate;
    use plmprims_frame::{Address, MessageFlags, MessageType};

    use super::*;

    const DEVICE: Address = Address::new(0x1A, 0x2B, 0x3C);
    const MODEM: Address = Address::new(0x44, 0x55, 0x66);

    fn ack(cmd1: u8, cmd2: u8) -> Message {
        Message::standard_received(
            DEVICE,
            MODEM,
            MessageFlags::new(MessageType::DirectAck, false),
            cmd1,
            cmd2,
        )
    }

    fn acked(cmd1: u8) -> Template {
        Template::standard_received()
            .address(DEVICE)
            .cmd1(cmd1)
            .flags(FlagsTemplate::of_type(MessageType::DirectAck))
    }

    #[test]
    fn one_frame_resolves_one_request() {
        let queue = ReplyQueue::new();
        let temperature = queue.join();
        let humidity = queue.join();
        let status = |owner| Reply {
            owner,
            handler: Handler::Status,
        };
        queue.expect(acked(0x6A), status(temperature));
        queue.expect(acked(0x6A), status(humidity));

        assert_eq!(queue.claim(&ack(0x6A, 0x8C)), Some(status(temperature)));
        assert_eq!(queue.pending_for(temperature), 0);
        assert_eq!(queue.pending_for(humidity), 1);
        assert_eq!(queue.claim(&ack(0x6A, 0x2A)), Some(status(humidity)));
        assert!(queue.is_empty());
    }

    #[test]
    fn echoed_command_beats_an_older_open_request() {
        let queue = ReplyQueue::new();
        let mode = queue.join();
        queue.expect(
            acked(0x6B),
            Reply {
                owner: mode,
                handler: Handler::Status,
            },
        );
        queue.expect(
            acked(0x6B).cmd2(0x05),
            Reply {
                owner: mode,
                handler: Handler::Ack,
            },
        );

        assert_eq!(queue.claim_for(mode, &ack(0x6B, 0x05)), Some(Handler::Ack));
        assert_eq!(queue.claim_for(mode, &ack(0x6B, 0x02)), Some(Handler::Status));
    }

    #[test]
    fn claim_for_leaves_other_owners_alone() {
        let queue = ReplyQueue::new();
        let first = queue.join();
        let second = queue.join();
        assert_ne!(first, second);
        queue.expect(
            acked(0x6A),
            Reply {
                owner: first,
                handler: Handler::Status,
            },
        );

        assert_eq!(queue.claim_for(second, &ack(0x6A, 0x8C)), None);
        assert_eq!(queue.len(), 1);

        let shared = queue.clone();
        assert_eq!(shared.claim_for(first, &ack(0x6A, 0x8C)), Some(Handler::Status));
        assert!(queue.is_empty());
    }
}
