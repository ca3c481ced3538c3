//! Partially specified messages used as filters.
//!
//! Every field of a [`Template`] is optional. `None` is a wildcard and never
//! constrains a match; `Some(value)` must equal the message field exactly.

use plmprims_frame::code::{EXTENDED_MESSAGE_RECEIVED, STANDARD_MESSAGE_RECEIVED};
use plmprims_frame::{
    AckStatus, Address, Message, MessageFlags, MessageType, UserData, USER_DATA_LEN,
};

/// Flags constraint with independently wildcarded parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagsTemplate {
    pub message_type: Option<MessageType>,
    pub extended: Option<bool>,
    pub hops_left: Option<u8>,
    pub max_hops: Option<u8>,
}

impl FlagsTemplate {
    /// Constrain the message type and the extended bit; hop counts stay open.
    pub fn new(message_type: Option<MessageType>, extended: Option<bool>) -> Self {
        Self {
            message_type,
            extended,
            hops_left: None,
            max_hops: None,
        }
    }

    /// Constrain the message type only.
    pub fn of_type(message_type: MessageType) -> Self {
        Self::new(Some(message_type), None)
    }

    pub fn hops(mut self, hops_left: Option<u8>, max_hops: Option<u8>) -> Self {
        self.hops_left = hops_left;
        self.max_hops = max_hops;
        self
    }

    /// Exact match on every part of `flags`.
    pub fn exact(flags: MessageFlags) -> Self {
        Self {
            message_type: Some(flags.message_type),
            extended: Some(flags.extended),
            hops_left: Some(flags.hops_left),
            max_hops: Some(flags.max_hops),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, flags: &MessageFlags) -> bool {
        field_matches(self.message_type, flags.message_type)
            && field_matches(self.extended, flags.extended)
            && field_matches(self.hops_left, flags.hops_left)
            && field_matches(self.max_hops, flags.max_hops)
    }
}

/// Sparse constraint over the user data slots `d1..d14`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserDataTemplate([Option<u8>; USER_DATA_LEN]);

impl UserDataTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain slot `d<slot>` (1-based). Out-of-range slots are ignored.
    pub fn slot(mut self, slot: usize, value: u8) -> Self {
        if let Some(entry) = slot.checked_sub(1).and_then(|i| self.0.get_mut(i)) {
            *entry = Some(value);
        }
        self
    }

    /// Build from `(slot, value)` pairs, e.g. `[(1, 0x01)]`.
    pub fn from_slots(slots: &[(usize, u8)]) -> Self {
        slots
            .iter()
            .fold(Self::new(), |template, (slot, value)| template.slot(*slot, *value))
    }

    /// Constrain every slot to `data`.
    pub fn exact(data: &UserData) -> Self {
        let mut slots = [None; USER_DATA_LEN];
        for (entry, byte) in slots.iter_mut().zip(data.as_bytes()) {
            *entry = Some(*byte);
        }
        Self(slots)
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    pub fn matches(&self, data: &UserData) -> bool {
        self.0
            .iter()
            .zip(data.as_bytes())
            .all(|(expected, actual)| field_matches(*expected, *actual))
    }
}

/// A message pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Template {
    pub code: Option<u8>,
    pub address: Option<Address>,
    pub target: Option<Address>,
    pub flags: FlagsTemplate,
    pub cmd1: Option<u8>,
    pub cmd2: Option<u8>,
    pub user_data: UserDataTemplate,
    pub ack: Option<AckStatus>,
}

impl Template {
    /// Matches every message.
    pub fn any() -> Self {
        Self::default()
    }

    /// Matches standard messages received from the network.
    pub fn standard_received() -> Self {
        Self {
            code: Some(STANDARD_MESSAGE_RECEIVED),
            ..Self::default()
        }
    }

    /// Matches extended messages received from the network.
    pub fn extended_received() -> Self {
        Self {
            code: Some(EXTENDED_MESSAGE_RECEIVED),
            ..Self::default()
        }
    }

    /// Matches only messages equal to `message`.
    pub fn exact(message: &Message) -> Self {
        Self {
            code: Some(message.code),
            address: Some(message.address),
            target: message.target,
            flags: FlagsTemplate::exact(message.flags),
            cmd1: Some(message.cmd1),
            cmd2: Some(message.cmd2),
            user_data: message
                .user_data
                .as_ref()
                .map(UserDataTemplate::exact)
                .unwrap_or_default(),
            ack: message.ack,
        }
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn target(mut self, target: Address) -> Self {
        self.target = Some(target);
        self
    }

    pub fn flags(mut self, flags: FlagsTemplate) -> Self {
        self.flags = flags;
        self
    }

    /// Constrain both command bytes.
    pub fn command(mut self, cmd1: u8, cmd2: Option<u8>) -> Self {
        self.cmd1 = Some(cmd1);
        self.cmd2 = cmd2;
        self
    }

    pub fn cmd1(mut self, cmd1: u8) -> Self {
        self.cmd1 = Some(cmd1);
        self
    }

    pub fn cmd2(mut self, cmd2: u8) -> Self {
        self.cmd2 = Some(cmd2);
        self
    }

    pub fn user_data(mut self, user_data: UserDataTemplate) -> Self {
        self.user_data = user_data;
        self
    }

    pub fn ack(mut self, ack: AckStatus) -> Self {
        self.ack = Some(ack);
        self
    }

    /// Evaluate this template against `message`.
    pub fn matches(&self, message: &Message) -> bool {
        matches(self, message)
    }

    /// Number of constrained fields. Of two templates matching the same
    /// message, the one with more constraints is narrower.
    pub fn specificity(&self) -> usize {
        let flags = &self.flags;
        let fields = [
            self.code.is_some(),
            self.address.is_some(),
            self.target.is_some(),
            flags.message_type.is_some(),
            flags.extended.is_some(),
            flags.hops_left.is_some(),
            flags.max_hops.is_some(),
            self.cmd1.is_some(),
            self.cmd2.is_some(),
            self.ack.is_some(),
        ];
        let slots = self.user_data.0.iter().filter(|slot| slot.is_some()).count();
        fields.iter().filter(|constrained| **constrained).count() + slots
    }
}

/// Field-by-field comparison of `template` against `message`.
///
/// Pure: evaluating a template never changes it. Target, ack and user data
/// constraints fail against messages that do not carry those fields.
pub fn matches(template: &Template, message: &Message) -> bool {
    field_matches(template.code, message.code)
        && field_matches(template.address, message.address)
        && optional_matches(template.target, message.target)
        && template.flags.matches(&message.flags)
        && field_matches(template.cmd1, message.cmd1)
        && field_matches(template.cmd2, message.cmd2)
        && optional_matches(template.ack, message.ack)
        && user_data_matches(&template.user_data, message.user_data.as_ref())
}

fn field_matches<T: PartialEq>(expected: Option<T>, actual: T) -> bool {
    expected.is_none_or(|expected| expected == actual)
}

fn optional_matches<T: PartialEq>(expected: Option<T>, actual: Option<T>) -> bool {
    match expected {
        None => true,
        Some(expected) => actual == Some(expected),
    }
}

fn user_data_matches(template: &UserDataTemplate, data: Option<&UserData>) -> bool {
    match data {
        Some(data) => template.matches(data),
        None => template.is_wildcard(),
    }
}

#[cfg(test)]
mod tests {
    use plmprims_frame::Message;

    use super::*;

    const DEVICE: Address = Address::new(0x1A, 0x2B, 0x3C);
    const MODEM: Address = Address::new(0x44, 0x55, 0x66);

    fn standard(cmd1: u8, cmd2: u8, message_type: MessageType) -> Message {
        Message::standard_received(
            DEVICE,
            MODEM,
            MessageFlags::new(message_type, false).with_hops(2, 3),
            cmd1,
            cmd2,
        )
    }

    fn extended(cmd1: u8, cmd2: u8, slots: &[(usize, u8)]) -> Message {
        let mut data = UserData::new();
        for (slot, value) in slots {
            data.set(*slot, *value);
        }
        Message::extended_received(
            DEVICE,
            MODEM,
            MessageFlags::new(MessageType::Direct, true),
            cmd1,
            cmd2,
            data,
        )
    }

    #[test]
    fn wildcard_template_matches_everything() {
        let template = Template::any();
        assert!(template.matches(&standard(0x6E, 0x91, MessageType::Direct)));
        assert!(template.matches(&extended(0x2E, 0x02, &[(1, 0x01), (6, 0x21)])));
        assert!(template.matches(&Message::standard_send(DEVICE, 0x6A, 0x00)));
    }

    #[test]
    fn exact_copy_matches_only_the_same_message() {
        let msg = extended(0x2E, 0x02, &[(1, 0x01), (7, 0x96)]);
        let template = Template::exact(&msg);
        assert!(template.matches(&msg));

        assert!(!template.matches(&extended(0x2E, 0x02, &[(1, 0x01), (7, 0x97)])));
        assert!(!template.matches(&extended(0x2E, 0x03, &[(1, 0x01), (7, 0x96)])));

        let std_msg = standard(0x6E, 0x91, MessageType::Direct);
        assert!(Template::exact(&std_msg).matches(&std_msg));
        assert!(!Template::exact(&std_msg).matches(&standard(0x6E, 0x92, MessageType::Direct)));
    }

    #[test]
    fn sparse_user_data_matches_on_constrained_slot_only() {
        let template = Template::extended_received()
            .command(0x2E, Some(0x02))
            .user_data(UserDataTemplate::new().slot(1, 0x01));

        assert!(template.matches(&extended(0x2E, 0x02, &[(1, 0x01)])));
        assert!(template.matches(&extended(0x2E, 0x02, &[(1, 0x01), (6, 0x31), (12, 0x8C)])));
        assert!(!template.matches(&extended(0x2E, 0x02, &[(1, 0x02), (6, 0x31)])));
    }

    #[test]
    fn user_data_constraint_rejects_standard_messages() {
        let template = Template::any().user_data(UserDataTemplate::from_slots(&[(1, 0x00)]));
        assert!(!template.matches(&standard(0x2E, 0x02, MessageType::Direct)));
    }

    #[test]
    fn flags_constrain_type_with_open_hops() {
        let template = Template::standard_received()
            .address(DEVICE)
            .command(0x6B, Some(0x04))
            .flags(FlagsTemplate::of_type(MessageType::DirectAck));

        assert!(template.matches(&standard(0x6B, 0x04, MessageType::DirectAck)));
        assert!(!template.matches(&standard(0x6B, 0x04, MessageType::Direct)));

        let any_hops = Message::standard_received(
            DEVICE,
            MODEM,
            MessageFlags::new(MessageType::DirectAck, false).with_hops(0, 1),
            0x6B,
            0x04,
        );
        assert!(template.matches(&any_hops));
    }

    #[test]
    fn flags_constrain_hops_with_open_type() {
        let template =
            Template::any().flags(FlagsTemplate::default().hops(Some(2), None));

        assert!(template.matches(&standard(0x6E, 0x91, MessageType::Direct)));
        assert!(template.matches(&standard(0x6E, 0x91, MessageType::Broadcast)));
        assert!(!Template::any()
            .flags(FlagsTemplate::default().hops(Some(1), None))
            .matches(&standard(0x6E, 0x91, MessageType::Direct)));
    }

    #[test]
    fn address_and_code_constraints() {
        let msg = standard(0x6E, 0x91, MessageType::Direct);
        assert!(!Template::any().address(MODEM).matches(&msg));
        assert!(Template::any().target(MODEM).matches(&msg));
        assert!(!Template::extended_received().matches(&msg));
        assert!(!Template::any()
            .target(MODEM)
            .matches(&Message::standard_send(DEVICE, 0x6E, 0x00)));
    }

    #[test]
    fn pinned_command_is_more_specific() {
        let reply = Template::standard_received()
            .address(DEVICE)
            .cmd1(0x6B)
            .flags(FlagsTemplate::of_type(MessageType::DirectAck));
        let pinned = reply.cmd2(0x05);

        assert_eq!(Template::any().specificity(), 0);
        assert_eq!(reply.specificity(), 4);
        assert_eq!(pinned.specificity(), 5);
        assert_eq!(
            Template::any()
                .user_data(UserDataTemplate::from_slots(&[(1, 0x01), (6, 0x31)]))
                .specificity(),
            2
        );
    }

    #[test]
    fn evaluation_does_not_mutate_template() {
        let template = Template::standard_received().cmd1(0x6E);
        let before = template;
        for cmd2 in 0..=255u8 {
            let _ = matches(&template, &standard(0x6E, cmd2, MessageType::Direct));
        }
        assert_eq!(template, before);
    }
}
