use plmprims_frame::Message;

use crate::template::Template;

#[derive(Debug, Clone)]
struct Entry<H> {
    template: Template,
    handler: H,
    once: bool,
    spent: bool,
}

/// Ordered `(template, handler)` pairs owned by a single state.
///
/// Registration order is dispatch order. Every matching entry fires; there is
/// no first-match short circuit. One-shot entries are dropped after their first
/// match.
#[derive(Debug, Clone)]
pub struct CallbackRegistry<H> {
    entries: Vec<Entry<H>>,
}

impl<H> CallbackRegistry<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a permanent entry.
    pub fn register(&mut self, template: Template, handler: H) {
        self.entries.push(Entry {
            template,
            handler,
            once: false,
            spent: false,
        });
    }

    /// Append an entry that is removed after it first matches.
    pub fn register_once(&mut self, template: Template, handler: H) {
        self.entries.push(Entry {
            template,
            handler,
            once: true,
            spent: false,
        });
    }

    /// True if any entry matches `message`.
    pub fn has_match(&self, message: &Message) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.template.matches(message))
    }

    /// Number of registered entries, one-shots included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of one-shot entries still waiting for a match.
    pub fn pending(&self) -> usize {
        self.entries.iter().filter(|entry| entry.once).count()
    }

    /// Registered handlers in dispatch order.
    pub fn handlers(&self) -> impl Iterator<Item = &H> {
        self.entries.iter().map(|entry| &entry.handler)
    }

    /// Registered templates in dispatch order.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.entries.iter().map(|entry| &entry.template)
    }

    /// Visit every matching handler in registration order.
    ///
    /// Matched one-shot entries are removed once the visit completes. Returns
    /// the number of handlers visited.
    pub fn for_each_match(&mut self, message: &Message, mut visit: impl FnMut(&mut H)) -> usize {
        let mut fired = 0usize;
        let mut spent = false;

        for entry in &mut self.entries {
            if !entry.template.matches(message) {
                continue;
            }
            tracing::trace!(template = ?entry.template, once = entry.once, "template matched");
            visit(&mut entry.handler);
            fired += 1;
            if entry.once {
                entry.spent = true;
                spent = true;
            }
        }

        if spent {
            self.entries.retain(|entry| !entry.spent);
        }
        fired
    }
}

impl<H: Clone> CallbackRegistry<H> {
    /// Clone the matching handlers out in registration order.
    ///
    /// Used by owners whose handlers are tokens interpreted by the owner
    /// itself. Matched one-shot entries are consumed.
    pub fn take_matches(&mut self, message: &Message) -> Vec<H> {
        let mut handlers = Vec::new();
        self.for_each_match(message, |handler| handlers.push(handler.clone()));
        handlers
    }

    /// Clone out the one handler that best answers `message`.
    ///
    /// Only entries whose handler passes `accept` are considered. The most
    /// specific matching template wins and ties go to the earliest
    /// registration, so replies pair with requests in request order. A
    /// matched one-shot entry is removed.
    pub fn take_best(&mut self, message: &Message, accept: impl Fn(&H) -> bool) -> Option<H> {
        let mut best: Option<(usize, usize)> = None;
        for (index, entry) in self.entries.iter().enumerate() {
            if !accept(&entry.handler) || !entry.template.matches(message) {
                continue;
            }
            let specificity = entry.template.specificity();
            if best.is_none_or(|(_, top)| specificity > top) {
                best = Some((index, specificity));
            }
        }

        let (index, _) = best?;
        let handler = self.entries[index].handler.clone();
        if self.entries[index].once {
            self.entries.remove(index);
        }
        Some(handler)
    }
}

impl<H: FnMut(&Message)> CallbackRegistry<H> {
    /// Invoke every handler whose template matches `message`.
    ///
    /// Returns the number of handlers invoked; zero is not an error.
    pub fn dispatch(&mut self, message: &Message) -> usize {
        self.for_each_match(message, |handler| handler(message))
    }
}

impl<H> Default for CallbackRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
