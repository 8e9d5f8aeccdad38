#![forbid(unsafe_code)]

//! Subscription identity.
//!
//! A [`HandlerKey`] names one logical subscription: which object listens,
//! with which handler, optionally restricted to one sender. Keys are plain
//! data supplied by the caller, so two registrations made from different
//! closures still compare equal when they describe the same subscription.

use std::fmt;

/// Identity of a listening object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub u64);

/// Identity of an object that fires events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SenderId(pub u64);

/// Structural key of one logical subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerKey {
    pub subscriber: SubscriberId,
    /// Stable name of the handler, e.g. `"ProjectView::on_changed"`.
    pub handler: &'static str,
    pub sender: Option<SenderId>,
}

impl HandlerKey {
    #[must_use]
    pub const fn new(subscriber: SubscriberId, handler: &'static str) -> Self {
        Self {
            subscriber,
            handler,
            sender: None,
        }
    }

    /// Restrict the subscription to events coming from `sender`.
    #[must_use]
    pub const fn with_sender(mut self, sender: SenderId) -> Self {
        self.sender = Some(sender);
        self
    }
}

impl fmt::Display for HandlerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (subscriber {})", self.handler, self.subscriber.0)?;
        if let Some(sender) = self.sender {
            write!(f, " from sender {}", sender.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ahash::AHashSet;

    #[test]
    fn sender_is_part_of_identity() {
        let plain = HandlerKey::new(SubscriberId(1), "View::refresh");
        let scoped = plain.with_sender(SenderId(9));
        assert_ne!(plain, scoped);

        let set: AHashSet<_> = [plain, scoped, HandlerKey::new(SubscriberId(1), "View::refresh")]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_names_all_parts() {
        let key = HandlerKey::new(SubscriberId(4), "List::on_drop").with_sender(SenderId(2));
        assert_eq!(key.to_string(), "List::on_drop (subscriber 4) from sender 2");
        assert_eq!(
            HandlerKey::new(SubscriberId(4), "List::on_drop").to_string(),
            "List::on_drop (subscriber 4)"
        );
    }
}
