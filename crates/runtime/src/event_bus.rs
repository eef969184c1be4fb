use crate::viewport::ViewportPose;

/// Callback run synchronously on every view change.
pub type ViewChangeCallback = Box<dyn FnMut(&ViewportPose)>;

/// Handle returned by a subscription; pass it back to unsubscribe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// The map side of the overlay contract: a readable pose plus change
/// notifications. Nothing here polls; subscribers are pushed every change.
pub trait ViewSource {
    fn pose(&self) -> ViewportPose;

    fn subscribe_to_view_change(&mut self, callback: ViewChangeCallback) -> SubscriptionId;

    /// Returns `false` if `id` was not (or is no longer) subscribed.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// Ordered list of view-change subscribers.
///
/// Subscribers run in subscription order, each to completion, on the thread
/// calling [`ViewChangeBus::notify`].
#[derive(Default)]
pub struct ViewChangeBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, ViewChangeCallback)>,
    notifications: u64,
}

impl std::fmt::Debug for ViewChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewChangeBus")
            .field("subscribers", &self.subscribers.len())
            .field("notifications", &self.notifications)
            .finish()
    }
}

impl ViewChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, callback: ViewChangeCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribers.push((id, callback));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn notify(&mut self, pose: &ViewportPose) {
        self.notifications += 1;
        for (_, callback) in &mut self.subscribers {
            callback(pose);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of `notify` calls so far.
    pub fn notification_count(&self) -> u64 {
        self.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::ViewChangeBus;
    use crate::viewport::ViewportPose;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn subscribers_see_every_pose_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = ViewChangeBus::new();

        let a = Rc::clone(&seen);
        bus.subscribe(Box::new(move |pose| a.borrow_mut().push(("a", pose.zoom))));
        let b = Rc::clone(&seen);
        bus.subscribe(Box::new(move |pose| b.borrow_mut().push(("b", pose.zoom))));

        let mut pose = ViewportPose::new(100.0, 100.0);
        bus.notify(&pose);
        pose.zoom = 2.0;
        bus.notify(&pose);

        assert_eq!(
            *seen.borrow(),
            vec![("a", 0.0), ("b", 0.0), ("a", 2.0), ("b", 2.0)]
        );
        assert_eq!(bus.notification_count(), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hits = Rc::new(RefCell::new(0u32));
        let mut bus = ViewChangeBus::new();
        let h = Rc::clone(&hits);
        let id = bus.subscribe(Box::new(move |_| *h.borrow_mut() += 1));

        bus.notify(&ViewportPose::default());
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.notify(&ViewportPose::default());

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
