use std::fmt::Debug;
use std::sync::{Arc, Weak};

/// Bound for values attached to a [`QueueElem`](crate::collections::QueueElem) as its enclosing object.
///
/// Elements cross thread boundaries through the queues, so the attached value must be
/// `Debug`, `Send`, `Sync` and `'static`. Ids, labels and owner handles are covered here;
/// other types opt in with an empty impl.
pub trait Element: Debug + Send + Sync + 'static {}

macro_rules! impl_element_for_ids {
  ($($ty:ty),* $(,)?) => {
    $(impl Element for $ty {})*
  };
}

impl_element_for_ids!(u32, usize);

impl Element for char {}

impl Element for String {}

impl<T> Element for Arc<T> where T: Debug + Send + Sync + 'static {}

impl<T> Element for Weak<T> where T: Debug + Send + Sync + 'static {}
