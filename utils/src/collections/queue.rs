mod blocking_queue;
mod blocking_queue_config;
mod intrusive_queue;
mod queue_elem;
mod queue_error;
mod queue_iter;

pub use self::{
  blocking_queue::*, blocking_queue_config::*, intrusive_queue::*, queue_elem::*, queue_error::*, queue_iter::*,
};
