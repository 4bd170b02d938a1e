
/// How many blocked consumers an enqueue wakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WakePolicy {
  /// Wake at most one waiter per enqueue.
  #[default]
  NotifyOne,
  /// Wake every waiter; each re-checks the queue and all but one go back to sleep.
  NotifyAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockingQueueConfig {
  pub name: String,
  pub wake_policy: WakePolicy,
}

impl Default for BlockingQueueConfig {
  fn default() -> Self {
    BlockingQueueConfig {
      name: "blocking-queue".to_string(),
      wake_policy: WakePolicy::NotifyOne,
    }
  }
}

impl BlockingQueueConfig {
  pub fn from(options: impl IntoIterator<Item = BlockingQueueConfigOption>) -> BlockingQueueConfig {
    let mut config = BlockingQueueConfig::default();
    for option in options {
      option.apply(&mut config);
    }
    config
  }
}

#[derive(Debug, Clone)]
pub enum BlockingQueueConfigOption {
  SetName(String),
  SetWakePolicy(WakePolicy),
}

impl BlockingQueueConfigOption {
  pub(crate) fn apply(&self, config: &mut BlockingQueueConfig) {
    match self {
      BlockingQueueConfigOption::SetName(name) => {
        config.name = name.clone();
      }
      BlockingQueueConfigOption::SetWakePolicy(policy) => {
        config.wake_policy = *policy;
      }
    }
  }

  pub fn with_name(name: impl Into<String>) -> BlockingQueueConfigOption {
    BlockingQueueConfigOption::SetName(name.into())
  }

  pub fn with_wake_policy(policy: WakePolicy) -> BlockingQueueConfigOption {
    BlockingQueueConfigOption::SetWakePolicy(policy)
  }
}
