use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Point-in-time network reachability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
  Online,
  Offline,
}

impl Reachability {
  pub fn is_online(self) -> bool {
    self == Reachability::Online
  }
}

/// Source of reachability snapshots, consulted before every remote call.
pub trait ConnectivityProbe: Send + Sync {
  fn snapshot(&self) -> Reachability;
}

/// Probe whose state is set by whoever observes the network (a platform
/// callback, a CLI flag). Cloning shares the underlying flag.
#[derive(Debug, Clone)]
pub struct ManualProbe {
  online: Arc<AtomicBool>,
}

impl ManualProbe {
  pub fn new(online: bool) -> Self {
    Self {
      online: Arc::new(AtomicBool::new(online)),
    }
  }

  pub fn online() -> Self {
    Self::new(true)
  }

  pub fn offline() -> Self {
    Self::new(false)
  }

  pub fn set_online(&self, online: bool) {
    self.online.store(online, Ordering::SeqCst);
  }
}

impl ConnectivityProbe for ManualProbe {
  fn snapshot(&self) -> Reachability {
    if self.online.load(Ordering::SeqCst) {
      Reachability::Online
    } else {
      Reachability::Offline
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_clones_share_state() {
    let probe = ManualProbe::online();
    let observer = probe.clone();
    assert!(observer.snapshot().is_online());

    probe.set_online(false);
    assert_eq!(observer.snapshot(), Reachability::Offline);
  }
}
