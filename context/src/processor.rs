//! Post-processors: user components that can observe or replace other
//! components at fixed points of their lifecycle.

use crate::core::Instance;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A hook run on every component as it moves through its lifecycle.
///
/// Each method receives the current instance and may return it unchanged or a
/// replacement. A replacement must still be assignable to the component's
/// declared type.
///
/// A component becomes a post-processor by providing `dyn PostProcessor`:
///
/// ```
/// use fibre_context::{ComponentDescriptor, Instance, PostProcessor};
/// use std::sync::Arc;
///
/// struct Tracer;
///
/// impl PostProcessor for Tracer {
///   fn after_construction(&self, instance: Instance, name: &str) -> Instance {
///     println!("constructed {}", name);
///     instance
///   }
/// }
///
/// let descriptor = ComponentDescriptor::builder::<Tracer>("tracer")
///   .constructor(vec![], |_| Ok(Tracer))
///   .provides::<dyn PostProcessor, _>(|t| t as Arc<dyn PostProcessor>)
///   .build()
///   .unwrap();
/// # let _ = descriptor;
/// ```
pub trait PostProcessor: Send + Sync {
  /// Runs once, right after the instance is created. The result becomes the
  /// stored instance.
  fn after_construction(&self, instance: Instance, _name: &str) -> Instance {
    instance
  }

  /// Picks the object that receives injection and lifecycle hooks. The result
  /// is transient and never stored.
  fn before_injection(&self, instance: Instance, _name: &str) -> Instance {
    instance
  }

  /// Runs once, after the init hook. The result becomes the stored instance.
  fn after_init(&self, instance: Instance, _name: &str) -> Instance {
    instance
  }
}

/// Post-processors in registration order, each under its component name.
#[derive(Clone, Default)]
pub struct PostProcessorChain {
  processors: Vec<(String, Arc<dyn PostProcessor>)>,
}

impl PostProcessorChain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, name: &str, processor: Arc<dyn PostProcessor>) {
    debug!(processor = name, position = self.processors.len(), "post-processor registered");
    self.processors.push((name.to_owned(), processor));
  }

  pub fn len(&self) -> usize {
    self.processors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.processors.is_empty()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.processors.iter().map(|(name, _)| name.as_str())
  }

  /// Threads `instance` through every processor, first to last.
  pub fn after_construction(&self, instance: Instance, name: &str) -> Instance {
    self.processors.iter().fold(instance, |current, (processor_name, p)| {
      let next = p.after_construction(current.clone(), name);
      log_substitution("after_construction", processor_name, name, &current, &next);
      next
    })
  }

  /// Threads `instance` through every processor, last to first.
  pub fn before_injection(&self, instance: Instance, name: &str) -> Instance {
    self.processors.iter().rev().fold(instance, |current, (processor_name, p)| {
      let next = p.before_injection(current.clone(), name);
      log_substitution("before_injection", processor_name, name, &current, &next);
      next
    })
  }

  /// Threads `instance` through every processor, first to last.
  pub fn after_init(&self, instance: Instance, name: &str) -> Instance {
    self.processors.iter().fold(instance, |current, (processor_name, p)| {
      let next = p.after_init(current.clone(), name);
      log_substitution("after_init", processor_name, name, &current, &next);
      next
    })
  }

  pub(crate) fn clear(&mut self) {
    self.processors.clear();
  }
}

impl fmt::Debug for PostProcessorChain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.names()).finish()
  }
}

fn log_substitution(hook: &str, processor: &str, component: &str, from: &Instance, to: &Instance) {
  if !from.same(to) {
    debug!(
      hook,
      processor,
      component,
      "instance replaced: {} -> {}",
      from.runtime_type(),
      to.runtime_type()
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  struct Recorder {
    label: &'static str,
    calls: Arc<Mutex<Vec<String>>>,
  }

  impl PostProcessor for Recorder {
    fn after_construction(&self, instance: Instance, name: &str) -> Instance {
      self.calls.lock().unwrap().push(format!("{}:construct:{}", self.label, name));
      instance
    }

    fn before_injection(&self, instance: Instance, name: &str) -> Instance {
      self.calls.lock().unwrap().push(format!("{}:inject:{}", self.label, name));
      instance
    }
  }

  struct Wrap;

  impl PostProcessor for Wrap {
    fn after_init(&self, instance: Instance, _name: &str) -> Instance {
      match instance.downcast::<String>() {
        Some(s) => Instance::new(format!("[{}]", s)),
        None => instance,
      }
    }
  }

  #[test]
  fn before_injection_runs_in_reverse() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut chain = PostProcessorChain::new();
    chain.push("p1", Arc::new(Recorder { label: "p1", calls: calls.clone() }));
    chain.push("p2", Arc::new(Recorder { label: "p2", calls: calls.clone() }));

    let instance = Instance::new(1u32);
    let constructed = chain.after_construction(instance.clone(), "x");
    let target = chain.before_injection(constructed.clone(), "x");

    assert!(constructed.same(&instance));
    assert!(target.same(&instance));
    assert_eq!(
      *calls.lock().unwrap(),
      vec!["p1:construct:x", "p2:construct:x", "p2:inject:x", "p1:inject:x"]
    );
  }

  #[test]
  fn replacements_are_threaded_through_the_chain() {
    let mut chain = PostProcessorChain::new();
    chain.push("w1", Arc::new(Wrap));
    chain.push("w2", Arc::new(Wrap));

    let result = chain.after_init(Instance::new(String::from("v")), "x");
    assert_eq!(*result.downcast::<String>().unwrap(), "[[v]]");
    assert_eq!(chain.names().collect::<Vec<_>>(), vec!["w1", "w2"]);
  }
}
