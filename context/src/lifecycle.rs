//! Init and destroy hooks.

use crate::core::Instance;
use crate::descriptor::{Hook, LifecycleState};
use crate::error::{Error, Result};
use crate::processor::PostProcessorChain;
use crate::registry::Registry;
use tracing::debug;

/// Calls the component's init hook on its injection target, then lets the
/// chain's `after_init` pass replace the stored instance.
pub(crate) fn initialize(registry: &mut Registry, chain: &PostProcessorChain, name: &str) -> Result<()> {
  let descriptor = registry.descriptor(name)?;
  let instance = descriptor
    .instance()
    .cloned()
    .ok_or_else(|| Error::invalid(name, "cannot initialize a component that was never constructed"))?;

  if let Some(hook) = descriptor.init_hook().cloned() {
    let target = chain.before_injection(instance.clone(), name);
    invoke(registry, name, &hook, &target)?;
  }

  let processed = chain.after_init(instance.clone(), name);
  if !processed.same(&instance) {
    registry.store(name, processed)?;
  }
  registry.descriptor_mut(name)?.state = LifecycleState::Initialized;
  Ok(())
}

/// Calls the component's destroy hook on its injection target.
pub(crate) fn destroy(registry: &mut Registry, chain: &PostProcessorChain, name: &str) -> Result<()> {
  let descriptor = registry.descriptor(name)?;
  if let (Some(hook), Some(instance)) = (descriptor.destroy_hook().cloned(), descriptor.instance().cloned()) {
    let target = chain.before_injection(instance, name);
    invoke(registry, name, &hook, &target)?;
  }
  registry.descriptor_mut(name)?.state = LifecycleState::Destroyed;
  Ok(())
}

fn invoke(registry: &Registry, name: &str, hook: &Hook, target: &Instance) -> Result<()> {
  let callable = match hook {
    Hook::Direct(callable) => callable.clone(),
    Hook::Named(method) => registry
      .named_method(target.runtime_type(), method)
      .ok_or_else(|| Error::MissingHook {
        name: name.to_owned(),
        hook: method.clone(),
        type_name: target.runtime_type().name(),
      })?,
  };

  debug!(component = name, hook = hook.label(), "invoking lifecycle hook");
  callable(target).map_err(|source| Error::Hook {
    name: name.to_owned(),
    hook: hook.label().to_owned(),
    source,
  })
}
