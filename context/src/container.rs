//! The main `Context` struct and its associated methods.

use crate::assembler::Assembler;
use crate::config::{ConfigResolver, Properties};
use crate::core::{Instance, TypeInfo};
use crate::descriptor::ComponentDescriptor;
use crate::error::{Error, Result};
use crate::lifecycle;
use crate::processor::PostProcessorChain;
use crate::registry::Registry;
use crate::resolver::Resolver;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The Inversion of Control (IoC) context.
///
/// A context is built in one go from a [`Registry`]: every component is
/// constructed, injected and initialized before [`Context::new`] returns. After
/// that the context is a read-only lookup facade until [`Context::close`] runs
/// the destroy hooks and empties it.
pub struct Context {
  registry: Registry,
  chain: PostProcessorChain,
  config: Arc<dyn ConfigResolver>,
  closed: bool,
}

impl Context {
  /// Builds a context, resolving configuration values through `config`.
  ///
  /// Any failure aborts the whole bootstrap and is returned as-is; no destroy
  /// hooks run for a context that never finished starting.
  pub fn new(registry: Registry, config: impl ConfigResolver + 'static) -> Result<Self> {
    Self::with_config(registry, Arc::new(config))
  }

  /// Builds a context that has no configuration values.
  pub fn without_config(registry: Registry) -> Result<Self> {
    Self::new(registry, Properties::new())
  }

  pub fn with_config(mut registry: Registry, config: Arc<dyn ConfigResolver>) -> Result<Self> {
    info!(components = registry.len(), "starting context");
    let mut chain = PostProcessorChain::new();

    {
      let mut assembler = Assembler::new(&mut registry, &mut chain, config.as_ref());
      assembler.construct_all()?;
      assembler.inject_all()?;
    }
    for name in registry.sorted_names(|_| true) {
      lifecycle::initialize(&mut registry, &chain, &name)?;
    }

    info!(
      components = registry.len(),
      post_processors = chain.len(),
      "context started"
    );
    Ok(Self {
      registry,
      chain,
      config,
      closed: false,
    })
  }

  // --- PUBLIC API: Lookup ---

  pub fn contains_bean(&self, name: &str) -> bool {
    self.registry.contains(name)
  }

  /// Returns the stored instance of the component named `name`.
  pub fn get_bean(&self, name: &str) -> Result<Instance> {
    self
      .registry
      .get(name)
      .and_then(|d| d.instance().cloned())
      .ok_or_else(|| Error::NoSuchName(name.to_owned()))
  }

  /// Returns the unique (or primary) component of type `T`.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let descriptor = self.resolver().unique(TypeInfo::of::<T>())?;
    typed(descriptor)
  }

  /// Returns the component named `name`, viewed as `T`.
  pub fn get_named<T: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let descriptor = self
      .resolver()
      .by_name(name, TypeInfo::of::<T>())?
      .ok_or_else(|| Error::NoSuchName(name.to_owned()))?;
    typed(descriptor)
  }

  /// Returns every component assignable to `T`, sorted by (order, name).
  ///
  /// Fails with [`Error::TypeMismatch`] if a candidate's stored instance cannot
  /// be viewed as `T`.
  pub fn get_all<T: ?Sized + Any + Send + Sync>(&self) -> Result<Vec<Arc<T>>> {
    self
      .resolver()
      .candidates(TypeInfo::of::<T>())
      .into_iter()
      .map(typed::<T>)
      .collect()
  }

  pub fn descriptor(&self, name: &str) -> Option<&ComponentDescriptor> {
    self.registry.get(name)
  }

  pub fn descriptors_of<T: ?Sized + Any>(&self) -> Vec<&ComponentDescriptor> {
    self.resolver().candidates(TypeInfo::of::<T>())
  }

  /// The object injection and lifecycle hooks would see for `name`: the stored
  /// instance after the chain's `before_injection` pass. Computed on each call.
  pub fn injection_target(&self, name: &str) -> Result<Instance> {
    let instance = self.get_bean(name)?;
    Ok(self.chain.before_injection(instance, name))
  }

  pub fn post_processors(&self) -> &PostProcessorChain {
    &self.chain
  }

  pub fn resolver(&self) -> Resolver<'_> {
    Resolver::new(&self.registry)
  }

  /// Returns the instance of `name`, constructing it first if it has none.
  ///
  /// After a successful bootstrap every component already has an instance, so
  /// this only ever returns the stored one.
  pub fn create_as_singleton(&mut self, name: &str) -> Result<Instance> {
    let config = self.config.clone();
    Assembler::new(&mut self.registry, &mut self.chain, config.as_ref()).create_as_singleton(name)
  }

  // --- PUBLIC API: Shutdown ---

  /// Runs every destroy hook in (order, name) order, then empties the context.
  ///
  /// A failing hook stops the remaining hooks; the context is emptied anyway
  /// and the error is returned. Closing twice is a no-op.
  pub fn close(&mut self) -> Result<()> {
    if self.closed {
      return Ok(());
    }
    self.closed = true;
    info!("closing context");

    let mut outcome = Ok(());
    for name in self.registry.sorted_names(|_| true) {
      if let Err(e) = lifecycle::destroy(&mut self.registry, &self.chain, &name) {
        outcome = Err(e);
        break;
      }
    }

    self.registry.clear();
    self.chain.clear();
    debug!("context closed");
    outcome
  }

  pub fn is_closed(&self) -> bool {
    self.closed
  }
}

impl Drop for Context {
  fn drop(&mut self) {
    if let Err(e) = self.close() {
      warn!(error = %e, "error while closing context");
    }
  }
}

fn typed<T: ?Sized + Any + Send + Sync>(descriptor: &ComponentDescriptor) -> Result<Arc<T>> {
  let ty = TypeInfo::of::<T>();
  let instance = descriptor
    .instance()
    .ok_or_else(|| Error::NoSuchName(descriptor.name().to_owned()))?;
  descriptor
    .view_as(instance, ty)
    .and_then(|view| view.downcast::<T>())
    .ok_or_else(|| Error::TypeMismatch {
      name: descriptor.name().to_owned(),
      expected: ty.name(),
      actual: instance.runtime_type().name(),
    })
}
