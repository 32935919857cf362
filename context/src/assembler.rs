//! Bootstrap-time construction of the singleton graph.

use crate::config::{ConfigError, ConfigResolver, ValueType};
use crate::core::{InProgress, Instance, TypeInfo};
use crate::descriptor::{Args, Argument, Creation, DependencyRequest, LifecycleState, Source};
use crate::error::{Error, Result};
use crate::processor::{PostProcessor, PostProcessorChain};
use crate::registry::Registry;
use crate::resolver::Resolver;
use tracing::debug;

/// Builds component instances on demand, resolving constructor dependencies
/// recursively. One assembler is used per bootstrap run.
pub(crate) struct Assembler<'a> {
  pub(crate) registry: &'a mut Registry,
  pub(crate) chain: &'a mut PostProcessorChain,
  config: &'a dyn ConfigResolver,
  in_progress: InProgress,
}

impl<'a> Assembler<'a> {
  pub(crate) fn new(
    registry: &'a mut Registry,
    chain: &'a mut PostProcessorChain,
    config: &'a dyn ConfigResolver,
  ) -> Self {
    Self {
      registry,
      chain,
      config,
      in_progress: InProgress::default(),
    }
  }

  /// Creates every component: configuration factories first, then
  /// post-processors (joining the chain as they are created), then the rest.
  pub(crate) fn construct_all(&mut self) -> Result<()> {
    for name in self.registry.sorted_names(|d| d.is_configuration()) {
      self.create_as_singleton(&name)?;
    }

    let processor_type = TypeInfo::of::<dyn PostProcessor>();
    for name in self.registry.sorted_names(|d| d.is_assignable_to(processor_type)) {
      let instance = self.create_as_singleton(&name)?;
      let processor = self
        .registry
        .descriptor(&name)?
        .view_as(&instance, processor_type)
        .and_then(|view| view.downcast::<dyn PostProcessor>())
        .ok_or_else(|| Error::TypeMismatch {
          name: name.clone(),
          expected: processor_type.name(),
          actual: instance.runtime_type().name(),
        })?;
      self.chain.push(&name, processor);
    }

    for name in self.registry.sorted_names(|d| d.instance().is_none()) {
      self.create_as_singleton(&name)?;
    }
    Ok(())
  }

  /// Returns the component's instance, constructing it (and, recursively, its
  /// constructor dependencies) if needed.
  pub(crate) fn create_as_singleton(&mut self, name: &str) -> Result<Instance> {
    let descriptor = self.registry.descriptor(name)?;
    if let Some(instance) = descriptor.instance() {
      return Ok(instance.clone());
    }
    let creation = descriptor.creation().clone();
    let declared = descriptor.declared_type();

    debug!(component = name, "creating component as early singleton");
    self.in_progress.enter(name)?;

    let args = self.resolve_arguments(name, creation.params())?;
    let produced = match &creation {
      Creation::Direct { constructor, .. } => constructor(&args),
      Creation::Factory { owner, operation, .. } => {
        if !self.registry.contains(owner) {
          return Err(Error::invalid(
            name,
            format!("factory owner '{}' is not registered", owner),
          ));
        }
        let owner = self.create_as_singleton(owner)?;
        operation(&owner, &args)
      }
    }
    .map_err(|source| Error::Creation {
      name: name.to_owned(),
      type_name: declared.name(),
      source,
    })?;

    self.registry.store(name, produced.clone())?;
    let processed = self.chain.after_construction(produced.clone(), name);
    if !processed.same(&produced) {
      self.registry.store(name, processed.clone())?;
    }
    self.registry.descriptor_mut(name)?.state = LifecycleState::Constructed;

    debug!(component = name, "component constructed as {}", processed.runtime_type());
    Ok(processed)
  }

  fn resolve_arguments(&mut self, name: &str, params: &[DependencyRequest]) -> Result<Args> {
    let mut items = Vec::with_capacity(params.len());
    for param in params {
      items.push(self.resolve_argument(name, param)?);
    }
    Ok(Args::new(name, items))
  }

  /// Resolves one dependency of the component `owner`.
  ///
  /// Component references are constructed if needed and viewed as the
  /// requested type. Unresolvable optional requests yield [`Argument::Absent`].
  pub(crate) fn resolve_argument(&mut self, owner: &str, request: &DependencyRequest) -> Result<Argument> {
    let target = request.target();
    match request.source() {
      None => Err(Error::invalid(
        owner,
        format!("malformed dependency request for type '{}'", target),
      )),

      Some(Source::Config(key)) => {
        let ty = ValueType::of_type(target.id())
          .ok_or(ConfigError::Unsupported(target.name()))
          .map_err(|e| Error::from_config(owner, e))?;
        let value = if request.is_required() {
          Some(
            self
              .config
              .get_required_value(key, ty)
              .map_err(|e| Error::from_config(owner, e))?,
          )
        } else {
          self
            .config
            .get_value(key, ty)
            .map_err(|e| Error::from_config(owner, e))?
        };
        Ok(value.map_or(Argument::Absent, Argument::Value))
      }

      Some(Source::Reference(named)) => {
        let resolver = Resolver::new(&*self.registry);
        let found = match named {
          Some(dependency) => resolver.by_name(dependency, target)?,
          None => resolver.by_type(target)?,
        }
        .map(|d| d.name().to_owned());

        let dependency = match found {
          Some(dependency) => dependency,
          None if request.is_required() => {
            return Err(Error::UnsatisfiedDependency {
              name: owner.to_owned(),
              type_name: target.name(),
              requested: named.map(str::to_owned),
            })
          }
          None => return Ok(Argument::Absent),
        };

        let instance = self.create_as_singleton(&dependency)?;
        self
          .registry
          .descriptor(&dependency)?
          .view_as(&instance, target)
          .map(Argument::Component)
          .ok_or_else(|| Error::TypeMismatch {
            name: dependency.clone(),
            expected: target.name(),
            actual: instance.runtime_type().name(),
          })
      }
    }
  }
}
