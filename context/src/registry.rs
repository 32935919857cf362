use crate::core::{Instance, TypeInfo};
use crate::descriptor::{Callable, ComponentDescriptor, Creation, Source};
use crate::error::{BoxError, Error, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The set of component descriptors a [`Context`](crate::Context) is built from,
/// plus the named lifecycle methods available to [`Hook::Named`](crate::Hook::Named).
#[derive(Default)]
pub struct Registry {
  descriptors: HashMap<String, ComponentDescriptor>,
  methods: HashMap<(TypeId, String), Callable>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a descriptor after checking it is well-formed.
  ///
  /// Fails with [`Error::DuplicateName`] if the name is taken, with
  /// [`Error::InvalidDescriptor`] for malformed dependency requests, and with
  /// [`Error::InvalidInjectionTarget`] for injection points that cannot be
  /// written to.
  pub fn register(&mut self, descriptor: ComponentDescriptor) -> Result<&mut Self> {
    let name = descriptor.name().to_owned();
    if self.descriptors.contains_key(&name) {
      return Err(Error::DuplicateName(name));
    }

    for request in descriptor.creation().params() {
      request.validate(&name)?;
    }
    if descriptor.is_configuration() {
      let references = descriptor
        .creation()
        .params()
        .iter()
        .any(|p| matches!(p.source(), Some(Source::Reference(_))));
      if references {
        return Err(Error::invalid(
          &name,
          "a configuration factory may only depend on configuration values",
        ));
      }
    }
    if let Creation::Factory { owner, .. } = descriptor.creation() {
      if owner.is_empty() {
        return Err(Error::invalid(&name, "factory owner name is empty"));
      }
    }
    for point in descriptor.injection_points() {
      point.validate(&descriptor)?;
    }

    debug!(component = %name, "registered {}", descriptor);
    self.descriptors.insert(name, descriptor);
    Ok(self)
  }

  /// Registers `f` as the method `name` of type `R`, for use as a named hook.
  pub fn method<R, F>(&mut self, name: &str, f: F) -> &mut Self
  where
    R: ?Sized + Any + Send + Sync,
    F: Fn(&R) -> Result<(), BoxError> + Send + Sync + 'static,
  {
    let callable: Callable = Arc::new(move |instance: &Instance| -> Result<(), BoxError> {
      let target = instance
        .downcast::<R>()
        .ok_or_else(|| format!("instance {} is not a {}", instance.runtime_type(), std::any::type_name::<R>()))?;
      f(&*target)
    });
    self.methods.insert((TypeId::of::<R>(), name.to_owned()), callable);
    self
  }

  pub(crate) fn named_method(&self, ty: TypeInfo, name: &str) -> Option<Callable> {
    self.methods.get(&(ty.id(), name.to_owned())).cloned()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.descriptors.contains_key(name)
  }

  pub fn get(&self, name: &str) -> Option<&ComponentDescriptor> {
    self.descriptors.get(name)
  }

  pub fn len(&self) -> usize {
    self.descriptors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.descriptors.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
    self.descriptors.values()
  }

  /// Descriptors matching `filter`, in ascending (order, name).
  pub fn sorted<F>(&self, filter: F) -> Vec<&ComponentDescriptor>
  where
    F: Fn(&ComponentDescriptor) -> bool,
  {
    let mut matching: Vec<_> = self.descriptors.values().filter(|d| filter(d)).collect();
    matching.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    matching
  }

  pub(crate) fn sorted_names<F>(&self, filter: F) -> Vec<String>
  where
    F: Fn(&ComponentDescriptor) -> bool,
  {
    self
      .sorted(filter)
      .into_iter()
      .map(|d| d.name().to_owned())
      .collect()
  }

  pub(crate) fn descriptor(&self, name: &str) -> Result<&ComponentDescriptor> {
    self
      .descriptors
      .get(name)
      .ok_or_else(|| Error::NoSuchName(name.to_owned()))
  }

  pub(crate) fn descriptor_mut(&mut self, name: &str) -> Result<&mut ComponentDescriptor> {
    self
      .descriptors
      .get_mut(name)
      .ok_or_else(|| Error::NoSuchName(name.to_owned()))
  }

  /// Stores `instance` as the component's instance, rejecting one that is not
  /// assignable to the declared type.
  pub(crate) fn store(&mut self, name: &str, instance: Instance) -> Result<()> {
    let descriptor = self.descriptor_mut(name)?;
    if !descriptor.accepts(&instance) {
      return Err(Error::TypeMismatch {
        name: name.to_owned(),
        expected: descriptor.declared_type().name(),
        actual: instance.runtime_type().name(),
      });
    }
    descriptor.instance = Some(instance);
    Ok(())
  }

  pub(crate) fn clear(&mut self) {
    self.descriptors.clear();
    self.methods.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::descriptor::{DependencyRequest, InjectionPoint, MemberKind};
  use std::sync::Mutex;

  #[derive(Default)]
  struct Holder {
    version: Mutex<Option<Arc<String>>>,
  }

  fn holder(name: &str) -> crate::descriptor::DescriptorBuilder<Holder> {
    ComponentDescriptor::builder::<Holder>(name).constructor(vec![], |_| Ok(Holder::default()))
  }

  fn version_point() -> InjectionPoint {
    InjectionPoint::component::<Holder, String, _>("version", |h, v| {
      *h.version.lock().unwrap() = Some(v);
    })
  }

  #[test]
  fn duplicate_names_are_rejected() {
    let mut registry = Registry::new();
    registry.register(holder("a").build().unwrap()).unwrap();

    let err = registry.register(holder("a").build().unwrap()).err().unwrap();
    assert!(matches!(err, Error::DuplicateName(name) if name == "a"));
    assert_eq!(registry.len(), 1);
  }

  #[test]
  fn configuration_factories_cannot_reference_components() {
    let descriptor = ComponentDescriptor::builder::<Holder>("config")
      .configuration()
      .constructor(vec![DependencyRequest::component::<String>()], |_| Ok(Holder::default()))
      .build()
      .unwrap();

    let err = Registry::new().register(descriptor).err().unwrap();
    assert!(matches!(err, Error::InvalidDescriptor { name, .. } if name == "config"));
  }

  #[test]
  fn malformed_constructor_parameter_is_rejected() {
    let descriptor = ComponentDescriptor::builder::<Holder>("h")
      .constructor(vec![DependencyRequest::unsourced::<String>()], |_| Ok(Holder::default()))
      .build()
      .unwrap();

    assert!(matches!(
      Registry::new().register(descriptor),
      Err(Error::InvalidDescriptor { .. })
    ));
  }

  #[test]
  fn unusable_injection_points_are_rejected() {
    let cases = vec![
      version_point().immutable(),
      version_point().static_member(),
      version_point().with_kind(MemberKind::Setter { arity: 2 }),
      InjectionPoint::component::<String, String, _>("elsewhere", |_, _| {}),
    ];

    for point in cases {
      let member = point.member().to_owned();
      let descriptor = holder("h").inject(point).build().unwrap();
      match Registry::new().register(descriptor) {
        Err(Error::InvalidInjectionTarget { name, member: m, .. }) => {
          assert_eq!(name, "h");
          assert_eq!(m, member);
        }
        other => panic!("expected an invalid injection target, got {:?}", other.map(|_| ())),
      }
    }
  }

  #[test]
  fn sorted_orders_by_order_then_name() {
    let mut registry = Registry::new();
    registry
      .register(holder("b").order(10).build().unwrap())
      .unwrap()
      .register(holder("a").order(10).build().unwrap())
      .unwrap()
      .register(holder("c").order(5).build().unwrap())
      .unwrap();

    assert_eq!(registry.sorted_names(|_| true), vec!["c", "a", "b"]);
  }

  #[test]
  fn clear_releases_descriptors_and_methods() {
    let mut registry = Registry::new();
    registry
      .method::<Holder, _>("reset", |_| Ok(()))
      .register(holder("h").build().unwrap())
      .unwrap();
    assert!(registry.named_method(TypeInfo::of::<Holder>(), "reset").is_some());

    registry.clear();

    assert!(registry.is_empty());
    assert!(registry.named_method(TypeInfo::of::<Holder>(), "reset").is_none());
  }

  #[test]
  fn store_rejects_foreign_instances() {
    let mut registry = Registry::new();
    registry.register(holder("h").build().unwrap()).unwrap();

    assert!(registry.store("h", Instance::new(Holder::default())).is_ok());
    assert!(matches!(
      registry.store("h", Instance::new(42u8)),
      Err(Error::TypeMismatch { .. })
    ));
  }
}
