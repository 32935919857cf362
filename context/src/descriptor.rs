//! Component descriptors: the plain-data description of how to build, wire
//! and run one component.

use crate::config::{ConfigType, ConfigValue, ValueType};
use crate::core::{Instance, TypeInfo};
use crate::error::{BoxError, Error, Result};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub type Constructor = Arc<dyn Fn(&Args) -> Result<Instance, BoxError> + Send + Sync>;
pub type FactoryOperation = Arc<dyn Fn(&Instance, &Args) -> Result<Instance, BoxError> + Send + Sync>;
pub type Assign = Arc<dyn Fn(&Instance, Argument) -> Result<(), BoxError> + Send + Sync>;
pub type Callable = Arc<dyn Fn(&Instance) -> Result<(), BoxError> + Send + Sync>;

type Cast = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;
type Accepts = Arc<dyn Fn(&Instance) -> bool + Send + Sync>;

/// Lifecycle of a single descriptor inside a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
  Unregistered,
  Constructed,
  Injected,
  Initialized,
  Destroyed,
}

// --- Dependency requests ---

/// A reference to another component, by type or by explicit name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
  pub name: Option<String>,
}

/// Where a well-formed request gets its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source<'a> {
  Config(&'a str),
  Reference(Option<&'a str>),
}

/// A single parameter or injection-point dependency.
///
/// Exactly one of a configuration key or a component reference must be set;
/// anything else is rejected when the owning descriptor is registered.
#[derive(Debug, Clone)]
pub struct DependencyRequest {
  target: TypeInfo,
  config_key: Option<String>,
  reference: Option<Reference>,
  required: bool,
}

impl DependencyRequest {
  /// A request with no source yet. Add one with [`with_config_key`](Self::with_config_key)
  /// or [`with_reference`](Self::with_reference).
  pub fn unsourced<T: ?Sized + Any>() -> Self {
    Self {
      target: TypeInfo::of::<T>(),
      config_key: None,
      reference: None,
      required: true,
    }
  }

  /// A configuration value, e.g. `DependencyRequest::value::<String>("${app.title}")`.
  pub fn value<V: ConfigType>(key: &str) -> Self {
    Self::unsourced::<V>().with_config_key(key)
  }

  /// The unique (or primary) component of type `T`.
  pub fn component<T: ?Sized + Any>() -> Self {
    Self::unsourced::<T>().with_reference(None)
  }

  /// The component named `name`, which must be viewable as `T`.
  pub fn named<T: ?Sized + Any>(name: &str) -> Self {
    Self::unsourced::<T>().with_reference(Some(name))
  }

  pub fn with_config_key(mut self, key: &str) -> Self {
    self.config_key = Some(key.to_owned());
    self
  }

  pub fn with_reference(mut self, name: Option<&str>) -> Self {
    self.reference = Some(Reference {
      name: name.map(str::to_owned),
    });
    self
  }

  pub fn optional(mut self) -> Self {
    self.required = false;
    self
  }

  pub fn target(&self) -> TypeInfo {
    self.target
  }

  pub fn is_required(&self) -> bool {
    self.required
  }

  pub fn config_key(&self) -> Option<&str> {
    self.config_key.as_deref()
  }

  pub fn reference(&self) -> Option<&Reference> {
    self.reference.as_ref()
  }

  /// The request's source, or `None` if it is malformed.
  pub fn source(&self) -> Option<Source<'_>> {
    match (&self.config_key, &self.reference) {
      (Some(key), None) => Some(Source::Config(key)),
      (None, Some(reference)) => Some(Source::Reference(reference.name.as_deref())),
      _ => None,
    }
  }

  pub(crate) fn validate(&self, owner: &str) -> Result<()> {
    match (&self.config_key, &self.reference) {
      (Some(_), Some(_)) => Err(Error::invalid(
        owner,
        format!(
          "dependency of type '{}' specifies both a configuration key and a component reference",
          self.target
        ),
      )),
      (None, None) => Err(Error::invalid(
        owner,
        format!(
          "dependency of type '{}' must specify a configuration key or a component reference",
          self.target
        ),
      )),
      (Some(key), None) if ValueType::of_type(self.target.id()).is_none() => Err(Error::invalid(
        owner,
        format!(
          "configuration '{}' cannot be converted to unsupported type '{}'",
          key, self.target
        ),
      )),
      _ => Ok(()),
    }
  }
}

// --- Resolved arguments ---

/// A resolved dependency value.
#[derive(Debug, Clone)]
pub enum Argument {
  Value(ConfigValue),
  Component(Instance),
  /// An optional dependency that could not be resolved.
  Absent,
}

/// The resolved arguments handed to a constructor or factory operation, in
/// the declared parameter order.
#[derive(Debug, Clone)]
pub struct Args {
  component: String,
  items: Vec<Argument>,
}

impl Args {
  pub(crate) fn new(component: &str, items: Vec<Argument>) -> Self {
    Self {
      component: component.to_owned(),
      items,
    }
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&Argument> {
    self.items.get(index)
  }

  /// A required configuration value.
  pub fn value<V: ConfigType>(&self, index: usize) -> Result<V> {
    self
      .optional_value(index)?
      .ok_or_else(|| self.bad(index, "configuration value is absent"))
  }

  pub fn optional_value<V: ConfigType>(&self, index: usize) -> Result<Option<V>> {
    match self.items.get(index) {
      Some(Argument::Value(value)) => V::from_config(value.clone()).map(Some).ok_or_else(|| {
        self.bad(
          index,
          format!("expected {}, found {}", V::VALUE_TYPE, value.value_type()),
        )
      }),
      Some(Argument::Absent) => Ok(None),
      Some(Argument::Component(_)) => Err(self.bad(index, "expected a configuration value")),
      None => Err(self.bad(index, "index out of range")),
    }
  }

  /// A required component dependency.
  pub fn component<T: ?Sized + Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
    self
      .optional_component(index)?
      .ok_or_else(|| self.bad(index, "component is absent"))
  }

  pub fn optional_component<T: ?Sized + Any + Send + Sync>(
    &self,
    index: usize,
  ) -> Result<Option<Arc<T>>> {
    match self.items.get(index) {
      Some(Argument::Component(instance)) => instance.downcast::<T>().map(Some).ok_or_else(|| {
        self.bad(
          index,
          format!(
            "expected {}, found {}",
            std::any::type_name::<T>(),
            instance.declared_type()
          ),
        )
      }),
      Some(Argument::Absent) => Ok(None),
      Some(Argument::Value(_)) => Err(self.bad(index, "expected a component")),
      None => Err(self.bad(index, "index out of range")),
    }
  }

  fn bad(&self, index: usize, reason: impl Into<String>) -> Error {
    Error::Argument {
      name: self.component.clone(),
      index,
      reason: reason.into(),
    }
  }
}

// --- Creation mechanisms ---

/// How a descriptor's instance is produced.
#[derive(Clone)]
pub enum Creation {
  Direct {
    params: Vec<DependencyRequest>,
    constructor: Constructor,
  },
  /// Invokes `operation` on the instance of the component named `owner`.
  Factory {
    owner: String,
    params: Vec<DependencyRequest>,
    operation: FactoryOperation,
  },
}

impl Creation {
  pub fn params(&self) -> &[DependencyRequest] {
    match self {
      Creation::Direct { params, .. } | Creation::Factory { params, .. } => params,
    }
  }

  pub fn factory_owner(&self) -> Option<&str> {
    match self {
      Creation::Direct { .. } => None,
      Creation::Factory { owner, .. } => Some(owner),
    }
  }
}

impl fmt::Debug for Creation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Creation::Direct { params, .. } => f.debug_struct("Direct").field("params", params).finish(),
      Creation::Factory { owner, params, .. } => f
        .debug_struct("Factory")
        .field("owner", owner)
        .field("params", params)
        .finish(),
    }
  }
}

// --- Lifecycle hooks ---

/// An init or destroy hook.
#[derive(Clone)]
pub enum Hook {
  Direct(Callable),
  /// A method looked up by name on the instance's runtime type, see
  /// [`Registry::method`](crate::Registry::method).
  Named(String),
}

impl Hook {
  pub fn call<T, F>(f: F) -> Self
  where
    T: ?Sized + Any + Send + Sync,
    F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
  {
    Hook::Direct(Arc::new(move |instance: &Instance| -> Result<(), BoxError> {
      let target = instance.downcast::<T>().ok_or_else(|| {
        format!(
          "hook expects {}, found {}",
          std::any::type_name::<T>(),
          instance.runtime_type()
        )
      })?;
      f(&*target)
    }))
  }

  pub fn named(method: &str) -> Self {
    Hook::Named(method.to_owned())
  }

  pub fn label(&self) -> &str {
    match self {
      Hook::Direct(_) => "<fn>",
      Hook::Named(method) => method,
    }
  }
}

impl fmt::Debug for Hook {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Hook::Direct(_) => f.write_str("Direct(..)"),
      Hook::Named(method) => f.debug_tuple("Named").field(method).finish(),
    }
  }
}

// --- Injection points ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
  Field,
  Setter { arity: usize },
}

/// A field or setter that receives a dependency after construction.
#[derive(Clone)]
pub struct InjectionPoint {
  member: String,
  kind: MemberKind,
  immutable: bool,
  is_static: bool,
  declared_on: TypeInfo,
  request: DependencyRequest,
  assign: Assign,
}

impl InjectionPoint {
  pub fn new(member: &str, declared_on: TypeInfo, request: DependencyRequest, assign: Assign) -> Self {
    Self {
      member: member.to_owned(),
      kind: MemberKind::Field,
      immutable: false,
      is_static: false,
      declared_on,
      request,
      assign,
    }
  }

  /// Injects the configuration value at `key` through `set`.
  pub fn value<T, V, F>(member: &str, key: &str, set: F) -> Self
  where
    T: ?Sized + Any + Send + Sync,
    V: ConfigType,
    F: Fn(&T, V) + Send + Sync + 'static,
  {
    let assign: Assign = Arc::new(move |target: &Instance, argument: Argument| -> Result<(), BoxError> {
      let target = downcast_target::<T>(target)?;
      match argument {
        Argument::Value(value) => {
          let value = V::from_config(value).ok_or_else(|| format!("expected {}", V::VALUE_TYPE))?;
          set(&*target, value);
          Ok(())
        }
        Argument::Absent => Ok(()),
        Argument::Component(_) => Err("expected a configuration value, found a component".into()),
      }
    });
    Self::new(member, TypeInfo::of::<T>(), DependencyRequest::value::<V>(key), assign)
  }

  /// Injects the unique (or primary) component of type `D` through `set`.
  /// Use [`named`](Self::named) to pick a component by name.
  pub fn component<T, D, F>(member: &str, set: F) -> Self
  where
    T: ?Sized + Any + Send + Sync,
    D: ?Sized + Any + Send + Sync,
    F: Fn(&T, Arc<D>) + Send + Sync + 'static,
  {
    let assign: Assign = Arc::new(move |target: &Instance, argument: Argument| -> Result<(), BoxError> {
      let target = downcast_target::<T>(target)?;
      match argument {
        Argument::Component(instance) => {
          let dependency = instance
            .downcast::<D>()
            .ok_or_else(|| format!("expected {}", std::any::type_name::<D>()))?;
          set(&*target, dependency);
          Ok(())
        }
        Argument::Absent => Ok(()),
        Argument::Value(_) => Err("expected a component, found a configuration value".into()),
      }
    });
    Self::new(member, TypeInfo::of::<T>(), DependencyRequest::component::<D>(), assign)
  }

  pub fn named(mut self, name: &str) -> Self {
    self.request = self.request.with_reference(Some(name));
    self
  }

  pub fn optional(mut self) -> Self {
    self.request = self.request.optional();
    self
  }

  /// Marks the point as a single-parameter setter rather than a field.
  pub fn setter(self) -> Self {
    self.with_kind(MemberKind::Setter { arity: 1 })
  }

  pub fn with_kind(mut self, kind: MemberKind) -> Self {
    self.kind = kind;
    self
  }

  pub fn immutable(mut self) -> Self {
    self.immutable = true;
    self
  }

  pub fn static_member(mut self) -> Self {
    self.is_static = true;
    self
  }

  pub fn member(&self) -> &str {
    &self.member
  }

  pub fn kind(&self) -> MemberKind {
    self.kind
  }

  pub fn declared_on(&self) -> TypeInfo {
    self.declared_on
  }

  pub fn request(&self) -> &DependencyRequest {
    &self.request
  }

  pub(crate) fn assign(&self, target: &Instance, argument: Argument) -> Result<(), BoxError> {
    (self.assign)(target, argument)
  }

  pub(crate) fn validate(&self, owner: &ComponentDescriptor) -> Result<()> {
    let reject = |reason: &str| Error::InvalidInjectionTarget {
      name: owner.name.clone(),
      member: self.member.clone(),
      reason: reason.to_owned(),
    };
    if self.is_static {
      return Err(reject("static members cannot be injected"));
    }
    if self.immutable {
      return Err(reject("immutable members cannot be injected"));
    }
    if let MemberKind::Setter { arity } = self.kind {
      if arity != 1 {
        return Err(reject("not a single-parameter setter"));
      }
    }
    if !owner.hierarchy().any(|ty| ty == self.declared_on) {
      return Err(reject("declared on a type outside the component's hierarchy"));
    }
    self.request.validate(&owner.name)
  }
}

impl fmt::Debug for InjectionPoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("InjectionPoint")
      .field("member", &self.member)
      .field("kind", &self.kind)
      .field("declared_on", &self.declared_on)
      .field("request", &self.request)
      .finish()
  }
}

fn downcast_target<T: ?Sized + Any + Send + Sync>(target: &Instance) -> Result<Arc<T>, BoxError> {
  target.downcast::<T>().ok_or_else(|| {
    format!(
      "injection target {} is not a {}",
      target.runtime_type(),
      std::any::type_name::<T>()
    )
    .into()
  })
}

// --- Descriptors ---

#[derive(Clone)]
struct Contract {
  ty: TypeInfo,
  cast: Cast,
}

/// Registered metadata for one component.
pub struct ComponentDescriptor {
  name: String,
  declared: TypeInfo,
  contracts: Vec<Contract>,
  creation: Creation,
  order: i32,
  primary: bool,
  configuration: bool,
  init: Option<Hook>,
  destroy: Option<Hook>,
  injection_points: Vec<InjectionPoint>,
  accepts: Accepts,
  pub(crate) instance: Option<Instance>,
  pub(crate) state: LifecycleState,
}

impl ComponentDescriptor {
  /// Starts a descriptor for a component declared as `T`.
  pub fn builder<T: ?Sized + Any + Send + Sync>(name: &str) -> DescriptorBuilder<T> {
    DescriptorBuilder::new(name)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn declared_type(&self) -> TypeInfo {
    self.declared
  }

  pub fn creation(&self) -> &Creation {
    &self.creation
  }

  pub fn order(&self) -> i32 {
    self.order
  }

  pub fn is_primary(&self) -> bool {
    self.primary
  }

  /// Whether this is a configuration factory, created before everything else.
  pub fn is_configuration(&self) -> bool {
    self.configuration
  }

  pub fn init_hook(&self) -> Option<&Hook> {
    self.init.as_ref()
  }

  pub fn destroy_hook(&self) -> Option<&Hook> {
    self.destroy.as_ref()
  }

  pub fn injection_points(&self) -> &[InjectionPoint] {
    &self.injection_points
  }

  pub fn instance(&self) -> Option<&Instance> {
    self.instance.as_ref()
  }

  pub fn state(&self) -> LifecycleState {
    self.state
  }

  /// The declared type followed by every contract, most-derived first.
  pub fn hierarchy(&self) -> impl Iterator<Item = TypeInfo> + '_ {
    std::iter::once(self.declared).chain(self.contracts.iter().map(|c| c.ty))
  }

  pub fn is_assignable_to(&self, ty: TypeInfo) -> bool {
    self.hierarchy().any(|t| t == ty)
  }

  /// Views `instance` as `ty`, using the declared type directly or a contract cast.
  pub fn view_as(&self, instance: &Instance, ty: TypeInfo) -> Option<Instance> {
    if ty == self.declared || ty == instance.declared_type() || ty == instance.runtime_type() {
      return Some(instance.clone());
    }
    self
      .contracts
      .iter()
      .find(|c| c.ty == ty)
      .and_then(|c| (c.cast)(instance))
  }

  /// Whether `instance` can be stored as this descriptor's instance.
  pub fn accepts(&self, instance: &Instance) -> bool {
    (self.accepts)(instance)
  }

  /// Injection points in injection order: layer by layer through the
  /// hierarchy, fields before setters within a layer.
  pub(crate) fn ordered_injection_points(&self) -> Vec<InjectionPoint> {
    let mut ordered = Vec::with_capacity(self.injection_points.len());
    for layer in self.hierarchy() {
      let in_layer = || self.injection_points.iter().filter(move |p| p.declared_on == layer);
      ordered.extend(in_layer().filter(|p| p.kind == MemberKind::Field).cloned());
      ordered.extend(in_layer().filter(|p| p.kind != MemberKind::Field).cloned());
    }
    ordered
  }

  pub(crate) fn sort_key(&self) -> (i32, &str) {
    (self.order, &self.name)
  }
}

impl fmt::Debug for ComponentDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ComponentDescriptor")
      .field("name", &self.name)
      .field("declared", &self.declared)
      .field("contracts", &self.contracts.iter().map(|c| c.ty).collect::<Vec<_>>())
      .field("creation", &self.creation)
      .field("order", &self.order)
      .field("primary", &self.primary)
      .field("configuration", &self.configuration)
      .field("init", &self.init)
      .field("destroy", &self.destroy)
      .field("state", &self.state)
      .finish()
  }
}

impl fmt::Display for ComponentDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Component [name={}, type={}", self.name, self.declared)?;
    if let Creation::Factory { owner, .. } = &self.creation {
      write!(f, ", factory={}", owner)?;
    }
    write!(
      f,
      ", init={}, destroy={}, order={}, primary={}]",
      self.init.as_ref().map_or("none", Hook::label),
      self.destroy.as_ref().map_or("none", Hook::label),
      self.order,
      self.primary
    )
  }
}

/// Builder for a [`ComponentDescriptor`] declared as `T`.
///
/// ```
/// use fibre_context::{ComponentDescriptor, DependencyRequest};
///
/// struct Consumer {
///   version: String,
/// }
///
/// let descriptor = ComponentDescriptor::builder::<Consumer>("consumer")
///   .order(10)
///   .constructor(vec![DependencyRequest::named::<String>("version")], |args| {
///     Ok(Consumer {
///       version: (*args.component::<String>(0)?).clone(),
///     })
///   })
///   .build()
///   .unwrap();
///
/// assert_eq!(descriptor.name(), "consumer");
/// assert_eq!(descriptor.order(), 10);
/// ```
pub struct DescriptorBuilder<T: ?Sized> {
  name: String,
  contracts: Vec<Contract>,
  creations: Vec<Creation>,
  order: i32,
  primary: bool,
  configuration: bool,
  init: Option<Hook>,
  destroy: Option<Hook>,
  injection_points: Vec<InjectionPoint>,
  _declared: PhantomData<fn(&T)>,
}

impl<T: ?Sized + Any + Send + Sync> DescriptorBuilder<T> {
  fn new(name: &str) -> Self {
    Self {
      name: name.to_owned(),
      contracts: Vec::new(),
      creations: Vec::new(),
      order: i32::MAX,
      primary: false,
      configuration: false,
      init: None,
      destroy: None,
      injection_points: Vec::new(),
      _declared: PhantomData,
    }
  }

  pub fn order(mut self, order: i32) -> Self {
    self.order = order;
    self
  }

  pub fn primary(mut self) -> Self {
    self.primary = true;
    self
  }

  pub fn configuration(mut self) -> Self {
    self.configuration = true;
    self
  }

  /// Produces the instance with a constructor returning an [`Instance`]; use
  /// this when `T` is a trait object.
  pub fn construct_with<F>(mut self, params: Vec<DependencyRequest>, f: F) -> Self
  where
    F: Fn(&Args) -> Result<Instance, BoxError> + Send + Sync + 'static,
  {
    self.creations.push(Creation::Direct {
      params,
      constructor: Arc::new(f),
    });
    self
  }

  /// Produces the instance by calling `f` on the component named `owner`.
  pub fn factory_with<O, F>(mut self, owner: &str, params: Vec<DependencyRequest>, f: F) -> Self
  where
    O: ?Sized + Any + Send + Sync,
    F: Fn(&O, &Args) -> Result<Instance, BoxError> + Send + Sync + 'static,
  {
    let operation: FactoryOperation = Arc::new(move |owner: &Instance, args: &Args| -> Result<Instance, BoxError> {
      let owner = owner.downcast::<O>().ok_or_else(|| {
        format!(
          "factory owner {} is not a {}",
          owner.runtime_type(),
          std::any::type_name::<O>()
        )
      })?;
      f(&*owner, args)
    });
    self.creations.push(Creation::Factory {
      owner: owner.to_owned(),
      params,
      operation,
    });
    self
  }

  /// Makes the component resolvable as `C` as well, e.g. a `dyn Trait` it implements.
  pub fn provides<C, F>(mut self, cast: F) -> Self
  where
    C: ?Sized + Any + Send + Sync,
    F: Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
  {
    let cast: Cast = Arc::new(move |instance: &Instance| {
      instance
        .downcast::<T>()
        .map(|declared| instance.with_view(cast(declared)))
    });
    self.contracts.push(Contract {
      ty: TypeInfo::of::<C>(),
      cast,
    });
    self
  }

  pub fn init(mut self, hook: Hook) -> Self {
    self.init = Some(hook);
    self
  }

  pub fn destroy(mut self, hook: Hook) -> Self {
    self.destroy = Some(hook);
    self
  }

  pub fn init_method(self, method: &str) -> Self {
    self.init(Hook::named(method))
  }

  pub fn destroy_method(self, method: &str) -> Self {
    self.destroy(Hook::named(method))
  }

  pub fn inject(mut self, point: InjectionPoint) -> Self {
    self.injection_points.push(point);
    self
  }

  pub fn build(mut self) -> Result<ComponentDescriptor> {
    let creation = match self.creations.len() {
      0 => return Err(Error::invalid(&self.name, "no constructor or factory specified")),
      1 => self.creations.remove(0),
      n => {
        return Err(Error::invalid(
          &self.name,
          format!("{} constructors or factories specified, expected exactly one", n),
        ))
      }
    };

    Ok(ComponentDescriptor {
      name: self.name,
      declared: TypeInfo::of::<T>(),
      contracts: self.contracts,
      creation,
      order: self.order,
      primary: self.primary,
      configuration: self.configuration,
      init: self.init,
      destroy: self.destroy,
      injection_points: self.injection_points,
      accepts: Arc::new(|instance: &Instance| instance.is::<T>()),
      instance: None,
      state: LifecycleState::Unregistered,
    })
  }
}

impl<T: Any + Send + Sync> DescriptorBuilder<T> {
  /// Produces the instance by calling `f` with the resolved parameters.
  pub fn constructor<F>(self, params: Vec<DependencyRequest>, f: F) -> Self
  where
    F: Fn(&Args) -> Result<T, BoxError> + Send + Sync + 'static,
  {
    self.construct_with(params, move |args| f(args).map(Instance::new))
  }

  /// Produces the instance by calling `f` on the component named `owner`.
  pub fn factory<O, F>(self, owner: &str, params: Vec<DependencyRequest>, f: F) -> Self
  where
    O: ?Sized + Any + Send + Sync,
    F: Fn(&O, &Args) -> Result<T, BoxError> + Send + Sync + 'static,
  {
    self.factory_with::<O, _>(owner, params, move |owner, args| f(owner, args).map(Instance::new))
  }
}
