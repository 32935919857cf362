//! Core data structures shared by the registry, the assembler and the facade.

use crate::error::{Error, Result};
use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A nominal type key: the `TypeId` of a (possibly unsized) type plus its name
/// for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeInfo {
  id: TypeId,
  name: &'static str,
}

impl TypeInfo {
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: type_name::<T>(),
    }
  }

  pub fn id(&self) -> TypeId {
    self.id
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn is<T: ?Sized + Any>(&self) -> bool {
    self.id == TypeId::of::<T>()
  }
}

impl PartialEq for TypeInfo {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

impl fmt::Display for TypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

// An `Arc<X>` for some `X: ?Sized`, erased behind `Any`. Storing the `Arc`
// itself (rather than `X`) is what allows unsized trait objects.
type ErasedArc = Arc<dyn Any + Send + Sync>;

/// A shared, type-erased component instance.
///
/// An instance always carries its concrete *runtime* object. It may also carry a
/// *view* of that object as some other type (typically a `dyn Trait`), which is
/// how a component declared as a trait is stored. Cloning an `Instance` is cheap
/// and preserves identity; see [`Instance::same`].
#[derive(Clone)]
pub struct Instance {
  object: ErasedArc,
  view: Option<ErasedArc>,
  declared: TypeInfo,
  runtime: TypeInfo,
}

impl Instance {
  /// Wraps a concrete value. Its declared and runtime types are both `T`.
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  /// Wraps an already shared value of a concrete type.
  pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      object: Arc::new(value),
      view: None,
      declared: TypeInfo::of::<T>(),
      runtime: TypeInfo::of::<T>(),
    }
  }

  /// Wraps a value as the contract `C`, remembering `R` as its runtime type.
  ///
  /// ```
  /// use fibre_context::Instance;
  /// use std::sync::Arc;
  ///
  /// trait Animal: Send + Sync { fn sound(&self) -> &'static str; }
  /// struct Dog;
  /// impl Animal for Dog { fn sound(&self) -> &'static str { "woof" } }
  ///
  /// let instance = Instance::contract::<dyn Animal, _>(Dog, |d| d as Arc<dyn Animal>);
  /// assert_eq!(instance.downcast::<dyn Animal>().unwrap().sound(), "woof");
  /// assert!(instance.downcast::<Dog>().is_some());
  /// ```
  pub fn contract<C, R>(value: R, cast: impl FnOnce(Arc<R>) -> Arc<C>) -> Self
  where
    C: ?Sized + Any + Send + Sync,
    R: Any + Send + Sync,
  {
    let object = Arc::new(value);
    Self {
      view: Some(Arc::new(cast(object.clone()))),
      object: Arc::new(object),
      declared: TypeInfo::of::<C>(),
      runtime: TypeInfo::of::<R>(),
    }
  }

  /// Wraps a shared trait object whose concrete type is not known.
  pub fn from_dyn<C: ?Sized + Any + Send + Sync>(value: Arc<C>) -> Self {
    Self {
      object: Arc::new(value),
      view: None,
      declared: TypeInfo::of::<C>(),
      runtime: TypeInfo::of::<C>(),
    }
  }

  /// Returns a new view of the same underlying object.
  pub(crate) fn with_view<C: ?Sized + Any + Send + Sync>(&self, view: Arc<C>) -> Self {
    Self {
      object: self.object.clone(),
      view: Some(Arc::new(view)),
      declared: TypeInfo::of::<C>(),
      runtime: self.runtime,
    }
  }

  /// Attempts to get the instance as `Arc<T>`, either through its view or
  /// through its runtime object.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self
      .view
      .as_ref()
      .and_then(|view| view.downcast_ref::<Arc<T>>())
      .or_else(|| self.object.downcast_ref::<Arc<T>>())
      .cloned()
  }

  pub fn is<T: ?Sized + Any + Send + Sync>(&self) -> bool {
    self.downcast::<T>().is_some()
  }

  /// The type this instance is currently viewed as.
  pub fn declared_type(&self) -> TypeInfo {
    self.declared
  }

  /// The concrete type of the underlying object, when known.
  pub fn runtime_type(&self) -> TypeInfo {
    self.runtime
  }

  /// Returns `true` if both instances share the same underlying object.
  pub fn same(&self, other: &Instance) -> bool {
    Arc::ptr_eq(&self.object, &other.object)
  }
}

impl fmt::Debug for Instance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Instance({} as {} @ {:p})",
      self.runtime,
      self.declared,
      Arc::as_ptr(&self.object)
    )
  }
}

/// The names of components currently being constructed during one bootstrap run.
///
/// Names are never removed: a component that finished construction
/// short-circuits before reaching the set again, so re-entry always means a cycle.
#[derive(Debug, Default)]
pub(crate) struct InProgress {
  names: HashSet<String>,
}

impl InProgress {
  pub(crate) fn enter(&mut self, name: &str) -> Result<()> {
    // `insert` returns `false` if the value was already present.
    if !self.names.insert(name.to_owned()) {
      return Err(Error::CircularDependency(name.to_owned()));
    }
    Ok(())
  }
}
