//! Finding the descriptor that satisfies a request for a type, or a name and a type.

use crate::core::TypeInfo;
use crate::descriptor::ComponentDescriptor;
use crate::error::{Error, Result};
use crate::registry::Registry;

/// Read-only lookups over a [`Registry`].
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
  registry: &'a Registry,
}

impl<'a> Resolver<'a> {
  pub fn new(registry: &'a Registry) -> Self {
    Self { registry }
  }

  /// All descriptors assignable to `ty`, sorted by (order, name).
  pub fn candidates(&self, ty: TypeInfo) -> Vec<&'a ComponentDescriptor> {
    self.registry.sorted(|d| d.is_assignable_to(ty))
  }

  /// The single descriptor for `ty`, choosing the primary one when several match.
  ///
  /// Returns `Ok(None)` when nothing matches.
  pub fn by_type(&self, ty: TypeInfo) -> Result<Option<&'a ComponentDescriptor>> {
    let candidates = self.candidates(ty);
    if candidates.len() <= 1 {
      return Ok(candidates.into_iter().next());
    }

    let mut primaries = candidates.iter().filter(|d| d.is_primary());
    match (primaries.next(), primaries.next()) {
      (Some(primary), None) => Ok(Some(*primary)),
      (None, _) => Err(Error::AmbiguousDependency {
        type_name: ty.name(),
        candidates: names(&candidates),
      }),
      (Some(_), Some(_)) => Err(Error::AmbiguousPrimary {
        type_name: ty.name(),
        candidates: names(&candidates),
      }),
    }
  }

  /// Like [`by_type`](Self::by_type), but a missing match is an error.
  pub fn unique(&self, ty: TypeInfo) -> Result<&'a ComponentDescriptor> {
    self.by_type(ty)?.ok_or(Error::NoSuchType(ty.name()))
  }

  /// The descriptor named `name`, which must be assignable to `ty`.
  pub fn by_name(&self, name: &str, ty: TypeInfo) -> Result<Option<&'a ComponentDescriptor>> {
    match self.registry.get(name) {
      None => Ok(None),
      Some(d) if d.is_assignable_to(ty) => Ok(Some(d)),
      Some(d) => Err(Error::TypeMismatch {
        name: name.to_owned(),
        expected: ty.name(),
        actual: d.declared_type().name(),
      }),
    }
  }
}

fn names(candidates: &[&ComponentDescriptor]) -> Vec<String> {
  candidates.iter().map(|d| d.name().to_owned()).collect()
}
