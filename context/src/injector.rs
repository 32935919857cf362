use crate::assembler::Assembler;
use crate::descriptor::{Argument, LifecycleState, MemberKind};
use crate::error::{Error, Result};
use tracing::debug;

impl Assembler<'_> {
  /// Runs property injection for every component, in (order, name) order.
  pub(crate) fn inject_all(&mut self) -> Result<()> {
    for name in self.registry.sorted_names(|_| true) {
      self.inject(&name)?;
    }
    Ok(())
  }

  /// Injects the fields and setters of one constructed component.
  ///
  /// Injection targets whatever object the post-processor chain's
  /// `before_injection` pass selects, which need not be the stored instance.
  pub(crate) fn inject(&mut self, name: &str) -> Result<()> {
    let descriptor = self.registry.descriptor(name)?;
    let instance = descriptor
      .instance()
      .cloned()
      .ok_or_else(|| Error::invalid(name, "cannot inject a component that was never constructed"))?;
    let points = descriptor.ordered_injection_points();
    let target = self.chain.before_injection(instance, name);

    for point in points {
      let argument = self.resolve_argument(name, point.request())?;
      if let Argument::Absent = argument {
        debug!(component = name, member = point.member(), "optional dependency absent, skipped");
        continue;
      }

      let view = self
        .registry
        .descriptor(name)?
        .view_as(&target, point.declared_on())
        .ok_or_else(|| Error::TypeMismatch {
          name: name.to_owned(),
          expected: point.declared_on().name(),
          actual: target.runtime_type().name(),
        })?;

      let kind = match point.kind() {
        MemberKind::Field => "field",
        MemberKind::Setter { .. } => "setter",
      };
      debug!(component = name, member = point.member(), kind, "injecting");
      point.assign(&view, argument).map_err(|source| Error::Injection {
        name: name.to_owned(),
        member: point.member().to_owned(),
        source,
      })?;
    }

    self.registry.descriptor_mut(name)?.state = LifecycleState::Injected;
    Ok(())
  }
}
