use crate::config::ConfigError;
use thiserror::Error;

/// Error type returned by user-supplied constructors, factories, setters and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for the `fibre_context` library.
///
/// Every variant raised while building a [`Context`](crate::Context) aborts the
/// whole bootstrap. Lookup variants (`NoSuchName`, `NoSuchType`) raised after a
/// successful bootstrap only affect the failing call.
#[derive(Debug, Error)]
pub enum Error {
  // --- Registration ---
  #[error("Duplicate component name: '{0}'")]
  DuplicateName(String),

  #[error("Invalid component '{name}': {reason}")]
  InvalidDescriptor { name: String, reason: String },

  #[error("Cannot inject {member} on component '{name}': {reason}")]
  InvalidInjectionTarget {
    name: String,
    member: String,
    reason: String,
  },

  // --- Resolution ---
  #[error("Multiple components of type '{type_name}' found, but none is primary: {candidates:?}")]
  AmbiguousDependency {
    type_name: &'static str,
    candidates: Vec<String>,
  },

  #[error("Multiple components of type '{type_name}' found, and more than one is primary: {candidates:?}")]
  AmbiguousPrimary {
    type_name: &'static str,
    candidates: Vec<String>,
  },

  #[error("Unsatisfied dependency of component '{name}': no component of type '{type_name}'{}", named_suffix(.requested))]
  UnsatisfiedDependency {
    name: String,
    type_name: &'static str,
    requested: Option<String>,
  },

  #[error("Component '{name}' has type '{actual}', but '{expected}' was required")]
  TypeMismatch {
    name: String,
    expected: &'static str,
    actual: &'static str,
  },

  #[error("Missing configuration '{key}' required by component '{name}'")]
  MissingConfiguration { name: String, key: String },

  #[error("Configuration error in component '{name}'")]
  Configuration {
    name: String,
    #[source]
    source: ConfigError,
  },

  #[error("Circular dependency detected when creating component '{0}'")]
  CircularDependency(String),

  // --- Creation and lifecycle ---
  #[error("Failed to create component '{name}' ({type_name})")]
  Creation {
    name: String,
    type_name: &'static str,
    #[source]
    source: BoxError,
  },

  #[error("Failed to inject {member} on component '{name}'")]
  Injection {
    name: String,
    member: String,
    #[source]
    source: BoxError,
  },

  #[error("Lifecycle hook '{hook}' failed on component '{name}'")]
  Hook {
    name: String,
    hook: String,
    #[source]
    source: BoxError,
  },

  #[error("No method named '{hook}' registered for type '{type_name}' (component '{name}')")]
  MissingHook {
    name: String,
    hook: String,
    type_name: &'static str,
  },

  #[error("Bad argument #{index} for component '{name}': {reason}")]
  Argument {
    name: String,
    index: usize,
    reason: String,
  },

  // --- Lookup ---
  #[error("No component defined with name '{0}'")]
  NoSuchName(String),

  #[error("No component defined with type '{0}'")]
  NoSuchType(&'static str),
}

impl Error {
  pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
    Error::InvalidDescriptor {
      name: name.to_owned(),
      reason: reason.into(),
    }
  }

  /// Lifts a resolver-level configuration error into the context of a component.
  pub(crate) fn from_config(name: &str, source: ConfigError) -> Self {
    match source {
      ConfigError::Missing(key) => Error::MissingConfiguration {
        name: name.to_owned(),
        key,
      },
      other => Error::Configuration {
        name: name.to_owned(),
        source: other,
      },
    }
  }
}

fn named_suffix(requested: &Option<String>) -> String {
  match requested {
    Some(name) => format!(" named '{}'", name),
    None => String::new(),
  }
}

/// A specialized `Result` type for `fibre_context` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
