//! Configuration values and the resolver contract the context reads them through.
//!
//! The context never loads configuration itself. It asks a [`ConfigResolver`]
//! for a key coerced to a [`ValueType`]. [`Properties`] is a ready-made resolver
//! backed by string key/value pairs, environment variables or YAML documents,
//! supporting `${key}` and `${key:default}` placeholders.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`ConfigResolver`].
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Property '{0}' not found")]
  Missing(String),

  #[error("Invalid property key: '{0}'")]
  InvalidKey(String),

  #[error("Cannot convert property '{key}' to {ty}: {reason}")]
  Parse {
    key: String,
    ty: ValueType,
    reason: String,
  },

  #[error("Circular reference while expanding property '{0}'")]
  Circular(String),

  #[error("Unsupported value type: {0}")]
  Unsupported(&'static str),

  #[error("Failed to parse YAML configuration: {0}")]
  Yaml(#[from] serde_yaml::Error),
}

/// The resolver the context consults for configuration-value dependencies.
pub trait ConfigResolver: Send + Sync {
  /// Returns the value for `key` coerced to `target`, or `None` if absent.
  fn get_value(&self, key: &str, target: ValueType) -> Result<Option<ConfigValue>, ConfigError>;

  /// Returns the value for `key` coerced to `target`, failing if absent.
  fn get_required_value(&self, key: &str, target: ValueType) -> Result<ConfigValue, ConfigError> {
    self
      .get_value(key, target)?
      .ok_or_else(|| ConfigError::Missing(key.to_owned()))
  }
}

macro_rules! value_types {
  ($($variant:ident($ty:ty)),* $(,)?) => {
    /// The set of types a configuration value can be coerced to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ValueType {
      $($variant,)*
    }

    /// A configuration value after coercion.
    #[derive(Debug, Clone, PartialEq)]
    pub enum ConfigValue {
      $($variant($ty),)*
    }

    impl ValueType {
      /// Maps a Rust type to its value type, if it is supported.
      pub fn of_type(id: TypeId) -> Option<ValueType> {
        $(
          if id == TypeId::of::<$ty>() {
            return Some(ValueType::$variant);
          }
        )*
        None
      }
    }

    impl ConfigValue {
      pub fn value_type(&self) -> ValueType {
        match self {
          $(ConfigValue::$variant(_) => ValueType::$variant,)*
        }
      }
    }

    $(
      impl ConfigType for $ty {
        const VALUE_TYPE: ValueType = ValueType::$variant;

        fn from_config(value: ConfigValue) -> Option<Self> {
          match value {
            ConfigValue::$variant(v) => Some(v),
            _ => None,
          }
        }
      }
    )*
  };
}

/// A Rust type that configuration values can be coerced into.
pub trait ConfigType: Any + Sized + Send + Sync {
  const VALUE_TYPE: ValueType;

  fn from_config(value: ConfigValue) -> Option<Self>;
}

value_types! {
  String(String),
  Bool(bool),
  I8(i8),
  I16(i16),
  I32(i32),
  I64(i64),
  U8(u8),
  U16(u16),
  U32(u32),
  U64(u64),
  Usize(usize),
  F32(f32),
  F64(f64),
  Date(NaiveDate),
  Time(NaiveTime),
  DateTime(NaiveDateTime),
  ZonedDateTime(DateTime<FixedOffset>),
  Duration(Duration),
}

impl fmt::Display for ValueType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

impl ValueType {
  /// Coerces a raw string into this type.
  pub fn parse(self, key: &str, raw: &str) -> Result<ConfigValue, ConfigError> {
    fn num<T: std::str::FromStr>(raw: &str) -> Result<T, String>
    where
      T::Err: fmt::Display,
    {
      raw.trim().parse::<T>().map_err(|e| e.to_string())
    }

    let parsed = match self {
      ValueType::String => Ok(ConfigValue::String(raw.to_owned())),
      ValueType::Bool => num(raw).map(ConfigValue::Bool),
      ValueType::I8 => num(raw).map(ConfigValue::I8),
      ValueType::I16 => num(raw).map(ConfigValue::I16),
      ValueType::I32 => num(raw).map(ConfigValue::I32),
      ValueType::I64 => num(raw).map(ConfigValue::I64),
      ValueType::U8 => num(raw).map(ConfigValue::U8),
      ValueType::U16 => num(raw).map(ConfigValue::U16),
      ValueType::U32 => num(raw).map(ConfigValue::U32),
      ValueType::U64 => num(raw).map(ConfigValue::U64),
      ValueType::Usize => num(raw).map(ConfigValue::Usize),
      ValueType::F32 => num(raw).map(ConfigValue::F32),
      ValueType::F64 => num(raw).map(ConfigValue::F64),
      ValueType::Date => num(raw).map(ConfigValue::Date),
      ValueType::Time => num(raw).map(ConfigValue::Time),
      ValueType::DateTime => num(raw).map(ConfigValue::DateTime),
      ValueType::ZonedDateTime => DateTime::parse_from_rfc3339(raw.trim())
        .map(ConfigValue::ZonedDateTime)
        .map_err(|e| e.to_string()),
      ValueType::Duration => {
        let raw = raw.trim();
        humantime::parse_duration(raw)
          .or_else(|e| parse_iso_duration(raw).ok_or_else(|| e.to_string()))
          .map(ConfigValue::Duration)
      }
    };

    parsed.map_err(|reason| ConfigError::Parse {
      key: key.to_owned(),
      ty: self,
      reason,
    })
  }
}

// Matches `${key}` and `${key:default}`; the default may itself be empty.
static PLACEHOLDER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^\$\{([^:}]*)(?::(.*))?\}$").expect("placeholder pattern is valid"));

// ISO-8601 durations limited to days and time fields, e.g. `P2DT3H4M` or `PT0.5S`.
static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?i)^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:[.,](\d{1,9}))?S)?)?$")
    .expect("duration pattern is valid")
});

fn parse_iso_duration(raw: &str) -> Option<Duration> {
  let caps = ISO_DURATION.captures(raw)?;
  if raw.ends_with(|c: char| c == 'T' || c == 't') || (1..=4).all(|i| caps.get(i).is_none()) {
    return None;
  }

  let field = |i: usize, unit: u64| -> Option<u64> {
    match caps.get(i) {
      Some(m) => m.as_str().parse::<u64>().ok()?.checked_mul(unit),
      None => Some(0),
    }
  };
  let secs = field(1, 86_400)?
    .checked_add(field(2, 3_600)?)?
    .checked_add(field(3, 60)?)?
    .checked_add(field(4, 1)?)?;
  let nanos = match caps.get(5) {
    Some(m) => format!("{:0<9}", m.as_str()).parse::<u32>().ok()?,
    None => 0,
  };
  Some(Duration::new(secs, nanos))
}

struct Placeholder<'a> {
  key: &'a str,
  default: Option<&'a str>,
}

fn parse_placeholder(expr: &str) -> Result<Option<Placeholder<'_>>, ConfigError> {
  let Some(caps) = PLACEHOLDER.captures(expr) else {
    return Ok(None);
  };
  let key = caps.get(1).map_or("", |m| m.as_str());
  if key.is_empty() {
    return Err(ConfigError::InvalidKey(expr.to_owned()));
  }
  Ok(Some(Placeholder {
    key,
    default: caps.get(2).map(|m| m.as_str()),
  }))
}

/// A [`ConfigResolver`] backed by an in-memory string map.
#[derive(Debug, Clone, Default)]
pub struct Properties {
  values: HashMap<String, String>,
}

impl Properties {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_pairs<K, V, I>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let mut props = Self::new();
    for (k, v) in pairs {
      props.insert(k, v);
    }
    props
  }

  /// Flattens a YAML document into dotted keys: `app: { title: x }` becomes
  /// `app.title = x`. Sequences are indexed as `key[0]`, `key[1]`, ...
  pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
    let root: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    let mut props = Self::new();
    flatten_yaml(&mut props.values, String::new(), &root);
    Ok(props)
  }

  /// Adds every process environment variable, keeping existing keys.
  pub fn with_env(mut self) -> Self {
    for (k, v) in std::env::vars() {
      self.values.entry(k).or_insert(v);
    }
    self
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
    self.values.insert(key.into(), value.into());
    self
  }

  pub fn contains(&self, key: &str) -> bool {
    self.values.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Looks up a key or `${...}` expression, expanding placeholders in the result.
  ///
  /// A stored value that refers back to a key already being expanded fails
  /// with [`ConfigError::Circular`].
  pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
    self.lookup(key, &mut Vec::new())
  }

  pub fn get_or(&self, key: &str, default: &str) -> Result<String, ConfigError> {
    self.lookup_or(key, default, &mut Vec::new())
  }

  pub fn get_required(&self, key: &str) -> Result<String, ConfigError> {
    self.lookup_required(key, &mut Vec::new())
  }

  /// Looks up a key and coerces it to `T`.
  pub fn get_as<T: ConfigType>(&self, key: &str) -> Result<Option<T>, ConfigError> {
    Ok(
      self
        .get_value(key, T::VALUE_TYPE)?
        .and_then(T::from_config),
    )
  }

  fn lookup(&self, key: &str, visiting: &mut Vec<String>) -> Result<Option<String>, ConfigError> {
    if let Some(expr) = parse_placeholder(key)? {
      return match expr.default {
        Some(default) => self.lookup_or(expr.key, default, visiting).map(Some),
        None => self.lookup_required(expr.key, visiting).map(Some),
      };
    }

    let value = match self.values.get(key) {
      Some(value) => value,
      None => return Ok(None),
    };
    if visiting.iter().any(|k| k == key) {
      return Err(ConfigError::Circular(key.to_owned()));
    }
    visiting.push(key.to_owned());
    let expanded = self.expand(value, visiting);
    visiting.pop();
    expanded.map(Some)
  }

  fn lookup_or(&self, key: &str, default: &str, visiting: &mut Vec<String>) -> Result<String, ConfigError> {
    match self.lookup(key, visiting)? {
      Some(value) => Ok(value),
      None => self.expand(default, visiting),
    }
  }

  fn lookup_required(&self, key: &str, visiting: &mut Vec<String>) -> Result<String, ConfigError> {
    self
      .lookup(key, visiting)?
      .ok_or_else(|| ConfigError::Missing(key.to_owned()))
  }

  fn expand(&self, value: &str, visiting: &mut Vec<String>) -> Result<String, ConfigError> {
    match parse_placeholder(value)? {
      None => Ok(value.to_owned()),
      Some(expr) => match expr.default {
        Some(default) => self.lookup_or(expr.key, default, visiting),
        None => self.lookup_required(expr.key, visiting),
      },
    }
  }
}

impl ConfigResolver for Properties {
  fn get_value(&self, key: &str, target: ValueType) -> Result<Option<ConfigValue>, ConfigError> {
    match self.get(key)? {
      Some(raw) => target.parse(key, &raw).map(Some),
      None => Ok(None),
    }
  }
}

fn flatten_yaml(out: &mut HashMap<String, String>, prefix: String, value: &serde_yaml::Value) {
  use serde_yaml::Value;

  match value {
    Value::Mapping(map) => {
      for (k, v) in map {
        let segment = match k {
          Value::String(s) => s.clone(),
          Value::Number(n) => n.to_string(),
          Value::Bool(b) => b.to_string(),
          _ => continue,
        };
        let key = if prefix.is_empty() {
          segment
        } else {
          format!("{}.{}", prefix, segment)
        };
        flatten_yaml(out, key, v);
      }
    }
    Value::Sequence(items) => {
      for (i, v) in items.iter().enumerate() {
        flatten_yaml(out, format!("{}[{}]", prefix, i), v);
      }
    }
    Value::String(s) => {
      out.insert(prefix, s.clone());
    }
    Value::Number(n) => {
      out.insert(prefix, n.to_string());
    }
    Value::Bool(b) => {
      out.insert(prefix, b.to_string());
    }
    Value::Tagged(tagged) => flatten_yaml(out, prefix, &tagged.value),
    Value::Null => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn props() -> Properties {
    Properties::from_pairs([
      ("app.title", "Scan App"),
      ("app.version", "v1.0"),
      ("app.alias", "${app.title}"),
      ("convert.integer", "1234567"),
      ("convert.bool", "true"),
      ("convert.localdate", "2023-03-29"),
      ("convert.localdatetime", "2023-03-29T20:45:01"),
      ("convert.zoned", "2023-03-29T20:45:01+08:00"),
      ("convert.duration", "P2DT3H4M"),
      ("convert.humantime", "2days 3h 4m"),
    ])
  }

  #[test]
  fn plain_and_placeholder_lookups() {
    let p = props();

    assert_eq!(p.get("app.title").unwrap().as_deref(), Some("Scan App"));
    assert_eq!(p.get("${app.title}").unwrap().as_deref(), Some("Scan App"));
    assert_eq!(p.get("app.alias").unwrap().as_deref(), Some("Scan App"));
    assert_eq!(p.get("missing").unwrap(), None);
    assert_eq!(
      p.get("${app.missing:fallback}").unwrap().as_deref(),
      Some("fallback")
    );
    assert_eq!(
      p.get("${app.missing:${app.version}}").unwrap().as_deref(),
      Some("v1.0")
    );
  }

  #[test]
  fn required_placeholder_without_default_fails_when_missing() {
    let p = props();
    assert!(matches!(
      p.get("${app.missing}"),
      Err(ConfigError::Missing(key)) if key == "app.missing"
    ));
  }

  #[test]
  fn empty_placeholder_key_is_invalid() {
    assert!(matches!(props().get("${}"), Err(ConfigError::InvalidKey(_))));
    assert!(matches!(
      props().get("${:x}"),
      Err(ConfigError::InvalidKey(_))
    ));
  }

  #[test]
  fn coercion_to_typed_values() {
    let p = props();

    assert_eq!(p.get_as::<i32>("convert.integer").unwrap(), Some(1234567));
    assert_eq!(p.get_as::<i64>("convert.integer").unwrap(), Some(1234567));
    assert_eq!(p.get_as::<bool>("convert.bool").unwrap(), Some(true));
    assert_eq!(
      p.get_as::<NaiveDate>("convert.localdate").unwrap(),
      NaiveDate::from_ymd_opt(2023, 3, 29)
    );
    assert_eq!(
      p.get_as::<NaiveDateTime>("convert.localdatetime")
        .unwrap()
        .map(|dt| dt.to_string()),
      Some("2023-03-29 20:45:01".to_owned())
    );
    assert_eq!(
      p.get_as::<DateTime<FixedOffset>>("convert.zoned")
        .unwrap()
        .map(|dt| dt.offset().local_minus_utc()),
      Some(8 * 3600)
    );
    assert_eq!(
      p.get_as::<Duration>("convert.duration").unwrap(),
      Some(Duration::from_secs(2 * 86400 + 3 * 3600 + 4 * 60))
    );
  }

  #[test]
  fn durations_accept_humantime_and_iso_forms() {
    let p = props();
    let expected = Some(Duration::from_secs(2 * 86400 + 3 * 3600 + 4 * 60));

    assert_eq!(p.get_as::<Duration>("convert.humantime").unwrap(), expected);
    assert_eq!(p.get_as::<Duration>("convert.duration").unwrap(), expected);
    assert_eq!(
      ValueType::Duration.parse("d", "PT1.5S").unwrap(),
      ConfigValue::Duration(Duration::from_millis(1500))
    );
    assert_eq!(
      ValueType::Duration.parse("d", "pt90s").unwrap(),
      ConfigValue::Duration(Duration::from_secs(90))
    );

    for bad in ["P", "PT", "P1Y", "soon"] {
      assert!(
        matches!(ValueType::Duration.parse("d", bad), Err(ConfigError::Parse { .. })),
        "{} should not parse",
        bad
      );
    }
  }

  #[test]
  fn self_referencing_values_are_circular() {
    let p = Properties::from_pairs([
      ("self", "${self}"),
      ("a", "${b}"),
      ("b", "${a}"),
      ("c", "${missing:${c}}"),
    ]);

    assert!(matches!(p.get("self"), Err(ConfigError::Circular(key)) if key == "self"));
    assert!(matches!(p.get("a"), Err(ConfigError::Circular(key)) if key == "a"));
    assert!(matches!(p.get("${b}"), Err(ConfigError::Circular(key)) if key == "b"));
    assert!(matches!(p.get("c"), Err(ConfigError::Circular(key)) if key == "c"));
    assert!(matches!(
      p.get_value("a", ValueType::String),
      Err(ConfigError::Circular(_))
    ));
  }

  #[test]
  fn repeated_references_are_not_circular() {
    let p = Properties::from_pairs([
      ("base", "v1"),
      ("left", "${base}"),
      ("right", "${base}"),
      ("both", "${left:${right}}"),
    ]);

    assert_eq!(p.get("both").unwrap().as_deref(), Some("v1"));
    assert_eq!(p.get("${right}").unwrap().as_deref(), Some("v1"));
  }

  #[test]
  fn coercion_failure_reports_key_and_type() {
    let err = props().get_as::<u8>("convert.integer").unwrap_err();
    match err {
      ConfigError::Parse { key, ty, .. } => {
        assert_eq!(key, "convert.integer");
        assert_eq!(ty, ValueType::U8);
      }
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn required_value_through_resolver_trait() {
    let p = props();
    let resolver: &dyn ConfigResolver = &p;

    assert_eq!(
      resolver
        .get_required_value("app.version", ValueType::String)
        .unwrap(),
      ConfigValue::String("v1.0".to_owned())
    );
    assert!(matches!(
      resolver.get_required_value("nope", ValueType::String),
      Err(ConfigError::Missing(_))
    ));
  }

  #[test]
  fn yaml_documents_flatten_to_dotted_keys() {
    let yaml = r#"
app:
  title: Yaml App
  version: 2
  debug: false
servers:
  - alpha
  - beta
"#;
    let p = Properties::from_yaml_str(yaml).unwrap();

    assert_eq!(p.get("app.title").unwrap().as_deref(), Some("Yaml App"));
    assert_eq!(p.get_as::<u32>("app.version").unwrap(), Some(2));
    assert_eq!(p.get_as::<bool>("app.debug").unwrap(), Some(false));
    assert_eq!(p.get("servers[1]").unwrap().as_deref(), Some("beta"));
  }

  #[test]
  fn value_type_lookup_by_rust_type() {
    assert_eq!(
      ValueType::of_type(TypeId::of::<String>()),
      Some(ValueType::String)
    );
    assert_eq!(
      ValueType::of_type(TypeId::of::<Duration>()),
      Some(ValueType::Duration)
    );
    assert_eq!(ValueType::of_type(TypeId::of::<Vec<u8>>()), None);
  }
}
