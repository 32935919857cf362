use fibre_context::{
  ComponentDescriptor, ConfigError, Context, DependencyRequest, Error, InjectionPoint, LifecycleState, Properties,
  Registry,
};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

// --- Test Fixtures ---

trait Dog: Send + Sync {
  fn name(&self) -> &'static str;
}

struct Husky;
impl Dog for Husky {
  fn name(&self) -> &'static str {
    "husky"
  }
}

struct Teddy;
impl Dog for Teddy {
  fn name(&self) -> &'static str {
    "teddy"
  }
}

struct AppConfig {
  prefix: String,
}

struct Consumer {
  version: Arc<String>,
}

#[derive(Default)]
struct Banner {
  title: Mutex<String>,
  width: Mutex<u32>,
  footer: Mutex<Option<String>>,
}

fn dogs(teddy_primary: bool) -> Registry {
  let husky = ComponentDescriptor::builder::<Husky>("husky")
    .constructor(vec![], |_| Ok(Husky))
    .provides::<dyn Dog, _>(|d| d as Arc<dyn Dog>);
  let mut teddy = ComponentDescriptor::builder::<Teddy>("teddy")
    .constructor(vec![], |_| Ok(Teddy))
    .provides::<dyn Dog, _>(|d| d as Arc<dyn Dog>);
  if teddy_primary {
    teddy = teddy.primary();
  }

  let mut registry = Registry::new();
  registry
    .register(husky.build().unwrap())
    .unwrap()
    .register(teddy.build().unwrap())
    .unwrap();
  registry
}

// --- Lookup Tests ---

#[test]
fn test_primary_component_wins_type_lookup() {
  // Arrange
  let ctx = Context::without_config(dogs(true)).unwrap();

  // Act
  let dog = ctx.get::<dyn Dog>().unwrap();
  let all: Vec<_> = ctx.get_all::<dyn Dog>().unwrap().iter().map(|d| d.name()).collect();

  // Assert
  assert_eq!(dog.name(), "teddy");
  assert_eq!(all, vec!["husky", "teddy"]);
  assert_eq!(ctx.get_named::<dyn Dog>("husky").unwrap().name(), "husky");
  assert_eq!(ctx.descriptors_of::<dyn Dog>().len(), 2);
}

#[test]
fn test_ambiguous_type_lookup_fails_without_primary() {
  let ctx = Context::without_config(dogs(false)).unwrap();

  match ctx.get::<dyn Dog>() {
    Err(Error::AmbiguousDependency { candidates, .. }) => assert_eq!(candidates, vec!["husky", "teddy"]),
    Err(other) => panic!("unexpected error: {}", other),
    Ok(_) => panic!("lookup should be ambiguous"),
  }
  // Concrete types stay unique.
  assert_eq!(ctx.get::<Husky>().unwrap().name(), "husky");
}

#[test]
fn test_lookup_misses() {
  let ctx = Context::without_config(dogs(true)).unwrap();

  assert!(ctx.contains_bean("husky"));
  assert!(!ctx.contains_bean("poodle"));
  assert!(matches!(ctx.get_bean("poodle"), Err(Error::NoSuchName(_))));
  assert!(matches!(ctx.get::<String>(), Err(Error::NoSuchType(_))));
  assert!(matches!(ctx.get_named::<dyn Dog>("poodle"), Err(Error::NoSuchName(_))));
  assert!(matches!(ctx.get_named::<Teddy>("husky"), Err(Error::TypeMismatch { .. })));
  assert!(ctx.get_all::<String>().unwrap().is_empty());
}

#[test]
fn test_get_bean_returns_the_same_instance() {
  let ctx = Context::without_config(dogs(true)).unwrap();

  let a = ctx.get_bean("teddy").unwrap();
  let b = ctx.get_bean("teddy").unwrap();

  assert!(a.same(&b));
  assert!(a.runtime_type().is::<Teddy>());
  assert_eq!(ctx.descriptor("teddy").unwrap().state(), LifecycleState::Initialized);
}

// --- Assembly Tests ---

#[test]
fn test_components_are_created_by_order_then_name() {
  // Arrange
  let created = Arc::new(Mutex::new(Vec::new()));
  let mut registry = Registry::new();
  for (name, order) in [("b", 10), ("a", 10), ("c", 5)] {
    let created = created.clone();
    registry
      .register(
        ComponentDescriptor::builder::<String>(name)
          .order(order)
          .constructor(vec![], move |_| {
            created.lock().unwrap().push(name);
            Ok(name.to_owned())
          })
          .build()
          .unwrap(),
      )
      .unwrap();
  }

  // Act
  let ctx = Context::without_config(registry).unwrap();

  // Assert
  assert_eq!(*created.lock().unwrap(), vec!["c", "a", "b"]);
  let all: Vec<String> = ctx.get_all::<String>().unwrap().iter().map(|s| s.to_string()).collect();
  assert_eq!(all, vec!["c", "a", "b"]);
}

#[test]
fn test_factory_on_configuration_component() {
  // Arrange
  let mut registry = Registry::new();
  registry
    .register(
      ComponentDescriptor::builder::<Consumer>("consumer")
        .order(1)
        .constructor(vec![DependencyRequest::named::<String>("version")], |args| {
          Ok(Consumer {
            version: args.component::<String>(0)?,
          })
        })
        .build()
        .unwrap(),
    )
    .unwrap()
    .register(
      ComponentDescriptor::builder::<String>("version")
        .factory::<AppConfig, _>("config", vec![], |config, _| Ok(format!("{}1.0", config.prefix)))
        .build()
        .unwrap(),
    )
    .unwrap()
    .register(
      ComponentDescriptor::builder::<AppConfig>("config")
        .configuration()
        .constructor(vec![DependencyRequest::value::<String>("${app.prefix:v}")], |args| {
          Ok(AppConfig {
            prefix: args.value(0)?,
          })
        })
        .build()
        .unwrap(),
    )
    .unwrap();

  // Act
  let ctx = Context::without_config(registry).unwrap();

  // Assert
  let consumer = ctx.get::<Consumer>().unwrap();
  assert_eq!(*consumer.version, "v1.0");
  assert!(Arc::ptr_eq(&consumer.version, &ctx.get_named::<String>("version").unwrap()));
}

#[test]
fn test_configuration_values_are_injected() {
  // Arrange
  let config = Properties::from_yaml_str("app:\n  title: Fibre\n  width: 80\n").unwrap();
  let mut registry = Registry::new();
  registry
    .register(
      ComponentDescriptor::builder::<Banner>("banner")
        .constructor(vec![], |_| Ok(Banner::default()))
        .inject(InjectionPoint::value::<Banner, String, _>("title", "app.title", |b, v| {
          *b.title.lock().unwrap() = v;
        }))
        .inject(
          InjectionPoint::value::<Banner, u32, _>("set_width", "${app.width:40}", |b, v| {
            *b.width.lock().unwrap() = v;
          })
          .setter(),
        )
        .inject(
          InjectionPoint::value::<Banner, String, _>("footer", "app.footer", |b, v| {
            *b.footer.lock().unwrap() = Some(v);
          })
          .optional(),
        )
        .build()
        .unwrap(),
    )
    .unwrap();

  // Act
  let ctx = Context::new(registry, config).unwrap();

  // Assert
  let banner = ctx.get::<Banner>().unwrap();
  assert_eq!(*banner.title.lock().unwrap(), "Fibre");
  assert_eq!(*banner.width.lock().unwrap(), 80);
  assert_eq!(*banner.footer.lock().unwrap(), None);
}

#[test]
fn test_missing_required_configuration_aborts_bootstrap() {
  let mut registry = Registry::new();
  registry
    .register(
      ComponentDescriptor::builder::<String>("title")
        .constructor(vec![DependencyRequest::value::<String>("${app.title}")], |args| args.value(0).map_err(Into::into))
        .build()
        .unwrap(),
    )
    .unwrap();

  match Context::without_config(registry) {
    Err(Error::MissingConfiguration { name, key }) => {
      assert_eq!(name, "title");
      assert_eq!(key, "app.title");
    }
    Err(other) => panic!("unexpected error: {}", other),
    Ok(_) => panic!("bootstrap should fail"),
  }
}

#[test]
fn test_circular_configuration_aborts_bootstrap() {
  let config = Properties::from_pairs([("app.a", "${app.b}"), ("app.b", "${app.a}")]);
  let mut registry = Registry::new();
  registry
    .register(
      ComponentDescriptor::builder::<String>("title")
        .constructor(vec![DependencyRequest::value::<String>("app.a")], |args| args.value(0).map_err(Into::into))
        .build()
        .unwrap(),
    )
    .unwrap();

  match Context::new(registry, config) {
    Err(Error::Configuration { name, source }) => {
      assert_eq!(name, "title");
      assert!(matches!(source, ConfigError::Circular(key) if key == "app.a"));
    }
    Err(other) => panic!("unexpected error: {}", other),
    Ok(_) => panic!("bootstrap should fail"),
  }
}

#[test]
fn test_optional_component_reference_may_be_absent() {
  let mut registry = Registry::new();
  registry
    .register(
      ComponentDescriptor::builder::<Consumer>("consumer")
        .constructor(vec![DependencyRequest::named::<String>("version").optional()], |args| {
          let version = args
            .optional_component::<String>(0)?
            .unwrap_or_else(|| Arc::new("none".to_owned()));
          Ok(Consumer { version })
        })
        .build()
        .unwrap(),
    )
    .unwrap();

  let ctx = Context::without_config(registry).unwrap();

  assert_eq!(*ctx.get::<Consumer>().unwrap().version, "none");
}

#[test]
fn test_missing_required_reference_is_unsatisfied() {
  let mut registry = Registry::new();
  registry
    .register(
      ComponentDescriptor::builder::<Consumer>("consumer")
        .constructor(vec![DependencyRequest::component::<String>()], |args| {
          Ok(Consumer {
            version: args.component(0)?,
          })
        })
        .build()
        .unwrap(),
    )
    .unwrap();

  assert!(matches!(
    Context::without_config(registry),
    Err(Error::UnsatisfiedDependency { name, requested: None, .. }) if name == "consumer"
  ));
}
