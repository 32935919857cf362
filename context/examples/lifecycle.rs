use fibre_context::{
  ComponentDescriptor, Context, DependencyRequest, Hook, Instance, PostProcessor, Properties, Registry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Database {
  url: String,
  open: AtomicBool,
}

impl Database {
  fn connect(&self) {
    self.open.store(true, Ordering::SeqCst);
    println!("connected to {}", self.url);
  }

  fn disconnect(&self) {
    self.open.store(false, Ordering::SeqCst);
    println!("disconnected from {}", self.url);
  }
}

/// Logs every component as it moves through the lifecycle.
struct Audit;

impl PostProcessor for Audit {
  fn after_construction(&self, instance: Instance, name: &str) -> Instance {
    println!("constructed {} ({})", name, instance.runtime_type());
    instance
  }

  fn after_init(&self, instance: Instance, name: &str) -> Instance {
    println!("initialized {}", name);
    instance
  }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let config = Properties::from_yaml_str(
    r#"
db:
  url: postgres://localhost/app
"#,
  )?;

  let mut registry = Registry::new();
  registry
    .method::<Database, _>("disconnect", |db| {
      db.disconnect();
      Ok(())
    })
    .register(
      ComponentDescriptor::builder::<Audit>("audit")
        .constructor(vec![], |_| Ok(Audit))
        .provides::<dyn PostProcessor, _>(|a| a as Arc<dyn PostProcessor>)
        .build()?,
    )?
    .register(
      ComponentDescriptor::builder::<Database>("database")
        .constructor(
          vec![DependencyRequest::value::<String>("db.url")],
          |args| {
            Ok(Database {
              url: args.value(0)?,
              open: AtomicBool::new(false),
            })
          },
        )
        .init(Hook::call::<Database, _>(|db| {
          db.connect();
          Ok(())
        }))
        .destroy_method("disconnect")
        .build()?,
    )?;

  let mut ctx = Context::new(registry, config)?;
  let db = ctx.get::<Database>()?;
  assert!(db.open.load(Ordering::SeqCst));

  ctx.close()?;
  assert!(!db.open.load(Ordering::SeqCst));
  Ok(())
}
