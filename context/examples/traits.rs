use fibre_context::{bean, ComponentDescriptor, Context, DependencyRequest, Properties, Registry};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Two concrete implementations
struct ConsoleLogger {
  prefix: String,
}
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[{}]: {}", self.prefix, message);
  }
}

struct SilentLogger;
impl Logger for SilentLogger {
  fn log(&self, _message: &str) {}
}

// 3. A service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  let mut registry = Registry::new();

  // Both loggers provide `dyn Logger`; the primary one is injected wherever a
  // single `dyn Logger` is requested.
  registry
    .register(
      ComponentDescriptor::builder::<ConsoleLogger>("consoleLogger")
        .primary()
        .constructor(
          vec![DependencyRequest::value::<String>("${log.prefix:CONSOLE LOG}")],
          |args| Ok(ConsoleLogger { prefix: args.value(0)? }),
        )
        .provides::<dyn Logger, _>(|l| l as Arc<dyn Logger>)
        .build()?,
    )?
    .register(
      ComponentDescriptor::builder::<SilentLogger>("silentLogger")
        .constructor(vec![], |_| Ok(SilentLogger))
        .provides::<dyn Logger, _>(|l| l as Arc<dyn Logger>)
        .build()?,
    )?
    .register(
      ComponentDescriptor::builder::<ReportService>("reportService")
        .constructor(vec![DependencyRequest::component::<dyn Logger>()], |args| {
          Ok(ReportService {
            logger: args.component(0)?,
          })
        })
        .build()?,
    )?;

  let mut ctx = Context::new(registry, Properties::from_pairs([("log.prefix", "REPORT")]))?;

  let report_service = bean!(ctx, ReportService);
  report_service.generate_report();

  println!("{} loggers registered", ctx.get_all::<dyn Logger>()?.len());
  ctx.close()?;
  Ok(())
}
