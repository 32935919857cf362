use fibre_context::{bean, ComponentDescriptor, Context, DependencyRequest, Error, Registry};
use std::panic;

struct UnregisteredService;

struct NeedsVersion {
  #[allow(dead_code)]
  version: String,
}

fn main() {
  let ctx = Context::without_config(Registry::new()).expect("an empty context always starts");

  // --- Using the panicking `bean!` macro ---
  println!("Attempting to look up a component that was never registered...");

  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    // This line will panic!
    let _service = bean!(ctx, UnregisteredService);
  }));

  assert!(result.is_err(), "bean! should have panicked.");
  println!("Successfully caught the expected panic from bean!.");

  // --- Using the fallible `get()` method ---
  match ctx.get::<UnregisteredService>() {
    Ok(_) => panic!("Should not have found the component!"),
    Err(e) => println!("Correctly received an error: {}", e),
  }

  // --- A missing dependency aborts the whole bootstrap ---
  let mut registry = Registry::new();
  registry
    .register(
      ComponentDescriptor::builder::<NeedsVersion>("needsVersion")
        .constructor(vec![DependencyRequest::named::<String>("version")], |args| {
          Ok(NeedsVersion {
            version: (*args.component::<String>(0)?).clone(),
          })
        })
        .build()
        .expect("descriptor is well-formed"),
    )
    .expect("name is unique");

  match Context::without_config(registry) {
    Err(e @ Error::UnsatisfiedDependency { .. }) => println!("Bootstrap failed as expected: {}", e),
    Err(e) => panic!("unexpected error: {}", e),
    Ok(_) => panic!("bootstrap should have failed"),
  }
}
