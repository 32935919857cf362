//! # Fibre Context
//!
//! An ordered-bootstrap Inversion of Control (IoC) context for Rust.
//!
//! Components are described up front as [`ComponentDescriptor`]s in a
//! [`Registry`]. Building a [`Context`] from the registry assembles the whole
//! singleton graph at once: configuration factories are created first, then
//! post-processors, then everything else, each group in ascending
//! `(order, name)`. Once every component is constructed, fields and setters are
//! injected and init hooks run. Closing the context runs the destroy hooks.
//!
//! ## Core Concepts
//!
//! - **Descriptor**: name, declared type, creation mechanism (constructor or
//!   factory on another component), order, primary flag, hooks and injection points.
//! - **Contracts**: a component declared as `T` may also provide other types,
//!   typically `dyn Trait`, and is resolvable as any of them.
//! - **Primary**: when several components match a type, the single primary one wins.
//! - **Post-processors**: components providing `dyn PostProcessor` can replace
//!   other components after construction and after init, or redirect injection
//!   to a different object.
//! - **Configuration**: dependencies can be `${key:default}` values resolved
//!   through a [`ConfigResolver`], such as [`Properties`].
//!
//! ## Quick Start
//!
//! ```
//! use fibre_context::{bean, ComponentDescriptor, Context, DependencyRequest, Properties, Registry};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!     message: String,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         self.message.clone()
//!     }
//! }
//!
//! fn main() -> Result<(), fibre_context::Error> {
//!     let mut registry = Registry::new();
//!     registry.register(
//!         ComponentDescriptor::builder::<EnglishGreeter>("greeter")
//!             .constructor(
//!                 vec![DependencyRequest::value::<String>("${greeting:Hello, World!}")],
//!                 |args| Ok(EnglishGreeter { message: args.value(0)? }),
//!             )
//!             .provides::<dyn Greeter, _>(|g| g as Arc<dyn Greeter>)
//!             .build()?,
//!     )?;
//!
//!     let mut ctx = Context::new(registry, Properties::new())?;
//!
//!     let greeter = bean!(ctx, trait Greeter);
//!     assert_eq!(greeter.greet(), "Hello, World!");
//!
//!     ctx.close()
//! }
//! ```

mod assembler;
pub mod config;
mod container;
mod core;
mod descriptor;
mod error;
mod injector;
mod lifecycle;
mod macros;
mod processor;
mod registry;
mod resolver;

pub use crate::core::{Instance, TypeInfo};
pub use config::{ConfigError, ConfigResolver, ConfigType, ConfigValue, Properties, ValueType};
pub use container::Context;
pub use descriptor::{
  Args, Argument, Assign, Callable, ComponentDescriptor, Constructor, Creation, DependencyRequest,
  DescriptorBuilder, FactoryOperation, Hook, InjectionPoint, LifecycleState, MemberKind, Reference,
  Source,
};
pub use error::{BoxError, Error, Result};
pub use processor::{PostProcessor, PostProcessorChain};
pub use registry::Registry;
pub use resolver::Resolver;
