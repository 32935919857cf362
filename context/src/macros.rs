//! Public macros for ergonomic component lookup.

/// Looks up a component from a [`Context`](crate::Context), panicking if it
/// cannot be found.
///
/// # Panics
///
/// This macro will panic if the component cannot be resolved. For a
/// non-panicking version, use [`maybe_bean!`] or `Context::get` directly.
///
/// # Examples
///
/// ```
/// use fibre_context::{bean, ComponentDescriptor, Context, Registry};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let mut registry = Registry::new();
/// registry
///     .register(
///         ComponentDescriptor::builder::<EnglishGreeter>("greeter")
///             .constructor(vec![], |_| Ok(EnglishGreeter))
///             .provides::<dyn Greeter, _>(|g| g as Arc<dyn Greeter>)
///             .build()
///             .unwrap(),
///     )
///     .unwrap();
/// let ctx = Context::without_config(registry).unwrap();
///
/// let greeter = bean!(ctx, trait Greeter);
/// assert_eq!(greeter.greet(), "Hello!");
///
/// let concrete = bean!(ctx, EnglishGreeter, "greeter");
/// assert_eq!(concrete.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! bean {
    // Trait object by type: bean!(ctx, trait MyTrait)
    ($ctx:expr, trait $trait_ident:ident) => {
        $ctx.get::<dyn $trait_ident>().unwrap_or_else(|e| {
            panic!(
                "Failed to resolve required component {}: {}",
                std::any::type_name::<dyn $trait_ident>(),
                e
            )
        })
    };

    // Trait object by name: bean!(ctx, trait MyTrait, "name")
    ($ctx:expr, trait $trait_ident:ident, $name:expr) => {
        $ctx.get_named::<dyn $trait_ident>($name).unwrap_or_else(|e| {
            panic!(
                "Failed to resolve required component '{}' as {}: {}",
                $name,
                std::any::type_name::<dyn $trait_ident>(),
                e
            )
        })
    };

    // Concrete type: bean!(ctx, MyService)
    ($ctx:expr, $type:ty) => {
        $ctx.get::<$type>().unwrap_or_else(|e| {
            panic!(
                "Failed to resolve required component {}: {}",
                std::any::type_name::<$type>(),
                e
            )
        })
    };

    // Named concrete type: bean!(ctx, MyService, "name")
    ($ctx:expr, $type:ty, $name:expr) => {
        $ctx.get_named::<$type>($name).unwrap_or_else(|e| {
            panic!(
                "Failed to resolve required component '{}' as {}: {}",
                $name,
                std::any::type_name::<$type>(),
                e
            )
        })
    };
}

/// Like [`bean!`], but evaluates to an `Option` instead of panicking.
#[macro_export]
macro_rules! maybe_bean {
    ($ctx:expr, trait $trait_ident:ident) => {
        $ctx.get::<dyn $trait_ident>().ok()
    };
    ($ctx:expr, trait $trait_ident:ident, $name:expr) => {
        $ctx.get_named::<dyn $trait_ident>($name).ok()
    };
    ($ctx:expr, $type:ty) => {
        $ctx.get::<$type>().ok()
    };
    ($ctx:expr, $type:ty, $name:expr) => {
        $ctx.get_named::<$type>($name).ok()
    };
}
