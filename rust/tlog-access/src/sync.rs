//! Thread-safety bounds that relax on `wasm32`.
//!
//! Collaborators such as block sources are shared across tasks on native
//! targets and therefore need `Send + Sync`. In the browser everything runs
//! on one thread, so the bounds disappear.

#[cfg(not(target_arch = "wasm32"))]
mod bounds {
    /// `Send` on native targets.
    pub trait ConditionalSend: Send {}
    impl<T: Send + ?Sized> ConditionalSend for T {}

    /// `Send + Sync` on native targets.
    pub trait ConditionalSync: Send + Sync {}
    impl<T: Send + Sync + ?Sized> ConditionalSync for T {}
}

#[cfg(target_arch = "wasm32")]
mod bounds {
    /// No bound on `wasm32`.
    pub trait ConditionalSend {}
    impl<T: ?Sized> ConditionalSend for T {}

    /// No bound on `wasm32`.
    pub trait ConditionalSync {}
    impl<T: ?Sized> ConditionalSync for T {}
}

pub use bounds::*;
