//! Registry error types.

/// Errors raised by the [`ComponentRegistry`](crate::ComponentRegistry).
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The name is already bound to a different component kind.
    #[error("component name '{name}' is already registered to `{existing}`, refusing `{attempted}`")]
    DuplicateRegistration {
        name: String,
        existing: &'static str,
        attempted: &'static str,
    },

    /// Two distinct names hash to the same [`ComponentTypeId`](crate::ComponentTypeId).
    #[error("component names '{name}' and '{other}' share type id {id:#018x}")]
    TypeIdCollision { name: String, other: String, id: u64 },

    /// No kind is registered under this name.
    #[error("unknown component name '{0}'")]
    UnknownComponent(String),

    /// The instance's Rust type differs from the kind registered under its name.
    #[error("component '{name}' is registered as `{expected}`")]
    KindMismatch { name: String, expected: &'static str },

    /// Failed to encode a component to MessagePack.
    #[error("failed to encode component '{name}': {source}")]
    Encode {
        name: String,
        #[source]
        source: rmp_serde::encode::Error,
    },

    /// Failed to decode a component from MessagePack.
    #[error("failed to decode component '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: rmp_serde::decode::Error,
    },
}
