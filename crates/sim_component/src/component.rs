//! Typed component cells and the traits that identify component kinds.
//!
//! A component kind is the pairing of a payload type `T` with an empty tag
//! type `Tag`: `Component<String, EngineTypeTag>` and
//! `Component<String, NameTag>` hold the same payload but are different
//! kinds. The tag carries the kind's globally unique string name, which is
//! what the [`ComponentRegistry`](crate::ComponentRegistry) indexes.
//!
//! ## Type Identity
//!
//! [`ComponentTypeId`] is derived from the kind's **string name** using the
//! FNV-1a 64-bit hash algorithm. This is deterministic and language-neutral,
//! so bindings and serialised snapshots can refer to a kind without knowing
//! its Rust type.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A unique identifier for a component kind, derived from its registered
/// name using the FNV-1a 64-bit hash algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] from a component's string name.
    ///
    /// # Algorithm (FNV-1a 64-bit)
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325          (offset basis)
    /// for each byte in name.as_bytes():
    ///     hash = hash XOR byte
    ///     hash = hash * 0x00000100000001b3  (prime)
    /// return hash
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentTypeId`] for the component kind `K`.
    #[must_use]
    pub fn of<K: ComponentKind>() -> Self {
        Self::from_name(K::NAME)
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Bounds every component payload must satisfy.
///
/// Equality is required so that cells can be compared and unchanged writes
/// detected; serde support is required so the registry can snapshot any kind
/// by name.
pub trait ComponentData:
    Clone + Default + PartialEq + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

impl<T> ComponentData for T where
    T: Clone + Default + PartialEq + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

/// A marker type distinguishing one component kind from another.
///
/// Tags are normally uninhabited enums generated by [`component!`](crate::component).
pub trait ComponentTag: 'static {
    /// Globally unique name of the kind this tag marks.
    const NAME: &'static str;
}

/// A storage cell holding one typed payload plus a "changed" flag.
///
/// The flag is raised by [`Component::set_data`] and cleared either by the
/// reader ([`Component::take_changed`]) or by the entity-component manager at
/// the step boundary.
pub struct Component<T, Tag> {
    data: T,
    changed: bool,
    _tag: PhantomData<fn() -> Tag>,
}

impl<T: ComponentData, Tag: ComponentTag> Component<T, Tag> {
    /// Wrap a payload. A freshly built cell is not marked changed.
    #[must_use]
    pub fn new(data: T) -> Self {
        Self {
            data,
            changed: false,
            _tag: PhantomData,
        }
    }

    /// The registered name of this kind.
    #[must_use]
    pub fn name() -> &'static str {
        Tag::NAME
    }

    /// Read access to the payload.
    #[must_use]
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Replace the payload and mark the cell changed.
    pub fn set_data(&mut self, data: T) {
        self.data = data;
        self.changed = true;
    }

    /// Consume the cell, returning its payload.
    #[must_use]
    pub fn into_data(self) -> T {
        self.data
    }

    /// Returns `true` if the payload was written since the flag was last cleared.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Returns the changed flag and clears it.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Clear the changed flag.
    pub fn clear_changed(&mut self) {
        self.changed = false;
    }
}

impl<T: ComponentData, Tag: ComponentTag> From<T> for Component<T, Tag> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

impl<T: ComponentData, Tag: ComponentTag> Clone for Component<T, Tag> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            changed: self.changed,
            _tag: PhantomData,
        }
    }
}

impl<T: ComponentData, Tag: ComponentTag> Default for Component<T, Tag> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Two cells are equal when their payloads are equal; the flag is ignored.
impl<T: ComponentData, Tag: ComponentTag> PartialEq for Component<T, Tag> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T: ComponentData, Tag: ComponentTag> fmt::Debug for Component<T, Tag> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &Tag::NAME)
            .field("data", &self.data)
            .field("changed", &self.changed)
            .finish()
    }
}

impl<T: ComponentData, Tag: ComponentTag> Serialize for Component<T, Tag> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<'de, T: ComponentData, Tag: ComponentTag> Deserialize<'de> for Component<T, Tag> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::new)
    }
}

/// Statically typed view of a component kind, used by the generic
/// entity-component manager API (`ecm.component::<EngineType>(e)`).
pub trait ComponentKind:
    AnyComponent + Clone + Default + PartialEq + Serialize + DeserializeOwned
{
    /// The payload type.
    type Data: ComponentData;

    /// Globally unique name of this kind.
    const NAME: &'static str;

    /// Build a cell from a payload.
    fn from_data(data: Self::Data) -> Self;

    /// Borrow the payload.
    fn payload(&self) -> &Self::Data;

    /// Replace the payload, marking the cell changed.
    fn set_payload(&mut self, data: Self::Data);

    /// Consume the cell, returning its payload.
    fn into_payload(self) -> Self::Data;

    /// Returns the [`ComponentTypeId`] for this kind.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::NAME)
    }
}

impl<T: ComponentData, Tag: ComponentTag> ComponentKind for Component<T, Tag> {
    type Data = T;
    const NAME: &'static str = Tag::NAME;

    fn from_data(data: T) -> Self {
        Self::new(data)
    }

    fn payload(&self) -> &T {
        &self.data
    }

    fn set_payload(&mut self, data: T) {
        self.set_data(data);
    }

    fn into_payload(self) -> T {
        self.data
    }
}

/// Type-erased view of a component cell.
///
/// This is what generic code (registry, snapshots, bindings) holds when it
/// does not know the payload type at compile time.
pub trait AnyComponent: Any + Send + Sync + fmt::Debug {
    /// Registered name of the kind.
    fn dyn_name(&self) -> &'static str;

    /// [`ComponentTypeId`] of the kind.
    fn dyn_type_id(&self) -> ComponentTypeId;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Deep copy behind a fresh box.
    fn clone_boxed(&self) -> Box<dyn AnyComponent>;

    /// Payload equality across erased cells. Cells of different kinds are never equal.
    fn eq_dyn(&self, other: &dyn AnyComponent) -> bool;

    /// Encode the payload as MessagePack with named fields.
    fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error>;

    fn is_changed(&self) -> bool;

    fn clear_changed(&mut self);
}

impl<T: ComponentData, Tag: ComponentTag> AnyComponent for Component<T, Tag> {
    fn dyn_name(&self) -> &'static str {
        Tag::NAME
    }

    fn dyn_type_id(&self) -> ComponentTypeId {
        ComponentTypeId::from_name(Tag::NAME)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_boxed(&self) -> Box<dyn AnyComponent> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn AnyComponent) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| self.data == other.data)
    }

    fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(&self.data)
    }

    fn is_changed(&self) -> bool {
        self.changed
    }

    fn clear_changed(&mut self) {
        self.changed = false;
    }
}

impl dyn AnyComponent {
    /// Downcast to a concrete kind.
    #[must_use]
    pub fn downcast_ref<K: ComponentKind>(&self) -> Option<&K> {
        self.as_any().downcast_ref::<K>()
    }

    /// Mutably downcast to a concrete kind.
    #[must_use]
    pub fn downcast_mut<K: ComponentKind>(&mut self) -> Option<&mut K> {
        self.as_any_mut().downcast_mut::<K>()
    }

    /// Returns `true` if this cell holds kind `K`.
    #[must_use]
    pub fn is<K: ComponentKind>(&self) -> bool {
        self.as_any().is::<K>()
    }
}

impl Clone for Box<dyn AnyComponent> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// Declare one or more component kinds.
///
/// Each declaration produces an uninhabited tag type carrying the kind's
/// registered name and a type alias for the cell. The payload bounds are
/// checked at the declaration site, so a payload without `PartialEq` (or any
/// other [`ComponentData`] bound) is rejected where the kind is defined.
///
/// The declaration is also the kind's registration: it is bound in
/// [`ComponentRegistry::global`](crate::ComponentRegistry::global) as soon as
/// that registry starts, whether or not the type is ever named in code.
///
/// ```rust
/// use sim_component::{component, ComponentKind};
///
/// component! {
///     /// The physics engine driving the world.
///     pub type EngineType = Component<String, EngineTypeTag>, "sim.components.EngineType";
/// }
///
/// let engine = EngineType::new("ode".to_string());
/// assert_eq!(engine.data(), "ode");
/// assert_eq!(<EngineType as ComponentKind>::NAME, "sim.components.EngineType");
///
/// let registry = sim_component::ComponentRegistry::global();
/// assert!(registry.construct("sim.components.EngineType").is_ok());
/// ```
#[macro_export]
macro_rules! component {
    ($(
        $(#[$meta:meta])*
        $vis:vis type $name:ident = Component<$data:ty, $tag:ident>, $key:literal;
    )*) => {$(
        #[doc = concat!("Tag marking the [`", stringify!($name), "`] component kind.")]
        #[derive(Debug)]
        $vis enum $tag {}

        impl $crate::ComponentTag for $tag {
            const NAME: &'static str = $key;
        }

        $(#[$meta])*
        $vis type $name = $crate::Component<$data, $tag>;

        const _: fn() = || {
            fn assert_component_data<T: $crate::ComponentData>() {}
            assert_component_data::<$data>();
        };

        $crate::inventory::submit! {
            $crate::ComponentRegistration::new(
                $crate::ComponentRegistry::register::<$crate::Component<$data, $tag>>
            )
        }
    )*};
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::component! {
        type Label = Component<String, LabelTag>, "test.Label";
        type Alias = Component<String, AliasTag>, "test.Alias";
        type Mass = Component<f64, MassTag>, "test.Mass";
    }

    #[test]
    fn test_component_type_id_is_stable() {
        assert_eq!(ComponentTypeId::of::<Label>(), ComponentTypeId::of::<Label>());
        assert_eq!(
            ComponentTypeId::of::<Label>(),
            ComponentTypeId::from_name("test.Label")
        );
    }

    #[test]
    fn test_fnv1a_known_vector() {
        // FNV-1a 64-bit of empty string is the offset basis itself.
        assert_eq!(
            ComponentTypeId::from_name(""),
            ComponentTypeId(0xcbf2_9ce4_8422_2325)
        );
        // "a" is a published FNV-1a 64 test vector.
        assert_eq!(
            ComponentTypeId::from_name("a"),
            ComponentTypeId(0xaf63_dc4c_8601_ec8c)
        );
    }

    #[test]
    fn test_same_payload_different_tag_are_distinct_kinds() {
        assert_ne!(Label::component_type_id(), Alias::component_type_id());
        let label: Box<dyn AnyComponent> = Box::new(Label::new("x".into()));
        let alias: Box<dyn AnyComponent> = Box::new(Alias::new("x".into()));
        assert!(!label.eq_dyn(alias.as_ref()));
        assert!(label.downcast_ref::<Alias>().is_none());
    }

    #[test]
    fn test_set_data_marks_changed() {
        let mut mass = Mass::new(1.0);
        assert!(!mass.is_changed());
        mass.set_data(2.5);
        assert_eq!(*mass.data(), 2.5);
        assert!(mass.is_changed());
        assert!(mass.take_changed());
        assert!(!mass.is_changed());
    }

    #[test]
    fn test_equality_ignores_changed_flag() {
        let a = Mass::new(3.0);
        let mut b = Mass::new(0.0);
        b.set_data(3.0);
        assert_eq!(a, b);
        assert_ne!(a, Mass::new(4.0));
    }

    #[test]
    fn test_erased_clone_and_downcast() {
        let original: Box<dyn AnyComponent> = Box::new(Label::new("base".into()));
        let copy = original.clone();
        assert!(copy.is::<Label>());
        assert_eq!(copy.downcast_ref::<Label>().unwrap().data(), "base");
        assert!(original.eq_dyn(copy.as_ref()));
        assert_eq!(copy.dyn_name(), "test.Label");
    }

    #[test]
    fn test_msgpack_encodes_payload_only() {
        let label = Label::new("ode".into());
        let bytes = label.to_msgpack().unwrap();
        let decoded: String = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(decoded, "ode");
    }

    #[test]
    fn test_default_is_default_payload() {
        assert_eq!(Mass::default().into_data(), 0.0);
        assert_eq!(Label::name(), "test.Label");
    }
}
