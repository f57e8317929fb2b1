//! Typed live variables.

use std::fmt;
use std::sync::{Arc, Weak};

use glam::{Quat, Vec2, Vec3, Vec4};
use parking_lot::Mutex;
use serde_json::Value;

use super::{Registry, RegistryError, VarId, bag};
use crate::codec::{CodecError, Color, ValueKind, VarValue};

/// Group used when none is given.
pub const DEFAULT_GROUP: &str = "default";

/// Change hook fired after every assignment or load.
pub type ChangeFn = Arc<dyn Fn() + Send + Sync>;

mod sealed {
    pub trait Sealed {}
}

/// Types a [`Var`] can hold.
///
/// Sealed: the set is fixed to the variants of [`VarValue`], so every type
/// the registry can store also has an encoding.
pub trait VarType: sealed::Sealed + Clone + Send + Sync + 'static {
    const KIND: ValueKind;

    fn into_value(self) -> VarValue;

    fn from_value(value: VarValue) -> Option<Self>;
}

macro_rules! var_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl VarType for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn into_value(self) -> VarValue {
                    VarValue::$variant(self)
                }

                fn from_value(value: VarValue) -> Option<Self> {
                    match value {
                        VarValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }

            impl From<&Var<$ty>> for $ty {
                fn from(var: &Var<$ty>) -> Self {
                    var.get()
                }
            }
        )*
    };
}

var_type! {
    bool => Bool,
    i32 => Int,
    f32 => Float,
    String => String,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Quat => Quat,
    Color => Color,
}

/// Value storage shared between a [`Var`] and its registry entry.
pub(crate) struct VarCell<T> {
    value: Mutex<T>,
    on_change: Mutex<Option<ChangeFn>>,
    min: f32,
    max: f32,
}

impl<T: VarType> VarCell<T> {
    fn new(value: T, min: f32, max: f32) -> Self {
        Self {
            value: Mutex::new(value),
            on_change: Mutex::new(None),
            min,
            max,
        }
    }

    fn get(&self) -> T {
        self.value.lock().clone()
    }

    /// Store and notify. Equal values still notify.
    fn assign(&self, value: T) {
        *self.value.lock() = value;
        self.notify();
    }

    fn notify(&self) {
        // Clone out so the hook may read or reassign this variable
        let callback = self.on_change.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Type-erased access used by the registry for save and load.
pub(crate) trait Slot: Send + Sync {
    fn kind(&self) -> ValueKind;

    fn range(&self) -> (f32, f32);

    fn value(&self) -> VarValue;

    fn encode(&self) -> Value {
        self.value().encode()
    }

    /// Decode `node` and assign the result, firing the change hook.
    fn decode(&self, node: &Value) -> Result<(), CodecError>;
}

impl<T: VarType> Slot for VarCell<T> {
    fn kind(&self) -> ValueKind {
        T::KIND
    }

    fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    fn value(&self) -> VarValue {
        self.get().into_value()
    }

    fn decode(&self, node: &Value) -> Result<(), CodecError> {
        let decoded = VarValue::decode(T::KIND, node)?;
        let found = decoded.kind();
        let value = T::from_value(decoded).ok_or(CodecError::KindMismatch {
            expected: T::KIND.type_name(),
            found: found.type_name(),
        })?;
        self.assign(value);
        Ok(())
    }
}

/// Options for creating a [`Var`].
#[derive(Debug, Clone)]
pub struct VarBuilder {
    name: String,
    group: String,
    min: f32,
    max: f32,
}

impl VarBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: DEFAULT_GROUP.to_string(),
            min: 0.0,
            max: 1.0,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Editor hint range. Values outside it are not clamped.
    pub fn range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Register with the process-wide registry.
    pub fn register<T: VarType>(self, value: T) -> Var<T> {
        self.register_in(bag(), value)
    }

    /// Register with `registry`.
    ///
    /// If `(group, name)` is already taken the error is logged and the
    /// variable is returned unregistered: it still works as a value but is
    /// never saved or loaded.
    pub fn register_in<T: VarType>(self, registry: &Arc<Registry>, value: T) -> Var<T> {
        let mut var = self.build(value);
        let _ = var.attach(registry);
        var
    }

    /// Register with `registry`, failing instead of returning an orphan.
    pub fn try_register_in<T: VarType>(
        self,
        registry: &Arc<Registry>,
        value: T,
    ) -> Result<Var<T>, RegistryError> {
        let mut var = self.build(value);
        var.attach(registry)?;
        Ok(var)
    }

    fn build<T: VarType>(self, value: T) -> Var<T> {
        Var {
            cell: Arc::new(VarCell::new(value, self.min, self.max)),
            name: self.name,
            group: self.group,
            id: None,
            owner: Weak::new(),
        }
    }
}

/// A named, typed value that is saved to and reloaded from the registry's
/// backing file.
///
/// ```no_run
/// use livevar::{Var, bag};
///
/// bag().set_filepath("live_vars.json").unwrap();
///
/// let radius = Var::grouped(0.0_f32, "radius", "disk");
/// radius.set_callback(|| println!("radius changed"), false);
/// radius.set(12.5);
/// bag().save().unwrap();
/// ```
pub struct Var<T: VarType> {
    cell: Arc<VarCell<T>>,
    name: String,
    group: String,
    id: Option<VarId>,
    owner: Weak<Registry>,
}

impl<T: VarType> Var<T> {
    /// Create in the default group of the process-wide registry.
    pub fn new(value: T, name: impl Into<String>) -> Self {
        VarBuilder::new(name).register(value)
    }

    /// Create in `group` of the process-wide registry.
    pub fn grouped(value: T, name: impl Into<String>, group: impl Into<String>) -> Self {
        VarBuilder::new(name).group(group).register(value)
    }

    pub fn builder(name: impl Into<String>) -> VarBuilder {
        VarBuilder::new(name)
    }

    /// Current value. `T::from(&var)` is equivalent.
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Assign and fire the change hook, even if the value is unchanged.
    pub fn set(&self, value: T) {
        self.cell.assign(value);
    }

    /// Replace the change hook, optionally firing it right away.
    pub fn set_callback(&self, callback: impl Fn() + Send + Sync + 'static, invoke_now: bool) {
        let callback: ChangeFn = Arc::new(callback);
        *self.cell.on_change.lock() = Some(callback);
        if invoke_now {
            self.cell.notify();
        }
    }

    pub fn clear_callback(&self) {
        *self.cell.on_change.lock() = None;
    }

    /// Fire the change hook without changing the value.
    pub fn notify(&self) {
        self.cell.notify();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn min(&self) -> f32 {
        self.cell.min
    }

    pub fn max(&self) -> f32 {
        self.cell.max
    }

    pub fn kind(&self) -> ValueKind {
        T::KIND
    }

    /// Registration handle, `None` for orphaned variables.
    pub fn id(&self) -> Option<VarId> {
        self.id
    }

    pub fn is_registered(&self) -> bool {
        self.id.is_some()
    }

    /// The registry this variable belongs to, if it is registered and alive.
    pub fn registry(&self) -> Option<Arc<Registry>> {
        self.owner.upgrade()
    }

    fn attach(&mut self, registry: &Arc<Registry>) -> Result<VarId, RegistryError> {
        let slot: Weak<dyn Slot> = Arc::downgrade(&self.cell) as Weak<VarCell<T>>;
        let id = registry.emplace(slot, &self.name, &self.group)?;
        self.id = Some(id);
        self.owner = Arc::downgrade(registry);
        Ok(id)
    }
}

impl<T: VarType> Drop for Var<T> {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(owner) = self.owner.upgrade() {
            // A miss is logged by the registry
            let _ = owner.unregister(id);
        }
    }
}

impl<T: VarType + PartialEq> PartialEq<T> for Var<T> {
    fn eq(&self, other: &T) -> bool {
        *self.cell.value.lock() == *other
    }
}

impl<T: VarType> fmt::Display for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get().into_value())
    }
}

impl<T: VarType + fmt::Debug> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("group", &self.group)
            .field("name", &self.name)
            .field("value", &self.get())
            .field("id", &self.id)
            .finish()
    }
}
