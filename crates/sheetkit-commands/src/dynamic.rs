//! Dynamic command fields.
//!
//! Command metadata — label, description, the disabled flag, execution
//! state — can be supplied either as a plain value or as a function of an
//! application context, recomputed at every read. [`DynField`] is the
//! tagged union of those two shapes, and [`ContextSource`] supplies the
//! context that computed fields are resolved against.

use std::fmt;
use std::sync::Arc;

/// A field value that is either a literal or computed from a context.
///
/// Computed fields are resolved on every read, so a command's visible
/// metadata can track application state without the command being told
/// about each change. Cloning a computed field is cheap: the closure is
/// behind an [`Arc`] and is shared, not duplicated.
pub enum DynField<T, C> {
    /// A plain value.
    Literal(T),
    /// A value recomputed from the context at each read.
    Computed(Arc<dyn Fn(&C) -> T + Send + Sync>),
}

impl<T, C> DynField<T, C> {
    /// Create a computed field from a closure.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&C) -> T + Send + Sync + 'static,
    {
        DynField::Computed(Arc::new(f))
    }

    /// Check whether this field is computed.
    pub fn is_computed(&self) -> bool {
        matches!(self, DynField::Computed(_))
    }

    /// Resolve the field against a context.
    pub fn resolve(&self, context: &C) -> T
    where
        T: Clone,
    {
        match self {
            DynField::Literal(value) => value.clone(),
            DynField::Computed(f) => f(context),
        }
    }

    /// The literal value, if this field is one.
    pub fn as_literal(&self) -> Option<&T> {
        match self {
            DynField::Literal(value) => Some(value),
            DynField::Computed(_) => None,
        }
    }
}

impl<T, C> Clone for DynField<T, C>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            DynField::Literal(value) => DynField::Literal(value.clone()),
            DynField::Computed(f) => DynField::Computed(Arc::clone(f)),
        }
    }
}

impl<T, C> fmt::Debug for DynField<T, C>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynField::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DynField::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

impl<T, C> From<T> for DynField<T, C> {
    fn from(value: T) -> Self {
        DynField::Literal(value)
    }
}

impl<C> From<&str> for DynField<String, C> {
    fn from(value: &str) -> Self {
        DynField::Literal(value.to_string())
    }
}

/// Compare two fields for delta purposes.
///
/// Literal fields compare by value; a computed field on either side always
/// counts as changed, because its value may differ at any read without the
/// field itself being replaced.
pub fn field_changed<T, C>(before: &DynField<T, C>, after: &DynField<T, C>) -> bool
where
    T: PartialEq,
{
    match (before, after) {
        (DynField::Literal(a), DynField::Literal(b)) => a != b,
        _ => true,
    }
}

/// The source of the context that computed fields are resolved against.
///
/// Resolution is two-stage: the source produces a context snapshot, then
/// each computed field is applied to it. One snapshot serves a whole batch
/// of field reads, so the fields of a single command resolve against a
/// consistent view.
pub struct ContextSource<C> {
    provider: Arc<dyn Fn() -> C + Send + Sync>,
}

impl<C> ContextSource<C> {
    /// Create a context source from a provider closure.
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
    {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Take a context snapshot.
    pub fn snapshot(&self) -> C {
        (self.provider)()
    }
}

impl<C: Default + Send + Sync + 'static> Default for ContextSource<C> {
    fn default() -> Self {
        Self::new(C::default)
    }
}

impl<C> Clone for ContextSource<C> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
        }
    }
}

impl<C> fmt::Debug for ContextSource<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextSource(<fn>)")
    }
}
