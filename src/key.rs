use core::fmt;

use crate::any::TypeInfo;

/// Qualifier attached to a binding in addition to its type.
///
/// A named binding is a standalone value distinguished from other values of
/// the same type. A group binding contributes one element to the collection
/// of all values registered under the same group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Qualifier {
    Name(&'static str),
    Group(&'static str),
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Name(name) => write!(f, "name:\"{name}\""),
            Qualifier::Group(group) => write!(f, "group:\"{group}\""),
        }
    }
}

/// Key requested for a single constructor parameter.
///
/// `ParamKey::none()` requests the unqualified binding of the parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamKey(Option<Qualifier>);

impl ParamKey {
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    #[inline]
    #[must_use]
    pub const fn name(name: &'static str) -> Self {
        Self(Some(Qualifier::Name(name)))
    }

    #[inline]
    #[must_use]
    pub const fn group(group: &'static str) -> Self {
        Self(Some(Qualifier::Group(group)))
    }

    #[inline]
    #[must_use]
    pub(crate) const fn qualifier(self) -> Option<Qualifier> {
        self.0
    }
}

impl Default for ParamKey {
    fn default() -> Self {
        Self::none()
    }
}

/// Full identity of a binding: the provided type plus an optional qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BindingKey {
    pub(crate) type_info: TypeInfo,
    pub(crate) qualifier: Option<Qualifier>,
}

impl BindingKey {
    #[inline]
    #[must_use]
    pub(crate) fn of<T: ?Sized + 'static>(qualifier: Option<Qualifier>) -> Self {
        Self {
            type_info: TypeInfo::of::<T>(),
            qualifier,
        }
    }

    #[inline]
    #[must_use]
    pub(crate) const fn new(type_info: TypeInfo, qualifier: Option<Qualifier>) -> Self {
        Self { type_info, qualifier }
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(qualifier) => write!(f, "{}[{qualifier}]", self.type_info.name),
            None => write!(f, "{}", self.type_info.name),
        }
    }
}
