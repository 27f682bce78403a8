//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values; two
/// GSTINs with the same characters are the same GSTIN. To "modify" one,
/// construct a new value.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
