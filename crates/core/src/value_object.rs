//! Value object marker.

/// Marker for values compared by content rather than identity (marks, grades).
///
/// Implementors validate on construction so that holding one is proof the value
/// is in range.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
