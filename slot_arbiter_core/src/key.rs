use std::fmt::Debug;
use std::hash::Hash;

/// Identity of a device or a component.
///
/// Ids are opaque to the arbiter: it only clones, hashes, compares and logs them.
pub trait Key: Clone + Eq + Hash + Debug + Send + 'static {}

impl<T> Key for T where T: Clone + Eq + Hash + Debug + Send + 'static {}
