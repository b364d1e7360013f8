//! Field channels: the merge policy of each state field, declared by its type.
//!
//! A pattern state is a plain struct whose fields are channels. The field type
//! fixes how a step's partial update is merged:
//!
//! - [`LastValue`]: scalar, the update replaces the value ([`MergePolicy::Replace`]).
//! - [`Topic`]: accumulating list, updates are appended ([`MergePolicy::Append`]).
//! - [`WriteOnceMap`]: keyed results, each key is written at most once
//!   ([`MergePolicy::WriteOnce`]).
//!
//! Steps never mutate channels directly; they return an update struct and the
//! executor calls [`StateRecord::merge`](crate::state::StateRecord::merge), which
//! forwards each field to [`Channel::apply`].

mod last_value;
mod topic;
mod write_once;

pub use last_value::LastValue;
pub use topic::Topic;
pub use write_once::WriteOnceMap;

/// How a channel folds an update into its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    Replace,
    Append,
    WriteOnce,
}

/// A state field with a declared merge policy.
pub trait Channel {
    /// Partial value a step may return for this field.
    type Update;

    /// Merge policy of this channel type.
    const POLICY: MergePolicy;

    /// Folds `update` into the current value.
    fn apply(&mut self, update: Self::Update);
}
