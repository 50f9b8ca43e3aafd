//! Request shapers used by the demos.
//!
//! Each policy computes one feature of the step (the number of turns, the
//! role of the user, a state field) and picks among a fixed set of
//! alternatives. Every policy is total: a missing or malformed feature
//! selects the documented default.

mod length;
mod preferences;
mod role;

pub use length::ConversationLengthModel;
pub use preferences::PreferenceLogger;
pub use role::{RolePrompt, UserRole};
