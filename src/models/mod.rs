//! Domain models for taskmaster.
//!
//! - [`Task`]: A stored action item with an immutable integer id.
//! - [`RawItem`]: An extracted item with every field optional, as it arrives
//!   from an LLM, a legacy JSON file, or manual entry.
//! - [`NewTask`]: A normalized item with all defaults filled in, ready to store.

mod item;
mod task;

pub use item::*;
pub use task::*;
