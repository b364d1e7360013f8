//! Placeholder planning.
//!
//! The planner writes the answer first, as a template with named
//! placeholders, plus one solver request per placeholder. Requests are solved
//! in dependency order: a request whose parameters mention `{other}` runs
//! after `other` is solved and sees its value. The template is then filled and
//! polished into the final answer.

mod dispatch_node;
mod integrate_node;
mod plan_node;
mod runner;
mod state;
mod steps;
mod template;

pub use runner::PlaceholderRunner;
pub use state::{PlaceholderState, PlaceholderUpdate};
pub use template::{resolution_waves, resolve_params, PlanTemplate};
