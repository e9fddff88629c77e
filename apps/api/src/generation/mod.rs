// Generation engine: the orchestrator state machine, the locale-aware word
// counter, the deterministic fallback assembly and the generate endpoints.
// All workflow calls go through the workflow client — no direct HTTP here.

pub mod fallback;
pub mod handlers;
pub mod orchestrator;
pub mod wordcount;
