// Client for the external AI workflow service.
// Blocking runs, streaming runs (SSE), and the run status poll all live here.
// No other module talks to the workflow service directly.

pub mod client;
pub mod events;
