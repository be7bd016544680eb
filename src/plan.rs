/// Batches: one narration track plus its page images.
pub mod batch;
/// Saved project state for the assembly-only rerun.
pub mod project;
/// Planner segments and moods.
pub mod segment;
