use super::context::TickContext;

/// One stage of the daily diplomacy pass.
///
/// Object-safe so the runner can hold the stages as `Box<dyn SimSystem>` and
/// call them in a fixed order every day.
pub trait SimSystem {
    fn name(&self) -> &str;
    fn tick(&mut self, ctx: &mut TickContext);
}
