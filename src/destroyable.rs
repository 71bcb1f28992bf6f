/// Releases subscriptions and running clocks that would otherwise outlive
/// their owner, e.g. a round abandoned mid-way.
pub trait Destroyable {
    fn destroy(&mut self);
}
