/// Something that reacts to events of type `T`, such as the history recorder.
pub trait EventHandler<T> {
    fn handle_event(&mut self, event: &T);
}
