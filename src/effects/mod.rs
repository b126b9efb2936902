use crossterm::event::Event;
use std::io::{BufWriter, Stdout};

pub mod celebration;

pub trait Effect {
    fn update(&mut self, dt: f32);
    fn render(&mut self, stdout: &mut BufWriter<Stdout>) -> std::io::Result<()>;
    fn resize(&mut self, width: usize, height: usize);
    fn handle_event(&mut self, _event: &Event) {}
    /// Lets an effect end the run loop on its own.
    fn finished(&self) -> bool {
        false
    }
}
