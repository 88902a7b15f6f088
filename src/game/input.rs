//! Gameplay input signals.
//!
//! Whatever reads the actual devices lives outside this crate; it gets an
//! [`InputHandle`] and sends discrete gameplay signals over an unbounded
//! channel. The world drains the queue once per presentation frame, so
//! events may arrive at any time relative to the physics tick without racing
//! it.

use crossbeam_channel::{Receiver, Sender};

/// Discrete gameplay signals produced by a device-mapping layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Latest 2D movement vector, typically a stick or WASD state.
    Move([f32; 2]),
    /// Latest 2D look vector driving the orbit camera.
    Look([f32; 2]),
    /// Jump pressed (edge). Buffered by the jump arbiter.
    Jump,
    /// Jump released (edge). Trims a rising jump short.
    JumpCanceled,
    Attack,
    Dash,
}

/// Sending half, cloneable, handed to the input source.
#[derive(Debug, Clone)]
pub struct InputHandle {
    sender: Sender<InputEvent>,
}

impl InputHandle {
    /// Queue one event. Sending never blocks; a disconnected world drops it.
    pub fn send(&self, event: InputEvent) {
        let _ = self.sender.send(event);
    }
}

/// Receiving half owned by the game world.
#[derive(Debug)]
pub struct InputQueue {
    receiver: Receiver<InputEvent>,
}

impl InputQueue {
    /// Drain everything queued since the last frame, in arrival order.
    pub fn drain(&self) -> impl Iterator<Item = InputEvent> + '_ {
        std::iter::from_fn(move || self.receiver.try_recv().ok())
    }
}

/// Create a connected handle/queue pair.
pub fn channel() -> (InputHandle, InputQueue) {
    let (sender, receiver) = crossbeam_channel::unbounded();
    (InputHandle { sender }, InputQueue { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_drain_in_arrival_order() {
        let (handle, queue) = channel();
        handle.send(InputEvent::Move([0.0, 1.0]));
        handle.send(InputEvent::Jump);
        handle.send(InputEvent::JumpCanceled);

        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(
            drained,
            vec![
                InputEvent::Move([0.0, 1.0]),
                InputEvent::Jump,
                InputEvent::JumpCanceled
            ]
        );
        assert_eq!(queue.drain().count(), 0);
    }
}
