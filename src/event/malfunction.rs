//! Malfunction event
//!
//! Counts down a delay, then requests that items matching a tag break. The
//! session controller decides which concrete items fail.

use crate::event::{EventContext, MalfunctionCommand};

#[derive(Debug)]
pub struct MalfunctionEvent {
    item_tag: String,
    countdown: f32,
}

impl MalfunctionEvent {
    pub fn new(item_tag: String, delay: f32) -> MalfunctionEvent {
        MalfunctionEvent {
            item_tag,
            countdown: delay.max(0.0),
        }
    }

    pub fn item_tag(&self) -> &str {
        &self.item_tag
    }

    /// Returns true once the malfunction has been issued
    pub fn update(&mut self, delta_time: f32, ctx: &mut EventContext<'_>) -> bool {
        self.countdown -= delta_time;
        if self.countdown > 0.0 {
            return false;
        }
        ctx.outbox.malfunctions.push(MalfunctionCommand {
            item_tag: self.item_tag.clone(),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventOutbox;
    use crate::world::{Level, WorldSnapshot};

    #[test]
    fn test_fires_after_delay() {
        let level = Level::test_level("seed", 10.0);
        let world = WorldSnapshot::default();
        let mut outbox = EventOutbox::default();
        let mut event = MalfunctionEvent::new("junctionbox".to_string(), 2.0);

        let mut ctx = EventContext {
            level: &level,
            world: &world,
            outbox: &mut outbox,
        };
        assert!(!event.update(1.0, &mut ctx));
        assert!(ctx.outbox.malfunctions.is_empty());

        assert!(event.update(1.5, &mut ctx));
        assert_eq!(outbox.malfunctions.len(), 1);
        assert_eq!(outbox.malfunctions[0].item_tag, "junctionbox");
    }

    #[test]
    fn test_zero_delay_fires_on_first_update() {
        let level = Level::test_level("seed", 10.0);
        let world = WorldSnapshot::default();
        let mut outbox = EventOutbox::default();
        let mut event = MalfunctionEvent::new("pump".to_string(), 0.0);
        let mut ctx = EventContext {
            level: &level,
            world: &world,
            outbox: &mut outbox,
        };
        assert!(event.update(0.016, &mut ctx));
    }
}
