//! Caller-side speed accumulation.
//!
//! The engine takes an absolute speed; players build it up by alternating
//! left and right steps. This model turns steps into the speed values a
//! client submits, with the same decay and knockback recoil every client
//! uses, so bots and humans produce comparable input.

use dinodash_core::game_trait::PlayerId;
use dinodash_core::time::{Millis, elapsed_since};

use crate::config::StrideConfig;
use crate::state::GameEvent;

/// Which foot a step uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foot {
    Left,
    Right,
}

impl Foot {
    pub fn other(self) -> Self {
        match self {
            Foot::Left => Foot::Right,
            Foot::Right => Foot::Left,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StrideModel {
    config: StrideConfig,
    knockback_speed: f32,
    speed: f32,
    expected: Foot,
    last_step_at: Millis,
    last_sent: f32,
    last_send_at: Millis,
}

impl StrideModel {
    pub fn new(config: StrideConfig, knockback_speed: f32) -> Self {
        Self {
            config,
            knockback_speed,
            speed: 0.0,
            expected: Foot::Right,
            last_step_at: 0,
            last_sent: 0.0,
            last_send_at: 0,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Register a step. Only alternating steps add speed; repeating the same
    /// foot is ignored.
    pub fn step(&mut self, foot: Foot, now: Millis) -> bool {
        if foot != self.expected {
            return false;
        }
        self.speed += self.config.step_gain;
        self.expected = foot.other();
        self.last_step_at = now;
        true
    }

    /// Recoil when one of this tick's events involves `player_id`.
    pub fn observe_events(&mut self, events: &[GameEvent], player_id: PlayerId) {
        if events.iter().any(|e| e.player_id == player_id) {
            self.speed = self.knockback_speed;
        }
    }

    /// Per-frame decay. Forward speed bleeds off slowly and stops entirely
    /// after an idle period; recoil fades quickly.
    pub fn frame(&mut self, now: Millis) {
        if self.speed > 0.0 {
            self.speed *= self.config.forward_decay;
            if self.speed < self.config.idle_stop_speed
                && elapsed_since(now, self.last_step_at) > self.config.idle_stop_ms
            {
                self.speed = 0.0;
            }
        } else if self.speed < 0.0 {
            self.speed *= self.config.recoil_decay;
        }
    }

    /// The speed to submit now, if it changed and the send interval allows.
    pub fn poll_send(&mut self, now: Millis) -> Option<f32> {
        if elapsed_since(now, self.last_send_at) <= self.config.send_interval_ms
            || self.speed == self.last_sent
        {
            return None;
        }
        self.last_sent = self.speed;
        self.last_send_at = now;
        Some(self.speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EventKind, Item};

    fn model() -> StrideModel {
        StrideModel::new(StrideConfig::default(), -20.0)
    }

    #[test]
    fn alternating_steps_accumulate() {
        let mut m = model();
        assert!(m.step(Foot::Right, 10));
        assert!(m.step(Foot::Left, 20));
        assert!(m.step(Foot::Right, 30));
        assert_eq!(m.speed(), 3.0);
    }

    #[test]
    fn repeated_foot_is_ignored() {
        let mut m = model();
        assert!(!m.step(Foot::Left, 10), "first step must be the right foot");
        assert!(m.step(Foot::Right, 20));
        assert!(!m.step(Foot::Right, 30));
        assert_eq!(m.speed(), 1.0);
    }

    #[test]
    fn forward_speed_decays_then_stops_when_idle() {
        let mut m = model();
        m.step(Foot::Right, 0);
        m.frame(100);
        assert!((m.speed() - 0.995).abs() < 1e-6);

        m.speed = 0.09;
        m.frame(500);
        assert!(m.speed() > 0.0, "not idle long enough yet");
        m.frame(1_001);
        assert_eq!(m.speed(), 0.0);
    }

    #[test]
    fn knockback_recoils_then_fades() {
        let mut m = model();
        m.step(Foot::Right, 0);
        let events = [GameEvent {
            cell_index: 12,
            item: Item::Rocks,
            player_id: 3,
            kind: EventKind::Hit,
        }];
        m.observe_events(&events, 4);
        assert_eq!(m.speed(), 1.0, "other players' events are ignored");
        m.observe_events(&events, 3);
        assert_eq!(m.speed(), -20.0);
        m.frame(10);
        assert_eq!(m.speed(), -15.0);
    }

    #[test]
    fn sends_only_changes_at_limited_rate() {
        let mut m = model();
        assert_eq!(m.poll_send(1_000), None, "nothing changed yet");
        m.step(Foot::Right, 1_000);
        assert_eq!(m.poll_send(1_000), Some(1.0));
        m.step(Foot::Left, 1_050);
        assert_eq!(m.poll_send(1_100), None, "rate limited");
        assert_eq!(m.poll_send(1_201), Some(2.0));
        assert_eq!(m.poll_send(1_500), None, "unchanged");
    }
}
