use crate::constants::{
    ENEMY_PATH_REBUILD_COOLDOWN, FRAMES_TO_SPREAD_PATHFINDING_OVER,
    PLAYER_MOVE_DISTANCE_TO_REBUILD_PATH,
};
use nalgebra::Vector2;

/// The frame, modulo the spread, on which one agent may rebuild its path.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PathSlot {
    frame: u32,
    frames: u32,
}

impl PathSlot {
    pub fn inner(&self) -> u32 {
        self.frame
    }

    pub fn is_due(&self, frame_count: u64) -> bool {
        frame_count % u64::from(self.frames) == u64::from(self.frame)
    }
}

/// Hands out path slots round-robin so agents spawned together do not all
/// search on the same frame.
#[derive(Debug, Clone)]
pub struct PathRebuildScheduler {
    frames: u32,
    spawned: u32,
}

impl Default for PathRebuildScheduler {
    fn default() -> Self {
        PathRebuildScheduler::new(FRAMES_TO_SPREAD_PATHFINDING_OVER)
    }
}

impl PathRebuildScheduler {
    pub fn new(frames: u32) -> Self {
        PathRebuildScheduler {
            frames: frames.max(1),
            spawned: 0,
        }
    }

    pub fn assign_slot(&mut self) -> PathSlot {
        let slot = PathSlot {
            frame: self.spawned % self.frames,
            frames: self.frames,
        };
        self.spawned = self.spawned.wrapping_add(1);
        slot
    }
}

/// Per-agent rebuild trigger: on its slot frame an agent rebuilds once the
/// cooldown ran out or the target moved far enough from where it was last seen.
#[derive(Debug, Clone)]
pub struct PathRebuildTimer {
    slot: PathSlot,
    cooldown: f32,
    move_distance: f32,
    cooldown_remaining: f32,
    target_reference_position: Vector2<f32>,
}

impl PathRebuildTimer {
    pub fn new(slot: PathSlot, target_position: Vector2<f32>) -> Self {
        PathRebuildTimer {
            slot,
            cooldown: ENEMY_PATH_REBUILD_COOLDOWN,
            move_distance: PLAYER_MOVE_DISTANCE_TO_REBUILD_PATH,
            cooldown_remaining: 0.0,
            target_reference_position: target_position,
        }
    }

    pub fn slot(&self) -> PathSlot {
        self.slot
    }

    /// Advances the cooldown by `delta_seconds` and reports whether the path
    /// should be rebuilt on `frame_count`. A positive answer restarts the cooldown
    /// and remembers `target_position`.
    pub fn should_rebuild(
        &mut self,
        frame_count: u64,
        delta_seconds: f32,
        target_position: Vector2<f32>,
    ) -> bool {
        self.cooldown_remaining -= delta_seconds;
        if !self.slot.is_due(frame_count) {
            return false;
        }
        let target_moved =
            (target_position - self.target_reference_position).norm() > self.move_distance;
        if self.cooldown_remaining > 0.0 && !target_moved {
            return false;
        }
        self.cooldown_remaining = self.cooldown;
        self.target_reference_position = target_position;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_spread_round_robin() {
        let mut scheduler = PathRebuildScheduler::new(3);
        let slots = (0..5).map(|_| scheduler.assign_slot().inner()).collect::<Vec<_>>();
        assert_eq!(slots, vec![0, 1, 2, 0, 1]);

        let slot = PathRebuildScheduler::default().assign_slot();
        assert!(slot.is_due(0));
        assert!(slot.is_due(u64::from(FRAMES_TO_SPREAD_PATHFINDING_OVER)));
        assert!(!slot.is_due(1));
    }

    #[test]
    fn rebuilds_on_cooldown_or_when_the_target_moves() {
        let mut scheduler = PathRebuildScheduler::new(2);
        scheduler.assign_slot();
        let slot = scheduler.assign_slot();
        let mut timer = PathRebuildTimer::new(slot, Vector2::new(0.0, 0.0));
        let still = Vector2::new(0.0, 0.0);
        let dt = 0.5;

        assert!(!timer.should_rebuild(0, dt, still));
        assert!(timer.should_rebuild(1, dt, still));
        // cooldown restarted at 2 seconds
        assert!(!timer.should_rebuild(3, dt, still));
        assert!(!timer.should_rebuild(5, dt, still));
        assert!(timer.should_rebuild(7, dt, Vector2::new(3.5, 0.0)));
        assert!(!timer.should_rebuild(9, dt, Vector2::new(4.0, 0.0)));
        assert!(!timer.should_rebuild(10, 10.0, still));
        assert!(timer.should_rebuild(11, dt, still));
    }
}
