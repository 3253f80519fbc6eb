use crate::room_template::{DungeonLevel, SpawnableObjectsByLevel};
use rand::Rng;

/// Ratio-weighted picker over the spawnable objects listed for one dungeon level.
#[derive(Debug, Clone)]
pub struct RandomSpawnableObject<'a, T> {
    ranges: Vec<(u32, &'a T)>, // exclusive upper bound of the cumulative ratio, object
    ratio_total: u32,
}

impl<'a, T> RandomSpawnableObject<'a, T> {
    pub fn new(by_level: &'a [SpawnableObjectsByLevel<T>], dungeon_level: DungeonLevel) -> Self {
        let mut ranges = Vec::new();
        let mut ratio_total = 0;
        for spawnable in by_level
            .iter()
            .filter(|spawnable| spawnable.dungeon_level == dungeon_level)
        {
            for (object, ratio) in spawnable.ratios.iter() {
                if *ratio == 0 {
                    continue;
                }
                ratio_total += *ratio;
                ranges.push((ratio_total, object));
            }
        }
        RandomSpawnableObject {
            ranges,
            ratio_total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get_item<R: Rng>(&self, rng: &mut R) -> Option<&'a T> {
        if self.ratio_total == 0 {
            return None;
        }
        let value = rng.gen_range(0..self.ratio_total);
        self.ranges
            .iter()
            .find(|(upper, _)| value < *upper)
            .map(|(_, object)| *object)
    }
}
