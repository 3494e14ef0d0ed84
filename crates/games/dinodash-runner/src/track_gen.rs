use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use crate::config::{ItemWeights, TrackConfig};
use crate::state::{Item, Items};

/// Items in the same order as the fields of [`ItemWeights`].
const WEIGHTED_ITEMS: [Item; 6] = [
    Item::SmallCactus,
    Item::Cactus,
    Item::Rocks,
    Item::Flying,
    Item::Gap,
    Item::Gap2,
];

fn item_distribution(weights: &ItemWeights) -> WeightedIndex<f32> {
    let raw = [
        weights.small_cactus,
        weights.cactus,
        weights.rocks,
        weights.flying,
        weights.gap,
        weights.gap2,
    ];
    match WeightedIndex::new(raw) {
        Ok(dist) => dist,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid item weights, using defaults");
            let d = ItemWeights::default();
            WeightedIndex::new([d.small_cactus, d.cactus, d.rocks, d.flying, d.gap, d.gap2])
                .expect("default item weights are valid")
        },
    }
}

/// Lay out the obstacle track.
///
/// The cursor only moves forward, so every cell holds at most one item.
/// Replicas that share the generator state produce identical tracks; a
/// restart simply calls this again on the same generator.
pub fn generate_track<R: Rng>(config: &TrackConfig, rng: &mut R) -> Items {
    let dist = item_distribution(&config.weights);
    let mut items = Items::new();
    let mut cursor = config.start_cell;
    for _ in 0..config.item_count {
        cursor += rng.random_range(config.min_step..=config.max_step);
        items.insert(cursor, WEIGHTED_ITEMS[dist.sample(rng)]);
    }
    tracing::debug!(
        items = items.len(),
        last_cell = cursor,
        "Generated track"
    );
    items
}
