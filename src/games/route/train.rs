//! The shared train and its simulated clock.

use serde::{Deserialize, Serialize};

use crate::board::{Digestible, Digester};
use crate::core::Revision;

/// First revision in which the train reverses at the end of the line
/// instead of jumping back to the first station.
pub const REVERSING_TERMINUS: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Train {
    pub station: u8,
    pub forward: bool,
}

impl Default for Train {
    fn default() -> Self {
        Self {
            station: 0,
            forward: true,
        }
    }
}

impl Digestible for Train {
    fn digest_into(&self, d: &mut Digester) {
        d.mix(u64::from(self.station));
        self.forward.digest_into(d);
    }
}

/// Run the train for `dt` station hops on a line of `stations` stations.
///
/// Returns the new train and every station it stopped at, in order. Pure:
/// the same inputs always give the same outputs, so replays and robot
/// search see identical motion.
#[must_use]
pub fn advance_simulated_time(train: Train, dt: u8, stations: u8, revision: Revision) -> (Train, Vec<u8>) {
    let mut train = train;
    let mut visited = Vec::with_capacity(usize::from(dt));
    if stations < 2 {
        return (train, visited);
    }
    let last = stations - 1;

    for _ in 0..dt {
        train = hop(train, last, revision);
        visited.push(train.station);
    }
    (train, visited)
}

fn hop(train: Train, last: u8, revision: Revision) -> Train {
    let reverses = revision.at_least(REVERSING_TERMINUS);
    match (train.forward, train.station) {
        (true, s) if s < last => Train {
            station: s + 1,
            forward: true,
        },
        (true, _) if reverses => Train {
            station: last - 1,
            forward: false,
        },
        (true, _) => Train::default(),
        (false, 0) => Train {
            station: 1,
            forward: true,
        },
        (false, s) => Train {
            station: s - 1,
            forward: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_forward() {
        let (train, visited) = advance_simulated_time(Train::default(), 3, 6, Revision(0));
        assert_eq!(train.station, 3);
        assert!(train.forward);
        assert_eq!(visited, vec![1, 2, 3]);
    }

    #[test]
    fn test_terminus_wraps_in_revision_zero() {
        let start = Train {
            station: 4,
            forward: true,
        };
        let (train, visited) = advance_simulated_time(start, 3, 6, Revision(0));
        assert_eq!(visited, vec![5, 0, 1]);
        assert_eq!(train, Train { station: 1, forward: true });
    }

    #[test]
    fn test_terminus_reverses_in_later_revisions() {
        let start = Train {
            station: 4,
            forward: true,
        };
        let (train, visited) = advance_simulated_time(start, 3, 6, Revision(1));
        assert_eq!(visited, vec![5, 4, 3]);
        assert_eq!(train, Train { station: 3, forward: false });

        let (back, visited) = advance_simulated_time(Train { station: 1, forward: false }, 2, 6, Revision(1));
        assert_eq!(visited, vec![0, 1]);
        assert!(back.forward);
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let start = Train { station: 2, forward: false };
        assert_eq!(advance_simulated_time(start, 0, 6, Revision(1)), (start, Vec::new()));
    }
}
