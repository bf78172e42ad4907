use colored::{ColoredString, Colorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    Good,
    Fair,
    Poor,
}

impl Rating {
    pub fn colorized(&self) -> ColoredString {
        match self {
            Rating::Good => "GOOD".green(),
            Rating::Fair => "FAIR".yellow(),
            Rating::Poor => "POOR".red(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Direction {
    LowerIsBetter,
    HigherIsBetter,
}

#[derive(Debug, Clone, Copy)]
pub struct Threshold {
    pub metric: &'static str,
    pub good: f64,
    pub fair: f64,
    pub direction: Direction,
}

impl Threshold {
    /// Boundaries are inclusive on the better side: a lower-is-better
    /// value equal to the good bound rates GOOD, equal to the fair bound
    /// rates FAIR.
    pub fn classify(&self, value: f64) -> Rating {
        match self.direction {
            Direction::LowerIsBetter => {
                if value <= self.good {
                    Rating::Good
                } else if value <= self.fair {
                    Rating::Fair
                } else {
                    Rating::Poor
                }
            }
            Direction::HigherIsBetter => {
                if value >= self.good {
                    Rating::Good
                } else if value >= self.fair {
                    Rating::Fair
                } else {
                    Rating::Poor
                }
            }
        }
    }
}

pub const THRESHOLDS: &[Threshold] = &[
    Threshold {
        metric: "vm_create",
        good: 2.0,
        fair: 5.0,
        direction: Direction::LowerIsBetter,
    },
    Threshold {
        metric: "volume_create",
        good: 5.0,
        fair: 15.0,
        direction: Direction::LowerIsBetter,
    },
    Threshold {
        metric: "snapshot_create",
        good: 2.0,
        fair: 5.0,
        direction: Direction::LowerIsBetter,
    },
    Threshold {
        metric: "clone_operation",
        good: 60.0,
        fair: 120.0,
        direction: Direction::LowerIsBetter,
    },
    Threshold {
        metric: "volume_resize",
        good: 3.0,
        fair: 10.0,
        direction: Direction::LowerIsBetter,
    },
    Threshold {
        metric: "snapshot_delete",
        good: 2.0,
        fair: 5.0,
        direction: Direction::LowerIsBetter,
    },
    Threshold {
        metric: "seq_write_mbps",
        good: 100.0,
        fair: 50.0,
        direction: Direction::HigherIsBetter,
    },
    Threshold {
        metric: "seq_read_mbps",
        good: 100.0,
        fair: 50.0,
        direction: Direction::HigherIsBetter,
    },
    Threshold {
        metric: "rand_read_iops",
        good: 1000.0,
        fair: 500.0,
        direction: Direction::HigherIsBetter,
    },
    Threshold {
        metric: "rand_write_iops",
        good: 1000.0,
        fair: 500.0,
        direction: Direction::HigherIsBetter,
    },
];

pub fn find_threshold(metric: &str) -> Option<&'static Threshold> {
    THRESHOLDS.iter().find(|t| t.metric == metric)
}
