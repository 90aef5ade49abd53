use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// A depot or customer. Immutable; identity is by `id`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Node {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub demand: u32,
    pub is_depot: bool,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Node {
    pub fn customer(id: usize, x: f64, y: f64, demand: u32) -> Self {
        Self {
            id,
            x,
            y,
            demand,
            is_depot: false,
        }
    }

    pub fn depot(id: usize, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            demand: 0,
            is_depot: true,
        }
    }
}
