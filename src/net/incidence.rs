//! 输入/输出弧的权重矩阵 (库所 × 变迁).
//!
//! 弧列表中重复出现的库所在矩阵中累加为权重.
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::Weight;

type SmallRow<T> = SmallVec<[T; 4]>;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incidence {
    rows: IndexVec<PlaceId, SmallRow<Weight>>,
    cols: usize,
}

impl Incidence {
    pub fn new(places: usize, transitions: usize) -> Self {
        let mut rows = IndexVec::new();
        for _ in 0..places {
            rows.push(SmallRow::from_elem(0, transitions));
        }
        Self {
            rows,
            cols: transitions,
        }
    }

    pub fn places(&self) -> usize {
        self.rows.len()
    }

    pub fn transitions(&self) -> usize {
        self.cols
    }

    pub fn get(&self, place: PlaceId, transition: TransitionId) -> Weight {
        self.rows[place][transition.index()]
    }

    /// 为弧 `(place, transition)` 增加一个单位权重.
    pub fn increment(&mut self, place: PlaceId, transition: TransitionId) {
        self.rows[place][transition.index()] += 1;
    }

    /// 变迁 `transition` 所在列中权重非零的项.
    pub fn column(&self, transition: TransitionId) -> impl Iterator<Item = (PlaceId, Weight)> + '_ {
        self.rows
            .iter_enumerated()
            .map(move |(place, row)| (place, row[transition.index()]))
            .filter(|(_, weight)| *weight > 0)
    }

    /// 库所 `place` 所在行中权重非零的变迁.
    pub fn row(&self, place: PlaceId) -> impl Iterator<Item = (TransitionId, Weight)> + '_ {
        self.rows[place]
            .iter()
            .enumerate()
            .filter(|(_, weight)| **weight > 0)
            .map(|(idx, weight)| (TransitionId::from_usize(idx), *weight))
    }
}

impl fmt::Debug for Incidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Incidence")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_arcs_accumulate_weight() {
        let mut pre = Incidence::new(2, 1);
        let p0 = PlaceId::new(0);
        let t0 = TransitionId::new(0);

        pre.increment(p0, t0);
        pre.increment(p0, t0);

        assert_eq!(pre.get(p0, t0), 2);
        assert_eq!(pre.column(t0).collect::<Vec<_>>(), vec![(p0, 2)]);
        assert_eq!(pre.row(PlaceId::new(1)).count(), 0);
    }
}
