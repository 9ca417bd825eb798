//! P/T 网静态结构元素: 库所与迁移.
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::ids::PlaceId;

pub type Weight = u64;

/// 迁移的弧列表, 保留声明顺序与重复项.
pub type ArcList = SmallVec<[PlaceId; 4]>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Place {
    pub name: String,
}

impl Place {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Transition {
    pub name: String,
    /// 输入弧, 每一项消耗一个 token.
    pub inputs: ArcList,
    /// 输出弧, 每一项产生一个 token.
    pub outputs: ArcList,
}

impl Transition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: ArcList::new(),
            outputs: ArcList::new(),
        }
    }

    pub fn with_arcs(
        name: impl Into<String>,
        inputs: impl IntoIterator<Item = PlaceId>,
        outputs: impl IntoIterator<Item = PlaceId>,
    ) -> Self {
        Self {
            name: name.into(),
            inputs: inputs.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
        }
    }

    /// 去重并排序后的输入库所集合.
    pub fn preset(&self) -> SmallVec<[PlaceId; 4]> {
        dedup_sorted(&self.inputs)
    }

    /// 去重并排序后的输出库所集合.
    pub fn postset(&self) -> SmallVec<[PlaceId; 4]> {
        dedup_sorted(&self.outputs)
    }
}

fn dedup_sorted(arcs: &ArcList) -> SmallVec<[PlaceId; 4]> {
    let mut set = arcs.clone();
    set.sort_unstable();
    set.dedup();
    set
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transition").field(&self.name).finish()
    }
}
