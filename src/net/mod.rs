//! # Petri 网核心定义 (P/T 网, 单位权重弧)
//!
//! 设库所集合 `P` 与迁移集合 `T`. 每个迁移带有有序的输入/输出库所列表,
//! 列表中重复出现的库所按出现次数计权, 汇总为 `Pre, Post ∈ ℕ^{|P|×|T|}`.
//! 标识 `M ∈ (ℕ ∪ {ω})^{|P|}`:
//!
//! * 迁移 `t` **可发生** 当且仅当 `∀p ∈ P: M[p] ≥ Pre[p, t]`, 其中 ω 满足任意需求;
//! * 发生后 `M' = M - Pre[:, t] + Post[:, t]`, 且 ω ± k = ω.
//!
//! ## 示例
//!
//! ```rust
//! use pn_lab::net::*;
//!
//! let net = NetBuilder::new()
//!     .place("p1", 1)
//!     .place("p2", 0)
//!     .transition("t1", ["p1"], ["p2"])
//!     .build()
//!     .unwrap();
//!
//! let marking = net.initial_marking();
//! assert_eq!(net.enabled_transition_names(marking), vec!["t1"]);
//! let next = net.fire_named(marking, "t1").unwrap();
//! assert_eq!(next.get("p1"), Some(Token::ZERO));
//! assert_eq!(next.get("p2"), Some(Token::Finite(1)));
//! ```

pub mod core;
pub mod ids;
pub mod incidence;
pub mod index_vec;
pub mod io;
pub mod marking;
pub mod structure;
pub mod token;

pub use self::core::{Arcs, FireError, Net, NetBuilder, NetError};
pub use ids::{PlaceId, TransitionId};
pub use incidence::Incidence;
pub use index_vec::{Idx, IndexVec};
pub use io::{IoError, LoadedNet, NetSpec, SpecError, TransitionArcs};
pub use marking::{Marking, MarkingError, PlaceOrder};
pub use structure::{ArcList, Place, Transition, Weight};
pub use token::{OMEGA, Token};
