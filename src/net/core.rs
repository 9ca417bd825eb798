//! 运行时: 网的构造校验、可发生集与发生语义.
use std::collections::HashSet;

use indexmap::IndexMap;
use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::Incidence;
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::marking::{Marking, MarkingError, PlaceOrder};
use crate::net::structure::{Place, Transition, Weight};
use crate::net::token::Token;

/// 迁移名 -> 有序库所名列表.
pub type Arcs = IndexMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("place `{0}` is declared more than once")]
    DuplicatePlace(String),
    #[error("transition `{0}` is declared more than once")]
    DuplicateTransition(String),
    #[error("arcs reference undeclared transition `{0}`")]
    UndeclaredTransition(String),
    #[error("transition `{transition}` references undeclared place `{place}`")]
    UndeclaredPlace { transition: String, place: String },
    #[error("invalid initial marking: {0}")]
    InitialMarking(#[from] MarkingError),
}

#[derive(Debug, Error)]
pub enum FireError {
    #[error("unknown transition `{0}`")]
    UnknownTransition(String),
    #[error("transition {0:?} is out of bounds")]
    OutOfBounds(TransitionId),
    #[error("transition `{name}` is not enabled under marking {marking}")]
    NotEnabled {
        transition: TransitionId,
        name: String,
        marking: String,
    },
    #[error(transparent)]
    Marking(#[from] MarkingError),
}

/// 不可变的 P/T 网. 构造后弧与库所固定, 只有标识在演化.
#[derive(Clone)]
pub struct Net {
    places: IndexVec<PlaceId, Place>,
    transitions: IndexVec<TransitionId, Transition>,
    pre: Incidence,
    post: Incidence,
    place_order: PlaceOrder,
    transition_ids: IndexMap<String, TransitionId>,
    initial: Marking,
}

impl std::fmt::Debug for Net {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Net")
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("pre", &self.pre)
            .field("post", &self.post)
            .field("initial", &self.initial)
            .finish()
    }
}

impl Net {
    /// 校验并构造网. 弧中引用的库所与迁移必须已声明, 初始标识中缺省的库所取 0.
    pub fn new<P, T>(
        places: P,
        transitions: T,
        input_arcs: &Arcs,
        output_arcs: &Arcs,
        initial: &IndexMap<String, Weight>,
    ) -> Result<Self, NetError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let mut place_names: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for name in places {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(NetError::DuplicatePlace(name));
            }
            place_names.push(name);
        }
        let place_order: PlaceOrder = place_names.into();

        let mut transition_ids = IndexMap::new();
        for name in transitions {
            let name = name.into();
            if transition_ids.contains_key(&name) {
                return Err(NetError::DuplicateTransition(name));
            }
            let id = TransitionId::from_usize(transition_ids.len());
            transition_ids.insert(name, id);
        }

        for name in input_arcs.keys().chain(output_arcs.keys()) {
            if !transition_ids.contains_key(name) {
                return Err(NetError::UndeclaredTransition(name.clone()));
            }
        }

        let resolve = |transition: &str, arcs: &Arcs| -> Result<Vec<PlaceId>, NetError> {
            arcs.get(transition)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .map(|place| {
                    place_order
                        .iter()
                        .position(|declared| declared == place)
                        .map(PlaceId::from_usize)
                        .ok_or_else(|| NetError::UndeclaredPlace {
                            transition: transition.to_string(),
                            place: place.clone(),
                        })
                })
                .collect()
        };

        let mut pre = Incidence::new(place_order.len(), transition_ids.len());
        let mut post = Incidence::new(place_order.len(), transition_ids.len());
        let mut transition_vec = IndexVec::new();
        for (name, &id) in transition_ids.iter() {
            let inputs = resolve(name, input_arcs)?;
            let outputs = resolve(name, output_arcs)?;
            for &place in &inputs {
                pre.increment(place, id);
            }
            for &place in &outputs {
                post.increment(place, id);
            }
            transition_vec.push(Transition::with_arcs(name.clone(), inputs, outputs));
        }

        let initial = Marking::from_map(
            &place_order,
            initial
                .iter()
                .map(|(name, tokens)| (name.as_str(), Token::Finite(*tokens))),
        )?;

        let places = place_order.iter().map(Place::new).collect();

        Ok(Self {
            places,
            transitions: transition_vec,
            pre,
            post,
            place_order,
            transition_ids,
            initial,
        })
    }

    pub fn places(&self) -> &IndexVec<PlaceId, Place> {
        &self.places
    }

    pub fn transitions(&self) -> &IndexVec<TransitionId, Transition> {
        &self.transitions
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn place_order(&self) -> &PlaceOrder {
        &self.place_order
    }

    pub fn initial_marking(&self) -> &Marking {
        &self.initial
    }

    pub fn incidence(&self) -> (&Incidence, &Incidence) {
        (&self.pre, &self.post)
    }

    pub fn transition_id(&self, name: &str) -> Option<TransitionId> {
        self.transition_ids.get(name).copied()
    }

    pub fn transition_name(&self, transition: TransitionId) -> &str {
        &self.transitions[transition].name
    }

    /// 按声明顺序导出输入弧, 库所以名字表示.
    pub fn input_arcs(&self) -> Arcs {
        self.export_arcs(|transition| transition.inputs.as_slice())
    }

    /// 按声明顺序导出输出弧, 库所以名字表示.
    pub fn output_arcs(&self) -> Arcs {
        self.export_arcs(|transition| transition.outputs.as_slice())
    }

    fn export_arcs<'a>(&'a self, select: impl Fn(&'a Transition) -> &'a [PlaceId]) -> Arcs {
        self.transitions
            .iter()
            .map(|transition| {
                let places = select(transition)
                    .iter()
                    .map(|&place| self.places[place].name.clone())
                    .collect();
                (transition.name.clone(), places)
            })
            .collect()
    }

    /// 构造本网库所顺序上的标识, 缺省库所取 0.
    pub fn marking<K: AsRef<str>>(
        &self,
        entries: impl IntoIterator<Item = (K, Token)>,
    ) -> Result<Marking, MarkingError> {
        Marking::from_map(&self.place_order, entries)
    }

    /// 按库所顺序给出的 token 计数构造标识.
    pub fn marking_from_counts(&self, counts: &[Weight]) -> Result<Marking, MarkingError> {
        Marking::from_counts(self.place_order.clone(), counts)
    }

    /// 按声明顺序返回可发生的迁移. 定义在其他库所顺序上的标识没有可发生迁移.
    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        if self.initial.ensure_same_places(marking).is_err() {
            log::warn!("marking {} does not belong to this net", marking);
            return Vec::new();
        }
        self.transitions
            .indices()
            .filter(|&transition| self.is_transition_enabled(transition, marking))
            .collect()
    }

    pub fn enabled_transition_names(&self, marking: &Marking) -> Vec<&str> {
        self.enabled_transitions(marking)
            .into_iter()
            .map(|transition| self.transition_name(transition))
            .collect()
    }

    pub fn fire_named(&self, marking: &Marking, name: &str) -> Result<Marking, FireError> {
        let transition = self
            .transition_id(name)
            .ok_or_else(|| FireError::UnknownTransition(name.to_string()))?;
        self.fire(marking, transition)
    }

    /// 发生迁移, 返回新标识; `marking` 本身不变.
    pub fn fire(&self, marking: &Marking, transition: TransitionId) -> Result<Marking, FireError> {
        if transition.index() >= self.transitions_len() {
            return Err(FireError::OutOfBounds(transition));
        }
        self.initial.ensure_same_places(marking)?;
        if !self.is_transition_enabled(transition, marking) {
            return Err(self.not_enabled(transition, marking));
        }

        let mut next: IndexVec<PlaceId, Token> = marking.values().iter().copied().collect();
        for (place, weight) in self.pre.column(transition) {
            next[place] = next[place]
                .checked_sub(weight)
                .ok_or_else(|| self.not_enabled(transition, marking))?;
        }
        for (place, weight) in self.post.column(transition) {
            next[place] = next[place].add(weight);
        }

        Ok(marking.with_tokens(next))
    }

    fn not_enabled(&self, transition: TransitionId, marking: &Marking) -> FireError {
        FireError::NotEnabled {
            transition,
            name: self.transition_name(transition).to_string(),
            marking: marking.to_string(),
        }
    }

    fn is_transition_enabled(&self, transition: TransitionId, marking: &Marking) -> bool {
        self.pre
            .column(transition)
            .all(|(place, weight)| marking.tokens(place).satisfies(weight))
    }
}

/// 按名字逐步搭建 [`Net`].
#[derive(Debug, Default, Clone)]
pub struct NetBuilder {
    places: Vec<String>,
    transitions: Vec<String>,
    input_arcs: Arcs,
    output_arcs: Arcs,
    initial: IndexMap<String, Weight>,
}

impl NetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(mut self, name: impl Into<String>, tokens: Weight) -> Self {
        let name = name.into();
        if tokens > 0 {
            self.initial.insert(name.clone(), tokens);
        }
        self.places.push(name);
        self
    }

    pub fn transition<I, O>(mut self, name: impl Into<String>, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let name = name.into();
        self.input_arcs
            .insert(name.clone(), inputs.into_iter().map(Into::into).collect());
        self.output_arcs
            .insert(name.clone(), outputs.into_iter().map(Into::into).collect());
        self.transitions.push(name);
        self
    }

    pub fn build(self) -> Result<Net, NetError> {
        Net::new(
            self.places,
            self.transitions,
            &self.input_arcs,
            &self.output_arcs,
            &self.initial,
        )
    }
}
