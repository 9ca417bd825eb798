//! 标识: 按库所顺序排列的 token 向量.
//!
//! 标识是不可变的值对象, 发生与加速总是生成新的标识. 两个标识相等当且仅当
//! token 序列与库所顺序都相同; 哈希只依赖 token 序列.
//!
//! 覆盖关系 `A ≥ B` 逐库所判定: `A` 中的 ω 满足任意比较, `B` 中的 ω 要求 `A`
//! 在该库所也为 ω, 其余按整数比较.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::net::ids::PlaceId;
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::Weight;
use crate::net::token::Token;

/// 标识所依赖的库所顺序, 在同一个网的所有标识间共享.
pub type PlaceOrder = Arc<[String]>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkingError {
    #[error("markings are defined over different place orderings: {left:?} vs {right:?}")]
    IncompatiblePlaces {
        left: Vec<String>,
        right: Vec<String>,
    },
    #[error("place `{0}` is not part of the place ordering")]
    UnknownPlace(String),
    #[error("marking has {found} values but the net declares {expected} places")]
    LengthMismatch { expected: usize, found: usize },
}

#[derive(Clone)]
pub struct Marking {
    places: PlaceOrder,
    tokens: IndexVec<PlaceId, Token>,
}

impl Marking {
    pub fn new(places: PlaceOrder, tokens: Vec<Token>) -> Result<Self, MarkingError> {
        if tokens.len() != places.len() {
            return Err(MarkingError::LengthMismatch {
                expected: places.len(),
                found: tokens.len(),
            });
        }
        Ok(Self {
            places,
            tokens: IndexVec::from(tokens),
        })
    }

    pub fn from_counts(places: PlaceOrder, counts: &[Weight]) -> Result<Self, MarkingError> {
        Self::new(places, counts.iter().copied().map(Token::Finite).collect())
    }

    /// 由 `库所名 -> token` 映射构造, 缺省的库所取 0.
    pub fn from_map<K, I>(places: &PlaceOrder, entries: I) -> Result<Self, MarkingError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Token)>,
    {
        let mut tokens = vec![Token::ZERO; places.len()];
        for (name, token) in entries {
            let name = name.as_ref();
            let idx = places
                .iter()
                .position(|place| place == name)
                .ok_or_else(|| MarkingError::UnknownPlace(name.to_string()))?;
            tokens[idx] = token;
        }
        Self::new(Arc::clone(places), tokens)
    }

    /// 与 `self` 共享库所顺序的新标识.
    pub(crate) fn with_tokens(&self, tokens: IndexVec<PlaceId, Token>) -> Self {
        debug_assert_eq!(tokens.len(), self.places.len());
        Self {
            places: Arc::clone(&self.places),
            tokens,
        }
    }

    pub fn to_map(&self) -> IndexMap<String, Token> {
        self.iter_named()
            .map(|(name, token)| (name.to_string(), token))
            .collect()
    }

    pub fn places(&self) -> &PlaceOrder {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self, place: PlaceId) -> Token {
        self.tokens[place]
    }

    pub fn get(&self, name: &str) -> Option<Token> {
        self.places
            .iter()
            .position(|place| place == name)
            .map(|idx| self.tokens[PlaceId::from_usize(idx)])
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, Token)> + '_ {
        self.tokens.iter_enumerated().map(|(place, token)| (place, *token))
    }

    pub fn iter_named(&self) -> impl Iterator<Item = (&str, Token)> + '_ {
        self.places
            .iter()
            .map(String::as_str)
            .zip(self.tokens.iter().copied())
    }

    pub fn values(&self) -> &[Token] {
        self.tokens.as_slice()
    }

    pub fn has_omega(&self) -> bool {
        self.tokens.iter().any(|token| token.is_omega())
    }

    pub fn omega_places(&self) -> Vec<PlaceId> {
        self.iter()
            .filter(|(_, token)| token.is_omega())
            .map(|(place, _)| place)
            .collect()
    }

    /// 所有有限 token 的总数, ω 不计入.
    /// 有限库所的 token 总和; 以 `u128` 累加, 任意多个 `u64` 值都不会溢出.
    pub fn finite_sum(&self) -> u128 {
        self.tokens
            .iter()
            .filter_map(|token| token.finite())
            .map(u128::from)
            .sum()
    }

    pub fn same_places(&self, other: &Marking) -> bool {
        Arc::ptr_eq(&self.places, &other.places) || self.places == other.places
    }

    pub(crate) fn ensure_same_places(&self, other: &Marking) -> Result<(), MarkingError> {
        if self.same_places(other) {
            Ok(())
        } else {
            Err(MarkingError::IncompatiblePlaces {
                left: self.places.to_vec(),
                right: other.places.to_vec(),
            })
        }
    }

    /// `self ≥ other`.
    pub fn covers(&self, other: &Marking) -> Result<bool, MarkingError> {
        self.ensure_same_places(other)?;
        Ok(self
            .tokens
            .iter()
            .zip(other.tokens.iter())
            .all(|(mine, theirs)| match (mine, theirs) {
                (Token::Omega, _) => true,
                (Token::Finite(_), Token::Omega) => false,
                (Token::Finite(a), Token::Finite(b)) => a >= b,
            }))
    }
}

impl PartialEq for Marking {
    fn eq(&self, other: &Self) -> bool {
        self.tokens == other.tokens && self.same_places(other)
    }
}

impl Eq for Marking {}

impl Hash for Marking {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for token in self.tokens.iter() {
            token.hash(state);
        }
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, token) in self.iter_named() {
            map.entry(&name, &token);
        }
        map.finish()
    }
}

impl fmt::Display for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (idx, token) in self.tokens.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", token)?;
        }
        f.write_str(")")
    }
}

impl Serialize for Marking {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, token) in self.iter_named() {
            map.serialize_entry(name, &token)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> PlaceOrder {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn from_map_defaults_missing_places_to_zero() {
        let places = order(&["p1", "p2", "p3"]);
        let marking = Marking::from_map(&places, [("p2", Token::Finite(4))]).unwrap();

        assert_eq!(marking.values(), &[Token::ZERO, Token::Finite(4), Token::ZERO]);
        assert_eq!(marking.get("p2"), Some(Token::Finite(4)));
        assert_eq!(
            marking.to_map().into_iter().collect::<Vec<_>>(),
            vec![
                ("p1".to_string(), Token::ZERO),
                ("p2".to_string(), Token::Finite(4)),
                ("p3".to_string(), Token::ZERO),
            ]
        );
    }

    #[test]
    fn from_map_rejects_unknown_place() {
        let places = order(&["p1"]);
        let err = Marking::from_map(&places, [("p9", Token::ZERO)]).unwrap_err();
        assert_eq!(err, MarkingError::UnknownPlace("p9".into()));
    }

    #[test]
    fn coverage_handles_omega() {
        let places = order(&["p1", "p2"]);
        let small = Marking::from_counts(places.clone(), &[1, 0]).unwrap();
        let big = Marking::new(places.clone(), vec![Token::Finite(1), Token::Omega]).unwrap();
        let other = Marking::from_counts(places, &[0, 5]).unwrap();

        assert!(big.covers(&small).unwrap());
        assert!(!small.covers(&big).unwrap());
        assert!(big.covers(&other).unwrap());
        assert!(!other.covers(&big).unwrap());
        assert!(!small.covers(&other).unwrap());
        assert!(!other.covers(&small).unwrap());
    }

    #[test]
    fn coverage_is_reflexive_and_transitive() {
        let places = order(&["a", "b"]);
        let low = Marking::from_counts(places.clone(), &[0, 1]).unwrap();
        let mid = Marking::from_counts(places.clone(), &[1, 1]).unwrap();
        let high = Marking::new(places, vec![Token::Omega, Token::Finite(2)]).unwrap();

        for m in [&low, &mid, &high] {
            assert!(m.covers(m).unwrap());
        }
        assert!(mid.covers(&low).unwrap());
        assert!(high.covers(&mid).unwrap());
        assert!(high.covers(&low).unwrap());
    }

    #[test]
    fn coverage_over_foreign_places_is_an_error() {
        let left = Marking::from_counts(order(&["p1", "p2"]), &[0, 0]).unwrap();
        let right = Marking::from_counts(order(&["p2", "p1"]), &[0, 0]).unwrap();

        assert!(matches!(
            left.covers(&right),
            Err(MarkingError::IncompatiblePlaces { .. })
        ));
        assert_ne!(left, right);
    }

    #[test]
    fn equality_is_by_value() {
        let a = Marking::from_counts(order(&["p1", "p2"]), &[1, 0]).unwrap();
        let b = Marking::from_counts(order(&["p1", "p2"]), &[1, 0]).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.to_string(), "(1, 0)");
        assert_eq!(serde_json::to_string(&a).unwrap(), r#"{"p1":1,"p2":0}"#);
    }

    #[test]
    fn length_is_checked() {
        let err = Marking::from_counts(order(&["p1"]), &[1, 2]).unwrap_err();
        assert_eq!(err, MarkingError::LengthMismatch { expected: 1, found: 2 });
    }
}
