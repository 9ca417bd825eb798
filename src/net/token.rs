//! 库所中的 token 数: 有限非负整数或无界符号 ω.
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::net::structure::Weight;

/// 无界 token 的显示符号.
pub const OMEGA: &str = "ω";

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Finite(Weight),
    /// 任意多个 token, 由覆盖性加速产生.
    Omega,
}

impl Token {
    pub const ZERO: Token = Token::Finite(0);

    pub fn is_omega(self) -> bool {
        matches!(self, Token::Omega)
    }

    pub fn finite(self) -> Option<Weight> {
        match self {
            Token::Finite(n) => Some(n),
            Token::Omega => None,
        }
    }

    /// 是否至少有 `weight` 个 token; ω 满足任意需求.
    pub fn satisfies(self, weight: Weight) -> bool {
        match self {
            Token::Finite(n) => n >= weight,
            Token::Omega => true,
        }
    }

    /// ω + k = ω.
    pub fn add(self, weight: Weight) -> Token {
        match self {
            Token::Finite(n) => Token::Finite(n.saturating_add(weight)),
            Token::Omega => Token::Omega,
        }
    }

    /// ω - k = ω. Returns `None` when a finite count would go negative.
    pub fn checked_sub(self, weight: Weight) -> Option<Token> {
        match self {
            Token::Finite(n) => n.checked_sub(weight).map(Token::Finite),
            Token::Omega => Some(Token::Omega),
        }
    }
}

impl Default for Token {
    fn default() -> Self {
        Token::ZERO
    }
}

impl From<Weight> for Token {
    fn from(value: Weight) -> Self {
        Token::Finite(value)
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// ω 大于任何整数.
impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Finite(a), Token::Finite(b)) => a.cmp(b),
            (Token::Finite(_), Token::Omega) => Ordering::Less,
            (Token::Omega, Token::Finite(_)) => Ordering::Greater,
            (Token::Omega, Token::Omega) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Finite(n) => write!(f, "{}", n),
            Token::Omega => f.write_str(OMEGA),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Token {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Token::Finite(n) => serializer.serialize_u64(*n),
            Token::Omega => serializer.serialize_str(OMEGA),
        }
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(Weight),
            Symbol(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Count(n) => Ok(Token::Finite(n)),
            Raw::Symbol(s) if s == OMEGA || s.eq_ignore_ascii_case("omega") => Ok(Token::Omega),
            Raw::Symbol(other) => Err(serde::de::Error::invalid_value(
                serde::de::Unexpected::Str(&other),
                &"a non-negative integer or \"ω\"",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omega_absorbs_arithmetic() {
        assert_eq!(Token::Omega.add(3), Token::Omega);
        assert_eq!(Token::Omega.checked_sub(3), Some(Token::Omega));
        assert_eq!(Token::Finite(1).checked_sub(2), None);
        assert_eq!(Token::Finite(1).add(2), Token::Finite(3));
    }

    #[test]
    fn omega_is_greater_than_any_count() {
        assert!(Token::Omega > Token::Finite(Weight::MAX));
        assert!(Token::Omega.satisfies(1_000));
        assert!(!Token::ZERO.satisfies(1));
    }

    #[test]
    fn serde_uses_symbol_for_omega() {
        let json = serde_json::to_string(&vec![Token::Finite(2), Token::Omega]).unwrap();
        assert_eq!(json, "[2,\"ω\"]");

        let back: Vec<Token> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Token::Finite(2), Token::Omega]);
        assert!(serde_json::from_str::<Token>("\"many\"").is_err());
    }
}
