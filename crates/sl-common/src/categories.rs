//! Personality dimensions and the four-symbol category codec.
//!
//! Every dimension has two poles (e.g. Extraversion / Introversion), and each
//! pole has a strong (`+`) and a weak (`-`) sub-level. Tokens are encoded to
//! fixed ordinal codes running from one pole's strong form to the other's:
//!
//! | code | meaning       | E/I  |
//! |------|---------------|------|
//! | 0    | strong pole A | `E+` |
//! | 1    | weak pole A   | `E-` |
//! | 2    | weak pole B   | `I-` |
//! | 3    | strong pole B | `I+` |
//!
//! The estimator relies on codes 0,1 belonging to pole A and 2,3 to pole B.
//! [`DimensionSpec`] validates that ordering when it is built, so a reordered
//! vocabulary is rejected instead of silently flipping the poles.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Number of independent annotators per item.
pub const ANNOTATOR_COUNT: usize = 3;

/// Number of category symbols per dimension.
pub const CATEGORY_COUNT: usize = 4;

/// Field names of the three annotators inside a record's annotation block.
pub const ANNOTATOR_KEYS: [&str; ANNOTATOR_COUNT] = ["A1", "A2", "A3"];

/// Latent binary class: which pole of the dimension an item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pole {
    A,
    B,
}

impl Pole {
    /// Row index of this class in a 2-row emission matrix.
    pub fn index(self) -> usize {
        match self {
            Pole::A => 0,
            Pole::B => 1,
        }
    }
}

/// Ordinal category code in `0..4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Category(u8);

impl Category {
    pub const STRONG_A: Category = Category(0);
    pub const WEAK_A: Category = Category(1);
    pub const WEAK_B: Category = Category(2);
    pub const STRONG_B: Category = Category(3);

    /// All categories in code order.
    pub const ALL: [Category; CATEGORY_COUNT] = [
        Category::STRONG_A,
        Category::WEAK_A,
        Category::WEAK_B,
        Category::STRONG_B,
    ];

    /// Build a category from its code, if in range.
    pub fn from_index(index: usize) -> Option<Self> {
        Category::ALL.get(index).copied()
    }

    /// The ordinal code (0..4).
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Which pole this category belongs to.
    pub fn pole(self) -> Pole {
        if self.0 < 2 {
            Pole::A
        } else {
            Pole::B
        }
    }

    pub fn is_pole_a(self) -> bool {
        self.pole() == Pole::A
    }
}

/// The four MBTI dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "E/I")]
    EI,
    #[serde(rename = "S/N")]
    SN,
    #[serde(rename = "T/F")]
    TF,
    #[serde(rename = "J/P")]
    JP,
}

impl Dimension {
    /// All dimensions in canonical order.
    pub const ALL: [Dimension; 4] = [Dimension::EI, Dimension::SN, Dimension::TF, Dimension::JP];

    /// Key used in dataset records (`"E/I"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::EI => "E/I",
            Dimension::SN => "S/N",
            Dimension::TF => "T/F",
            Dimension::JP => "J/P",
        }
    }

    pub fn first_letter(self) -> char {
        match self {
            Dimension::EI => 'E',
            Dimension::SN => 'S',
            Dimension::TF => 'T',
            Dimension::JP => 'J',
        }
    }

    pub fn second_letter(self) -> char {
        match self {
            Dimension::EI => 'I',
            Dimension::SN => 'N',
            Dimension::TF => 'F',
            Dimension::JP => 'P',
        }
    }

    /// Both letters without the separator (`"EI"`).
    pub fn only_letters(self) -> &'static str {
        match self {
            Dimension::EI => "EI",
            Dimension::SN => "SN",
            Dimension::TF => "TF",
            Dimension::JP => "JP",
        }
    }

    /// The builtin vocabulary for this dimension.
    pub fn spec(self) -> DimensionSpec {
        DimensionSpec::builtin(
            self.as_str(),
            self.first_letter().to_string(),
            self.second_letter().to_string(),
        )
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '/')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Dimension::ALL
            .into_iter()
            .find(|d| d.only_letters() == normalized)
            .ok_or_else(|| Error::UnknownDimension(s.to_string()))
    }
}

/// Vocabulary of one dimension plus its pole labels.
///
/// Construction validates the canonical ordering: tokens 0,1 are the strong
/// and weak forms of pole A, tokens 2,3 the weak and strong forms of pole B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionSpec {
    name: String,
    pole_a: String,
    pole_b: String,
    vocabulary: [String; CATEGORY_COUNT],
}

impl DimensionSpec {
    fn builtin(name: &str, pole_a: String, pole_b: String) -> Self {
        let vocabulary = [
            format!("{pole_a}+"),
            format!("{pole_a}-"),
            format!("{pole_b}-"),
            format!("{pole_b}+"),
        ];
        Self {
            name: name.to_string(),
            pole_a,
            pole_b,
            vocabulary,
        }
    }

    /// Build a vocabulary from two pole labels (`X+`, `X-`, `Y-`, `Y+`).
    pub fn from_poles(name: impl Into<String>, pole_a: &str, pole_b: &str) -> Result<Self> {
        let name = name.into();
        if pole_a.is_empty() || pole_b.is_empty() {
            return Err(Error::InvalidVocabulary {
                dimension: name,
                message: "pole labels must be non-empty".to_string(),
            });
        }
        if pole_a == pole_b {
            return Err(Error::InvalidVocabulary {
                dimension: name,
                message: format!("both poles are labelled {pole_a:?}"),
            });
        }
        Ok(Self::builtin(&name, pole_a.to_string(), pole_b.to_string()))
    }

    /// Build a vocabulary from four explicit tokens in code order.
    pub fn from_vocabulary(name: impl Into<String>, tokens: [&str; CATEGORY_COUNT]) -> Result<Self> {
        let name = name.into();
        let invalid = |message: String| Error::InvalidVocabulary {
            dimension: name.clone(),
            message,
        };

        const EXPECTED_SIGNS: [char; CATEGORY_COUNT] = ['+', '-', '-', '+'];
        let mut poles = Vec::with_capacity(CATEGORY_COUNT);
        for (code, (token, sign)) in tokens.iter().zip(EXPECTED_SIGNS).enumerate() {
            let pole = token
                .strip_suffix(sign)
                .ok_or_else(|| invalid(format!("token {code} ({token:?}) must end with '{sign}'")))?;
            if pole.is_empty() {
                return Err(invalid(format!("token {code} ({token:?}) has no pole label")));
            }
            poles.push(pole);
        }

        if poles[0] != poles[1] {
            return Err(invalid(format!(
                "codes 0 and 1 must share pole A, got {:?} and {:?}",
                poles[0], poles[1]
            )));
        }
        if poles[2] != poles[3] {
            return Err(invalid(format!(
                "codes 2 and 3 must share pole B, got {:?} and {:?}",
                poles[2], poles[3]
            )));
        }
        if poles[0] == poles[2] {
            return Err(invalid(format!("both poles are labelled {:?}", poles[0])));
        }

        Ok(Self::builtin(&name, poles[0].to_string(), poles[2].to_string()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Label of the given pole (`"E"` for pole A of E/I).
    pub fn pole_label(&self, pole: Pole) -> &str {
        match pole {
            Pole::A => &self.pole_a,
            Pole::B => &self.pole_b,
        }
    }

    pub fn vocabulary(&self) -> &[String; CATEGORY_COUNT] {
        &self.vocabulary
    }

    /// Map a raw token to its category code.
    pub fn encode(&self, label: &str) -> Result<Category> {
        self.vocabulary
            .iter()
            .position(|token| token == label)
            .and_then(Category::from_index)
            .ok_or_else(|| Error::UnknownCategory {
                dimension: self.name.clone(),
                label: label.to_string(),
            })
    }

    /// Map a category code back to its token.
    pub fn decode(&self, category: Category) -> &str {
        &self.vocabulary[category.index()]
    }
}
