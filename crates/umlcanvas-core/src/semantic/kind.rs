//! Relationship kinds and member visibility.

use std::{fmt, str::FromStr};

use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The kind of a relationship between two classes.
///
/// Serialized in camelCase (`"oneToMany"`). Deserialization goes through
/// [`RelationKind::parse_lenient`], so every alias listed there is accepted
/// and anything unknown becomes [`RelationKind::Association`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    #[default]
    Association,
    Aggregation,
    Composition,
    Generalization,
    Realization,
    Dependency,
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    pub const ALL: [RelationKind; 9] = [
        Self::Association,
        Self::Aggregation,
        Self::Composition,
        Self::Generalization,
        Self::Realization,
        Self::Dependency,
        Self::OneToOne,
        Self::OneToMany,
        Self::ManyToMany,
    ];

    /// The camelCase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Association => "association",
            Self::Aggregation => "aggregation",
            Self::Composition => "composition",
            Self::Generalization => "generalization",
            Self::Realization => "realization",
            Self::Dependency => "dependency",
            Self::OneToOne => "oneToOne",
            Self::OneToMany => "oneToMany",
            Self::ManyToMany => "manyToMany",
        }
    }

    /// Label shown on a new connection of this kind.
    ///
    /// ```
    /// # use umlcanvas_core::semantic::RelationKind;
    /// assert_eq!(RelationKind::OneToMany.default_label(), "1:*");
    /// assert_eq!(RelationKind::Composition.default_label(), "");
    /// ```
    pub fn default_label(self) -> &'static str {
        match self {
            Self::OneToOne => "1:1",
            Self::OneToMany => "1:*",
            Self::ManyToMany => "*:*",
            _ => "",
        }
    }

    /// Returns true for the three database-style multiplicity kinds.
    pub fn is_multiplicity(self) -> bool {
        matches!(self, Self::OneToOne | Self::OneToMany | Self::ManyToMany)
    }

    /// Parses a kind, accepting the aliases produced by language models.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    ///
    /// | Kind | Accepted spellings |
    /// |------|--------------------|
    /// | association | `association`, `associate`, `asociacion` |
    /// | aggregation | `aggregation`, `aggregate`, `agregacion` |
    /// | composition | `composition`, `composite`, `composicion` |
    /// | generalization | `generalization`, `inheritance`, `extends`, `herencia`, `generalizacion` |
    /// | realization | `realization`, `implements`, `implementation`, `implementa`, `realizacion` |
    /// | dependency | `dependency`, `depends`, `dependencia` |
    /// | oneToOne | `onetoone`, `one-to-one`, `one_to_one`, `1:1` |
    /// | oneToMany | `onetomany`, `one-to-many`, `one_to_many`, `1:n`, `1:*` |
    /// | manyToMany | `manytomany`, `many-to-many`, `many_to_many`, `n:m`, `*:*` |
    ///
    /// Returns `None` for anything else.
    pub fn from_alias(raw: &str) -> Option<Self> {
        let kind = match raw.trim().to_lowercase().as_str() {
            "association" | "associate" | "asociacion" => Self::Association,
            "aggregation" | "aggregate" | "agregacion" => Self::Aggregation,
            "composition" | "composite" | "composicion" => Self::Composition,
            "generalization" | "inheritance" | "extends" | "herencia" | "generalizacion" => {
                Self::Generalization
            }
            "realization" | "implements" | "implementation" | "implementa" | "realizacion" => {
                Self::Realization
            }
            "dependency" | "depends" | "dependencia" => Self::Dependency,
            "onetoone" | "one-to-one" | "one_to_one" | "1:1" => Self::OneToOne,
            "onetomany" | "one-to-many" | "one_to_many" | "1:n" | "1:*" => Self::OneToMany,
            "manytomany" | "many-to-many" | "many_to_many" | "n:m" | "*:*" => Self::ManyToMany,
            _ => return None,
        };
        Some(kind)
    }

    /// Like [`RelationKind::from_alias`], falling back to association.
    pub fn parse_lenient(raw: &str) -> Self {
        Self::from_alias(raw).unwrap_or_else(|| {
            debug!(kind = raw; "Unknown relationship kind, using association");
            Self::Association
        })
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_alias(s).ok_or_else(|| format!("unknown relationship kind `{s}`"))
    }
}

impl Serialize for RelationKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RelationKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

/// Member visibility, serialized as its single-character UML symbol.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
    Package,
}

impl Visibility {
    pub fn symbol(self) -> char {
        match self {
            Self::Public => '+',
            Self::Private => '-',
            Self::Protected => '#',
            Self::Package => '~',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '+' => Some(Self::Public),
            '-' => Some(Self::Private),
            '#' => Some(Self::Protected),
            '~' => Some(Self::Package),
            _ => None,
        }
    }

    /// Java access modifier for generated code.
    pub fn java_modifier(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Package => "",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Visibility {
    type Err = String;

    /// Accepts the symbol or the word, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(symbol), None) = (chars.next(), chars.next()) {
            if let Some(visibility) = Self::from_symbol(symbol) {
                return Ok(visibility);
            }
        }

        match trimmed.to_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            "protected" => Ok(Self::Protected),
            "package" => Ok(Self::Package),
            _ => Err(format!("unknown visibility `{s}`")),
        }
    }
}

impl Serialize for Visibility {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.symbol())
    }
}

impl<'de> Deserialize<'de> for Visibility {
    /// Unknown values fall back to public.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}
