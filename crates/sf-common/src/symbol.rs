//! Outcome symbol identity and display catalog.
//!
//! The game produces one of eight outcomes per round. Internally every
//! outcome is an index in `[0, SYMBOL_COUNT)`; the catalog maps each index
//! to the icon, name and payout multiplier shown to players.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Number of distinct outcome symbols.
pub const SYMBOL_COUNT: usize = 8;

/// Display metadata for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo {
    pub icon: &'static str,
    pub name: &'static str,
    /// Payout multiplier of the symbol in the game.
    pub multiplier: u32,
}

/// Catalog indexed by symbol value.
pub const SYMBOL_CATALOG: [SymbolInfo; SYMBOL_COUNT] = [
    SymbolInfo { icon: "☘️", name: "Salad", multiplier: 5 },
    SymbolInfo { icon: "🦐", name: "Shrimp", multiplier: 10 },
    SymbolInfo { icon: "🐟", name: "Fish", multiplier: 45 },
    SymbolInfo { icon: "🌽", name: "Corn", multiplier: 5 },
    SymbolInfo { icon: "🥩", name: "Steak", multiplier: 25 },
    SymbolInfo { icon: "🍗", name: "Chicken", multiplier: 15 },
    SymbolInfo { icon: "🍅", name: "Tomato", multiplier: 5 },
    SymbolInfo { icon: "🥕", name: "Carrot", multiplier: 5 },
];

/// A validated outcome symbol in `[0, SYMBOL_COUNT)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Symbol(u8);

impl Symbol {
    /// Create a symbol, returning `None` when out of range.
    pub fn new(value: i64) -> Option<Self> {
        if (0..SYMBOL_COUNT as i64).contains(&value) {
            Some(Symbol(value as u8))
        } else {
            None
        }
    }

    /// Index of this symbol, suitable for count tables.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw symbol value.
    pub fn value(self) -> u8 {
        self.0
    }

    /// Display metadata.
    pub fn info(self) -> &'static SymbolInfo {
        &SYMBOL_CATALOG[self.index()]
    }

    /// Every symbol in ascending order.
    pub fn all() -> impl Iterator<Item = Symbol> {
        (0..SYMBOL_COUNT as u8).map(Symbol)
    }

    /// Human-readable label: icon, name and multiplier.
    pub fn label(self) -> String {
        let info = self.info();
        format!("{} {} ({}x)", info.icon, info.name, info.multiplier)
    }
}

impl TryFrom<i64> for Symbol {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Symbol::new(value).ok_or(Error::InvalidSymbol { value })
    }
}

impl TryFrom<usize> for Symbol {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let value = i64::try_from(value).unwrap_or(i64::MAX);
        Symbol::try_from(value)
    }
}

impl From<Symbol> for u8 {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
