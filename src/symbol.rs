/// Symbol id. Values below the terminal count are terminals, everything else
/// names a nonterminal by `id - terminals`.
pub type Variable = u32;

/// The text buffer rewritten by every compression phase.
pub type Text = Vec<Variable>;

/// Default terminal count for byte input.
pub const CHAR_ALPHABET: usize = 256;

/// Right-hand side of a nonterminal.
///
/// Replaces the single integer field that doubles as either a second symbol
/// or a negated run length with an explicit variant; the compact sign
/// encoding is produced by [`Production::to_signed`] at the coder boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Production {
    /// Derives `first` followed by `second`.
    Pair { first: Variable, second: Variable },

    /// Derives `symbol` repeated `count` times (`count >= 2`).
    Block { symbol: Variable, count: u32 },
}

impl Production {
    /// The left operand (the repeated symbol for blocks).
    #[inline]
    pub fn first(&self) -> Variable {
        match *self {
            Production::Pair { first, .. } => first,
            Production::Block { symbol, .. } => symbol,
        }
    }

    #[inline]
    pub fn is_block(&self) -> bool {
        matches!(self, Production::Block { .. })
    }

    /// Largest symbol id referenced by this production.
    #[inline]
    pub(crate) fn max_operand(&self) -> Variable {
        match *self {
            Production::Pair { first, second } => first.max(second),
            Production::Block { symbol, .. } => symbol,
        }
    }

    /// Sign-encoded form: a pair keeps `second >= 0`, a block stores
    /// `-(count) - 1` so that it derives `first` repeated `-second - 1` times.
    pub fn to_signed(&self) -> (Variable, i64) {
        match *self {
            Production::Pair { first, second } => (first, i64::from(second)),
            Production::Block { symbol, count } => (symbol, -i64::from(count) - 1),
        }
    }

    /// Inverse of [`Production::to_signed`]. Returns `None` if the second
    /// field does not fit a symbol id or a run length.
    pub fn from_signed(first: Variable, second: i64) -> Option<Self> {
        if second >= 0 {
            let second = Variable::try_from(second).ok()?;
            Some(Production::Pair { first, second })
        } else {
            let count = u32::try_from(-(second + 1)).ok()?;
            Some(Production::Block {
                symbol: first,
                count,
            })
        }
    }
}

/// Number of bits needed to store `value` (at least one).
#[inline]
pub(crate) fn bits_for(value: u64) -> u8 {
    if value == 0 {
        1
    } else {
        (64 - value.leading_zeros()) as u8
    }
}
