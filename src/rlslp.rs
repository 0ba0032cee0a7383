//! The run-length straight-line program produced by recompression.
//!
//! Productions live in a flat arena. A production is appended only after all
//! of its operands exist, so every operand id is smaller than the id of the
//! production referencing it. That ordering is what lets lengths be computed
//! in one forward pass and what the coders restore after reordering rules.

use crate::error::{RecompressionError, Result};
use crate::symbol::{Production, Text, Variable, CHAR_ALPHABET};

/// A production together with the length of the string it derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonTerminal {
    pub production: Production,
    /// Length of the derived string.
    pub len: u64,
}

impl NonTerminal {
    pub fn new(production: Production) -> Self {
        Self { production, len: 1 }
    }
}

/// Run-length straight-line program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rlslp {
    /// Number of terminals; the first nonterminal has this id.
    pub terminals: usize,
    /// Start symbol. Meaningless while the grammar is empty.
    pub root: Variable,
    /// Productions in creation order.
    pub non_terminals: Vec<NonTerminal>,
    empty: bool,
}

impl Rlslp {
    /// Creates an empty grammar over `terminals` terminals.
    pub fn new(terminals: usize) -> Self {
        Self {
            terminals,
            root: 0,
            non_terminals: Vec::new(),
            empty: true,
        }
    }

    /// Number of productions.
    pub fn size(&self) -> usize {
        self.non_terminals.len()
    }

    /// True if the grammar derives no text.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Id the next appended production will get.
    #[inline]
    pub fn next_id(&self) -> Variable {
        (self.terminals + self.non_terminals.len()) as Variable
    }

    #[inline]
    pub fn is_terminal(&self, nt: Variable) -> bool {
        (nt as usize) < self.terminals
    }

    /// True if `nt` is a nonterminal deriving a block.
    pub fn is_block(&self, nt: Variable) -> bool {
        self.production(nt).is_some_and(|p| p.is_block())
    }

    /// Production of a nonterminal, `None` for terminals and unknown ids.
    #[inline]
    pub fn production(&self, nt: Variable) -> Option<&Production> {
        (nt as usize)
            .checked_sub(self.terminals)
            .and_then(|i| self.non_terminals.get(i))
            .map(|n| &n.production)
    }

    /// Number of block productions.
    pub fn blocks(&self) -> usize {
        self.non_terminals
            .iter()
            .filter(|n| n.production.is_block())
            .count()
    }

    /// Length of the string derived by `nt`; terminals derive one symbol,
    /// unknown ids derive nothing.
    #[inline]
    pub fn len(&self, nt: Variable) -> u64 {
        if self.is_terminal(nt) {
            1
        } else {
            self.non_terminals
                .get(nt as usize - self.terminals)
                .map_or(0, |n| n.len)
        }
    }

    /// Length of the derived text.
    pub fn text_len(&self) -> u64 {
        if self.empty {
            0
        } else {
            self.len(self.root)
        }
    }

    /// Fails with [`RecompressionError::IdSpaceExhausted`] unless
    /// `additional` more productions still get ids of their own.
    pub fn reserve_ids(&self, additional: usize) -> Result<()> {
        let productions = self.size().saturating_add(additional);
        if fits_id_space(self.terminals, productions) {
            Ok(())
        } else {
            Err(RecompressionError::IdSpaceExhausted {
                terminals: self.terminals,
                productions,
            })
        }
    }

    /// Appends a production and returns its id. Callers reserve the id with
    /// [`Rlslp::reserve_ids`] first.
    pub fn push(&mut self, production: Production) -> Variable {
        let id = self.next_id();
        debug_assert!(
            production.max_operand() < id,
            "operand {} must precede production {}",
            production.max_operand(),
            id
        );
        let len = self.production_len(&production);
        self.non_terminals.push(NonTerminal { production, len });
        id
    }

    /// Length derived by `production` given the lengths already known.
    /// Saturates instead of overflowing on malformed decoded grammars.
    fn production_len(&self, production: &Production) -> u64 {
        match *production {
            Production::Pair { first, second } => {
                self.len(first).saturating_add(self.len(second))
            }
            Production::Block { symbol, count } => {
                self.len(symbol).saturating_mul(u64::from(count))
            }
        }
    }

    pub fn push_pair(&mut self, first: Variable, second: Variable) -> Variable {
        self.push(Production::Pair { first, second })
    }

    pub fn push_block(&mut self, symbol: Variable, count: u32) -> Variable {
        debug_assert!(count >= 2, "a block repeats its symbol at least twice");
        self.push(Production::Block { symbol, count })
    }

    /// Marks the grammar as deriving the text of `root`.
    pub fn set_root(&mut self, root: Variable) {
        self.root = root;
        self.empty = false;
    }

    /// Marks the grammar as deriving the empty text.
    pub fn clear_root(&mut self) {
        self.root = 0;
        self.empty = true;
    }

    /// Recomputes every cached length in one pass over the arena.
    pub fn compute_lengths(&mut self) {
        for k in 0..self.non_terminals.len() {
            self.non_terminals[k].len = self.production_len(&self.non_terminals[k].production);
        }
    }

    /// Builds a grammar from productions already in arena order, as written
    /// by the coders that keep creation order. Lengths are recomputed.
    pub fn from_productions(
        terminals: usize,
        productions: Vec<Production>,
        root: Option<Variable>,
    ) -> Result<Self> {
        check_id_space(terminals, productions.len())?;
        let mut rlslp = Rlslp::new(terminals);
        rlslp.non_terminals = productions.into_iter().map(NonTerminal::new).collect();
        match root {
            Some(root) => rlslp.set_root(root),
            None => rlslp.clear_root(),
        }
        rlslp.validate()?;
        rlslp.compute_lengths();
        Ok(rlslp)
    }

    /// Builds a grammar from productions in arbitrary order. Production `k`
    /// has id `terminals + k` in `productions`, `root` and the operands.
    ///
    /// The productions are renumbered in depth-first post-order so that every
    /// operand precedes its production again. Cycles and unknown ids are
    /// rejected.
    pub fn from_unordered(
        terminals: usize,
        productions: Vec<Production>,
        root: Option<Variable>,
    ) -> Result<Self> {
        const UNVISITED: u8 = 0;
        const OPEN: u8 = 1;
        const DONE: u8 = 2;

        let size = productions.len();
        check_id_space(terminals, size)?;
        let index = |v: Variable| -> Result<Option<usize>> {
            match (v as usize).checked_sub(terminals) {
                None => Ok(None),
                Some(k) if k < size => Ok(Some(k)),
                Some(_) => Err(RecompressionError::decode(format!(
                    "symbol {} is not defined",
                    v
                ))),
            }
        };

        let mut state = vec![UNVISITED; size];
        let mut order = Vec::with_capacity(size);
        let mut stack = Vec::new();
        for start in 0..size {
            if state[start] != UNVISITED {
                continue;
            }
            stack.push((start, false));
            while let Some((k, expanded)) = stack.pop() {
                if expanded {
                    state[k] = DONE;
                    order.push(k);
                    continue;
                }
                if state[k] == DONE {
                    continue;
                }
                state[k] = OPEN;
                stack.push((k, true));

                let operands = match productions[k] {
                    Production::Pair { first, second } => [Some(second), Some(first)],
                    Production::Block { symbol, count } => {
                        if count < 2 {
                            return Err(RecompressionError::decode(format!(
                                "block repeats its symbol {} times",
                                count
                            )));
                        }
                        [Some(symbol), None]
                    }
                };
                for v in operands.into_iter().flatten() {
                    if let Some(c) = index(v)? {
                        match state[c] {
                            UNVISITED => stack.push((c, false)),
                            OPEN => {
                                return Err(RecompressionError::decode(format!(
                                    "production {} is part of a cycle",
                                    v
                                )))
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        let mut new_id = vec![0 as Variable; size];
        for (position, &k) in order.iter().enumerate() {
            new_id[k] = (terminals + position) as Variable;
        }
        let rename = |v: Variable| -> Result<Variable> {
            Ok(index(v)?.map_or(v, |k| new_id[k]))
        };

        let mut rlslp = Rlslp::new(terminals);
        for &k in &order {
            let production = match productions[k] {
                Production::Pair { first, second } => Production::Pair {
                    first: rename(first)?,
                    second: rename(second)?,
                },
                Production::Block { symbol, count } => Production::Block {
                    symbol: rename(symbol)?,
                    count,
                },
            };
            rlslp.push(production);
        }
        match root {
            Some(root) => rlslp.set_root(rename(root)?),
            None => rlslp.clear_root(),
        }
        rlslp.validate()?;
        Ok(rlslp)
    }

    /// Checks the arena invariants: operands precede their production, block
    /// counts are at least two and the root is a known symbol.
    pub fn validate(&self) -> Result<()> {
        for (k, nt) in self.non_terminals.iter().enumerate() {
            let id = self.terminals + k;
            if nt.production.max_operand() as usize >= id {
                return Err(RecompressionError::decode(format!(
                    "production {} references {}",
                    id,
                    nt.production.max_operand()
                )));
            }
            if let Production::Block { count, .. } = nt.production {
                if count < 2 {
                    return Err(RecompressionError::decode(format!(
                        "block {} repeats its symbol {} times",
                        id, count
                    )));
                }
            }
        }
        if !self.empty && self.root as usize >= self.terminals + self.non_terminals.len() {
            return Err(RecompressionError::decode(format!(
                "root {} is not a symbol of the grammar",
                self.root
            )));
        }
        Ok(())
    }

    /// Decompresses the whole text.
    pub fn derive_text(&self) -> Text {
        let mut text = Vec::with_capacity(self.text_len() as usize);
        text.extend(self.iter());
        text
    }

    /// Expands a single symbol.
    pub fn derive(&self, nt: Variable) -> Text {
        let mut out = Vec::new();
        self.extract_from(&mut out, 0, self.len(nt), nt);
        out
    }

    /// Extracts `len` symbols starting at position `i`, clipped to the end of
    /// the text. Out-of-range positions and empty grammars yield nothing.
    pub fn extract(&self, i: usize, len: usize) -> Text {
        let mut out = Vec::new();
        let text_len = self.text_len();
        let i = i as u64;
        if i < text_len && len > 0 {
            let len = (len as u64).min(text_len - i);
            out.reserve(len as usize);
            self.extract_from(&mut out, i, len, self.root);
        }
        out
    }

    /// Appends `len` symbols of the string derived by `nt`, starting at
    /// offset `i`. Callers guarantee `i + len <= self.len(nt)`.
    fn extract_from(&self, out: &mut Text, i: u64, len: u64, nt: Variable) {
        if len == 0 {
            return;
        }
        let Some(production) = self.production(nt) else {
            out.push(nt);
            return;
        };
        match *production {
            Production::Pair { first, second } => {
                let first_len = self.len(first);
                if i < first_len {
                    let head = len.min(first_len - i);
                    self.extract_from(out, i, head, first);
                    self.extract_from(out, 0, len - head, second);
                } else {
                    self.extract_from(out, i - first_len, len, second);
                }
            }
            Production::Block { symbol, .. } => {
                let b_len = self.len(symbol);
                let offset = i % b_len;
                let head = len.min(b_len - offset);
                self.extract_from(out, offset, head, symbol);

                let mut remaining = len - head;
                while remaining > 0 {
                    let part = remaining.min(b_len);
                    self.extract_from(out, 0, part, symbol);
                    remaining -= part;
                }
            }
        }
    }

    /// Returns statistics about the grammar.
    pub fn stats(&self) -> RlslpStats {
        let mut depth = vec![0usize; self.non_terminals.len()];
        let height = |depth: &[usize], v: Variable| -> usize {
            if self.is_terminal(v) {
                0
            } else {
                depth[v as usize - self.terminals]
            }
        };
        for k in 0..self.non_terminals.len() {
            depth[k] = 1 + match self.non_terminals[k].production {
                Production::Pair { first, second } => {
                    height(&depth, first).max(height(&depth, second))
                }
                Production::Block { symbol, .. } => height(&depth, symbol),
            };
        }
        let blocks = self.blocks();

        RlslpStats {
            text_len: self.text_len(),
            productions: self.size(),
            blocks,
            pairs: self.size() - blocks,
            depth: if self.empty {
                0
            } else {
                height(&depth, self.root)
            },
        }
    }
}

impl Default for Rlslp {
    fn default() -> Self {
        Self::new(CHAR_ALPHABET)
    }
}

/// Fails if `terminals + size` ids do not fit [`Variable`].
fn check_id_space(terminals: usize, size: usize) -> Result<()> {
    if fits_id_space(terminals, size) {
        Ok(())
    } else {
        Err(RecompressionError::decode(format!(
            "{} terminals and {} productions exceed the symbol id range",
            terminals, size
        )))
    }
}

/// True if `terminals + size` distinct ids fit in a [`Variable`].
fn fits_id_space(terminals: usize, size: usize) -> bool {
    (terminals as u64)
        .checked_add(size as u64)
        .is_some_and(|ids| ids <= u64::from(Variable::MAX) + 1)
}

/// Statistics about a grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RlslpStats {
    /// Length of the derived text
    pub text_len: u64,
    /// Number of productions
    pub productions: usize,
    /// Number of block productions
    pub blocks: usize,
    /// Number of pair productions
    pub pairs: usize,
    /// Height of the derivation tree of the root
    pub depth: usize,
}

impl RlslpStats {
    /// Grammar size (two symbols per production) relative to the text, in
    /// percent. Lower is better.
    pub fn compression_ratio(&self) -> f64 {
        if self.text_len == 0 {
            0.0
        } else {
            (self.productions as f64 * 2.0 / self.text_len as f64) * 100.0
        }
    }
}

enum Frame {
    Symbol(Variable),
    Repeat { symbol: Variable, remaining: u32 },
}

/// Iterator over the text derived by a grammar.
///
/// Keeps an explicit stack of pending symbols instead of recursing, so its
/// memory is bounded by the height of the grammar.
pub struct DeriveIter<'a> {
    rlslp: &'a Rlslp,
    stack: Vec<Frame>,
}

impl<'a> DeriveIter<'a> {
    fn new(rlslp: &'a Rlslp) -> Self {
        let mut stack = Vec::new();
        if !rlslp.is_empty() {
            stack.push(Frame::Symbol(rlslp.root));
        }
        Self { rlslp, stack }
    }
}

impl Iterator for DeriveIter<'_> {
    type Item = Variable;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop()? {
                Frame::Symbol(v) => match self.rlslp.production(v) {
                    None => return Some(v),
                    Some(&Production::Pair { first, second }) => {
                        self.stack.push(Frame::Symbol(second));
                        self.stack.push(Frame::Symbol(first));
                    }
                    Some(&Production::Block { symbol, count }) => {
                        self.stack.push(Frame::Repeat {
                            symbol,
                            remaining: count,
                        });
                    }
                },
                Frame::Repeat { symbol, remaining } => {
                    if remaining > 1 {
                        self.stack.push(Frame::Repeat {
                            symbol,
                            remaining: remaining - 1,
                        });
                    }
                    self.stack.push(Frame::Symbol(symbol));
                }
            }
        }
    }
}

impl Rlslp {
    /// Returns an iterator over the derived text.
    pub fn iter(&self) -> DeriveIter<'_> {
        DeriveIter::new(self)
    }
}

impl<'a> IntoIterator for &'a Rlslp {
    type Item = Variable;
    type IntoIter = DeriveIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
