/*
  Copyright 2020 Takashi Ogura

  Licensed under the Apache License, Version 2.0 (the "License");
  you may not use this file except in compliance with the License.
  You may obtain a copy of the License at

      http://www.apache.org/licenses/LICENSE-2.0

  Unless required by applicable law or agreed to in writing, software
  distributed under the License is distributed on an "AS IS" BASIS,
  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
  See the License for the specific language governing permissions and
  limitations under the License.
*/
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Constants closer than this to an integer are snapped to it
pub const SNAP_TOLERANCE: f64 = 1e-10;

/// Handle of an expression inside its `ExprArena`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(usize);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Bit pattern of a normalized `f64`, so that constants can be hashed
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Constant(u64);

impl Constant {
    fn new(value: f64) -> Self {
        Constant(snap(value).to_bits())
    }
    #[inline]
    pub fn value(self) -> f64 {
        f64::from_bits(self.0)
    }
}

fn snap(value: f64) -> f64 {
    let rounded = value.round();
    let value = if (value - rounded).abs() < SNAP_TOLERANCE {
        rounded
    } else {
        value
    };
    // -0.0 and 0.0 must be the same node
    if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// One node of an expression
///
/// Operands of `Sum` and `Product` are sorted by id. A `Product` with a
/// numeric coefficient stores it as its first operand.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Node {
    Constant(Constant),
    Variable(String),
    Sum(Vec<ExprId>),
    Product(Vec<ExprId>),
    Sin(ExprId),
    Cos(ExprId),
}

impl Node {
    pub fn children(&self) -> &[ExprId] {
        match self {
            Node::Constant(_) | Node::Variable(_) => &[],
            Node::Sum(terms) => terms,
            Node::Product(factors) => factors,
            Node::Sin(arg) | Node::Cos(arg) => std::slice::from_ref(arg),
        }
    }

    /// `true` for constants and variables
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Constant(_) | Node::Variable(_))
    }
}

/// Content-addressed storage of expressions
///
/// The constructors simplify while building: constants are folded, nested
/// sums and products are flattened, like terms are merged and `sin`/`cos`
/// absorb the sign of their argument.
///
/// # Examples
///
/// ```
/// use symkin::symbolic::ExprArena;
///
/// let mut arena = ExprArena::new();
/// let x = arena.variable("x");
/// let y = arena.variable("y");
/// let a = arena.add(x, y);
/// let b = arena.add(y, x);
/// assert_eq!(a, b);
///
/// let zero = arena.sub(a, b);
/// assert_eq!(arena.as_constant(zero), Some(0.0));
/// ```
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    nodes: Vec<Node>,
    weights: Vec<usize>,
    index: HashMap<Node, ExprId>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: ExprId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of arithmetic operations needed to compute `id` as a tree
    #[inline]
    pub fn weight(&self, id: ExprId) -> usize {
        self.weights[id.0]
    }

    pub fn as_constant(&self, id: ExprId) -> Option<f64> {
        match self.node(id) {
            Node::Constant(c) => Some(c.value()),
            _ => None,
        }
    }

    pub fn is_constant(&self, id: ExprId) -> bool {
        self.as_constant(id).is_some()
    }

    fn intern(&mut self, node: Node) -> ExprId {
        if let Some(id) = self.index.get(&node) {
            return *id;
        }
        let children = node.children();
        let weight = match &node {
            Node::Constant(_) | Node::Variable(_) => 0,
            Node::Sin(_) | Node::Cos(_) => 1,
            Node::Sum(_) | Node::Product(_) => children.len().saturating_sub(1),
        } + children.iter().map(|c| self.weights[c.0]).sum::<usize>();
        let id = ExprId(self.nodes.len());
        self.nodes.push(node.clone());
        self.weights.push(weight);
        self.index.insert(node, id);
        id
    }

    pub fn constant(&mut self, value: f64) -> ExprId {
        self.intern(Node::Constant(Constant::new(value)))
    }

    pub fn zero(&mut self) -> ExprId {
        self.constant(0.0)
    }

    pub fn one(&mut self) -> ExprId {
        self.constant(1.0)
    }

    pub fn variable(&mut self, name: &str) -> ExprId {
        self.intern(Node::Variable(name.to_owned()))
    }

    /// Split a term into its numeric coefficient and the rest
    fn split_coefficient(&mut self, id: ExprId) -> (f64, ExprId) {
        if let Node::Product(factors) = self.node(id) {
            if let Some(c) = self.as_constant(factors[0]) {
                let rest = factors[1..].to_vec();
                let base = if rest.len() == 1 {
                    rest[0]
                } else {
                    self.intern(Node::Product(rest))
                };
                return (c, base);
            }
        }
        (1.0, id)
    }

    pub fn sum(&mut self, terms: impl IntoIterator<Item = ExprId>) -> ExprId {
        let mut flat = Vec::new();
        for term in terms {
            match self.node(term) {
                Node::Sum(inner) => flat.extend_from_slice(inner),
                _ => flat.push(term),
            }
        }
        let mut constant = 0.0;
        let mut coefficients = BTreeMap::new();
        for term in flat {
            if let Some(c) = self.as_constant(term) {
                constant += c;
                continue;
            }
            let (c, base) = self.split_coefficient(term);
            *coefficients.entry(base).or_insert(0.0) += c;
        }
        let mut terms = Vec::with_capacity(coefficients.len() + 1);
        for (base, c) in coefficients {
            let c = snap(c);
            if c == 0.0 {
                continue;
            }
            if c == 1.0 {
                terms.push(base);
            } else {
                let c = self.constant(c);
                terms.push(self.product([c, base]));
            }
        }
        terms.sort();
        let constant = snap(constant);
        if constant != 0.0 {
            // the constant term is always last
            terms.push(self.constant(constant));
        }
        match terms.len() {
            0 => self.zero(),
            1 => terms[0],
            _ => self.intern(Node::Sum(terms)),
        }
    }

    pub fn product(&mut self, factors: impl IntoIterator<Item = ExprId>) -> ExprId {
        let mut coefficient = 1.0;
        let mut rest = Vec::new();
        let mut stack = factors.into_iter().collect::<Vec<_>>();
        stack.reverse();
        while let Some(factor) = stack.pop() {
            match self.node(factor) {
                Node::Constant(c) => coefficient *= c.value(),
                Node::Product(inner) => stack.extend(inner.iter().rev()),
                _ => rest.push(factor),
            }
        }
        let coefficient = snap(coefficient);
        if coefficient == 0.0 || rest.is_empty() {
            return self.constant(coefficient);
        }
        if let ([single], true) = (rest.as_slice(), coefficient != 1.0) {
            // c*(a + b) is c*a + c*b, so that like terms can cancel
            if let Node::Sum(terms) = self.node(*single) {
                let terms = terms.clone();
                let c = self.constant(coefficient);
                let scaled = terms
                    .into_iter()
                    .map(|t| self.product([c, t]))
                    .collect::<Vec<_>>();
                return self.sum(scaled);
            }
        }
        rest.sort();
        if coefficient == 1.0 {
            if rest.len() == 1 {
                return rest[0];
            }
        } else {
            rest.insert(0, self.constant(coefficient));
        }
        self.intern(Node::Product(rest))
    }

    pub fn add(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.sum([a, b])
    }

    pub fn sub(&mut self, a: ExprId, b: ExprId) -> ExprId {
        let minus_b = self.neg(b);
        self.sum([a, minus_b])
    }

    pub fn mul(&mut self, a: ExprId, b: ExprId) -> ExprId {
        self.product([a, b])
    }

    pub fn neg(&mut self, a: ExprId) -> ExprId {
        let minus_one = self.constant(-1.0);
        self.product([minus_one, a])
    }

    /// `Some(x)` if `id` is `-x` (a product with a negative coefficient)
    fn negated(&mut self, id: ExprId) -> Option<ExprId> {
        match self.split_coefficient(id) {
            (c, base) if c < 0.0 && base != id => {
                let c = self.constant(-c);
                Some(self.product([c, base]))
            }
            _ => None,
        }
    }

    pub fn sin(&mut self, arg: ExprId) -> ExprId {
        if let Some(c) = self.as_constant(arg) {
            return self.constant(c.sin());
        }
        if let Some(positive) = self.negated(arg) {
            let sin = self.sin(positive);
            return self.neg(sin);
        }
        self.intern(Node::Sin(arg))
    }

    pub fn cos(&mut self, arg: ExprId) -> ExprId {
        if let Some(c) = self.as_constant(arg) {
            return self.constant(c.cos());
        }
        if let Some(positive) = self.negated(arg) {
            return self.cos(positive);
        }
        self.intern(Node::Cos(arg))
    }

    /// Copy `id` of `other` into this arena
    ///
    /// `memo` maps the ids of `other` already imported; keep it between
    /// calls importing from the same arena.
    pub fn import(
        &mut self,
        other: &ExprArena,
        id: ExprId,
        memo: &mut HashMap<ExprId, ExprId>,
    ) -> ExprId {
        if let Some(imported) = memo.get(&id) {
            return *imported;
        }
        let imported = match other.node(id) {
            Node::Constant(c) => self.constant(c.value()),
            Node::Variable(name) => self.variable(name),
            Node::Sum(terms) => {
                let terms = terms
                    .iter()
                    .map(|t| self.import(other, *t, memo))
                    .collect::<Vec<_>>();
                self.sum(terms)
            }
            Node::Product(factors) => {
                let factors = factors
                    .iter()
                    .map(|f| self.import(other, *f, memo))
                    .collect::<Vec<_>>();
                self.product(factors)
            }
            Node::Sin(arg) => {
                let arg = self.import(other, *arg, memo);
                self.sin(arg)
            }
            Node::Cos(arg) => {
                let arg = self.import(other, *arg, memo);
                self.cos(arg)
            }
        };
        memo.insert(id, imported);
        imported
    }

    /// Names of the variables `id` depends on
    pub fn variables(&self, id: ExprId) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            match self.node(id) {
                Node::Variable(name) => {
                    names.insert(name.clone());
                }
                node => stack.extend_from_slice(node.children()),
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_folding() {
        let mut arena = ExprArena::new();
        let two = arena.constant(2.0);
        let three = arena.constant(3.0);
        let five = arena.add(two, three);
        assert_eq!(arena.as_constant(five), Some(5.0));
        let six = arena.mul(two, three);
        assert_eq!(arena.as_constant(six), Some(6.0));
    }

    #[test]
    fn test_snap() {
        let mut arena = ExprArena::new();
        let half_pi = arena.constant(std::f64::consts::FRAC_PI_2);
        let cos = arena.cos(half_pi);
        assert_eq!(cos, arena.zero());
        let sin = arena.sin(half_pi);
        assert_eq!(sin, arena.one());
        let minus_zero = arena.constant(-0.0);
        assert_eq!(minus_zero, arena.zero());
    }

    #[test]
    fn test_identities() {
        let mut arena = ExprArena::new();
        let x = arena.variable("x");
        let zero = arena.zero();
        let one = arena.one();
        assert_eq!(arena.add(x, zero), x);
        assert_eq!(arena.mul(x, one), x);
        assert_eq!(arena.mul(x, zero), zero);
        let minus_x = arena.neg(x);
        assert_eq!(arena.neg(minus_x), x);
        assert_eq!(arena.add(x, minus_x), zero);
    }

    #[test]
    fn test_like_terms() {
        let mut arena = ExprArena::new();
        let x = arena.variable("x");
        let y = arena.variable("y");
        let xy = arena.mul(x, y);
        let yx = arena.mul(y, x);
        assert_eq!(xy, yx);
        let two = arena.constant(2.0);
        let doubled = arena.add(xy, yx);
        assert_eq!(doubled, arena.product([two, x, y]));
    }

    #[test]
    fn test_coefficient_of_sum() {
        let mut arena = ExprArena::new();
        let x = arena.variable("x");
        let y = arena.variable("y");
        let c = arena.constant(0.1);
        let inner = arena.sum([x, y, c]);
        let negated = arena.neg(inner);
        let minus_x = arena.neg(x);
        let minus_y = arena.neg(y);
        let minus_c = arena.constant(-0.1);
        assert_eq!(negated, arena.sum([minus_x, minus_y, minus_c]));
        // x + y - (x + y + 0.1) keeps only the constant
        let outer = arena.add(x, y);
        let cancelled = arena.sub(outer, inner);
        assert_eq!(arena.as_constant(cancelled), Some(-0.1));
        let two = arena.constant(2.0);
        let doubled = arena.mul(two, inner);
        let two_x = arena.mul(two, x);
        let two_y = arena.mul(two, y);
        let two_c = arena.constant(0.2);
        assert_eq!(doubled, arena.sum([two_x, two_y, two_c]));
        // products with other factors keep the sum
        let kept = arena.product([two, x, inner]);
        assert!(matches!(arena.node(kept), Node::Product(f) if f.contains(&inner)));
    }

    #[test]
    fn test_trig_sign() {
        let mut arena = ExprArena::new();
        let x = arena.variable("x");
        let minus_x = arena.neg(x);
        let sin_x = arena.sin(x);
        let sin_minus_x = arena.sin(minus_x);
        assert_eq!(sin_minus_x, arena.neg(sin_x));
        let cos_x = arena.cos(x);
        assert_eq!(arena.cos(minus_x), cos_x);
    }

    #[test]
    fn test_import() {
        let mut local = ExprArena::new();
        let x = local.variable("x");
        let s = local.sin(x);
        let c = local.cos(x);
        let expr = local.mul(s, c);

        let mut merged = ExprArena::new();
        let y = merged.variable("y");
        let sy = merged.sin(y);
        let imported = merged.import(&local, expr, &mut HashMap::new());
        assert_ne!(imported, sy);
        let mx = merged.variable("x");
        let ms = merged.sin(mx);
        let mc = merged.cos(mx);
        assert_eq!(imported, merged.mul(ms, mc));
        assert_eq!(merged.variables(imported).into_iter().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_weight() {
        let mut arena = ExprArena::new();
        let x = arena.variable("x");
        let y = arena.variable("y");
        assert_eq!(arena.weight(x), 0);
        let s = arena.sin(x);
        assert_eq!(arena.weight(s), 1);
        let sum = arena.add(s, y);
        assert_eq!(arena.weight(sum), 2);
    }
}
