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
//! Common subexpression elimination inside and across generated functions
use crate::function::*;
use crate::symbolic::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// How an expression is replaced by a name in the generated code
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// Local temporary, `x<i>`
    Temporary(usize),
    /// Entry of the matrix returned by the `call`-th call of the function
    Entry { call: usize, row: usize, col: usize },
}

/// Body of an optimized function
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Same output as the function at index `callee`, which is called
    Alias { callee: usize },
    Computed {
        /// Indices of the called functions, bound to `res<i>`
        calls: Vec<usize>,
        /// Shared subexpressions in evaluation order, bound to `x<i>`
        temporaries: Vec<ExprId>,
        /// Expressions which are written by name
        references: HashMap<ExprId, Reference>,
    },
}

/// Function ready to be emitted
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub raw: RawFunction,
    pub body: Body,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.raw.name
    }

    /// Indices of the functions this one calls
    pub fn callees(&self) -> Vec<usize> {
        match &self.body {
            Body::Alias { callee } => vec![*callee],
            Body::Computed { calls, .. } => calls.clone(),
        }
    }
}

/// Find the expressions worth computing once
///
/// Functions are processed in the given order. A function may only call a
/// function placed before it whose parameters are a subset of its own, and
/// only when the operations the call replaces are at least the operations
/// the callee runs. A function with calls never runs more operations than
/// its inlined version.
#[derive(Clone, Debug)]
pub struct Optimizer {
    min_shared_cost: usize,
}

impl Default for Optimizer {
    fn default() -> Self {
        Self { min_shared_cost: 4 }
    }
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest weight of an expression taken from another function instead
    /// of being computed again
    pub fn min_shared_cost(mut self, cost: usize) -> Self {
        self.min_shared_cost = cost;
        self
    }

    pub fn optimize(&self, arena: &ExprArena, functions: Vec<RawFunction>) -> Vec<Function> {
        let mut optimized: Vec<Function> = Vec::with_capacity(functions.len());
        // operations run by each function, its calls included
        let mut costs: Vec<usize> = Vec::with_capacity(functions.len());
        // shareable output entries of the computed functions: (function, row, col)
        let mut owners: HashMap<ExprId, Vec<(usize, usize, usize)>> = HashMap::new();
        for raw in functions {
            let index = optimized.len();
            if let Some(callee) = find_alias(arena, &optimized, &raw) {
                debug!(function = %raw.name, callee = %optimized[callee].name(), "alias");
                costs.push(costs[callee]);
                optimized.push(Function {
                    raw,
                    body: Body::Alias { callee },
                });
                continue;
            }
            let (body, cost) = self.compute(arena, &optimized, &costs, &owners, &raw);
            for r in 0..raw.output.nrows() {
                for c in 0..raw.output.ncols() {
                    let id = raw.output[(r, c)];
                    if arena.weight(id) >= self.min_shared_cost {
                        owners.entry(id).or_default().push((index, r, c));
                    }
                }
            }
            if let Body::Computed {
                calls, temporaries, ..
            } = &body
            {
                debug!(
                    function = %raw.name,
                    calls = calls.len(),
                    temporaries = temporaries.len(),
                    cost,
                    "optimized"
                );
            }
            costs.push(cost);
            optimized.push(Function { raw, body });
        }
        optimized
    }

    /// Body of `raw` and the operations it runs, its calls included
    fn compute(
        &self,
        arena: &ExprArena,
        previous: &[Function],
        costs: &[usize],
        owners: &HashMap<ExprId, Vec<(usize, usize, usize)>>,
        raw: &RawFunction,
    ) -> (Body, usize) {
        // 1. expressions taken from previous functions, as long as calling
        // them costs less than what they replace
        let inlined = operations(arena, &raw.output, &HashMap::<ExprId, ()>::new());
        let mut rejected = HashSet::new();
        let (substituted, cost) = loop {
            let substituted = substitutions(arena, previous, owners, raw, &rejected);
            let own = operations(arena, &raw.output, &substituted);
            let callees = substituted
                .values()
                .map(|(f, _, _)| *f)
                .collect::<BTreeSet<_>>();
            let worst = callees
                .iter()
                .map(|callee| {
                    let without = substituted
                        .iter()
                        .filter(|(_, (f, _, _))| f != callee)
                        .map(|(id, owner)| (*id, *owner))
                        .collect::<HashMap<_, _>>();
                    let saved = operations(arena, &raw.output, &without).saturating_sub(own);
                    (saved as isize - costs[*callee] as isize, *callee)
                })
                .min();
            if let Some((gain, callee)) = worst {
                if gain < 0 {
                    rejected.insert(callee);
                    continue;
                }
            }
            let cost = own + callees.iter().map(|f| costs[*f]).sum::<usize>();
            if cost > inlined {
                // savings counted by more than one callee
                rejected.extend(callees);
                continue;
            }
            break (substituted, cost);
        };
        let calls = substituted
            .values()
            .map(|(f, _, _)| *f)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let mut references = substituted
            .iter()
            .map(|(id, (f, row, col))| {
                let call = calls.iter().position(|c| c == f).unwrap_or_default();
                (
                    *id,
                    Reference::Entry {
                        call,
                        row: *row,
                        col: *col,
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        // 2. in-degree of the remaining nodes
        let is_opaque = |id: ExprId| substituted.contains_key(&id) || arena.node(id).is_leaf();
        let mut uses: HashMap<ExprId, usize> = HashMap::new();
        let mut expanded = HashSet::new();
        let mut stack = Vec::new();
        for id in row_major(&raw.output) {
            *uses.entry(id).or_default() += 1;
            stack.push(id);
        }
        while let Some(id) = stack.pop() {
            if is_opaque(id) || !expanded.insert(id) {
                continue;
            }
            for child in arena.node(id).children() {
                *uses.entry(*child).or_default() += 1;
                stack.push(*child);
            }
        }

        // 3. shared nodes become temporaries, in post order
        let mut temporaries = Vec::new();
        let mut seen = HashSet::new();
        for root in row_major(&raw.output) {
            let mut stack = vec![(root, false)];
            while let Some((id, children_done)) = stack.pop() {
                if children_done {
                    if uses.get(&id).copied().unwrap_or_default() >= 2 {
                        references.insert(id, Reference::Temporary(temporaries.len()));
                        temporaries.push(id);
                    }
                    continue;
                }
                if is_opaque(id) || !seen.insert(id) {
                    continue;
                }
                stack.push((id, true));
                for child in arena.node(id).children().iter().rev() {
                    stack.push((*child, false));
                }
            }
        }
        (
            Body::Computed {
                calls,
                temporaries,
                references,
            },
            cost,
        )
    }
}

/// Outermost expressions of `raw` found in the outputs of the callable
/// previous functions, except the `rejected` ones
fn substitutions(
    arena: &ExprArena,
    previous: &[Function],
    owners: &HashMap<ExprId, Vec<(usize, usize, usize)>>,
    raw: &RawFunction,
    rejected: &HashSet<usize>,
) -> HashMap<ExprId, (usize, usize, usize)> {
    let mut substituted = HashMap::new();
    let mut visited = HashSet::new();
    let mut stack = raw.output.iter().copied().collect::<Vec<_>>();
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let owner = owners.get(&id).and_then(|candidates| {
            candidates.iter().find(|(f, _, _)| {
                !rejected.contains(f) && previous[*f].raw.parameters_within(raw)
            })
        });
        match owner {
            Some(owner) => {
                substituted.insert(id, *owner);
            }
            None => stack.extend_from_slice(arena.node(id).children()),
        }
    }
    substituted
}

/// Number of distinct operations computing `output`, the `substituted`
/// expressions being given
fn operations<V>(
    arena: &ExprArena,
    output: &SymMatrix,
    substituted: &HashMap<ExprId, V>,
) -> usize {
    let mut visited = HashSet::new();
    let mut stack = output.iter().copied().collect::<Vec<_>>();
    let mut count = 0;
    while let Some(id) = stack.pop() {
        if substituted.contains_key(&id) || !visited.insert(id) {
            continue;
        }
        let node = arena.node(id);
        if !node.is_leaf() {
            count += 1;
            stack.extend_from_slice(node.children());
        }
    }
    count
}

/// Earlier computed function returning the same matrix
fn find_alias(arena: &ExprArena, previous: &[Function], raw: &RawFunction) -> Option<usize> {
    if raw.output.iter().all(|id| arena.is_constant(*id)) {
        return None;
    }
    previous.iter().position(|f| {
        matches!(f.body, Body::Computed { .. })
            && f.raw.output == raw.output
            && f.raw.parameters_within(raw)
    })
}

fn row_major(m: &SymMatrix) -> impl Iterator<Item = ExprId> + '_ {
    (0..m.nrows()).flat_map(move |r| (0..m.ncols()).map(move |c| m[(r, c)]))
}
