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
use super::arena::*;
use super::matrix::SymMatrix;
use crate::errors::*;
use nalgebra::DMatrix;
use std::collections::HashMap;

impl ExprArena {
    /// Numeric value of `id` for the given variable values
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use symkin::symbolic::ExprArena;
    ///
    /// let mut arena = ExprArena::new();
    /// let x = arena.variable("x");
    /// let s = arena.sin(x);
    /// let values = HashMap::from([("x".to_owned(), 0.5)]);
    /// assert!((arena.eval(s, &values).unwrap() - 0.5f64.sin()).abs() < 1e-12);
    /// assert!(arena.eval(s, &HashMap::new()).is_err());
    /// ```
    pub fn eval(&self, id: ExprId, values: &HashMap<String, f64>) -> Result<f64> {
        self.eval_memo(id, values, &mut HashMap::new())
    }

    fn eval_memo(
        &self,
        id: ExprId,
        values: &HashMap<String, f64>,
        memo: &mut HashMap<ExprId, f64>,
    ) -> Result<f64> {
        if let Some(v) = memo.get(&id) {
            return Ok(*v);
        }
        let value = match self.node(id) {
            Node::Constant(c) => c.value(),
            Node::Variable(name) => *values
                .get(name)
                .ok_or_else(|| Error::UnboundVariable { name: name.clone() })?,
            Node::Sum(terms) => {
                let mut total = 0.0;
                for t in terms {
                    total += self.eval_memo(*t, values, memo)?;
                }
                total
            }
            Node::Product(factors) => {
                let mut total = 1.0;
                for f in factors {
                    total *= self.eval_memo(*f, values, memo)?;
                }
                total
            }
            Node::Sin(arg) => self.eval_memo(*arg, values, memo)?.sin(),
            Node::Cos(arg) => self.eval_memo(*arg, values, memo)?.cos(),
        };
        memo.insert(id, value);
        Ok(value)
    }

    /// Numeric value of every entry of `m`
    pub fn eval_matrix(&self, m: &SymMatrix, values: &HashMap<String, f64>) -> Result<DMatrix<f64>> {
        let mut memo = HashMap::new();
        let mut out = DMatrix::zeros(m.nrows(), m.ncols());
        for (dst, src) in out.iter_mut().zip(m.iter()) {
            *dst = self.eval_memo(*src, values, &mut memo)?;
        }
        Ok(out)
    }

    /// Partial derivative of `id` with respect to the variable `name`
    pub fn diff(&mut self, id: ExprId, name: &str) -> ExprId {
        self.diff_memo(id, name, &mut HashMap::new())
    }

    fn diff_memo(&mut self, id: ExprId, name: &str, memo: &mut HashMap<ExprId, ExprId>) -> ExprId {
        if let Some(d) = memo.get(&id) {
            return *d;
        }
        let d = match self.node(id).clone() {
            Node::Constant(_) => self.zero(),
            Node::Variable(v) => {
                if v == name {
                    self.one()
                } else {
                    self.zero()
                }
            }
            Node::Sum(terms) => {
                let terms = terms
                    .iter()
                    .map(|t| self.diff_memo(*t, name, memo))
                    .collect::<Vec<_>>();
                self.sum(terms)
            }
            Node::Product(factors) => {
                let mut terms = Vec::with_capacity(factors.len());
                for (i, f) in factors.iter().enumerate() {
                    let df = self.diff_memo(*f, name, memo);
                    if self.as_constant(df) == Some(0.0) {
                        continue;
                    }
                    let others = factors
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, g)| *g)
                        .chain(std::iter::once(df))
                        .collect::<Vec<_>>();
                    terms.push(self.product(others));
                }
                self.sum(terms)
            }
            Node::Sin(arg) => {
                let da = self.diff_memo(arg, name, memo);
                let cos = self.cos(arg);
                self.mul(cos, da)
            }
            Node::Cos(arg) => {
                let da = self.diff_memo(arg, name, memo);
                let sin = self.sin(arg);
                let d = self.mul(sin, da);
                self.neg(d)
            }
        };
        memo.insert(id, d);
        d
    }

    /// Partial derivative of every entry of `m`
    pub fn diff_matrix(&mut self, m: &SymMatrix, name: &str) -> SymMatrix {
        let mut memo = HashMap::new();
        m.map(|id| self.diff_memo(id, name, &mut memo))
    }
}
