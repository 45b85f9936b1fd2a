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
use nalgebra::DMatrix;
use std::collections::HashMap;

/// Matrix of symbolic expressions
pub type SymMatrix = DMatrix<ExprId>;

impl ExprArena {
    /// `n`×`n` identity matrix
    pub fn identity(&mut self, n: usize) -> SymMatrix {
        let zero = self.zero();
        let one = self.one();
        DMatrix::from_fn(n, n, |r, c| if r == c { one } else { zero })
    }

    pub fn zeros(&mut self, rows: usize, cols: usize) -> SymMatrix {
        let zero = self.zero();
        DMatrix::from_element(rows, cols, zero)
    }

    /// Matrix product, the shapes must agree
    pub fn matmul(&mut self, a: &SymMatrix, b: &SymMatrix) -> SymMatrix {
        assert_eq!(a.ncols(), b.nrows(), "matrix shapes do not agree");
        let mut out = self.zeros(a.nrows(), b.ncols());
        for r in 0..a.nrows() {
            for c in 0..b.ncols() {
                let terms = (0..a.ncols())
                    .map(|k| self.mul(a[(r, k)], b[(k, c)]))
                    .collect::<Vec<_>>();
                out[(r, c)] = self.sum(terms);
            }
        }
        out
    }

    /// Inverse of a 4×4 homogeneous rigid transform: `[Rᵀ | -Rᵀ p]`
    pub fn rigid_inverse(&mut self, t: &SymMatrix) -> SymMatrix {
        let mut out = self.identity(4);
        for r in 0..3 {
            for c in 0..3 {
                out[(r, c)] = t[(c, r)];
            }
        }
        for r in 0..3 {
            let terms = (0..3)
                .map(|k| self.mul(t[(k, r)], t[(k, 3)]))
                .collect::<Vec<_>>();
            let dot = self.sum(terms);
            out[(r, 3)] = self.neg(dot);
        }
        out
    }

    pub fn cross(&mut self, a: &[ExprId; 3], b: &[ExprId; 3]) -> [ExprId; 3] {
        let mut component = |i: usize, j: usize| {
            let p = self.mul(a[i], b[j]);
            let q = self.mul(a[j], b[i]);
            self.sub(p, q)
        };
        [component(1, 2), component(2, 0), component(0, 1)]
    }

    pub fn sub3(&mut self, a: &[ExprId; 3], b: &[ExprId; 3]) -> [ExprId; 3] {
        [
            self.sub(a[0], b[0]),
            self.sub(a[1], b[1]),
            self.sub(a[2], b[2]),
        ]
    }

    pub fn scale3(&mut self, s: ExprId, a: &[ExprId; 3]) -> [ExprId; 3] {
        [self.mul(s, a[0]), self.mul(s, a[1]), self.mul(s, a[2])]
    }

    /// Copy a matrix of `other` into this arena
    pub fn import_matrix(
        &mut self,
        other: &ExprArena,
        m: &SymMatrix,
        memo: &mut HashMap<ExprId, ExprId>,
    ) -> SymMatrix {
        m.map(|id| self.import(other, id, memo))
    }
}

/// First three entries of column `col` of a homogeneous transform
pub fn column3(t: &SymMatrix, col: usize) -> [ExprId; 3] {
    [t[(0, col)], t[(1, col)], t[(2, col)]]
}

/// Translation part of a homogeneous transform
pub fn translation(t: &SymMatrix) -> [ExprId; 3] {
    column3(t, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_product() {
        let mut arena = ExprArena::new();
        let x = arena.variable("x");
        let m = DMatrix::from_fn(2, 2, |r, c| if r == c { x } else { arena.zero() });
        let i = arena.identity(2);
        assert_eq!(arena.matmul(&i, &m), m);
        assert_eq!(arena.matmul(&m, &i), m);
    }

    #[test]
    fn test_cross() {
        let mut arena = ExprArena::new();
        let zero = arena.zero();
        let one = arena.one();
        let x = [one, zero, zero];
        let y = [zero, one, zero];
        assert_eq!(arena.cross(&x, &y), [zero, zero, one]);
    }

    #[test]
    fn test_rigid_inverse_of_identity() {
        let mut arena = ExprArena::new();
        let i = arena.identity(4);
        assert_eq!(arena.rigid_inverse(&i), i);
    }
}
