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
//! Render optimized functions as source code
use crate::errors::*;
use crate::function::Section;
use crate::language::*;
use crate::optimize::*;
use crate::symbolic::*;
use std::collections::{BTreeSet, HashMap};
use tracing::info;

/// Write functions in a `Language`
#[derive(Clone, Debug)]
pub struct Emitter {
    language: Language,
    header: Option<Vec<String>>,
    section_titles: bool,
    class_name: String,
}

impl Emitter {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            header: None,
            section_titles: true,
            class_name: "Kinematics".to_owned(),
        }
    }

    /// Comment lines written at the top of the file, followed by the imports
    pub fn header(mut self, lines: Vec<String>) -> Self {
        self.header = Some(lines);
        self
    }

    pub fn section_titles(mut self, section_titles: bool) -> Self {
        self.section_titles = section_titles;
        self
    }

    /// Name of the MATLAB class holding the functions as static methods
    ///
    /// The file must be saved as `<name>.m`.
    pub fn class_name(mut self, name: &str) -> Self {
        self.class_name = name.to_owned();
        self
    }

    /// Source text of every function, callees first
    ///
    /// Returns the text and the function indices in output order.
    pub fn emit(&self, arena: &ExprArena, functions: &[Function]) -> Result<(String, Vec<usize>)> {
        let order = dependency_order(functions)?;
        let lang = self.language;
        let separator = match lang {
            Language::Python => "\n\n\n",
            Language::Julia | Language::Matlab => "\n\n",
        };
        let mut blocks = Vec::new();
        if let Some(header) = &self.header {
            let mut block = header
                .iter()
                .map(|l| format!("{} {}", lang.comment_prefix(), l).trim_end().to_owned())
                .collect::<Vec<_>>();
            let imports = lang.imports();
            if !imports.is_empty() {
                block.push(String::new());
                block.extend(imports);
            }
            blocks.push(block.join("\n"));
        }
        if lang == Language::Matlab {
            blocks.push(format!("classdef {}\nmethods (Static)", self.class_name));
        }
        let mut section: Option<Section> = None;
        for index in &order {
            let function = &functions[*index];
            let current = function.raw.key.section();
            if self.section_titles && section != Some(current) {
                blocks.push(lang.title(current.title()));
            }
            section = Some(current);
            blocks.push(self.function(arena, functions, function));
        }
        if lang == Language::Matlab {
            blocks.push("end\nend".to_owned());
        }
        let mut code = blocks.join(separator);
        code.push('\n');
        info!(language = %lang, functions = order.len(), bytes = code.len(), "code emitted");
        Ok((code, order))
    }

    fn function(&self, arena: &ExprArena, functions: &[Function], function: &Function) -> String {
        let lang = self.language;
        let raw = &function.raw;
        let parameters = raw.parameters.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        let mut lines = Vec::new();
        if self.section_titles {
            lines.push(lang.subtitle(&raw.name));
            lines.push(String::new());
        }
        let doc = lang.doc(&raw.name, &parameters, &self.doc_lines(function));
        if lang.doc_before_signature() {
            lines.extend(doc.iter().cloned());
        }
        lines.push(lang.signature(&raw.name, &parameters));
        if !lang.doc_before_signature() {
            lines.extend(doc);
        }
        match &function.body {
            Body::Alias { callee } => {
                lines.push(lang.return_value(&self.call(&functions[*callee])));
            }
            Body::Computed {
                calls,
                temporaries,
                references,
            } => {
                let writer = ExprWriter {
                    lang,
                    arena,
                    references,
                };
                for (i, callee) in calls.iter().enumerate() {
                    lines.push(lang.assignment(&format!("res{i}"), &self.call(&functions[*callee])));
                }
                for (i, id) in temporaries.iter().enumerate() {
                    lines.push(lang.assignment(&format!("x{i}"), &writer.node(*id)));
                }
                let rows = (0..raw.output.nrows())
                    .map(|r| {
                        (0..raw.output.ncols())
                            .map(|c| writer.expr(raw.output[(r, c)]))
                            .collect::<Vec<_>>()
                    })
                    .collect::<Vec<_>>();
                let column = lang.return_value("").trim_end_matches(';').len();
                lines.push(lang.return_value(&lang.matrix_literal(&rows, column)));
            }
        }
        if let Some(end) = lang.end() {
            lines.push(end.to_owned());
        }
        lines.join("\n")
    }

    fn doc_lines(&self, function: &Function) -> Vec<String> {
        let lang = self.language;
        let raw = &function.raw;
        let width = lang.doc_width();
        let mut lines = wrap(&raw.description, width, "");
        if !raw.parameters.is_empty() {
            lines.push(String::new());
            lines.push("Parameters".to_owned());
            lines.push("----------".to_owned());
            for parameter in &raw.parameters {
                lines.push(format!("{} : {}", parameter.name, lang.scalar_type()));
                lines.extend(wrap(&parameter.description(), width, INDENT));
            }
        }
        lines.push(String::new());
        lines.push("Returns".to_owned());
        lines.push("-------".to_owned());
        lines.push(lang.matrix_type().to_owned());
        lines.extend(wrap(&raw.returns, width, INDENT));
        for (i, column) in raw.columns.iter().enumerate() {
            lines.push(format!("{INDENT}Column {}: {}", i + lang.index_base(), column));
        }
        lines
    }

    /// Call of another generated function, MATLAB calls go through the class
    fn call(&self, callee: &Function) -> String {
        let arguments = callee
            .raw
            .parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>();
        match self.language {
            Language::Matlab => {
                let name = format!("{}.{}", self.class_name, callee.name());
                self.language.call(&name, &arguments)
            }
            Language::Python | Language::Julia => self.language.call(callee.name(), &arguments),
        }
    }
}

/// Order the functions so that every callee comes before its callers
///
/// Among the functions ready to be written, the lowest index goes first.
pub fn dependency_order(functions: &[Function]) -> Result<Vec<usize>> {
    let mut pending = functions.iter().map(|f| f.callees().len()).collect::<Vec<_>>();
    let mut callers = vec![Vec::new(); functions.len()];
    for (i, f) in functions.iter().enumerate() {
        for callee in f.callees() {
            callers[callee].push(i);
        }
    }
    let mut ready = (0..functions.len())
        .filter(|i| pending[*i] == 0)
        .collect::<BTreeSet<_>>();
    let mut order = Vec::with_capacity(functions.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for caller in &callers[next] {
            pending[*caller] -= 1;
            if pending[*caller] == 0 {
                ready.insert(*caller);
            }
        }
    }
    if order.len() != functions.len() {
        let functions = (0..functions.len())
            .filter(|i| pending[*i] > 0)
            .map(|i| functions[i].name().to_owned())
            .collect();
        return Err(Error::DependencyCycle { functions });
    }
    Ok(order)
}

/// Greedy word wrap, every line starts with `indent`
fn wrap(text: &str, width: usize, indent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && indent.len() + line.len() + 1 + word.len() > width {
            lines.push(format!("{indent}{line}"));
            line.clear();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(format!("{indent}{line}"));
    }
    lines
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

struct ExprWriter<'a> {
    lang: Language,
    arena: &'a ExprArena,
    references: &'a HashMap<ExprId, Reference>,
}

impl ExprWriter<'_> {
    /// `id`, by name if it has one
    fn expr(&self, id: ExprId) -> String {
        match self.references.get(&id) {
            Some(Reference::Temporary(i)) => format!("x{i}"),
            Some(Reference::Entry { call, row, col }) => {
                self.lang.index(&format!("res{call}"), *row, *col)
            }
            None => self.node(id),
        }
    }

    /// Definition of `id`, its operands by name
    fn node(&self, id: ExprId) -> String {
        match self.arena.node(id) {
            Node::Constant(c) => number(c.value()),
            Node::Variable(name) => name.clone(),
            Node::Sin(arg) => format!("sin({})", self.expr(*arg)),
            Node::Cos(arg) => format!("cos({})", self.expr(*arg)),
            Node::Sum(terms) => {
                let mut out = String::new();
                for (i, term) in terms.iter().enumerate() {
                    let (negative, magnitude) = self.signed(*term);
                    match (i, negative) {
                        (0, true) => out.push('-'),
                        (0, false) => {}
                        (_, true) => out.push_str(" - "),
                        (_, false) => out.push_str(" + "),
                    }
                    out.push_str(&magnitude);
                }
                out
            }
            Node::Product(factors) => match self.product(factors) {
                (true, magnitude) => format!("-{magnitude}"),
                (false, magnitude) => magnitude,
            },
        }
    }

    /// Sign and magnitude of a term of a sum
    fn signed(&self, id: ExprId) -> (bool, String) {
        if self.references.contains_key(&id) {
            return (false, self.expr(id));
        }
        match self.arena.node(id) {
            Node::Constant(c) if c.value() < 0.0 => (true, number(-c.value())),
            Node::Product(factors) => self.product(factors),
            _ => (false, self.node(id)),
        }
    }

    fn product(&self, factors: &[ExprId]) -> (bool, String) {
        let mut negative = false;
        let mut parts = Vec::with_capacity(factors.len());
        for (i, factor) in factors.iter().enumerate() {
            if let (0, Some(c)) = (i, self.arena.as_constant(*factor)) {
                negative = c < 0.0;
                if c.abs() != 1.0 {
                    parts.push(number(c.abs()));
                }
                continue;
            }
            let text = self.expr(*factor);
            let is_sum = matches!(self.arena.node(*factor), Node::Sum(_));
            if is_sum && !self.references.contains_key(factor) {
                parts.push(format!("({text})"));
            } else {
                parts.push(text);
            }
        }
        (negative, parts.join("*"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Direction;
    use crate::function::*;
    use crate::robot::JointId;
    use nalgebra::DMatrix;

    fn function(name: &str, callees: Vec<usize>) -> Function {
        Function {
            raw: RawFunction {
                key: FunctionKey::Transform {
                    joint: JointId::new(0),
                    direction: Direction::Forward,
                },
                name: name.to_owned(),
                request: 0,
                description: String::new(),
                returns: String::new(),
                parameters: vec![],
                columns: vec![],
                output: DMatrix::from_element(0, 0, ExprArena::new().zero()),
            },
            body: Body::Computed {
                calls: callees,
                temporaries: vec![],
                references: HashMap::new(),
            },
        }
    }

    #[test]
    fn test_dependency_order() {
        let functions = vec![
            function("a", vec![2]),
            function("b", vec![]),
            function("c", vec![1]),
        ];
        assert_eq!(dependency_order(&functions).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn test_dependency_cycle() {
        let functions = vec![
            function("a", vec![1]),
            function("b", vec![0]),
            function("c", vec![]),
        ];
        let err = dependency_order(&functions).unwrap_err();
        assert_eq!(
            err,
            Error::DependencyCycle {
                functions: vec!["a".to_owned(), "b".to_owned()]
            }
        );
    }

    #[test]
    fn test_expressions() {
        let mut arena = ExprArena::new();
        let x = arena.variable("x");
        let y = arena.variable("y");
        let half = arena.constant(0.5);
        let minus_x = arena.neg(x);
        let s = arena.sin(x);
        let scaled = arena.product([half, s, y]);
        let diff = arena.sub(y, scaled);
        let sum = arena.add(x, y);
        let product = arena.mul(sum, minus_x);
        let references = HashMap::new();
        let writer = ExprWriter {
            lang: Language::Python,
            arena: &arena,
            references: &references,
        };
        assert_eq!(writer.expr(minus_x), "-x");
        assert_eq!(writer.expr(half), "0.5");
        let one = arena.one();
        let writer = ExprWriter {
            lang: Language::Python,
            arena: &arena,
            references: &references,
        };
        assert_eq!(writer.expr(one), "1.0");
        let text = writer.expr(diff);
        assert_eq!(text, "y - 0.5*y*sin(x)");
        let text = writer.expr(product);
        assert!(text.starts_with('-') && text.contains("(x + y)"), "{text}");
    }

    #[test]
    fn test_wrap() {
        let lines = wrap("aaa bbb ccc", 8, "  ");
        assert_eq!(lines, vec!["  aaa", "  bbb", "  ccc"]);
        assert_eq!(wrap("aaa bbb", 80, ""), vec!["aaa bbb"]);
    }
}
