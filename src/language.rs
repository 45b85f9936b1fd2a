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
//! Syntax of the supported output languages
use crate::errors::*;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Output language of the generated code
///
/// # Examples
///
/// ```
/// use symkin::Language;
///
/// let language: Language = "Julia".parse().unwrap();
/// assert_eq!(language, Language::Julia);
/// assert!("cobol".parse::<Language>().is_err());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// Python with numpy
    #[default]
    Python,
    Julia,
    Matlab,
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "julia" | "jl" => Ok(Language::Julia),
            "matlab" | "m" => Ok(Language::Matlab),
            _ => Err(Error::UnsupportedLanguage { name: s.to_owned() }),
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Language::Python => "python",
            Language::Julia => "julia",
            Language::Matlab => "matlab",
        };
        write!(f, "{name}")
    }
}

pub(crate) const INDENT: &str = "    ";

impl Language {
    pub fn comment_prefix(self) -> &'static str {
        match self {
            Language::Python | Language::Julia => "#",
            Language::Matlab => "%",
        }
    }

    pub fn max_line_length(self) -> usize {
        match self {
            Language::Python => 79,
            Language::Julia => 92,
            Language::Matlab => 75,
        }
    }

    /// First index of arrays, used when documenting Jacobian columns
    pub fn index_base(self) -> usize {
        match self {
            Language::Python => 0,
            Language::Julia | Language::Matlab => 1,
        }
    }

    pub fn scalar_type(self) -> &'static str {
        match self {
            Language::Python => "float",
            Language::Julia => "Float64",
            Language::Matlab => "double",
        }
    }

    pub fn matrix_type(self) -> &'static str {
        match self {
            Language::Python => "numpy.ndarray",
            Language::Julia => "Matrix{Float64}",
            Language::Matlab => "double matrix",
        }
    }

    /// Lines needed before the first function
    pub fn imports(self) -> Vec<String> {
        match self {
            Language::Python => vec![
                "from math import cos, sin".to_owned(),
                "from numpy import array, zeros".to_owned(),
            ],
            Language::Julia | Language::Matlab => vec![],
        }
    }

    /// Whether the documentation comes before the signature
    pub fn doc_before_signature(self) -> bool {
        matches!(self, Language::Julia)
    }

    pub fn signature(self, name: &str, parameters: &[&str]) -> String {
        let parameters = parameters.join(", ");
        match self {
            Language::Python => format!("def {name}({parameters}):"),
            Language::Julia => format!("function {name}({parameters})"),
            Language::Matlab => format!("function out = {name}({parameters})"),
        }
    }

    pub fn end(self) -> Option<&'static str> {
        match self {
            Language::Python => None,
            Language::Julia | Language::Matlab => Some("end"),
        }
    }

    fn terminator(self) -> &'static str {
        match self {
            Language::Matlab => ";",
            Language::Python | Language::Julia => "",
        }
    }

    pub fn assignment(self, name: &str, value: &str) -> String {
        format!("{INDENT}{name} = {value}{}", self.terminator())
    }

    pub fn return_value(self, value: &str) -> String {
        match self {
            Language::Python | Language::Julia => format!("{INDENT}return {value}"),
            Language::Matlab => format!("{INDENT}out = {value};"),
        }
    }

    pub fn call(self, name: &str, arguments: &[&str]) -> String {
        format!("{}({})", name, arguments.join(", "))
    }

    /// Entry of a matrix bound to `name`, `row` and `col` counted from 0
    pub fn index(self, name: &str, row: usize, col: usize) -> String {
        match self {
            Language::Python => format!("{name}[{row}, {col}]"),
            Language::Julia => format!("{}[{}, {}]", name, row + 1, col + 1),
            Language::Matlab => format!("{}({}, {})", name, row + 1, col + 1),
        }
    }

    /// Matrix literal from rendered entries, `rows` must not be empty
    ///
    /// The first line is not indented, the following ones are aligned for
    /// a statement starting at `column`.
    pub fn matrix_literal(self, rows: &[Vec<String>], column: usize) -> String {
        let nrows = rows.len();
        let ncols = rows.first().map(|r| r.len()).unwrap_or_default();
        if ncols == 0 {
            return match self {
                Language::Python => format!("zeros(({nrows}, 0))"),
                Language::Julia | Language::Matlab => format!("zeros({nrows}, 0)"),
            };
        }
        match self {
            Language::Python => {
                let pad = " ".repeat(column + "array([".len());
                let lines = rows
                    .iter()
                    .map(|r| format!("[{}]", r.join(", ")))
                    .collect::<Vec<_>>();
                format!("array([{}])", lines.join(&format!(",\n{pad}")))
            }
            Language::Julia => {
                // a single column literal is a Vector, reshape it to a Matrix
                let reshape = ncols == 1;
                let open = if reshape { "reshape([" } else { "[" };
                let pad = " ".repeat(column + open.len());
                let lines = rows
                    .iter()
                    .map(|r| {
                        r.iter()
                            .map(|e| julia_element(e))
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .collect::<Vec<_>>();
                let literal = format!("{open}{}]", lines.join(&format!(";\n{pad}")));
                if reshape {
                    format!("{literal}, {nrows}, 1)")
                } else {
                    literal
                }
            }
            Language::Matlab => {
                let pad = " ".repeat(column + 1);
                let lines = rows.iter().map(|r| r.join(", ")).collect::<Vec<_>>();
                format!("[{}]", lines.join(&format!(";\n{pad}")))
            }
        }
    }

    /// Boxed title of a section
    pub fn title(self, text: &str) -> String {
        let prefix = self.comment_prefix();
        let width = self.max_line_length();
        let rule = format!("{} {}", prefix, "-".repeat(width - prefix.len() - 1));
        let inner = width - prefix.len() - 3;
        let text = text.to_uppercase();
        let left = inner.saturating_sub(text.len()) / 2;
        let right = inner.saturating_sub(text.len() + left);
        format!(
            "{rule}\n{prefix} |{}{}{}|\n{rule}",
            " ".repeat(left),
            text,
            " ".repeat(right)
        )
    }

    /// One line title of a function, filled with underscores
    pub fn subtitle(self, text: &str) -> String {
        let prefix = self.comment_prefix();
        let used = prefix.len() + text.len() + 2;
        format!(
            "{} {} {}",
            prefix,
            text,
            "_".repeat(self.max_line_length().saturating_sub(used))
        )
    }

    /// Documentation block, `lines` are already wrapped
    pub fn doc(self, name: &str, parameters: &[&str], lines: &[String]) -> Vec<String> {
        let mut out = Vec::new();
        match self {
            Language::Python => {
                out.push(format!("{INDENT}\"\"\""));
                out.extend(lines.iter().map(|l| indented(INDENT, l)));
                out.push(format!("{INDENT}\"\"\""));
            }
            Language::Julia => {
                out.push("\"\"\"".to_owned());
                out.push(format!("{INDENT}{}({})", name, parameters.join(", ")));
                out.push(String::new());
                out.extend(lines.iter().cloned());
                out.push("\"\"\"".to_owned());
            }
            Language::Matlab => {
                out.extend(lines.iter().map(|l| {
                    if l.is_empty() {
                        "%".to_owned()
                    } else {
                        format!("% {l}")
                    }
                }));
            }
        }
        out
    }

    /// Width available for the documentation text
    pub(crate) fn doc_width(self) -> usize {
        match self {
            Language::Python => self.max_line_length() - INDENT.len(),
            Language::Julia => self.max_line_length(),
            Language::Matlab => self.max_line_length() - 2,
        }
    }
}

fn indented(indent: &str, line: &str) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{indent}{line}")
    }
}

/// Julia matrix literals separate columns with spaces, so anything else
/// than a name or a positive number is parenthesized
fn julia_element(e: &str) -> String {
    let atomic = !e.starts_with('-') && e.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if atomic {
        e.to_owned()
    } else {
        format!("({e})")
    }
}
