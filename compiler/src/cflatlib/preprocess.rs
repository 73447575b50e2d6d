//! Text-level rewriting done before tokenisation: trigraphs and
//! `#define` / `#undef` macros.
use regex::{NoExpand, Regex};
use tracing::{event, Level};

use super::rx::LazyRegex;
use super::types::{CompileError, CompilerOptions, LineNumber};

const TRIGRAPHS: [(&str, &str); 9] = [
    ("??=", "#"),
    ("??/", "\\"),
    ("??'", "^"),
    ("??(", "["),
    ("??)", "]"),
    ("??!", "|"),
    ("??<", "{"),
    ("??>", "}"),
    ("??-", "~"),
];

static DIRECTIVE_FIELD_SEPARATOR: LazyRegex = LazyRegex::new(r"[ \t]+");

fn replace_trigraphs(source: &str) -> String {
    TRIGRAPHS
        .iter()
        .fold(source.to_string(), |text, (trigraph, replacement)| {
            text.replace(trigraph, replacement)
        })
}

struct Macro {
    name: String,
    pattern: Regex,
    replacement: String,
}

/// Macros in the order they were defined.
#[derive(Default)]
struct MacroTable {
    macros: Vec<Macro>,
}

impl MacroTable {
    fn define(
        &mut self,
        line: LineNumber,
        name: &str,
        replacement: String,
    ) -> Result<(), CompileError> {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name))).map_err(|e| {
            CompileError::Internal {
                line: Some(line),
                msg: format!("cannot build a pattern for macro {name}: {e}"),
            }
        })?;
        let definition = Macro {
            name: name.to_string(),
            pattern,
            replacement,
        };
        match self.macros.iter_mut().find(|m| m.name == name) {
            Some(existing) => {
                event!(Level::DEBUG, "line {line}: redefining macro {name}");
                *existing = definition;
            }
            None => self.macros.push(definition),
        }
        Ok(())
    }

    fn undefine(&mut self, name: &str) {
        self.macros.retain(|m| m.name != name);
    }

    fn expand(&self, text: &str) -> String {
        self.macros.iter().fold(text.to_string(), |text, m| {
            m.pattern
                .replace_all(&text, NoExpand(&m.replacement))
                .into_owned()
        })
    }
}

fn directive_name(line: LineNumber, field: Option<&str>) -> Result<String, CompileError> {
    match field {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(CompileError::syntax(line, "macro name is missing")),
    }
}

/// Applies trigraphs (if enabled) and macro definitions to `source`.
///
/// Directive lines are replaced by empty lines so that the line
/// numbers seen by the tokeniser still match the input.
///
/// # Errors
///
/// `#include` is [`CompileError::Unimplemented`]; directives other
/// than `#define`, `#undef` and `#include` are
/// [`CompileError::UndefinedStatement`].
pub fn preprocess(source: &str, options: &CompilerOptions) -> Result<String, CompileError> {
    let source = if options.use_trigraphs {
        replace_trigraphs(source)
    } else {
        source.to_string()
    };
    let mut macros = MacroTable::default();
    let mut output = String::with_capacity(source.len());
    for (line, text) in (1..).zip(source.lines()) {
        match text.trim_start().strip_prefix('#') {
            Some(directive) => {
                let mut fields = DIRECTIVE_FIELD_SEPARATOR.splitn(directive.trim(), 3);
                let command = fields.next().unwrap_or_default().to_lowercase();
                match command.as_str() {
                    "define" => {
                        let name = directive_name(line, fields.next())?;
                        let replacement = fields.next().unwrap_or_default().trim().to_string();
                        event!(Level::TRACE, "line {line}: #define {name} {replacement}");
                        macros.define(line, &name, replacement)?;
                    }
                    "undef" => {
                        let name = directive_name(line, fields.next())?;
                        macros.undefine(&name);
                    }
                    "include" => {
                        return Err(CompileError::Unimplemented {
                            line,
                            feature: "#include".to_string(),
                        });
                    }
                    _ => {
                        return Err(CompileError::UndefinedStatement {
                            line,
                            directive: command,
                        });
                    }
                }
            }
            None => output.push_str(&macros.expand(text)),
        }
        output.push('\n');
    }
    Ok(output)
}
