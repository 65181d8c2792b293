//! Anchored, language-agnostic patterns used to recognise code structure.
//!
//! None of these patterns understand a grammar. They recognise the line
//! shapes most languages share: comment leaders, docstring delimiters,
//! declaration keywords and bare delimiter lines.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern must compile")
}

/// Whole-line comments: `//`, `#`, `-- `, `;;`
pub static SINGLE_LINE_COMMENT: Lazy<Regex> = Lazy::new(|| {
    compile(r"(?mR)^[ \t]*(?://(?:[^/!\n].*)?|#(?:[^\[!\n#].*)?|--(?:[ \t].*)?|;;.*)$")
});

/// Block comments that occupy whole lines: `/* */`, `<!-- -->`, `{- -}`, `--[[ ]]`
pub static MULTI_LINE_COMMENT: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"(?mR)^[ \t]*(?:/\*[^*]*\*+(?:[^/*][^*]*\*+)*/|<!--(?s:.*?)-->|\{-(?s:.*?)-\}|--\[\[(?s:.*?)\]\])[ \t]*$",
    )
});

/// Delimiter-wrapped docstrings. Every branch has four groups
/// (indent, left delimiter, body, right delimiter); only one branch is set
/// per match, see [`docstring_parts`].
pub static DOCSTRING_STYLE_ONE: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r#"(?mR)^([ \t]*)([rRuU]?""")((?:[^"]|"[^"]|""[^"])*)(""")[ \t]*$"#,
        r#"|^([ \t]*)([rRuU]?''')((?:[^']|'[^']|''[^'])*)(''')[ \t]*$"#,
        r"|^([ \t]*)(/\*\*)((?:[^*]|\*+[^*/])*)(\*+/)[ \t]*$",
        r"|^([ \t]*)(/\*!)((?:[^*]|\*+[^*/])*)(\*+/)[ \t]*$",
        r"|^([ \t]*)(\{-\|)((?s:.*?))(-\})[ \t]*$",
    ))
});

/// Line-prefixed docstrings: `///`, `//!`, `##`, `--|`
pub static DOCSTRING_STYLE_TWO: Lazy<Regex> =
    Lazy::new(|| compile(r"(?mR)^([ \t]*)(///|//!|##|--\|)(.*)$"));

/// Function declarations. Each branch captures exactly one group: the name.
pub static FUNCTION_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        // def / fn / func / function ...
        r#"^[ \t]*(?:(?:export|default|public|private|protected|internal|static|final|abstract|async|unsafe|const|override|virtual|inline|suspend|open|local|pub(?:\([^)\n]*\))?|extern(?:[ \t]+"[^"\n]*")?)[ \t]+)*"#,
        r"(?:def|fn|func|function\*?|fun|sub|proc|defn|defp)[ \t]+(?:\([^)\n]*\)[ \t]*)?\*?",
        r"([A-Za-z_$][\w$]*(?:[.:][A-Za-z_$][\w$]*)*[!?]?)",
        // const name = (...) => / function
        r"|^[ \t]*(?:export[ \t]+)?(?:const|let|var)[ \t]+([A-Za-z_$][\w$]*)[ \t]*(?::[^=\n]*)?=[ \t]*(?:async[ \t]+)?",
        r"(?:function\b|\([^)\n]*\)[ \t]*(?::[^=\n]*)?=>|[A-Za-z_$][\w$]*[ \t]*=>)",
        // method(args) {
        r"|^[ \t]*(?:(?:static|async|get|set|public|private|protected|override|readonly)[ \t]+)*\*?",
        r"([A-Za-z_$][\w$]*)[ \t]*(?:<[^>\n]*>)?[ \t]*\([^)\n]*\)[ \t]*(?::[^{\n]*)?\{[ \t]*$",
        // ReturnType name(args
        r"|^[ \t]*(?:[A-Za-z_][\w:<>,\[\]*&]*[ \t]+[*&]*)+",
        r"([A-Za-z_~][\w~]*(?:::[A-Za-z_~][\w~]*)*)[ \t]*\([^;]*$",
    ))
});

/// Namespace-like declarations: group 1 is the kind, group 2 the name
pub static NAMESPACE_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"^[ \t]*(?:(?:export|default|public|private|protected|internal|static|final|abstract|sealed|partial|data|open|inner|declare|unsafe|pub(?:\([^)\n]*\))?)[ \t]+)*",
        r"(class|struct|interface|enum|trait|impl|namespace|module|mod|object|protocol|extension|record|union)\b",
        r"(?:[ \t]*<[^>\n]*>)?[ \t]+([A-Za-z_][\w.:]*)",
    ))
});

/// Decorators and attributes: `@decorator`, `@mod.attr(...)`, `#[attr]`,
/// `#![attr]`, `[Attribute]`. An `@name` line followed by anything other
/// than call arguments (Ruby `@ivar = 1`, `@items << x`) is code.
pub static METADATA: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r"(?mR)^[ \t]*(?:@[A-Za-z_][\w$]*(?:\.[A-Za-z_][\w$]*)*(?:[ \t]*\(.*)?[ \t]*$",
        r"|#!?\[.*$",
        r"|\[[A-Za-z_][\w.]*(?:\(.*\))?\][ \t]*$)",
    ))
});

/// Triple-quoted string literals that may span lines
pub static MULTI_LINE_STRING: Lazy<Regex> = Lazy::new(|| {
    compile(concat!(
        r#""""(?:[^"\\]|\\(?s:.)|"[^"]|""[^"])*""""#,
        r"|'''(?:[^'\\]|\\(?s:.)|'[^']|''[^'])*'''",
    ))
});

/// A line holding nothing but an opening delimiter
pub static OPENER: Lazy<Regex> =
    Lazy::new(|| compile(r"^[ \t]*(?:[\{\(\[]+|begin|do|then)[ \t]*$"));

/// A line holding nothing but a closing delimiter or block terminator
pub static CLOSER: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"^[ \t]*(?:[\}\)\]]+[;,:]?|end[;,]?|fi|done|esac|endif|endfor|endwhile|endfunction|end[ \t]+\w+)[ \t]*$",
    )
});

/// Words that make a call or statement look like a declaration
const NOT_A_FUNCTION: &[&str] = &[
    "if", "else", "elif", "for", "foreach", "while", "do", "switch", "case", "return", "new",
    "delete", "throw", "await", "yield", "catch", "try", "with", "assert", "raise", "print",
    "not", "and", "or", "in", "is", "del", "lambda", "import", "from", "except", "match",
    "loop", "go", "defer", "sizeof", "typeof", "instanceof", "using", "lock", "goto", "when",
    "unless", "until", "class", "struct", "interface", "enum", "trait", "impl", "namespace",
    "module", "mod", "object", "record", "union", "extends", "implements", "where", "echo",
    "puts", "require", "include", "function", "super", "this", "self",
];

const PREPROCESSOR_DIRECTIVES: &[&str] = &[
    "include", "define", "undef", "if", "ifdef", "ifndef", "else", "elif", "endif", "pragma",
    "error", "warning", "line", "import", "region", "endregion",
];

/// Recover `(indent, left, body, right)` from a [`DOCSTRING_STYLE_ONE`] match.
///
/// The pattern packs several alternatives, so most groups are unset on any
/// given match. Unset groups are dropped positionally; the four that remain
/// belong to the branch that matched.
pub fn docstring_parts<'t>(caps: &Captures<'t>) -> Option<[&'t str; 4]> {
    let mut set = caps.iter().skip(1).flatten().map(|m| m.as_str());
    Some([set.next()?, set.next()?, set.next()?, set.next()?])
}

/// Declaration fragment of a function anchor (e.g. `def parse`, `pub fn new`)
pub fn function_signature(line: &str) -> Option<String> {
    let caps = FUNCTION_DECLARATION.captures(line)?;
    let name = caps.iter().skip(1).flatten().next()?;

    let prefix = &line[..name.start()];
    let rejected = std::iter::once(name.as_str())
        .chain(prefix.split(|c: char| !(c.is_alphanumeric() || c == '_')))
        .any(|word| NOT_A_FUNCTION.contains(&word));
    if rejected {
        return None;
    }

    Some(line[..name.end()].trim().to_string())
}

/// `(kind, name)` of a namespace declaration line
pub fn namespace_declaration(line: &str) -> Option<(&str, &str)> {
    let caps = NAMESPACE_DECLARATION.captures(line)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Line consisting only of an opening or closing delimiter
pub fn is_bare_delimiter(line: &str) -> bool {
    OPENER.is_match(line) || CLOSER.is_match(line)
}

/// `#include`, `#define` and friends look like `#` comments but are code
pub fn is_preprocessor_directive(line: &str) -> bool {
    let Some(rest) = line.trim_start().strip_prefix('#') else {
        return false;
    };
    let word: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    PREPROCESSOR_DIRECTIVES.contains(&word.as_str())
}

/// Leading whitespace width; a tab counts as four columns
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}
