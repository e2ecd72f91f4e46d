//! Command templates for CLI-managed clients.
//!
//! A template such as `claude mcp add {name} --scope {scope} {command_args}` is
//! tokenized once into literal words, words with embedded scalar tokens, and
//! whole-word vector splices. Rendering fills those from [`TemplateValues`]
//! and yields an argument vector that is spawned without a shell.

use super::definitions::CommandArgsStyle;
use crate::validation::{is_safe_executable, is_valid_env_key, is_valid_server_name};
use indexmap::IndexMap;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::warn;

static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .unwrap_or_else(|e| panic!("invalid placeholder pattern: {e}"))
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unsafe executable name: '{0}'")]
    UnsafeExecutable(String),

    #[error("empty command template")]
    EmptyTemplate,

    #[error("unterminated quote in command line")]
    UnterminatedQuote,

    #[error("unknown placeholder {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("placeholder in '{0}' must be a whole argument")]
    EmbeddedVectorToken(String),

    #[error("no value for {{{0}}}")]
    MissingValue(String),

    #[error("invalid server name: '{0}'")]
    InvalidServerName(String),
}

/// Scope argument understood by CLI clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CliScope {
    #[default]
    Local,
    User,
    Project,
}

impl CliScope {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::User => "user",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for CliScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CliScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "user" => Ok(Self::User),
            "project" => Ok(Self::Project),
            _ => Err(format!("Unknown CLI scope: {s}")),
        }
    }
}

/// Tokens replaced in place, possibly inside a larger word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarToken {
    Name,
    Scope,
    Transport,
    Command,
}

/// Tokens that expand to zero or more whole arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorToken {
    Args,
    EnvFlags,
    CommandArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Scalar(ScalarToken),
    Vector(VectorToken),
}

impl Token {
    fn lookup(ident: &str) -> Option<Self> {
        Some(match ident {
            "name" => Self::Scalar(ScalarToken::Name),
            "scope" => Self::Scalar(ScalarToken::Scope),
            "transport" => Self::Scalar(ScalarToken::Transport),
            "command" => Self::Scalar(ScalarToken::Command),
            "args" => Self::Vector(VectorToken::Args),
            "env_flags" => Self::Vector(VectorToken::EnvFlags),
            "command_args" => Self::Vector(VectorToken::CommandArgs),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Scalar(ScalarToken),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Interpolated(Vec<Segment>),
    Splice(VectorToken),
}

/// Values available to a template at render time.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateValues<'a> {
    pub name: Option<&'a str>,
    pub scope: Option<CliScope>,
    /// Full launch argv of the server; `{command}` is its head, `{args}` its tail.
    pub launch: Option<&'a [String]>,
    pub env: Option<&'a IndexMap<String, String>>,
    pub command_args_style: CommandArgsStyle,
}

impl TemplateValues<'_> {
    fn scalar(&self, token: ScalarToken) -> Result<String, TemplateError> {
        match token {
            ScalarToken::Name => {
                let name = self.name.ok_or_else(|| missing("name"))?;
                if !is_valid_server_name(name) {
                    return Err(TemplateError::InvalidServerName(name.to_string()));
                }
                Ok(name.to_string())
            },
            ScalarToken::Scope => self.scope.map(|s| s.to_string()).ok_or_else(|| missing("scope")),
            ScalarToken::Transport => Ok("stdio".to_string()),
            ScalarToken::Command => self.launch_argv("command").map(|argv| argv[0].clone()),
        }
    }

    fn vector(&self, token: VectorToken) -> Result<Vec<String>, TemplateError> {
        match token {
            VectorToken::Args => self.launch_argv("args").map(|argv| argv[1..].to_vec()),
            VectorToken::EnvFlags => Ok(self.env.map(env_flags).unwrap_or_default()),
            VectorToken::CommandArgs => {
                let argv = self.launch_argv("command_args")?;
                Ok(match self.command_args_style {
                    CommandArgsStyle::Separator => {
                        std::iter::once("--".to_string()).chain(argv.iter().cloned()).collect()
                    },
                    CommandArgsStyle::Joined => vec![join_words(argv)],
                })
            },
        }
    }

    fn launch_argv(&self, token: &str) -> Result<&[String], TemplateError> {
        match self.launch {
            Some(argv) if !argv.is_empty() => Ok(argv),
            _ => Err(missing(token)),
        }
    }
}

fn missing(token: &str) -> TemplateError {
    TemplateError::MissingValue(token.to_string())
}

/// `-e KEY=VALUE` pairs for every well-formed key; malformed keys are dropped.
pub fn env_flags(env: &IndexMap<String, String>) -> Vec<String> {
    let mut flags = Vec::with_capacity(env.len() * 2);
    for (key, value) in env {
        if !is_valid_env_key(key) {
            warn!("Dropping invalid environment variable name: {key}");
            continue;
        }
        flags.push("-e".to_string());
        flags.push(format!("{key}={value}"));
    }
    flags
}

/// A parsed command template with a validated executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    executable: String,
    parts: Vec<Part>,
}

impl CommandTemplate {
    /// Tokenize and classify a template.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The template has no words
    /// - Quoting is unbalanced
    /// - The first word is not a plain executable name
    /// - A placeholder is unknown, or a vector placeholder shares its word
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut words = split_words(template)?.into_iter();
        let executable = words.next().ok_or(TemplateError::EmptyTemplate)?;
        if !is_safe_executable(&executable) {
            return Err(TemplateError::UnsafeExecutable(executable));
        }

        let parts = words.map(|word| classify(&word)).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { executable, parts })
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Produce the argument vector. Empty arguments are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if a token used by the template has no value, or the
    /// server name is not a valid identifier.
    pub fn render(&self, values: &TemplateValues<'_>) -> Result<Vec<String>, TemplateError> {
        let mut argv = vec![self.executable.clone()];
        for part in &self.parts {
            match part {
                Part::Literal(word) => argv.push(word.clone()),
                Part::Interpolated(segments) => {
                    let mut word = String::new();
                    for segment in segments {
                        match segment {
                            Segment::Text(text) => word.push_str(text),
                            Segment::Scalar(token) => word.push_str(&values.scalar(*token)?),
                        }
                    }
                    argv.push(word);
                },
                Part::Splice(token) => argv.extend(values.vector(*token)?),
            }
        }
        argv.retain(|arg| !arg.trim().is_empty());
        Ok(argv)
    }
}

fn classify(word: &str) -> Result<Part, TemplateError> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER_PATTERN.captures_iter(word) {
        let (Some(whole), Some(ident)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let token = Token::lookup(ident.as_str())
            .ok_or_else(|| TemplateError::UnknownPlaceholder(ident.as_str().to_string()))?;
        match token {
            Token::Vector(vector) => {
                if whole.as_str() != word {
                    return Err(TemplateError::EmbeddedVectorToken(word.to_string()));
                }
                return Ok(Part::Splice(vector));
            },
            Token::Scalar(scalar) => {
                if whole.start() > last {
                    segments.push(Segment::Text(word[last..whole.start()].to_string()));
                }
                segments.push(Segment::Scalar(scalar));
                last = whole.end();
            },
        }
    }

    if segments.is_empty() {
        return Ok(Part::Literal(word.to_string()));
    }
    if last < word.len() {
        segments.push(Segment::Text(word[last..].to_string()));
    }
    Ok(Part::Interpolated(segments))
}

/// Split a command line into words using POSIX shell quoting rules.
///
/// Supports single quotes, double quotes (with `\"`, `\\`, `\$` and `` \` ``
/// escapes) and backslash escapes outside quotes. No expansion is performed.
///
/// # Errors
///
/// Returns [`TemplateError::UnterminatedQuote`] if a quote is never closed.
pub fn split_words(input: &str) -> Result<Vec<String>, TemplateError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            },
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(TemplateError::UnterminatedQuote),
                    }
                }
            },
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\' | '$' | '`')) => current.push(ch),
                            Some('\n') => {},
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            },
                            None => return Err(TemplateError::UnterminatedQuote),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(TemplateError::UnterminatedQuote),
                    }
                }
            },
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some('\n') => {},
                    Some(ch) => current.push(ch),
                    None => current.push('\\'),
                }
            },
            ch => {
                in_word = true;
                current.push(ch);
            },
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Quote a single word so that [`split_words`] (or a POSIX shell) reads it back unchanged.
pub fn quote_word(word: &str) -> String {
    let plain = !word.is_empty()
        && word.chars().all(|c| c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r#"'"'"'"#))
    }
}

/// Quote and space-join an argument vector into one command line.
pub fn join_words(words: &[String]) -> String {
    words.iter().map(|w| quote_word(w)).collect::<Vec<_>>().join(" ")
}
