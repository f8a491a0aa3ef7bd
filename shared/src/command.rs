//! AT command grammar
//!
//! ```text
//! AT[+VERB][=arg1,"arg,with,commas",arg3]
//! ```
//!
//! Anything that does not start with `AT` (any case) is a data line and is
//! published according to the active mode instead of being dispatched.

/// One framed line, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// An AT command
    Command {
        /// Verb text as sent, trimmed but not case-folded
        verb: String,
        /// Tokenized argument list
        args: Vec<String>,
    },
    /// A non-command data line
    Data(String),
}

/// Classify a trimmed line and parse it if it is a command
pub fn parse_line(line: &str) -> ParsedLine {
    let is_command = line
        .get(..2)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("AT"));
    if !is_command {
        return ParsedLine::Data(line.to_string());
    }

    let body = &line[2..];
    let body = body.strip_prefix('+').unwrap_or(body);

    let (verb, arg_body) = body.split_once('=').unwrap_or((body, ""));

    ParsedLine::Command {
        verb: verb.trim().to_string(),
        args: parse_args(arg_body),
    }
}

/// Split an argument body on commas outside double quotes
///
/// Quote characters only toggle quoting and are not kept. Tokens are
/// trimmed and empty tokens are skipped, so `a,b,` yields two tokens.
pub fn parse_args(body: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;

    for c in body.chars() {
        match c {
            '"' => quoted = !quoted,
            ',' if !quoted => push_token(&mut args, &mut current),
            _ => current.push(c),
        }
    }
    push_token(&mut args, &mut current);

    args
}

fn push_token(args: &mut Vec<String>, current: &mut String) {
    let token = std::mem::take(current);
    let token = token.trim();
    let token = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(token);
    if !token.is_empty() {
        args.push(token.to_string());
    }
}
