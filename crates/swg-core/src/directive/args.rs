/// A whitespace-separated argument token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// The token was written as `"..."`; `text` holds the unquoted content.
    pub quoted: bool,
}

/// Cursor over directive arguments.
///
/// Whitespace inside `<>`, `()`, `[]` or `{}` does not split a token, so
/// `HashMap<String, Pet>` and `enums(a, b)` stay whole.
#[derive(Debug, Clone)]
pub struct Args<'a> {
    rest: &'a str,
}

impl<'a> Args<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    pub fn is_empty(&self) -> bool {
        self.rest.trim().is_empty()
    }

    /// Remaining, untokenized input.
    pub fn rest(&self) -> &'a str {
        self.rest.trim()
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&self) -> Option<Token> {
        self.clone().next_token()
    }

    pub fn next_token(&mut self) -> Option<Token> {
        let input = self.rest.trim_start();
        if input.is_empty() {
            self.rest = input;
            return None;
        }

        if let Some(body) = input.strip_prefix('"') {
            let (text, consumed) = match body.find('"') {
                Some(end) => (&body[..end], end + 2),
                None => (body, input.len()),
            };
            self.rest = &input[consumed..];
            return Some(Token {
                text: text.to_string(),
                quoted: true,
            });
        }

        let mut depth: i32 = 0;
        let mut end = input.len();
        for (idx, ch) in input.char_indices() {
            match ch {
                '<' | '(' | '[' | '{' => depth += 1,
                '>' | ')' | ']' | '}' => depth = (depth - 1).max(0),
                c if c.is_whitespace() && depth == 0 => {
                    end = idx;
                    break;
                }
                _ => {}
            }
        }
        self.rest = &input[end..];
        Some(Token {
            text: input[..end].to_string(),
            quoted: false,
        })
    }

    /// Everything left, with one pair of surrounding quotes removed.
    pub fn remainder(&mut self) -> Option<String> {
        let rest = self.rest.trim();
        self.rest = "";
        if rest.is_empty() {
            return None;
        }
        let unquoted = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .filter(|inner| !inner.contains('"'))
            .unwrap_or(rest);
        Some(unquoted.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

/// Split a comma-separated list, dropping empty items.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        let mut args = Args::new(input);
        let mut out = Vec::new();
        while let Some(tok) = args.next_token() {
            out.push(tok.text);
        }
        out
    }

    #[test]
    fn test_brackets_keep_spaces() {
        assert_eq!(
            texts("body body HashMap<String, Pet> true \"the pets\""),
            vec!["body", "body", "HashMap<String, Pet>", "true", "the pets"]
        );
    }

    #[test]
    fn test_quoted_flag() {
        let mut args = Args::new("\"a b\" c");
        assert!(args.next_token().unwrap().quoted);
        assert!(!args.next_token().unwrap().quoted);
        assert!(args.next_token().is_none());
    }

    #[test]
    fn test_attribute_token() {
        assert_eq!(texts("enums(a, b) default(a)"), vec!["enums(a, b)", "default(a)"]);
    }

    #[test]
    fn test_remainder_strips_quotes() {
        let mut args = Args::new("200 \"all good\"");
        args.next_token();
        assert_eq!(args.remainder().as_deref(), Some("all good"));
        let mut args = Args::new("404 not   found");
        args.next_token();
        assert_eq!(args.remainder().as_deref(), Some("not found"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("pets, store,,"), vec!["pets", "store"]);
    }
}
