//! Doc-comment directive grammar.
//!
//! A doc block is split into `@Tag arguments` directives and free text. Tags
//! are matched case-insensitively against a closed table; anything that does
//! not match is kept as prose rather than rejected. An untagged line directly
//! after a directive continues it until the next tag or a blank line.

pub mod args;
pub mod mime;

use crate::source::DocLine;

pub use args::{Args, Token, split_list};

/// Every directive tag the generator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    // Operation
    Summary,
    Description,
    Id,
    Tags,
    Accept,
    Produce,
    Param,
    Success,
    Failure,
    Response,
    Header,
    Router,
    Security,
    Deprecated,
    // General info
    Title,
    Version,
    TermsOfService,
    ContactName,
    ContactUrl,
    ContactEmail,
    LicenseName,
    LicenseUrl,
    Host,
    BasePath,
    Schemes,
    TagName,
    TagDescription,
    SecurityBasic,
    SecurityApiKey,
    SecurityOAuth2Application,
    SecurityOAuth2Implicit,
    SecurityOAuth2Password,
    SecurityOAuth2AccessCode,
    In,
    Name,
    TokenUrl,
    AuthorizationUrl,
    /// `@scope.<name> description`; the scope name is moved into the arguments.
    Scope,
    // Types and fields
    Enum,
    Rename,
    Ignore,
    Required,
    Example,
    Format,
    Unrecognized,
}

const TAG_TABLE: &[(&str, Tag)] = &[
    ("@summary", Tag::Summary),
    ("@description", Tag::Description),
    ("@id", Tag::Id),
    ("@tags", Tag::Tags),
    ("@accept", Tag::Accept),
    ("@produce", Tag::Produce),
    ("@param", Tag::Param),
    ("@success", Tag::Success),
    ("@failure", Tag::Failure),
    ("@response", Tag::Response),
    ("@header", Tag::Header),
    ("@router", Tag::Router),
    ("@security", Tag::Security),
    ("@deprecated", Tag::Deprecated),
    ("@title", Tag::Title),
    ("@version", Tag::Version),
    ("@termsofservice", Tag::TermsOfService),
    ("@contact.name", Tag::ContactName),
    ("@contact.url", Tag::ContactUrl),
    ("@contact.email", Tag::ContactEmail),
    ("@license.name", Tag::LicenseName),
    ("@license.url", Tag::LicenseUrl),
    ("@host", Tag::Host),
    ("@basepath", Tag::BasePath),
    ("@schemes", Tag::Schemes),
    ("@tag.name", Tag::TagName),
    ("@tag.description", Tag::TagDescription),
    ("@securitydefinitions.basic", Tag::SecurityBasic),
    ("@securitydefinitions.apikey", Tag::SecurityApiKey),
    (
        "@securitydefinitions.oauth2.application",
        Tag::SecurityOAuth2Application,
    ),
    ("@securitydefinitions.oauth2.implicit", Tag::SecurityOAuth2Implicit),
    ("@securitydefinitions.oauth2.password", Tag::SecurityOAuth2Password),
    (
        "@securitydefinitions.oauth2.accesscode",
        Tag::SecurityOAuth2AccessCode,
    ),
    ("@in", Tag::In),
    ("@name", Tag::Name),
    ("@tokenurl", Tag::TokenUrl),
    ("@authorizationurl", Tag::AuthorizationUrl),
    ("@enum", Tag::Enum),
    ("@rename", Tag::Rename),
    ("@ignore", Tag::Ignore),
    ("@required", Tag::Required),
    ("@example", Tag::Example),
    ("@format", Tag::Format),
];

const SCOPE_PREFIX: &str = "@scope.";

impl Tag {
    /// Look up a tag word such as `@Param`. Unknown words map to `Unrecognized`.
    pub fn lookup(word: &str) -> Tag {
        let lower = word.to_ascii_lowercase();
        if lower.starts_with(SCOPE_PREFIX) && lower.len() > SCOPE_PREFIX.len() {
            return Tag::Scope;
        }
        TAG_TABLE
            .iter()
            .find(|(key, _)| *key == lower)
            .map(|(_, tag)| *tag)
            .unwrap_or(Tag::Unrecognized)
    }

    /// Tags that only make sense on a handler.
    pub fn is_operation(&self) -> bool {
        matches!(
            self,
            Tag::Summary
                | Tag::Id
                | Tag::Tags
                | Tag::Param
                | Tag::Success
                | Tag::Failure
                | Tag::Response
                | Tag::Header
                | Tag::Router
                | Tag::Security
                | Tag::Deprecated
        )
    }
}

/// One parsed directive; immutable after tokenizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub tag: Tag,
    /// Raw arguments; continuation lines are joined with `\n`.
    pub args: String,
    pub line: usize,
}

impl Directive {
    /// Arguments with continuation lines folded into single spaces.
    pub fn flat_args(&self) -> String {
        self.args.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn args(&self) -> Args<'_> {
        Args::new(&self.args)
    }
}

/// A doc block entry in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Directive(Directive),
    Text { text: String, line: usize },
}

/// A tokenized doc comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocBlock {
    pub entries: Vec<Entry>,
}

impl DocBlock {
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Directive(d) => Some(d),
            Entry::Text { .. } => None,
        })
    }

    pub fn has(&self, tag: Tag) -> bool {
        self.directives().any(|d| d.tag == tag)
    }

    /// Free text lines joined with `\n`, or `None` when there are none.
    pub fn text(&self) -> Option<String> {
        let lines: Vec<&str> = self
            .entries
            .iter()
            .filter_map(|e| match e {
                Entry::Text { text, .. } => Some(text.as_str()),
                Entry::Directive(_) => None,
            })
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }
}

/// Split doc lines into directives and free text.
pub fn tokenize(lines: &[DocLine]) -> DocBlock {
    let mut block = DocBlock::default();
    // Index of the directive that accepts continuation lines.
    let mut open: Option<usize> = None;

    for line in lines {
        let text = line.text.trim();
        if text.is_empty() {
            open = None;
            continue;
        }

        if text.starts_with('@') {
            let (word, rest) = match text.find(char::is_whitespace) {
                Some(idx) => (&text[..idx], text[idx..].trim()),
                None => (text, ""),
            };
            let tag = Tag::lookup(word);
            if tag != Tag::Unrecognized {
                let args = if tag == Tag::Scope {
                    format!("{} {}", &word[SCOPE_PREFIX.len()..], rest)
                        .trim()
                        .to_string()
                } else {
                    rest.to_string()
                };
                block.entries.push(Entry::Directive(Directive {
                    tag,
                    args,
                    line: line.line,
                }));
                open = Some(block.entries.len() - 1);
                continue;
            }
            open = None;
        } else if let Some(idx) = open {
            if let Some(Entry::Directive(d)) = block.entries.get_mut(idx) {
                if !d.args.is_empty() {
                    d.args.push('\n');
                }
                d.args.push_str(text);
                continue;
            }
        }

        block.entries.push(Entry::Text {
            text: text.to_string(),
            line: line.line,
        });
    }

    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<DocLine> {
        text.lines()
            .enumerate()
            .map(|(i, l)| DocLine::new(l, i + 1))
            .collect()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Tag::lookup("@PARAM"), Tag::Param);
        assert_eq!(Tag::lookup("@BasePath"), Tag::BasePath);
        assert_eq!(Tag::lookup("@securityDefinitions.apikey"), Tag::SecurityApiKey);
        assert_eq!(Tag::lookup("@scope.write"), Tag::Scope);
        assert_eq!(Tag::lookup("@scope."), Tag::Unrecognized);
        assert_eq!(Tag::lookup("@whatever"), Tag::Unrecognized);
    }

    #[test]
    fn test_tokenize_directives_and_text() {
        let block = tokenize(&lines(
            "Fetches a pet.\n@Summary Get pet\n@Param id path u64 true \"Pet id\"\n\nMore prose.",
        ));
        let tags: Vec<Tag> = block.directives().map(|d| d.tag).collect();
        assert_eq!(tags, vec![Tag::Summary, Tag::Param]);
        assert_eq!(block.text().as_deref(), Some("Fetches a pet.\nMore prose."));
    }

    #[test]
    fn test_continuation_until_blank_or_tag() {
        let block = tokenize(&lines(
            "@Description first line\nsecond line\n@Tags pets\n\ntrailing",
        ));
        let first = block.directives().next().unwrap();
        assert_eq!(first.args, "first line\nsecond line");
        assert_eq!(first.flat_args(), "first line second line");
        assert_eq!(block.text().as_deref(), Some("trailing"));
    }

    #[test]
    fn test_unrecognized_tag_is_text() {
        let block = tokenize(&lines("@since 1.2\n@Router /pets [get]"));
        assert_eq!(block.text().as_deref(), Some("@since 1.2"));
        assert!(block.has(Tag::Router));
    }

    #[test]
    fn test_scope_name_moves_into_args() {
        let block = tokenize(&lines("@scope.admin Grants admin access"));
        let scope = block.directives().next().unwrap();
        assert_eq!(scope.tag, Tag::Scope);
        assert_eq!(scope.args, "admin Grants admin access");
    }
}
