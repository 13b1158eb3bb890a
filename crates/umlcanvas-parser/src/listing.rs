//! Parser for plain-text class listings.
//!
//! The notation is line based. Each trimmed line is one of:
//!
//! | Line | Example |
//! |------|---------|
//! | class header | `class Person {`, `abstract class Animal`, `interface Shape <<service>>` |
//! | bare class header | `Person` (a single capitalized word) |
//! | section header | `fields:`, `attributes:`, `methods:`, `operations:` |
//! | field | `- id: int`, `+ name: String = "anon"`, `age` |
//! | method | `+ greet(other: Person): void` |
//! | relationship | `Student -> Person : generalization "is a"` |
//! | end of class | `}` |
//!
//! Blank lines and lines starting with `//` are ignored (`#` is the
//! protected visibility marker, not a comment). A member
//! without parentheses is a field, except inside a `methods:` section.
//! Relationships may name classes declared anywhere in the listing.

use std::collections::HashMap;

use log::{debug, warn};
use umlcanvas_core::semantic::{
    DraftClass, DraftConnection, DraftDiagram, Field, Method, Parameter, RelationKind, Visibility,
};
use winnow::{
    Parser as _,
    ascii::{space0, space1},
    combinator::{alt, delimited, eof, opt, preceded, separated, terminated},
    error::{ContextError, ErrMode, StrContext},
    token::{one_of, rest, take_till, take_while},
};

use crate::{
    Span,
    error::{Diagnostic, ErrorCode, ParseError},
};

type Input<'s> = &'s str;
type IResult<O> = Result<O, ErrMode<ContextError>>;

const DEFAULT_MEMBER_TYPE: &str = "String";
const DEFAULT_RETURN_TYPE: &str = "void";

/// Parses a class listing into a draft diagram.
///
/// Problems are collected across the whole listing rather than stopping at
/// the first one. Warnings (duplicate classes, unknown relationship kinds)
/// are logged and do not fail the parse.
///
/// # Errors
///
/// A [`ParseError`] with every diagnostic when at least one is an error.
///
/// ```
/// # use umlcanvas_parser::parse_listing;
/// # use umlcanvas_core::semantic::RelationKind;
/// let draft = parse_listing(
///     "class Person\n- id: int\n\nclass Student\nStudent -> Person : extends\n",
/// )
/// .unwrap();
/// assert_eq!(draft.classes.len(), 2);
/// assert_eq!(draft.connections[0].kind, RelationKind::Generalization);
/// ```
pub fn parse_listing(src: &str) -> Result<DraftDiagram, ParseError> {
    let mut builder = ListingBuilder::new(src);

    for raw_line in src.split_inclusive('\n') {
        builder.line(raw_line.trim_end_matches(['\n', '\r']));
    }

    builder.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Any,
    Fields,
    Methods,
}

impl Section {
    fn from_word(word: &str) -> Option<Self> {
        let word = word.to_lowercase();
        if ["field", "attribut", "atribut", "propert"]
            .iter()
            .any(|stem| word.starts_with(stem))
        {
            Some(Self::Fields)
        } else if ["method", "metod", "métod", "operation"]
            .iter()
            .any(|stem| word.starts_with(stem))
        {
            Some(Self::Methods)
        } else {
            None
        }
    }
}

#[derive(Debug)]
struct Header<'s> {
    name: &'s str,
    is_abstract: bool,
    is_interface: bool,
    stereotype: Option<&'s str>,
}

#[derive(Debug)]
struct RelationLine<'s> {
    from: &'s str,
    to: &'s str,
    kind: Option<&'s str>,
    label: Option<&'s str>,
}

#[derive(Debug)]
enum Member {
    Field(Field),
    Method(Method),
}

struct ListingBuilder<'s> {
    src: &'s str,
    classes: Vec<DraftClass>,
    declared: HashMap<String, (usize, Span)>,
    current: Option<usize>,
    section: Section,
    connections: Vec<DraftConnection>,
    diagnostics: Vec<Diagnostic>,
}

impl<'s> ListingBuilder<'s> {
    fn new(src: &'s str) -> Self {
        Self {
            src,
            classes: Vec::new(),
            declared: HashMap::new(),
            current: None,
            section: Section::Any,
            connections: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Span of `part`, which must be a slice of the source.
    fn span_of(&self, part: &str) -> Span {
        let start = part.as_ptr() as usize - self.src.as_ptr() as usize;
        Span::new(start..start + part.len())
    }

    fn line(&mut self, line: &'s str) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            return;
        }

        match trimmed {
            "}" => {
                self.current = None;
                self.section = Section::Any;
                return;
            }
            "{" => return,
            _ => {}
        }

        if let Some(header) = attempt(trimmed, class_header) {
            self.open_class(header);
        } else if trimmed.contains("->") {
            match attempt(trimmed, relation) {
                Some(relation) => self.add_relation(relation),
                None => self.diagnostics.push(
                    Diagnostic::error("malformed relationship")
                        .with_code(ErrorCode::E103)
                        .with_label(self.span_of(trimmed), "expected `Source -> Target`")
                        .with_help("write relationships as `Student -> Person : generalization`"),
                ),
            }
        } else if let Some(section) = attempt(trimmed, section_header) {
            self.section = section;
        } else if let Some(name) = attempt(trimmed, bare_class) {
            self.open_class(Header {
                name,
                is_abstract: false,
                is_interface: false,
                stereotype: None,
            });
        } else {
            self.add_member(trimmed);
        }
    }

    fn open_class(&mut self, header: Header<'s>) {
        let span = self.span_of(header.name);
        self.section = Section::Any;

        if let Some(&(index, first_span)) = self.declared.get(header.name) {
            self.diagnostics.push(
                Diagnostic::warning(format!("class `{}` is declared more than once", header.name))
                    .with_code(ErrorCode::E200)
                    .with_label(span, "declared again here")
                    .with_secondary_label(first_span, "first declared here")
                    .with_help("members that follow are added to the first declaration"),
            );
            self.current = Some(index);
            return;
        }

        let mut class = DraftClass::new(header.name);
        class.is_abstract = header.is_abstract;
        class.is_interface = header.is_interface;
        class.stereotype = header.stereotype.map(str::to_string);

        debug!(class = header.name; "Listing class declared");
        self.declared
            .insert(header.name.to_string(), (self.classes.len(), span));
        self.current = Some(self.classes.len());
        self.classes.push(class);
    }

    fn add_relation(&mut self, relation: RelationLine<'s>) {
        let kind = match relation.kind.map(|raw| (raw, RelationKind::from_alias(raw))) {
            None => RelationKind::Association,
            Some((_, Some(kind))) => kind,
            Some((raw, None)) => {
                let span = self.span_of(raw);
                self.diagnostics.push(
                    Diagnostic::warning(format!("unknown relationship kind `{raw}`"))
                        .with_code(ErrorCode::E201)
                        .with_label(span, "read as association"),
                );
                RelationKind::Association
            }
        };

        let mut connection = DraftConnection::new(relation.from, relation.to, kind);
        connection.label = relation.label.map(str::to_string);
        self.connections.push(connection);
    }

    fn add_member(&mut self, line: &'s str) {
        let section = self.section;
        let Some(member) = attempt(line, |input: &mut Input<'s>| member(input, section)) else {
            let looks_like_member = line.starts_with(['+', '-', '#', '~'])
                || line.contains('(')
                || line.contains(':');
            let diagnostic = if looks_like_member {
                Diagnostic::error("malformed member")
                    .with_code(ErrorCode::E102)
                    .with_label(self.span_of(line), "cannot read this field or method")
                    .with_help("fields look like `- name: Type`, methods like `+ name(arg: Type): Type`")
            } else {
                Diagnostic::error("unrecognized line")
                    .with_code(ErrorCode::E100)
                    .with_label(self.span_of(line), "not a class, member or relationship")
            };
            self.diagnostics.push(diagnostic);
            return;
        };

        let Some(class) = self.current.and_then(|index| self.classes.get_mut(index)) else {
            self.diagnostics.push(
                Diagnostic::error("member outside of a class")
                    .with_code(ErrorCode::E101)
                    .with_label(self.span_of(line), "this member has no class")
                    .with_help("declare a class first, e.g. `class Person`"),
            );
            return;
        };

        match member {
            Member::Field(field) => class.fields.push(field),
            Member::Method(method) => class.methods.push(method),
        }
    }

    fn finish(mut self) -> Result<DraftDiagram, ParseError> {
        if self.classes.is_empty() && !self.diagnostics.iter().any(|d| d.severity().is_error()) {
            self.diagnostics.push(
                Diagnostic::error("the listing declares no classes")
                    .with_code(ErrorCode::E104)
                    .with_label(Span::new(0..self.src.len()), "no class header found")
                    .with_help("start a class with `class Name`"),
            );
        }

        if self.diagnostics.iter().any(|d| d.severity().is_error()) {
            return Err(ParseError::new(self.diagnostics));
        }

        for diagnostic in &self.diagnostics {
            let offset = diagnostic.primary_span().map(|span| span.start());
            warn!(offset:?; "{diagnostic}");
        }

        Ok(DraftDiagram {
            classes: self.classes,
            connections: self.connections,
        })
    }
}

/// Runs `parser` over the whole of `line`, returning `None` on any failure.
fn attempt<'s, O>(line: &'s str, mut parser: impl FnMut(&mut Input<'s>) -> IResult<O>) -> Option<O> {
    let mut input = line;
    parser(&mut input).ok()
}

fn identifier<'s>(input: &mut Input<'s>) -> IResult<&'s str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '_' || c == '$')
        .context(StrContext::Label("identifier"))
        .parse_next(input)
}

fn line_end(input: &mut Input<'_>) -> IResult<()> {
    (space0, eof).void().parse_next(input)
}

/// `[abstract] (class|interface) Name [<<stereotype>>] [{]`
fn class_header<'s>(input: &mut Input<'s>) -> IResult<Header<'s>> {
    let is_abstract = opt(terminated("abstract", space1))
        .parse_next(input)?
        .is_some();
    let keyword = alt(("class", "interface")).parse_next(input)?;
    space1.parse_next(input)?;
    let name = identifier.parse_next(input)?;
    space0.parse_next(input)?;
    let stereotype = opt(stereotype).parse_next(input)?;
    (space0, opt('{')).void().parse_next(input)?;
    line_end.parse_next(input)?;

    Ok(Header {
        name,
        is_abstract,
        is_interface: keyword == "interface",
        stereotype,
    })
}

fn stereotype<'s>(input: &mut Input<'s>) -> IResult<&'s str> {
    delimited("<<", take_till(1.., '>'), ">>")
        .map(str::trim)
        .context(StrContext::Label("stereotype"))
        .parse_next(input)
}

/// A single capitalized word, optionally followed by `{` or `:`.
fn bare_class<'s>(input: &mut Input<'s>) -> IResult<&'s str> {
    let name = identifier
        .verify(|name: &str| name.starts_with(char::is_uppercase))
        .parse_next(input)?;
    (space0, opt(one_of(['{', ':']))).void().parse_next(input)?;
    line_end.parse_next(input)?;
    Ok(name)
}

/// `fields:` / `methods:` and their synonyms.
fn section_header(input: &mut Input<'_>) -> IResult<Section> {
    let word = take_while(1.., char::is_alphabetic).parse_next(input)?;
    (space0, ':').void().parse_next(input)?;
    line_end.parse_next(input)?;
    Section::from_word(word).ok_or_else(|| ErrMode::Backtrack(ContextError::new()))
}

/// `Source -> Target [: kind] ["label"]`
fn relation<'s>(input: &mut Input<'s>) -> IResult<RelationLine<'s>> {
    let from = identifier.parse_next(input)?;
    (space0, "->", space0).void().parse_next(input)?;
    let to = identifier.parse_next(input)?;
    space0.parse_next(input)?;
    let kind = opt(preceded(
        (':', space0),
        take_while(1.., |c: char| !c.is_whitespace() && c != '"'),
    ))
    .parse_next(input)?;
    space0.parse_next(input)?;
    let label = opt(delimited('"', take_till(0.., '"'), '"')).parse_next(input)?;
    line_end.parse_next(input)?;

    Ok(RelationLine {
        from,
        to,
        kind,
        label,
    })
}

fn visibility(input: &mut Input<'_>) -> IResult<Visibility> {
    one_of(['+', '-', '#', '~'])
        .map(|symbol: char| Visibility::from_symbol(symbol).unwrap_or_default())
        .parse_next(input)
}

fn parameter(input: &mut Input<'_>) -> IResult<Parameter> {
    let name = identifier.parse_next(input)?;
    space0.parse_next(input)?;
    let type_name = opt(preceded((':', space0), take_till(1.., [',', ')']))).parse_next(input)?;
    let type_name = type_name
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_MEMBER_TYPE);
    Ok(Parameter::new(name, type_name))
}

fn parameter_list(input: &mut Input<'_>) -> IResult<Vec<Parameter>> {
    delimited(
        ('(', space0),
        separated(0.., parameter, (space0, ',', space0)),
        (space0, ')'),
    )
    .context(StrContext::Label("parameter list"))
    .parse_next(input)
}

/// `[vis] name[(params)] [: Type] [= default]`
fn member(input: &mut Input<'_>, section: Section) -> IResult<Member> {
    let visibility = opt(visibility).parse_next(input)?.unwrap_or_default();
    space0.parse_next(input)?;
    let name = identifier.parse_next(input)?;
    space0.parse_next(input)?;
    let parameters = opt(parameter_list).parse_next(input)?;
    space0.parse_next(input)?;
    let type_name = opt(preceded((':', space0), take_till(1.., '=')))
        .parse_next(input)?
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let default_value = opt(preceded(('=', space0), rest))
        .parse_next(input)?
        .map(str::trim)
        .filter(|v| !v.is_empty());
    line_end.parse_next(input)?;

    let member = match (parameters, section) {
        (Some(parameters), _) => {
            let mut method =
                Method::new(visibility, name, type_name.unwrap_or(DEFAULT_RETURN_TYPE));
            method.parameters = parameters;
            Member::Method(method)
        }
        (None, Section::Methods) => {
            Member::Method(Method::new(visibility, name, type_name.unwrap_or(DEFAULT_RETURN_TYPE)))
        }
        (None, Section::Any | Section::Fields) => {
            let mut field = Field::new(visibility, name, type_name.unwrap_or(DEFAULT_MEMBER_TYPE));
            field.default_value = default_value.map(str::to_string);
            Member::Field(field)
        }
    };
    Ok(member)
}
