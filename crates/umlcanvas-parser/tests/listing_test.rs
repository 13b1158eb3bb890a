use umlcanvas_core::semantic::{RelationKind, Visibility};
use umlcanvas_parser::{
    error::{ErrorCode, Severity},
    parse_listing,
};

const LIBRARY: &str = r#"
// A small library
abstract class Item <<entity>> {
  fields:
  - id: int
  # title: String
  methods:
  + checkout(member: Member, days: int): bool
  + describe: String
}

interface Searchable
+ search(query: String): List<Item>

Book
- isbn: String = "unknown"

Member {
  - name: String
}

Book -> Item : generalization
Book -> Searchable : implements
Member -> Book : 1:n "borrows"
"#;

#[test]
fn parses_full_listing() {
    let draft = parse_listing(LIBRARY).unwrap();

    let names: Vec<_> = draft.classes.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Item", "Searchable", "Book", "Member"]);

    let item = &draft.classes[0];
    assert!(item.is_abstract);
    assert_eq!(item.stereotype.as_deref(), Some("entity"));
    assert_eq!(item.fields.len(), 2);
    assert_eq!(item.fields[1].visibility, Visibility::Protected);
    assert_eq!(item.methods.len(), 2);
    assert_eq!(item.methods[0].parameters.len(), 2);
    assert_eq!(item.methods[1].return_type, "String");

    let searchable = &draft.classes[1];
    assert!(searchable.is_interface);
    assert_eq!(searchable.methods[0].return_type, "List<Item>");

    let book = &draft.classes[2];
    assert_eq!(book.fields[0].default_value.as_deref(), Some("\"unknown\""));

    let kinds: Vec<_> = draft.connections.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        [
            RelationKind::Generalization,
            RelationKind::Realization,
            RelationKind::OneToMany
        ]
    );
    assert_eq!(draft.connections[2].label.as_deref(), Some("borrows"));
}

#[test]
fn member_before_any_class_is_an_error() {
    let src = "- id: int\nclass A\n";
    let err = parse_listing(src).unwrap_err();

    let diag = &err.diagnostics()[0];
    assert_eq!(diag.code(), Some(ErrorCode::E101));
    assert_eq!(diag.severity(), Severity::Error);
    let span = diag.primary_span().unwrap();
    assert_eq!(&src[span.start()..span.end()], "- id: int");
}

#[test]
fn collects_every_error() {
    let src = "class A\n+ broken(x: int\n?? what\nA -> \n";
    let err = parse_listing(src).unwrap_err();
    let codes: Vec<_> = err.diagnostics().iter().filter_map(|d| d.code()).collect();
    assert_eq!(codes, [ErrorCode::E102, ErrorCode::E100, ErrorCode::E103]);
}

#[test]
fn empty_listing_is_an_error() {
    let err = parse_listing("// nothing here\n\n").unwrap_err();
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E104));
}

#[test]
fn duplicate_class_merges_members_with_warning() {
    let draft = parse_listing("class A\n- x: int\nclass A\n- y: int\n").unwrap();
    assert_eq!(draft.classes.len(), 1);
    assert_eq!(draft.classes[0].fields.len(), 2);
}

#[test]
fn unknown_relationship_kind_is_association() {
    let draft = parse_listing("class A\nclass B\nA -> B : friendship\n").unwrap();
    assert_eq!(draft.connections[0].kind, RelationKind::Association);
}

#[test]
fn windows_line_endings() {
    let draft = parse_listing("class A\r\n- id: int\r\n").unwrap();
    assert_eq!(draft.classes[0].fields[0].name, "id");
}
