use pretty_assertions::assert_eq;

use super::*;

fn kinds(src: &str) -> Vec<TokenKind> {
	tokenize(src, Pos::default()).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_assignment_statement() {
	assert_eq!(
		kinds("rv = m[0];"),
		vec![
			TokenKind::Ident("rv".into()),
			TokenKind::Punct(Punct::Assign),
			TokenKind::Ident("m".into()),
			TokenKind::Punct(Punct::LBracket),
			TokenKind::Number(0.0),
			TokenKind::Punct(Punct::RBracket),
			TokenKind::Punct(Punct::Semi),
			TokenKind::Eof,
		]
	);
}

#[test]
fn prefers_longest_punctuator() {
	assert_eq!(
		kinds("a === b !== c => d"),
		vec![
			TokenKind::Ident("a".into()),
			TokenKind::Punct(Punct::StrictEq),
			TokenKind::Ident("b".into()),
			TokenKind::Punct(Punct::StrictNotEq),
			TokenKind::Ident("c".into()),
			TokenKind::Punct(Punct::Arrow),
			TokenKind::Ident("d".into()),
			TokenKind::Eof,
		]
	);
}

#[test]
fn resolves_string_escapes() {
	assert_eq!(kinds(r#"'a\'b' "c\nd" "A\u{1F600}""#)[..3], [
		TokenKind::Str("a'b".into()),
		TokenKind::Str("c\nd".into()),
		TokenKind::Str("A\u{1F600}".into()),
	]);
}

#[test]
fn splits_template_parts() {
	let tokens = kinds("`x ${a + \"}\"} y`");
	let TokenKind::Template(parts) = &tokens[0] else {
		panic!("expected template token");
	};
	assert_eq!(parts.len(), 3);
	assert_eq!(parts[0], TemplatePart::Text("x ".into()));
	assert!(matches!(&parts[1], TemplatePart::Expr(src, _) if src == "a + \"}\""));
	assert_eq!(parts[2], TemplatePart::Text(" y".into()));
}

#[test]
fn skips_comments_and_tracks_newlines() {
	let tokens = tokenize("a // note\n/* multi\nline */ b", Pos::default()).unwrap();
	assert_eq!(tokens[0].kind, TokenKind::Ident("a".into()));
	assert_eq!(tokens[1].kind, TokenKind::Ident("b".into()));
	assert!(tokens[1].newline_before);
	assert_eq!(tokens[1].pos, Pos { line: 3, col: 9 });
}

#[test]
fn lexes_numbers() {
	assert_eq!(kinds("1.5e2 0x1F .25")[..3], [
		TokenKind::Number(150.0),
		TokenKind::Number(31.0),
		TokenKind::Number(0.25)
	]);
}

#[test]
fn keywords_are_not_identifiers() {
	assert_eq!(kinds("let of")[..2], [TokenKind::Keyword(Keyword::Let), TokenKind::Keyword(Keyword::Of)]);
}

#[test]
fn reports_unterminated_string_position() {
	let err = tokenize("x = 'abc", Pos::default()).unwrap_err();
	assert!(matches!(err, ScriptError::Syntax { line: 1, .. }));
}

#[test]
fn rejects_unknown_character() {
	assert!(tokenize("a # b", Pos::default()).is_err());
}
