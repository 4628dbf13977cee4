use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;
use crate::compile;

fn expand(source: &str, captures: &[&str]) -> Result<Expansion> {
	let snippet = Arc::new(compile(source).unwrap().remove(0));
	let captures = captures.iter().map(|c| Some((*c).to_owned())).collect();
	synthesize(&snippet, captures, 0..3, &ScriptLimits::default())
}

#[test]
fn block_values_become_numbered_placeholders() {
	let exp = expand("snippet foo \"desc\"\nHello ``rv = m[0].toUpperCase()``!\nendsnippet", &["foo"]).unwrap();

	assert_eq!(exp.text, "Hello FOO!");
	assert_eq!(exp.template, "Hello ${1:FOO}!$0");
	assert_eq!(
		exp.placeholders,
		vec![
			Placeholder { number: 1, block: Some(0), span: 6..9 },
			Placeholder { number: 0, block: None, span: 10..10 },
		]
	);
	assert_eq!(exp.first_placeholder, 1);
	assert_eq!(exp.replace, 0..3);
	assert!(exp.is_tracked());
}

#[test]
fn literal_only_expansion_is_not_tracked() {
	let exp = expand("snippet `abc` \"lit\"\nabc\nendsnippet", &["abc"]).unwrap();
	assert_eq!(exp.template, "abc$0");
	assert_eq!(exp.placeholders.len(), 1);
	assert_eq!(exp.first_placeholder, EXIT_PLACEHOLDER);
	assert!(!exp.is_tracked());
}

#[test]
fn placeholders_are_numbered_by_first_appearance() {
	let exp = expand("snippet x\n``rv = 'a'``-\n``rv = 'é'``\nendsnippet", &["x"]).unwrap();
	let spans: Vec<(u32, Range<usize>)> = exp.placeholders.iter().map(|p| (p.number, p.span.clone())).collect();
	assert_eq!(spans, vec![(1, 0..1), (2, 3..4), (0, 4..4)]);
	assert_eq!(exp.placeholder_blocks, BTreeMap::from([(1, 0), (2, 1)]));
	assert_eq!(exp.text, "a-\né");
	assert_eq!(exp.placeholder(2).and_then(|p| p.block), Some(1));
}

#[test]
fn literals_and_values_are_escaped() {
	let exp = expand("snippet x\nprice: $5 {a} \\ ``rv = '}$'``\nendsnippet", &["x"]).unwrap();
	assert_eq!(exp.template, "price: \\$5 {a\\} \\\\ ${1:\\}\\$}$0");
	assert_eq!(exp.text, "price: $5 {a} \\ }$");
	assert_eq!(render_template(&exp.template), exp.text);
}

#[test]
fn generator_failure_produces_no_expansion() {
	let err = expand("snippet x\n``rv = missing``\nendsnippet", &["x"]).unwrap_err();
	assert!(matches!(err, hypersnip_script::ScriptError::Undefined(name) if name == "missing"));
}

#[rstest]
#[case("plain", "plain")]
#[case("a ${1:b} c$0", "a b c")]
#[case("${12:x}$3y", "xy")]
#[case("\\$1 costs \\\\", "$1 costs \\")]
#[case("${1:outer ${2:inner}}", "outer inner")]
#[case("$", "$")]
fn renders_templates(#[case] template: &str, #[case] text: &str) {
	assert_eq!(render_template(template), text);
}
