use std::fmt;
use nom::
{
	IResult,
	branch::alt,
	bytes::complete::{take_while, take_while1, take_while_m_n},
	character::complete::{char as single_char, one_of},
	combinator::{map, map_res, opt, recognize},
	sequence::{delimited, pair},
};
use crate::assembly::error::*;

// A token as it occurs on a source line.
// Whitespace separates tokens; the symbols ':', ',' and '*' are tokens of their own.
#[derive(Clone, Debug, PartialEq)]
pub enum Token
{
	Ident(String),
	Int(i64),
	Str(String),
	Colon,
	Comma,
	Star,
}

impl fmt::Display for Token
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			Token::Ident(name) 	=> write!(f, "{:}", name),
			Token::Int(value) 	=> write!(f, "{:}", value),
			Token::Str(text) 	=> write!(f, "\"{:}\"", text),
			Token::Colon 		=> write!(f, ":"),
			Token::Comma 		=> write!(f, ","),
			Token::Star 		=> write!(f, "*"),
		}
	}
}

// A source term is one non-empty line, reduced to its tokens:
#[derive(Clone, Debug, PartialEq)]
pub struct SourceTerm
{
	pub line: usize,
	pub tokens: Vec<Token>,
}

// The two section buckets of a source program.
// ".text" is mandatory, ".data" may stay empty.
#[derive(Debug, PartialEq)]
pub struct Sections
{
	pub data: Vec<SourceTerm>,
	pub text: Vec<SourceTerm>,
}

fn ident_token(i: &str) -> IResult<&str, Token>
{
	// An alphabetic char (+ '_') at the beginning and 0...n alphanumeric (+ '_') trailing chars.
	// Section names carry a leading '.' in front of the same shape.
	let cond_alpha = |c: char| c.is_alphabetic() || (c == '_');
	let cond_alphanum = |c: char| c.is_alphanumeric() || (c == '_');

	let name = pair(take_while_m_n(1, 1, cond_alpha), take_while(cond_alphanum));

	map(recognize(pair(opt(single_char('.')), name)), |s: &str| Token::Ident(String::from(s)))(i)
}

fn int_token(i: &str) -> IResult<&str, Token>
{
	let digits = pair(opt(one_of("+-")), take_while1(|c: char| c.is_ascii_digit()));

	map(map_res(recognize(digits), |s: &str| s.parse::<i64>()), Token::Int)(i)
}

fn string_token(i: &str) -> IResult<&str, Token>
{
	// Literals carry no escapes and must close on their own line:
	let contents = take_while(|c| c != '"');

	map(delimited(single_char('"'), contents, single_char('"')), |s: &str| Token::Str(String::from(s)))(i)
}

fn symbol_token(i: &str) -> IResult<&str, Token>
{
	map(one_of(":,*"), |c| match c
	{
		':' => Token::Colon,
		',' => Token::Comma,
		_ 	=> Token::Star,
	})(i)
}

fn token(i: &str) -> IResult<&str, Token>
{
	alt((string_token, int_token, ident_token, symbol_token))(i)
}

// Reduce one line to its tokens.
// Everything from the first ';' on is a comment; lines without tokens are dropped.
pub fn tokenize_line(line_number: usize, line: &str) -> Result<Option<SourceTerm>, LexError>
{
	let mut rest = line;
	let mut tokens = vec![];

	loop
	{
		rest = rest.trim_start();

		if rest.is_empty() || rest.starts_with(';')
		{
			break;
		}

		match token(rest)
		{
			Ok((tail, tok)) =>
			{
				tokens.push(tok);
				rest = tail;
			},
			Err(_) =>
			{
				// An opening quote that never closes is its own failure kind:
				if rest.starts_with('"')
				{
					return Err(LexError::IncompleteStringLiteral { line: line_number });
				}

				return Err(LexError::UnknownSymbol { line: line_number, fragment: String::from(rest) });
			},
		}
	}

	if tokens.is_empty()
	{
		Ok(None)
	}
	else
	{
		Ok(Some(SourceTerm { line: line_number, tokens }))
	}
}

// If the term is a section header, extract the section name.
// The header grammar is exactly "section <name> :".
fn section_header(term: &SourceTerm) -> Result<Option<String>, LexError>
{
	match term.tokens.first()
	{
		Some(Token::Ident(name)) if name == "section" => (),
		_ => return Ok(None),
	}

	match (term.tokens.get(1), term.tokens.get(2), term.tokens.len())
	{
		(Some(Token::Ident(name)), Some(Token::Colon), 3) 	=> Ok(Some(name.clone())),
		_ 													=> Err(LexError::BadSectionHeader { line: term.line }),
	}
}

#[derive(Copy, Clone, PartialEq)]
enum SectionKind
{
	Data,
	Text,
}

// Tokenize the whole program and bucket the terms by section.
// Terms between two headers belong to the preceding one.
pub fn split_source(input: &str) -> Result<Sections, LexError>
{
	let mut sections = Sections { data: vec![], text: vec![] };
	let mut seen_data = false;
	let mut seen_text = false;
	let mut current: Option<SectionKind> = None;

	for (offset, line) in input.lines().enumerate()
	{
		let term = match tokenize_line(offset + 1, line)?
		{
			Some(term) 	=> term,
			None 		=> continue,
		};

		if let Some(name) = section_header(&term)?
		{
			let kind = match name.as_str()
			{
				".data" 	=> Some(SectionKind::Data),
				".text" 	=> Some(SectionKind::Text),
				_ 			=> None,
			};

			let kind = match kind
			{
				Some(kind) 	=> kind,
				None 		=> return Err(LexError::UnknownSection { line: term.line, name }),
			};

			let seen = match kind
			{
				SectionKind::Data 	=> &mut seen_data,
				SectionKind::Text 	=> &mut seen_text,
			};

			if *seen
			{
				return Err(LexError::DuplicateSection { line: term.line, name });
			}

			*seen = true;
			current = Some(kind);
			continue;
		}

		match current
		{
			Some(SectionKind::Data) 	=> sections.data.push(term),
			Some(SectionKind::Text) 	=> sections.text.push(term),
			None 						=> return Err(LexError::TermOutsideSection { line: term.line }),
		}
	}

	if !seen_text
	{
		return Err(LexError::MissingTextSection);
	}

	Ok(sections)
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn tokens(line: &str) -> Vec<Token>
	{
		tokenize_line(1, line).unwrap().unwrap().tokens
	}

	#[test]
	fn statements_split_on_whitespace_and_symbols()
	{
		assert_eq!(tokens("loop: ld *x"), vec!
		[
			Token::Ident(String::from("loop")),
			Token::Colon,
			Token::Ident(String::from("ld")),
			Token::Star,
			Token::Ident(String::from("x")),
		]);

		// Symbols need no surrounding whitespace:
		assert_eq!(tokens("ld **ptr"), vec!
		[
			Token::Ident(String::from("ld")),
			Token::Star,
			Token::Star,
			Token::Ident(String::from("ptr")),
		]);
	}

	#[test]
	fn comments_are_dropped()
	{
		assert_eq!(tokens("hlt ; stop here"), vec![Token::Ident(String::from("hlt"))]);
		assert_eq!(tokenize_line(1, "; only a comment").unwrap(), None);
		assert_eq!(tokenize_line(1, "   ").unwrap(), None);
	}

	#[test]
	fn string_literals_keep_inner_spaces()
	{
		assert_eq!(tokens("msg: 11, \"hello world\""), vec!
		[
			Token::Ident(String::from("msg")),
			Token::Colon,
			Token::Int(11),
			Token::Comma,
			Token::Str(String::from("hello world")),
		]);
	}

	#[test]
	fn unterminated_strings_are_rejected()
	{
		assert_eq!
		(
			tokenize_line(4, "msg: 5, \"hello"),
			Err(LexError::IncompleteStringLiteral { line: 4 })
		);
	}

	#[test]
	fn negative_numbers_are_single_tokens()
	{
		assert_eq!(tokens("decr: -1"), vec!
		[
			Token::Ident(String::from("decr")),
			Token::Colon,
			Token::Int(-1),
		]);
	}

	#[test]
	fn sections_are_split_in_order()
	{
		let sections = split_source("section .data:\nx: 5\nsection .text:\n_start: hlt\n").unwrap();

		assert_eq!(sections.data.len(), 1);
		assert_eq!(sections.data[0].line, 2);
		assert_eq!(sections.text.len(), 1);
		assert_eq!(sections.text[0].line, 4);
	}

	#[test]
	fn text_section_is_mandatory()
	{
		assert_eq!(split_source("section .data:\nx: 5\n"), Err(LexError::MissingTextSection));
	}

	#[test]
	fn sections_must_be_unique()
	{
		assert_eq!
		(
			split_source("section .text:\nhlt\nsection .text:\n"),
			Err(LexError::DuplicateSection { line: 3, name: String::from(".text") })
		);
	}

	#[test]
	fn unknown_sections_are_rejected()
	{
		assert_eq!
		(
			split_source("section .bss:\n"),
			Err(LexError::UnknownSection { line: 1, name: String::from(".bss") })
		);
	}

	#[test]
	fn terms_before_the_first_header_are_rejected()
	{
		assert_eq!
		(
			split_source("hlt\nsection .text:\n"),
			Err(LexError::TermOutsideSection { line: 1 })
		);
	}

	#[test]
	fn broken_headers_are_rejected()
	{
		assert_eq!
		(
			split_source("section .text\n"),
			Err(LexError::BadSectionHeader { line: 1 })
		);
	}
}
