use std::convert::From;
use std::error::Error;
use std::fmt;

// Lexing covers tokenization and section splitting:
#[derive(Debug, PartialEq)]
pub enum LexError
{
	IncompleteStringLiteral { line: usize },
	UnknownSymbol { line: usize, fragment: String },
	BadSectionHeader { line: usize },
	UnknownSection { line: usize, name: String },
	DuplicateSection { line: usize, name: String },
	TermOutsideSection { line: usize },
	MissingTextSection,
}

impl fmt::Display for LexError
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			LexError::IncompleteStringLiteral { line } 	=> write!(f, "[Line {:}] A string literal is not closed on its line.", line),
			LexError::UnknownSymbol { line, fragment } 	=> write!(f, "[Line {:}] Cannot tokenize the fragment starting at \"{:}\".", line, fragment),
			LexError::BadSectionHeader { line } 		=> write!(f, "[Line {:}] A section header must have the form \"section <name> :\".", line),
			LexError::UnknownSection { line, name } 	=> write!(f, "[Line {:}] \"{:}\" is not a known section name (expected \".data\" or \".text\").", line, name),
			LexError::DuplicateSection { line, name } 	=> write!(f, "[Line {:}] The section \"{:}\" is declared twice.", line, name),
			LexError::TermOutsideSection { line } 		=> write!(f, "[Line {:}] This line does not belong to any section.", line),
			LexError::MissingTextSection 				=> write!(f, "The mandatory \".text\" section is missing."),
		}
	}
}

impl Error for LexError { }

// A syntactically broken statement or data declaration:
#[derive(Debug, PartialEq)]
pub enum ParseError
{
	UnknownMnemonic { line: usize, name: String },
	MalformedLabel { line: usize, name: String },
	MissingLabel { line: usize },
	DanglingLabel { line: usize, name: String },
	MalformedData { line: usize },
	BadStringSize { line: usize, size: i64, actual: usize },
	TooManySigils { line: usize, count: usize },
	MissingArgument { line: usize, mnemonic: String },
	UnexpectedArgument { line: usize, mnemonic: String },
	WrongArity { line: usize },
}

impl fmt::Display for ParseError
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			ParseError::UnknownMnemonic { line, name } 			=> write!(f, "[Line {:}] \"{:}\" is not a known instruction.", line, name),
			ParseError::MalformedLabel { line, name } 			=> write!(f, "[Line {:}] \"{:}\" is not a valid label.", line, name),
			ParseError::MissingLabel { line } 					=> write!(f, "[Line {:}] A data declaration requires a leading label.", line),
			ParseError::DanglingLabel { line, name } 			=> write!(f, "[Line {:}] The label \"{:}\" is not attached to exactly one statement.", line, name),
			ParseError::MalformedData { line } 					=> write!(f, "[Line {:}] A data declaration is either empty, a single integer, or \"<size> , <literal>\".", line),
			ParseError::BadStringSize { line, size, actual } 	=> write!(f, "[Line {:}] The declared size {:} does not fit a literal of length {:}.", line, size, actual),
			ParseError::TooManySigils { line, count } 			=> write!(f, "[Line {:}] {:} '*' sigils do not map to an addressing mode (at most two are allowed).", line, count),
			ParseError::MissingArgument { line, mnemonic } 		=> write!(f, "[Line {:}] The instruction \"{:}\" requires an argument.", line, mnemonic),
			ParseError::UnexpectedArgument { line, mnemonic } 	=> write!(f, "[Line {:}] The instruction \"{:}\" takes no argument.", line, mnemonic),
			ParseError::WrongArity { line } 					=> write!(f, "[Line {:}] A statement takes at most one argument.", line),
		}
	}
}

impl Error for ParseError { }

// A wrong usage of a label in a syntactically correct program:
#[derive(Debug, PartialEq)]
pub enum ResolveError
{
	DuplicateLabel { line: usize, name: String },
	UndefinedLabel { line: usize, name: String },
	BadArgumentKind { line: usize, mnemonic: String, name: String },
	MissingStart,
}

impl fmt::Display for ResolveError
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			ResolveError::DuplicateLabel { line, name } 			=> write!(f, "[Line {:}] The label definition \"{:}\" is a duplicate.", line, name),
			ResolveError::UndefinedLabel { line, name } 			=> write!(f, "[Line {:}] The label reference \"{:}\" cannot be resolved.", line, name),
			ResolveError::BadArgumentKind { line, mnemonic, name } 	=> write!(f, "[Line {:}] The label \"{:}\" is not a valid argument for \"{:}\" in this addressing mode.", line, name, mnemonic),
			ResolveError::MissingStart 								=> write!(f, "The entry label \"_start\" is missing from the \".text\" section."),
		}
	}
}

impl Error for ResolveError { }

// A literal that does not fit the 32-bit signed machine word:
#[derive(Debug, PartialEq)]
pub struct EncodeError
{
	pub line: usize,
	pub value: i64,
}

impl fmt::Display for EncodeError
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		write!(f, "[Line {:}] The value {:} is outside the 32-bit signed range.", self.line, self.value)
	}
}

impl Error for EncodeError { }

// This is a compound error type that wraps all the other ones:
#[derive(Debug, PartialEq)]
pub enum TranslatorError
{
	Lex(LexError),
	Parse(ParseError),
	Resolve(ResolveError),
	Encode(EncodeError),
}

impl From<LexError> for TranslatorError
{
	fn from(err: LexError) -> Self
	{
		TranslatorError::Lex(err)
	}
}

impl From<ParseError> for TranslatorError
{
	fn from(err: ParseError) -> Self
	{
		TranslatorError::Parse(err)
	}
}

impl From<ResolveError> for TranslatorError
{
	fn from(err: ResolveError) -> Self
	{
		TranslatorError::Resolve(err)
	}
}

impl From<EncodeError> for TranslatorError
{
	fn from(err: EncodeError) -> Self
	{
		TranslatorError::Encode(err)
	}
}

impl fmt::Display for TranslatorError
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		match self
		{
			TranslatorError::Lex(err) 		=> write!(f, "{:}", err),
			TranslatorError::Parse(err) 	=> write!(f, "{:}", err),
			TranslatorError::Resolve(err) 	=> write!(f, "{:}", err),
			TranslatorError::Encode(err) 	=> write!(f, "{:}", err),
		}
	}
}

impl Error for TranslatorError { }
