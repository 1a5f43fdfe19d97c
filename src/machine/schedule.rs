use std::error::Error;
use std::fmt;
use nom::
{
	IResult,
	branch::alt,
	bytes::complete::take_while1,
	character::complete::{char as single_char, none_of, one_of, space0},
	combinator::{all_consuming, map, map_res},
	multi::separated_list0,
	sequence::{delimited, preceded, separated_pair, terminated},
};

// One scheduled input byte: at tick "at", inject "symbol" into the console.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScheduleEntry
{
	pub at: u64,
	pub symbol: char,
}

// The schedule file could not be parsed:
#[derive(Debug, PartialEq)]
pub struct ScheduleError
{
	fragment: String,
}

impl fmt::Display for ScheduleError
{
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result
	{
		write!(f, "Cannot parse the input schedule near \"{:.32}\".", self.fragment)
	}
}

impl Error for ScheduleError { }

fn tick(i: &str) -> IResult<&str, u64>
{
	map_res(take_while1(|c: char| c.is_ascii_digit()), |s: &str| s.parse::<u64>())(i)
}

fn symbol(i: &str) -> IResult<&str, char>
{
	// Either an escape sequence or any plain character:
	let escaped = preceded(single_char('\\'), map(one_of("nrt0\\\""), |c| match c
	{
		'n' => '\n',
		'r' => '\r',
		't' => '\t',
		'0' => '\0',
		c 	=> c,
	}));

	delimited(single_char('"'), alt((escaped, none_of("\\\""))), single_char('"'))(i)
}

fn entry(i: &str) -> IResult<&str, ScheduleEntry>
{
	let pair = separated_pair
	(
		preceded(space0, tick),
		preceded(space0, single_char(',')),
		preceded(space0, symbol),
	);

	map(delimited(single_char('('), pair, preceded(space0, single_char(')'))), |(at, symbol)| ScheduleEntry { at, symbol })(i)
}

fn schedule(i: &str) -> IResult<&str, Vec<ScheduleEntry>>
{
	let entries = separated_list0(preceded(space0, single_char(',')), preceded(space0, entry));

	all_consuming(delimited(single_char('['), terminated(entries, space0), single_char(']')))(i)
}

// Parse the textual list "[(tick, "char"), ...]".
// An empty file or "[]" is the empty schedule.
pub fn parse_schedule(input: &str) -> Result<Vec<ScheduleEntry>, ScheduleError>
{
	let trimmed = input.trim();

	if trimmed.is_empty()
	{
		return Ok(vec![]);
	}

	match schedule(trimmed)
	{
		Ok((_, entries)) 	=> Ok(entries),
		Err(_) 				=> Err(ScheduleError { fragment: String::from(trimmed) }),
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn empty_inputs_yield_the_empty_schedule()
	{
		assert_eq!(parse_schedule(""), Ok(vec![]));
		assert_eq!(parse_schedule("  \n"), Ok(vec![]));
		assert_eq!(parse_schedule("[]"), Ok(vec![]));
	}

	#[test]
	fn entries_parse_with_escapes()
	{
		let parsed = parse_schedule("[(50, \"a\"), (80, \"\\n\")]").unwrap();

		assert_eq!(parsed, vec!
		[
			ScheduleEntry { at: 50, symbol: 'a' },
			ScheduleEntry { at: 80, symbol: '\n' },
		]);
	}

	#[test]
	fn dense_lists_parse_without_spaces()
	{
		let parsed = parse_schedule("[(1,\"x\"),(2,\"y\")]").unwrap();
		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed[1].symbol, 'y');
	}

	#[test]
	fn garbage_is_rejected()
	{
		assert!(parse_schedule("[(1 \"x\")]").is_err());
		assert!(parse_schedule("(1, \"x\")").is_err());
		assert!(parse_schedule("[(1, \"x\") trailing]").is_err());
	}
}
